//! Network Capabilities - page fetch, stats probes, DNS
//!
//! The only real external lookups. Each sits behind a trait so the
//! extractor can run offline and tests can inject deterministic stubs.

use std::io::{self, Read};
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

use crate::constants;
use super::layout::Feature;
use super::structure::UrlTarget;
use super::vector::{FeatureExtractor, PartialVector};

/// Paths probed for a public statistics page
pub const STATS_PATHS: [&str; 3] = ["/stats", "/statistics", "/analytics"];

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("network unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub probe_timeout: Duration,
    pub dns_timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
    /// Body bytes kept from a fetched page
    pub max_page_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(constants::DEFAULT_FETCH_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(constants::DEFAULT_PROBE_TIMEOUT_SECS),
            dns_timeout: Duration::from_secs(constants::DEFAULT_DNS_TIMEOUT_SECS),
            user_agent: constants::DEFAULT_USER_AGENT.to_string(),
            max_redirects: constants::MAX_REDIRECTS,
            max_page_bytes: constants::MAX_PAGE_BYTES,
        }
    }
}

impl FetchConfig {
    /// Defaults overridden from the environment
    pub fn from_env() -> Self {
        Self {
            timeout: constants::get_fetch_timeout(),
            probe_timeout: constants::get_probe_timeout(),
            dns_timeout: constants::get_dns_timeout(),
            user_agent: constants::get_user_agent(),
            max_redirects: constants::MAX_REDIRECTS,
            max_page_bytes: constants::MAX_PAGE_BYTES,
        }
    }
}

// ============================================================================
// PAGE FETCHER
// ============================================================================

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: Url,
    pub status: u16,
    pub body: String,
}

/// HTTP access used by the extractor
pub trait PageFetcher: Send + Sync {
    /// GET the page, following redirects; non-2xx is an error
    fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;

    /// GET a URL and report its status code
    fn probe(&self, url: &str) -> Result<u16, FetchError>;
}

/// Blocking reqwest implementation
pub struct HttpFetcher {
    page: Client,
    probe: Client,
    max_page_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let page = Client::builder()
            .timeout(config.timeout)
            .redirect(Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(true)
            .build()?;

        let probe = Client::builder()
            .timeout(config.probe_timeout)
            .build()?;

        Ok(Self {
            page,
            probe,
            max_page_bytes: config.max_page_bytes,
        })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self.page.get(url.as_str()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let final_url = response.url().clone();
        let body = read_capped(response, self.max_page_bytes)?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body,
        })
    }

    fn probe(&self, url: &str) -> Result<u16, FetchError> {
        Ok(self.probe.get(url).send()?.status().as_u16())
    }
}

/// Read at most `limit` bytes, decoding lossily as UTF-8
///
/// Anything past the limit is dropped; the HTML parser copes with a
/// truncated document.
pub fn read_capped<R: Read>(reader: R, limit: u64) -> io::Result<String> {
    let mut buf = Vec::new();
    reader.take(limit).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Fetcher that never touches the network
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

impl PageFetcher for OfflineFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        Err(FetchError::Unavailable(format!("offline, not fetching {}", url)))
    }

    fn probe(&self, url: &str) -> Result<u16, FetchError> {
        Err(FetchError::Unavailable(format!("offline, not probing {}", url)))
    }
}

// ============================================================================
// DNS
// ============================================================================

/// IPv4 address lookup
pub trait DnsResolver: Send + Sync {
    fn resolve_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>>;
}

/// Resolver backed by the system's name service
///
/// The libc lookup cannot be cancelled, so it runs on its own thread and is
/// abandoned once the timeout passes.
#[derive(Debug, Clone, Copy)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(constants::DEFAULT_DNS_TIMEOUT_SECS))
    }
}

impl DnsResolver for SystemResolver {
    fn resolve_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>> {
        let host = host.to_string();
        with_timeout(self.timeout, move || {
            let addrs = (host.as_str(), 0u16).to_socket_addrs()?;
            Ok(addrs
                .filter_map(|addr| match addr {
                    SocketAddr::V4(v4) => Some(*v4.ip()),
                    SocketAddr::V6(_) => None,
                })
                .collect())
        })
    }
}

/// Run a blocking lookup on a worker thread, giving up after `timeout`
pub fn with_timeout<T, F>(timeout: Duration, lookup: F) -> io::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> io::Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name("dns-lookup".to_string())
        .spawn(move || {
            // receiver may be gone after a timeout
            let _ = tx.send(lookup());
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("lookup timed out after {:?}", timeout),
        )),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(io::Error::new(
            io::ErrorKind::Other,
            "lookup thread exited without a result",
        )),
    }
}

/// Resolver that always fails
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineResolver;

impl DnsResolver for OfflineResolver {
    fn resolve_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>> {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("offline, not resolving {}", host),
        ))
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// DNSRecording and StatsReport
pub struct NetworkFeatures<'a> {
    resolver: &'a dyn DnsResolver,
    fetcher: &'a dyn PageFetcher,
}

impl<'a> NetworkFeatures<'a> {
    pub fn new(resolver: &'a dyn DnsResolver, fetcher: &'a dyn PageFetcher) -> Self {
        Self { resolver, fetcher }
    }

    fn dns_recording(&self, target: &UrlTarget) -> Option<u8> {
        // a literal address has no A record of its own
        if target.is_ipv4() {
            return Some(1);
        }
        match self.resolver.resolve_ipv4(target.host()) {
            Ok(addrs) if !addrs.is_empty() => Some(0),
            Ok(_) => Some(1),
            Err(e) => {
                log::debug!("DNS lookup failed for {}: {}", target.host(), e);
                Some(1)
            }
        }
    }

    fn stats_report(&self, target: &UrlTarget) -> Option<u8> {
        let authority = target.authority();
        for path in STATS_PATHS {
            let url = format!("http://{}{}", authority, path);
            match self.fetcher.probe(&url) {
                Ok(200) => return Some(0),
                Ok(status) => log::debug!("Stats probe {} -> {}", url, status),
                Err(e) => log::debug!("Stats probe {} failed: {}", url, e),
            }
        }
        Some(1)
    }
}

impl FeatureExtractor<UrlTarget> for NetworkFeatures<'_> {
    fn extract(&self, target: &UrlTarget, partial: &mut PartialVector) {
        partial.set(Feature::DnsRecording, self.dns_recording(target));
        partial.set(Feature::StatsReport, self.stats_report(target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedResolver(Vec<Ipv4Addr>);

    impl DnsResolver for FixedResolver {
        fn resolve_ipv4(&self, _host: &str) -> io::Result<Vec<Ipv4Addr>> {
            Ok(self.0.clone())
        }
    }

    /// Answers probes from a status table and records what was asked
    struct ProbeRecorder {
        ok_path: Option<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    impl PageFetcher for ProbeRecorder {
        fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
            Err(FetchError::Unavailable(url.to_string()))
        }

        fn probe(&self, url: &str) -> Result<u16, FetchError> {
            self.seen.lock().unwrap().push(url.to_string());
            match self.ok_path {
                Some(path) if url.ends_with(path) => Ok(200),
                _ => Ok(404),
            }
        }
    }

    fn run(resolver: &dyn DnsResolver, fetcher: &dyn PageFetcher, raw: &str) -> PartialVector {
        let target = UrlTarget::parse(raw).unwrap();
        let mut partial = PartialVector::new();
        NetworkFeatures::new(resolver, fetcher).extract(&target, &mut partial);
        partial
    }

    #[test]
    fn test_dns_recording() {
        let resolved = FixedResolver(vec![Ipv4Addr::new(93, 184, 216, 34)]);
        let empty = FixedResolver(vec![]);

        assert_eq!(run(&resolved, &OfflineFetcher, "http://example.com").get(Feature::DnsRecording), Some(0));
        assert_eq!(run(&empty, &OfflineFetcher, "http://example.com").get(Feature::DnsRecording), Some(1));
        assert_eq!(run(&OfflineResolver, &OfflineFetcher, "http://example.com").get(Feature::DnsRecording), Some(1));
        // literal IPs never count as resolved
        assert_eq!(run(&resolved, &OfflineFetcher, "http://10.0.0.1").get(Feature::DnsRecording), Some(1));
    }

    #[test]
    fn test_stats_probe_stops_at_first_ok() {
        let fetcher = ProbeRecorder { ok_path: Some("/statistics"), seen: Mutex::new(vec![]) };
        let partial = run(&OfflineResolver, &fetcher, "https://example.com:8443/x");

        assert_eq!(partial.get(Feature::StatsReport), Some(0));
        let seen = fetcher.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec!["http://example.com:8443/stats", "http://example.com:8443/statistics"]
        );
    }

    #[test]
    fn test_stats_probe_none_ok() {
        let fetcher = ProbeRecorder { ok_path: None, seen: Mutex::new(vec![]) };
        let partial = run(&OfflineResolver, &fetcher, "http://example.com");
        assert_eq!(partial.get(Feature::StatsReport), Some(1));
        assert_eq!(fetcher.seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_offline_fetcher_fails() {
        let url = Url::parse("http://example.com").unwrap();
        assert!(matches!(OfflineFetcher.fetch(&url), Err(FetchError::Unavailable(_))));
    }

    #[test]
    fn test_fetch_config_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.dns_timeout, Duration::from_secs(5));
        assert_eq!(config.max_redirects, 10);
        assert_eq!(config.max_page_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn test_read_capped_truncates() {
        let body = "<html>".to_string() + &"a".repeat(100);
        assert_eq!(read_capped(body.as_bytes(), 6).unwrap(), "<html>");
        assert_eq!(read_capped(body.as_bytes(), 1_000).unwrap(), body);
    }

    #[test]
    fn test_read_capped_lossy_utf8() {
        let bytes: &[u8] = &[b'o', b'k', 0xff];
        assert_eq!(read_capped(bytes, 10).unwrap(), "ok\u{fffd}");
    }

    #[test]
    fn test_slow_lookup_times_out() {
        let started = std::time::Instant::now();
        let result = with_timeout(Duration::from_millis(50), || {
            thread::sleep(Duration::from_secs(2));
            Ok(vec![Ipv4Addr::LOCALHOST])
        });

        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_fast_lookup_passes_through() {
        let addrs = with_timeout(Duration::from_secs(1), || Ok(vec![Ipv4Addr::LOCALHOST])).unwrap();
        assert_eq!(addrs, vec![Ipv4Addr::LOCALHOST]);

        let err = with_timeout::<Vec<Ipv4Addr>, _>(Duration::from_secs(1), || {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such host"))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_system_resolver_resolves_ip_literal() {
        let addrs = SystemResolver::default().resolve_ipv4("127.0.0.1").unwrap();
        assert_eq!(addrs, vec![Ipv4Addr::LOCALHOST]);
    }
}
