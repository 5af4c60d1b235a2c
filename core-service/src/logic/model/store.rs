//! Model Store - load-or-create persistence
//!
//! One JSON blob per model. Writes go to a temp file in the target directory
//! and are renamed into place, so readers never observe a partial file.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::constants;
use super::forest::RandomForest;
use super::training::TrainingReport;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not move model into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Persisted model blob
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredModel {
    pub forest: RandomForest,
    pub saved_at: DateTime<Utc>,
    /// Evaluation from the run that produced the forest, when known
    #[serde(default)]
    pub report: Option<TrainingReport>,
}

impl StoredModel {
    pub fn new(forest: RandomForest, report: Option<TrainingReport>) -> Self {
        Self {
            forest,
            saved_at: Utc::now(),
            report,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `URLSCAN_MODEL_PATH` or the default file name
    pub fn from_env() -> Self {
        Self::new(constants::get_model_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no model has been saved yet
    pub fn load(&self) -> Result<Option<StoredModel>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let model: StoredModel = serde_json::from_reader(BufReader::new(file))?;
        log::info!(
            "Loaded model from {} ({} trees)",
            self.path.display(),
            model.forest.trees.len()
        );
        Ok(Some(model))
    }

    pub fn save(&self, model: &StoredModel) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, model)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        log::info!("Model saved to {}", self.path.display());
        Ok(())
    }

    /// SHA-256 of the persisted blob, `None` if nothing is saved
    pub fn fingerprint(&self) -> Result<Option<String>, StoreError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;
        Ok(Some(hex::encode(hasher.finalize())))
    }
}
