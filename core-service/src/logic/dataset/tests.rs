use super::writer::{write_csv, LABEL_COLUMN};
use super::{generate, generate_default, Label};
use crate::logic::features::{Feature, FEATURE_COUNT};
use tempfile::tempdir;
use std::fs;

fn values(dataset: &super::TrainingDataset, row: usize) -> [u8; FEATURE_COUNT] {
    *dataset.rows[row].features.as_array()
}

#[test]
fn test_golden_prefix_seed_42() {
    let dataset = generate_default();

    assert_eq!(
        values(&dataset, 0),
        [0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]
    );
    assert_eq!(
        values(&dataset, 1),
        [0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1]
    );
    assert_eq!(
        values(&dataset, 2),
        [0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    );
    // first malicious row
    assert_eq!(
        values(&dataset, 5000),
        [1, 1, 1, 0, 1, 1, 2, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 0, 1, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1]
    );
    assert_eq!(
        values(&dataset, 9999),
        [0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 1, 1, 1, 1, 1]
    );

    let total: u64 = dataset
        .rows
        .iter()
        .flat_map(|r| r.features.as_array().iter().map(|v| u64::from(*v)))
        .sum();
    assert_eq!(total, 112_420);
}

#[test]
fn test_reproducible() {
    assert_eq!(generate(500, 7), generate(500, 7));
    assert_ne!(generate(500, 7), generate(500, 8));
}

#[test]
fn test_class_split_and_indices() {
    let dataset = generate(11, 42);
    assert_eq!(dataset.len(), 11);
    assert_eq!(dataset.count(Label::Legitimate), 5);
    assert_eq!(dataset.count(Label::Malicious), 6);
    assert_eq!(dataset.rows[4].label, Label::Legitimate);
    assert_eq!(dataset.rows[5].label, Label::Malicious);

    for (i, row) in dataset.rows.iter().enumerate() {
        assert_eq!(row.features.index as usize, i + 1);
    }
}

#[test]
fn test_values_in_domain() {
    let dataset = generate(2000, 3);
    for row in &dataset.rows {
        for feature in Feature::ALL {
            assert!(row.features.get(feature) <= feature.max_value());
        }
    }
}

#[test]
fn test_class_priors_show_in_data() {
    let dataset = generate_default();
    let share = |label: Label, feature: Feature| {
        let rows: Vec<_> = dataset.rows.iter().filter(|r| r.label == label).collect();
        rows.iter().filter(|r| r.features.get(feature) == 1).count() as f64 / rows.len() as f64
    };

    assert!((share(Label::Legitimate, Feature::UsingIp) - 0.02).abs() < 0.01);
    assert!((share(Label::Malicious, Feature::UsingIp) - 0.70).abs() < 0.03);
    assert!((share(Label::Malicious, Feature::StatsReport) - 0.90).abs() < 0.03);
}

#[test]
fn test_empty_dataset() {
    let dataset = generate(0, 42);
    assert!(dataset.is_empty());
}

#[test]
fn test_csv_export() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("training.csv");
    let dataset = generate(10, 42);

    write_csv(&dataset, &path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 11);

    let header: Vec<&str> = lines[0].split(',').collect();
    assert_eq!(header.len(), FEATURE_COUNT + 2);
    assert_eq!(header[0], "Index");
    assert_eq!(header[1], "UsingIP");
    assert_eq!(header[FEATURE_COUNT + 1], LABEL_COLUMN);

    assert!(lines[1].starts_with("1,"));
    assert!(lines[1].ends_with(",0"));
    assert!(lines[10].starts_with("10,"));
    assert!(lines[10].ends_with(",1"));
}
