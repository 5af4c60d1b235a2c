use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;
use thiserror::Error;

use crate::logic::features::FEATURE_LAYOUT;
use crate::logic::features::layout::INDEX_KEY;
use super::TrainingDataset;

/// Label column name in exported files
pub const LABEL_COLUMN: &str = "label";

#[derive(Debug, Error)]
pub enum DatasetWriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write `Index, <features...>, label` rows to any sink
pub fn write_csv_to<W: Write>(dataset: &TrainingDataset, sink: W) -> Result<(), DatasetWriteError> {
    let mut wtr = Writer::from_writer(sink);

    // Write header
    let mut header = Vec::with_capacity(FEATURE_LAYOUT.len() + 2);
    header.push(INDEX_KEY);
    header.extend(FEATURE_LAYOUT.iter().copied());
    header.push(LABEL_COLUMN);
    wtr.write_record(&header)?;

    // Write data rows
    for row in &dataset.rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.features.index.to_string());
        record.extend(row.features.as_array().iter().map(|v| v.to_string()));
        record.push(row.label.as_u8().to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the dataset to a CSV file, replacing any existing file
pub fn write_csv(dataset: &TrainingDataset, path: &Path) -> Result<(), DatasetWriteError> {
    let file = File::create(path)?;
    write_csv_to(dataset, file)?;
    log::info!("Wrote {} rows to {}", dataset.len(), path.display());
    Ok(())
}
