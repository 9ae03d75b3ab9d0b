//! Labeled-document CSV ingest and split JSON persistence.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::corpus::{LabeledDoc, SplitSet};
use crate::error::AppError;
use crate::io::ingest::{Header, Ingested, csv_reader, for_each_record};

/// Read `(text, label)` pairs from the named columns.
///
/// Rows with an empty text or label are skipped and reported.
pub fn read_documents<R: Read>(
    reader: R,
    text_column: &str,
    label_column: &str,
) -> Result<Ingested<Vec<LabeledDoc>>, AppError> {
    let text_column = text_column.trim().to_ascii_lowercase();
    let label_column = label_column.trim().to_ascii_lowercase();

    let mut rdr = csv_reader(reader);
    let header = Header::read(&mut rdr, "documents")?;
    header.require(&text_column)?;
    header.require(&label_column)?;

    let mut docs = Vec::new();
    let (rows_read, row_errors) = for_each_record(&mut rdr, |record| {
        let text = header.required(record, &text_column)?;
        let label = header.required(record, &label_column)?;
        docs.push(LabeledDoc {
            text: text.to_string(),
            label: label.to_string(),
        });
        Ok(())
    });

    Ok(Ingested {
        table: docs,
        row_errors,
        rows_read,
    })
}

/// Write one side of a split as pretty JSON.
pub fn write_split_json(path: &Path, split: &SplitSet) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::new(2, format!("Failed to create output directory '{}': {e}", parent.display()))
        })?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create split JSON '{}': {e}", path.display())))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, split)
        .map_err(|e| AppError::new(2, format!("Failed to write split JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush split JSON: {e}")))
}

/// Read a split previously written by `write_split_json`.
pub fn read_split_json(path: &Path) -> Result<SplitSet, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open split JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid split JSON: {e}")))
}
