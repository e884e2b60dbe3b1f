use crate::error::{QualityCostError, Result};
use crate::schema::{CostCategory, CostRecord, Month, RecordTable};
use crate::store::CSV_HEADER;
use csv::ReaderBuilder;
use log::info;
use std::io::Read;

/// Merges an uploaded four-column CSV into an existing table.
///
/// The result is the de-duplicated union of both inputs, with existing rows
/// first and uploaded rows appended in file order. Any schema violation (a
/// missing or unexpected column, an unknown month or category token, an
/// unparsable or negative cost) aborts the whole merge with a schema error
/// and leaves the existing table untouched. There is no partial ingest.
pub fn merge_upload<R: Read>(existing: &RecordTable, upload: R) -> Result<RecordTable> {
    let mut reader = ReaderBuilder::new().from_reader(upload);

    let headers = reader
        .headers()
        .map_err(|e| QualityCostError::Schema(format!("unreadable header row: {}", e)))?
        .clone();
    validate_upload_header(&headers)?;

    let mut uploaded = Vec::new();
    for (idx, row) in reader.deserialize::<CostRecord>().enumerate() {
        // +2: 1-based numbering plus the header row.
        let record = row
            .map_err(|e| QualityCostError::Schema(format!("row {}: {}", idx + 2, e)))?;
        record.validate().map_err(|e| match e {
            QualityCostError::Schema(details) => {
                QualityCostError::Schema(format!("row {}: {}", idx + 2, details))
            }
            other => other,
        })?;
        uploaded.push(record);
    }

    let mut merged = existing.clone();
    for record in uploaded {
        merged.push_dedup(record);
    }
    info!(
        "merged upload: {} existing + uploaded rows -> {} total",
        existing.len(),
        merged.len()
    );
    Ok(merged)
}

/// Appends a single manually entered record, de-duplicating against the
/// existing table. The cost is re-validated here so the guarantee does not
/// depend on the entry surface.
pub fn add_record(
    existing: &RecordTable,
    month: Month,
    category: CostCategory,
    cost: f64,
    description: impl Into<String>,
) -> Result<RecordTable> {
    let record = CostRecord::new(month, category, cost, description);
    record.validate()?;

    let mut table = existing.clone();
    table.push_dedup(record);
    Ok(table)
}

fn validate_upload_header(headers: &csv::StringRecord) -> Result<()> {
    let names: Vec<&str> = headers.iter().map(str::trim).collect();

    let missing: Vec<&str> = CSV_HEADER
        .iter()
        .copied()
        .filter(|required| !names.contains(required))
        .collect();
    if !missing.is_empty() {
        return Err(QualityCostError::Schema(format!(
            "uploaded data is missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let unexpected: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !CSV_HEADER.contains(name))
        .collect();
    if !unexpected.is_empty() {
        return Err(QualityCostError::Schema(format!(
            "uploaded data has unexpected column(s): {}",
            unexpected.join(", ")
        )));
    }

    Ok(())
}
