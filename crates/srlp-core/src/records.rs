//! Flat-file persistence for evaluation record tables.
//!
//! One CSV row per [`EvaluationRecord`], header required, columns in struct
//! field order. The reader also accepts the `llm_provider` / `llm_model`
//! column names and pandas-style `True`/`False` (or `1`/`0`) booleans, and
//! ignores extra columns, so tables written by older harness scripts load
//! unchanged.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::domain::{EvaluationRecord, Result, SrlpError};

/// CSV columns in write order, each with the accepted alternative names.
pub const COLUMNS: [(&str, &[&str]); 10] = [
    ("scenario", &[]),
    ("provider", &["llm_provider"]),
    ("model", &["llm_model"]),
    ("initial_quality", &[]),
    ("final_quality", &[]),
    ("improvement", &[]),
    ("converged", &[]),
    ("iterations", &[]),
    ("time_seconds", &[]),
    ("scenario_complexity", &[]),
];

fn write_to<W: std::io::Write>(writer: W, records: &[EvaluationRecord]) -> Result<W> {
    let mut wtr = csv::Writer::from_writer(writer);
    if records.is_empty() {
        wtr.write_record(COLUMNS.iter().map(|(name, _)| *name))?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    wtr.into_inner().map_err(|e| SrlpError::Io(e.into_error()))
}

/// Serialize a table to CSV bytes.
pub fn records_to_csv(records: &[EvaluationRecord]) -> Result<Vec<u8>> {
    write_to(Vec::new(), records)
}

/// Write a table to `path`, replacing any existing file.
pub fn write_records_csv(path: &Path, records: &[EvaluationRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_to(file, records)?;
    tracing::debug!(path = %path.display(), rows = records.len(), "records written");
    Ok(())
}

fn check_header(headers: &csv::StringRecord) -> Result<()> {
    for (name, aliases) in COLUMNS {
        let present = headers
            .iter()
            .any(|h| h.trim() == name || aliases.contains(&h.trim()));
        if !present {
            return Err(SrlpError::MalformedRecord {
                line: 1,
                reason: format!("missing column `{name}`"),
            });
        }
    }
    Ok(())
}

/// Parse a CSV table from any reader.
///
/// Rows that fail to parse or fail [`EvaluationRecord::validate`] are
/// rejected with their line number; nothing is defaulted.
pub fn read_records<R: std::io::Read>(reader: R) -> Result<Vec<EvaluationRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    check_header(rdr.headers()?)?;

    let mut records = Vec::new();
    for (index, row) in rdr.deserialize::<EvaluationRecord>().enumerate() {
        let line = index as u64 + 2;
        let record = row.map_err(|e| SrlpError::MalformedRecord {
            line,
            reason: e.to_string(),
        })?;
        record.validate().map_err(|e| SrlpError::MalformedRecord {
            line,
            reason: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Read a table from `path`, failing fast when the file does not exist.
pub fn read_records_csv(path: &Path) -> Result<Vec<EvaluationRecord>> {
    if !path.exists() {
        return Err(SrlpError::InputNotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    read_records(file)
}

/// Read several tables and concatenate them in argument order.
///
/// Every file is checked independently; the first failure aborts the load.
pub fn read_records_csvs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<EvaluationRecord>> {
    let mut records = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let table = read_records_csv(path)?;
        tracing::debug!(path = %path.display(), rows = table.len(), "records loaded");
        records.extend(table);
    }
    Ok(records)
}

/// SHA-256 hex digest of the table's canonical CSV encoding.
pub fn table_digest(records: &[EvaluationRecord]) -> Result<String> {
    let bytes = records_to_csv(records)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
