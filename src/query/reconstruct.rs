//! Row reconstruction for a scored hit
//!
//! Re-reads the original record at its stored byte offset and re-parses it
//! into an ordered field list, appending a trailing `score` field. In-memory
//! corpora have nothing to seek back to, matching the original's explicit
//! refusal to reconstruct rows for that source kind.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};

use crate::config::FileType;
use crate::error::{Error, Result};
use crate::ingest::extract::{json_record, split_csv_record};

/// One reconstructed field, preserving source column order.
pub type Row = Vec<(String, String)>;

pub fn reconstruct_row(
    file_type: FileType,
    path: Option<&str>,
    header: Option<&[String]>,
    line_offset: u64,
    score: f32,
) -> Result<Row> {
    match file_type {
        FileType::Csv => {
            let path = path.ok_or_else(|| Error::InvalidData("CSV row reconstruction needs a source path".into()))?;
            let header = header.ok_or_else(|| Error::InvalidData("CSV row reconstruction needs a header".into()))?;
            let line = read_line_at(path, line_offset)?;
            let fields = split_csv_record(&line);
            let mut row: Row = header.iter().cloned().zip(fields).collect();
            row.push(("score".to_string(), score.to_string()));
            Ok(row)
        }
        FileType::Json => {
            let path = path.ok_or_else(|| Error::InvalidData("JSON row reconstruction needs a source path".into()))?;
            let line = read_line_at(path, line_offset)?;
            let mut row: Row = json_record(line.trim_end_matches(['\n', '\r']))?
                .into_iter()
                .map(|(k, v)| (k, json_value_to_string(&v)))
                .collect();
            row.push(("score".to_string(), score.to_string()));
            Ok(row)
        }
        FileType::InMemory => Err(Error::InvalidData(
            "row reconstruction is not available for in-memory corpora".into(),
        )),
    }
}

fn json_value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn read_line_at(path: &str, offset: u64) -> Result<String> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line)
}
