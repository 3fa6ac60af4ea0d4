use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use serde::Deserialize;

use crate::models::{LeaveRecord, LeaveRow, LeavesResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Csv,
        }
    }
}

pub fn load_rows(path: &Path, format: Option<InputFormat>) -> anyhow::Result<Vec<LeaveRow>> {
    let format = format.unwrap_or_else(|| InputFormat::from_path(path));
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let rows = match format {
        InputFormat::Csv => read_csv(reader),
        InputFormat::Json => read_json(reader),
    }
    .with_context(|| format!("failed to read leave records from {}", path.display()))?;

    tracing::info!(path = %path.display(), ?format, rows = rows.len(), "loaded leave records");
    Ok(rows)
}

/// Reads rows with the header `username,type,status,dates,notes`.
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<Vec<LeaveRow>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();

    for (line, result) in reader.deserialize::<LeaveRow>().enumerate() {
        let row = result.with_context(|| format!("invalid CSV record #{}", line + 1))?;
        rows.push(row);
    }

    Ok(rows)
}

/// Accepts the API envelope or a bare array of records.
pub fn read_json<R: Read>(reader: R) -> anyhow::Result<Vec<LeaveRow>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Payload {
        Envelope(LeavesResponse),
        Records(Vec<LeaveRecord>),
    }

    let payload: Payload = serde_json::from_reader(reader).context("invalid leave JSON")?;
    let records = match payload {
        Payload::Envelope(response) => {
            tracing::debug!(status = %response.status, message = %response.message, "read API envelope");
            response.leaves
        }
        Payload::Records(records) => records,
    };

    Ok(records.into_iter().map(LeaveRow::from).collect())
}
