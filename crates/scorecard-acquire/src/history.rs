// Purchase-history export parsing.
//
// The storefront's transaction page is copied out as plain text; the games
// table sits between two fixed marker lines, with a header row first and
// one tab-separated row per license.

use anyhow::{Context, Result};
use scorecard_model::{PurchaseRecord, Settings};
use std::path::Path;

/// Column index of the title within a history row.
const TITLE_COLUMN: usize = 1;

/// Read the history export and return the table's interior lines.
///
/// A file missing either marker line is malformed and aborts the run.
pub fn read_history(path: &Path, settings: &Settings) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    let lines: Vec<&str> = text.lines().collect();

    let start = lines
        .iter()
        .position(|l| *l == settings.content_start)
        .with_context(|| {
            format!("Marker line '{}' not found in history file", settings.content_start)
        })?;
    let end = lines
        .iter()
        .position(|l| *l == settings.content_end)
        .with_context(|| {
            format!("Marker line '{}' not found in history file", settings.content_end)
        })?;
    anyhow::ensure!(
        start < end,
        "History table markers out of order: '{}' after '{}'",
        settings.content_start,
        settings.content_end
    );

    tracing::info!(start, end, "Located history table in export file");
    Ok(lines[start + 1..end].iter().map(|l| l.to_string()).collect())
}

/// Turn interior table lines into purchase records.
///
/// The first line is the export's own header row and is dropped; rows with
/// fewer than two columns (stray blank lines and such) are skipped.
pub fn build_records(lines: &[String]) -> Vec<PurchaseRecord> {
    let mut records = Vec::new();

    for line in lines.iter().skip(1) {
        let columns: Vec<String> = line.split('\t').map(|c| c.to_string()).collect();
        if columns.len() < 2 {
            tracing::debug!(line = %line, "Skipping short history row");
            continue;
        }
        records.push(PurchaseRecord {
            raw_title: columns[TITLE_COLUMN].clone(),
            columns,
        });
    }

    tracing::info!(records = records.len(), "Built purchase records");
    records
}
