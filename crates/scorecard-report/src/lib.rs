// Report output: one tab-delimited table per run, plus a side list of
// every distinct genre tag seen.
//
// Filenames carry a per-run timestamp, so no run ever overwrites an
// earlier report.

use anyhow::{Context, Result};
use scorecard_model::{FieldRecord, Settings};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Report columns after applying the empty-column toggle.
///
/// Blank names in the configured order are visual spacers; the toggle
/// keeps or drops them, consistently for the header and every data row.
fn columns(settings: &Settings) -> Vec<&str> {
    settings
        .column_order
        .iter()
        .map(String::as_str)
        .filter(|c| settings.keep_empty_columns || !c.is_empty())
        .collect()
}

/// Render the report as header + one tab-separated row per record.
fn render(records: &BTreeMap<String, FieldRecord>, settings: &Settings) -> String {
    let columns = columns(settings);
    let mut out = String::new();

    out.push_str(&columns.join("\t"));
    out.push('\n');

    for record in records.values() {
        let row: Vec<String> = columns.iter().map(|c| record.column(c)).collect();
        out.push_str(&row.join("\t"));
        out.push('\n');
    }

    out
}

/// Write the tab-delimited report into `out_dir` and return its path.
pub fn write_report(
    records: &BTreeMap<String, FieldRecord>,
    settings: &Settings,
    out_dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output dir {}", out_dir.display()))?;

    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let path = out_dir.join(format!("{}-{}.tsv", settings.report_basename, timestamp));

    std::fs::write(&path, render(records, settings))
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = records.len(), "Wrote report");
    Ok(path)
}

/// Every distinct genre tag across all records: deduplicated, lexically
/// sorted, empty token dropped.
pub fn distinct_genres(records: &BTreeMap<String, FieldRecord>) -> Vec<String> {
    records
        .values()
        .flat_map(|r| r.genres.iter())
        .filter(|g| !g.is_empty())
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Write the genre list next to the report (`.tsv` becomes `_genres.txt`)
/// and return its path.
pub fn write_genre_list(
    records: &BTreeMap<String, FieldRecord>,
    report_path: &Path,
) -> Result<PathBuf> {
    let stem = report_path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Report path has no file stem")?;
    let path = report_path.with_file_name(format!("{stem}_genres.txt"));

    let genres = distinct_genres(records);
    let mut text = genres.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }

    std::fs::write(&path, text)
        .with_context(|| format!("Failed to write genre list {}", path.display()))?;
    tracing::info!(path = %path.display(), genres = genres.len(), "Wrote genre list");
    Ok(path)
}
