//! Topic spreadsheet reader.
//!
//! Parses a CSV file with the case-sensitive columns `TOPICS`, `AUTHOR`,
//! `CATEGORIES` and `TAGS` into [`InputRow`]s. Extra columns are ignored.
//! Rows where every field is blank, and rows without a topic, are dropped.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use autopress_shared::{AutopressError, InputRow, Result};

/// Columns every input file must provide.
pub const REQUIRED_COLUMNS: [&str; 4] = ["TOPICS", "AUTHOR", "CATEGORIES", "TAGS"];

/// Raw CSV record before validation.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "TOPICS", default)]
    topics: String,
    #[serde(rename = "AUTHOR", default)]
    author: String,
    #[serde(rename = "CATEGORIES", default)]
    categories: String,
    #[serde(rename = "TAGS", default)]
    tags: String,
}

impl RawRow {
    fn is_blank(&self) -> bool {
        [&self.topics, &self.author, &self.categories, &self.tags]
            .iter()
            .all(|field| field.trim().is_empty())
    }

    fn into_input_row(self) -> InputRow {
        InputRow {
            topic: self.topics.trim().to_string(),
            author_name: self.author.trim().to_string(),
            category_names: self.categories.trim().to_string(),
            tag_names: self.tags.trim().to_string(),
        }
    }
}

/// Read and validate all rows of the topic file at `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_rows(path: &Path) -> Result<Vec<InputRow>> {
    let file = std::fs::File::open(path).map_err(|e| AutopressError::io(path, e))?;
    let rows = parse_rows(file)?;
    info!(rows = rows.len(), "input file processed");
    Ok(rows)
}

/// Parse topic rows from any CSV source.
pub fn parse_rows<R: Read>(source: R) -> Result<Vec<InputRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AutopressError::input(format!("cannot read header row: {e}")))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h.trim() == *col))
        .collect();
    if !missing.is_empty() {
        return Err(AutopressError::input(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }

    // Header cells may carry stray spaces; the names themselves stay case-sensitive.
    let columns: csv::StringRecord = headers.iter().map(str::trim).collect();

    let mut rows = Vec::new();
    let mut skipped_blank = 0usize;
    let mut skipped_no_topic = 0usize;

    for record in reader.records() {
        let mut record = record.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or_default();
            AutopressError::input(format!("line {line}: {e}"))
        })?;

        // Short rows leave the trailing columns blank.
        while record.len() < columns.len() {
            record.push_field("");
        }

        let raw: RawRow = record.deserialize(Some(&columns)).map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or_default();
            AutopressError::input(format!("line {line}: {e}"))
        })?;

        if raw.is_blank() {
            skipped_blank += 1;
            continue;
        }
        if raw.topics.trim().is_empty() {
            skipped_no_topic += 1;
            continue;
        }

        rows.push(raw.into_input_row());
    }

    debug!(
        kept = rows.len(),
        skipped_blank, skipped_no_topic, "parsed topic rows"
    );

    Ok(rows)
}
