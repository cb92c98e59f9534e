//! Conversion of collection records into flat CSV tables.

mod merge;
mod tweets;
mod users;

pub use merge::{MergeSummary, merge_csv_files};

use crate::collector::{CollectionRecord, ResourceKind};
use crate::{CollectorError, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One CSV row as ordered `(column, cell)` pairs.
#[derive(Debug, Default)]
pub(crate) struct Row {
    cells: Vec<(&'static str, String)>,
}

impl Row {
    pub(crate) fn push(&mut self, column: &'static str, cell: impl Into<String>) {
        self.cells.push((column, cell.into()));
    }

    pub(crate) fn text(&mut self, column: &'static str, value: Option<&Value>) {
        self.push(column, cell(value));
    }

    pub(crate) fn count(&mut self, column: &'static str, value: Option<&Value>) {
        self.push(column, number(value).to_string());
    }

    pub(crate) fn flag(&mut self, column: &'static str, value: Option<&Value>) {
        self.push(column, flag(value).to_string());
    }

    fn headers(&self) -> Vec<&'static str> {
        self.cells.iter().map(|(column, _)| *column).collect()
    }

    fn into_record(self) -> Vec<String> {
        self.cells.into_iter().map(|(_, cell)| cell).collect()
    }
}

/// Renders a JSON value as a CSV cell. Missing and null become empty.
pub(crate) fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Integer counter, 0 when missing or not numeric.
pub(crate) fn number(value: Option<&Value>) -> i64 {
    value
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0)
}

pub(crate) fn flag(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool).unwrap_or(false)
}

/// Joins one string field of every object in `list` with `", "`.
pub(crate) fn join_field(list: &[Value], field: &str) -> String {
    list.iter()
        .map(|item| item.get(field).and_then(Value::as_str).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn array<'a>(value: Option<&'a Value>) -> &'a [Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
pub struct FlattenSummary {
    pub kind: ResourceKind,
    pub source: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub tweet_id: Option<String>,
    pub last_cursor: String,
    pub resume_cursor: Option<String>,
}

/// Flattens one record file into `out_dir`.
///
/// When `kind` is given the file must hold that kind of record; otherwise
/// the kind is detected from its top-level keys.
pub fn flatten_file(
    path: &Path,
    kind: Option<ResourceKind>,
    out_dir: &Path,
    generated_at: &DateTime<Local>,
) -> Result<FlattenSummary> {
    let record = CollectionRecord::load(path)?;
    if let Some(expected) = kind
        && expected != record.kind
    {
        return Err(CollectorError::InvalidRecord(format!(
            "{} does not contain {} (found {})",
            path.display(),
            expected.item_noun(),
            record.kind.item_noun()
        )));
    }

    info!(
        kind = %record.kind,
        items = record.items.len(),
        path = %path.display(),
        "Flattening record"
    );

    let columns = build_row(&Value::Null, &record).headers();
    let rows: Vec<Row> = record
        .items
        .iter()
        .map(|item| build_row(item, &record))
        .collect();

    let output = out_dir.join(csv_file_name(&record, rows.len(), generated_at));
    fs::create_dir_all(out_dir)?;
    let row_count = write_rows(&output, &columns, rows)?;
    debug!(path = %output.display(), rows = row_count, "CSV written");

    Ok(FlattenSummary {
        kind: record.kind,
        source: path.to_path_buf(),
        output,
        rows: row_count,
        tweet_id: record.tweet_id,
        last_cursor: record.last_cursor,
        resume_cursor: record.params.resume_cursor,
    })
}

fn csv_file_name(record: &CollectionRecord, rows: usize, generated_at: &DateTime<Local>) -> String {
    let stamp = generated_at.format("%Y%m%d_%H%M%S");
    let short_id: String = record
        .tweet_id
        .as_deref()
        .map(|id| id.chars().take(10).collect())
        .unwrap_or_else(|| "unknown".to_string());

    match record.kind {
        ResourceKind::Search => format!("tweets_search_{}_{}tweets.csv", stamp, rows),
        ResourceKind::Replies => format!("replies_{}_{}_{}replies.csv", short_id, stamp, rows),
        ResourceKind::Retweeters => {
            format!("retweeters_{}_{}_{}retweeters.csv", short_id, stamp, rows)
        }
    }
}

/// Row for one item, with the column set of the record's kind.
fn build_row(item: &Value, record: &CollectionRecord) -> Row {
    match record.kind {
        ResourceKind::Search => tweets::search_row(item, record),
        ResourceKind::Replies => tweets::reply_row(item, record),
        ResourceKind::Retweeters => users::retweeter_row(item, record),
    }
}

/// The header is always written, even for a record without items.
fn write_rows(path: &Path, columns: &[&'static str], rows: Vec<Row>) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns)?;

    let mut count = 0;
    for row in rows {
        writer.write_record(row.into_record())?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}
