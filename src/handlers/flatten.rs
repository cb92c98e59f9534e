use crate::{
    CollectorError, Result,
    collector::ResourceKind,
    flatten::{self, FlattenSummary, MergeSummary},
    output,
};
use chrono::Local;
use std::path::{Path, PathBuf};

impl output::OutputFormatter for FlattenSummary {
    fn format_text(&self) -> String {
        use crate::output::text;

        let mut lines = vec![
            text::success(&format!(
                "Wrote {} {} to {}",
                self.rows,
                self.kind.item_noun(),
                self.output.display()
            )),
            text::key_value("Source", &self.source.display().to_string()),
        ];
        if let Some(id) = &self.tweet_id {
            lines.push(text::key_value("Original Tweet", id));
        }
        if !self.last_cursor.is_empty() {
            lines.push(text::key_value(
                "Last Cursor",
                &text::truncate(&self.last_cursor, 23),
            ));
        }
        if let Some(cursor) = &self.resume_cursor {
            lines.push(text::key_value("Resumed From", &text::truncate(cursor, 23)));
        }
        lines.join("\n")
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

impl output::OutputFormatter for MergeSummary {
    fn format_text(&self) -> String {
        use crate::output::text;
        format!(
            "{}\n{}\n{}",
            text::success(&format!(
                "Merged {} file(s) into {}",
                self.inputs,
                self.output.display()
            )),
            text::key_value("Rows", &self.rows.to_string()),
            text::key_value("Columns", &self.columns.len().to_string())
        )
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

pub fn handle_flatten(
    file: &Path,
    kind: Option<ResourceKind>,
    out_dir: &Path,
) -> Result<FlattenSummary> {
    flatten::flatten_file(file, kind, out_dir, &Local::now())
}

pub fn handle_merge(files: &[PathBuf], output: &Path) -> Result<MergeSummary> {
    if files.is_empty() {
        return Err(CollectorError::General("No CSV files to merge".into()));
    }
    flatten::merge_csv_files(files, output)
}
