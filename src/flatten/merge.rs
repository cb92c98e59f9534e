use crate::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub inputs: usize,
    pub rows: usize,
    pub columns: Vec<String>,
}

/// Concatenates CSV files into `output`.
///
/// The output header is the union of the input headers in first-seen order;
/// cells for columns a file does not have are left empty.
pub fn merge_csv_files(inputs: &[PathBuf], output: &Path) -> Result<MergeSummary> {
    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut tables = Vec::with_capacity(inputs.len());

    for path in inputs {
        let mut reader = csv::Reader::from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        for header in &headers {
            if !index.contains_key(header) {
                index.insert(header.clone(), columns.len());
                columns.push(header.clone());
            }
        }

        let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(path = %path.display(), rows = records.len(), "Read CSV");
        tables.push((headers, records));
    }

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(&columns)?;

    let mut rows = 0;
    for (headers, records) in tables {
        let positions: Vec<usize> = headers.iter().map(|h| index[h]).collect();
        for record in records {
            let mut line = vec![""; columns.len()];
            for (field, &position) in record.iter().zip(&positions) {
                line[position] = field;
            }
            writer.write_record(&line)?;
            rows += 1;
        }
    }
    writer.flush()?;

    info!(
        inputs = inputs.len(),
        rows,
        columns = columns.len(),
        path = %output.display(),
        "Merged CSV files"
    );

    Ok(MergeSummary {
        output: output.to_path_buf(),
        inputs: inputs.len(),
        rows,
        columns,
    })
}
