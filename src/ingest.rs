use std::io::Read;
use std::path::Path;

use anyhow::Context;

use crate::models::{ResponseRow, SurveyTable};

pub fn read_csv(path: &Path, delimiter: u8) -> anyhow::Result<SurveyTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let table = read_table(file, delimiter)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "survey data loaded"
    );
    Ok(table)
}

/// Reads a header row followed by one respondent per record. Records may be
/// shorter than the header; the missing cells are simply absent.
pub fn read_table<R: Read>(source: R, delimiter: u8) -> anyhow::Result<SurveyTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()
        .context("missing header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: ResponseRow = headers
            .iter()
            .zip(record.iter())
            .map(|(column, value)| (column.as_str(), value))
            .collect();
        rows.push(row);
    }

    Ok(SurveyTable { headers, rows })
}
