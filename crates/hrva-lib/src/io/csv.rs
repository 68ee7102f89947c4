use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{fs::File, io::Read, path::Path};

/// Read one named column of intervals (ms) from a headed CSV source.
///
/// The header match is case-insensitive; rows with an empty cell are skipped.
pub fn parse_rr_column<R: Read>(source: R, column: &str) -> Result<Vec<f64>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(source);
    let headers = reader.headers().context("reading header")?.clone();
    let idx = locate_column(&headers, column)?;

    let mut out = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("reading row {}", row + 1))?;
        let cell = record.get(idx).unwrap_or("");
        if cell.is_empty() {
            continue;
        }
        let val: f64 = cell
            .parse()
            .with_context(|| format!("row {}: '{}' is not a number", row + 1, cell))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("column '{column}' holds no intervals");
    }
    Ok(out)
}

pub fn read_rr_column(path: &Path, column: &str) -> Result<Vec<f64>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_rr_column(file, column).with_context(|| format!("parsing {}", path.display()))
}

fn locate_column(headers: &StringRecord, requested: &str) -> Result<usize> {
    headers
        .iter()
        .position(|name| name.eq_ignore_ascii_case(requested))
        .ok_or_else(|| {
            let available: Vec<&str> = headers.iter().collect();
            anyhow::anyhow!("missing column '{requested}' (have {available:?})")
        })
}
