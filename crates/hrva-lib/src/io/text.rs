use anyhow::{Context, Result};
use std::path::Path;

/// Parse newline-delimited intervals (ms), ignoring blank and `#` comment lines.
pub fn parse_rr_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not a number: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no intervals found");
    }
    Ok(out)
}

/// Read a newline-delimited interval file from disk.
pub fn read_rr_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_rr_series(&text).with_context(|| format!("parsing {}", path.display()))
}
