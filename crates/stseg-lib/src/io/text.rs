//! Plain-text sample and annotation parsing for the CLI.

use crate::signal::Events;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse newline-delimited floating point samples, ignoring blanks and
/// `#` comment lines.
pub fn parse_samples(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not f64: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read newline-delimited samples from disk.
pub fn read_samples(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_samples(&text)
}

/// Parse beat annotations as `<sample-index> <symbol>` lines; a line with
/// only an index gets the placeholder symbol `?`.
pub fn parse_beat_annotations(text: &str) -> Result<(Events, Vec<char>)> {
    let mut indices = Vec::new();
    let mut symbols = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let sample: usize = parts
            .next()
            .unwrap_or_default()
            .parse()
            .with_context(|| format!("line {} is not an annotation: {}", idx + 1, trimmed))?;
        let symbol = parts
            .next()
            .and_then(|s| s.chars().next())
            .unwrap_or('?');
        indices.push(sample);
        symbols.push(symbol);
    }
    if indices.is_empty() {
        anyhow::bail!("no annotations found");
    }
    Ok((Events::from_indices(indices), symbols))
}

/// Read beat annotations from disk.
pub fn read_beat_annotations(path: &Path) -> Result<(Events, Vec<char>)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_beat_annotations(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_samples_with_comments() {
        let parsed = parse_samples("# header\n0.5\n\n-0.25\n").unwrap();
        assert_eq!(parsed, vec![0.5, -0.25]);
    }

    #[test]
    fn rejects_garbage_lines() {
        assert!(parse_samples("0.5\nnot-a-number\n").is_err());
        assert!(parse_samples("# only comments\n").is_err());
    }

    #[test]
    fn parses_annotations_with_and_without_symbols() {
        let (events, symbols) = parse_beat_annotations("100 N\n250 V\n400\n").unwrap();
        assert_eq!(events.indices, vec![100, 250, 400]);
        assert_eq!(symbols, vec!['N', 'V', '?']);
    }
}
