//! Reading semicolon-separated sensor exports.
//!
//! ```text
//! Phone timestamp;RR-interval [ms]
//! 2024-01-01T08:00:00.000;812
//! ```
//! The first line is a header. Blank lines are skipped.

use std::path::Path;

use crate::error::{ExtractionError, Result};

/// Numeric columns of one export file, row-major
fn read_columns(path: &Path, columns: &[usize]) -> Result<Vec<Vec<f64>>> {
    let content = std::fs::read_to_string(path)?;
    parse_columns(&content, columns).map_err(|message| ExtractionError::analysis(path, message))
}

/// Parse `columns` of every data row. Errors carry the offending line number.
pub(crate) fn parse_columns(
    content: &str,
    columns: &[usize],
) -> std::result::Result<Vec<Vec<f64>>, String> {
    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(';').collect();
        let mut row = Vec::with_capacity(columns.len());
        for &col in columns {
            let field = fields
                .get(col)
                .ok_or_else(|| format!("line {}: missing column {col}", idx + 1))?;
            let value = field
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("line {}: column {col} '{field}': {e}", idx + 1))?;
            row.push(value);
        }
        rows.push(row);
    }
    if rows.is_empty() {
        return Err("no data rows".to_string());
    }
    Ok(rows)
}

/// RR intervals in milliseconds (column 1)
pub fn read_rr(path: &Path) -> Result<Vec<f64>> {
    let rr: Vec<f64> = read_columns(path, &[1])?.into_iter().map(|r| r[0]).collect();
    if let Some(bad) = rr.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(ExtractionError::analysis(
            path,
            format!("RR interval {bad} is not a positive duration"),
        ));
    }
    Ok(rr)
}

/// Heart rate in bpm (column 1)
pub fn read_hr(path: &Path) -> Result<Vec<f64>> {
    Ok(read_columns(path, &[1])?.into_iter().map(|r| r[0]).collect())
}

/// Acceleration magnitude `sqrt(x² + y² + z²)` from columns 2..=4
pub fn read_acc_magnitude(path: &Path) -> Result<Vec<f64>> {
    Ok(read_columns(path, &[2, 3, 4])?
        .into_iter()
        .map(|r| (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_columns_skips_header_and_blanks() {
        let content = "ts;RR\n1;800\n\n2;810\n";
        let rows = parse_columns(content, &[1]).unwrap();
        assert_eq!(rows, vec![vec![800.0], vec![810.0]]);
    }

    #[test]
    fn test_parse_columns_reports_line() {
        let err = parse_columns("ts;RR\n1;800\n2;abc\n", &[1]).unwrap_err();
        assert!(err.starts_with("line 3"), "got: {err}");
        let err = parse_columns("ts;x;y;z\n1;2;3\n", &[2, 3, 4]).unwrap_err();
        assert!(err.contains("missing column 3"), "got: {err}");
    }

    #[test]
    fn test_header_only_is_error() {
        assert!(parse_columns("ts;RR\n", &[1]).is_err());
    }

    #[test]
    fn test_read_files() {
        let dir = tempfile::tempdir().unwrap();
        let rr = dir.path().join("x_RR.txt");
        std::fs::write(&rr, "ts;RR\n1;800\n2;0\n").unwrap();
        assert!(matches!(read_rr(&rr), Err(ExtractionError::Analysis { .. })));

        let acc = dir.path().join("x_ACC.txt");
        std::fs::write(&acc, "ts;t;x;y;z\n1;0;3;4;0\n").unwrap();
        assert_eq!(read_acc_magnitude(&acc).unwrap(), vec![5.0]);
    }
}
