//! CSV text to [`RawRow`]s.
//!
//! The header row names the fields. Cells are trimmed, plainly numeric
//! cells become [`FieldValue::Number`] and blank cells [`FieldValue::Empty`].
//! Records shorter than the header leave their trailing fields out; extra
//! cells are ignored. Fully blank lines are skipped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::types::{FieldValue, RawRow};

/// Read every record from `reader`.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let mut row = RawRow::with_capacity(headers.len());
        for (name, cell) in headers.iter().zip(record.iter()) {
            row.insert(name.clone(), FieldValue::from_cell(cell));
        }
        rows.push(row);
    }

    tracing::debug!(columns = headers.len(), rows = rows.len(), "Read CSV");
    Ok(rows)
}

/// Read a CSV file from disk.
pub fn read_path(path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(path)?;
    let rows = read_rows(file)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Loaded CSV file");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_header_and_coercion() {
        let data = "timestamp,temp,label\n2024-01-01T00:00:00Z, 21.5 ,ok\n2024-01-01T01:00:00Z,,\"a, b\"\n";
        let rows = read_rows(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].columns().collect::<Vec<_>>(),
            vec!["timestamp", "temp", "label"]
        );
        assert_eq!(rows[0].get("temp"), Some(&FieldValue::Number(21.5)));
        assert_eq!(rows[0].get("label"), Some(&FieldValue::from("ok")));
        assert_eq!(rows[1].get("temp"), Some(&FieldValue::Empty));
        assert_eq!(rows[1].get("label"), Some(&FieldValue::from("a, b")));
    }

    #[test]
    fn test_epoch_cells_are_numbers() {
        let rows = read_rows("ts,v\n1704067200,3\n".as_bytes()).unwrap();
        assert_eq!(rows[0].get("ts"), Some(&FieldValue::Number(1_704_067_200.0)));
    }

    #[test]
    fn test_blank_and_short_lines() {
        let data = "a,b,c\n1,2,3\n,,\n4,5\n";
        let rows = read_rows(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].len(), 2);
        assert_eq!(rows[1].get("c"), None);
    }

    #[test]
    fn test_header_only() {
        let rows = read_rows("a,b\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_read_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "when,count").unwrap();
        writeln!(file, "2024-03-01 08:00:00,4").unwrap();
        file.flush().unwrap();

        let rows = read_path(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("count"), Some(&FieldValue::Number(4.0)));
    }

    #[test]
    fn test_missing_file() {
        let err = read_path(Path::new("/nonexistent/eventscope.csv")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
