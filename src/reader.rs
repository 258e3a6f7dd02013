//! Header and row reading for delimited files
//!
//! Fields are split on [`FIELD_DELIMITER`] without any quoting support: a
//! delimiter inside double quotes is still a field boundary.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::error::{ImportError, ImportResult};

/// Field delimiter
pub const FIELD_DELIMITER: char = ',';

/// One data line of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number within the file (the header is line 1)
    pub line: usize,
    /// Raw field values, empty fields kept as empty strings
    pub values: Vec<String>,
}

impl Row {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Split a line into its fields
pub fn split_fields(line: &str) -> Vec<String> {
    line.split(FIELD_DELIMITER).map(str::to_string).collect()
}

fn open(path: &Path) -> ImportResult<Lines<BufReader<File>>> {
    let file = File::open(path).map_err(|e| ImportError::io(path, e))?;
    Ok(BufReader::new(file).lines())
}

/// Byte order mark some editors write at the start of UTF-8 files
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Read the column names from the first line of a file.
///
/// An empty file yields no headers. A leading byte order mark is dropped.
pub fn read_headers(path: &Path) -> ImportResult<Vec<String>> {
    match open(path)?.next() {
        Some(line) => {
            let line = line.map_err(|e| ImportError::io(path, e))?;
            Ok(split_fields(line.trim_start_matches(BYTE_ORDER_MARK)))
        }
        None => Ok(Vec::new()),
    }
}

/// Forward-only iterator over the data lines of a file.
///
/// Holds the file open until it is dropped. Rows are not checked against the
/// header count here.
pub struct RowReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
    failed: bool,
}

impl RowReader {
    /// Open a file and skip its header line
    pub fn open(path: &Path) -> ImportResult<Self> {
        let mut lines = open(path)?;
        let mut line = 0;
        if let Some(header) = lines.next() {
            header.map_err(|e| ImportError::io(path, e))?;
            line = 1;
        }

        Ok(Self {
            path: path.to_path_buf(),
            lines,
            line,
            failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for RowReader {
    type Item = ImportResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let line = self.lines.next()?;
        self.line += 1;
        match line {
            Ok(line) => Some(Ok(Row {
                line: self.line,
                values: split_fields(&line),
            })),
            Err(e) => {
                self.failed = true;
                Some(Err(ImportError::io(&self.path, e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_read_headers() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "sales.csv", b"id,amount,note\n1,9.99,x\n");

        assert_eq!(read_headers(&path).unwrap(), vec!["id", "amount", "note"]);
    }

    #[test]
    fn test_read_headers_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.csv", b"");

        assert!(read_headers(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_headers_strips_crlf() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "win.csv", b"a,b\r\n1,2\r\n");

        assert_eq!(read_headers(&path).unwrap(), vec!["a", "b"]);
        let rows: Vec<Row> = RowReader::open(&path).unwrap().map(Result::unwrap).collect();
        assert_eq!(rows[0].values, vec!["1", "2"]);
    }

    #[test]
    fn test_read_headers_strips_byte_order_mark() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "excel.csv", b"\xef\xbb\xbfid,amount\r\n1,9.99\r\n");

        assert_eq!(read_headers(&path).unwrap(), vec!["id", "amount"]);
        let rows: Vec<Row> = RowReader::open(&path).unwrap().map(Result::unwrap).collect();
        assert_eq!(rows, vec![Row { line: 2, values: vec!["1".into(), "9.99".into()] }]);
    }

    #[test]
    fn test_quotes_are_not_special() {
        assert_eq!(
            split_fields("\"Smith, John\",42"),
            vec!["\"Smith", " John\"", "42"]
        );
    }

    #[test]
    fn test_empty_fields_kept() {
        assert_eq!(split_fields("a,,c,"), vec!["a", "", "c", ""]);
        assert_eq!(split_fields(""), vec![""]);
    }

    #[test]
    fn test_rows_skip_header_and_number_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "t.csv", b"a,b\n1,2\n3,4,5\n\n");

        let rows: Vec<Row> = RowReader::open(&path).unwrap().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], Row { line: 2, values: vec!["1".into(), "2".into()] });
        // Arity is not checked by the reader.
        assert_eq!(rows[1].len(), 3);
        assert_eq!(rows[2].line, 4);
        assert_eq!(rows[2].values, vec![""]);
    }

    #[test]
    fn test_rows_of_header_only_and_empty_files() {
        let dir = TempDir::new().unwrap();
        let header_only = write_file(&dir, "h.csv", b"a,b\n");
        let empty = write_file(&dir, "e.csv", b"");

        assert_eq!(RowReader::open(&header_only).unwrap().count(), 0);
        assert_eq!(RowReader::open(&empty).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_utf8_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.csv", b"a\n\xff\xfe\n");

        let mut rows = RowReader::open(&path).unwrap();
        assert!(matches!(rows.next(), Some(Err(ImportError::Io { .. }))));
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_missing_file() {
        let err = read_headers(Path::new("/nonexistent/file.csv")).unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}
