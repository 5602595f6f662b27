//! Delimited-text table parsing for the loader.
//!
//! The reference data ships as header-first delimited text (tab-separated
//! in the census extracts). [`parse`] turns such text into column/value
//! rows for [`StateIndex::from_rows`](crate::StateIndex::from_rows); an
//! optional qualifier character groups cells that contain the delimiter.

use crate::Row;
use thiserror::Error;

/// Parse-time failure in a reference table.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum TableError {
    #[error("table has no header row")]
    MissingHeader,
    #[error("line {line}: expected {expected} cells, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: unterminated qualifier")]
    UnterminatedQualifier { line: usize },
}

/// Parser configuration. `delim` separates cells; `qualifier`, when set,
/// wraps cells whose content contains the delimiter.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub delim: char,
    pub qualifier: Option<char>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delim: '\t',
            qualifier: None,
        }
    }
}

/// Parse a table: the first line names the columns, every following
/// non-empty line is one row. Each row must have exactly as many cells as
/// the header.
pub fn parse(input: &str, opts: &ParseOptions) -> Result<Vec<Row>, TableError> {
    let mut lines = input.lines().enumerate();
    let columns = match lines.next() {
        Some((_, header)) if !header.trim().is_empty() => split_cells(header, 1, opts)?,
        _ => return Err(TableError::MissingHeader),
    };

    let mut rows = Vec::new();
    for (i, line) in lines {
        if line.is_empty() {
            continue;
        }
        let lineno = i + 1;
        let cells = split_cells(line, lineno, opts)?;
        if cells.len() != columns.len() {
            return Err(TableError::ColumnCount {
                line: lineno,
                expected: columns.len(),
                found: cells.len(),
            });
        }
        rows.push(columns.iter().cloned().zip(cells).collect());
    }
    Ok(rows)
}

/// Split one line into cells. With a qualifier, a cell opening with it
/// absorbs following delimiters until a cell closes with it; the
/// qualifier characters themselves are stripped.
fn split_cells(line: &str, lineno: usize, opts: &ParseOptions) -> Result<Vec<String>, TableError> {
    let Some(q) = opts.qualifier else {
        return Ok(line.split(opts.delim).map(str::to_string).collect());
    };

    let mut cells = Vec::new();
    let mut pending: Option<String> = None;
    for piece in line.split(opts.delim) {
        match pending.take() {
            None => match piece.strip_prefix(q) {
                Some(rest) => match rest.strip_suffix(q) {
                    Some(inner) => cells.push(inner.to_string()),
                    None => pending = Some(rest.to_string()),
                },
                None => cells.push(piece.to_string()),
            },
            Some(mut open) => {
                open.push(opts.delim);
                match piece.strip_suffix(q) {
                    Some(inner) => {
                        open.push_str(inner);
                        cells.push(open);
                    }
                    None => {
                        open.push_str(piece);
                        pending = Some(open);
                    }
                }
            }
        }
    }
    if pending.is_some() {
        return Err(TableError::UnterminatedQualifier { line: lineno });
    }
    Ok(cells)
}
