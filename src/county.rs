//! County codes, county records, and the per-state county index.

use crate::record::{MissingAttributeError, Record};
use crate::state::StateRecord;
use crate::table::KeyTable;
use slotmap::DefaultKey;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Index;
use std::str;
use std::sync::{Arc, Weak};
use thiserror::Error;

/// County FIPS code not present in a [`CountyIndex`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unknown county code `{code}`")]
pub struct UnknownCodeError {
    pub code: String,
}

/// Two county rows in one state share a FIPS code. The source data never
/// does this; seeing it means the rows are corrupt.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("duplicate county code `{code}`")]
pub struct DuplicateCodeError {
    pub code: CountyCode,
}

/// Zero-padded 3-digit county FIPS code.
///
/// Codes are not contiguous and not uniformly odd: several states carry
/// even codes (Nevada's 510 for Carson City) or gaps in the odd sequence.
/// The fixed width makes byte order equal numeric order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CountyCode([u8; 3]);

impl CountyCode {
    /// Parse a 1- to 3-digit numeric string, zero-padding to 3 characters.
    /// Returns `None` for empty, over-long, or non-numeric input.
    pub fn parse(code: &str) -> Option<CountyCode> {
        if code.is_empty() || code.len() > 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut digits = [b'0'; 3];
        digits[3 - code.len()..].copy_from_slice(code.as_bytes());
        Some(CountyCode(digits))
    }

    pub fn as_str(&self) -> &str {
        str::from_utf8(&self.0).expect("codes hold ASCII digits")
    }
}

impl fmt::Display for CountyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for CountyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CountyCode({})", self.as_str())
    }
}

/// One county or county-equivalent: its attribute record, parsed code, and
/// a non-owning back-reference to the owning state.
pub struct CountyRecord {
    code: CountyCode,
    record: Record,
    state: Weak<StateRecord>,
}

impl CountyRecord {
    pub(crate) fn new(code: CountyCode, record: Record, state: Weak<StateRecord>) -> Self {
        Self {
            code,
            record,
            state,
        }
    }

    pub fn code(&self) -> CountyCode {
        self.code
    }

    /// The owning state. The back-reference is set once while the state is
    /// linked and never copies state data into the county.
    pub fn state(&self) -> Arc<StateRecord> {
        self.state
            .upgrade()
            .expect("county record outlived its owning state")
    }

    pub fn get(&self, name: &str) -> Result<&str, MissingAttributeError> {
        self.record.get(name)
    }

    pub fn find(&self, name: &str) -> Option<&str> {
        self.record.find(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.record.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.record.iter()
    }
}

/// Subscript access; panics on a miss like [`Record`] indexing.
impl Index<&str> for CountyRecord {
    type Output = str;

    fn index(&self, name: &str) -> &str {
        &self.record[name]
    }
}

impl fmt::Debug for CountyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "County[{}]", self.code)
    }
}

/// Per-state map from county FIPS code to [`CountyRecord`].
///
/// Codes can start with a digit, so there is no attribute-style path here;
/// lookup is call-style by code string, normalized the same way the codes
/// were normalized at build. Ascending code order is fixed at construction
/// and backs [`CountyIndex::codes`] and [`CountyIndex::iter`].
pub struct CountyIndex {
    table: KeyTable<CountyRecord>,
    order: Vec<DefaultKey>,
}

impl CountyIndex {
    pub(crate) fn empty() -> Self {
        Self {
            table: KeyTable::new(),
            order: Vec::new(),
        }
    }

    /// Build the index from already-linked county records. Fails when two
    /// entries share a code; the half-built index is discarded.
    pub(crate) fn build(
        entries: Vec<(CountyCode, CountyRecord)>,
    ) -> Result<Self, DuplicateCodeError> {
        let mut table = KeyTable::new();
        for (code, record) in entries {
            table
                .insert(Box::from(code.as_str()), record)
                .map_err(|_| DuplicateCodeError { code })?;
        }
        let mut order: Vec<DefaultKey> = table.keys().collect();
        order.sort_by_key(|&k| {
            table
                .value_at(k)
                .expect("order is built from live slots")
                .code()
        });
        Ok(Self { table, order })
    }

    /// County record for `code`, zero-padding 1- and 2-digit numeric input
    /// before lookup.
    pub fn lookup(&self, code: &str) -> Result<&CountyRecord, UnknownCodeError> {
        let normalized = CountyCode::parse(code).ok_or_else(|| UnknownCodeError {
            code: code.to_string(),
        })?;
        self.table
            .get(normalized.as_str())
            .ok_or_else(|| UnknownCodeError {
                code: normalized.as_str().to_string(),
            })
    }

    pub fn contains(&self, code: &str) -> bool {
        CountyCode::parse(code)
            .map(|c| self.table.contains(c.as_str()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// A fresh, independent sequence of codes in ascending numeric order.
    /// Each call restarts from the beginning; sequences share no cursor.
    pub fn codes(&self) -> Codes<'_> {
        Codes {
            index: self,
            cursor: self.order.iter(),
        }
    }

    /// County records in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = &CountyRecord> {
        self.order.iter().map(move |&k| {
            self.table
                .value_at(k)
                .expect("order tracks live slots")
        })
    }
}

impl fmt::Debug for CountyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.codes()).finish()
    }
}

/// Lazy ascending sequence of county FIPS codes, yielded as 3-character
/// strings. Obtained from [`CountyIndex::codes`]; every invocation produces
/// an equal, independent ordering.
#[derive(Clone)]
pub struct Codes<'a> {
    index: &'a CountyIndex,
    cursor: std::slice::Iter<'a, DefaultKey>,
}

impl<'a> Iterator for Codes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.cursor.next().map(|&k| {
            self.index
                .table
                .key_at(k)
                .expect("order tracks live slots")
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cursor.size_hint()
    }
}

impl ExactSizeIterator for Codes<'_> {}
impl FusedIterator for Codes<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> Record {
        Record::from_pairs(vec![("NAME".to_string(), name.to_string())])
    }

    fn entry(code: &str, name: &str) -> (CountyCode, CountyRecord) {
        let code = CountyCode::parse(code).unwrap();
        (code, CountyRecord::new(code, record(name), Weak::new()))
    }

    /// Invariant: parsing zero-pads short numeric codes and rejects empty,
    /// over-long, and non-numeric input.
    #[test]
    fn code_parse_normalizes() {
        assert_eq!(CountyCode::parse("5").unwrap().as_str(), "005");
        assert_eq!(CountyCode::parse("05").unwrap().as_str(), "005");
        assert_eq!(CountyCode::parse("105").unwrap().as_str(), "105");
        assert!(CountyCode::parse("").is_none());
        assert!(CountyCode::parse("1050").is_none());
        assert!(CountyCode::parse("1a").is_none());
    }

    /// Invariant: `lookup` resolves any spelling that normalizes to the
    /// same code and fails with `UnknownCodeError` otherwise.
    #[test]
    fn lookup_normalizes_and_rejects_unknown() {
        let idx = CountyIndex::build(vec![entry("005", "Sussex")]).unwrap();
        assert_eq!(idx.lookup("5").unwrap().get("NAME").unwrap(), "Sussex");
        assert_eq!(idx.lookup("05").unwrap().get("NAME").unwrap(), "Sussex");
        assert_eq!(idx.lookup("005").unwrap().get("NAME").unwrap(), "Sussex");

        let err = idx.lookup("999").unwrap_err();
        assert_eq!(err.code, "999");
        let err = idx.lookup("bad").unwrap_err();
        assert_eq!(err.code, "bad");
    }

    /// Invariant: two entries sharing a code fail construction with
    /// `DuplicateCodeError`; neither row silently wins.
    #[test]
    fn duplicate_codes_rejected() {
        let err =
            CountyIndex::build(vec![entry("019", "one"), entry("19", "two")]).unwrap_err();
        assert_eq!(err.code.as_str(), "019");
    }

    /// Invariant: codes iterate in ascending numeric order regardless of
    /// insertion order, including even codes interleaved with odd ones.
    #[test]
    fn codes_ascend_over_irregular_sets() {
        let idx = CountyIndex::build(vec![
            entry("510", "Carson City"),
            entry("003", "Clark"),
            entry("031", "Washoe"),
            entry("001", "Churchill"),
        ])
        .unwrap();
        let codes: Vec<_> = idx.codes().collect();
        assert_eq!(codes, vec!["001", "003", "031", "510"]);
        let names: Vec<_> = idx.iter().map(|c| c.get("NAME").unwrap()).collect();
        assert_eq!(names, vec!["Churchill", "Clark", "Washoe", "Carson City"]);
    }

    /// Invariant: each `codes()` call restarts from the beginning with an
    /// identical ordering and an independent cursor.
    #[test]
    fn codes_are_restartable() {
        let idx = CountyIndex::build(vec![
            entry("007", "c"),
            entry("001", "a"),
            entry("003", "b"),
        ])
        .unwrap();

        let first: Vec<_> = idx.codes().collect();
        let mut second = idx.codes();
        assert_eq!(second.next(), Some("001"));
        let third: Vec<_> = idx.codes().collect();

        assert_eq!(first, vec!["001", "003", "007"]);
        assert_eq!(first, third);
        assert_eq!(second.next(), Some("003"));
        assert_eq!(idx.codes().len(), 3);
    }
}
