//! Record: case-insensitive attribute map with strict lookups.

use crate::table::KeyTable;
use std::borrow::Cow;
use std::fmt;
use std::ops::Index;
use thiserror::Error;

/// Unknown attribute name on a record.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unknown attribute `{name}`")]
pub struct MissingAttributeError {
    pub name: String,
}

/// Fold an attribute name to its canonical uppercase form, borrowing when
/// the input is already folded.
pub(crate) fn fold(name: &str) -> Cow<'_, str> {
    if name.chars().any(char::is_lowercase) {
        Cow::Owned(name.to_uppercase())
    } else {
        Cow::Borrowed(name)
    }
}

/// Case-insensitive mapping from attribute name to value.
///
/// Names are folded to uppercase on both write and lookup, so `name`,
/// `Name`, and `NAME` resolve to the same stored entry; the last write
/// during construction wins while the entry keeps its first-seen position.
/// Lookup misses are errors, never defaults. Records are built by the load
/// protocol and read-only afterwards.
pub struct Record {
    fields: KeyTable<Box<str>>,
}

impl Record {
    pub(crate) fn new() -> Self {
        Self {
            fields: KeyTable::new(),
        }
    }

    /// Build a record from raw column/value pairs, folding each name.
    pub(crate) fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut record = Record::new();
        for (name, value) in pairs {
            let key = Box::from(&*fold(&name));
            record.fields.put(key, value.into_boxed_str());
        }
        record
    }

    /// Store the value of `src` under the additional folded name `alias`.
    pub(crate) fn alias(&mut self, alias: &str, src: &str) -> Result<(), MissingAttributeError> {
        let value: Box<str> = Box::from(self.get(src)?);
        self.fields.put(Box::from(&*fold(alias)), value);
        Ok(())
    }

    /// Value for `name`, folding the query before lookup.
    pub fn get(&self, name: &str) -> Result<&str, MissingAttributeError> {
        self.find(name).ok_or_else(|| MissingAttributeError {
            name: name.to_string(),
        })
    }

    pub fn find(&self, name: &str) -> Option<&str> {
        self.fields.get(&fold(name)).map(|v| &**v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains(&fold(name))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Canonical (folded) names and values in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k, &**v))
    }
}

/// Subscript access resolving through the same fold as [`Record::get`].
///
/// Panics when the attribute is absent, like `std` map indexing; use
/// [`Record::get`] for the fallible form.
impl Index<&str> for Record {
    type Output = str;

    fn index(&self, name: &str) -> &str {
        match self.find(name) {
            Some(value) => value,
            None => panic!("unknown attribute `{name}`"),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
