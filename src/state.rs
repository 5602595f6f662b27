//! State records, the postal-code index, and the load protocol.

use crate::county::{CountyCode, CountyIndex, CountyRecord, DuplicateCodeError};
use crate::record::{fold, MissingAttributeError, Record};
use crate::table::KeyTable;
use crate::tables::TableError;
use crate::Row;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;
use thiserror::Error;

const STATEFP: &str = "STATEFP";
const STUSPS: &str = "STUSPS";
const COUNTYFP: &str = "COUNTYFP";

/// Postal code not present in a [`StateIndex`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unknown state code `{postal}`")]
pub struct UnknownStateError {
    pub postal: String,
}

/// Construction-time failure: the loader supplied malformed or
/// inconsistent rows. Nothing is published when this is returned; there is
/// no partially usable index to recover.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("row is missing required column `{column}`")]
    MissingColumn { column: &'static str },
    #[error("county rows reference unknown state fips `{state_fips}`")]
    OrphanCounty { state_fips: String },
    #[error("state `{postal}` has no county rows")]
    EmptyState { postal: String },
    #[error("duplicate state postal code `{postal}`")]
    DuplicateState { postal: String },
    #[error("state `{postal}`: {source}")]
    DuplicateCode {
        postal: String,
        #[source]
        source: DuplicateCodeError,
    },
    #[error("invalid county code `{code}` in state fips `{state_fips}`")]
    InvalidCountyCode { state_fips: String, code: String },
    #[error(transparent)]
    Table(#[from] TableError),
}

/// One state or territory: its attribute record plus the owned county
/// table. Reached through [`StateIndex::lookup`]; the reserved navigation
/// edges are the typed accessors [`StateRecord::counties`] and
/// [`CountyRecord::state`](crate::CountyRecord::state).
pub struct StateRecord {
    record: Record,
    counties: CountyIndex,
}

impl StateRecord {
    /// The counties owned by this state, keyed by FIPS code.
    pub fn counties(&self) -> &CountyIndex {
        &self.counties
    }

    /// 2-letter USPS abbreviation. Present on every loaded state.
    pub fn postal(&self) -> &str {
        self.record
            .get(STUSPS)
            .expect("state records always carry STUSPS")
    }

    /// 2-digit state FIPS code. Present on every loaded state.
    pub fn fips(&self) -> &str {
        self.record
            .get(STATEFP)
            .expect("state records always carry STATEFP")
    }

    pub fn name(&self) -> Option<&str> {
        self.record.find("NAME")
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
impl Index<&str> for StateRecord {
    type Output = str;

    fn index(&self, name: &str) -> &str {
        &self.record[name]
    }
}

impl fmt::Display for StateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State[{}, {}]", self.postal(), self.fips())
    }
}

impl fmt::Debug for StateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State[{}, {}]", self.postal(), self.fips())
    }
}

/// Case-insensitive map from 2-letter postal code to [`StateRecord`],
/// built exactly once from the full reference dataset and read-only for
/// the life of the process.
pub struct StateIndex {
    table: KeyTable<Arc<StateRecord>>,
}

impl StateIndex {
    /// Build the full index from state rows and county rows (each county
    /// row tagged with its owning state's `STATEFP`).
    ///
    /// The whole load either succeeds or fails with a [`LoadError`]:
    /// orphaned county rows, county-less states, duplicate codes, and
    /// missing required columns are hard failures, never dropped.
    pub fn from_rows<S, C>(state_rows: S, county_rows: C) -> Result<StateIndex, LoadError>
    where
        S: IntoIterator<Item = Row>,
        C: IntoIterator<Item = Row>,
    {
        // Group county rows by owning state before any state is linked.
        let mut grouped: BTreeMap<String, Vec<Row>> = BTreeMap::new();
        for row in county_rows {
            let fips = row
                .iter()
                .find(|(column, _)| fold(column) == STATEFP)
                .map(|(_, value)| value.clone())
                .ok_or(LoadError::MissingColumn { column: STATEFP })?;
            grouped.entry(fips).or_default().push(row);
        }

        let mut table = KeyTable::new();
        for row in state_rows {
            let mut record = Record::from_pairs(row);
            record
                .alias("CODE", STATEFP)
                .map_err(|_| LoadError::MissingColumn { column: STATEFP })?;
            record
                .alias("FIPS", STATEFP)
                .map_err(|_| LoadError::MissingColumn { column: STATEFP })?;
            record
                .alias("POSTAL", STUSPS)
                .map_err(|_| LoadError::MissingColumn { column: STUSPS })?;

            let fips = record.get(STATEFP).expect("aliased above").to_string();
            let postal = fold(record.get(STUSPS).expect("aliased above")).into_owned();

            let county_rows = grouped
                .remove(&fips)
                .ok_or_else(|| LoadError::EmptyState {
                    postal: postal.clone(),
                })?;
            let state = link_state(&postal, &fips, record, county_rows)?;

            table
                .insert(postal.clone().into_boxed_str(), state)
                .map_err(|_| LoadError::DuplicateState { postal })?;
        }

        // Any group left over names a state no state row declared.
        if let Some(state_fips) = grouped.into_keys().next() {
            return Err(LoadError::OrphanCounty { state_fips });
        }

        Ok(StateIndex { table })
    }

    /// State record for `postal`, case-insensitive.
    pub fn lookup(&self, postal: &str) -> Result<&Arc<StateRecord>, UnknownStateError> {
        self.table
            .get(&fold(postal))
            .ok_or_else(|| UnknownStateError {
                postal: postal.to_string(),
            })
    }

    pub fn contains(&self, postal: &str) -> bool {
        self.table.contains(&fold(postal))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// States in source-row order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<StateRecord>> {
        self.table.iter().map(|(_, state)| state)
    }
}

impl fmt::Debug for StateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Build one state and its counties atomically.
///
/// County rows are parsed into records before the cyclic allocation, so a
/// malformed row cannot leave a half-linked state behind; the
/// `Arc::new_cyclic` closure only links already-validated records to the
/// state's weak handle and indexes them.
fn link_state(
    postal: &str,
    state_fips: &str,
    record: Record,
    county_rows: Vec<Row>,
) -> Result<Arc<StateRecord>, LoadError> {
    let mut parsed: Vec<(CountyCode, Record)> = Vec::with_capacity(county_rows.len());
    for row in county_rows {
        let mut county = Record::from_pairs(row);
        county
            .alias("CODE", COUNTYFP)
            .map_err(|_| LoadError::MissingColumn { column: COUNTYFP })?;
        county
            .alias("FIPS", COUNTYFP)
            .map_err(|_| LoadError::MissingColumn { column: COUNTYFP })?;
        let raw = county.get(COUNTYFP).expect("aliased above");
        let code = CountyCode::parse(raw).ok_or_else(|| LoadError::InvalidCountyCode {
            state_fips: state_fips.to_string(),
            code: raw.to_string(),
        })?;
        parsed.push((code, county));
    }

    let mut duplicate = None;
    let state = Arc::new_cyclic(|weak| {
        let entries = parsed
            .into_iter()
            .map(|(code, rec)| (code, CountyRecord::new(code, rec, weak.clone())))
            .collect();
        match CountyIndex::build(entries) {
            Ok(counties) => StateRecord { record, counties },
            Err(source) => {
                duplicate = Some(source);
                // Placeholder; dropped without ever being published.
                StateRecord {
                    record: Record::new(),
                    counties: CountyIndex::empty(),
                }
            }
        }
    });

    match duplicate {
        None => Ok(state),
        Some(source) => Err(LoadError::DuplicateCode {
            postal: postal.to_string(),
            source,
        }),
    }
}
