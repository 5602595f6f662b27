#![cfg(test)]

// Property tests for Record kept inside the crate so they can reach the
// crate-private constructor without feature gates.

use crate::record::{fold, Record};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn name_strategy() -> impl Strategy<Value = String> {
    // Mixed-case ASCII names, sometimes colliding after the fold.
    proptest::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,7}").unwrap()
}

proptest! {
    // Invariant: a record behaves like a map over folded names with
    // last-write-wins values; lookup succeeds under any casing of a
    // present name and fails for absent ones.
    #[test]
    fn prop_record_matches_folded_model(
        pairs in proptest::collection::vec((name_strategy(), "[a-z0-9 ]{0,6}"), 0..32),
        probe in name_strategy(),
    ) {
        let mut model: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &pairs {
            model.insert(fold(name).into_owned(), value.clone());
        }
        let record = Record::from_pairs(pairs);

        prop_assert_eq!(record.len(), model.len());
        for (name, value) in &model {
            prop_assert_eq!(record.get(name).unwrap(), value.as_str());
            prop_assert_eq!(record.get(&name.to_lowercase()).unwrap(), value.as_str());
        }
        match model.get(&*fold(&probe)) {
            Some(value) => prop_assert_eq!(record.get(&probe).unwrap(), value.as_str()),
            None => prop_assert!(record.get(&probe).is_err()),
        }
    }

    // Invariant: iteration order is first-seen order of folded names,
    // regardless of how many later writes hit the same entry.
    #[test]
    fn prop_record_iterates_in_first_seen_order(
        pairs in proptest::collection::vec((name_strategy(), "[a-z]{0,4}"), 0..32),
    ) {
        let mut first_seen: Vec<String> = Vec::new();
        for (name, _) in &pairs {
            let folded = fold(name).into_owned();
            if !first_seen.contains(&folded) {
                first_seen.push(folded);
            }
        }
        let record = Record::from_pairs(pairs);
        let order: Vec<String> = record.iter().map(|(k, _)| k.to_string()).collect();
        prop_assert_eq!(order, first_seen);
    }
}
