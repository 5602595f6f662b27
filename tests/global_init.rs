// Once-init publication semantics for the process-wide table. Kept in its
// own integration binary so the OnceLock state is isolated from every
// other test process.
use fips::{AlreadyInitializedError, StateIndex};

fn tiny_index() -> StateIndex {
    let state_rows = vec![vec![
        ("STATEFP".to_string(), "10".to_string()),
        ("STUSPS".to_string(), "DE".to_string()),
    ]];
    let county_rows = vec![vec![
        ("STATEFP".to_string(), "10".to_string()),
        ("COUNTYFP".to_string(), "001".to_string()),
    ]];
    StateIndex::from_rows(state_rows, county_rows).unwrap()
}

// Test: init publishes exactly once.
// Assumes: nothing else in this test binary touches the global.
// Verifies: states() is None before init, the published reference is
// shared afterward, and re-initialization is an error rather than a
// rebuild.
#[test]
fn init_publishes_once_and_rejects_reinit() {
    assert!(fips::states().is_none());

    let published = fips::init(tiny_index()).expect("first init succeeds");
    assert!(published.contains("de"));

    let shared = fips::states().expect("published table is visible");
    assert!(std::ptr::eq(published, shared));

    let reinit = fips::init(tiny_index());
    assert!(matches!(reinit, Err(AlreadyInitializedError)));
    assert!(fips::states().expect("still published").contains("DE"));
}
