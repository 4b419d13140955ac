//! File-backed persistence: restart survival, association invariants,
//! metadata write ordering.

use tally_core::errors::StorageError;
use tally_core::identity::RecordId;
use tally_core::traits::ClassifierStore;
use tally_storage::SqliteStore;

fn weights_blob(tag: u8) -> Vec<u8> {
    vec![tag; 16]
}

#[test]
fn store_creates_reflexive_association() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = RecordId::derive("WOOLWORTHS 123");

    assert!(!store.have(&id).unwrap());
    store.store(&id, &weights_blob(1), false, false).unwrap();

    assert!(store.have(&id).unwrap());
    assert_eq!(store.canonical(&id).unwrap(), id);
}

#[test]
fn canonical_of_unassociated_identity_is_not_found() {
    let store = SqliteStore::open_in_memory().unwrap();
    let err = store.canonical(&RecordId::derive("NEVER SEEN")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn alias_resolves_through_canonical() {
    let store = SqliteStore::open_in_memory().unwrap();
    let canonical = RecordId::derive("WOOLWORTHS 123");
    let alias = RecordId::derive("WOOLWORTHS 456");

    store.store(&canonical, &weights_blob(1), true, false).unwrap();
    store.associate(&canonical, &alias).unwrap();

    assert_eq!(store.canonical(&alias).unwrap(), canonical);
    // Loading by alias lands on the canonical cluster's weights.
    let state = store.load(&alias).unwrap().unwrap();
    assert_eq!(state.weights, weights_blob(1));
    assert!(state.accept_ready);
    assert!(!state.reject_ready);
}

#[test]
fn associate_is_idempotent_for_same_mapping() {
    let store = SqliteStore::open_in_memory().unwrap();
    let canonical = RecordId::derive("RENT PAYMENT");
    let alias = RecordId::derive("RENT PAYMENT 002");

    store.associate(&canonical, &alias).unwrap();
    store.associate(&canonical, &alias).unwrap();
    assert_eq!(store.canonical(&alias).unwrap(), canonical);
}

#[test]
fn associate_to_different_canonical_fails_loudly() {
    let store = SqliteStore::open_in_memory().unwrap();
    let first = RecordId::derive("CLUSTER A");
    let second = RecordId::derive("CLUSTER B");
    let alias = RecordId::derive("CONTESTED MEMBER");

    store.associate(&first, &alias).unwrap();
    let err = store.associate(&second, &alias).unwrap_err();
    assert!(matches!(err, StorageError::AssociationConflict { .. }));
    // The original mapping is untouched.
    assert_eq!(store.canonical(&alias).unwrap(), first);
}

#[test]
fn metadata_write_without_weights_is_unknown_cluster() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = RecordId::derive("NO WEIGHTS YET");
    let err = store
        .store_metadata(&id, true, true, &[id.clone()])
        .unwrap_err();
    assert!(matches!(err, StorageError::UnknownCluster { .. }));
}

#[test]
fn metadata_round_trips_accepted_set() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = RecordId::derive("GROCERIES");
    let members = vec![
        RecordId::derive("GROCERIES"),
        RecordId::derive("GROCERIES 2"),
    ];

    store.store(&id, &weights_blob(3), false, false).unwrap();
    store.store_metadata(&id, true, true, &members).unwrap();

    let state = store.load(&id).unwrap().unwrap();
    assert!(state.accept_ready);
    assert!(state.reject_ready);
    assert_eq!(state.accepted, members);
}

#[test]
fn associations_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("tally.db");
    let canonical = RecordId::derive("WOOLWORTHS 123");
    let alias = RecordId::derive("WOOLWORTHS 456");

    // Session 1: create a cluster and an alias.
    {
        let store = SqliteStore::open(&db_path).unwrap();
        store.store(&canonical, &weights_blob(7), true, true).unwrap();
        store.associate(&canonical, &alias).unwrap();
    }

    // Session 2: resolution is unchanged.
    {
        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.canonical(&alias).unwrap(), canonical);
        assert_eq!(store.canonical(&canonical).unwrap(), canonical);
        let state = store.load(&alias).unwrap().unwrap();
        assert_eq!(state.weights, weights_blob(7));

        let owned = store.aliases_of(&canonical).unwrap();
        assert!(owned.contains(&alias));
        assert!(owned.contains(&canonical));
    }
}

#[test]
fn load_of_unknown_identity_is_none() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert!(store.load(&RecordId::derive("FRESH")).unwrap().is_none());
}
