//! End-to-end engine scenarios: exact-match idempotence, disambiguated
//! joins, unrelated clusters, and cross-session recognition.

use tally_core::config::TallyConfig;
use tally_core::identity::RecordId;
use tally_core::traits::ClassifierStore;
use tally_groups::{GroupEngine, ScriptedResolver};
use tally_storage::SqliteStore;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn test_config() -> TallyConfig {
    let mut cfg = TallyConfig::default();
    // WOOLWORTHS 123 / WOOLWORTHS 456 sit near 0.79 similarity; the
    // default 0.85 would keep them apart.
    cfg.similarity.threshold = 0.75;
    cfg.classifier.min_samples = 2;
    cfg
}

fn in_memory_engine(answers: Vec<Option<usize>>) -> GroupEngine<u32> {
    GroupEngine::new(
        test_config(),
        Box::new(SqliteStore::open_in_memory().unwrap()),
        Box::new(ScriptedResolver::new(answers)),
    )
}

#[test]
fn exact_match_is_idempotent() {
    init_tracing();
    let mut engine = in_memory_engine(vec![]);
    let group = engine.add("WOOLWORTHS 123", 1).unwrap();

    for _ in 0..5 {
        let found = engine.find_group("WOOLWORTHS 123").unwrap();
        assert_eq!(found, Some(group));
    }
    assert_eq!(engine.groups().len(), 1);
}

#[test]
fn related_description_joins_after_disambiguation() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("tally.db");
    let mut engine: GroupEngine<u32> = GroupEngine::new(
        test_config(),
        Box::new(SqliteStore::open(&db_path).unwrap()),
        Box::new(ScriptedResolver::new(vec![Some(0)])),
    );

    let group = engine.add("WOOLWORTHS 123", 1).unwrap();
    let joined = engine.add("WOOLWORTHS 456", 2).unwrap();

    assert_eq!(joined, group);
    assert_eq!(engine.groups().size(group), 2);
    assert_eq!(engine.groups().len(), 1);

    // Both identities resolve to the seed's canonical identity.
    let observer = SqliteStore::open(&db_path).unwrap();
    let canonical = RecordId::derive("WOOLWORTHS 123");
    assert_eq!(observer.canonical(&canonical).unwrap(), canonical);
    assert_eq!(
        observer.canonical(&RecordId::derive("WOOLWORTHS 456")).unwrap(),
        canonical
    );
}

#[test]
fn unrelated_descriptions_form_distinct_clusters() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("tally.db");
    let mut engine: GroupEngine<u32> = GroupEngine::new(
        test_config(),
        Box::new(SqliteStore::open(&db_path).unwrap()),
        Box::new(ScriptedResolver::new(vec![])),
    );

    let rent = engine.add("RENT PAYMENT", 1).unwrap();
    let grocery = engine.add("UNRELATED GROCERY STORE", 2).unwrap();

    assert_ne!(rent, grocery);
    assert_eq!(engine.groups().len(), 2);

    // Each identity is its own canonical identity; no cross-association.
    let observer = SqliteStore::open(&db_path).unwrap();
    let rent_id = RecordId::derive("RENT PAYMENT");
    let grocery_id = RecordId::derive("UNRELATED GROCERY STORE");
    assert_eq!(observer.canonical(&rent_id).unwrap(), rent_id);
    assert_eq!(observer.canonical(&grocery_id).unwrap(), grocery_id);
}

#[test]
fn previous_session_associations_are_recognized() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("tally.db");

    // Session 1: confirm that 456 belongs with 123.
    {
        let mut engine: GroupEngine<u32> = GroupEngine::new(
            test_config(),
            Box::new(SqliteStore::open(&db_path).unwrap()),
            Box::new(ScriptedResolver::new(vec![Some(0)])),
        );
        engine.add("WOOLWORTHS 123", 1).unwrap();
        engine.add("WOOLWORTHS 456", 2).unwrap();
    }

    // Session 2: the same descriptions regroup with no human input.
    {
        let mut engine: GroupEngine<u32> = GroupEngine::new(
            test_config(),
            Box::new(SqliteStore::open(&db_path).unwrap()),
            Box::new(ScriptedResolver::new(vec![])),
        );
        let first = engine.add("WOOLWORTHS 123", 1).unwrap();
        let second = engine.add("WOOLWORTHS 456", 2).unwrap();

        assert_eq!(first, second, "persisted association must reunite the cluster");
        assert_eq!(engine.groups().size(first), 2);
        assert_eq!(engine.groups().len(), 1);
    }
}

#[test]
fn association_shortcut_without_loaded_cluster_reports_no_match() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("tally.db");

    {
        let mut engine: GroupEngine<u32> = GroupEngine::new(
            test_config(),
            Box::new(SqliteStore::open(&db_path).unwrap()),
            Box::new(ScriptedResolver::new(vec![Some(0)])),
        );
        engine.add("WOOLWORTHS 123", 1).unwrap();
        engine.add("WOOLWORTHS 456", 2).unwrap();
    }

    // Fresh session: 456 is associated on disk, but its canonical
    // cluster has not been loaded, so the engine must not guess.
    let mut engine: GroupEngine<u32> = GroupEngine::new(
        test_config(),
        Box::new(SqliteStore::open(&db_path).unwrap()),
        Box::new(ScriptedResolver::new(vec![])),
    );
    assert_eq!(engine.find_group("WOOLWORTHS 456").unwrap(), None);
}

#[test]
fn repeated_confirmations_grow_one_cluster() {
    init_tracing();
    let mut engine = in_memory_engine(vec![Some(0); 8]);

    // An unrelated cluster supplies counter-material for training.
    engine.add("RENT PAYMENT", 0).unwrap();

    let seed = engine.add("WOOLWORTHS 1001", 1).unwrap();
    for (i, description) in ["WOOLWORTHS 1002", "WOOLWORTHS 1003", "WOOLWORTHS 1004"]
        .into_iter()
        .enumerate()
    {
        let group = engine.add(description, i as u32 + 2).unwrap();
        assert_eq!(group, seed, "{description} must join the seed cluster");
    }

    assert_eq!(engine.groups().size(seed), 4);
    assert_eq!(engine.groups().len(), 2);

    // The seed cluster's classifier has accepted enough distinct
    // members to trust its readiness flags.
    let classifier = engine.classifier_for_key("WOOLWORTHS 1001").unwrap();
    assert!(classifier.meets_threshold());
}
