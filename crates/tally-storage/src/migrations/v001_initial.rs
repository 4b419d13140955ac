//! V001: classifier weights and identity associations.

pub const MIGRATION_SQL: &str = r#"
-- Serialized classifier state, keyed by the cluster's canonical identity
-- (the identity of its seed description). Readiness flags and the
-- accepted-identity set ride the same row so a metadata update is a
-- single-statement write.
CREATE TABLE IF NOT EXISTS weights (
    canonical_id        TEXT PRIMARY KEY,
    accept_ready        INTEGER NOT NULL DEFAULT 0,
    reject_ready        INTEGER NOT NULL DEFAULT 0,
    serialized_weights  BLOB NOT NULL,
    accepted_ids        TEXT NOT NULL DEFAULT '[]'
) STRICT;

-- Alias identity -> canonical identity. A canonical identity maps to
-- itself. The canonical_id index answers "which aliases does this cluster
-- own" sweeps without a table scan.
CREATE TABLE IF NOT EXISTS assoc (
    alias_id      TEXT PRIMARY KEY,
    canonical_id  TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_assoc_canonical ON assoc(canonical_id);
"#;
