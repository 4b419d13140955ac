use super::StorageError;

/// Errors surfaced by the group engine.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// An exact-match group was found without a loaded classifier. Groups
    /// and classifiers are created together, so this cannot happen unless
    /// the engine's bookkeeping is broken.
    #[error("no classifier loaded for exact-match cluster {key}")]
    ClassifierMissing { key: String },
}
