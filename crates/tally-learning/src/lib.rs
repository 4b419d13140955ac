//! # tally-learning
//!
//! The trainable half of the system: a small feed-forward scorer over
//! encoded description text, the polarization detector that bounds
//! training, and the per-cluster classifier that ties both to durable
//! storage.

pub mod classifier;
pub mod convergence;
pub mod scorer;

pub use classifier::ClusterClassifier;
pub use convergence::PolarizationDetector;
pub use scorer::DescriptionScorer;
