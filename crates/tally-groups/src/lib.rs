//! # tally-groups
//!
//! Incremental grouping of transaction descriptions: the fuzzy
//! string-grouping primitive, the group engine that decides which cluster
//! a description belongs to, the training protocol that reinforces those
//! decisions, and the session layer that drives a record stream through
//! the engine.

pub mod engine;
pub mod fuzzy;
pub mod interact;
pub mod session;
pub mod similarity;
mod train;

pub use engine::GroupEngine;
pub use fuzzy::{Candidate, GroupId, StringGroups};
pub use interact::{ScriptedResolver, TerminalResolver};
pub use session::{assignments, coalesce, normalize_description, ClusterSummary};
