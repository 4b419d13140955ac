//! Session layer: drive a record stream through the engine and read the
//! resulting clusters back out as `(cluster key, category)` assignments.

use once_cell::sync::Lazy;
use regex::Regex;

use tally_core::errors::EngineError;
use tally_core::record::Record;

use crate::engine::GroupEngine;

static SQUEEZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("static pattern"));

/// Collapse runs of whitespace before grouping, so bank-export padding
/// does not fragment clusters.
pub fn normalize_description(text: &str) -> String {
    SQUEEZE.replace_all(text, " ").into_owned()
}

/// One cluster as the session boundary sees it.
#[derive(Debug, Clone)]
pub struct ClusterSummary {
    /// The cluster's seed description.
    pub key: String,
    /// First categorized member's label, if any member carries one.
    pub category: Option<String>,
    pub members: Vec<Record>,
}

/// Feed records through the engine and return the clusters, member lists
/// in insertion order.
pub fn coalesce(
    engine: &mut GroupEngine<Record>,
    records: impl IntoIterator<Item = Record>,
) -> Result<Vec<ClusterSummary>, EngineError> {
    for record in records {
        let text = normalize_description(&record.description);
        engine.add(&text, record)?;
    }
    Ok(clusters(engine))
}

/// Current clusters, without feeding anything new.
pub fn clusters(engine: &GroupEngine<Record>) -> Vec<ClusterSummary> {
    engine
        .groups()
        .group_ids()
        .map(|group| {
            let members: Vec<Record> = engine
                .groups()
                .members(group)
                .map(|(_, record)| record.clone())
                .collect();
            let category = members
                .iter()
                .find_map(|record| record.category.clone());
            ClusterSummary {
                key: engine.groups().key(group).to_string(),
                category,
                members,
            }
        })
        .collect()
}

/// `(cluster key, category)` pairs for the session boundary.
pub fn assignments(engine: &GroupEngine<Record>) -> Vec<(String, Option<String>)> {
    clusters(engine)
        .into_iter()
        .map(|summary| (summary.key, summary.category))
        .collect()
}
