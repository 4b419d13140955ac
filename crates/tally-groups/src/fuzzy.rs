//! Fuzzy string grouping.
//!
//! Groups are keyed by their seed string and accumulate members over
//! time. A candidate lookup scores every group against the probe string;
//! groups that have gathered enough members tighten their own acceptance
//! threshold from the spread of pairwise member similarity, so a dense
//! group stops attracting loosely-similar strangers.

use std::collections::HashMap;

use crate::similarity::{length_allows, nlcs};

/// Amount a group's self-derived threshold is loosened to capture
/// member variation.
const THRESHOLD_SLACK: f64 = 0.03;

/// Opaque handle to a group, stable for the life of the `StringGroups`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

/// A scored candidate from [`StringGroups::grps_for`].
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub id: GroupId,
    /// Similarity minus the effective acceptance threshold.
    score: f64,
}

impl Candidate {
    /// Still within the similarity acceptance threshold.
    pub fn is_acceptable(&self) -> bool {
        self.score >= 0.0
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

struct Group<V> {
    key: String,
    key_len: usize,
    items: Vec<(String, V)>,
    /// Per-group acceptance threshold, tightened from member spread.
    threshold: f64,
    /// Membership changed since the threshold was last derived.
    dirty: bool,
}

/// Collection of fuzzily-grouped strings with opaque payloads.
pub struct StringGroups<V> {
    threshold: f64,
    /// Member count at which groups derive their own threshold;
    /// 0 disables dynamic thresholds entirely.
    window: usize,
    groups: Vec<Group<V>>,
    /// Every string ever added, mapped to the group it joined.
    known: HashMap<String, GroupId>,
}

impl<V> StringGroups<V> {
    pub fn new(threshold: f64, window: usize) -> Self {
        Self {
            threshold,
            window,
            groups: Vec::new(),
            known: HashMap::new(),
        }
    }

    /// Group that some earlier `add`/`add_to` call used for exactly this
    /// string.
    pub fn grp_exact(&self, text: &str) -> Option<GroupId> {
        self.known.get(text).copied()
    }

    /// Score every group against `text`, ranked best-first. Acceptable
    /// candidates ("needles") sort ahead of the rest ("hay").
    pub fn grps_for(&mut self, text: &str) -> Vec<Candidate> {
        let probe_len = text.chars().count();
        let global = self.threshold;
        let window = self.window;

        let mut candidates: Vec<Candidate> = self
            .groups
            .iter_mut()
            .enumerate()
            .map(|(index, group)| {
                if window > 0 && group.dirty {
                    group.derive_threshold(global);
                }
                let score = if length_allows(group.threshold, group.key_len, probe_len) {
                    let similarity = nlcs(&group.key, text);
                    // Meeting the group's own (possibly tighter) bar is
                    // what acceptance means; the margin is always taken
                    // against the global threshold so ranking stays
                    // comparable across groups.
                    if similarity >= group.threshold {
                        similarity - global
                    } else {
                        similarity - group.threshold
                    }
                } else {
                    // Sentinel well below any reachable margin.
                    -2.0
                };
                Candidate {
                    id: GroupId(index),
                    score,
                }
            })
            .collect();

        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates
    }

    /// Create a new group seeded with `text`.
    pub fn add(&mut self, text: &str, value: V) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(Group {
            key: text.to_string(),
            key_len: text.chars().count(),
            items: vec![(text.to_string(), value)],
            threshold: self.threshold,
            dirty: false,
        });
        self.known.insert(text.to_string(), id);
        id
    }

    /// Append a member to an existing group.
    pub fn add_to(&mut self, id: GroupId, text: &str, value: V) {
        let window = self.window;
        let group = &mut self.groups[id.0];
        group.items.push((text.to_string(), value));
        group.dirty = window > 0 && group.items.len() >= window;
        self.known.insert(text.to_string(), id);
    }

    /// The group's seed string.
    pub fn key(&self, id: GroupId) -> &str {
        &self.groups[id.0].key
    }

    /// Members in insertion order as `(key, payload)` pairs.
    pub fn members(&self, id: GroupId) -> impl Iterator<Item = (&str, &V)> {
        self.groups[id.0]
            .items
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn size(&self, id: GroupId) -> usize {
        self.groups[id.0].items.len()
    }

    /// All group handles in creation order.
    pub fn group_ids(&self) -> impl Iterator<Item = GroupId> {
        (0..self.groups.len()).map(GroupId)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<V> Group<V> {
    /// Minimum pairwise member similarity, slackened, floored at the
    /// global threshold.
    fn derive_threshold(&mut self, global: f64) {
        let mut low = 1.0f64;
        for (i, (a, _)) in self.items.iter().enumerate() {
            for (b, _) in self.items.iter().skip(i + 1) {
                low = low.min(nlcs(a, b));
            }
        }
        self.threshold = (low - THRESHOLD_SLACK).max(global);
        self.dirty = false;
    }
}
