//! The group engine: decides which cluster a description belongs to.
//!
//! Decision order for a new description: exact string match, then the
//! on-disk association shortcut, then fuzzy candidates scored by their
//! per-cluster classifiers, and only when the automated signals disagree,
//! the human resolver. Every resolved decision is reinforced through the
//! training protocol so the next session needs less help.

use std::collections::HashMap;

use tracing::debug;

use tally_core::config::TallyConfig;
use tally_core::errors::EngineError;
use tally_core::identity::RecordId;
use tally_core::traits::{ClassifierStore, Resolver};
use tally_learning::ClusterClassifier;

use crate::fuzzy::{GroupId, StringGroups};

/// Incremental group/classifier engine over payloads of type `V`.
///
/// Owns the fuzzy group collection, a per-session classifier cache keyed
/// by canonical identity, the persistence backend, and the injected
/// resolver. Single-threaded by design: the only blocking operation is
/// the resolver, and that block is deliberate.
pub struct GroupEngine<V> {
    pub(crate) groups: StringGroups<V>,
    /// Classifier cache, lazily populated, session lifetime.
    pub(crate) classifiers: HashMap<RecordId, ClusterClassifier>,
    /// Canonical identity -> seed key of the loaded cluster.
    pub(crate) canonical_keys: HashMap<RecordId, String>,
    pub(crate) store: Box<dyn ClassifierStore>,
    pub(crate) resolver: Box<dyn Resolver>,
    pub(crate) cfg: TallyConfig,
}

impl<V> GroupEngine<V> {
    /// Build an engine over the given backend and resolver. The backend
    /// is fixed for the session; there is no runtime switching.
    pub fn new(cfg: TallyConfig, store: Box<dyn ClassifierStore>, resolver: Box<dyn Resolver>) -> Self {
        let groups = StringGroups::new(cfg.similarity.threshold, cfg.similarity.window);
        Self {
            groups,
            classifiers: HashMap::new(),
            canonical_keys: HashMap::new(),
            store,
            resolver,
            cfg,
        }
    }

    /// Read access to the grouped descriptions.
    pub fn groups(&self) -> &StringGroups<V> {
        &self.groups
    }

    /// The loaded classifier for a cluster key, if any.
    pub fn classifier_for_key(&self, key: &str) -> Option<&ClusterClassifier> {
        let id = RecordId::derive(key);
        let canonical = match self.store.canonical(&id) {
            Ok(canonical) => canonical,
            Err(error) if error.is_not_found() => id,
            Err(_) => return None,
        };
        self.classifiers.get(&canonical)
    }

    /// Resolve the cluster a description belongs to, or `None` when a new
    /// cluster should be created. Trains the involved classifiers as a
    /// side effect of every resolved decision.
    pub fn find_group(&mut self, text: &str) -> Result<Option<GroupId>, EngineError> {
        // Exact match: this very string was grouped earlier in the
        // session. Its cluster's classifier was loaded at that point.
        if let Some(group) = self.groups.grp_exact(text) {
            let canonical = self.canonical_for_key(&self.groups.key(group).to_owned())?;
            if !self.classifiers.contains_key(&canonical) {
                return Err(EngineError::ClassifierMissing {
                    key: self.groups.key(group).to_string(),
                });
            }
            return Ok(Some(group));
        }

        // On-disk shortcut: the identity was associated in a previous
        // session. If its cluster is not loaded right now we cannot place
        // the record this pass; report no match instead of guessing.
        let id = RecordId::derive(text);
        if self.store.have(&id)? {
            let canonical = self.store.canonical(&id)?;
            if let Some(key) = self.canonical_keys.get(&canonical) {
                return Ok(self.groups.grp_exact(key));
            }
            debug!(identity = %id, "associated identity but cluster not loaded");
            return Ok(None);
        }

        // Fuzzy candidates, needles first.
        let candidates = self.groups.grps_for(text);
        let needle_count = candidates.iter().take_while(|c| c.is_acceptable()).count();
        if needle_count == 0 {
            return Ok(None);
        }
        let needles: Vec<GroupId> = candidates[..needle_count].iter().map(|c| c.id).collect();
        let hay: Vec<GroupId> = candidates[needle_count..].iter().map(|c| c.id).collect();

        let mut needle_ids = Vec::with_capacity(needles.len());
        for &needle in &needles {
            needle_ids.push(self.ensure_classifier(needle)?);
        }

        let passes: Vec<usize> = needle_ids
            .iter()
            .enumerate()
            .filter(|(_, cid)| self.classifiers[*cid].run(text) >= 0.5)
            .map(|(index, _)| index)
            .collect();
        let all_ready = needle_ids.iter().all(|cid| self.classifiers[cid].is_ready());
        let all_reject_ready = needle_ids
            .iter()
            .all(|cid| self.classifiers[cid].reject_ready());

        let pick = if all_ready && passes.len() == 1 {
            debug!(cluster = self.groups.key(needles[passes[0]]), "unanimous classifier match");
            Some(needles[passes[0]])
        } else if all_reject_ready
            && passes.len() == 1
            && self.classifiers[&needle_ids[passes[0]]].is_ready()
        {
            debug!(cluster = self.groups.key(needles[passes[0]]), "single ready classifier match");
            Some(needles[passes[0]])
        } else {
            // Automated evidence is insufficient; ask.
            let keys: Vec<String> = needles
                .iter()
                .map(|&needle| self.groups.key(needle).to_string())
                .collect();
            self.resolver
                .resolve(text, &keys)
                .filter(|&index| index < needles.len())
                .map(|index| needles[index])
        };

        self.train(pick, &needles, &hay, text)?;
        Ok(pick)
    }

    /// Record `text` in `group`, or seed a new cluster when `group` is
    /// `None`, maintaining identity associations either way.
    pub fn insert(
        &mut self,
        text: &str,
        value: V,
        group: Option<GroupId>,
    ) -> Result<GroupId, EngineError> {
        let id = RecordId::derive(text);
        match group {
            Some(group) => {
                self.groups.add_to(group, text, value);
                let canonical = self.canonical_for_key(&self.groups.key(group).to_owned())?;
                if !self.store.have(&id)? {
                    self.store.associate(&canonical, &id)?;
                }
                Ok(group)
            }
            None => {
                let group = self.groups.add(text, value);
                let canonical = if self.store.have(&id)? {
                    self.store.canonical(&id)?
                } else {
                    self.store.associate(&id, &id)?;
                    id
                };
                self.canonical_keys.insert(canonical.clone(), text.to_string());
                // Cluster and classifier are born together. A classifier
                // persisted by an earlier session under this identity is
                // picked up instead of a fresh one.
                let classifier = ClusterClassifier::load(
                    &*self.store,
                    canonical.clone(),
                    text,
                    &self.cfg.classifier,
                )?;
                self.classifiers.insert(canonical, classifier);
                Ok(group)
            }
        }
    }

    /// Group a description: resolve its cluster, then insert.
    pub fn add(&mut self, text: &str, value: V) -> Result<GroupId, EngineError> {
        let group = self.find_group(text)?;
        self.insert(text, value, group)
    }

    /// Canonical identity for a cluster key: the stored association when
    /// one exists, otherwise the key's own identity.
    pub(crate) fn canonical_for_key(&self, key: &str) -> Result<RecordId, EngineError> {
        let id = RecordId::derive(key);
        if self.store.have(&id)? {
            Ok(self.store.canonical(&id)?)
        } else {
            Ok(id)
        }
    }

    /// Load the classifier for a needle on first need and remember which
    /// key its canonical identity is loaded under.
    pub(crate) fn ensure_classifier(&mut self, group: GroupId) -> Result<RecordId, EngineError> {
        let key = self.groups.key(group).to_owned();
        let canonical = self.canonical_for_key(&key)?;
        if !self.classifiers.contains_key(&canonical) {
            let classifier = ClusterClassifier::load(
                &*self.store,
                canonical.clone(),
                &key,
                &self.cfg.classifier,
            )?;
            self.classifiers.insert(canonical.clone(), classifier);
        }
        self.canonical_keys.entry(canonical.clone()).or_insert(key);
        Ok(canonical)
    }
}
