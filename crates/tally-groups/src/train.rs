//! The training protocol: reinforce a resolved grouping decision.
//!
//! A positive pass teaches the picked cluster's classifier to accept the
//! new description alongside its existing members while rejecting the
//! other candidates' material. Negative passes teach every other needle
//! to reject the description without losing recognition of its own
//! members. All loops are bounded by the iteration cap and cut short by
//! the polarization detector.

use tracing::{debug, warn};

use tally_core::errors::EngineError;
use tally_core::identity::RecordId;

use crate::engine::GroupEngine;
use crate::fuzzy::GroupId;

/// How a bounded training loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrainOutcome {
    /// The stop condition was met.
    Trained,
    /// The polarization detector fired; more material is needed.
    Polarized,
    /// The iteration cap was exhausted without convergence.
    Capped,
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic Fisher-Yates keyed by the probe text's identity, so a
/// rerun of the same session shuffles the same way.
fn shuffle(pool: &mut [String], seed: u64) {
    let mut state = seed;
    for i in (1..pool.len()).rev() {
        let j = (splitmix64(&mut state) % (i as u64 + 1)) as usize;
        pool.swap(i, j);
    }
}

impl<V> GroupEngine<V> {
    /// Run the protocol for a resolved decision. `pick` is `None` when
    /// the description matched nothing; the needles then only receive
    /// negative reinforcement, with hay members as extra counter-material,
    /// and every involved classifier is persisted before reporting back.
    pub(crate) fn train(
        &mut self,
        pick: Option<GroupId>,
        needles: &[GroupId],
        hay: &[GroupId],
        text: &str,
    ) -> Result<(), EngineError> {
        if let Some(picked) = pick {
            let outcome = self.positive_pass(picked, needles, hay, text)?;
            if outcome == TrainOutcome::Polarized {
                warn!(cluster = self.groups.key(picked), "classifier polarized during training");
                self.resolver.warn(&format!(
                    "not enough training material to separate \"{}\" from its neighbours",
                    self.groups.key(picked)
                ));
            }
        }

        let hay_pool = if pick.is_none() {
            self.hay_sample(hay)
        } else {
            Vec::new()
        };
        for &needle in needles {
            if Some(needle) == pick {
                continue;
            }
            self.negative_pass(needle, text, &hay_pool)?;
        }

        if pick.is_none() {
            // No match was resolved; make sure nothing learned in this
            // round is left behind in memory only.
            for &needle in needles {
                let canonical = self.ensure_classifier(needle)?;
                if let Some(classifier) = self.classifiers.get_mut(&canonical) {
                    classifier.persist(&*self.store)?;
                }
            }
        }
        Ok(())
    }

    /// Teach `picked` to accept `text` and its own members while
    /// rejecting the other needles' members plus a sample of hay.
    fn positive_pass(
        &mut self,
        picked: GroupId,
        needles: &[GroupId],
        hay: &[GroupId],
        text: &str,
    ) -> Result<TrainOutcome, EngineError> {
        let mut accept_pool: Vec<String> = self
            .groups
            .members(picked)
            .map(|(key, _)| key.to_string())
            .collect();
        shuffle(&mut accept_pool, RecordId::derive(text).seed());
        accept_pool.insert(0, text.to_string());

        let mut reject_pool: Vec<String> = needles
            .iter()
            .filter(|&&needle| needle != picked)
            .flat_map(|&needle| self.groups.members(needle).map(|(key, _)| key.to_string()))
            .collect();
        reject_pool.extend(self.hay_sample(hay));

        let canonical = self.ensure_classifier(picked)?;
        let outcome = self.run_training_loop(&canonical, &accept_pool, &reject_pool)?;
        debug!(cluster = self.groups.key(picked), ?outcome, "positive pass finished");
        Ok(outcome)
    }

    /// Teach `needle` to reject `text` while re-accepting its own
    /// members. A capped loop resets the classifier and retrains it from
    /// scratch on its own membership rather than leaving it degraded.
    fn negative_pass(
        &mut self,
        needle: GroupId,
        text: &str,
        hay_pool: &[String],
    ) -> Result<(), EngineError> {
        let accept_pool: Vec<String> = self
            .groups
            .members(needle)
            .map(|(key, _)| key.to_string())
            .collect();
        let mut reject_pool = vec![text.to_string()];
        reject_pool.extend_from_slice(hay_pool);

        let canonical = self.ensure_classifier(needle)?;
        let outcome = self.run_negative_loop(&canonical, &accept_pool, &reject_pool)?;
        if outcome == TrainOutcome::Capped {
            // Give up and restart: retrain from scratch on the cluster's
            // own history instead of keeping a perpetually degraded net.
            let classifier = self
                .classifiers
                .get_mut(&canonical)
                .expect("classifier was just ensured");
            classifier.reset();
            let retry = self.run_negative_loop(&canonical, &accept_pool, &reject_pool)?;
            if retry != TrainOutcome::Trained {
                warn!(
                    cluster = self.groups.key(needle),
                    ?retry,
                    "retraining after reset did not converge"
                );
            }
        }
        Ok(())
    }

    /// Alternate accept/reject over the pools until the classifier is
    /// trained, polarization fires, or the cap is hit. With no
    /// counter-material at all, stop once acceptance holds.
    pub(crate) fn run_training_loop(
        &mut self,
        canonical: &RecordId,
        accept_pool: &[String],
        reject_pool: &[String],
    ) -> Result<TrainOutcome, EngineError> {
        let cap = self.cfg.training.iteration_cap;
        let store = &*self.store;
        let classifier = self
            .classifiers
            .get_mut(canonical)
            .expect("training a classifier that was never loaded");

        for i in 0..cap {
            classifier.accept(&accept_pool[i % accept_pool.len()], store)?;
            if let Some(example) = reject_pool.get(i % reject_pool.len().max(1)) {
                classifier.reject(example, store)?;
            }
            if classifier.is_trained() || (reject_pool.is_empty() && classifier.accept_ready()) {
                return Ok(TrainOutcome::Trained);
            }
            if classifier.is_polarised() {
                return Ok(TrainOutcome::Polarized);
            }
        }
        Ok(TrainOutcome::Capped)
    }

    /// Negative-pass variant: a needle that has not yet met its sample
    /// threshold only needs reject-readiness, not full training.
    fn run_negative_loop(
        &mut self,
        canonical: &RecordId,
        accept_pool: &[String],
        reject_pool: &[String],
    ) -> Result<TrainOutcome, EngineError> {
        let cap = self.cfg.training.iteration_cap;
        let store = &*self.store;
        let classifier = self
            .classifiers
            .get_mut(canonical)
            .expect("training a classifier that was never loaded");

        for i in 0..cap {
            classifier.accept(&accept_pool[i % accept_pool.len()], store)?;
            classifier.reject(&reject_pool[i % reject_pool.len()], store)?;
            let done = classifier.is_trained()
                || (!classifier.meets_threshold() && classifier.reject_ready());
            if done {
                return Ok(TrainOutcome::Trained);
            }
            if classifier.is_polarised() {
                return Ok(TrainOutcome::Polarized);
            }
        }
        Ok(TrainOutcome::Capped)
    }

    /// Highest-ranked hay members, bounded by config.
    fn hay_sample(&self, hay: &[GroupId]) -> Vec<String> {
        hay.iter()
            .flat_map(|&group| self.groups.members(group).map(|(key, _)| key.to_string()))
            .take(self.cfg.training.hay_sample)
            .collect()
    }
}
