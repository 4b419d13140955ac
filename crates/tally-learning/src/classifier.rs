//! Per-cluster classifier: one scorer, readiness bookkeeping, and a
//! polarization detector, persisted through the classifier store.

use std::collections::BTreeSet;

use tracing::{debug, info};

use tally_core::config::ClassifierConfig;
use tally_core::errors::StorageError;
use tally_core::identity::RecordId;
use tally_core::traits::ClassifierStore;

use crate::convergence::PolarizationDetector;
use crate::scorer::DescriptionScorer;

/// Classifier for a single cluster, keyed by the cluster's canonical
/// identity.
///
/// Readiness is evaluated on the current text each call rather than
/// assumed from the training step, because a single training pass may not
/// move the score across the decision boundary. Once readiness has been
/// observed it latches until [`ClusterClassifier::reset`], so trained
/// state is never silently demoted by later calls.
pub struct ClusterClassifier {
    canonical: RecordId,
    scorer: DescriptionScorer,
    accept_ready: bool,
    reject_ready: bool,
    ready_latched: bool,
    /// Distinct identities this classifier has accepted.
    accepted: BTreeSet<RecordId>,
    detector: PolarizationDetector,
    /// A stored row exists for this classifier; once true every state
    /// change is flushed so durable state never trails memory.
    persisted: bool,
    resets: u64,
    cfg: ClassifierConfig,
}

impl ClusterClassifier {
    /// Load the classifier for `canonical` from the store, or construct
    /// a fresh untrained one seeded from the cluster's seed description.
    pub fn load(
        store: &dyn ClassifierStore,
        canonical: RecordId,
        seed_text: &str,
        cfg: &ClassifierConfig,
    ) -> Result<Self, StorageError> {
        match store.load(&canonical)? {
            Some(state) => {
                let scorer = DescriptionScorer::from_bytes(&state.weights)?;
                let detector = PolarizationDetector::seeded(
                    cfg.polarize_limit,
                    state.accept_ready,
                    state.reject_ready,
                );
                let accepted: BTreeSet<RecordId> = state.accepted.into_iter().collect();
                let ready_latched = state.accept_ready
                    && state.reject_ready
                    && accepted.len() > cfg.min_samples;
                info!(canonical = %canonical, accepted = accepted.len(), "loaded classifier");
                Ok(Self {
                    canonical,
                    scorer,
                    accept_ready: state.accept_ready,
                    reject_ready: state.reject_ready,
                    ready_latched,
                    accepted,
                    detector,
                    persisted: true,
                    resets: 0,
                    cfg: cfg.clone(),
                })
            }
            None => {
                debug!(canonical = %canonical, "no stored classifier, instantiating new");
                Ok(Self {
                    canonical: canonical.clone(),
                    scorer: DescriptionScorer::new(cfg.inputs, cfg.hidden, canonical.seed()),
                    accept_ready: false,
                    reject_ready: false,
                    ready_latched: false,
                    accepted: BTreeSet::new(),
                    detector: PolarizationDetector::new(cfg.polarize_limit),
                    persisted: false,
                    resets: 0,
                    cfg: cfg.clone(),
                })
            }
        }
    }

    pub fn canonical(&self) -> &RecordId {
        &self.canonical
    }

    /// Score a description. Pure, no side effects.
    pub fn run(&self, text: &str) -> f64 {
        self.scorer.score(text)
    }

    /// Reinforce `text` as a member of this cluster: observe the current
    /// score, update readiness, record the identity, train toward 1.0,
    /// and flush if the persistence policy says so.
    pub fn accept(
        &mut self,
        text: &str,
        store: &dyn ClassifierStore,
    ) -> Result<f64, StorageError> {
        let score = self.run(text);
        let held = score >= 0.5;
        self.detector.accept(held);
        self.accept_ready = held;
        self.accepted.insert(RecordId::derive(text));

        let encoded = self.scorer.encode(text);
        self.scorer
            .train(&encoded, 1.0, self.cfg.learning_rate, self.cfg.train_iterations);

        self.update_latch();
        self.maybe_persist(store)?;
        Ok(score)
    }

    /// Reinforce `text` as a non-member: symmetric with `accept`, target
    /// 0.0, and no accepted-set update.
    pub fn reject(
        &mut self,
        text: &str,
        store: &dyn ClassifierStore,
    ) -> Result<f64, StorageError> {
        let score = self.run(text);
        let held = score < 0.5;
        self.detector.reject(held);
        self.reject_ready = held;

        let encoded = self.scorer.encode(text);
        self.scorer
            .train(&encoded, 0.0, self.cfg.learning_rate, self.cfg.train_iterations);

        self.update_latch();
        self.maybe_persist(store)?;
        Ok(score)
    }

    /// Both readiness flags currently hold.
    pub fn is_trained(&self) -> bool {
        self.accept_ready && self.reject_ready
    }

    /// Strictly more distinct accepted identities than the configured
    /// minimum.
    pub fn meets_threshold(&self) -> bool {
        self.accepted.len() > self.cfg.min_samples
    }

    /// Trained with enough samples to trust the flags. Latches once
    /// observed; only `reset` reverts it.
    pub fn is_ready(&self) -> bool {
        self.ready_latched || (self.is_trained() && self.meets_threshold())
    }

    pub fn accept_ready(&self) -> bool {
        self.accept_ready
    }

    pub fn reject_ready(&self) -> bool {
        self.reject_ready
    }

    /// Training on this classifier has stopped converging.
    pub fn is_polarised(&self) -> bool {
        self.detector.is_polarised()
    }

    /// Drop all trained state and start over with fresh weights. The
    /// accepted-identity history survives: those records are still
    /// members, the scorer just has to re-earn its readiness on them.
    pub fn reset(&mut self) {
        self.resets += 1;
        self.scorer = DescriptionScorer::new(
            self.cfg.inputs,
            self.cfg.hidden,
            self.canonical.seed().wrapping_add(self.resets),
        );
        self.accept_ready = false;
        self.reject_ready = false;
        self.ready_latched = false;
        self.detector.reset();
        info!(canonical = %self.canonical, "classifier reset for retraining");
    }

    /// Unconditional flush of weights, flags, and the accepted set.
    pub fn persist(&mut self, store: &dyn ClassifierStore) -> Result<(), StorageError> {
        let weights = self.scorer.to_bytes()?;
        store.store(&self.canonical, &weights, self.accept_ready, self.reject_ready)?;
        let accepted: Vec<RecordId> = self.accepted.iter().cloned().collect();
        store.store_metadata(
            &self.canonical,
            self.accept_ready,
            self.reject_ready,
            &accepted,
        )?;
        self.persisted = true;
        debug!(canonical = %self.canonical, "flushed classifier state");
        Ok(())
    }

    fn update_latch(&mut self) {
        if !self.ready_latched && self.is_trained() && self.meets_threshold() {
            self.ready_latched = true;
        }
    }

    /// Write-after-ready, write-on-change: flush once ready, and always
    /// flush when a stored row already exists so durable state never
    /// trails the in-memory classifier.
    fn maybe_persist(&mut self, store: &dyn ClassifierStore) -> Result<(), StorageError> {
        if self.is_ready() || self.persisted {
            self.persist(store)?;
        }
        Ok(())
    }
}
