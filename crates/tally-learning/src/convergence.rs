//! Oscillation detection for classifier training.
//!
//! The detector watches the measured outcome of every accept and reject
//! observation: the accept channel reports whether the example currently
//! scores at or above the decision boundary, the reject channel whether
//! it scores below. A classifier that keeps losing one objective while
//! holding the other is being pushed back and forth across the boundary
//! and will not separate the example from its counter-examples with the
//! current representation; training loops must stop and surface that
//! instead of spinning.

/// Detector phase. `StuckLow` and `StuckHigh` are the polarized phases:
/// the score is pinned on one side of the boundary no matter which way
/// training pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing held yet.
    Idle,
    /// The accept objective held on the last relevant observation.
    AcceptHeld,
    /// The reject objective held.
    RejectHeld,
    /// Both objectives recently held.
    Separated,
    /// Accept used to hold and has regressed.
    AcceptLost,
    /// Reject used to hold and has regressed.
    RejectLost,
    /// Accept keeps failing while reject succeeds: pinned low.
    StuckLow,
    /// Reject keeps failing while accept succeeds: pinned high.
    StuckHigh,
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Accept,
    Reject,
}

/// Per-classifier oscillation state machine.
#[derive(Debug, Clone)]
pub struct PolarizationDetector {
    phase: Phase,
    /// Observations that have landed in a stuck phase.
    stuck_count: usize,
    /// `is_polarised` fires on positive multiples of this.
    limit: usize,
}

impl PolarizationDetector {
    pub fn new(limit: usize) -> Self {
        Self {
            phase: Phase::Idle,
            stuck_count: 0,
            limit: limit.max(1),
        }
    }

    /// Reconstruct detector state from persisted readiness flags by
    /// replaying them once through both channels. Convergence state is
    /// never persisted directly.
    pub fn seeded(limit: usize, accept_ready: bool, reject_ready: bool) -> Self {
        let mut detector = Self::new(limit);
        detector.accept(accept_ready);
        detector.reject(reject_ready);
        detector
    }

    /// Observe an accept-channel outcome: did the example score at or
    /// above the boundary?
    pub fn accept(&mut self, held: bool) {
        self.step(Channel::Accept, held);
    }

    /// Observe a reject-channel outcome: did the example score below the
    /// boundary?
    pub fn reject(&mut self, held: bool) {
        self.step(Channel::Reject, held);
    }

    fn step(&mut self, channel: Channel, held: bool) {
        use Phase::*;
        self.phase = match (self.phase, channel, held) {
            (Idle, Channel::Accept, true) => AcceptHeld,
            (Idle, Channel::Reject, true) => RejectHeld,
            (Idle, _, false) => Idle,

            (AcceptHeld, Channel::Accept, true) => AcceptHeld,
            (AcceptHeld, Channel::Accept, false) => AcceptLost,
            (AcceptHeld, Channel::Reject, true) => Separated,
            (AcceptHeld, Channel::Reject, false) => AcceptHeld,

            (RejectHeld, Channel::Accept, true) => Separated,
            (RejectHeld, Channel::Accept, false) => RejectHeld,
            (RejectHeld, Channel::Reject, true) => RejectHeld,
            (RejectHeld, Channel::Reject, false) => RejectLost,

            (Separated, Channel::Accept, true) => Separated,
            (Separated, Channel::Accept, false) => RejectHeld,
            (Separated, Channel::Reject, true) => Separated,
            (Separated, Channel::Reject, false) => AcceptHeld,

            (AcceptLost, Channel::Accept, true) => AcceptHeld,
            (AcceptLost, Channel::Accept, false) => AcceptLost,
            (AcceptLost, Channel::Reject, true) => StuckLow,
            (AcceptLost, Channel::Reject, false) => AcceptLost,

            // Symmetric with AcceptLost: one channel succeeding while the
            // other stays lost is polarization, high side.
            (RejectLost, Channel::Accept, true) => StuckHigh,
            (RejectLost, Channel::Accept, false) => RejectLost,
            (RejectLost, Channel::Reject, true) => RejectHeld,
            (RejectLost, Channel::Reject, false) => RejectLost,

            (StuckLow, Channel::Accept, true) => Separated,
            (StuckLow, Channel::Accept, false) => StuckLow,
            (StuckLow, Channel::Reject, true) => StuckLow,
            (StuckLow, Channel::Reject, false) => Idle,

            (StuckHigh, Channel::Accept, true) => StuckHigh,
            (StuckHigh, Channel::Accept, false) => Idle,
            (StuckHigh, Channel::Reject, true) => Separated,
            (StuckHigh, Channel::Reject, false) => StuckHigh,
        };

        if matches!(self.phase, StuckLow | StuckHigh) {
            self.stuck_count += 1;
        }
    }

    /// True iff currently in a polarized phase and the stuck counter has
    /// reached a positive multiple of the limit.
    pub fn is_polarised(&self) -> bool {
        matches!(self.phase, Phase::StuckLow | Phase::StuckHigh)
            && self.stuck_count > 0
            && self.stuck_count % self.limit == 0
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.stuck_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Walk the detector through a sequence of (is_accept, held) pairs.
    fn drive(detector: &mut PolarizationDetector, observations: &[(bool, bool)]) {
        for &(is_accept, held) in observations {
            if is_accept {
                detector.accept(held);
            } else {
                detector.reject(held);
            }
        }
    }

    const A: bool = true;
    const R: bool = false;

    #[test]
    fn idle_ignores_failed_observations() {
        let mut d = PolarizationDetector::new(5);
        drive(&mut d, &[(A, false), (R, false), (A, false)]);
        assert_eq!(d.phase(), Phase::Idle);
    }

    #[test]
    fn both_channels_holding_separates() {
        let mut d = PolarizationDetector::new(5);
        drive(&mut d, &[(A, true), (R, true)]);
        assert_eq!(d.phase(), Phase::Separated);
    }

    #[test]
    fn accept_regression_then_reject_success_is_stuck_low() {
        let mut d = PolarizationDetector::new(5);
        drive(&mut d, &[(A, true), (A, false), (R, true)]);
        assert_eq!(d.phase(), Phase::StuckLow);
    }

    #[test]
    fn reject_regression_then_accept_success_is_stuck_high() {
        let mut d = PolarizationDetector::new(5);
        drive(&mut d, &[(R, true), (R, false), (A, true)]);
        assert_eq!(d.phase(), Phase::StuckHigh);
    }

    #[test]
    fn stuck_low_recovers_on_accept_success() {
        let mut d = PolarizationDetector::new(5);
        drive(&mut d, &[(A, true), (A, false), (R, true), (A, true)]);
        assert_eq!(d.phase(), Phase::Separated);
    }

    #[test]
    fn stuck_low_resets_on_reject_failure() {
        let mut d = PolarizationDetector::new(5);
        drive(&mut d, &[(A, true), (A, false), (R, true), (R, false)]);
        assert_eq!(d.phase(), Phase::Idle);
    }

    #[test]
    fn polarised_fires_on_limit_multiples_only() {
        let mut d = PolarizationDetector::new(3);
        // Reach StuckLow (one stuck observation)...
        drive(&mut d, &[(A, true), (A, false), (R, true)]);
        assert!(!d.is_polarised());
        // ...then stay pinned low: accept fails, reject holds.
        drive(&mut d, &[(A, false)]);
        assert!(!d.is_polarised());
        drive(&mut d, &[(R, true)]);
        assert!(d.is_polarised());
        drive(&mut d, &[(A, false)]);
        assert!(!d.is_polarised());
    }

    #[test]
    fn seeding_replays_readiness_flags() {
        let d = PolarizationDetector::seeded(5, true, true);
        assert_eq!(d.phase(), Phase::Separated);

        let d = PolarizationDetector::seeded(5, false, false);
        assert_eq!(d.phase(), Phase::Idle);

        let d = PolarizationDetector::seeded(5, true, false);
        // Accept held, reject has not: reject failure leaves AcceptHeld.
        assert_eq!(d.phase(), Phase::AcceptHeld);
    }

    #[test]
    fn reset_clears_phase_and_counter() {
        let mut d = PolarizationDetector::new(1);
        drive(&mut d, &[(A, true), (A, false), (R, true)]);
        assert!(d.is_polarised());
        d.reset();
        assert_eq!(d.phase(), Phase::Idle);
        assert!(!d.is_polarised());
    }

    proptest! {
        /// The counter only moves while in a stuck phase, so an arbitrary
        /// observation stream can never make `is_polarised` true outside
        /// one of the two polarized phases.
        #[test]
        fn polarised_implies_stuck_phase(observations in proptest::collection::vec((any::<bool>(), any::<bool>()), 0..200)) {
            let mut d = PolarizationDetector::new(5);
            drive(&mut d, &observations);
            if d.is_polarised() {
                prop_assert!(matches!(d.phase(), Phase::StuckLow | Phase::StuckHigh));
            }
        }
    }
}
