//! Feed-forward description scorer.
//!
//! One fully-connected hidden layer with sigmoid activations and a single
//! sigmoid output, trained by online backpropagation. Input is the
//! description text encoded one value per character, zero-padded to the
//! configured width. Weight initialization is deterministic per seed so a
//! fresh classifier for the same cluster is reproducible across sessions.

use serde::{Deserialize, Serialize};

use tally_core::errors::StorageError;

/// Serialized form: dimensions plus both weight matrices (with bias
/// columns folded in).
#[derive(Serialize, Deserialize)]
struct ScorerState {
    inputs: usize,
    hidden: usize,
    hidden_weights: Vec<f64>,
    output_weights: Vec<f64>,
}

/// A trainable scorer mapping description text to a value in [0, 1].
#[derive(Debug, Clone)]
pub struct DescriptionScorer {
    inputs: usize,
    hidden: usize,
    /// `hidden * (inputs + 1)`, row-major, bias first per row.
    hidden_weights: Vec<f64>,
    /// `hidden + 1`, bias first.
    output_weights: Vec<f64>,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Uniform in (-0.5, 0.5).
fn uniform(state: &mut u64) -> f64 {
    (splitmix64(state) >> 11) as f64 / (1u64 << 53) as f64 - 0.5
}

impl DescriptionScorer {
    /// Construct an untrained scorer with deterministic initial weights.
    pub fn new(inputs: usize, hidden: usize, seed: u64) -> Self {
        let mut state = seed ^ 0xA076_1D64_78BD_642F;
        let hidden_weights = (0..hidden * (inputs + 1))
            .map(|_| uniform(&mut state))
            .collect();
        let output_weights = (0..hidden + 1).map(|_| uniform(&mut state)).collect();
        Self {
            inputs,
            hidden,
            hidden_weights,
            output_weights,
        }
    }

    /// Encode text as one value per character, scaled into [0, 1] and
    /// zero-padded (or truncated) to the input width.
    pub fn encode(&self, text: &str) -> Vec<f64> {
        let mut encoded = vec![0.0; self.inputs];
        for (slot, ch) in encoded.iter_mut().zip(text.chars()) {
            *slot = f64::from((ch as u32).min(255)) / 255.0;
        }
        encoded
    }

    /// Forward pass. Pure.
    pub fn run(&self, encoded: &[f64]) -> f64 {
        let activations = self.hidden_activations(encoded);
        self.output(&activations)
    }

    /// Score raw text: encode then run.
    pub fn score(&self, text: &str) -> f64 {
        self.run(&self.encode(text))
    }

    /// `iterations` online backpropagation steps toward `target`.
    pub fn train(&mut self, encoded: &[f64], target: f64, learning_rate: f64, iterations: usize) {
        for _ in 0..iterations {
            let activations = self.hidden_activations(encoded);
            let out = self.output(&activations);

            // Output delta, sigmoid derivative folded in.
            let delta_out = (target - out) * out * (1.0 - out);

            // Hidden deltas before the output weights move.
            let mut delta_hidden = vec![0.0; self.hidden];
            for h in 0..self.hidden {
                let a = activations[h];
                delta_hidden[h] = delta_out * self.output_weights[h + 1] * a * (1.0 - a);
            }

            self.output_weights[0] += learning_rate * delta_out;
            for h in 0..self.hidden {
                self.output_weights[h + 1] += learning_rate * delta_out * activations[h];
            }

            for h in 0..self.hidden {
                let row = h * (self.inputs + 1);
                self.hidden_weights[row] += learning_rate * delta_hidden[h];
                for i in 0..self.inputs {
                    self.hidden_weights[row + 1 + i] +=
                        learning_rate * delta_hidden[h] * encoded[i];
                }
            }
        }
    }

    fn hidden_activations(&self, encoded: &[f64]) -> Vec<f64> {
        (0..self.hidden)
            .map(|h| {
                let row = h * (self.inputs + 1);
                let mut sum = self.hidden_weights[row];
                for i in 0..self.inputs.min(encoded.len()) {
                    sum += self.hidden_weights[row + 1 + i] * encoded[i];
                }
                sigmoid(sum)
            })
            .collect()
    }

    fn output(&self, activations: &[f64]) -> f64 {
        let mut sum = self.output_weights[0];
        for (h, a) in activations.iter().enumerate() {
            sum += self.output_weights[h + 1] * a;
        }
        sigmoid(sum)
    }

    /// Serialize to bytes for the persistence layer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        let state = ScorerState {
            inputs: self.inputs,
            hidden: self.hidden,
            hidden_weights: self.hidden_weights.clone(),
            output_weights: self.output_weights.clone(),
        };
        serde_json::to_vec(&state).map_err(|e| StorageError::Serialize {
            message: e.to_string(),
        })
    }

    /// Restore from bytes produced by [`DescriptionScorer::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let state: ScorerState =
            serde_json::from_slice(bytes).map_err(|e| StorageError::Serialize {
                message: e.to_string(),
            })?;
        Ok(Self {
            inputs: state.inputs,
            hidden: state.hidden,
            hidden_weights: state.hidden_weights,
            output_weights: state.output_weights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> DescriptionScorer {
        DescriptionScorer::new(100, 100, 42)
    }

    #[test]
    fn run_is_bounded() {
        let s = scorer();
        let score = s.score("WOOLWORTHS 123");
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn encode_pads_and_truncates() {
        let s = DescriptionScorer::new(4, 8, 1);
        let short = s.encode("AB");
        assert_eq!(short.len(), 4);
        assert!(short[0] > 0.0 && short[1] > 0.0);
        assert_eq!(&short[2..], &[0.0, 0.0]);

        let long = s.encode("ABCDEFGH");
        assert_eq!(long.len(), 4);
    }

    #[test]
    fn training_moves_score_toward_target() {
        let mut s = scorer();
        let encoded = s.encode("RENT PAYMENT");
        let before = s.run(&encoded);
        s.train(&encoded, 1.0, 0.5, 50);
        let after = s.run(&encoded);
        assert!(after > before);
        assert!(after > 0.5);

        s.train(&encoded, 0.0, 0.5, 100);
        assert!(s.run(&encoded) < 0.5);
    }

    #[test]
    fn same_seed_same_weights() {
        let a = DescriptionScorer::new(100, 100, 7);
        let b = DescriptionScorer::new(100, 100, 7);
        assert_eq!(a.score("COFFEE"), b.score("COFFEE"));
    }

    #[test]
    fn round_trip_preserves_scores() {
        let mut s = scorer();
        let encoded = s.encode("WOOLWORTHS 123");
        s.train(&encoded, 1.0, 0.5, 10);

        let restored = DescriptionScorer::from_bytes(&s.to_bytes().unwrap()).unwrap();
        let before = s.run(&encoded);
        let after = restored.run(&encoded);
        assert!((before - after).abs() < 1e-12);
    }
}
