//! Default values for all tunables.

pub const SIMILARITY_THRESHOLD: f64 = 0.85;
pub const SIMILARITY_WINDOW: usize = 4;

pub const CLASSIFIER_INPUTS: usize = 100;
pub const CLASSIFIER_HIDDEN: usize = 100;
pub const MIN_SAMPLES: usize = 3;
pub const LEARNING_RATE: f64 = 0.5;
pub const TRAIN_ITERATIONS: usize = 3;
pub const POLARIZE_LIMIT: usize = 10;

pub const ITERATION_CAP: usize = 1000;
pub const HAY_SAMPLE: usize = 8;
