//! Human disambiguation as an injected capability.
//!
//! The group engine never talks to a terminal directly; it is handed a
//! `Resolver` at construction. This is the only seam in the system that
//! may block on a human, and blocking is deliberate: assignment
//! correctness matters more than throughput.

pub trait Resolver {
    /// Present candidate cluster keys for `description` and return the
    /// index of the chosen candidate, or `None` for "none of the above".
    fn resolve(&mut self, description: &str, candidates: &[String]) -> Option<usize>;

    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Show non-essential guidance.
    fn help(&mut self, message: &str);

    /// Surface a non-fatal condition.
    fn warn(&mut self, message: &str);
}
