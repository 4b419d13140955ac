//! Resolver implementations: a real terminal and a scripted double.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use tally_core::traits::Resolver;

/// Interactive resolver over stdin/stdout. Blocks on the human; invalid
/// input re-prompts, EOF counts as "none of the above".
pub struct TerminalResolver;

impl TerminalResolver {
    pub fn new() -> Self {
        Self
    }

    fn read_line() -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Default for TerminalResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for TerminalResolver {
    fn resolve(&mut self, description: &str, candidates: &[String]) -> Option<usize> {
        println!("Which description best matches the following?\n\t{description}\n");
        for (index, candidate) in candidates.iter().enumerate() {
            println!("[{index}]\t{candidate}");
        }
        println!("[n]\tNone of the above\n");

        loop {
            print!("Select [0]: ");
            let _ = io::stdout().flush();
            let raw = match Self::read_line() {
                Some(raw) => raw,
                None => return None,
            };
            if raw.is_empty() {
                return Some(0);
            }
            if raw == "n" {
                return None;
            }
            match raw.parse::<usize>() {
                Ok(index) if index < candidates.len() => return Some(index),
                Ok(index) => println!("\nInvalid value: {index}"),
                Err(_) => println!("\nNot a number: '{raw}'"),
            }
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{prompt} [y/N]: ");
        let _ = io::stdout().flush();
        matches!(Self::read_line().as_deref(), Some("y") | Some("Y"))
    }

    fn help(&mut self, message: &str) {
        println!("{message}");
    }

    fn warn(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

/// Scripted resolver for tests and batch runs: answers come from a fixed
/// queue, an exhausted queue answers "none of the above", and warnings
/// are recorded for inspection.
pub struct ScriptedResolver {
    answers: VecDeque<Option<usize>>,
    confirmations: VecDeque<bool>,
    warnings: Vec<String>,
    resolve_calls: usize,
}

impl ScriptedResolver {
    pub fn new(answers: Vec<Option<usize>>) -> Self {
        Self {
            answers: answers.into(),
            confirmations: VecDeque::new(),
            warnings: Vec::new(),
            resolve_calls: 0,
        }
    }

    pub fn with_confirmations(mut self, confirmations: Vec<bool>) -> Self {
        self.confirmations = confirmations.into();
        self
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls
    }
}

impl Resolver for ScriptedResolver {
    fn resolve(&mut self, _description: &str, _candidates: &[String]) -> Option<usize> {
        self.resolve_calls += 1;
        self.answers.pop_front().flatten()
    }

    fn confirm(&mut self, _prompt: &str) -> bool {
        self.confirmations.pop_front().unwrap_or(false)
    }

    fn help(&mut self, _message: &str) {}

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}
