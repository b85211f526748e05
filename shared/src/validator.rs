//! Input validation for box counts
//!
//! Every box write goes through [`InputValidator::check`]. Counts above the
//! number of chickens per box are rejected and flagged; negative or
//! non-numeric input simply clears the box so a field can always be emptied.

use std::collections::BTreeMap;

use crate::types::{BoxAddress, EggCount};

/// Highest egg count a box can hold (one per chicken)
pub const MAX_EGGS_PER_BOX: i64 = 4;

/// Field error shown for a rejected box write
pub const OVER_CAPACITY_MESSAGE: &str = "Cannot collect more than 4 eggs";

/// Parse raw form input into an integer.
///
/// Empty or non-numeric input yields `None` (unset), never zero.
pub fn parse_box_count(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Outcome of validating one box write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxWrite {
    /// Value accepted and stored
    Store(EggCount),
    /// Input was empty, negative or non-numeric; the box is unset
    Clear,
    /// Value exceeded the per-box bound; nothing was written
    Reject,
}

/// Classify a parsed value without touching any error state
pub fn classify(parsed: Option<i64>) -> BoxWrite {
    match parsed {
        Some(value) if value > MAX_EGGS_PER_BOX => BoxWrite::Reject,
        Some(value) if value >= 0 => BoxWrite::Store(value as EggCount),
        _ => BoxWrite::Clear,
    }
}

/// Per-box error state for the collection form
#[derive(Debug, Clone, Default)]
pub struct InputValidator {
    errors: BTreeMap<BoxAddress, String>,
}

impl InputValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a write, updating the error flag for `address`
    pub fn check(&mut self, address: BoxAddress, parsed: Option<i64>) -> BoxWrite {
        let outcome = classify(parsed);
        match outcome {
            BoxWrite::Reject => {
                self.errors.insert(address, OVER_CAPACITY_MESSAGE.to_string());
            }
            BoxWrite::Store(_) | BoxWrite::Clear => {
                self.errors.remove(&address);
            }
        }
        outcome
    }

    pub fn error_for(&self, address: &BoxAddress) -> Option<&str> {
        self.errors.get(address).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<BoxAddress, String> {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }
}
