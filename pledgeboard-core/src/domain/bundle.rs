//! A bundle: a named, fixed group of symbols offered as one pledge target.

use serde::{Deserialize, Serialize};

/// A named group of symbols with a funding goal. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub name: String,
    pub symbols: Vec<String>,
    pub goal: f64,
}

impl Bundle {
    pub fn new(name: impl Into<String>, symbols: &[&str], goal: f64) -> Self {
        Self {
            name: name.into(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            goal,
        }
    }

    /// Comma-separated symbol list for display.
    pub fn symbol_list(&self) -> String {
        self.symbols.join(", ")
    }
}
