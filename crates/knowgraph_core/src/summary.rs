//! Summary-generation capability consumed by node creation.
//!
//! The generator is an external, long-latency collaborator (typically a
//! language model). Core calls it once per created node, outside any store
//! transaction, and surfaces its failure unchanged; retries and timeouts
//! belong to the implementation.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by a [`SummaryGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryError {
    message: String,
}

impl SummaryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for SummaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for SummaryError {}

/// Produces a short explanatory summary for a node title.
pub trait SummaryGenerator {
    fn generate_summary(&self, title: &str) -> Result<String, SummaryError>;
}

impl<F> SummaryGenerator for F
where
    F: Fn(&str) -> Result<String, SummaryError>,
{
    fn generate_summary(&self, title: &str) -> Result<String, SummaryError> {
        self(title)
    }
}

/// Generator that returns the same text for every title.
///
/// Useful for imports and offline tooling where no model is reachable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedSummary(pub String);

impl SummaryGenerator for FixedSummary {
    fn generate_summary(&self, _title: &str) -> Result<String, SummaryError> {
        Ok(self.0.clone())
    }
}

/// Builds the one-sentence prompt sent to a language-model generator.
pub fn summary_prompt(title: &str) -> String {
    format!("Give a one-sentence explanation of '{title}' suitable for students.")
}
