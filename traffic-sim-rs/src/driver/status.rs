// traffic-sim-rs/src/driver/status.rs
// Outcome classification and per-run bookkeeping

use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Substrings that mark a navigation answer as useful
pub const SUCCESS_MARKERS: [&str; 2] = ["RaviHyral", "coordinates"];

/// Outcome of one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    Success,
    Unknown,
    Error(String),
}

impl QueryStatus {
    /// Classify a response text that arrived without error
    pub fn from_response(text: &str) -> Self {
        if SUCCESS_MARKERS.iter().any(|marker| text.contains(marker)) {
            QueryStatus::Success
        } else {
            QueryStatus::Unknown
        }
    }

    /// Classify the result of `get_response`
    pub fn classify(outcome: &Result<String>) -> Self {
        match outcome {
            Ok(text) => Self::from_response(text),
            Err(e) => QueryStatus::Error(e.to_string()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueryStatus::Success => "SUCCESS",
            QueryStatus::Unknown => "UNKNOWN",
            QueryStatus::Error(_) => "ERROR",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryStatus::Error(_))
    }
}

/// One finished iteration
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    /// Run counter, starting at 1
    pub run: u64,
    pub query: String,
    pub status: QueryStatus,
    pub elapsed: Duration,
}

impl fmt::Display for IterationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] '{}' -> {}", self.run, self.query, self.status.label())?;
        if let QueryStatus::Error(message) = &self.status {
            write!(f, " ({})", message)?;
        }
        Ok(())
    }
}

/// Outcome counts over a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub successes: u64,
    pub unknowns: u64,
    pub errors: u64,
}

impl RunSummary {
    pub fn record(&mut self, status: &QueryStatus) {
        self.iterations += 1;
        match status {
            QueryStatus::Success => self.successes += 1,
            QueryStatus::Unknown => self.unknowns += 1,
            QueryStatus::Error(_) => self.errors += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requests: {} success, {} unknown, {} error",
            self.iterations, self.successes, self.unknowns, self.errors
        )
    }
}
