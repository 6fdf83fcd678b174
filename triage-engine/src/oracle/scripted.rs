//! `ScriptedOracle` - deterministic oracle with queued replies.
//!
//! Each question has its own FIFO of replies; once a queue drains, the
//! question's default reply is returned. Every call is recorded so tests can
//! assert on what the engine asked and in which order.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CategoryOracle, OracleError};
use crate::constants::CATEGORY_UNCATEGORIZED_LABEL;

/// One recorded oracle question.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleCall {
    /// `suggest_name`
    SuggestName {
        /// Ticket texts shown
        tickets: Vec<String>,
    },
    /// `merge_decision`
    MergeDecision {
        /// First category
        name_a: String,
        /// Examples shown for the first category
        examples_a: Vec<String>,
        /// Second category
        name_b: String,
        /// Examples shown for the second category
        examples_b: Vec<String>,
    },
    /// `adjust_threshold`
    AdjustThreshold {
        /// Threshold at the time of asking
        threshold: f64,
        /// Category count
        num_categories: usize,
        /// Mean examples per category
        avg_examples: f64,
    },
}

#[derive(Debug)]
struct Script {
    queue: VecDeque<String>,
    default: String,
}

impl Script {
    fn new(default: &str) -> Self {
        Self {
            queue: VecDeque::new(),
            default: default.to_string(),
        }
    }

    fn next(&mut self) -> String {
        self.queue
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}

/// Oracle answering from per-question scripts.
///
/// Defaults: names `Uncategorized`, merges `NO`, thresholds `KEEP`.
///
/// # Example
///
/// ```rust
/// use triage_engine::oracle::{CategoryOracle, ScriptedOracle};
///
/// #[tokio::main]
/// async fn main() {
///     let oracle = ScriptedOracle::new().with_names(["Printer Issue"]);
///     assert_eq!(oracle.suggest_name(&["jam"]).await.unwrap(), "Printer Issue");
///     assert_eq!(oracle.suggest_name(&["?"]).await.unwrap(), "Uncategorized");
///     assert_eq!(oracle.calls().len(), 2);
/// }
/// ```
#[derive(Debug)]
pub struct ScriptedOracle {
    names: Mutex<Script>,
    merges: Mutex<Script>,
    thresholds: Mutex<Script>,
    calls: Mutex<Vec<OracleCall>>,
}

impl Default for ScriptedOracle {
    fn default() -> Self {
        Self {
            names: Mutex::new(Script::new(CATEGORY_UNCATEGORIZED_LABEL)),
            merges: Mutex::new(Script::new("NO")),
            thresholds: Mutex::new(Script::new("KEEP")),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedOracle {
    /// Oracle with default replies only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue naming replies.
    #[must_use]
    pub fn with_names<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.lock().queue.extend(replies.into_iter().map(Into::into));
        self
    }

    /// Queue merge replies.
    #[must_use]
    pub fn with_merges<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.merges.lock().queue.extend(replies.into_iter().map(Into::into));
        self
    }

    /// Queue threshold replies.
    #[must_use]
    pub fn with_thresholds<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.thresholds
            .lock()
            .queue
            .extend(replies.into_iter().map(Into::into));
        self
    }

    /// Reply used once the naming queue is empty.
    #[must_use]
    pub fn with_default_name(self, reply: impl Into<String>) -> Self {
        self.names.lock().default = reply.into();
        self
    }

    /// Reply used once the merge queue is empty.
    #[must_use]
    pub fn with_default_merge(self, reply: impl Into<String>) -> Self {
        self.merges.lock().default = reply.into();
        self
    }

    /// Reply used once the threshold queue is empty.
    #[must_use]
    pub fn with_default_threshold(self, reply: impl Into<String>) -> Self {
        self.thresholds.lock().default = reply.into();
        self
    }

    /// Every question asked so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls.lock().clone()
    }

    /// Number of merge questions asked.
    #[must_use]
    pub fn merge_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, OracleCall::MergeDecision { .. }))
            .count()
    }

    /// Number of threshold questions asked.
    #[must_use]
    pub fn threshold_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, OracleCall::AdjustThreshold { .. }))
            .count()
    }

    fn record(&self, call: OracleCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl CategoryOracle for ScriptedOracle {
    async fn suggest_name(&self, tickets: &[&str]) -> Result<String, OracleError> {
        self.record(OracleCall::SuggestName {
            tickets: tickets.iter().map(|t| (*t).to_string()).collect(),
        });
        Ok(self.names.lock().next())
    }

    async fn merge_decision(
        &self,
        name_a: &str,
        examples_a: &[String],
        name_b: &str,
        examples_b: &[String],
    ) -> Result<String, OracleError> {
        self.record(OracleCall::MergeDecision {
            name_a: name_a.to_string(),
            examples_a: examples_a.to_vec(),
            name_b: name_b.to_string(),
            examples_b: examples_b.to_vec(),
        });
        Ok(self.merges.lock().next())
    }

    async fn adjust_threshold(
        &self,
        threshold: f64,
        num_categories: usize,
        avg_examples: f64,
    ) -> Result<String, OracleError> {
        self.record(OracleCall::AdjustThreshold {
            threshold,
            num_categories,
            avg_examples,
        });
        Ok(self.thresholds.lock().next())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
