//! Engine Configuration
//!
//! `TigerStyle`: Sensible defaults, builder pattern, explicit over implicit.

use crate::config::ConfigError;
use crate::constants::{
    MERGE_EXAMPLES_COUNT_DEFAULT, MERGE_EXAMPLES_COUNT_MAX, OPTIMIZATION_PASSES_COUNT_MAX,
    THRESHOLD_DEFAULT, THRESHOLD_MAX, THRESHOLD_MIN, THRESHOLD_STEP_DELTA,
};

/// What happens to a ticket that matches no category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreationMode {
    /// Synthesize a category in the same iteration the ticket is popped.
    #[default]
    Immediate,
    /// Queue the ticket; a later `create` step re-tries assignment against
    /// the grown store and only then synthesizes.
    Deferred,
}

/// When the loop stops once no tickets remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminationMode {
    /// Exactly one optimization pass after the last ticket.
    #[default]
    SinglePass,
    /// Keep running optimization passes while the previous pass changed the
    /// store or the threshold, bounded by `optimization_passes_max`.
    FixedPoint,
}

/// Configuration for a categorization run.
///
/// # Example
///
/// ```rust
/// use triage_engine::engine::{CreationMode, TriageConfig};
///
/// let config = TriageConfig::default()
///     .with_threshold(0.6)
///     .with_creation_mode(CreationMode::Deferred)
///     .without_eager_merge_scan();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TriageConfig {
    /// Threshold at run start.
    ///
    /// Default: 0.75
    pub initial_threshold: f64,

    /// Lower clamp for threshold adjustments.
    ///
    /// Default: 0.01
    pub threshold_min: f64,

    /// Upper clamp for threshold adjustments.
    ///
    /// Default: 0.99
    pub threshold_max: f64,

    /// Step applied on INCREASE / DECREASE advice.
    ///
    /// Default: 0.05
    pub threshold_step: f64,

    /// Examples per category shown to the merge oracle.
    ///
    /// Default: 2
    pub merge_examples: usize,

    /// Handling of unmatched tickets.
    pub creation_mode: CreationMode,

    /// Loop termination policy.
    pub termination_mode: TerminationMode,

    /// Scan for merge candidates on every iteration (true) or only when no
    /// higher-priority action applies (false).
    ///
    /// Default: true
    pub eager_merge_scan: bool,

    /// Cap on post-ticket optimization passes in fixed-point mode.
    ///
    /// Default: 32
    pub optimization_passes_max: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            initial_threshold: THRESHOLD_DEFAULT,
            threshold_min: THRESHOLD_MIN,
            threshold_max: THRESHOLD_MAX,
            threshold_step: THRESHOLD_STEP_DELTA,
            merge_examples: MERGE_EXAMPLES_COUNT_DEFAULT,
            creation_mode: CreationMode::default(),
            termination_mode: TerminationMode::default(),
            eager_merge_scan: true,
            optimization_passes_max: OPTIMIZATION_PASSES_COUNT_MAX,
        }
    }
}

impl TriageConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.initial_threshold = threshold;
        self
    }

    /// Set the adjustment step.
    #[must_use]
    pub fn with_threshold_step(mut self, step: f64) -> Self {
        self.threshold_step = step;
        self
    }

    /// Set examples shown per category in merge prompts.
    #[must_use]
    pub fn with_merge_examples(mut self, count: usize) -> Self {
        self.merge_examples = count;
        self
    }

    /// Set the creation mode.
    #[must_use]
    pub fn with_creation_mode(mut self, mode: CreationMode) -> Self {
        self.creation_mode = mode;
        self
    }

    /// Set the termination mode.
    #[must_use]
    pub fn with_termination_mode(mut self, mode: TerminationMode) -> Self {
        self.termination_mode = mode;
        self
    }

    /// Set the fixed-point pass cap.
    #[must_use]
    pub fn with_optimization_passes_max(mut self, passes: usize) -> Self {
        self.optimization_passes_max = passes;
        self
    }

    /// Only scan for merges when nothing else is pending.
    #[must_use]
    pub fn without_eager_merge_scan(mut self) -> Self {
        self.eager_merge_scan = false;
        self
    }

    /// Check ranges and consistency.
    ///
    /// # Errors
    /// `InvalidThreshold` if the starting threshold is outside its bounds,
    /// `InvalidSetting` for inconsistent bounds, a non-positive step, a merge
    /// examples count outside `1..=MERGE_EXAMPLES_COUNT_MAX`, or a zero pass cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold_min < self.threshold_max)
            || self.threshold_min < THRESHOLD_MIN
            || self.threshold_max > THRESHOLD_MAX
        {
            return Err(ConfigError::invalid_setting(
                "threshold_bounds",
                format!(
                    "need {THRESHOLD_MIN} <= min < max <= {THRESHOLD_MAX}, got [{}, {}]",
                    self.threshold_min, self.threshold_max
                ),
            ));
        }
        if !(self.threshold_min..=self.threshold_max).contains(&self.initial_threshold) {
            return Err(ConfigError::InvalidThreshold {
                value: self.initial_threshold,
            });
        }
        if !(self.threshold_step > 0.0 && self.threshold_step.is_finite()) {
            return Err(ConfigError::invalid_setting(
                "threshold_step",
                "must be a positive finite number",
            ));
        }
        if !(1..=MERGE_EXAMPLES_COUNT_MAX).contains(&self.merge_examples) {
            return Err(ConfigError::invalid_setting(
                "merge_examples",
                format!("must be in 1..={MERGE_EXAMPLES_COUNT_MAX}"),
            ));
        }
        if self.optimization_passes_max == 0 {
            return Err(ConfigError::invalid_setting(
                "optimization_passes_max",
                "must be positive",
            ));
        }
        Ok(())
    }
}
