//! Threshold Controller - oracle-advised recalibration.

use crate::category::CategoryStore;
use crate::oracle::{CategoryOracle, OracleError};

/// Direction parsed from a threshold reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdAdvice {
    /// Raise the threshold (fewer, tighter matches)
    Increase,
    /// Lower the threshold (more matches, fewer new categories)
    Decrease,
    /// Leave it
    Keep,
}

impl ThresholdAdvice {
    /// Parse a free-text reply. `INCREASE` wins if both words appear;
    /// anything unrecognized is `Keep`.
    #[must_use]
    pub fn parse(reply: &str) -> Self {
        let upper = reply.to_uppercase();
        if upper.contains("INCREASE") {
            Self::Increase
        } else if upper.contains("DECREASE") {
            Self::Decrease
        } else {
            Self::Keep
        }
    }
}

/// Result of one adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdAdjustment {
    /// Parsed advice
    pub advice: ThresholdAdvice,
    /// Threshold before
    pub previous: f64,
    /// Threshold after, clamped
    pub threshold: f64,
}

impl ThresholdAdjustment {
    /// True if the value moved.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.threshold.to_bits() != self.previous.to_bits()
    }
}

/// Applies oracle advice in fixed steps within bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdController {
    step: f64,
    min: f64,
    max: f64,
}

impl ThresholdController {
    /// Controller with the given step and clamp bounds.
    #[must_use]
    pub fn new(step: f64, min: f64, max: f64) -> Self {
        assert!(min < max, "threshold min ({min}) must be < max ({max})");
        assert!(step > 0.0, "threshold step must be positive");
        Self { step, min, max }
    }

    /// Apply advice to `threshold`. `Keep` returns the value bit-for-bit.
    #[must_use]
    pub fn apply(&self, threshold: f64, advice: ThresholdAdvice) -> f64 {
        match advice {
            ThresholdAdvice::Increase => (threshold + self.step).clamp(self.min, self.max),
            ThresholdAdvice::Decrease => (threshold - self.step).clamp(self.min, self.max),
            ThresholdAdvice::Keep => threshold,
        }
    }

    /// Ask the oracle about the current store statistics and apply its
    /// advice.
    ///
    /// # Errors
    /// Oracle failures propagate; the threshold is unchanged in that case.
    #[tracing::instrument(skip(self, store, oracle), fields(categories = store.len()))]
    pub async fn adjust<O>(
        &self,
        store: &CategoryStore,
        threshold: f64,
        oracle: &O,
    ) -> Result<ThresholdAdjustment, OracleError>
    where
        O: CategoryOracle + ?Sized,
    {
        let reply = oracle
            .adjust_threshold(threshold, store.len(), store.average_examples())
            .await?;
        let advice = ThresholdAdvice::parse(&reply);
        let adjusted = self.apply(threshold, advice);

        tracing::debug!(?advice, from = threshold, to = adjusted, "threshold advice applied");
        Ok(ThresholdAdjustment {
            advice,
            previous: threshold,
            threshold: adjusted,
        })
    }
}

impl Default for ThresholdController {
    fn default() -> Self {
        use crate::constants::{THRESHOLD_MAX, THRESHOLD_MIN, THRESHOLD_STEP_DELTA};
        Self::new(THRESHOLD_STEP_DELTA, THRESHOLD_MIN, THRESHOLD_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleCall, ScriptedOracle};
    use proptest::prelude::*;

    #[test]
    fn test_parse() {
        assert_eq!(ThresholdAdvice::parse("INCREASE"), ThresholdAdvice::Increase);
        assert_eq!(ThresholdAdvice::parse("please decrease it"), ThresholdAdvice::Decrease);
        assert_eq!(ThresholdAdvice::parse("KEEP"), ThresholdAdvice::Keep);
        assert_eq!(ThresholdAdvice::parse("MAYBE"), ThresholdAdvice::Keep);
        assert_eq!(
            ThresholdAdvice::parse("DECREASE or INCREASE"),
            ThresholdAdvice::Increase
        );
    }

    #[test]
    fn test_steps_and_clamps() {
        let controller = ThresholdController::default();
        assert!((controller.apply(0.75, ThresholdAdvice::Increase) - 0.80).abs() < 1e-12);
        assert!((controller.apply(0.75, ThresholdAdvice::Decrease) - 0.70).abs() < 1e-12);
        assert_eq!(controller.apply(0.97, ThresholdAdvice::Increase), 0.99);
        assert_eq!(controller.apply(0.03, ThresholdAdvice::Decrease), 0.01);
    }

    #[tokio::test]
    async fn test_malformed_reply_leaves_threshold_identical() {
        let oracle = ScriptedOracle::new().with_thresholds(["MAYBE"]);
        let mut store = CategoryStore::new();
        store.create("A", "a", vec![1.0]).unwrap();
        let start = 0.1 + 0.2; // not exactly representable

        let adjustment = ThresholdController::default()
            .adjust(&store, start, &oracle)
            .await
            .unwrap();

        assert_eq!(adjustment.threshold.to_bits(), start.to_bits());
        assert!(!adjustment.changed());
    }

    #[tokio::test]
    async fn test_reports_statistics_to_oracle() {
        let oracle = ScriptedOracle::new().with_thresholds(["DECREASE"]);
        let mut store = CategoryStore::new();
        store.create("A", "a1", vec![1.0]).unwrap();
        store.add_example("A", "a2", &[1.0]).unwrap();
        store.create("B", "b1", vec![1.0]).unwrap();

        let adjustment = ThresholdController::default()
            .adjust(&store, 0.5, &oracle)
            .await
            .unwrap();

        assert!(adjustment.changed());
        assert_eq!(
            oracle.calls(),
            vec![OracleCall::AdjustThreshold {
                threshold: 0.5,
                num_categories: 2,
                avg_examples: 1.5,
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_store_reports_zero_average() {
        let oracle = ScriptedOracle::new();
        ThresholdController::default()
            .adjust(&CategoryStore::new(), 0.75, &oracle)
            .await
            .unwrap();
        assert_eq!(
            oracle.calls(),
            vec![OracleCall::AdjustThreshold {
                threshold: 0.75,
                num_categories: 0,
                avg_examples: 0.0,
            }]
        );
    }

    proptest! {
        #[test]
        fn prop_stays_in_bounds(start in 0.01_f64..=0.99, steps in prop::collection::vec(0u8..3, 0..60)) {
            let controller = ThresholdController::default();
            let mut threshold = start;
            for step in steps {
                let advice = match step {
                    0 => ThresholdAdvice::Increase,
                    1 => ThresholdAdvice::Decrease,
                    _ => ThresholdAdvice::Keep,
                };
                threshold = controller.apply(threshold, advice);
                prop_assert!((0.01..=0.99).contains(&threshold));
            }
        }
    }
}
