//! `FaultInjector` - Probabilistic Fault Injection
//!
//! `TigerStyle`: Explicit fault injection for the oracle and embedding
//! round trips, the only two places a run talks to the outside world.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::rng::DeterministicRng;
use crate::constants::DST_FAULT_PROBABILITY_MAX;

/// Types of faults that can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultType {
    // =========================================================================
    // LLM/Oracle Faults
    // =========================================================================
    /// LLM request timeout
    LlmTimeout,
    /// Rate limit exceeded
    LlmRateLimit,
    /// Non-success HTTP status
    LlmServiceUnavailable,
    /// Garbled or empty body
    LlmInvalidResponse,

    // =========================================================================
    // Embedding Faults
    // =========================================================================
    /// Embedding request timeout
    EmbeddingTimeout,
    /// Embedding service unavailable
    EmbeddingServiceUnavailable,
}

impl FaultType {
    /// Get the fault type name as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LlmTimeout => "llm_timeout",
            Self::LlmRateLimit => "llm_rate_limit",
            Self::LlmServiceUnavailable => "llm_service_unavailable",
            Self::LlmInvalidResponse => "llm_invalid_response",
            Self::EmbeddingTimeout => "embedding_timeout",
            Self::EmbeddingServiceUnavailable => "embedding_service_unavailable",
        }
    }
}

/// Configuration for a specific fault.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// The type of fault
    pub fault_type: FaultType,
    /// Probability of injection (0.0 to 1.0)
    pub probability: f64,
    /// Optional operation filter (substring match)
    pub operation_filter: Option<String>,
    /// Injections allowed before the fault goes quiet (None = unlimited)
    pub max_injections: Option<u64>,
    /// Matching operations to let through before the first injection
    pub skip_first: u64,
}

impl FaultConfig {
    /// Create a new fault configuration.
    ///
    /// # Panics
    /// Panics if probability is not in [0, 1].
    #[must_use]
    pub fn new(fault_type: FaultType, probability: f64) -> Self {
        assert!(
            (0.0..=DST_FAULT_PROBABILITY_MAX).contains(&probability),
            "probability must be in [0, {DST_FAULT_PROBABILITY_MAX}], got {probability}"
        );

        Self {
            fault_type,
            probability,
            operation_filter: None,
            max_injections: None,
            skip_first: 0,
        }
    }

    /// Only inject into operations whose name contains `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.operation_filter = Some(filter.into());
        self
    }

    /// Set maximum number of injections.
    ///
    /// # Panics
    /// Panics if `max` is zero.
    #[must_use]
    pub fn with_max_injections(mut self, max: u64) -> Self {
        assert!(max > 0, "max_injections must be positive");
        self.max_injections = Some(max);
        self
    }

    /// Let the first `count` matching operations succeed.
    #[must_use]
    pub fn after(mut self, count: u64) -> Self {
        self.skip_first = count;
        self
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct FaultCounters {
    seen: u64,
    injected: u64,
}

/// Fault injector for simulation testing.
///
/// Interior mutability lets one injector be shared via `Arc` between the
/// simulated LLM and embedding providers of a run.
#[derive(Debug)]
pub struct FaultInjector {
    rng: Mutex<DeterministicRng>,
    configs: Vec<FaultConfig>,
    counters: Mutex<HashMap<FaultType, FaultCounters>>,
}

impl FaultInjector {
    /// Create a new fault injector with the given RNG.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            configs: Vec::new(),
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Register a fault configuration.
    ///
    /// Registration must happen before sharing via `Arc`.
    pub fn register(&mut self, config: FaultConfig) {
        self.counters.lock().entry(config.fault_type).or_default();
        self.configs.push(config);
    }

    /// Check if a fault should be injected for the given operation.
    ///
    /// Returns the fault type if one should be injected.
    pub fn should_inject(&self, operation: &str) -> Option<FaultType> {
        for config in &self.configs {
            if let Some(ref filter) = config.operation_filter {
                if !operation.contains(filter.as_str()) {
                    continue;
                }
            }

            let mut counters = self.counters.lock();
            let counter = counters.entry(config.fault_type).or_default();
            counter.seen += 1;

            if counter.seen <= config.skip_first {
                continue;
            }
            if config
                .max_injections
                .is_some_and(|max| counter.injected >= max)
            {
                continue;
            }

            if self.rng.lock().next_bool(config.probability) {
                counter.injected += 1;
                return Some(config.fault_type);
            }
        }

        None
    }

    /// Injections per fault type, keyed by `FaultType::as_str`.
    #[must_use]
    pub fn injection_stats(&self) -> HashMap<String, u64> {
        self.counters
            .lock()
            .iter()
            .map(|(fault_type, c)| (fault_type.as_str().to_string(), c.injected))
            .collect()
    }

    /// Get total number of injections.
    #[must_use]
    pub fn total_injections(&self) -> u64 {
        self.counters.lock().values().map(|c| c.injected).sum()
    }
}

/// Builder for `FaultInjector`.
pub struct FaultInjectorBuilder {
    rng: DeterministicRng,
    configs: Vec<FaultConfig>,
}

impl FaultInjectorBuilder {
    /// Create a new builder with the given RNG.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            rng,
            configs: Vec::new(),
        }
    }

    /// Add a fault configuration.
    #[must_use]
    pub fn with_fault(mut self, config: FaultConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Add common oracle transport faults.
    #[must_use]
    pub fn with_llm_faults(self, probability: f64) -> Self {
        self.with_fault(FaultConfig::new(FaultType::LlmTimeout, probability))
            .with_fault(FaultConfig::new(FaultType::LlmServiceUnavailable, probability))
    }

    /// Build the `FaultInjector`.
    #[must_use]
    pub fn build(self) -> FaultInjector {
        let mut injector = FaultInjector::new(self.rng);
        for config in self.configs {
            injector.register(config);
        }
        injector
    }
}
