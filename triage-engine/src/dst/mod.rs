//! DST - Deterministic Simulation Testing
//!
//! Seeded randomness and fault injection shared by the simulation providers.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use triage_engine::dst::{DeterministicRng, FaultConfig, FaultInjectorBuilder, FaultType};
//! use triage_engine::llm::SimLLMProvider;
//!
//! let faults = Arc::new(
//!     FaultInjectorBuilder::new(DeterministicRng::new(42))
//!         .with_fault(FaultConfig::new(FaultType::LlmTimeout, 0.1))
//!         .build(),
//! );
//! let llm = SimLLMProvider::with_faults(42, faults);
//! ```

mod fault;
mod rng;

pub use fault::{FaultConfig, FaultInjector, FaultInjectorBuilder, FaultType};
pub use rng::DeterministicRng;
