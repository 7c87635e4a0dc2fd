//! Deterministic simulation harness for self-checkout station testing.
//!
//! Seeded and scripted implementations of the [`scs_core::Environment`]
//! trait, an event recorder for transcript comparison, and a driver that
//! applies generated operations to a real station.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and a
//! [`StationDriver`], and their observable states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod driver;
pub mod model;
pub mod recorder;
pub mod scripted_env;
pub mod sim_env;

pub use driver::{FOREIGN, StationDriver};
pub use model::{ModelWorld, ObservableState, Operation, OperationError, OperationResult, Toggle};
pub use recorder::{RecordedEvent, Recorder};
pub use scripted_env::ScriptedEnv;
pub use sim_env::SimEnv;
