//! Reference model for model-based testing.
//!
//! The model is a simplified station that captures what the devices are
//! supposed to do with counts and flags instead of real items and
//! observers. It serves as the oracle against which the real station is
//! verified.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Behaviour, not mechanism: no channels, no observers, no phases beyond
//!   "failed"
//! - Deterministic: Same inputs produce same outputs

pub mod operation;
mod world;

pub use operation::{Operation, OperationError, OperationResult, Toggle};
pub use world::{ModelWorld, ObservableState};
