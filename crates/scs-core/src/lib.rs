//! Self-checkout station device simulation.
//!
//! Sans-IO simulation of the peripherals of a self-checkout terminal: coin
//! and banknote slots, validators, storage units, dispensers, a coin tray, a
//! card reader and an electronic scale.
//!
//! # Architecture
//!
//! - [`device`]: phase state machine and observer registry every device
//!   composes
//! - [`channel`]: delivery paths between devices and their bindings
//! - [`devices`]: the individual peripherals
//! - [`station`]: the arena that owns and wires one terminal
//!
//! Randomness (validator false rejections, card read failures) comes from an
//! injected [`Environment`], so a seeded environment replays a session
//! exactly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod card;
pub mod channel;
pub mod device;
pub mod devices;
pub mod env;
pub mod error;
pub mod item;
pub mod station;

pub use card::{Card, CardData, CardKind};
pub use device::{Device, DeviceId, Notification, Observer, Phase, SharedObserver, shared};
pub use env::Environment;
pub use error::{DeviceError, ReadFault};
pub use item::{Banknote, Cash, Coin, Currency, Item, ItemId};
pub use station::{DeviceVisitor, Station, StationConfig};
