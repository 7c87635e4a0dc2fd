//! Simulated peripherals.

pub mod card_reader;
pub mod dispenser;
pub mod scale;
pub mod slot;
pub mod store;
pub mod validator;

pub use card_reader::{CardReader, CardReaderConfig, CardReaderEvent};
pub use dispenser::{Dispenser, DispenserEvent, DispenserPort};
pub use scale::{ElectronicScale, ScaleEvent};
pub use slot::{BanknoteSlot, BanknoteSlotEvent, CoinSlot, CoinSlotEvent};
pub use store::{BoundedStore, StorageUnit, StoreEvent, StorePort, Tray};
pub use validator::{FALSE_REJECTION_PERCENT, ValidatorEvent, Validator, Verdict};
