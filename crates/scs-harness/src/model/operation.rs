//! Operations for model-based testing.
//!
//! Operations represent the actions a customer or staff member can take at
//! a station. They are generated randomly (proptest, `arbitrary` for the
//! fuzzer) and applied to both the model and the real station.

use arbitrary::Arbitrary;
use scs_core::DeviceError;

/// Coin values the generator draws from, minor units. The last two are not
/// accepted by the default station.
pub const COIN_VALUES: [u64; 7] = [5, 10, 25, 100, 200, 1, 50];

/// Banknote values the generator draws from. The last two are not accepted
/// by the default station.
pub const BANKNOTE_VALUES: [u64; 7] = [5, 10, 20, 50, 100, 2, 1000];

/// Map a raw byte onto [`COIN_VALUES`].
pub fn coin_value(raw: u8) -> u64 {
    COIN_VALUES[usize::from(raw) % COIN_VALUES.len()]
}

/// Map a raw byte onto [`BANKNOTE_VALUES`].
pub fn banknote_value(raw: u8) -> u64 {
    BANKNOTE_VALUES[usize::from(raw) % BANKNOTE_VALUES.len()]
}

/// Devices whose enabled flag operations may toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Arbitrary)]
pub enum Toggle {
    /// The coin slot.
    CoinSlot,
    /// The input banknote slot.
    BanknoteInput,
    /// The output banknote slot.
    BanknoteOutput,
    /// The coin tray.
    CoinTray,
}

/// Operations that can be applied to a station.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Customer inserts a coin.
    InsertCoin {
        /// Value selector, see [`coin_value`].
        value: u8,
        /// Use a currency the station does not accept.
        foreign: bool,
    },

    /// Customer inserts a banknote.
    InsertBanknote {
        /// Value selector, see [`banknote_value`].
        value: u8,
        /// Use a currency the station does not accept.
        foreign: bool,
    },

    /// Customer takes the banknote dangling from the input slot.
    RemoveDanglingBanknote,

    /// Customer takes the banknote dangling from the output slot.
    CollectBanknote,

    /// Customer empties the coin tray.
    CollectCoins,

    /// Station releases a coin as change.
    DispenseCoin {
        /// Denomination selector, see [`coin_value`].
        value: u8,
    },

    /// Station releases a banknote as change.
    DispenseBanknote {
        /// Denomination selector, see [`banknote_value`].
        value: u8,
    },

    /// Staff refills a coin dispenser.
    LoadCoins {
        /// Denomination selector, see [`coin_value`].
        value: u8,
        /// Batch size (taken modulo 5).
        count: u8,
    },

    /// Staff refills a banknote dispenser.
    LoadBanknotes {
        /// Denomination selector, see [`banknote_value`].
        value: u8,
        /// Batch size (taken modulo 5).
        count: u8,
    },

    /// Staff empties the coin storage unit.
    UnloadCoinStorage,

    /// Staff empties the banknote storage unit.
    UnloadBanknoteStorage,

    /// Customer places an item in the bagging area.
    AddItem {
        /// Item identity (taken modulo 8).
        id: u8,
        /// Weight selector; weight is `1 + grams % 1500`.
        grams: u16,
    },

    /// Customer lifts an item from the bagging area.
    RemoveItem {
        /// Item identity (taken modulo 8).
        id: u8,
    },

    /// Disable a device.
    Disable {
        /// Target.
        device: Toggle,
    },

    /// Enable a device.
    Enable {
        /// Target.
        device: Toggle,
    },
}

/// Item identity used by [`Operation::AddItem`] and [`Operation::RemoveItem`].
pub fn item_id(raw: u8) -> u64 {
    u64::from(raw % 8)
}

/// Item weight used by [`Operation::AddItem`], whole grams.
pub fn item_grams(raw: u16) -> u32 {
    1 + u32::from(raw % 1500)
}

/// Batch size used by the load operations.
pub fn batch_size(raw: u8) -> usize {
    usize::from(raw % 5)
}

/// Result of applying an operation.
///
/// Used to compare model and real system behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded.
    Ok,

    /// Operation failed with expected error.
    Error(OperationError),
}

/// Error kinds the model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Target device is disabled.
    Disabled,
    /// Capacity exceeded.
    Overload,
    /// Dispenser has no stock.
    Empty,
    /// Dangling banknote conflict.
    Dangling,
    /// No such denomination or malformed argument.
    InvalidArgument,
    /// Item already on the scale.
    DuplicateItem,
    /// Item not on the scale.
    ItemNotFound,
    /// Target device is in its error phase.
    Unusable,
    /// The operation drove a device into its error phase.
    Fatal,
    /// Any other error. The model never predicts this.
    Other,
}

impl From<&DeviceError> for OperationError {
    fn from(error: &DeviceError) -> Self {
        match error {
            DeviceError::Disabled { .. } => Self::Disabled,
            DeviceError::Overload { .. } => Self::Overload,
            DeviceError::Empty { .. } => Self::Empty,
            DeviceError::Dangling { .. } => Self::Dangling,
            DeviceError::InvalidArgument { .. } => Self::InvalidArgument,
            DeviceError::DuplicateItem { .. } => Self::DuplicateItem,
            DeviceError::ItemNotFound { .. } => Self::ItemNotFound,
            DeviceError::Unusable { .. } => Self::Unusable,
            DeviceError::Fatal { .. } => Self::Fatal,
            _ => Self::Other,
        }
    }
}

impl<T> From<Result<T, DeviceError>> for OperationResult {
    fn from(result: Result<T, DeviceError>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(e) => Self::Error(OperationError::from(&e)),
        }
    }
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Check if operation failed.
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_wrap() {
        assert_eq!(coin_value(0), 5);
        assert_eq!(coin_value(7), 5);
        assert_eq!(banknote_value(6), 1000);
        assert_eq!(item_id(9), 1);
        assert_eq!(item_grams(1500), 1);
        assert_eq!(batch_size(7), 2);
    }
}
