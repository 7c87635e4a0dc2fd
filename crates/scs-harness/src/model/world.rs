//! Model world: the reference station.
//!
//! Tracks only counts, dangling values and failure flags. It assumes every
//! fault draw passes (no false rejections), so it must be compared against
//! a station running on [`crate::ScriptedEnv::lucky`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use scs_core::StationConfig;

use super::operation::{
    Operation, OperationError, OperationResult, Toggle, banknote_value, batch_size, coin_value,
    item_grams, item_id,
};

/// Observable state for oracle comparison.
///
/// This is the subset of station state that both the model and the real
/// station can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Coins in the tray.
    pub tray: usize,
    /// Coins in coin storage.
    pub coin_storage: usize,
    /// Banknotes in banknote storage.
    pub banknote_storage: usize,
    /// Value of the banknote dangling from the input slot.
    pub input_dangling: Option<u64>,
    /// Value of the banknote dangling from the output slot.
    pub output_dangling: Option<u64>,
    /// Stock per coin dispenser, by denomination.
    pub coin_stock: Vec<(u64, usize)>,
    /// Stock per banknote dispenser, by denomination.
    pub banknote_stock: Vec<(u64, usize)>,
    /// Whether the coin validator is in its error phase.
    pub coin_validator_failed: bool,
    /// Coin dispensers in their error phase.
    pub failed_coin_dispensers: Vec<u64>,
    /// Banknote dispensers in their error phase.
    pub failed_banknote_dispensers: Vec<u64>,
    /// Ids of the items on the scale, ascending.
    pub scale_items: Vec<u64>,
    /// Whether the scale is overloaded.
    pub scale_overloaded: bool,
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    tray: usize,
    tray_capacity: usize,
    coin_storage: usize,
    coin_storage_capacity: usize,
    banknote_storage: usize,
    banknote_storage_capacity: usize,
    input_dangling: Option<u64>,
    output_dangling: Option<u64>,
    coin_stock: BTreeMap<u64, usize>,
    banknote_stock: BTreeMap<u64, usize>,
    coin_dispenser_capacity: usize,
    banknote_dispenser_capacity: usize,
    coin_validator_failed: bool,
    failed_coin_dispensers: BTreeSet<u64>,
    failed_banknote_dispensers: BTreeSet<u64>,
    disabled: HashSet<Toggle>,
    scale: BTreeMap<u64, u64>,
    scale_limit: u64,
}

impl ModelWorld {
    /// Station configuration the model mirrors.
    ///
    /// Capacities are small so that random operation sequences hit the
    /// overflow paths.
    pub fn station_config() -> StationConfig {
        StationConfig {
            coin_tray_capacity: 5,
            coin_storage_capacity: 8,
            banknote_storage_capacity: 6,
            coin_dispenser_capacity: 6,
            banknote_dispenser_capacity: 4,
            scale_limit_grams: 5000.0,
            ..StationConfig::default()
        }
    }

    /// Create a model of a freshly configured station.
    pub fn new() -> Self {
        let config = Self::station_config();
        Self {
            tray: 0,
            tray_capacity: config.coin_tray_capacity,
            coin_storage: 0,
            coin_storage_capacity: config.coin_storage_capacity,
            banknote_storage: 0,
            banknote_storage_capacity: config.banknote_storage_capacity,
            input_dangling: None,
            output_dangling: None,
            coin_stock: config.coin_denominations.iter().map(|&v| (v, 0)).collect(),
            banknote_stock: config.banknote_denominations.iter().map(|&v| (v, 0)).collect(),
            coin_dispenser_capacity: config.coin_dispenser_capacity,
            banknote_dispenser_capacity: config.banknote_dispenser_capacity,
            coin_validator_failed: false,
            failed_coin_dispensers: BTreeSet::new(),
            failed_banknote_dispensers: BTreeSet::new(),
            disabled: HashSet::new(),
            scale: BTreeMap::new(),
            // Whole grams; the configured limit is integral.
            scale_limit: 5000,
        }
    }

    /// Apply an operation and return the result.
    ///
    /// The result should match the real station's result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        let result = match op {
            Operation::InsertCoin { value, foreign } => {
                self.insert_coin(coin_value(*value), *foreign)
            },
            Operation::InsertBanknote { value, foreign } => {
                self.insert_banknote(banknote_value(*value), *foreign)
            },
            Operation::RemoveDanglingBanknote => {
                self.input_dangling.take().map(|_| ()).ok_or(OperationError::Dangling)
            },
            Operation::CollectBanknote => {
                self.output_dangling.take().map(|_| ()).ok_or(OperationError::Dangling)
            },
            Operation::CollectCoins => {
                self.tray = 0;
                Ok(())
            },
            Operation::DispenseCoin { value } => self.dispense_coin(coin_value(*value)),
            Operation::DispenseBanknote { value } => self.dispense_banknote(banknote_value(*value)),
            Operation::LoadCoins { value, count } => Self::load(
                &mut self.coin_stock,
                &self.failed_coin_dispensers,
                self.coin_dispenser_capacity,
                coin_value(*value),
                batch_size(*count),
            ),
            Operation::LoadBanknotes { value, count } => Self::load(
                &mut self.banknote_stock,
                &self.failed_banknote_dispensers,
                self.banknote_dispenser_capacity,
                banknote_value(*value),
                batch_size(*count),
            ),
            Operation::UnloadCoinStorage => {
                self.coin_storage = 0;
                Ok(())
            },
            Operation::UnloadBanknoteStorage => {
                self.banknote_storage = 0;
                Ok(())
            },
            Operation::AddItem { id, grams } => {
                let id = item_id(*id);
                if self.scale.contains_key(&id) {
                    Err(OperationError::DuplicateItem)
                } else {
                    self.scale.insert(id, u64::from(item_grams(*grams)));
                    Ok(())
                }
            },
            Operation::RemoveItem { id } => {
                self.scale.remove(&item_id(*id)).map(|_| ()).ok_or(OperationError::ItemNotFound)
            },
            Operation::Disable { device } => {
                self.disabled.insert(*device);
                Ok(())
            },
            Operation::Enable { device } => {
                self.disabled.remove(device);
                Ok(())
            },
        };

        match result {
            Ok(()) => OperationResult::Ok,
            Err(e) => OperationResult::Error(e),
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            tray: self.tray,
            coin_storage: self.coin_storage,
            banknote_storage: self.banknote_storage,
            input_dangling: self.input_dangling,
            output_dangling: self.output_dangling,
            coin_stock: self.coin_stock.iter().map(|(&v, &n)| (v, n)).collect(),
            banknote_stock: self.banknote_stock.iter().map(|(&v, &n)| (v, n)).collect(),
            coin_validator_failed: self.coin_validator_failed,
            failed_coin_dispensers: self.failed_coin_dispensers.iter().copied().collect(),
            failed_banknote_dispensers: self.failed_banknote_dispensers.iter().copied().collect(),
            scale_items: self.scale.keys().copied().collect(),
            scale_overloaded: self.scale.values().sum::<u64>() > self.scale_limit,
        }
    }

    fn is_disabled(&self, device: Toggle) -> bool {
        self.disabled.contains(&device)
    }

    fn insert_coin(&mut self, value: u64, foreign: bool) -> Result<(), OperationError> {
        if self.is_disabled(Toggle::CoinSlot) {
            return Err(OperationError::Disabled);
        }
        // A failed validator reports no space to the slot.
        if self.coin_validator_failed {
            return Err(OperationError::Overload);
        }

        let valid = !foreign && self.coin_stock.contains_key(&value);
        if valid && self.coin_storage < self.coin_storage_capacity {
            self.coin_storage += 1;
            return Ok(());
        }

        // Rejected, or valid with storage full: the coin falls into the tray.
        // A tray that refuses it strands the coin inside the validator.
        if self.is_disabled(Toggle::CoinTray) || self.tray >= self.tray_capacity {
            self.coin_validator_failed = true;
            return Err(OperationError::Fatal);
        }
        self.tray += 1;
        Ok(())
    }

    fn insert_banknote(&mut self, value: u64, foreign: bool) -> Result<(), OperationError> {
        if self.is_disabled(Toggle::BanknoteInput) {
            return Err(OperationError::Disabled);
        }
        if self.input_dangling.is_some() {
            return Err(OperationError::Overload);
        }

        let valid = !foreign && self.banknote_stock.contains_key(&value);
        if valid && self.banknote_storage < self.banknote_storage_capacity {
            self.banknote_storage += 1;
        } else {
            self.input_dangling = Some(value);
        }
        Ok(())
    }

    fn dispense_coin(&mut self, value: u64) -> Result<(), OperationError> {
        let Some(stock) = self.coin_stock.get_mut(&value) else {
            return Err(OperationError::InvalidArgument);
        };
        if self.failed_coin_dispensers.contains(&value) {
            return Err(OperationError::Unusable);
        }
        if *stock == 0 {
            return Err(OperationError::Empty);
        }
        if self.tray >= self.tray_capacity {
            self.failed_coin_dispensers.insert(value);
            return Err(OperationError::Fatal);
        }
        if self.disabled.contains(&Toggle::CoinTray) {
            return Err(OperationError::Disabled);
        }
        *stock -= 1;
        self.tray += 1;
        Ok(())
    }

    fn dispense_banknote(&mut self, value: u64) -> Result<(), OperationError> {
        let Some(stock) = self.banknote_stock.get_mut(&value) else {
            return Err(OperationError::InvalidArgument);
        };
        if self.failed_banknote_dispensers.contains(&value) {
            return Err(OperationError::Unusable);
        }
        if *stock == 0 {
            return Err(OperationError::Empty);
        }
        if self.output_dangling.is_some() {
            self.failed_banknote_dispensers.insert(value);
            return Err(OperationError::Fatal);
        }
        if self.disabled.contains(&Toggle::BanknoteOutput) {
            return Err(OperationError::Disabled);
        }
        *stock -= 1;
        self.output_dangling = Some(value);
        Ok(())
    }

    fn load(
        stock: &mut BTreeMap<u64, usize>,
        failed: &BTreeSet<u64>,
        capacity: usize,
        value: u64,
        count: usize,
    ) -> Result<(), OperationError> {
        let Some(current) = stock.get_mut(&value) else {
            return Err(OperationError::InvalidArgument);
        };
        if failed.contains(&value) {
            return Err(OperationError::Unusable);
        }
        if *current + count > capacity {
            return Err(OperationError::Overload);
        }
        *current += count;
        Ok(())
    }
}

impl Default for ModelWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tray_overflow_breaks_validator() {
        let mut model = ModelWorld::new();
        for _ in 0..5 {
            assert!(model.apply(&Operation::InsertCoin { value: 5, foreign: false }).is_ok());
        }
        assert_eq!(
            model.apply(&Operation::InsertCoin { value: 5, foreign: false }),
            OperationResult::Error(OperationError::Fatal)
        );
        assert_eq!(
            model.apply(&Operation::InsertCoin { value: 0, foreign: false }),
            OperationResult::Error(OperationError::Overload)
        );
        assert!(model.observable_state().coin_validator_failed);
    }

    #[test]
    fn disabled_tray_strands_rejected_coin() {
        let mut model = ModelWorld::new();
        assert!(model.apply(&Operation::Disable { device: Toggle::CoinTray }).is_ok());
        assert_eq!(
            model.apply(&Operation::InsertCoin { value: 0, foreign: true }),
            OperationResult::Error(OperationError::Fatal)
        );
        let state = model.observable_state();
        assert!(state.coin_validator_failed);
        assert_eq!((state.tray, state.coin_storage), (0, 0));
    }

    #[test]
    fn foreign_banknote_dangles() {
        let mut model = ModelWorld::new();
        assert!(model.apply(&Operation::InsertBanknote { value: 0, foreign: true }).is_ok());
        assert_eq!(model.observable_state().input_dangling, Some(5));
        assert!(model.apply(&Operation::RemoveDanglingBanknote).is_ok());
        assert!(model.apply(&Operation::RemoveDanglingBanknote).is_err());
    }
}
