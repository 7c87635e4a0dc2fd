//! Drives a real station with model operations.
//!
//! Mirrors [`ModelWorld`](crate::ModelWorld)'s interface so a test can apply
//! the same operation to both and compare results and observable state.

use scs_core::{
    Banknote, Coin, Currency, Device, DeviceError, Environment, Item, ItemId, Phase, Station,
    StationConfig,
};

use crate::model::{
    ObservableState, Operation, OperationResult, Toggle,
    operation::{banknote_value, batch_size, coin_value, item_grams, item_id},
};

/// Currency used for the `foreign` variants of the insert operations.
pub const FOREIGN: Currency = Currency::USD;

/// A configured station plus the operation mapping.
#[derive(Debug)]
pub struct StationDriver<E: Environment> {
    station: Station<E>,
}

impl<E: Environment> StationDriver<E> {
    /// Build a station and end its configuration phase.
    pub fn new(env: E, config: StationConfig) -> Result<Self, DeviceError> {
        let mut station = Station::new(env, config)?;
        station.end_configuration();
        Ok(Self { station })
    }

    /// Wrap a station that is already configured.
    pub fn from_station(station: Station<E>) -> Self {
        Self { station }
    }

    /// The station under test.
    pub fn station(&self) -> &Station<E> {
        &self.station
    }

    /// The station under test, mutably.
    pub fn station_mut(&mut self) -> &mut Station<E> {
        &mut self.station
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        tracing::trace!(?op, "applying operation");
        match op {
            Operation::InsertCoin { value, foreign } => {
                let currency = if *foreign { FOREIGN } else { self.station.config().currency };
                Coin::new(currency, coin_value(*value))
                    .and_then(|coin| self.station.insert_coin(coin))
                    .into()
            },
            Operation::InsertBanknote { value, foreign } => {
                let currency = if *foreign { FOREIGN } else { self.station.config().currency };
                Banknote::new(currency, banknote_value(*value))
                    .and_then(|note| self.station.insert_banknote(note))
                    .into()
            },
            Operation::RemoveDanglingBanknote => self.station.remove_dangling_banknote().into(),
            Operation::CollectBanknote => self.station.collect_banknote().into(),
            Operation::CollectCoins => self.station.collect_coins().into(),
            Operation::DispenseCoin { value } => {
                self.station.dispense_coin(coin_value(*value)).into()
            },
            Operation::DispenseBanknote { value } => {
                self.station.dispense_banknote(banknote_value(*value)).into()
            },
            Operation::LoadCoins { value, count } => {
                self.load_coins(coin_value(*value), batch_size(*count)).into()
            },
            Operation::LoadBanknotes { value, count } => {
                self.load_banknotes(banknote_value(*value), batch_size(*count)).into()
            },
            Operation::UnloadCoinStorage => self.station.coin_storage_mut().unload().into(),
            Operation::UnloadBanknoteStorage => self.station.banknote_storage_mut().unload().into(),
            Operation::AddItem { id, grams } => {
                Item::new(ItemId(item_id(*id)), f64::from(item_grams(*grams)))
                    .and_then(|item| self.station.scale_mut().add(item))
                    .into()
            },
            Operation::RemoveItem { id } => {
                self.station.scale_mut().remove(ItemId(item_id(*id))).into()
            },
            Operation::Disable { device } => self.toggle(*device, false).into(),
            Operation::Enable { device } => self.toggle(*device, true).into(),
        }
    }

    /// Extract observable state for comparison with the model.
    pub fn observable_state(&self) -> ObservableState {
        let station = &self.station;
        let coin_values = station.coin_validator().denominations();
        let banknote_values = station.banknote_validator().denominations();

        let coin_stock = coin_values
            .iter()
            .filter_map(|&v| station.coin_dispenser(v).map(|d| (v, d.size())))
            .collect();
        let banknote_stock = banknote_values
            .iter()
            .filter_map(|&v| station.banknote_dispenser(v).map(|d| (v, d.size())))
            .collect();

        let failed_coin_dispensers = coin_values
            .iter()
            .copied()
            .filter(|&v| station.coin_dispenser(v).is_some_and(|d| d.phase() == Phase::Error))
            .collect();
        let failed_banknote_dispensers = banknote_values
            .iter()
            .copied()
            .filter(|&v| station.banknote_dispenser(v).is_some_and(|d| d.phase() == Phase::Error))
            .collect();

        let mut scale_items: Vec<u64> =
            station.scale().items().iter().map(|item| item.id().0).collect();
        scale_items.sort_unstable();

        ObservableState {
            tray: station.coin_tray().items().len(),
            coin_storage: station.coin_storage().items().len(),
            banknote_storage: station.banknote_storage().items().len(),
            input_dangling: station.banknote_input().dangling().map(scs_core::Cash::value),
            output_dangling: station.banknote_output().dangling().map(scs_core::Cash::value),
            coin_stock,
            banknote_stock,
            coin_validator_failed: station.coin_validator().phase() == Phase::Error,
            failed_coin_dispensers,
            failed_banknote_dispensers,
            scale_items,
            scale_overloaded: station.scale().is_overloaded(),
        }
    }

    fn load_coins(&mut self, value: u64, count: usize) -> Result<(), DeviceError> {
        let currency = self.station.config().currency;
        let coins = (0..count)
            .map(|_| Coin::new(currency, value))
            .collect::<Result<Vec<_>, _>>()?;
        let dispenser =
            self.station.coin_dispenser_mut(value).ok_or_else(|| missing_dispenser(value))?;
        dispenser.load(coins)
    }

    fn load_banknotes(&mut self, value: u64, count: usize) -> Result<(), DeviceError> {
        let currency = self.station.config().currency;
        let notes = (0..count)
            .map(|_| Banknote::new(currency, value))
            .collect::<Result<Vec<_>, _>>()?;
        let dispenser =
            self.station.banknote_dispenser_mut(value).ok_or_else(|| missing_dispenser(value))?;
        dispenser.load(notes)
    }

    fn toggle(&mut self, device: Toggle, enable: bool) -> Result<(), DeviceError> {
        let station = &mut self.station;
        match (device, enable) {
            (Toggle::CoinSlot, true) => station.coin_slot_mut().enable(),
            (Toggle::CoinSlot, false) => station.coin_slot_mut().disable(),
            (Toggle::BanknoteInput, true) => station.banknote_input_mut().enable(),
            (Toggle::BanknoteInput, false) => station.banknote_input_mut().disable(),
            (Toggle::BanknoteOutput, true) => station.banknote_output_mut().enable(),
            (Toggle::BanknoteOutput, false) => station.banknote_output_mut().disable(),
            (Toggle::CoinTray, true) => station.coin_tray_mut().enable(),
            (Toggle::CoinTray, false) => station.coin_tray_mut().disable(),
        }
    }
}

fn missing_dispenser(value: u64) -> DeviceError {
    DeviceError::InvalidArgument { reason: format!("no dispenser for denomination {value}") }
}
