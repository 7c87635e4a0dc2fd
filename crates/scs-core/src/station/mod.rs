//! Self-checkout station: the arena owning one terminal's devices.
//!
//! ## Layout
//!
//! ```text
//!  coin slot ──► coin validator ──► coin storage
//!                     │
//!                     └──(reject)──► coin tray ◄── coin dispensers
//!
//!  input slot ⇄ banknote validator ──► banknote storage
//!
//!  banknote dispensers ──► output slot (inverted)
//! ```
//!
//! ## Design
//!
//! - Devices never reference each other. `Station::new` binds every
//!   channel by [`DeviceId`]; each operation borrows the devices on the
//!   path and hands them to the sender as a port.
//! - Every device starts in its configuration phase, so observers can be
//!   attached and dispensers stocked before [`Station::end_configuration`].

mod ports;

use std::collections::BTreeMap;

pub use ports::{BanknoteValidatorInlet, CoinValidatorInlet, SlotPort};

use crate::{
    device::{Device, DeviceId, Phase},
    devices::{
        BanknoteSlot, CardReader, CardReaderConfig, CoinSlot, Dispenser, ElectronicScale,
        StorageUnit, StorePort, Tray, Validator, Verdict, validator::validate_denominations,
    },
    env::Environment,
    error::DeviceError,
    item::{Banknote, Coin, Currency},
};

/// Construction parameters for a [`Station`].
#[derive(Debug, Clone, PartialEq)]
pub struct StationConfig {
    /// Currency accepted and dispensed.
    pub currency: Currency,
    /// Banknote denominations, whole units.
    pub banknote_denominations: Vec<u64>,
    /// Coin denominations, minor units.
    pub coin_denominations: Vec<u64>,
    /// Capacity of the banknote storage unit.
    pub banknote_storage_capacity: usize,
    /// Capacity of the coin storage unit.
    pub coin_storage_capacity: usize,
    /// Capacity of the coin tray.
    pub coin_tray_capacity: usize,
    /// Capacity of each banknote dispenser.
    pub banknote_dispenser_capacity: usize,
    /// Capacity of each coin dispenser.
    pub coin_dispenser_capacity: usize,
    /// Scale weight limit in grams.
    pub scale_limit_grams: f64,
    /// Scale sensitivity in grams.
    pub scale_sensitivity_grams: f64,
    /// Card reader fault profile.
    pub card_reader: CardReaderConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            currency: Currency::CAD,
            banknote_denominations: vec![5, 10, 20, 50, 100],
            coin_denominations: vec![5, 10, 25, 100, 200],
            banknote_storage_capacity: 1000,
            coin_storage_capacity: 1000,
            coin_tray_capacity: 20,
            banknote_dispenser_capacity: 100,
            coin_dispenser_capacity: 200,
            scale_limit_grams: 5000.0,
            scale_sensitivity_grams: 1.0,
            card_reader: CardReaderConfig::default(),
        }
    }
}

impl StationConfig {
    /// Check every parameter before any device is built.
    pub fn validate(&self) -> Result<(), DeviceError> {
        for (name, capacity) in [
            ("banknote storage", self.banknote_storage_capacity),
            ("coin storage", self.coin_storage_capacity),
            ("coin tray", self.coin_tray_capacity),
            ("banknote dispenser", self.banknote_dispenser_capacity),
            ("coin dispenser", self.coin_dispenser_capacity),
        ] {
            if capacity == 0 {
                return Err(DeviceError::invalid(format!("{name} capacity must be positive")));
            }
        }

        validate_denominations(&mut self.banknote_denominations.clone())?;
        validate_denominations(&mut self.coin_denominations.clone())?;

        if !(self.scale_limit_grams.is_finite() && self.scale_limit_grams > 0.0) {
            return Err(DeviceError::invalid("scale limit must be positive"));
        }
        if !(self.scale_sensitivity_grams.is_finite() && self.scale_sensitivity_grams > 0.0) {
            return Err(DeviceError::invalid("scale sensitivity must be positive"));
        }

        self.card_reader.validate()
    }
}

/// Visits every device of a station, whatever its event type.
///
/// Used to attach one kind of observer everywhere.
pub trait DeviceVisitor {
    /// Called once per device, in wiring order.
    fn visit<D>(&mut self, device: &mut D) -> Result<(), DeviceError>
    where
        D: Device,
        D::Event: std::fmt::Debug + 'static;
}

/// Every device of one self-checkout terminal, wired together.
#[derive(Debug)]
pub struct Station<E: Environment> {
    config: StationConfig,
    coin_slot: CoinSlot,
    coin_validator: Validator<Coin, E>,
    coin_storage: StorageUnit<Coin>,
    coin_tray: Tray<Coin>,
    coin_dispensers: BTreeMap<u64, Dispenser<Coin>>,
    banknote_input: BanknoteSlot,
    banknote_output: BanknoteSlot,
    banknote_validator: Validator<Banknote, E>,
    banknote_storage: StorageUnit<Banknote>,
    banknote_dispensers: BTreeMap<u64, Dispenser<Banknote>>,
    card_reader: CardReader<E>,
    scale: ElectronicScale,
}

impl<E: Environment> Station<E> {
    /// Build and wire every device. All devices are left in their
    /// configuration phase.
    pub fn new(env: E, config: StationConfig) -> Result<Self, DeviceError> {
        config.validate()?;

        let mut next = 0u32;
        let mut allocate = || {
            next += 1;
            DeviceId::new(next)
        };

        let mut coin_slot = CoinSlot::new(allocate());
        let mut coin_validator = Validator::new(
            allocate(),
            env.clone(),
            config.currency,
            config.coin_denominations.clone(),
        )?;
        let coin_storage = StorageUnit::new(allocate(), config.coin_storage_capacity)?;
        let coin_tray = Tray::new(allocate(), config.coin_tray_capacity)?;

        coin_slot.connect(coin_validator.id())?;
        coin_validator.connect(coin_tray.id(), coin_storage.id())?;

        let mut coin_dispensers = BTreeMap::new();
        for &value in coin_validator.denominations() {
            let mut dispenser = Dispenser::new(allocate(), config.coin_dispenser_capacity)?;
            dispenser.connect(coin_tray.id())?;
            coin_dispensers.insert(value, dispenser);
        }

        let mut banknote_input = BanknoteSlot::new(allocate(), false);
        let banknote_output = BanknoteSlot::new(allocate(), true);
        let mut banknote_validator = Validator::new(
            allocate(),
            env.clone(),
            config.currency,
            config.banknote_denominations.clone(),
        )?;
        let banknote_storage = StorageUnit::new(allocate(), config.banknote_storage_capacity)?;

        banknote_input.connect(banknote_validator.id())?;
        banknote_validator.connect(banknote_input.id(), banknote_storage.id())?;

        let mut banknote_dispensers = BTreeMap::new();
        for &value in banknote_validator.denominations() {
            let mut dispenser = Dispenser::new(allocate(), config.banknote_dispenser_capacity)?;
            dispenser.connect(banknote_output.id())?;
            banknote_dispensers.insert(value, dispenser);
        }

        let card_reader = CardReader::new(allocate(), env, config.card_reader)?;
        let scale = ElectronicScale::new(
            allocate(),
            config.scale_limit_grams,
            config.scale_sensitivity_grams,
        )?;

        tracing::debug!(devices = next, currency = %config.currency, "station wired");

        Ok(Self {
            config,
            coin_slot,
            coin_validator,
            coin_storage,
            coin_tray,
            coin_dispensers,
            banknote_input,
            banknote_output,
            banknote_validator,
            banknote_storage,
            banknote_dispensers,
            card_reader,
            scale,
        })
    }

    /// Seal every device: configuration ends, normal operation begins.
    pub fn end_configuration(&mut self) {
        self.coin_slot.end_configuration();
        self.coin_validator.end_configuration();
        self.coin_storage.end_configuration();
        self.coin_tray.end_configuration();
        self.coin_dispensers.values_mut().for_each(Device::end_configuration);
        self.banknote_input.end_configuration();
        self.banknote_output.end_configuration();
        self.banknote_validator.end_configuration();
        self.banknote_storage.end_configuration();
        self.banknote_dispensers.values_mut().for_each(Device::end_configuration);
        self.card_reader.end_configuration();
        self.scale.end_configuration();
        tracing::info!("station configured");
    }

    /// Insert a coin into the coin slot.
    ///
    /// Returns where the coin ended up, or `None` if it never reached the
    /// validator.
    pub fn insert_coin(&mut self, coin: Coin) -> Result<Option<Verdict>, DeviceError> {
        let mut inlet = CoinValidatorInlet::new(
            &mut self.coin_validator,
            &mut self.coin_tray,
            &mut self.coin_storage,
        );
        self.coin_slot.accept(coin, &mut inlet)?;
        Ok(inlet.verdict())
    }

    /// Insert a banknote into the input slot.
    ///
    /// Returns the validator's verdict, or `None` if the banknote was left
    /// dangling without reaching the validator.
    pub fn insert_banknote(&mut self, banknote: Banknote) -> Result<Option<Verdict>, DeviceError> {
        let mut inlet = BanknoteValidatorInlet::new(
            self.banknote_input.id(),
            &mut self.banknote_validator,
            &mut self.banknote_storage,
        );
        self.banknote_input.accept(banknote, &mut inlet)?;
        Ok(inlet.verdict())
    }

    /// The customer takes a banknote hanging from the input slot.
    pub fn remove_dangling_banknote(&mut self) -> Result<Banknote, DeviceError> {
        self.banknote_input.remove_dangling()
    }

    /// The customer takes a banknote hanging from the output slot.
    pub fn collect_banknote(&mut self) -> Result<Banknote, DeviceError> {
        self.banknote_output.remove_dangling()
    }

    /// The customer empties the coin tray.
    pub fn collect_coins(&mut self) -> Result<Vec<Coin>, DeviceError> {
        self.coin_tray.collect()
    }

    /// Release one coin of `value` into the coin tray.
    pub fn dispense_coin(&mut self, value: u64) -> Result<(), DeviceError> {
        let dispenser = self
            .coin_dispensers
            .get_mut(&value)
            .ok_or_else(|| no_dispenser("coin", value))?;
        dispenser.emit(&mut StorePort(&mut *self.coin_tray))
    }

    /// Release one banknote of `value` into the output slot.
    pub fn dispense_banknote(&mut self, value: u64) -> Result<(), DeviceError> {
        let dispenser = self
            .banknote_dispensers
            .get_mut(&value)
            .ok_or_else(|| no_dispenser("banknote", value))?;
        dispenser.emit(&mut SlotPort(&mut self.banknote_output))
    }

    /// Phase of every device, in wiring order.
    pub fn phases(&self) -> Vec<(DeviceId, Phase)> {
        let mut phases = vec![
            (self.coin_slot.id(), self.coin_slot.phase()),
            (self.coin_validator.id(), self.coin_validator.phase()),
            (self.coin_storage.id(), self.coin_storage.phase()),
            (self.coin_tray.id(), self.coin_tray.phase()),
        ];
        phases.extend(self.coin_dispensers.values().map(|d| (d.id(), d.phase())));
        phases.extend([
            (self.banknote_input.id(), self.banknote_input.phase()),
            (self.banknote_output.id(), self.banknote_output.phase()),
            (self.banknote_validator.id(), self.banknote_validator.phase()),
            (self.banknote_storage.id(), self.banknote_storage.phase()),
        ]);
        phases.extend(self.banknote_dispensers.values().map(|d| (d.id(), d.phase())));
        phases.push((self.card_reader.id(), self.card_reader.phase()));
        phases.push((self.scale.id(), self.scale.phase()));
        phases.sort_by_key(|(id, _)| *id);
        phases
    }

    /// Hand every device to `visitor`, in wiring order. Stops at the first
    /// error.
    pub fn visit_devices(&mut self, visitor: &mut impl DeviceVisitor) -> Result<(), DeviceError> {
        visitor.visit(&mut self.coin_slot)?;
        visitor.visit(&mut self.coin_validator)?;
        visitor.visit(&mut self.coin_storage)?;
        visitor.visit(&mut self.coin_tray)?;
        for dispenser in self.coin_dispensers.values_mut() {
            visitor.visit(dispenser)?;
        }
        visitor.visit(&mut self.banknote_input)?;
        visitor.visit(&mut self.banknote_output)?;
        visitor.visit(&mut self.banknote_validator)?;
        visitor.visit(&mut self.banknote_storage)?;
        for dispenser in self.banknote_dispensers.values_mut() {
            visitor.visit(dispenser)?;
        }
        visitor.visit(&mut self.card_reader)?;
        visitor.visit(&mut self.scale)
    }

    /// Construction parameters.
    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Coin slot.
    pub fn coin_slot(&self) -> &CoinSlot {
        &self.coin_slot
    }

    /// Coin slot, mutably.
    pub fn coin_slot_mut(&mut self) -> &mut CoinSlot {
        &mut self.coin_slot
    }

    /// Coin validator.
    pub fn coin_validator(&self) -> &Validator<Coin, E> {
        &self.coin_validator
    }

    /// Coin validator, mutably.
    pub fn coin_validator_mut(&mut self) -> &mut Validator<Coin, E> {
        &mut self.coin_validator
    }

    /// Coin storage unit.
    pub fn coin_storage(&self) -> &StorageUnit<Coin> {
        &self.coin_storage
    }

    /// Coin storage unit, mutably.
    pub fn coin_storage_mut(&mut self) -> &mut StorageUnit<Coin> {
        &mut self.coin_storage
    }

    /// Coin tray.
    pub fn coin_tray(&self) -> &Tray<Coin> {
        &self.coin_tray
    }

    /// Coin tray, mutably.
    pub fn coin_tray_mut(&mut self) -> &mut Tray<Coin> {
        &mut self.coin_tray
    }

    /// Coin dispenser for a denomination.
    pub fn coin_dispenser(&self, value: u64) -> Option<&Dispenser<Coin>> {
        self.coin_dispensers.get(&value)
    }

    /// Coin dispenser for a denomination, mutably.
    pub fn coin_dispenser_mut(&mut self, value: u64) -> Option<&mut Dispenser<Coin>> {
        self.coin_dispensers.get_mut(&value)
    }

    /// Input banknote slot.
    pub fn banknote_input(&self) -> &BanknoteSlot {
        &self.banknote_input
    }

    /// Input banknote slot, mutably.
    pub fn banknote_input_mut(&mut self) -> &mut BanknoteSlot {
        &mut self.banknote_input
    }

    /// Output banknote slot.
    pub fn banknote_output(&self) -> &BanknoteSlot {
        &self.banknote_output
    }

    /// Output banknote slot, mutably.
    pub fn banknote_output_mut(&mut self) -> &mut BanknoteSlot {
        &mut self.banknote_output
    }

    /// Banknote validator.
    pub fn banknote_validator(&self) -> &Validator<Banknote, E> {
        &self.banknote_validator
    }

    /// Banknote validator, mutably.
    pub fn banknote_validator_mut(&mut self) -> &mut Validator<Banknote, E> {
        &mut self.banknote_validator
    }

    /// Banknote storage unit.
    pub fn banknote_storage(&self) -> &StorageUnit<Banknote> {
        &self.banknote_storage
    }

    /// Banknote storage unit, mutably.
    pub fn banknote_storage_mut(&mut self) -> &mut StorageUnit<Banknote> {
        &mut self.banknote_storage
    }

    /// Banknote dispenser for a denomination.
    pub fn banknote_dispenser(&self, value: u64) -> Option<&Dispenser<Banknote>> {
        self.banknote_dispensers.get(&value)
    }

    /// Banknote dispenser for a denomination, mutably.
    pub fn banknote_dispenser_mut(&mut self, value: u64) -> Option<&mut Dispenser<Banknote>> {
        self.banknote_dispensers.get_mut(&value)
    }

    /// Card reader.
    pub fn card_reader(&self) -> &CardReader<E> {
        &self.card_reader
    }

    /// Card reader, mutably.
    pub fn card_reader_mut(&mut self) -> &mut CardReader<E> {
        &mut self.card_reader
    }

    /// Electronic scale.
    pub fn scale(&self) -> &ElectronicScale {
        &self.scale
    }

    /// Electronic scale, mutably.
    pub fn scale_mut(&mut self) -> &mut ElectronicScale {
        &mut self.scale
    }
}

fn no_dispenser(kind: &str, value: u64) -> DeviceError {
    DeviceError::invalid(format!("no {kind} dispenser for denomination {value}"))
}
