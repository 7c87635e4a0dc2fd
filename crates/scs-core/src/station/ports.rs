//! Borrowed delivery paths between the station's devices.
//!
//! Each port wraps mutable borrows of the devices at the far end of a
//! channel for the duration of one operation.

use crate::{
    channel::{Disconnected, Returned, Sink, TwoWay},
    device::{Device, DeviceId},
    devices::{BanknoteSlot, StorageUnit, StorePort, Tray, Validator, Verdict},
    env::Environment,
    error::DeviceError,
    item::{Banknote, Cash, Coin},
};

/// A slot may only hand an item to a validator that would take it in.
/// Anything else leaves the item with the slot.
fn admits<T: Cash, E: Environment>(validator: &Validator<T, E>) -> bool {
    validator.has_space() && validator.lifecycle().require_enabled().is_ok()
}

/// Coin slot → coin validator. Rejected coins fall into the tray, accepted
/// ones into coin storage.
pub struct CoinValidatorInlet<'a, E> {
    validator: &'a mut Validator<Coin, E>,
    tray: &'a mut Tray<Coin>,
    storage: &'a mut StorageUnit<Coin>,
    verdict: Option<Verdict>,
}

impl<'a, E: Environment> CoinValidatorInlet<'a, E> {
    pub(crate) fn new(
        validator: &'a mut Validator<Coin, E>,
        tray: &'a mut Tray<Coin>,
        storage: &'a mut StorageUnit<Coin>,
    ) -> Self {
        Self { validator, tray, storage, verdict: None }
    }

    /// Verdict of the last delivery, if the coin reached the validator.
    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }
}

impl<E: Environment> Sink<Coin> for CoinValidatorInlet<'_, E> {
    fn endpoint(&self) -> DeviceId {
        self.validator.id()
    }

    fn has_space(&self) -> bool {
        admits(self.validator)
    }

    fn deliver(&mut self, coin: Coin) -> Result<(), DeviceError> {
        let verdict = self.validator.accept(
            coin,
            &mut StorePort(&mut **self.tray),
            &mut StorePort(&mut **self.storage),
        )?;
        self.verdict = Some(verdict);
        Ok(())
    }
}

/// Input banknote slot ⇄ banknote validator.
///
/// Banknotes the validator ejects wait in the return path until the slot
/// takes them back.
pub struct BanknoteValidatorInlet<'a, E> {
    validator: &'a mut Validator<Banknote, E>,
    storage: &'a mut StorageUnit<Banknote>,
    returned: Returned<Banknote>,
    verdict: Option<Verdict>,
}

impl<'a, E: Environment> BanknoteValidatorInlet<'a, E> {
    pub(crate) fn new(
        slot: DeviceId,
        validator: &'a mut Validator<Banknote, E>,
        storage: &'a mut StorageUnit<Banknote>,
    ) -> Self {
        Self { validator, storage, returned: Returned::new(slot), verdict: None }
    }

    /// Verdict of the last delivery, if the banknote reached the validator.
    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }
}

impl<E: Environment> Sink<Banknote> for BanknoteValidatorInlet<'_, E> {
    fn endpoint(&self) -> DeviceId {
        self.validator.id()
    }

    fn has_space(&self) -> bool {
        admits(self.validator)
    }

    fn deliver(&mut self, banknote: Banknote) -> Result<(), DeviceError> {
        let verdict = self.validator.accept(
            banknote,
            &mut self.returned,
            &mut StorePort(&mut **self.storage),
        )?;
        self.verdict = Some(verdict);
        Ok(())
    }
}

impl<E: Environment> TwoWay<Banknote> for BanknoteValidatorInlet<'_, E> {
    fn take_returned(&mut self) -> Option<Banknote> {
        self.returned.take()
    }
}

/// Banknote dispenser → output slot.
pub struct SlotPort<'a>(pub &'a mut BanknoteSlot);

impl Sink<Banknote> for SlotPort<'_> {
    fn endpoint(&self) -> DeviceId {
        self.0.id()
    }

    fn has_space(&self) -> bool {
        self.0.has_space().unwrap_or(false)
    }

    fn deliver(&mut self, banknote: Banknote) -> Result<(), DeviceError> {
        let id = self.0.id();
        self.0.accept(banknote, &mut Disconnected(id))
    }
}
