//! Customer-facing coin and banknote slots.

use crate::{
    channel::{Sink, TwoWay, Wire},
    device::{Device, DeviceId, Lifecycle},
    error::DeviceError,
    item::{Banknote, Cash, Coin},
};

/// Events announced by the coin slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinSlotEvent {
    /// A coin went into the slot.
    CoinInserted,
}

/// Coin slot. Passes every coin straight to its sink.
#[derive(Debug)]
pub struct CoinSlot {
    lifecycle: Lifecycle<CoinSlotEvent>,
    sink: Wire,
}

impl CoinSlot {
    /// Create an unwired coin slot.
    pub fn new(id: DeviceId) -> Self {
        Self { lifecycle: Lifecycle::new(id), sink: Wire::unbound("sink") }
    }

    /// Bind the outbound channel. Configuration phase only.
    pub fn connect(&mut self, sink: DeviceId) -> Result<(), DeviceError> {
        self.lifecycle.require_configuration()?;
        self.sink.bind(sink);
        Ok(())
    }

    /// Whether the sink can take another coin.
    pub fn has_space(&self, sink: &impl Sink<Coin>) -> Result<bool, DeviceError> {
        self.lifecycle.require_normal()?;
        Ok(sink.has_space())
    }

    /// Insert a coin and pass it on.
    pub fn accept(&mut self, coin: Coin, sink: &mut impl Sink<Coin>) -> Result<(), DeviceError> {
        self.lifecycle.require_enabled()?;
        let id = self.lifecycle.id();
        self.sink.check(id, sink.endpoint())?;

        self.lifecycle.notify(CoinSlotEvent::CoinInserted);

        if !sink.has_space() {
            tracing::warn!(device = %id, "coin path is full");
            return Err(DeviceError::Overload {
                device: id,
                reason: "unable to route coin: sink is full".into(),
            });
        }

        match sink.deliver(coin) {
            Ok(()) => Ok(()),
            Err(DeviceError::Overload { reason, .. }) => {
                Err(self.lifecycle.fail(format!("sink overflowed after reporting space: {reason}")))
            },
            Err(e) => Err(e),
        }
    }
}

impl Device for CoinSlot {
    type Event = CoinSlotEvent;

    fn lifecycle(&self) -> &Lifecycle<CoinSlotEvent> {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle<CoinSlotEvent> {
        &mut self.lifecycle
    }
}

/// Events announced by banknote slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanknoteSlotEvent {
    /// A banknote went into the slot.
    Inserted,
    /// A banknote is now dangling from the slot.
    Ejected,
    /// The customer took the dangling banknote.
    Removed,
}

/// Banknote slot.
///
/// An input slot feeds a validator over a two-way channel; a banknote the
/// validator hands back stays *dangling* until the customer removes it. An
/// inverted slot (the output slot) never passes banknotes on: everything it
/// receives is left dangling for the customer.
#[derive(Debug)]
pub struct BanknoteSlot {
    lifecycle: Lifecycle<BanknoteSlotEvent>,
    invert: bool,
    sink: Wire,
    dangling: Option<Banknote>,
}

impl BanknoteSlot {
    /// Create a slot. `invert` makes it an output slot.
    pub fn new(id: DeviceId, invert: bool) -> Self {
        Self { lifecycle: Lifecycle::new(id), invert, sink: Wire::unbound("sink"), dangling: None }
    }

    /// Bind the two-way channel. Configuration phase only.
    pub fn connect(&mut self, sink: DeviceId) -> Result<(), DeviceError> {
        self.lifecycle.require_configuration()?;
        self.sink.bind(sink);
        Ok(())
    }

    /// Whether this is an output slot.
    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Banknote currently dangling, if any.
    pub fn dangling(&self) -> Option<&Banknote> {
        self.dangling.as_ref()
    }

    /// True when no banknote is dangling.
    pub fn has_space(&self) -> Result<bool, DeviceError> {
        self.lifecycle.require_normal()?;
        Ok(self.dangling.is_none())
    }

    /// Insert a banknote.
    ///
    /// Fails with overload while another banknote dangles.
    ///
    /// A banknote the far end refuses stays dangling, so it is never lost.
    pub fn accept(
        &mut self,
        banknote: Banknote,
        sink: &mut impl TwoWay<Banknote>,
    ) -> Result<(), DeviceError> {
        self.lifecycle.require_enabled()?;
        let id = self.lifecycle.id();

        if self.dangling.is_some() {
            return Err(DeviceError::Overload {
                device: id,
                reason: "a banknote is dangling from the slot; remove it first".into(),
            });
        }

        if !self.invert {
            self.sink.check(id, sink.endpoint())?;
        }

        self.lifecycle.notify(BanknoteSlotEvent::Inserted);

        if self.invert || !sink.has_space() {
            self.dangle(banknote);
            return Ok(());
        }

        match sink.deliver(banknote.clone()) {
            Ok(()) => {},
            Err(DeviceError::Overload { reason, .. }) => {
                let reason = format!("sink overflowed after reporting space: {reason}");
                return Err(self.lifecycle.fail(reason));
            },
            Err(e) => {
                tracing::warn!(device = %id, error = %e, "banknote refused downstream");
                self.dangle(banknote);
                return Err(e);
            },
        }

        if let Some(returned) = sink.take_returned() {
            self.dangle(returned);
        }
        Ok(())
    }

    /// Hand a banknote to the customer.
    pub fn emit(&mut self, banknote: Banknote) -> Result<(), DeviceError> {
        self.lifecycle.require_enabled()?;

        if self.dangling.is_some() {
            return Err(DeviceError::Dangling {
                device: self.lifecycle.id(),
                reason: "a banknote is already dangling from the slot",
            });
        }

        self.dangle(banknote);
        Ok(())
    }

    /// The customer takes the dangling banknote.
    pub fn remove_dangling(&mut self) -> Result<Banknote, DeviceError> {
        self.lifecycle.require_normal()?;

        let banknote = self.dangling.take().ok_or(DeviceError::Dangling {
            device: self.lifecycle.id(),
            reason: "no banknote is dangling from the slot",
        })?;
        self.lifecycle.notify(BanknoteSlotEvent::Removed);
        Ok(banknote)
    }

    fn dangle(&mut self, banknote: Banknote) {
        let value = banknote.value();
        tracing::debug!(device = %self.lifecycle.id(), value, "banknote dangling");
        self.dangling = Some(banknote);
        self.lifecycle.notify(BanknoteSlotEvent::Ejected);
    }
}

impl Device for BanknoteSlot {
    type Event = BanknoteSlotEvent;

    fn lifecycle(&self) -> &Lifecycle<BanknoteSlotEvent> {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle<BanknoteSlotEvent> {
        &mut self.lifecycle
    }
}
