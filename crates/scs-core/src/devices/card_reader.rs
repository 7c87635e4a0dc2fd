//! Card reader with tap, swipe and chip-insert paths.
//!
//! Each read path fails independently with its own probability. Draws come
//! from the injected [`Environment`]; a read succeeds when the draw in
//! `[0, 1)` is strictly greater than the path's failure probability.

use crate::{
    card::{Card, CardData},
    device::{Device, DeviceId, Lifecycle},
    env::Environment,
    error::{DeviceError, ReadFault},
};

/// Per-path failure probabilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardReaderConfig {
    /// Probability that a contactless read fails.
    pub tap_failure: f64,
    /// Probability that a magnetic stripe read fails.
    pub swipe_failure: f64,
    /// Probability that a chip read fails.
    pub insert_failure: f64,
}

impl Default for CardReaderConfig {
    fn default() -> Self {
        Self { tap_failure: 0.01, swipe_failure: 0.1, insert_failure: 0.01 }
    }
}

impl CardReaderConfig {
    /// Check every probability lies in `[0, 1]`.
    pub fn validate(&self) -> Result<(), DeviceError> {
        for (name, p) in
            [
                ("tap", self.tap_failure),
                ("swipe", self.swipe_failure),
                ("insert", self.insert_failure),
            ]
        {
            if !(0.0..=1.0).contains(&p) {
                let reason = format!("{name} failure probability out of range: {p}");
                return Err(DeviceError::invalid(reason));
            }
        }
        Ok(())
    }
}

/// Events announced by the card reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardReaderEvent {
    /// A tap-enabled card was tapped.
    Tapped,
    /// A card was swiped.
    Swiped,
    /// A card was inserted.
    Inserted,
    /// Card data was read successfully.
    DataRead(CardData),
    /// The inserted card was removed.
    Removed,
}

/// Card reader.
#[derive(Debug)]
pub struct CardReader<E> {
    lifecycle: Lifecycle<CardReaderEvent>,
    env: E,
    config: CardReaderConfig,
    card_inserted: bool,
}

impl<E: Environment> CardReader<E> {
    /// Create a card reader with the given fault profile.
    pub fn new(id: DeviceId, env: E, config: CardReaderConfig) -> Result<Self, DeviceError> {
        config.validate()?;
        Ok(Self { lifecycle: Lifecycle::new(id), env, config, card_inserted: false })
    }

    /// Fault profile.
    pub fn config(&self) -> CardReaderConfig {
        self.config
    }

    /// Whether a card is seated in the reader.
    pub fn is_card_inserted(&self) -> bool {
        self.card_inserted
    }

    /// Tap a card.
    ///
    /// Returns `Ok(None)` without announcing anything if the card does not
    /// support contactless reads.
    pub fn tap(&mut self, card: &Card) -> Result<Option<CardData>, DeviceError> {
        self.lifecycle.require_normal()?;

        if !card.is_tap_enabled() {
            tracing::debug!(device = %self.lifecycle.id(), "tap ignored: card is not tap-enabled");
            return Ok(None);
        }

        self.lifecycle.notify(CardReaderEvent::Tapped);
        if self.draw_passes(self.config.tap_failure) {
            Ok(Some(self.read(card.full_data())))
        } else {
            Err(self.read_failed(ReadFault::Contactless))
        }
    }

    /// Swipe a card. The stripe does not carry the CVV.
    pub fn swipe(&mut self, card: &Card) -> Result<CardData, DeviceError> {
        self.lifecycle.require_normal()?;

        self.lifecycle.notify(CardReaderEvent::Swiped);
        if self.draw_passes(self.config.swipe_failure) {
            Ok(self.read(card.stripe_data()))
        } else {
            Err(self.read_failed(ReadFault::MagneticStripe))
        }
    }

    /// Insert a card and enter its PIN.
    ///
    /// The card stays seated whether or not the read succeeds; call
    /// [`CardReader::remove`] before inserting again.
    pub fn insert(&mut self, card: &Card, pin: &str) -> Result<CardData, DeviceError> {
        self.lifecycle.require_normal()?;

        if self.card_inserted {
            return Err(DeviceError::CardAlreadyInserted { device: self.lifecycle.id() });
        }

        self.card_inserted = true;
        self.lifecycle.notify(CardReaderEvent::Inserted);

        if !card.has_chip() || !self.draw_passes(self.config.insert_failure) {
            return Err(self.read_failed(ReadFault::Chip));
        }

        if !card.pin_matches(pin) {
            tracing::warn!(device = %self.lifecycle.id(), "invalid PIN");
            return Err(DeviceError::InvalidPin { device: self.lifecycle.id() });
        }

        Ok(self.read(card.full_data()))
    }

    /// Remove the inserted card.
    pub fn remove(&mut self) -> Result<(), DeviceError> {
        self.lifecycle.require_normal()?;

        self.card_inserted = false;
        self.lifecycle.notify(CardReaderEvent::Removed);
        Ok(())
    }

    fn draw_passes(&self, failure: f64) -> bool {
        self.env.random_unit() > failure
    }

    fn read(&self, data: CardData) -> CardData {
        self.lifecycle.notify(CardReaderEvent::DataRead(data.clone()));
        data
    }

    fn read_failed(&self, fault: ReadFault) -> DeviceError {
        tracing::warn!(device = %self.lifecycle.id(), %fault, "card read failed");
        DeviceError::ReadFailed { device: self.lifecycle.id(), fault }
    }
}

impl<E> Device for CardReader<E> {
    type Event = CardReaderEvent;

    fn lifecycle(&self) -> &Lifecycle<CardReaderEvent> {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle<CardReaderEvent> {
        &mut self.lifecycle
    }
}
