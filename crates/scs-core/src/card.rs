//! Payment cards and the data a reader extracts from them.

use std::fmt;

/// Kind of payment card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKind {
    /// Debit card.
    Debit,
    /// Credit card.
    Credit,
    /// Store membership card.
    Membership,
    /// Prepaid gift card.
    Gift,
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debit => f.write_str("debit"),
            Self::Credit => f.write_str("credit"),
            Self::Membership => f.write_str("membership"),
            Self::Gift => f.write_str("gift"),
        }
    }
}

/// A physical card presented to the reader.
///
/// `Debug` output redacts the CVV and PIN.
#[derive(Clone, PartialEq, Eq)]
pub struct Card {
    kind: CardKind,
    number: String,
    cardholder: String,
    cvv: String,
    pin: String,
    tap_enabled: bool,
    has_chip: bool,
}

impl Card {
    /// Create a card.
    pub fn new(
        kind: CardKind,
        number: impl Into<String>,
        cardholder: impl Into<String>,
        cvv: impl Into<String>,
        pin: impl Into<String>,
        tap_enabled: bool,
        has_chip: bool,
    ) -> Self {
        Self {
            kind,
            number: number.into(),
            cardholder: cardholder.into(),
            cvv: cvv.into(),
            pin: pin.into(),
            tap_enabled,
            has_chip,
        }
    }

    /// Card kind.
    pub fn kind(&self) -> CardKind {
        self.kind
    }

    /// Card number.
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Name on the card.
    pub fn cardholder(&self) -> &str {
        &self.cardholder
    }

    /// Whether the card supports contactless reads.
    pub fn is_tap_enabled(&self) -> bool {
        self.tap_enabled
    }

    /// Whether the card carries a chip.
    pub fn has_chip(&self) -> bool {
        self.has_chip
    }

    pub(crate) fn pin_matches(&self, pin: &str) -> bool {
        self.pin == pin
    }

    /// Data exposed by a contactless or chip read.
    pub(crate) fn full_data(&self) -> CardData {
        CardData {
            kind: self.kind,
            number: self.number.clone(),
            cardholder: self.cardholder.clone(),
            cvv: Some(self.cvv.clone()),
        }
    }

    /// Data exposed by the magnetic stripe. The stripe does not carry the CVV.
    pub(crate) fn stripe_data(&self) -> CardData {
        CardData {
            kind: self.kind,
            number: self.number.clone(),
            cardholder: self.cardholder.clone(),
            cvv: None,
        }
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("kind", &self.kind)
            .field("number", &self.number)
            .field("cardholder", &self.cardholder)
            .field("cvv", &"<redacted>")
            .field("pin", &"<redacted>")
            .field("tap_enabled", &self.tap_enabled)
            .field("has_chip", &self.has_chip)
            .finish()
    }
}

/// Data read from a card.
#[derive(Clone, PartialEq, Eq)]
pub struct CardData {
    /// Card kind.
    pub kind: CardKind,
    /// Card number.
    pub number: String,
    /// Name on the card.
    pub cardholder: String,
    /// Card verification value. `None` for magnetic stripe reads.
    pub cvv: Option<String>,
}

impl fmt::Debug for CardData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardData")
            .field("kind", &self.kind)
            .field("number", &self.number)
            .field("cardholder", &self.cardholder)
            .field("cvv", &self.cvv.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
