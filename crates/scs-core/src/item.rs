//! Physical items handled by the devices.
//!
//! - [`Coin`] and [`Banknote`] travel through channels
//! - [`Item`] rests on the electronic scale
//!
//! Values are integers to keep money exact: coin values are in minor units
//! (cents), banknote values in whole currency units.

use std::fmt;

use crate::error::DeviceError;

/// ISO-4217 currency code (three upper-case ASCII letters).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Currency([u8; 3]);

impl Currency {
    /// Canadian dollar.
    pub const CAD: Self = Self(*b"CAD");

    /// United States dollar.
    pub const USD: Self = Self(*b"USD");

    /// Parse a currency code such as `"CAD"`.
    pub fn new(code: &str) -> Result<Self, DeviceError> {
        let bytes: [u8; 3] = code
            .as_bytes()
            .try_into()
            .map_err(|_| {
                DeviceError::invalid(format!("currency code must be 3 letters: {code:?}"))
            })?;

        if !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(DeviceError::invalid(format!(
                "currency code must be upper-case ASCII: {code:?}"
            )));
        }

        Ok(Self(bytes))
    }

    /// The code as a string slice.
    pub fn code(&self) -> &str {
        // Only upper-case ASCII is ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Money items that a validator can classify.
pub trait Cash: Clone + fmt::Debug {
    /// Currency of the item.
    fn currency(&self) -> Currency;

    /// Face value (minor units for coins, whole units for banknotes).
    fn value(&self) -> u64;
}

/// A coin. Value is in minor units (5 = five cents).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coin {
    currency: Currency,
    value: u64,
}

impl Coin {
    /// Create a coin. The value must be positive.
    pub fn new(currency: Currency, value: u64) -> Result<Self, DeviceError> {
        if value == 0 {
            return Err(DeviceError::invalid("coin value must be positive"));
        }
        Ok(Self { currency, value })
    }
}

impl Cash for Coin {
    fn currency(&self) -> Currency {
        self.currency
    }

    fn value(&self) -> u64 {
        self.value
    }
}

/// A banknote. Value is in whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Banknote {
    currency: Currency,
    value: u64,
}

impl Banknote {
    /// Create a banknote. The value must be positive.
    pub fn new(currency: Currency, value: u64) -> Result<Self, DeviceError> {
        if value == 0 {
            return Err(DeviceError::invalid("banknote value must be positive"));
        }
        Ok(Self { currency, value })
    }
}

impl Cash for Banknote {
    fn currency(&self) -> Currency {
        self.currency
    }

    fn value(&self) -> u64 {
        self.value
    }
}

/// Identity of an item placed on the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A weighable item. Two items are the same item iff their ids match.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    id: ItemId,
    weight_grams: f64,
}

impl Item {
    /// Create an item. Weight must be positive and finite.
    pub fn new(id: ItemId, weight_grams: f64) -> Result<Self, DeviceError> {
        if !weight_grams.is_finite() || weight_grams <= 0.0 {
            return Err(DeviceError::invalid(format!(
                "item weight must be positive and finite: {weight_grams}"
            )));
        }
        Ok(Self { id, weight_grams })
    }

    /// Item identity.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Weight in grams.
    pub fn weight_grams(&self) -> f64 {
        self.weight_grams
    }
}
