//! Delivery paths between devices.
//!
//! Devices never own each other. A device records *which* device its channel
//! leads to as a [`Wire`] during configuration; at operation time the caller
//! hands it a borrowed delivery path (a [`Sink`], [`TwoWay`] or [`Source`])
//! and the device checks the path's endpoint against its binding before
//! moving anything through it.
//!
//! # Contract
//!
//! - A sender checks `has_space()` before `deliver()`
//! - An overload raised by `deliver()` after a positive `has_space()` is a
//!   fatal inconsistency for the *sender*
//! - Any other error raised by the receiver propagates unchanged

use crate::{device::DeviceId, error::DeviceError};

/// One-way delivery path.
pub trait Sink<T> {
    /// Device at the far end of the path.
    fn endpoint(&self) -> DeviceId;

    /// Whether the far end can take another item right now.
    fn has_space(&self) -> bool;

    /// Move an item to the far end.
    ///
    /// Must only be called after `has_space()` returned true.
    fn deliver(&mut self, item: T) -> Result<(), DeviceError>;
}

/// Two-way delivery path: the far end may hand the delivered item back.
pub trait TwoWay<T>: Sink<T> {
    /// Take the item the far end ejected during the last delivery, if any.
    fn take_returned(&mut self) -> Option<T>;
}

/// Return path an item can be ejected into.
pub trait Source<T> {
    /// Device at the far end of the return path.
    fn endpoint(&self) -> DeviceId;

    /// Eject an item back towards its origin.
    fn eject(&mut self, item: T) -> Result<(), DeviceError>;
}

/// Configuration-time channel binding.
///
/// Records the far endpoint of one channel. Binding is the owning device's
/// business: it must only rebind while it is in its configuration phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wire {
    direction: &'static str,
    endpoint: Option<DeviceId>,
}

impl Wire {
    /// An unbound channel. `direction` names it in errors (`"sink"`, `"source"`).
    pub const fn unbound(direction: &'static str) -> Self {
        Self { direction, endpoint: None }
    }

    /// Bind (or rebind) the channel to `endpoint`.
    pub fn bind(&mut self, endpoint: DeviceId) {
        self.endpoint = Some(endpoint);
    }

    /// Bound endpoint, if any.
    pub fn endpoint(&self) -> Option<DeviceId> {
        self.endpoint
    }

    /// Verify that a path offered by the caller leads where the channel was
    /// bound.
    pub fn check(&self, device: DeviceId, actual: DeviceId) -> Result<(), DeviceError> {
        match self.endpoint {
            None => Err(DeviceError::NotConnected { device, direction: self.direction }),
            Some(expected) if expected != actual => {
                Err(DeviceError::Miswired { device, direction: self.direction, expected, actual })
            },
            Some(_) => Ok(()),
        }
    }
}

/// A path that leads nowhere. Never has space.
///
/// Used where a device has no outbound channel but a delivery path must
/// still be named, such as the output banknote slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected(pub DeviceId);

impl<T> Sink<T> for Disconnected {
    fn endpoint(&self) -> DeviceId {
        self.0
    }

    fn has_space(&self) -> bool {
        false
    }

    fn deliver(&mut self, _item: T) -> Result<(), DeviceError> {
        Err(DeviceError::NotConnected { device: self.0, direction: "sink" })
    }
}

impl<T> TwoWay<T> for Disconnected {
    fn take_returned(&mut self) -> Option<T> {
        None
    }
}

/// Return path that holds at most one ejected item until it is collected.
///
/// Models the reverse direction of a two-way channel: a validator ejects
/// into it, the originating slot takes the item back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Returned<T> {
    endpoint: DeviceId,
    item: Option<T>,
}

impl<T> Returned<T> {
    /// Empty return path leading to `endpoint`.
    pub const fn new(endpoint: DeviceId) -> Self {
        Self { endpoint, item: None }
    }

    /// Take the ejected item out.
    pub fn take(&mut self) -> Option<T> {
        self.item.take()
    }

    /// Whether an item is waiting.
    pub fn is_occupied(&self) -> bool {
        self.item.is_some()
    }
}

impl<T> Source<T> for Returned<T> {
    fn endpoint(&self) -> DeviceId {
        self.endpoint
    }

    fn eject(&mut self, item: T) -> Result<(), DeviceError> {
        if self.item.is_some() {
            return Err(DeviceError::Overload {
                device: self.endpoint,
                reason: "return path already holds an item".into(),
            });
        }
        self.item = Some(item);
        Ok(())
    }
}
