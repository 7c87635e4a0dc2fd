//! Device error types.

use thiserror::Error;

use crate::{device::DeviceId, item::ItemId};

/// Physical read path that failed on the card reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFault {
    /// Contactless (tap) read failed.
    Contactless,
    /// Magnetic stripe (swipe) read failed.
    MagneticStripe,
    /// Chip (insert) read failed, or the card has no chip.
    Chip,
}

impl std::fmt::Display for ReadFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contactless => f.write_str("contactless"),
            Self::MagneticStripe => f.write_str("magnetic stripe"),
            Self::Chip => f.write_str("chip"),
        }
    }
}

/// Errors from device operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    /// Operation invoked before `end_configuration`.
    #[error("{device} is not yet configured")]
    NotConfigured {
        /// Device the operation was invoked on.
        device: DeviceId,
    },

    /// Operation invoked after the device entered the error phase.
    #[error("{device} is unusable: it is in the error phase")]
    Unusable {
        /// Device the operation was invoked on.
        device: DeviceId,
    },

    /// Configuration-only operation invoked after configuration ended.
    #[error("{device} is no longer in its configuration phase")]
    ConfigurationClosed {
        /// Device the operation was invoked on.
        device: DeviceId,
    },

    /// Device is disabled and refuses physical movement.
    #[error("{device} is disabled")]
    Disabled {
        /// Disabled device.
        device: DeviceId,
    },

    /// Capacity would be exceeded.
    #[error("{device} overloaded: {reason}")]
    Overload {
        /// Device that is full.
        device: DeviceId,
        /// What overflowed.
        reason: String,
    },

    /// Dispenser has no stock.
    #[error("{device} is empty")]
    Empty {
        /// Empty device.
        device: DeviceId,
    },

    /// Malformed construction parameter or argument.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the problem.
        reason: String,
    },

    /// Device has no channel bound for the requested direction.
    #[error("{device} has no {direction} channel connected")]
    NotConnected {
        /// Device missing the binding.
        device: DeviceId,
        /// Which channel (`sink`, `source`).
        direction: &'static str,
    },

    /// Delivery path does not lead to the bound endpoint.
    #[error("{device} {direction} channel is bound to {expected}, not {actual}")]
    Miswired {
        /// Device whose binding was violated.
        device: DeviceId,
        /// Which channel (`sink`, `source`).
        direction: &'static str,
        /// Endpoint bound during configuration.
        expected: DeviceId,
        /// Endpoint of the path offered at run time.
        actual: DeviceId,
    },

    /// A banknote is (or is not) dangling from a slot.
    #[error("{device}: {reason}")]
    Dangling {
        /// Slot involved.
        device: DeviceId,
        /// Description of the dangling-item conflict.
        reason: &'static str,
    },

    /// Card reader already holds a card.
    #[error("{device} already holds an inserted card")]
    CardAlreadyInserted {
        /// Card reader.
        device: DeviceId,
    },

    /// Card read failed.
    #[error("{device}: {fault} read failed")]
    ReadFailed {
        /// Card reader.
        device: DeviceId,
        /// Which read path failed.
        fault: ReadFault,
    },

    /// PIN entered on insert does not match the card.
    #[error("{device}: invalid PIN")]
    InvalidPin {
        /// Card reader.
        device: DeviceId,
    },

    /// The same item is already on the scale.
    #[error("{device}: item {item} is already on the scale")]
    DuplicateItem {
        /// Scale.
        device: DeviceId,
        /// Offending item.
        item: ItemId,
    },

    /// Item is not on the scale.
    #[error("{device}: item {item} is not on the scale")]
    ItemNotFound {
        /// Scale.
        device: DeviceId,
        /// Missing item.
        item: ItemId,
    },

    /// Internal inconsistency. The device has entered the error phase.
    #[error("{device} failed: {reason}")]
    Fatal {
        /// Device that entered the error phase.
        device: DeviceId,
        /// Description of the inconsistency.
        reason: String,
    },
}

impl DeviceError {
    /// Returns true if this error is fatal (unrecoverable).
    ///
    /// Fatal errors mean the reporting device entered its error phase and
    /// needs physical service. Never retry after a fatal error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// Returns true if the operation was invoked in the wrong phase.
    pub fn is_phase_violation(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured { .. } | Self::Unusable { .. } | Self::ConfigurationClosed { .. }
        )
    }

    /// Returns true if the caller can retry after changing device state
    /// (enabling, unloading, loading, removing a dangling item, ...).
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Disabled { .. }
            | Self::Overload { .. }
            | Self::Empty { .. }
            | Self::Dangling { .. }
            | Self::CardAlreadyInserted { .. }
            | Self::ReadFailed { .. }
            | Self::InvalidPin { .. } => true,

            Self::NotConfigured { .. }
            | Self::Unusable { .. }
            | Self::ConfigurationClosed { .. }
            | Self::InvalidArgument { .. }
            | Self::NotConnected { .. }
            | Self::Miswired { .. }
            | Self::DuplicateItem { .. }
            | Self::ItemNotFound { .. }
            | Self::Fatal { .. } => false,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument { reason: reason.into() }
    }
}
