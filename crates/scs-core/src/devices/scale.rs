//! Electronic scale in the bagging area.
//!
//! Tracks the items resting on it and announces weight changes larger than
//! its sensitivity. The reference point for "changed" is the weight at the
//! last announcement, so many small additions eventually add up to one
//! announcement.
//!
//! # Invariants
//!
//! - An item (by id) rests on the scale at most once
//! - After a removal the total is the sum over the remaining items, never a
//!   running difference

use crate::{
    device::{Device, DeviceId, Lifecycle},
    error::DeviceError,
    item::{Item, ItemId},
};

/// Events announced by the scale.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleEvent {
    /// The total exceeded the weight limit.
    Overload,
    /// The total dropped back within the weight limit.
    OutOfOverload,
    /// The total changed by more than the sensitivity.
    WeightChanged {
        /// New total in grams.
        grams: f64,
    },
}

/// Electronic scale.
#[derive(Debug)]
pub struct ElectronicScale {
    lifecycle: Lifecycle<ScaleEvent>,
    weight_limit: f64,
    sensitivity: f64,
    items: Vec<Item>,
    total: f64,
    weight_at_last_event: f64,
}

impl ElectronicScale {
    /// Create a scale. Limit and sensitivity (grams) must be positive.
    pub fn new(id: DeviceId, weight_limit: f64, sensitivity: f64) -> Result<Self, DeviceError> {
        if !(weight_limit.is_finite() && weight_limit > 0.0) {
            let reason = format!("weight limit must be positive: {weight_limit}");
            return Err(DeviceError::invalid(reason));
        }
        if !(sensitivity.is_finite() && sensitivity > 0.0) {
            let reason = format!("sensitivity must be positive: {sensitivity}");
            return Err(DeviceError::invalid(reason));
        }
        Ok(Self {
            lifecycle: Lifecycle::new(id),
            weight_limit,
            sensitivity,
            items: Vec::new(),
            total: 0.0,
            weight_at_last_event: 0.0,
        })
    }

    /// Weight limit in grams.
    pub fn weight_limit(&self) -> f64 {
        self.weight_limit
    }

    /// Sensitivity in grams.
    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// Items on the scale, in placement order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Whether the total exceeds the limit.
    pub fn is_overloaded(&self) -> bool {
        self.total > self.weight_limit
    }

    /// Current total in grams. Fails with overload while over the limit.
    pub fn current_weight(&self) -> Result<f64, DeviceError> {
        self.lifecycle.require_normal()?;

        if self.is_overloaded() {
            return Err(DeviceError::Overload {
                device: self.lifecycle.id(),
                reason: format!("weight exceeds limit of {} g", self.weight_limit),
            });
        }
        Ok(self.total)
    }

    /// Place an item on the scale.
    pub fn add(&mut self, item: Item) -> Result<(), DeviceError> {
        self.lifecycle.require_normal()?;

        if self.items.iter().any(|i| i.id() == item.id()) {
            return Err(DeviceError::DuplicateItem { device: self.lifecycle.id(), item: item.id() });
        }

        self.total += item.weight_grams();
        self.items.push(item);

        if self.is_overloaded() {
            tracing::warn!(device = %self.lifecycle.id(), total = self.total, "scale overloaded");
            self.lifecycle.notify(ScaleEvent::Overload);
        } else if self.total - self.weight_at_last_event > self.sensitivity {
            self.announce_weight();
        }
        Ok(())
    }

    /// Take an item off the scale.
    pub fn remove(&mut self, item: ItemId) -> Result<Item, DeviceError> {
        self.lifecycle.require_normal()?;

        let position = self
            .items
            .iter()
            .position(|i| i.id() == item)
            .ok_or(DeviceError::ItemNotFound { device: self.lifecycle.id(), item })?;
        let removed = self.items.remove(position);

        let was_overloaded = self.is_overloaded();
        self.total = self.items.iter().map(Item::weight_grams).sum();

        if was_overloaded && !self.is_overloaded() {
            self.weight_at_last_event = self.total;
            self.lifecycle.notify(ScaleEvent::OutOfOverload);
        }

        if !self.is_overloaded() && self.weight_at_last_event - self.total >= self.sensitivity {
            self.announce_weight();
        }
        Ok(removed)
    }

    fn announce_weight(&mut self) {
        self.weight_at_last_event = self.total;
        tracing::debug!(device = %self.lifecycle.id(), grams = self.total, "weight changed");
        self.lifecycle.notify(ScaleEvent::WeightChanged { grams: self.total });
    }
}

impl Device for ElectronicScale {
    type Event = ScaleEvent;

    fn lifecycle(&self) -> &Lifecycle<ScaleEvent> {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle<ScaleEvent> {
        &mut self.lifecycle
    }
}
