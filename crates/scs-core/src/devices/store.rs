//! Capacity-bounded stores: storage units and the coin tray.
//!
//! Both append until full and must be emptied physically (`unload`,
//! `collect`). They share [`BoundedStore`] for the bookkeeping and differ
//! only in how they are emptied by their users.
//!
//! # Invariants
//!
//! - `count() <= capacity()` at all times
//! - `accept` on a full store fails without mutation
//! - `load` inserts the whole batch or nothing
//! - `unload` returns exactly the stored items, in insertion order

use crate::{
    channel::{Sink, Source},
    device::{Device, DeviceId, Lifecycle},
    error::DeviceError,
};

/// Events announced by storage units and trays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// An item was accepted and there is still room.
    ItemAdded,
    /// An item was accepted and filled the store.
    Full,
    /// Items were placed directly into the store.
    Loaded {
        /// Number of items loaded.
        count: usize,
    },
    /// The store was emptied.
    Unloaded {
        /// Number of items removed.
        count: usize,
    },
}

/// Shared append-until-full container with lifecycle gating.
#[derive(Debug)]
pub struct BoundedStore<T> {
    lifecycle: Lifecycle<StoreEvent>,
    capacity: usize,
    items: Vec<T>,
}

impl<T> BoundedStore<T> {
    /// Create an empty store. Capacity must be positive.
    pub fn new(id: DeviceId, capacity: usize) -> Result<Self, DeviceError> {
        if capacity == 0 {
            return Err(DeviceError::invalid("store capacity must be positive"));
        }
        Ok(Self { lifecycle: Lifecycle::new(id), capacity, items: Vec::with_capacity(capacity) })
    }

    /// Maximum number of items.
    pub fn capacity(&self) -> Result<usize, DeviceError> {
        self.lifecycle.require_usable()?;
        Ok(self.capacity)
    }

    /// Number of stored items.
    pub fn count(&self) -> Result<usize, DeviceError> {
        self.lifecycle.require_usable()?;
        Ok(self.items.len())
    }

    /// Whether another item fits.
    pub fn has_space(&self) -> bool {
        self.items.len() < self.capacity
    }

    /// Accept one item through a channel.
    ///
    /// Announces `Full` instead of `ItemAdded` when this item fills the
    /// store. Fails with overload, leaving the store untouched, when it is
    /// already full.
    pub fn accept(&mut self, item: T) -> Result<(), DeviceError> {
        self.lifecycle.require_enabled()?;

        if !self.has_space() {
            let capacity = self.capacity;
            tracing::warn!(device = %self.lifecycle.id(), capacity, "store overflow");
            return Err(DeviceError::Overload {
                device: self.lifecycle.id(),
                reason: format!("capacity of {} reached", self.capacity),
            });
        }

        self.items.push(item);

        if self.has_space() {
            self.lifecycle.notify(StoreEvent::ItemAdded);
        } else {
            self.lifecycle.notify(StoreEvent::Full);
        }
        Ok(())
    }

    /// Place a batch directly into the store. All or nothing.
    pub fn load(&mut self, items: Vec<T>) -> Result<(), DeviceError> {
        self.lifecycle.require_usable()?;

        let free = self.capacity - self.items.len();
        if items.len() > free {
            return Err(DeviceError::Overload {
                device: self.lifecycle.id(),
                reason: format!("load of {} exceeds remaining capacity {free}", items.len()),
            });
        }

        let count = items.len();
        self.items.extend(items);
        self.lifecycle.notify(StoreEvent::Loaded { count });
        Ok(())
    }

    /// Remove and return every stored item.
    pub fn unload(&mut self) -> Result<Vec<T>, DeviceError> {
        self.lifecycle.require_usable()?;

        let items = std::mem::take(&mut self.items);
        self.lifecycle.notify(StoreEvent::Unloaded { count: items.len() });
        Ok(items)
    }

    /// Stored items, oldest first.
    pub fn items(&self) -> &[T] {
        &self.items
    }
}

impl<T> Device for BoundedStore<T> {
    type Event = StoreEvent;

    fn lifecycle(&self) -> &Lifecycle<StoreEvent> {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle<StoreEvent> {
        &mut self.lifecycle
    }
}

/// Storage unit behind a validator. Emptied by staff via `unload`.
#[derive(Debug)]
pub struct StorageUnit<T>(BoundedStore<T>);

impl<T> StorageUnit<T> {
    /// Create an empty storage unit.
    pub fn new(id: DeviceId, capacity: usize) -> Result<Self, DeviceError> {
        BoundedStore::new(id, capacity).map(Self)
    }
}

impl<T> std::ops::Deref for StorageUnit<T> {
    type Target = BoundedStore<T>;

    fn deref(&self) -> &BoundedStore<T> {
        &self.0
    }
}

impl<T> std::ops::DerefMut for StorageUnit<T> {
    fn deref_mut(&mut self) -> &mut BoundedStore<T> {
        &mut self.0
    }
}

impl<T> Device for StorageUnit<T> {
    type Event = StoreEvent;

    fn lifecycle(&self) -> &Lifecycle<StoreEvent> {
        self.0.lifecycle()
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle<StoreEvent> {
        self.0.lifecycle_mut()
    }
}

/// Customer-facing tray that collects returned and dispensed coins.
#[derive(Debug)]
pub struct Tray<T>(BoundedStore<T>);

impl<T> Tray<T> {
    /// Create an empty tray.
    pub fn new(id: DeviceId, capacity: usize) -> Result<Self, DeviceError> {
        BoundedStore::new(id, capacity).map(Self)
    }

    /// The customer takes every item out of the tray.
    pub fn collect(&mut self) -> Result<Vec<T>, DeviceError> {
        self.0.unload()
    }
}

impl<T> std::ops::Deref for Tray<T> {
    type Target = BoundedStore<T>;

    fn deref(&self) -> &BoundedStore<T> {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Tray<T> {
    fn deref_mut(&mut self) -> &mut BoundedStore<T> {
        &mut self.0
    }
}

impl<T> Device for Tray<T> {
    type Event = StoreEvent;

    fn lifecycle(&self) -> &Lifecycle<StoreEvent> {
        self.0.lifecycle()
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle<StoreEvent> {
        self.0.lifecycle_mut()
    }
}

/// Delivery path into a store.
///
/// Also serves as a return path, since rejected coins fall into the tray.
#[derive(Debug)]
pub struct StorePort<'a, T>(pub &'a mut BoundedStore<T>);

impl<T> Sink<T> for StorePort<'_, T> {
    fn endpoint(&self) -> DeviceId {
        self.0.id()
    }

    fn has_space(&self) -> bool {
        self.0.has_space()
    }

    fn deliver(&mut self, item: T) -> Result<(), DeviceError> {
        self.0.accept(item)
    }
}

impl<T> Source<T> for StorePort<'_, T> {
    fn endpoint(&self) -> DeviceId {
        self.0.id()
    }

    fn eject(&mut self, item: T) -> Result<(), DeviceError> {
        self.0.accept(item)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::device::{Notification, Phase, shared};

    fn recording(store: &mut BoundedStore<u32>) -> Rc<RefCell<Vec<StoreEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        store
            .attach(shared(move |_: DeviceId, n: &Notification<StoreEvent>| {
                if let Notification::Device(event) = n {
                    sink.borrow_mut().push(event.clone());
                }
            }))
            .unwrap();
        log
    }

    fn ready(capacity: usize) -> BoundedStore<u32> {
        let mut store = BoundedStore::new(DeviceId::new(1), capacity).unwrap();
        store.end_configuration();
        store
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            BoundedStore::<u32>::new(DeviceId::new(1), 0),
            Err(DeviceError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn full_replaces_item_added() {
        let mut store = ready(3);
        let log = recording(&mut store);

        for item in 0..3 {
            store.accept(item).unwrap();
        }

        assert_eq!(
            *log.borrow(),
            vec![StoreEvent::ItemAdded, StoreEvent::ItemAdded, StoreEvent::Full]
        );
        assert!(!store.has_space());
    }

    #[test]
    fn accept_when_full_is_overload_without_mutation() {
        let mut store = ready(1);
        store.accept(1).unwrap();

        assert!(matches!(store.accept(2), Err(DeviceError::Overload { .. })));
        assert_eq!(store.items(), &[1]);
    }

    #[test]
    fn accept_gated_by_phase_and_enablement() {
        let mut store = BoundedStore::new(DeviceId::new(1), 2).unwrap();
        assert!(matches!(store.accept(1), Err(DeviceError::NotConfigured { .. })));

        store.end_configuration();
        store.disable().unwrap();
        assert!(matches!(store.accept(1), Err(DeviceError::Disabled { .. })));

        store.enable().unwrap();
        store.accept(1).unwrap();

        store.force_error();
        assert!(matches!(store.accept(1), Err(DeviceError::Unusable { .. })));
        assert!(matches!(store.unload(), Err(DeviceError::Unusable { .. })));
        assert!(matches!(store.count(), Err(DeviceError::Unusable { .. })));
    }

    #[test]
    fn load_is_all_or_nothing() {
        let mut store = BoundedStore::new(DeviceId::new(1), 3).unwrap();
        store.load(vec![1, 2]).unwrap();

        assert!(matches!(store.load(vec![3, 4]), Err(DeviceError::Overload { .. })));
        assert_eq!(store.count().unwrap(), 2);

        store.load(vec![3]).unwrap();
        assert!(!store.has_space());
    }

    #[test]
    fn unload_drains_in_order() {
        let mut store = ready(4);
        let log = recording(&mut store);
        store.load(vec![7, 8]).unwrap();
        store.accept(9).unwrap();

        assert_eq!(store.unload().unwrap(), vec![7, 8, 9]);
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.has_space());
        assert_eq!(store.unload().unwrap(), Vec::<u32>::new());

        assert_eq!(
            *log.borrow(),
            vec![
                StoreEvent::Loaded { count: 2 },
                StoreEvent::ItemAdded,
                StoreEvent::Unloaded { count: 3 },
                StoreEvent::Unloaded { count: 0 },
            ]
        );
    }

    #[test]
    fn tray_collect_in_configuration() {
        let mut tray = Tray::new(DeviceId::new(2), 2).unwrap();
        tray.load(vec![1u32]).unwrap();
        assert_eq!(tray.collect().unwrap(), vec![1]);
        assert_eq!(tray.phase(), Phase::Configuration);
    }

    #[test]
    fn port_delivers_into_store() {
        let mut unit = StorageUnit::new(DeviceId::new(3), 1).unwrap();
        unit.end_configuration();

        let mut port = StorePort(&mut unit);
        assert_eq!(Sink::endpoint(&port), DeviceId::new(3));
        assert!(port.has_space());
        port.deliver(5u32).unwrap();
        assert!(!port.has_space());
    }
}
