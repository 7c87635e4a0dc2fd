//! FIFO dispensers for coins and banknotes.
//!
//! A dispenser is stocked directly (`load`/`unload`) or one item at a time
//! through an inbound channel (`accept`, so validated cash can be recycled
//! as change), and releases one item at a time through its single outbound
//! channel (`emit`).
//!
//! # Invariants
//!
//! - `size() <= capacity()`
//! - Items leave in load order
//! - An item whose delivery fails is back at the head of the queue

use std::collections::VecDeque;

use crate::{
    channel::{Sink, Wire},
    device::{Device, DeviceId, Lifecycle},
    error::DeviceError,
};

/// Events announced by dispensers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispenserEvent<T> {
    /// An item arrived through the inbound channel.
    Added(T),
    /// The dispenser reached capacity. Follows `Added`.
    Full,
    /// An item was emitted and stock remains.
    Removed(T),
    /// The last item was emitted.
    Empty,
    /// A batch was loaded.
    Loaded(Vec<T>),
    /// The dispenser was emptied; payload is everything removed.
    Unloaded(Vec<T>),
}

/// Bounded FIFO dispenser.
#[derive(Debug)]
pub struct Dispenser<T> {
    lifecycle: Lifecycle<DispenserEvent<T>>,
    capacity: usize,
    queue: VecDeque<T>,
    sink: Wire,
}

impl<T: Clone> Dispenser<T> {
    /// Create an empty dispenser. Capacity must be positive.
    pub fn new(id: DeviceId, capacity: usize) -> Result<Self, DeviceError> {
        if capacity == 0 {
            return Err(DeviceError::invalid("dispenser capacity must be positive"));
        }
        Ok(Self {
            lifecycle: Lifecycle::new(id),
            capacity,
            queue: VecDeque::with_capacity(capacity),
            sink: Wire::unbound("sink"),
        })
    }

    /// Bind the outbound channel. Configuration phase only.
    pub fn connect(&mut self, sink: DeviceId) -> Result<(), DeviceError> {
        self.lifecycle.require_configuration()?;
        self.sink.bind(sink);
        Ok(())
    }

    /// Maximum stock.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current stock.
    pub fn size(&self) -> usize {
        self.queue.len()
    }

    /// Items in emission order.
    pub fn stock(&self) -> impl Iterator<Item = &T> {
        self.queue.iter()
    }

    /// Whether another item fits. Normal phase only.
    pub fn has_space(&self) -> Result<bool, DeviceError> {
        self.lifecycle.require_normal()?;
        Ok(self.queue.len() < self.capacity)
    }

    /// Take one item from an inbound channel onto the back of the queue.
    ///
    /// Announces `Added`, then `Full` when the item used the last place.
    /// Fails with overload, leaving the stock untouched, when already full.
    pub fn accept(&mut self, item: T) -> Result<(), DeviceError> {
        self.lifecycle.require_enabled()?;

        if self.queue.len() >= self.capacity {
            return Err(DeviceError::Overload {
                device: self.lifecycle.id(),
                reason: format!("dispenser holds its capacity of {}", self.capacity),
            });
        }

        self.queue.push_back(item.clone());
        self.lifecycle.notify(DispenserEvent::Added(item));
        if self.queue.len() >= self.capacity {
            self.lifecycle.notify(DispenserEvent::Full);
        }
        Ok(())
    }

    /// Add a batch to the back of the queue. All or nothing.
    pub fn load(&mut self, items: Vec<T>) -> Result<(), DeviceError> {
        self.lifecycle.require_usable()?;

        if self.queue.len() + items.len() > self.capacity {
            return Err(DeviceError::Overload {
                device: self.lifecycle.id(),
                reason: format!(
                    "load of {} exceeds remaining capacity {}",
                    items.len(),
                    self.capacity - self.queue.len()
                ),
            });
        }

        self.queue.extend(items.iter().cloned());
        self.lifecycle.notify(DispenserEvent::Loaded(items));
        Ok(())
    }

    /// Remove and return all stock.
    pub fn unload(&mut self) -> Result<Vec<T>, DeviceError> {
        self.lifecycle.require_usable()?;

        let items: Vec<T> = self.queue.drain(..).collect();
        self.lifecycle.notify(DispenserEvent::Unloaded(items.clone()));
        Ok(items)
    }

    /// Release the head item into the outbound channel.
    ///
    /// A full channel is a wiring inconsistency: the dispenser enters its
    /// error phase and the item stays at the head of the queue.
    pub fn emit(&mut self, sink: &mut impl Sink<T>) -> Result<(), DeviceError> {
        self.lifecycle.require_enabled()?;
        self.sink.check(self.lifecycle.id(), sink.endpoint())?;

        let Some(item) = self.queue.pop_front() else {
            return Err(DeviceError::Empty { device: self.lifecycle.id() });
        };

        if !sink.has_space() {
            self.queue.push_front(item);
            let reason = format!("outbound channel to {} is full", sink.endpoint());
            return Err(self.lifecycle.fail(reason));
        }

        match sink.deliver(item.clone()) {
            Ok(()) => {},
            Err(DeviceError::Overload { reason, .. }) => {
                self.queue.push_front(item);
                return Err(self.lifecycle.fail(format!("outbound channel overflowed: {reason}")));
            },
            Err(e) => {
                self.queue.push_front(item);
                return Err(e);
            },
        }

        let remaining = self.queue.len();
        tracing::debug!(device = %self.lifecycle.id(), remaining, "item emitted");
        if self.queue.is_empty() {
            self.lifecycle.notify(DispenserEvent::Empty);
        } else {
            self.lifecycle.notify(DispenserEvent::Removed(item));
        }
        Ok(())
    }
}

impl<T> Device for Dispenser<T> {
    type Event = DispenserEvent<T>;

    fn lifecycle(&self) -> &Lifecycle<DispenserEvent<T>> {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle<DispenserEvent<T>> {
        &mut self.lifecycle
    }
}

/// Delivery path into a dispenser.
#[derive(Debug)]
pub struct DispenserPort<'a, T>(pub &'a mut Dispenser<T>);

impl<T: Clone> Sink<T> for DispenserPort<'_, T> {
    fn endpoint(&self) -> DeviceId {
        self.0.id()
    }

    fn has_space(&self) -> bool {
        self.0.has_space().unwrap_or(false)
    }

    fn deliver(&mut self, item: T) -> Result<(), DeviceError> {
        self.0.accept(item)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use proptest::prelude::*;

    use super::*;
    use crate::device::{Notification, Phase, shared};

    const OUT: DeviceId = DeviceId::new(50);

    #[derive(Default)]
    struct Bin {
        items: Vec<u32>,
        capacity: usize,
        lie_about_space: bool,
    }

    impl Sink<u32> for Bin {
        fn endpoint(&self) -> DeviceId {
            OUT
        }

        fn has_space(&self) -> bool {
            self.lie_about_space || self.items.len() < self.capacity
        }

        fn deliver(&mut self, item: u32) -> Result<(), DeviceError> {
            if self.items.len() >= self.capacity {
                return Err(DeviceError::Overload { device: OUT, reason: "bin full".into() });
            }
            self.items.push(item);
            Ok(())
        }
    }

    fn bin(capacity: usize) -> Bin {
        Bin { capacity, ..Bin::default() }
    }

    fn ready(capacity: usize) -> Dispenser<u32> {
        let mut dispenser = Dispenser::new(DeviceId::new(1), capacity).unwrap();
        dispenser.connect(OUT).unwrap();
        dispenser.end_configuration();
        dispenser
    }

    #[test]
    fn emit_notifies_removed_then_empty() {
        let mut dispenser = ready(5);
        dispenser.load(vec![1, 2]).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        dispenser
            .attach(shared(move |_: DeviceId, n: &Notification<DispenserEvent<u32>>| {
                if let Notification::Device(e) = n {
                    sink.borrow_mut().push(e.clone());
                }
            }))
            .unwrap();

        let mut out = bin(10);
        dispenser.emit(&mut out).unwrap();
        dispenser.emit(&mut out).unwrap();
        assert!(matches!(dispenser.emit(&mut out), Err(DeviceError::Empty { .. })));

        assert_eq!(*log.borrow(), vec![DispenserEvent::Removed(1), DispenserEvent::Empty]);
        assert_eq!(out.items, vec![1, 2]);
    }

    #[test]
    fn full_channel_is_fatal_and_item_restored() {
        let mut dispenser = ready(3);
        dispenser.load(vec![4, 5]).unwrap();

        let err = dispenser.emit(&mut bin(0)).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(dispenser.phase(), Phase::Error);
        assert_eq!(dispenser.stock().copied().collect::<Vec<_>>(), vec![4, 5]);
    }

    #[test]
    fn overflow_after_positive_has_space_is_fatal() {
        let mut dispenser = ready(3);
        dispenser.load(vec![4]).unwrap();

        let mut liar = Bin { capacity: 0, lie_about_space: true, ..Bin::default() };
        assert!(dispenser.emit(&mut liar).unwrap_err().is_fatal());
        assert_eq!(dispenser.size(), 1);
    }

    #[test]
    fn emit_requires_binding() {
        let mut dispenser = Dispenser::new(DeviceId::new(1), 3).unwrap();
        dispenser.end_configuration();
        dispenser.load(vec![1]).unwrap();
        assert!(matches!(dispenser.emit(&mut bin(1)), Err(DeviceError::NotConnected { .. })));
        assert!(matches!(dispenser.connect(OUT), Err(DeviceError::ConfigurationClosed { .. })));
    }

    #[test]
    fn emit_gated_by_phase_and_enablement() {
        let mut dispenser = Dispenser::new(DeviceId::new(1), 3).unwrap();
        dispenser.connect(OUT).unwrap();
        dispenser.load(vec![1]).unwrap();
        assert!(matches!(dispenser.emit(&mut bin(1)), Err(DeviceError::NotConfigured { .. })));

        dispenser.end_configuration();
        dispenser.disable().unwrap();
        assert!(matches!(dispenser.emit(&mut bin(1)), Err(DeviceError::Disabled { .. })));
    }

    #[test]
    fn load_overflow_leaves_stock_untouched() {
        let mut dispenser = ready(2);
        dispenser.load(vec![1]).unwrap();
        assert!(matches!(dispenser.load(vec![2, 3]), Err(DeviceError::Overload { .. })));
        assert_eq!(dispenser.unload().unwrap(), vec![1]);
        assert_eq!(dispenser.size(), 0);
    }

    #[test]
    fn accept_announces_added_then_full() {
        let mut dispenser = ready(2);
        dispenser.load(vec![7]).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        dispenser
            .attach(shared(move |_: DeviceId, n: &Notification<DispenserEvent<u32>>| {
                if let Notification::Device(e) = n {
                    sink.borrow_mut().push(e.clone());
                }
            }))
            .unwrap();

        assert!(dispenser.has_space().unwrap());
        dispenser.accept(8).unwrap();
        assert!(!dispenser.has_space().unwrap());
        assert!(matches!(dispenser.accept(9), Err(DeviceError::Overload { .. })));

        assert_eq!(*log.borrow(), vec![DispenserEvent::Added(8), DispenserEvent::Full]);
        assert_eq!(dispenser.stock().copied().collect::<Vec<_>>(), vec![7, 8]);
        assert_eq!(dispenser.phase(), Phase::Normal);
    }

    #[test]
    fn accepted_items_emit_after_loaded_ones() {
        let mut dispenser = ready(4);
        dispenser.load(vec![1]).unwrap();
        DispenserPort(&mut dispenser).deliver(2).unwrap();

        let mut out = bin(4);
        dispenser.emit(&mut out).unwrap();
        dispenser.emit(&mut out).unwrap();
        assert_eq!(out.items, vec![1, 2]);
    }

    #[test]
    fn port_has_space_until_broken() {
        let mut dispenser = ready(4);
        assert!(Sink::<u32>::has_space(&DispenserPort(&mut dispenser)));

        dispenser.disable().unwrap();
        assert!(matches!(dispenser.accept(1), Err(DeviceError::Disabled { .. })));
        assert!(dispenser.has_space().unwrap());

        dispenser.force_error();
        assert!(!Sink::<u32>::has_space(&DispenserPort(&mut dispenser)));
    }

    #[test]
    fn operations_are_phase_violations_outside_normal() {
        let mut dispenser = Dispenser::<u32>::new(DeviceId::new(1), 3).unwrap();
        dispenser.connect(OUT).unwrap();
        for err in [
            dispenser.accept(1).unwrap_err(),
            dispenser.has_space().unwrap_err(),
            dispenser.emit(&mut bin(1)).unwrap_err(),
        ] {
            assert!(matches!(err, DeviceError::NotConfigured { .. }), "{err}");
        }

        let mut dispenser = ready(3);
        dispenser.load(vec![1]).unwrap();
        assert!(dispenser.emit(&mut bin(0)).unwrap_err().is_fatal());
        for err in [
            dispenser.load(vec![2]).unwrap_err(),
            dispenser.unload().unwrap_err(),
            dispenser.accept(3).unwrap_err(),
            dispenser.has_space().unwrap_err(),
            dispenser.emit(&mut bin(1)).unwrap_err(),
        ] {
            assert!(matches!(err, DeviceError::Unusable { .. }), "{err}");
            assert!(err.is_phase_violation());
        }
        assert_eq!(dispenser.size(), 1);
    }

    proptest! {
        #[test]
        fn emits_in_load_order(
            batches in prop::collection::vec(prop::collection::vec(any::<u32>(), 0..8), 0..6),
        ) {
            let mut dispenser = ready(64);
            let mut expected = Vec::new();
            for batch in batches {
                expected.extend(batch.iter().copied());
                dispenser.load(batch).unwrap();
            }

            let mut out = bin(64);
            while dispenser.size() > 0 {
                dispenser.emit(&mut out).unwrap();
            }
            prop_assert_eq!(out.items, expected);
        }
    }
}
