//! Coin and banknote validators.
//!
//! A validator sits between a slot and a storage unit. Each inbound item is
//! classified against a fixed acceptance set, with a small injected chance
//! of rejecting a genuine item, and routed onward:
//!
//! ```text
//!              valid, sink has space
//!   source ──► validator ──────────────────► sink
//!     ▲            │
//!     └────────────┘ invalid, or valid with a full sink
//! ```
//!
//! A valid item is never lost: when the sink is full or refuses it, it goes
//! back to the source like an invalid one. An item that cannot go back puts
//! the validator in its error phase.

use crate::{
    channel::{Sink, Source, Wire},
    device::{Device, DeviceId, Lifecycle},
    env::Environment,
    error::DeviceError,
    item::{Cash, Currency},
};

/// Percentage of provisionally valid items rejected anyway.
pub const FALSE_REJECTION_PERCENT: u64 = 1;

/// Events announced by validators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorEvent {
    /// The item was classified valid.
    Valid {
        /// Currency of the item.
        currency: Currency,
        /// Face value of the item.
        value: u64,
    },
    /// The item was classified invalid.
    Invalid,
}

/// Where an item ended up after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Valid and forwarded to the sink.
    Accepted,
    /// Invalid and ejected to the source.
    Rejected,
    /// Valid but the sink was full, so it was ejected to the source.
    Returned,
}

/// Classifies money items of type `T` against one currency and a set of
/// denominations.
pub struct Validator<T, E> {
    lifecycle: Lifecycle<ValidatorEvent>,
    env: E,
    currency: Currency,
    denominations: Vec<u64>,
    source: Wire,
    sink: Wire,
    _item: std::marker::PhantomData<fn(T)>,
}

impl<T, E> Validator<T, E>
where
    T: Cash,
    E: Environment,
{
    /// Create a validator.
    ///
    /// The denominations are sorted; they must be non-empty, positive and
    /// free of duplicates.
    pub fn new(
        id: DeviceId,
        env: E,
        currency: Currency,
        mut denominations: Vec<u64>,
    ) -> Result<Self, DeviceError> {
        validate_denominations(&mut denominations)?;
        Ok(Self {
            lifecycle: Lifecycle::new(id),
            env,
            currency,
            denominations,
            source: Wire::unbound("source"),
            sink: Wire::unbound("sink"),
            _item: std::marker::PhantomData,
        })
    }

    /// Bind the return path and the onward path. Configuration phase only.
    pub fn connect(&mut self, source: DeviceId, sink: DeviceId) -> Result<(), DeviceError> {
        self.lifecycle.require_configuration()?;
        self.source.bind(source);
        self.sink.bind(sink);
        Ok(())
    }

    /// Accepted currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Accepted denominations, ascending.
    pub fn denominations(&self) -> &[u64] {
        &self.denominations
    }

    /// Validators accept unless broken.
    pub fn has_space(&self) -> bool {
        self.lifecycle.phase() != crate::device::Phase::Error
    }

    /// Classify `item` and route it to `sink` or back to `source`.
    pub fn accept(
        &mut self,
        item: T,
        source: &mut impl Source<T>,
        sink: &mut impl Sink<T>,
    ) -> Result<Verdict, DeviceError> {
        self.lifecycle.require_enabled()?;
        let id = self.lifecycle.id();
        self.source.check(id, source.endpoint())?;
        self.sink.check(id, sink.endpoint())?;

        if !self.is_valid(&item) {
            tracing::warn!(
                device = %id,
                currency = %item.currency(),
                value = item.value(),
                "invalid item"
            );
            self.lifecycle.notify(ValidatorEvent::Invalid);
            self.eject(item, source)?;
            return Ok(Verdict::Rejected);
        }

        let (currency, value) = (item.currency(), item.value());
        self.lifecycle.notify(ValidatorEvent::Valid { currency, value });

        if !sink.has_space() {
            tracing::debug!(device = %id, "sink full, returning valid item");
            self.eject(item, source)?;
            return Ok(Verdict::Returned);
        }

        // A refused delivery leaves the item with us; keep it for the return path.
        match sink.deliver(item.clone()) {
            Ok(()) => Ok(Verdict::Accepted),
            Err(DeviceError::Overload { reason, .. }) => {
                Err(self.lifecycle.fail(format!("sink overflowed after reporting space: {reason}")))
            },
            Err(e) => {
                tracing::warn!(device = %id, error = %e, "sink refused valid item, returning it");
                self.eject(item, source)?;
                Ok(Verdict::Returned)
            },
        }
    }

    fn is_valid(&self, item: &T) -> bool {
        item.currency() == self.currency
            && self.denominations.binary_search(&item.value()).is_ok()
            && self.env.random_below(100) >= FALSE_REJECTION_PERCENT
    }

    /// Hand `item` back to its origin. An item that cannot go back is
    /// stranded inside the validator, which breaks it.
    fn eject(&mut self, item: T, source: &mut impl Source<T>) -> Result<(), DeviceError> {
        source
            .eject(item)
            .map_err(|e| self.lifecycle.fail(format!("unable to eject item: {e}")))
    }
}

impl<T, E> Device for Validator<T, E> {
    type Event = ValidatorEvent;

    fn lifecycle(&self) -> &Lifecycle<ValidatorEvent> {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle<ValidatorEvent> {
        &mut self.lifecycle
    }
}

impl<T, E> std::fmt::Debug for Validator<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("lifecycle", &self.lifecycle)
            .field("currency", &self.currency)
            .field("denominations", &self.denominations)
            .field("source", &self.source)
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

/// Sort `denominations` and check they form a valid acceptance set.
pub fn validate_denominations(denominations: &mut [u64]) -> Result<(), DeviceError> {
    if denominations.is_empty() {
        return Err(DeviceError::invalid("there must be at least one denomination"));
    }
    denominations.sort_unstable();
    if denominations[0] == 0 {
        return Err(DeviceError::invalid("non-positive denomination: 0"));
    }
    if let Some(pair) = denominations.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(DeviceError::invalid(format!("denomination {} is repeated", pair[0])));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::{
        channel::Returned,
        device::Phase,
        devices::{Dispenser, DispenserPort},
        item::{Banknote, Coin},
    };

    /// Yields a fixed draw for every request.
    #[derive(Clone)]
    struct FixedDraw(Rc<Cell<u64>>);

    impl Environment for FixedDraw {
        fn random_bytes(&self, buffer: &mut [u8]) {
            let bytes = self.0.get().to_be_bytes();
            for (i, b) in buffer.iter_mut().enumerate() {
                *b = bytes[i % 8];
            }
        }
    }

    const SOURCE: DeviceId = DeviceId::new(10);
    const SINK: DeviceId = DeviceId::new(11);

    struct Bin {
        items: Vec<Banknote>,
        capacity: usize,
    }

    impl Sink<Banknote> for Bin {
        fn endpoint(&self) -> DeviceId {
            SINK
        }

        fn has_space(&self) -> bool {
            self.items.len() < self.capacity
        }

        fn deliver(&mut self, item: Banknote) -> Result<(), DeviceError> {
            self.items.push(item);
            Ok(())
        }
    }

    fn cad() -> Currency {
        Currency::new("CAD").unwrap()
    }

    fn note(value: u64) -> Banknote {
        Banknote::new(cad(), value).unwrap()
    }

    /// Refuses everything as disabled.
    struct Locked;

    impl Sink<Banknote> for Locked {
        fn endpoint(&self) -> DeviceId {
            SINK
        }

        fn has_space(&self) -> bool {
            true
        }

        fn deliver(&mut self, _item: Banknote) -> Result<(), DeviceError> {
            Err(DeviceError::Disabled { device: SINK })
        }
    }

    impl Source<Banknote> for Locked {
        fn endpoint(&self) -> DeviceId {
            SOURCE
        }

        fn eject(&mut self, _item: Banknote) -> Result<(), DeviceError> {
            Err(DeviceError::Disabled { device: SOURCE })
        }
    }

    fn unsealed(draw: u64) -> Validator<Banknote, FixedDraw> {
        let env = FixedDraw(Rc::new(Cell::new(draw)));
        let mut v = Validator::new(DeviceId::new(1), env, cad(), vec![20, 5, 10, 50]).unwrap();
        v.connect(SOURCE, SINK).unwrap();
        v
    }

    fn validator(draw: u64) -> Validator<Banknote, FixedDraw> {
        let mut v = unsealed(draw);
        v.end_configuration();
        v
    }

    #[test]
    fn construction_sorts_and_validates() {
        let env = FixedDraw(Rc::new(Cell::new(50)));
        let build = |denominations| {
            Validator::<Coin, _>::new(DeviceId::new(1), env.clone(), cad(), denominations)
        };
        assert_eq!(build(vec![25, 5, 10]).unwrap().denominations(), &[5, 10, 25]);

        assert!(build(vec![]).is_err());
        assert!(build(vec![0, 5]).is_err());
        assert!(build(vec![5, 10, 5]).is_err());
    }

    #[test]
    fn valid_item_goes_to_sink() {
        let mut v = validator(50);
        let mut source = Returned::new(SOURCE);
        let mut sink = Bin { items: vec![], capacity: 5 };

        assert_eq!(v.accept(note(10), &mut source, &mut sink).unwrap(), Verdict::Accepted);
        assert_eq!(sink.items, vec![note(10)]);
        assert!(!source.is_occupied());
    }

    #[test]
    fn false_rejection_on_low_draw() {
        // 0 % 100 == 0, below the rejection threshold
        let mut v = validator(0);
        let mut source = Returned::new(SOURCE);
        let mut sink = Bin { items: vec![], capacity: 5 };

        assert_eq!(v.accept(note(10), &mut source, &mut sink).unwrap(), Verdict::Rejected);
        assert_eq!(source.take(), Some(note(10)));
    }

    #[test]
    fn wrong_currency_or_value_rejected() {
        let mut v = validator(50);
        let mut sink = Bin { items: vec![], capacity: 5 };

        let mut source = Returned::new(SOURCE);
        let usd = Banknote::new(Currency::new("USD").unwrap(), 10).unwrap();
        assert_eq!(v.accept(usd, &mut source, &mut sink).unwrap(), Verdict::Rejected);

        let mut source = Returned::new(SOURCE);
        assert_eq!(v.accept(note(100), &mut source, &mut sink).unwrap(), Verdict::Rejected);
        assert!(sink.items.is_empty());
    }

    #[test]
    fn full_sink_returns_valid_item() {
        let mut v = validator(50);
        let mut source = Returned::new(SOURCE);
        let mut sink = Bin { items: vec![], capacity: 0 };

        assert_eq!(v.accept(note(5), &mut source, &mut sink).unwrap(), Verdict::Returned);
        assert_eq!(source.take(), Some(note(5)));
    }

    #[test]
    fn blocked_return_path_is_fatal() {
        let mut v = validator(0);
        let mut source = Returned::new(SOURCE);
        source.eject(note(50)).unwrap();
        let mut sink = Bin { items: vec![], capacity: 5 };

        assert!(v.accept(note(5), &mut source, &mut sink).unwrap_err().is_fatal());
        assert_eq!(v.phase(), Phase::Error);
        assert!(!v.has_space());
    }

    #[test]
    fn miswired_sink_refused() {
        let env = FixedDraw(Rc::new(Cell::new(50)));
        let mut v = Validator::new(DeviceId::new(1), env, cad(), vec![5]).unwrap();
        v.connect(SOURCE, DeviceId::new(99)).unwrap();
        v.end_configuration();

        let mut source = Returned::new(SOURCE);
        let mut sink = Bin { items: vec![], capacity: 5 };
        assert!(matches!(
            v.accept(note(5), &mut source, &mut sink),
            Err(DeviceError::Miswired { .. })
        ));
    }

    #[test]
    fn disabled_validator_refuses() {
        let mut v = validator(50);
        v.disable().unwrap();
        let mut source = Returned::new(SOURCE);
        let mut sink = Bin { items: vec![], capacity: 5 };
        assert!(matches!(
            v.accept(note(5), &mut source, &mut sink),
            Err(DeviceError::Disabled { .. })
        ));
    }

    #[test]
    fn refused_valid_item_goes_back_to_source() {
        let mut v = validator(50);
        let mut source = Returned::new(SOURCE);

        assert_eq!(v.accept(note(20), &mut source, &mut Locked).unwrap(), Verdict::Returned);
        assert_eq!(source.take(), Some(note(20)));
        assert_eq!(v.phase(), Phase::Normal);
    }

    #[test]
    fn refused_eject_breaks_validator() {
        // Invalid item, return path refuses it
        let mut v = validator(50);
        let mut sink = Bin { items: vec![], capacity: 5 };
        assert!(v.accept(note(100), &mut Locked, &mut sink).unwrap_err().is_fatal());
        assert_eq!(v.phase(), Phase::Error);

        // Valid item refused by both ends
        let mut v = validator(50);
        assert!(v.accept(note(10), &mut Locked, &mut Locked).unwrap_err().is_fatal());
        assert_eq!(v.phase(), Phase::Error);
    }

    #[test]
    fn valid_item_can_recycle_into_dispenser() {
        let mut dispenser = Dispenser::new(SINK, 2).unwrap();
        dispenser.end_configuration();
        let mut v = validator(50);
        let mut source = Returned::new(SOURCE);

        for _ in 0..2 {
            let verdict = v.accept(note(5), &mut source, &mut DispenserPort(&mut dispenser));
            assert_eq!(verdict.unwrap(), Verdict::Accepted);
        }
        let verdict = v.accept(note(5), &mut source, &mut DispenserPort(&mut dispenser));
        assert_eq!(verdict.unwrap(), Verdict::Returned);
        assert_eq!(dispenser.size(), 2);
        assert_eq!(source.take(), Some(note(5)));
    }

    #[test]
    fn accept_is_a_phase_violation_outside_normal() {
        let mut sink = Bin { items: vec![], capacity: 5 };

        let mut v = unsealed(50);
        let mut source = Returned::new(SOURCE);
        let err = v.accept(note(5), &mut source, &mut sink).unwrap_err();
        assert!(matches!(err, DeviceError::NotConfigured { .. }));
        assert!(err.is_phase_violation());

        let mut v = validator(50);
        v.force_error();
        let err = v.accept(note(5), &mut source, &mut sink).unwrap_err();
        assert!(matches!(err, DeviceError::Unusable { .. }));
        assert!(err.is_phase_violation());
        assert!(sink.items.is_empty() && !source.is_occupied());
    }
}
