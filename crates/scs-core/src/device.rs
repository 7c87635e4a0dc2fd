//! Device lifecycle and observer registry.
//!
//! Every device composes a [`Lifecycle`], which owns the phase state machine,
//! the disabled flag and the ordered list of observers.
//!
//! # Phases
//!
//! ```text
//!  CONFIGURATION ──end_configuration()──► NORMAL
//!        │                                  │
//!        └──────── force_error() / fatal ───┴──► ERROR (terminal)
//! ```
//!
//! # Invariants
//!
//! - ERROR is terminal: nothing leaves it
//! - CONFIGURATION → NORMAL happens at most once
//! - Observers are notified synchronously, in attachment order
//! - Observers cannot be attached or detached in ERROR

use std::{cell::RefCell, fmt, rc::Rc};

use crate::error::DeviceError;

/// Identifier of a device, handed to observers as the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Create a device identifier.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// Operation phase of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Being configured: wiring and observers may change, physical
    /// operations are refused.
    Configuration,
    /// Normal operation.
    Normal,
    /// Fatal error requiring physical repair. Terminal.
    Error,
}

/// Notification delivered to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<E> {
    /// The device was enabled.
    Enabled,
    /// The device was disabled.
    Disabled,
    /// A device-specific event.
    Device(E),
}

/// Receives notifications from devices whose event type is `E`.
pub trait Observer<E> {
    /// Called synchronously, in attachment order, for every notification.
    fn notify(&mut self, source: DeviceId, notification: &Notification<E>);
}

impl<E, F> Observer<E> for F
where
    F: FnMut(DeviceId, &Notification<E>),
{
    fn notify(&mut self, source: DeviceId, notification: &Notification<E>) {
        self(source, notification);
    }
}

/// Shared handle to an observer.
///
/// The same handle may be attached several times; `detach` compares handles
/// by address.
pub type SharedObserver<E> = Rc<RefCell<dyn Observer<E>>>;

/// Wrap an observer into a [`SharedObserver`].
pub fn shared<E, O>(observer: O) -> SharedObserver<E>
where
    O: Observer<E> + 'static,
{
    Rc::new(RefCell::new(observer))
}

/// Phase state machine plus observer registry.
pub struct Lifecycle<E> {
    id: DeviceId,
    phase: Phase,
    disabled: bool,
    observers: Vec<SharedObserver<E>>,
}

impl<E> Lifecycle<E> {
    /// Create a lifecycle in the configuration phase.
    pub fn new(id: DeviceId) -> Self {
        Self { id, phase: Phase::Configuration, disabled: false, observers: Vec::new() }
    }

    /// Device identifier.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Leave the configuration phase.
    ///
    /// Has no effect in NORMAL (repeated calls) or ERROR (terminal).
    pub fn end_configuration(&mut self) {
        if self.phase == Phase::Configuration {
            self.phase = Phase::Normal;
            tracing::debug!(device = %self.id, "configuration ended");
        }
    }

    /// Force the device into the error phase. Testing hook.
    pub fn force_error(&mut self) {
        self.phase = Phase::Error;
        tracing::debug!(device = %self.id, "error phase forced");
    }

    /// Move to the error phase because of an internal inconsistency.
    ///
    /// Returns the fatal error to propagate.
    pub fn fail(&mut self, reason: impl Into<String>) -> DeviceError {
        let reason = reason.into();
        self.phase = Phase::Error;
        tracing::error!(device = %self.id, "entering error phase: {}", reason);
        DeviceError::Fatal { device: self.id, reason }
    }

    /// Fails unless the device is in the configuration phase.
    pub fn require_configuration(&self) -> Result<(), DeviceError> {
        match self.phase {
            Phase::Configuration => Ok(()),
            Phase::Normal => Err(DeviceError::ConfigurationClosed { device: self.id }),
            Phase::Error => Err(DeviceError::Unusable { device: self.id }),
        }
    }

    /// Fails unless the device is in normal operation.
    pub fn require_normal(&self) -> Result<(), DeviceError> {
        match self.phase {
            Phase::Normal => Ok(()),
            Phase::Configuration => Err(DeviceError::NotConfigured { device: self.id }),
            Phase::Error => Err(DeviceError::Unusable { device: self.id }),
        }
    }

    /// Fails if the device is in the error phase.
    pub fn require_usable(&self) -> Result<(), DeviceError> {
        match self.phase {
            Phase::Error => Err(DeviceError::Unusable { device: self.id }),
            Phase::Configuration | Phase::Normal => Ok(()),
        }
    }

    /// Fails unless the device is in normal operation and enabled.
    pub fn require_enabled(&self) -> Result<(), DeviceError> {
        self.require_normal()?;
        if self.disabled {
            return Err(DeviceError::Disabled { device: self.id });
        }
        Ok(())
    }

    /// Enable the device and notify observers.
    pub fn enable(&mut self) -> Result<(), DeviceError> {
        self.require_normal()?;
        self.disabled = false;
        self.broadcast(&Notification::Enabled);
        Ok(())
    }

    /// Disable the device and notify observers.
    pub fn disable(&mut self) -> Result<(), DeviceError> {
        self.require_normal()?;
        self.disabled = true;
        self.broadcast(&Notification::Disabled);
        Ok(())
    }

    /// Whether the device is disabled. Only meaningful in normal operation.
    pub fn is_disabled(&self) -> Result<bool, DeviceError> {
        self.require_normal()?;
        Ok(self.disabled)
    }

    /// Register an observer. Duplicates are allowed.
    pub fn attach(&mut self, observer: SharedObserver<E>) -> Result<(), DeviceError> {
        self.require_usable()?;
        self.observers.push(observer);
        Ok(())
    }

    /// Remove the first registration of `observer`.
    ///
    /// Returns whether a registration was found.
    pub fn detach(&mut self, observer: &SharedObserver<E>) -> Result<bool, DeviceError> {
        self.require_usable()?;
        let position =
            self.observers.iter().position(|o| std::ptr::addr_eq(o.as_ptr(), observer.as_ptr()));
        Ok(position.map(|i| self.observers.remove(i)).is_some())
    }

    /// Remove every observer.
    pub fn detach_all(&mut self) -> Result<(), DeviceError> {
        self.require_usable()?;
        self.observers.clear();
        Ok(())
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Announce a device event to every observer.
    pub fn notify(&self, event: E) {
        self.broadcast(&Notification::Device(event));
    }

    fn broadcast(&self, notification: &Notification<E>) {
        for observer in &self.observers {
            observer.borrow_mut().notify(self.id, notification);
        }
    }
}

impl<E> fmt::Debug for Lifecycle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("disabled", &self.disabled)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Base capability shared by every simulated device.
///
/// Implementors only provide access to their [`Lifecycle`]; the lifecycle
/// operations are provided.
pub trait Device {
    /// Device-specific event type announced to observers.
    type Event;

    /// The device's lifecycle.
    fn lifecycle(&self) -> &Lifecycle<Self::Event>;

    /// The device's lifecycle, mutably.
    fn lifecycle_mut(&mut self) -> &mut Lifecycle<Self::Event>;

    /// Device identifier.
    fn id(&self) -> DeviceId {
        self.lifecycle().id()
    }

    /// Current phase.
    fn phase(&self) -> Phase {
        self.lifecycle().phase()
    }

    /// Leave the configuration phase.
    fn end_configuration(&mut self) {
        self.lifecycle_mut().end_configuration();
    }

    /// Force the error phase. Testing hook.
    fn force_error(&mut self) {
        self.lifecycle_mut().force_error();
    }

    /// Enable the device.
    fn enable(&mut self) -> Result<(), DeviceError> {
        self.lifecycle_mut().enable()
    }

    /// Disable the device.
    fn disable(&mut self) -> Result<(), DeviceError> {
        self.lifecycle_mut().disable()
    }

    /// Whether the device is disabled.
    fn is_disabled(&self) -> Result<bool, DeviceError> {
        self.lifecycle().is_disabled()
    }

    /// Register an observer.
    fn attach(&mut self, observer: SharedObserver<Self::Event>) -> Result<(), DeviceError> {
        self.lifecycle_mut().attach(observer)
    }

    /// Remove the first registration of an observer.
    fn detach(&mut self, observer: &SharedObserver<Self::Event>) -> Result<bool, DeviceError> {
        self.lifecycle_mut().detach(observer)
    }

    /// Remove every observer.
    fn detach_all(&mut self) -> Result<(), DeviceError> {
        self.lifecycle_mut().detach_all()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<(DeviceId, Notification<u8>)>>>;

    fn logging_observer(log: &Log) -> SharedObserver<u8> {
        let log = Rc::clone(log);
        shared(move |source: DeviceId, n: &Notification<u8>| {
            log.borrow_mut().push((source, n.clone()));
        })
    }

    #[test]
    fn starts_in_configuration() {
        let lifecycle = Lifecycle::<u8>::new(DeviceId::new(1));
        assert_eq!(lifecycle.phase(), Phase::Configuration);
        assert!(matches!(lifecycle.is_disabled(), Err(DeviceError::NotConfigured { .. })));
    }

    #[test]
    fn end_configuration_is_one_way() {
        let mut lifecycle = Lifecycle::<u8>::new(DeviceId::new(1));
        lifecycle.end_configuration();
        lifecycle.end_configuration();
        assert_eq!(lifecycle.phase(), Phase::Normal);

        lifecycle.force_error();
        lifecycle.end_configuration();
        assert_eq!(lifecycle.phase(), Phase::Error);
    }

    #[test]
    fn enable_disable_notify_in_order() {
        let log: Log = Rc::default();
        let mut lifecycle = Lifecycle::new(DeviceId::new(4));
        lifecycle.attach(logging_observer(&log)).unwrap();
        lifecycle.end_configuration();

        lifecycle.disable().unwrap();
        assert!(lifecycle.is_disabled().unwrap());
        lifecycle.enable().unwrap();
        assert!(!lifecycle.is_disabled().unwrap());

        let log = log.borrow();
        assert_eq!(
            *log,
            vec![
                (DeviceId::new(4), Notification::Disabled),
                (DeviceId::new(4), Notification::Enabled),
            ]
        );
    }

    #[test]
    fn enable_rejected_during_configuration() {
        let mut lifecycle = Lifecycle::<u8>::new(DeviceId::new(1));
        assert!(matches!(lifecycle.enable(), Err(DeviceError::NotConfigured { .. })));
        assert!(matches!(lifecycle.disable(), Err(DeviceError::NotConfigured { .. })));
    }

    #[test]
    fn observers_rejected_in_error_phase() {
        let log: Log = Rc::default();
        let mut lifecycle = Lifecycle::new(DeviceId::new(1));
        lifecycle.force_error();

        assert!(matches!(
            lifecycle.attach(logging_observer(&log)),
            Err(DeviceError::Unusable { .. })
        ));
        assert!(matches!(lifecycle.detach_all(), Err(DeviceError::Unusable { .. })));
    }

    #[test]
    fn duplicate_attach_notifies_twice_and_detach_removes_one() {
        let log: Log = Rc::default();
        let observer = logging_observer(&log);
        let mut lifecycle = Lifecycle::new(DeviceId::new(2));
        lifecycle.attach(Rc::clone(&observer)).unwrap();
        lifecycle.attach(Rc::clone(&observer)).unwrap();
        lifecycle.end_configuration();

        lifecycle.notify(9);
        assert_eq!(log.borrow().len(), 2);

        assert!(lifecycle.detach(&observer).unwrap());
        lifecycle.notify(9);
        assert_eq!(log.borrow().len(), 3);

        assert!(lifecycle.detach(&observer).unwrap());
        assert!(!lifecycle.detach(&observer).unwrap());
        assert_eq!(lifecycle.observer_count(), 0);
    }

    #[test]
    fn fail_enters_error_phase() {
        let mut lifecycle = Lifecycle::<u8>::new(DeviceId::new(5));
        lifecycle.end_configuration();

        let err = lifecycle.fail("channel overflow");
        assert!(err.is_fatal());
        assert_eq!(lifecycle.phase(), Phase::Error);
        assert!(matches!(lifecycle.require_normal(), Err(DeviceError::Unusable { .. })));
    }

    #[test]
    fn require_configuration_after_seal() {
        let mut lifecycle = Lifecycle::<u8>::new(DeviceId::new(1));
        assert!(lifecycle.require_configuration().is_ok());
        lifecycle.end_configuration();
        assert!(matches!(
            lifecycle.require_configuration(),
            Err(DeviceError::ConfigurationClosed { .. })
        ));
    }
}
