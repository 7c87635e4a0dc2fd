//! Event recorder.
//!
//! Records every notification a station's devices announce as a flat
//! transcript. Two transcripts compare equal iff the same devices announced
//! the same notifications in the same order, which is what determinism
//! tests check.

use std::{cell::RefCell, fmt, rc::Rc};

use scs_core::{
    Device, DeviceError, DeviceId, DeviceVisitor, Environment, Notification, Observer,
    SharedObserver, Station,
};

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Device that announced it.
    pub device: DeviceId,
    /// `Debug` rendering of the notification.
    pub notification: String,
}

impl fmt::Display for RecordedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.device, self.notification)
    }
}

/// Shared transcript of recorded notifications.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

struct Tap {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl<E: fmt::Debug> Observer<E> for Tap {
    fn notify(&mut self, source: DeviceId, notification: &Notification<E>) {
        let notification = format!("{notification:?}");
        self.events.borrow_mut().push(RecordedEvent { device: source, notification });
    }
}

struct Attacher<'a>(&'a Recorder);

impl DeviceVisitor for Attacher<'_> {
    fn visit<D>(&mut self, device: &mut D) -> Result<(), DeviceError>
    where
        D: Device,
        D::Event: fmt::Debug + 'static,
    {
        self.0.attach(device)
    }
}

impl Recorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer handle feeding this recorder, for devices announcing `E`.
    pub fn observer<E: fmt::Debug + 'static>(&self) -> SharedObserver<E> {
        Rc::new(RefCell::new(Tap { events: Rc::clone(&self.events) }))
    }

    /// Attach to one device.
    pub fn attach<D>(&self, device: &mut D) -> Result<(), DeviceError>
    where
        D: Device,
        D::Event: fmt::Debug + 'static,
    {
        device.attach(self.observer())
    }

    /// Attach to every device of a station.
    pub fn attach_station<E: Environment>(
        &self,
        station: &mut Station<E>,
    ) -> Result<(), DeviceError> {
        station.visit_devices(&mut Attacher(self))
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}
