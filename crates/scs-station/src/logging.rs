//! Device event logging.
//!
//! Attaches one observer per device that forwards every notification to
//! `tracing`. Lifecycle notifications go out at `debug`, device events at
//! `info`.

use std::fmt;

use scs_core::{
    Device, DeviceError, DeviceId, DeviceVisitor, Environment, Notification, Observer, Station,
    shared,
};

/// Observer that logs notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl<E: fmt::Debug> Observer<E> for LogObserver {
    fn notify(&mut self, source: DeviceId, notification: &Notification<E>) {
        match notification {
            Notification::Enabled => tracing::debug!(device = %source, "enabled"),
            Notification::Disabled => tracing::debug!(device = %source, "disabled"),
            Notification::Device(event) => tracing::info!(device = %source, ?event, "device event"),
        }
    }
}

struct Attacher;

impl DeviceVisitor for Attacher {
    fn visit<D>(&mut self, device: &mut D) -> Result<(), DeviceError>
    where
        D: Device,
        D::Event: fmt::Debug + 'static,
    {
        device.attach(shared(LogObserver))
    }
}

/// Log every notification of every device of `station`.
pub fn attach_logging<E: Environment>(station: &mut Station<E>) -> Result<(), DeviceError> {
    station.visit_devices(&mut Attacher)
}
