//! Station binary error types.

use std::fmt;

use scs_core::DeviceError;

/// Errors that can end a station session.
#[derive(Debug)]
pub enum StationError {
    /// Command-line configuration error
    Config(String),

    /// A device refused an operation the session could not recover from
    Device(DeviceError),

    /// The session could not reach its goal
    Session(String),
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Device(err) => write!(f, "device error: {err}"),
            Self::Session(msg) => write!(f, "session error: {msg}"),
        }
    }
}

impl std::error::Error for StationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Device(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DeviceError> for StationError {
    fn from(err: DeviceError) -> Self {
        Self::Device(err)
    }
}

impl StationError {
    /// Returns true if a device entered its error phase.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Device(err) if err.is_fatal())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use scs_core::DeviceId;

    use super::*;

    #[test]
    fn device_errors_keep_their_source() {
        let err = StationError::from(DeviceError::Empty { device: DeviceId::new(9) });
        assert_eq!(err.to_string(), "device error: device#9 is empty");
        assert!(err.source().is_some());
        assert!(!err.is_fatal());
    }

    #[test]
    fn fatal_is_detected() {
        let jam = DeviceError::Fatal { device: DeviceId::new(2), reason: "jam".into() };
        let err = StationError::from(jam);
        assert!(err.is_fatal());
        assert!(!StationError::Config("bad currency".into()).is_fatal());
    }
}
