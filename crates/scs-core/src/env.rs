//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples device logic from the source of
//! randomness used for fault injection (validator false rejections, card
//! read failures). This enables:
//!
//! - Deterministic Simulation: a seeded generator reproduces the exact same
//!   sequence of faults, so a failing session can be replayed.
//!
//! - Forced Outcomes: a scripted environment pins every draw to "pass" or
//!   "fail" so tests can exercise a single branch.
//!
//! - Production Runtime: an OS-entropy implementation without any change to
//!   the device logic.
//!
//! # Invariants
//!
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: Implementations must not share global state

/// Abstract source of randomness for fault injection.
///
/// Devices hold a clone of the environment. Clones are expected to share the
/// underlying stream so that the order of draws across devices is the order
/// of calls.
pub trait Environment: Clone + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Determinism during simulations: Given the same RNG seed, this produces
    ///   the same sequence of bytes
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Generates a uniformly distributed `f64` in `[0, 1)`.
    ///
    /// Uses the top 53 bits of a `u64` draw, which is exactly the precision of
    /// an `f64` mantissa.
    #[allow(clippy::cast_precision_loss)]
    fn random_unit(&self) -> f64 {
        (self.random_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generates a random integer in `[0, bound)`.
    ///
    /// Returns 0 when `bound` is 0. The modulo bias is below 2^-57 for the
    /// small bounds used by the devices.
    fn random_below(&self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.random_u64() % bound
    }
}
