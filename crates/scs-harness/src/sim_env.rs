//! Seeded simulation environment.

use std::{cell::RefCell, fmt, rc::Rc};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scs_core::Environment;

/// Deterministic environment backed by a seeded ChaCha generator.
///
/// Clones share the generator, so the draws a station's devices make are
/// consumed from one stream in call order. Two stations built from
/// environments with the same seed and driven through the same operations
/// announce the same events.
#[derive(Clone)]
pub struct SimEnv {
    seed: u64,
    rng: Rc<RefCell<ChaCha8Rng>>,
}

impl SimEnv {
    /// Create an environment with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, rng: Rc::new(RefCell::new(ChaCha8Rng::seed_from_u64(seed))) }
    }

    /// Seed the environment was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimEnv").field("seed", &self.seed).finish_non_exhaustive()
    }
}

impl Environment for SimEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.borrow_mut().fill_bytes(buffer);
    }
}
