//! Scripted environment for forcing fault-injection outcomes.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use scs_core::Environment;

/// Environment that replays a fixed list of `u64` draws, then repeats a
/// fallback forever.
///
/// A draw of `u64::MAX` passes every fault check (no false rejection, no
/// read failure); a draw of `0` fails every one.
#[derive(Debug, Clone)]
pub struct ScriptedEnv {
    draws: Rc<RefCell<VecDeque<u64>>>,
    fallback: u64,
}

impl ScriptedEnv {
    /// Draw that passes every fault check.
    pub const PASS: u64 = u64::MAX;

    /// Draw that fails every fault check.
    pub const FAIL: u64 = 0;

    /// Every draw passes.
    pub fn lucky() -> Self {
        Self::repeating(Self::PASS)
    }

    /// Every draw fails.
    pub fn unlucky() -> Self {
        Self::repeating(Self::FAIL)
    }

    /// Every draw is `draw`.
    pub fn repeating(draw: u64) -> Self {
        Self::with_draws([], draw)
    }

    /// Replay `draws` in order, then `fallback` forever.
    pub fn with_draws(draws: impl IntoIterator<Item = u64>, fallback: u64) -> Self {
        Self { draws: Rc::new(RefCell::new(draws.into_iter().collect())), fallback }
    }

    /// Queue more draws behind the ones not yet consumed.
    pub fn push(&self, draw: u64) {
        self.draws.borrow_mut().push_back(draw);
    }

    /// Number of scripted draws not yet consumed.
    pub fn remaining(&self) -> usize {
        self.draws.borrow().len()
    }

    fn next_draw(&self) -> u64 {
        self.draws.borrow_mut().pop_front().unwrap_or(self.fallback)
    }
}

impl Environment for ScriptedEnv {
    /// Each 8-byte chunk of the buffer consumes one draw, big-endian.
    fn random_bytes(&self, buffer: &mut [u8]) {
        for chunk in buffer.chunks_mut(8) {
            let bytes = self.next_draw().to_be_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_then_falls_back() {
        let env = ScriptedEnv::with_draws([3, 4], 9);
        assert_eq!(env.random_u64(), 3);
        assert_eq!(env.random_u64(), 4);
        assert_eq!(env.random_u64(), 9);
        assert_eq!(env.random_u64(), 9);
    }

    #[test]
    fn lucky_and_unlucky_extremes() {
        assert!(ScriptedEnv::lucky().random_unit() > 0.999);
        assert!(ScriptedEnv::unlucky().random_unit() < f64::EPSILON);
        assert!(ScriptedEnv::lucky().random_below(100) >= 1);
        assert_eq!(ScriptedEnv::unlucky().random_below(100), 0);
    }

    #[test]
    fn clones_share_the_script() {
        let env = ScriptedEnv::with_draws([1, 2], 0);
        let clone = env.clone();
        assert_eq!(clone.random_u64(), 1);
        assert_eq!(env.remaining(), 1);
        env.push(5);
        assert_eq!(env.random_u64(), 2);
        assert_eq!(clone.random_u64(), 5);
    }
}
