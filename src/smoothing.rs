//! Per-frame easing toward a moving target.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Rate used by the landing page scroll filter.
pub const DEFAULT_SMOOTHING: f32 = 0.04;

/// Exponential-decay filter: every step closes a fixed fraction of the gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoother {
    current: f32,
    target: f32,
    rate: f32,
}

impl Smoother {
    pub fn new(rate: f32) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            rate: rate.clamp(0.0, 1.0),
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jumps straight to `value`, e.g. when the tracked region is re-attached.
    pub fn reset(&mut self, value: f32) {
        self.current = value;
        self.target = value;
    }

    pub fn step(&mut self) -> f32 {
        self.current += (self.target - self.current) * self.rate;
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING)
    }
}

/// Shared flag telling a recurring task to stop.
///
/// Clones observe the same flag; once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A [`Smoother`] owned together with the token that ends it.
#[derive(Debug)]
pub struct SmoothingTask {
    smoother: Smoother,
    token: CancellationToken,
}

impl SmoothingTask {
    pub fn new(smoother: Smoother) -> Self {
        Self {
            smoother,
            token: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn set_target(&mut self, target: f32) {
        self.smoother.set_target(target);
    }

    pub fn current(&self) -> f32 {
        self.smoother.current()
    }

    /// Advances one frame. Returns `None` once the task was cancelled.
    pub fn tick(&mut self) -> Option<f32> {
        if self.token.is_cancelled() {
            return None;
        }
        Some(self.smoother.step())
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for SmoothingTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closes_fixed_fraction_per_step() {
        let mut smoother = Smoother::new(0.5);
        smoother.set_target(1.0);
        assert_eq!(smoother.step(), 0.5);
        assert_eq!(smoother.step(), 0.75);
    }

    #[test]
    fn converges_without_overshoot() {
        let mut smoother = Smoother::default();
        smoother.set_target(1.0);
        let mut previous = 0.0;
        for _ in 0..400 {
            let value = smoother.step();
            assert!(value >= previous && value <= 1.0);
            previous = value;
        }
        assert!((1.0 - smoother.current()) < 1e-6);
    }

    #[test]
    fn cancelled_task_stops_ticking() {
        let mut task = SmoothingTask::new(Smoother::new(0.5));
        let token = task.token();
        task.set_target(2.0);
        assert_eq!(task.tick(), Some(1.0));
        token.cancel();
        assert_eq!(task.tick(), None);
        assert_eq!(task.current(), 1.0);
    }

    #[test]
    fn dropping_task_cancels_its_token() {
        let task = SmoothingTask::new(Smoother::default());
        let token = task.token();
        assert!(!token.is_cancelled());
        drop(task);
        assert!(token.is_cancelled());
    }
}
