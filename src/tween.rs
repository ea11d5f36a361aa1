//! Timed scroll animation used to glide from the hero to the content.

use serde::{Deserialize, Serialize};

use crate::progress::clamp_progress;

/// Quadratic ease-in-out.
pub fn ease_in_out_quad(t: f32) -> f32 {
    let t = clamp_progress(t);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Animates the page scroll offset from one position to another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollTween {
    from: f32,
    to: f32,
    delay: f32,
    duration: f32,
    elapsed: f32,
}

impl ScrollTween {
    /// Delay and duration used after the intro finishes.
    pub const AUTO_SCROLL_DELAY: f32 = 0.2;
    pub const AUTO_SCROLL_DURATION: f32 = 4.0;

    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            delay: 0.0,
            duration: duration.max(f32::EPSILON),
            elapsed: 0.0,
        }
    }

    /// Tween with the landing page's auto-scroll timing.
    pub fn auto_scroll(from: f32, to: f32) -> Self {
        Self::new(from, to, Self::AUTO_SCROLL_DURATION).with_delay(Self::AUTO_SCROLL_DELAY)
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Advances by `delta_seconds`; returns the offset to scroll to, or `None`
    /// while still waiting out the delay.
    pub fn advance(&mut self, delta_seconds: f32) -> Option<f32> {
        self.elapsed += delta_seconds.max(0.0);
        let active = self.elapsed - self.delay;
        if active < 0.0 {
            return None;
        }
        let eased = ease_in_out_quad(active / self.duration);
        Some(self.from + (self.to - self.from) * eased)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_is_symmetric_and_bounded() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(0.5), 0.5);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
        let a = ease_in_out_quad(0.25);
        let b = ease_in_out_quad(0.75);
        assert!((a + b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn waits_for_delay_then_lands_on_target() {
        let mut tween = ScrollTween::auto_scroll(0.0, 3000.0);
        assert_eq!(tween.advance(0.1), None);
        let first = tween.advance(0.2).unwrap_or_default();
        assert!(first > 0.0 && first < 100.0);
        let mut last = first;
        while !tween.is_finished() {
            last = tween.advance(0.1).unwrap_or(last);
        }
        assert!((last - 3000.0).abs() < 1e-3);
    }
}
