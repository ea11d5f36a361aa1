//! Pure functions from progress to the visual state of the sticky section.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::progress::clamp_progress;

/// Whether the foreground text sits on the light page or the black mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorMode {
    Normal,
    Inverted,
}

impl ColorMode {
    pub fn css_color(self) -> &'static str {
        match self {
            Self::Normal => "black",
            Self::Inverted => "white",
        }
    }
}

/// Segment boundaries for the scroll-linked animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollMapping {
    /// Progress at which the model has finished rotating.
    pub rotation_end: f32,
    /// Full turns completed by `rotation_end`.
    pub turns: f32,
    pub mask_start: f32,
    pub mask_end: f32,
    /// Mask scale above which text switches to the inverted color.
    pub invert_above: f32,
    /// Progress past which the next section is revealed.
    pub reveal_after: f32,
}

impl Default for ScrollMapping {
    fn default() -> Self {
        Self {
            rotation_end: 0.8,
            turns: 2.0,
            mask_start: 0.5,
            mask_end: 0.8,
            invert_above: 0.3,
            reveal_after: 0.8,
        }
    }
}

impl ScrollMapping {
    pub fn rotation(&self, progress: f32) -> f32 {
        let p = clamp_progress(progress).min(self.rotation_end);
        p / self.rotation_end * self.turns * TAU
    }

    pub fn mask_scale(&self, progress: f32) -> f32 {
        let p = clamp_progress(progress);
        if p <= self.mask_start {
            0.0
        } else if p >= self.mask_end {
            1.0
        } else {
            (p - self.mask_start) / (self.mask_end - self.mask_start)
        }
    }

    pub fn color_mode(&self, mask_scale: f32) -> ColorMode {
        if mask_scale > self.invert_above {
            ColorMode::Inverted
        } else {
            ColorMode::Normal
        }
    }

    pub fn phase(&self, progress: f32, text_offset: f32) -> ScrollPhase {
        let progress = clamp_progress(progress);
        let mask_scale = self.mask_scale(progress);
        ScrollPhase {
            progress,
            rotation_angle: self.rotation(progress),
            mask_scale,
            text_offset,
            color_mode: self.color_mode(mask_scale),
        }
    }
}

/// Derived per-frame state; recomputed on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollPhase {
    pub progress: f32,
    pub rotation_angle: f32,
    pub mask_scale: f32,
    pub text_offset: f32,
    pub color_mode: ColorMode,
}

/// Continuous leftward loop of the word band.
///
/// The band's content is duplicated, so shifting it by half its width looks
/// identical to the start and the loop is seamless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marquee {
    pub period_secs: f32,
}

impl Default for Marquee {
    fn default() -> Self {
        Self { period_secs: 24.0 }
    }
}

impl Marquee {
    /// Horizontal offset in `(-loop_width, 0]` after `elapsed_secs`.
    pub fn offset(&self, elapsed_secs: f32, loop_width: f32) -> f32 {
        if self.period_secs <= 0.0 || loop_width <= 0.0 {
            return 0.0;
        }
        let cycle = elapsed_secs.max(0.0).rem_euclid(self.period_secs) / self.period_secs;
        -cycle * loop_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn samples() -> impl Iterator<Item = f32> {
        (0..=1000).map(|i| i as f32 / 1000.0)
    }

    #[test]
    fn rotation_is_monotonic_and_saturates() {
        let mapping = ScrollMapping::default();
        assert_eq!(mapping.rotation(0.0), 0.0);
        let mut previous = 0.0;
        for p in samples() {
            let angle = mapping.rotation(p);
            assert!(angle + EPS >= previous, "rotation decreased at {p}");
            previous = angle;
        }
        let full = 2.0 * TAU;
        assert!((mapping.rotation(0.8) - full).abs() < EPS);
        assert!((mapping.rotation(0.93) - full).abs() < EPS);
        assert!((mapping.rotation(1.0) - full).abs() < EPS);
    }

    #[test]
    fn mask_scale_segments() {
        let mapping = ScrollMapping::default();
        assert_eq!(mapping.mask_scale(0.0), 0.0);
        assert_eq!(mapping.mask_scale(0.5), 0.0);
        assert!((mapping.mask_scale(0.65) - 0.5).abs() < EPS);
        assert_eq!(mapping.mask_scale(0.8), 1.0);
        assert_eq!(mapping.mask_scale(1.0), 1.0);
    }

    #[test]
    fn mask_scale_is_continuous_and_non_decreasing() {
        let mapping = ScrollMapping::default();
        let mut previous = 0.0;
        for p in samples() {
            let scale = mapping.mask_scale(p);
            assert!(scale >= previous - EPS);
            assert!(scale - previous < 0.01, "jump at {p}");
            previous = scale;
        }
    }

    #[test]
    fn color_inverts_past_threshold() {
        let mapping = ScrollMapping::default();
        assert_eq!(mapping.phase(0.55, 0.0).color_mode, ColorMode::Normal);
        assert_eq!(mapping.phase(0.58, 0.0).color_mode, ColorMode::Normal);
        assert_eq!(mapping.phase(0.6, 0.0).color_mode, ColorMode::Inverted);
        assert_eq!(ColorMode::Inverted.css_color(), "white");
    }

    #[test]
    fn phase_clamps_progress() {
        let phase = ScrollMapping::default().phase(1.4, -12.0);
        assert_eq!(phase.progress, 1.0);
        assert_eq!(phase.mask_scale, 1.0);
        assert_eq!(phase.text_offset, -12.0);
    }

    #[test]
    fn marquee_wraps_every_period() {
        let marquee = Marquee::default();
        assert_eq!(marquee.offset(0.0, 1000.0), 0.0);
        assert!((marquee.offset(6.0, 1000.0) + 250.0).abs() < 1e-3);
        assert!((marquee.offset(30.0, 1000.0) + 250.0).abs() < 1e-3);
        assert_eq!(marquee.offset(5.0, 0.0), 0.0);
    }
}
