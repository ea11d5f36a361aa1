//! Sources of normalized progress in `[0, 1]`.
//!
//! Animation math only ever sees a progress value; where it comes from
//! (page scroll, a clock, a scrubber) is a detail of the source.

use serde::{Deserialize, Serialize};

pub trait ProgressSource {
    /// Current progress, or `None` when the source has nothing to track.
    fn progress(&self) -> Option<f32>;
}

/// Scroll range over which a tracked element drives progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollRegion {
    pub start: f32,
    pub end: f32,
}

impl ScrollRegion {
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Region that starts when the element's top reaches the viewport top and
    /// ends when its bottom reaches the viewport bottom.
    pub fn for_element(element_top: f32, element_height: f32, viewport_height: f32) -> Self {
        Self {
            start: element_top,
            end: element_top + element_height - viewport_height,
        }
    }

    pub fn progress_at(&self, offset: f32) -> f32 {
        let span = self.end - self.start;
        if span <= f32::EPSILON {
            return if offset >= self.start { 1.0 } else { 0.0 };
        }
        clamp_progress((offset - self.start) / span)
    }
}

/// Clamps to `[0, 1]`, mapping NaN to 0.
pub fn clamp_progress(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Progress from the page scroll offset within an attached region.
#[derive(Debug, Clone, Default)]
pub struct ScrollProgress {
    region: Option<ScrollRegion>,
    offset: f32,
}

impl ScrollProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, region: ScrollRegion) {
        self.region = Some(region);
    }

    pub fn detach(&mut self) {
        self.region = None;
    }

    pub fn is_attached(&self) -> bool {
        self.region.is_some()
    }

    pub fn set_offset(&mut self, offset: f32) {
        self.offset = offset;
    }
}

impl ProgressSource for ScrollProgress {
    fn progress(&self) -> Option<f32> {
        self.region.map(|region| region.progress_at(self.offset))
    }
}

/// Progress from elapsed seconds over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeProgress {
    duration: f32,
    elapsed: f32,
    looping: bool,
}

impl TimeProgress {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(f32::EPSILON),
            elapsed: 0.0,
            looping: false,
        }
    }

    /// Restarts from zero every time the duration elapses.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn advance(&mut self, delta_seconds: f32) {
        self.elapsed += delta_seconds.max(0.0);
        if self.looping {
            self.elapsed %= self.duration;
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl ProgressSource for TimeProgress {
    fn progress(&self) -> Option<f32> {
        Some(clamp_progress(self.elapsed / self.duration))
    }
}

/// Progress set directly, e.g. by a scrubber control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualProgress(f32);

impl ManualProgress {
    pub fn set(&mut self, value: f32) {
        self.0 = clamp_progress(value);
    }
}

impl ProgressSource for ManualProgress {
    fn progress(&self) -> Option<f32> {
        Some(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_progress_is_clamped() {
        let region = ScrollRegion::new(100.0, 500.0);
        assert_eq!(region.progress_at(0.0), 0.0);
        assert_eq!(region.progress_at(300.0), 0.5);
        assert_eq!(region.progress_at(900.0), 1.0);
        assert_eq!(clamp_progress(f32::NAN), 0.0);
    }

    #[test]
    fn element_region_spans_sticky_scroll() {
        // 400vh tall section on an 800px viewport.
        let region = ScrollRegion::for_element(0.0, 3200.0, 800.0);
        assert_eq!(region.end, 2400.0);
        assert_eq!(region.progress_at(1200.0), 0.5);
    }

    #[test]
    fn degenerate_region_is_a_step() {
        let region = ScrollRegion::new(200.0, 200.0);
        assert_eq!(region.progress_at(199.0), 0.0);
        assert_eq!(region.progress_at(200.0), 1.0);
    }

    #[test]
    fn scroll_progress_requires_a_region() {
        let mut source = ScrollProgress::new();
        source.set_offset(250.0);
        assert_eq!(source.progress(), None);
        source.attach(ScrollRegion::new(0.0, 1000.0));
        assert_eq!(source.progress(), Some(0.25));
        source.detach();
        assert_eq!(source.progress(), None);
    }

    #[test]
    fn time_progress_loops_when_asked() {
        let mut once = TimeProgress::new(2.0);
        once.advance(3.0);
        assert_eq!(once.progress(), Some(1.0));

        let mut looped = TimeProgress::new(2.0).looping();
        looped.advance(3.0);
        assert_eq!(looped.progress(), Some(0.5));
    }

    #[test]
    fn manual_progress_clamps_input() {
        let mut scrubber = ManualProgress::default();
        scrubber.set(1.7);
        assert_eq!(scrubber.progress(), Some(1.0));
        scrubber.set(-0.2);
        assert_eq!(scrubber.progress(), Some(0.0));
    }
}
