//! One-shot reveal triggers for the content sections.

use serde::{Deserialize, Serialize};

/// Fires the first time an observed value rises above a threshold, and never
/// again afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeTrigger {
    threshold: f32,
    fired: bool,
}

impl EdgeTrigger {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            fired: false,
        }
    }

    /// Returns `true` only for the observation that first crosses the threshold.
    pub fn observe(&mut self, value: f32) -> bool {
        if self.fired || value <= self.threshold {
            return false;
        }
        self.fired = true;
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// Vertical extent of an element relative to the viewport top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRect {
    pub top: f32,
    pub bottom: f32,
}

/// Monotonic visibility flag unlocked once the tracked element has scrolled
/// up past the viewport top and its bottom edge is above the middle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RevealGate {
    visible: bool,
}

impl RevealGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns `true` for the observation that opens the gate.
    pub fn observe(&mut self, rect: ViewportRect, viewport_height: f32) -> bool {
        if self.visible {
            return false;
        }
        if rect.top < 0.0 && rect.bottom < viewport_height / 2.0 {
            self.visible = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_fires_once_despite_oscillation() {
        let mut trigger = EdgeTrigger::new(0.8);
        let sequence = [0.1, 0.5, 0.79, 0.81, 0.7, 0.9, 0.3, 0.95, 1.0, 0.2, 0.85];
        let fired: Vec<f32> = sequence
            .iter()
            .copied()
            .filter(|value| trigger.observe(*value))
            .collect();
        assert_eq!(fired, vec![0.81]);
        assert!(trigger.has_fired());
    }

    #[test]
    fn trigger_ignores_threshold_itself() {
        let mut trigger = EdgeTrigger::new(0.8);
        assert!(!trigger.observe(0.8));
        assert!(trigger.observe(0.800_1));
    }

    #[test]
    fn gate_opens_past_half_viewport_and_stays_open() {
        let mut gate = RevealGate::new();
        let height = 800.0;
        assert!(!gate.observe(ViewportRect { top: 100.0, bottom: 900.0 }, height));
        assert!(!gate.observe(ViewportRect { top: -100.0, bottom: 700.0 }, height));
        assert!(gate.observe(ViewportRect { top: -500.0, bottom: 300.0 }, height));
        assert!(gate.is_visible());
        // Scrolling back up never hides the section again.
        assert!(!gate.observe(ViewportRect { top: 200.0, bottom: 1000.0 }, height));
        assert!(gate.is_visible());
    }
}
