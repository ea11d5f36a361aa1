use std::sync::Arc;

use parking_lot::RwLock;

/// Widths below this use the compact layout (camera pulled back, single
/// column gallery by default).
pub const COMPACT_BREAKPOINT: u32 = 768;

/// Provides the current viewport size in CSS/logical pixels.
pub trait ViewportProvider: Send + Sync {
    fn viewport_size(&self) -> (u32, u32);

    fn aspect(&self) -> f32 {
        let (width, height) = self.viewport_size();
        if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }

    fn is_compact(&self) -> bool {
        self.viewport_size().0 < COMPACT_BREAKPOINT
    }
}

/// Viewport that always reports the same resolution.
#[derive(Debug, Clone, Copy)]
pub struct StaticViewport {
    pub width: u32,
    pub height: u32,
}

impl StaticViewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ViewportProvider for StaticViewport {
    fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Viewport updated from window or canvas resize events.
#[derive(Debug)]
pub struct Viewport {
    size: RwLock<(u32, u32)>,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: RwLock::new((width.max(1), height.max(1))),
        }
    }

    pub fn update(&self, width: u32, height: u32) {
        *self.size.write() = (width.max(1), height.max(1));
    }
}

impl ViewportProvider for Viewport {
    fn viewport_size(&self) -> (u32, u32) {
        *self.size.read()
    }
}

impl<T> ViewportProvider for Arc<T>
where
    T: ViewportProvider + ?Sized,
{
    fn viewport_size(&self) -> (u32, u32) {
        (**self).viewport_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_below_breakpoint() {
        assert!(StaticViewport::new(767, 900).is_compact());
        assert!(!StaticViewport::new(768, 900).is_compact());
    }

    #[test]
    fn updates_are_seen_through_shared_handles() {
        let viewport = Arc::new(Viewport::new(1280, 720));
        let shared: Arc<dyn ViewportProvider> = viewport.clone();
        viewport.update(400, 0);
        assert_eq!(shared.viewport_size(), (400, 1));
        assert!(shared.is_compact());
        assert_eq!(shared.aspect(), 400.0);
    }
}
