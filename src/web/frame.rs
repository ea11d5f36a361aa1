use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use anyhow::Result;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Window;

use super::dom;

/// Longest frame step handed to callbacks, so a resumed tab does not jump.
const MAX_FRAME_SECONDS: f64 = 0.1;

/// A `requestAnimationFrame` loop. Dropping it cancels the pending frame and
/// releases the callback.
pub struct FrameLoop {
    shared: Rc<FrameShared>,
}

/// Pause/resume handle that does not keep the loop alive.
#[derive(Clone)]
pub struct FrameControl {
    shared: Weak<FrameShared>,
}

struct FrameShared {
    window: Window,
    pending: Cell<Option<i32>>,
    paused: Cell<bool>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameLoop {
    /// Starts calling `on_frame(delta_seconds)` once per animation frame.
    pub fn start(mut on_frame: impl FnMut(f32) + 'static) -> Result<Self> {
        let shared = Rc::new(FrameShared {
            window: dom::window()?,
            pending: Cell::new(None),
            paused: Cell::new(false),
            callback: RefCell::new(None),
        });

        let weak = Rc::downgrade(&shared);
        let mut last: Option<f64> = None;
        let callback = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            shared.pending.set(None);
            if shared.paused.get() {
                last = None;
                return;
            }
            let delta = last.map_or(0.0, |last| {
                ((timestamp - last) / 1000.0).clamp(0.0, MAX_FRAME_SECONDS)
            });
            last = Some(timestamp);
            on_frame(delta as f32);
            shared.request();
        });
        *shared.callback.borrow_mut() = Some(callback);
        shared.request();

        Ok(Self { shared })
    }

    pub fn control(&self) -> FrameControl {
        FrameControl {
            shared: Rc::downgrade(&self.shared),
        }
    }
}

impl FrameControl {
    pub fn pause(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.paused.set(true);
            shared.cancel();
        }
    }

    pub fn resume(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.paused.set(false);
            shared.request();
        }
    }
}

impl FrameShared {
    fn request(&self) {
        if self.pending.get().is_some() || self.paused.get() {
            return;
        }
        let callback = self.callback.borrow();
        let Some(callback) = callback.as_ref() else {
            return;
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(handle) => self.pending.set(Some(handle)),
            Err(err) => log::error!("requestAnimationFrame failed: {err:?}"),
        }
    }

    fn cancel(&self) {
        if let Some(handle) = self.pending.take() {
            if let Err(err) = self.window.cancel_animation_frame(handle) {
                log::warn!("cancelAnimationFrame failed: {err:?}");
            }
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.shared.cancel();
        self.shared.paused.set(true);
        // Releases the page state captured by the callback.
        self.shared.callback.borrow_mut().take();
    }
}
