use std::cell::RefCell;
use std::rc::{Rc, Weak};

use anyhow::{Context, Result};
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, HtmlCanvasElement, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, ScrollBehavior, ScrollRestoration, ScrollToOptions,
    VisibilityState, Window,
};

use super::dom;
use super::frame::FrameLoop;
use super::showcase::ShowcaseCanvas;
use crate::content::MARQUEE_WORDS;
use crate::mapping::{Marquee, ScrollMapping, ScrollPhase};
use crate::progress::{ProgressSource, ScrollProgress, ScrollRegion};
use crate::reveal::{EdgeTrigger, RevealGate, ViewportRect};
use crate::smoothing::{Smoother, SmoothingTask};
use crate::timeline::{IntroSequencer, IntroView, SequenceStage};
use crate::tween::ScrollTween;

/// Handle returned to JavaScript for the landing page.
#[wasm_bindgen]
pub struct HomePage {
    inner: Option<HomeInner>,
}

#[wasm_bindgen]
impl HomePage {
    /// Cancels timers, listeners, the frame loop and any pending load.
    pub fn dispose(&mut self) {
        if self.inner.take().is_some() {
            log::info!("home page disposed");
        }
    }
}

impl HomePage {
    pub fn mount() -> Result<Self> {
        let window = dom::window()?;
        let document = dom::document()?;
        reset_scroll(&window);

        let elements = HomeElements::find(&document)?;
        build_marquee(&document, &elements.marquee_track)?;
        let showcase = match ShowcaseCanvas::mount(elements.canvas.clone()) {
            Ok(showcase) => Some(showcase),
            Err(err) => {
                log::error!("3D showcase disabled: {err:#}");
                None
            }
        };

        let sequencer = IntroSequencer::default();
        let deadlines: Vec<u32> = sequencer
            .schedule()
            .entries()
            .iter()
            .map(|entry| entry.at_ms)
            .collect();

        let state = Rc::new_cyclic(|this| {
            RefCell::new(HomeState {
                this: this.clone(),
                window: window.clone(),
                elements,
                sequencer,
                scroll: ScrollProgress::new(),
                smoothing: SmoothingTask::new(Smoother::default()),
                mapping: ScrollMapping::default(),
                marquee: Marquee::default(),
                marquee_elapsed: 0.0,
                next_trigger: EdgeTrigger::new(ScrollMapping::default().reveal_after),
                final_gate: RevealGate::new(),
                observer: None,
                tween: None,
                showcase,
            })
        });
        state.borrow().apply_view(SequenceStage::Closed);

        let timers = deadlines
            .into_iter()
            .map(|at_ms| {
                let weak = Rc::downgrade(&state);
                Timeout::new(at_ms, move || {
                    if let Some(state) = weak.upgrade() {
                        state.borrow_mut().advance_intro(at_ms);
                    }
                })
            })
            .collect();

        let frame = {
            let weak = Rc::downgrade(&state);
            FrameLoop::start(move |delta| {
                if let Some(state) = weak.upgrade() {
                    state.borrow_mut().frame(delta);
                }
            })?
        };

        let mut listeners = Vec::new();
        {
            let weak = Rc::downgrade(&state);
            listeners.push(EventListener::new(&window, "scroll", move |_| {
                if let Some(state) = weak.upgrade() {
                    state.borrow_mut().on_scroll();
                }
            }));
        }
        {
            let weak = Rc::downgrade(&state);
            listeners.push(EventListener::new(&window, "resize", move |_| {
                if let Some(state) = weak.upgrade() {
                    state.borrow_mut().track_scroll_region();
                }
            }));
        }
        {
            let control = frame.control();
            let visibility_document = document.clone();
            listeners.push(EventListener::new(&document, "visibilitychange", move |_| {
                if visibility_document.visibility_state() == VisibilityState::Hidden {
                    log::debug!("page hidden; pausing frame loop");
                    control.pause();
                } else {
                    control.resume();
                }
            }));
        }

        log::info!("home page mounted");
        Ok(Self {
            inner: Some(HomeInner {
                state,
                frame,
                timers,
                listeners,
            }),
        })
    }
}

/// Everything registered by the page. `drop` runs before any field is
/// released, so it cancels the frame loop and timers itself before tearing
/// the state down.
struct HomeInner {
    frame: FrameLoop,
    timers: Vec<Timeout>,
    listeners: Vec<EventListener>,
    state: Rc<RefCell<HomeState>>,
}

impl Drop for HomeInner {
    fn drop(&mut self) {
        self.frame.control().pause();
        self.timers.clear();
        self.listeners.clear();
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.teardown();
        }
    }
}

struct HomeElements {
    scroll_section: HtmlElement,
    bar_top: HtmlElement,
    bar_bottom: HtmlElement,
    intro_text: HtmlElement,
    intro_word: HtmlElement,
    canvas: HtmlCanvasElement,
    mask: HtmlElement,
    marquee: HtmlElement,
    marquee_track: HtmlElement,
    next_section: HtmlElement,
    final_section: HtmlElement,
}

impl HomeElements {
    fn find(document: &Document) -> Result<Self> {
        Ok(Self {
            scroll_section: dom::by_id(document, "scroll-section")?,
            bar_top: dom::by_id(document, "bar-top")?,
            bar_bottom: dom::by_id(document, "bar-bottom")?,
            intro_text: dom::by_id(document, "intro-text")?,
            intro_word: dom::by_id(document, "intro-word")?,
            canvas: dom::by_id(document, "showcase-canvas")?,
            mask: dom::by_id(document, "mask")?,
            marquee: dom::by_id(document, "marquee")?,
            marquee_track: dom::by_id(document, "marquee-track")?,
            next_section: dom::by_id(document, "next-section")?,
            final_section: dom::by_id(document, "final-section")?,
        })
    }
}

struct HomeState {
    this: Weak<RefCell<HomeState>>,
    window: Window,
    elements: HomeElements,
    sequencer: IntroSequencer,
    scroll: ScrollProgress,
    smoothing: SmoothingTask,
    mapping: ScrollMapping,
    marquee: Marquee,
    marquee_elapsed: f32,
    next_trigger: EdgeTrigger,
    final_gate: RevealGate,
    observer: Option<RevealObserver>,
    tween: Option<ScrollTween>,
    showcase: Option<ShowcaseCanvas>,
}

impl HomeState {
    fn advance_intro(&mut self, elapsed_ms: u32) {
        for stage in self.sequencer.advance_to(elapsed_ms) {
            self.apply_view(stage);
            if let Some(showcase) = &self.showcase {
                showcase.on_stage(stage);
            }
            if stage == SequenceStage::ModelVisible {
                self.track_scroll_region();
                self.start_auto_scroll();
            }
        }
    }

    fn apply_view(&self, stage: SequenceStage) {
        let view = IntroView::for_stage(stage);
        let elements = &self.elements;
        dom::set_class(&elements.bar_top, "open", view.bars_open);
        dom::set_class(&elements.bar_bottom, "open", view.bars_open);
        dom::set_class(&elements.intro_text, "visible", view.text_visible);
        if let Some(word) = view.word {
            elements.intro_word.set_text_content(Some(word));
        }
        dom::set_class(&elements.canvas, "visible", view.model_visible);
        dom::set_class(&elements.marquee, "visible", view.marquee_visible);
    }

    /// Measures the tall scroll section; progress runs from its top at the
    /// viewport top to its bottom at the viewport bottom.
    fn track_scroll_region(&mut self) {
        if self.sequencer.stage() < SequenceStage::ModelVisible {
            return;
        }
        let rect = self.elements.scroll_section.get_bounding_client_rect();
        let scroll_y = self.scroll_y();
        let (_, viewport_height) = dom::viewport_size(&self.window);
        self.scroll.attach(ScrollRegion::for_element(
            (rect.top() + scroll_y) as f32,
            rect.height() as f32,
            viewport_height as f32,
        ));
        self.scroll.set_offset(scroll_y as f32);
    }

    fn on_scroll(&mut self) {
        let scroll_y = self.scroll_y();
        self.scroll.set_offset(scroll_y as f32);
    }

    fn start_auto_scroll(&mut self) {
        let from = self.scroll_y() as f32;
        let to = from + self.elements.next_section.get_bounding_client_rect().top() as f32;
        log::debug!("auto-scrolling from {from:.0} to {to:.0}");
        self.tween = Some(ScrollTween::auto_scroll(from, to));
    }

    fn frame(&mut self, delta_seconds: f32) {
        self.marquee_elapsed += delta_seconds;
        self.drive_tween(delta_seconds);

        if let Some(progress) = self.scroll.progress() {
            self.smoothing.set_target(progress);
        }
        if let Some(smoothed) = self.smoothing.tick() {
            if self.scroll.is_attached() {
                let loop_width = self.elements.marquee_track.scroll_width() as f32 / 2.0;
                let offset = self.marquee.offset(self.marquee_elapsed, loop_width);
                let phase = self.mapping.phase(smoothed, offset);
                self.apply_phase(&phase);
                if self.next_trigger.observe(phase.progress) {
                    self.reveal_next_section();
                }
            }
        }

        if let Some(showcase) = &self.showcase {
            showcase.frame(delta_seconds);
        }
    }

    fn drive_tween(&mut self, delta_seconds: f32) {
        let Some(tween) = self.tween.as_mut() else {
            return;
        };
        if let Some(top) = tween.advance(delta_seconds) {
            let options = ScrollToOptions::new();
            options.set_top(top as f64);
            options.set_behavior(ScrollBehavior::Instant);
            self.window.scroll_to_with_scroll_to_options(&options);
        }
        if tween.is_finished() {
            self.tween = None;
        }
    }

    fn apply_phase(&self, phase: &ScrollPhase) {
        let elements = &self.elements;
        dom::set_style(
            &elements.mask,
            "transform",
            &format!("scale({:.4})", phase.mask_scale),
        );
        dom::set_style(&elements.marquee, "color", phase.color_mode.css_color());
        dom::set_style(
            &elements.marquee_track,
            "transform",
            &format!("translate3d({:.2}px, 0, 0)", phase.text_offset),
        );
        if let Some(showcase) = &self.showcase {
            showcase.set_rotation(phase.rotation_angle);
        }
    }

    fn reveal_next_section(&mut self) {
        log::debug!("revealing next section");
        dom::set_class(&self.elements.next_section, "visible", true);
        match RevealObserver::observe(&self.elements.next_section, self.this.clone()) {
            Ok(observer) => self.observer = Some(observer),
            Err(err) => log::warn!("final section will not reveal: {err:#}"),
        }
    }

    fn observe_next_section(&mut self, rect: ViewportRect) {
        let (_, viewport_height) = dom::viewport_size(&self.window);
        if self.final_gate.observe(rect, viewport_height as f32) {
            log::debug!("revealing final section");
            dom::set_class(&self.elements.final_section, "visible", true);
            if let Some(observer) = &self.observer {
                observer.disconnect();
            }
        }
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn teardown(&mut self) {
        self.sequencer.cancel();
        self.smoothing.cancel();
        self.scroll.detach();
        self.tween = None;
        self.observer = None;
        self.showcase = None;
    }
}

/// Intersection observer on the next section feeding the final reveal gate.
struct RevealObserver {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

impl RevealObserver {
    fn observe(target: &HtmlElement, state: Weak<RefCell<HomeState>>) -> Result<Self> {
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                let Some(state) = state.upgrade() else {
                    return;
                };
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    let rect = entry.bounding_client_rect();
                    state.borrow_mut().observe_next_section(ViewportRect {
                        top: rect.top() as f32,
                        bottom: rect.bottom() as f32,
                    });
                }
            },
        );

        let options = IntersectionObserverInit::new();
        let thresholds = js_sys::Array::of3(
            &JsValue::from(0.0),
            &JsValue::from(0.5),
            &JsValue::from(1.0),
        );
        options.set_threshold(&thresholds);
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)
                .map_err(|err| dom::js_error("IntersectionObserver", err))
                .context("failed to observe next section")?;
        observer.observe(target);

        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for RevealObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

fn reset_scroll(window: &Window) {
    match window.history() {
        Ok(history) => {
            if let Err(err) = history.set_scroll_restoration(ScrollRestoration::Manual) {
                log::warn!("failed to disable scroll restoration: {err:?}");
            }
        }
        Err(err) => log::warn!("history not available: {err:?}"),
    }
    window.scroll_to_with_x_and_y(0.0, 0.0);
}

/// Fills the band with the word list twice so the loop is seamless.
fn build_marquee(document: &Document, track: &HtmlElement) -> Result<()> {
    track.set_inner_html("");
    for _ in 0..2 {
        for word in MARQUEE_WORDS {
            let item: HtmlElement = dom::create(document, "span")?;
            item.set_class_name("word-item");
            item.set_text_content(Some(word));
            track
                .append_child(&item)
                .map_err(|err| dom::js_error("append marquee word", err))?;
        }
    }
    Ok(())
}
