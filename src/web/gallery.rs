use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use gloo::events::EventListener;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, HtmlImageElement, Window};

use super::dom;
use crate::gallery::{column_count, masonry_layout, GalleryEvent, GalleryViewer, GALLERY};

/// Space between columns and between stacked images, in CSS pixels.
const GAP: f32 = 16.0;

/// Handle returned to JavaScript for the gallery page.
#[wasm_bindgen]
pub struct GalleryPage {
    inner: Option<GalleryInner>,
}

#[wasm_bindgen]
impl GalleryPage {
    /// Removes every listener the page registered.
    pub fn dispose(&mut self) {
        if self.inner.take().is_some() {
            log::info!("gallery page disposed");
        }
    }
}

struct GalleryInner {
    _listeners: Vec<EventListener>,
    _state: Rc<RefCell<GalleryState>>,
}

struct GalleryState {
    window: Window,
    document: Document,
    grid: HtmlElement,
    lightbox: HtmlElement,
    image: HtmlImageElement,
    caption: HtmlElement,
    viewer: GalleryViewer,
    columns: usize,
    /// Click and load listeners of the current grid items.
    item_listeners: Vec<EventListener>,
}

impl GalleryPage {
    pub fn mount() -> Result<Self> {
        let window = dom::window()?;
        let document = dom::document()?;
        window.scroll_to_with_x_and_y(0.0, 0.0);

        let state = Rc::new(RefCell::new(GalleryState {
            grid: dom::by_id(&document, "gallery-grid")?,
            lightbox: dom::by_id(&document, "lightbox")?,
            image: dom::by_id(&document, "lightbox-image")?,
            caption: dom::by_id(&document, "lightbox-caption")?,
            window: window.clone(),
            document: document.clone(),
            viewer: GalleryViewer::new(),
            columns: 0,
            item_listeners: Vec::new(),
        }));
        GalleryState::rebuild(&state)?;
        state.borrow().sync_lightbox();

        let mut listeners = Vec::new();
        {
            let weak = Rc::downgrade(&state);
            listeners.push(EventListener::new(&window, "resize", move |_| {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                let columns = column_count(dom::viewport_size(&state.borrow().window).0);
                if columns != state.borrow().columns {
                    if let Err(err) = GalleryState::rebuild(&state) {
                        log::error!("failed to lay out gallery: {err:#}");
                    }
                }
            }));
        }
        let lightbox = state.borrow().lightbox.clone();
        listeners.push(dispatch_on(&lightbox, &state, GalleryEvent::BackdropClicked, false));
        let panel: HtmlElement = dom::by_id(&document, "lightbox-panel")?;
        listeners.push(dispatch_on(&panel, &state, GalleryEvent::BodyClicked, true));
        let close: HtmlElement = dom::by_id(&document, "lightbox-close")?;
        listeners.push(dispatch_on(&close, &state, GalleryEvent::CloseClicked, true));

        log::info!("gallery mounted with {} images", GALLERY.len());
        Ok(Self {
            inner: Some(GalleryInner {
                _listeners: listeners,
                _state: state,
            }),
        })
    }
}

/// Click listener that feeds `event` to the viewer. Clicks on the panel and
/// the close button stop there so they never count as backdrop clicks.
fn dispatch_on(
    target: &HtmlElement,
    state: &Rc<RefCell<GalleryState>>,
    event: GalleryEvent,
    stop_propagation: bool,
) -> EventListener {
    let weak = Rc::downgrade(state);
    EventListener::new(target, "click", move |dom_event| {
        if stop_propagation {
            dom_event.stop_propagation();
        }
        if let Some(state) = weak.upgrade() {
            state.borrow_mut().dispatch(event);
        }
    })
}

impl GalleryState {
    fn dispatch(&mut self, event: GalleryEvent) {
        if self.viewer.handle(event) {
            self.sync_lightbox();
        }
    }

    fn sync_lightbox(&self) {
        match self.viewer.selected_image() {
            Some(image) => {
                self.image.set_src(image.src);
                self.image.set_alt(image.caption);
                self.caption.set_text_content(Some(image.caption));
                dom::set_class(&self.lightbox, "open", true);
            }
            None => dom::set_class(&self.lightbox, "open", false),
        }
    }

    /// Re-creates the column elements for the current width.
    fn rebuild(state: &Rc<RefCell<Self>>) -> Result<()> {
        let mut this = state.borrow_mut();
        let columns = column_count(dom::viewport_size(&this.window).0);
        let container_width = this.grid.client_width().max(0) as f32;
        let layout = masonry_layout(&GALLERY, container_width, columns, GAP);
        log::debug!(
            "gallery layout: {} column(s) of {:.0}px",
            layout.columns,
            layout.column_width
        );

        this.item_listeners.clear();
        this.grid.set_inner_html("");
        dom::set_style(&this.grid, "gap", &format!("{GAP}px"));
        for column in 0..layout.columns {
            let column_el: HtmlElement = dom::create(&this.document, "div")?;
            column_el.set_class_name("gallery-column");
            dom::set_style(&column_el, "gap", &format!("{GAP}px"));
            for index in layout.column(column) {
                let item = this.create_item(state, index)?;
                column_el
                    .append_child(&item)
                    .map_err(|err| dom::js_error("append gallery item", err))?;
            }
            this.grid
                .append_child(&column_el)
                .map_err(|err| dom::js_error("append gallery column", err))?;
        }
        this.columns = layout.columns;
        Ok(())
    }

    fn create_item(&mut self, state: &Rc<RefCell<Self>>, index: usize) -> Result<HtmlElement> {
        let image = &GALLERY[index];
        let item: HtmlElement = dom::create(&self.document, "figure")?;
        item.set_class_name("gallery-item");
        dom::set_style(
            &item,
            "aspect-ratio",
            &format!("{} / {}", image.width, image.height),
        );

        let img: HtmlImageElement = dom::create(&self.document, "img")?;
        img.set_alt(image.caption);
        img.set_src(image.src);
        let loaded = img.clone();
        self.item_listeners
            .push(EventListener::once(&img, "load", move |_| {
                dom::set_class(&loaded, "loaded", true);
            }));
        item.append_child(&img)
            .map_err(|err| dom::js_error("append gallery image", err))?;

        let caption: HtmlElement = dom::create(&self.document, "figcaption")?;
        caption.set_text_content(Some(image.caption));
        item.append_child(&caption)
            .map_err(|err| dom::js_error("append gallery caption", err))?;

        let weak = Rc::downgrade(state);
        self.item_listeners
            .push(EventListener::new(&item, "click", move |_| {
                if let Some(state) = weak.upgrade() {
                    state.borrow_mut().dispatch(GalleryEvent::ItemClicked(index));
                }
            }));
        Ok(item)
    }
}
