use anyhow::{anyhow, Result};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Window};

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("window not available"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("document not available"))
}

/// Looks up `#id` and casts it to the expected element type.
pub fn by_id<T: JsCast>(document: &Document, id: &str) -> Result<T> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| anyhow!("element #{id} not found"))?
        .dyn_into::<T>()
        .map_err(|_| anyhow!("element #{id} has an unexpected type"))
}

pub fn create<T: JsCast>(document: &Document, tag: &str) -> Result<T> {
    document
        .create_element(tag)
        .map_err(|err| js_error("create element", err))?
        .dyn_into::<T>()
        .map_err(|_| anyhow!("<{tag}> has an unexpected type"))
}

pub fn set_class(element: &Element, class: &str, on: bool) {
    if let Err(err) = element.class_list().toggle_with_force(class, on) {
        log::warn!("failed to toggle class {class}: {err:?}");
    }
}

pub fn set_style(element: &HtmlElement, property: &str, value: &str) {
    if let Err(err) = element.style().set_property(property, value) {
        log::warn!("failed to set {property}: {err:?}");
    }
}

pub fn viewport_size(window: &Window) -> (u32, u32) {
    let read = |value: Result<JsValue, JsValue>| {
        value
            .ok()
            .and_then(|value| value.as_f64())
            .map_or(1, |value| value.max(1.0) as u32)
    };
    (read(window.inner_width()), read(window.inner_height()))
}

pub fn js_error(action: &str, err: JsValue) -> anyhow::Error {
    anyhow!("{action} failed: {err:?}")
}

/// Converts an error for the JS boundary.
pub fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}
