//! Browser bindings. Everything here reads the DOM and forwards to the
//! host-testable modules of the crate; nothing flows the other way.
#![cfg(target_arch = "wasm32")]

mod dom;
mod frame;
mod gallery;
mod home;
mod showcase;

use wasm_bindgen::prelude::*;

pub use gallery::GalleryPage;
pub use home::HomePage;

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

/// Mounts the landing page on the current document. Call `dispose()` on the
/// returned handle when navigating away.
#[wasm_bindgen]
pub fn start_home() -> Result<HomePage, JsValue> {
    HomePage::mount().map_err(|err| {
        log::error!("home page failed to mount: {err:#}");
        dom::to_js(err)
    })
}

#[wasm_bindgen]
pub fn start_gallery() -> Result<GalleryPage, JsValue> {
    GalleryPage::mount().map_err(|err| {
        log::error!("gallery failed to mount: {err:#}");
        dom::to_js(err)
    })
}
