use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use anyhow::{Context, Result};
use gloo::events::EventListener;
use gloo::net::http::Request;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlCanvasElement;

use super::dom;
use crate::app::{camera_from_scene, light_rig_from_scene};
use crate::error::AssetError;
use crate::model::{AnimationClip, ShowcaseModel};
use crate::render::Renderer;
use crate::scene::Scene;
use crate::showcase::{ModelRequest, ShowcasePresenter};
use crate::smoothing::CancellationToken;
use crate::timeline::SequenceStage;
use crate::viewport::{Viewport, ViewportProvider};

/// Device pixel ratio cap for the canvas backing store.
const MAX_PIXEL_RATIO: f64 = 2.0;

/// The 3D layer of the home page: owns the canvas, the renderer and the
/// presenter. Dropping it stops pending loads and releases the GPU.
pub struct ShowcaseCanvas {
    state: Rc<RefCell<CanvasState>>,
    token: CancellationToken,
    _resize: EventListener,
}

struct CanvasState {
    canvas: HtmlCanvasElement,
    scene: Scene,
    presenter: ShowcasePresenter,
    viewport: Arc<Viewport>,
    renderer: Option<Renderer>,
}

impl ShowcaseCanvas {
    pub fn mount(canvas: HtmlCanvasElement) -> Result<Self> {
        let window = dom::window()?;
        let scene = Scene::showcase().context("failed to parse bundled scene")?;
        let presenter = ShowcasePresenter::from_scene(&scene)
            .context("bundled scene has no model entry")?;
        let (width, height) = dom::viewport_size(&window);

        let state = Rc::new(RefCell::new(CanvasState {
            canvas,
            scene,
            presenter,
            viewport: Arc::new(Viewport::new(width, height)),
            renderer: None,
        }));
        fit_canvas(&state.borrow().canvas, width, height);

        let weak = Rc::downgrade(&state);
        let resize = EventListener::new(&window, "resize", move |_| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let Ok(window) = dom::window() else {
                return;
            };
            let (width, height) = dom::viewport_size(&window);
            state.borrow_mut().resize(width, height);
        });

        Ok(Self {
            state,
            token: CancellationToken::new(),
            _resize: resize,
        })
    }

    /// Starts the renderer and the asset fetch when the stage reveals the
    /// model; later stages are ignored.
    pub fn on_stage(&self, stage: SequenceStage) {
        let (request, clips) = {
            let mut state = self.state.borrow_mut();
            let Some(request) = state.presenter.on_stage(stage) else {
                return;
            };
            (request, state.scene.clips.clone())
        };
        spawn_local(load(Rc::downgrade(&self.state), self.token.clone(), request, clips));
    }

    pub fn set_rotation(&self, rotation: f32) {
        self.state.borrow_mut().presenter.set_rotation(rotation);
    }

    pub fn frame(&self, delta_seconds: f32) {
        self.state.borrow_mut().draw(delta_seconds);
    }
}

impl Drop for ShowcaseCanvas {
    fn drop(&mut self) {
        self.token.cancel();
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.renderer = None;
        }
    }
}

/// Sizes the backing store for a CSS viewport; returns the pixel size.
fn fit_canvas(canvas: &HtmlCanvasElement, width: u32, height: u32) -> (u32, u32) {
    let ratio = dom::window()
        .map(|window| window.device_pixel_ratio())
        .unwrap_or(1.0)
        .clamp(1.0, MAX_PIXEL_RATIO);
    let pixels = (
        (width as f64 * ratio).round() as u32,
        (height as f64 * ratio).round() as u32,
    );
    canvas.set_width(pixels.0);
    canvas.set_height(pixels.1);
    pixels
}

impl CanvasState {
    fn resize(&mut self, width: u32, height: u32) {
        self.viewport.update(width, height);
        let pixels = fit_canvas(&self.canvas, width, height);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(pixels);
        }
    }

    fn draw(&mut self, delta_seconds: f32) {
        let frame = self.presenter.advance(delta_seconds);
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if let Some(model) = self.presenter.model() {
            if !renderer.has_mesh() {
                renderer.upload_mesh(&model.mesh);
            }
        }

        let camera = camera_from_scene(&self.scene, self.viewport.as_ref());
        renderer.update_globals(&camera, &light_rig_from_scene(&self.scene));
        match renderer.render(frame.as_ref()) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = self.viewport.viewport_size();
                renderer.resize(fit_canvas(&self.canvas, width, height));
            }
            Err(err) => log::warn!("skipping frame: {err}"),
        }
    }
}

async fn load(
    state: Weak<RefCell<CanvasState>>,
    token: CancellationToken,
    request: ModelRequest,
    clips: Vec<AnimationClip>,
) {
    let Some(strong) = state.upgrade() else {
        return;
    };
    let canvas = strong.borrow().canvas.clone();
    drop(strong);
    let size = (canvas.width(), canvas.height());
    let renderer = Renderer::new(wgpu::SurfaceTarget::Canvas(canvas), size).await;
    let model = fetch_text(&request.path).await.and_then(|text| {
        ShowcaseModel::from_obj(&request.path, &text, request.target_size, clips)
    });

    if token.is_cancelled() {
        log::debug!("discarding showcase load after teardown");
        return;
    }
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = state.borrow_mut();
    match renderer {
        Ok(mut renderer) => {
            let (width, height) = state.viewport.viewport_size();
            renderer.resize(fit_canvas(&state.canvas, width, height));
            state.renderer = Some(renderer);
        }
        Err(err) => log::error!("failed to start renderer: {err:#}"),
    }
    state.presenter.finish_load(model);
}

async fn fetch_text(path: &str) -> Result<String, AssetError> {
    let response = Request::get(path)
        .send()
        .await
        .map_err(|err| AssetError::Fetch {
            path: path.to_string(),
            message: err.to_string(),
        })?;
    if !response.ok() {
        return Err(AssetError::Status {
            path: path.to_string(),
            status: response.status(),
        });
    }
    let bytes = response.binary().await.map_err(|err| AssetError::Fetch {
        path: path.to_string(),
        message: err.to_string(),
    })?;
    log::info!("fetched {path} ({} bytes)", bytes.len());
    String::from_utf8(bytes).map_err(|_| AssetError::Encoding {
        path: path.to_string(),
    })
}
