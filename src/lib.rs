//! Core of the ELECTRAS landing site.
//!
//! The crate is split so that every decision the pages make (intro timing,
//! scroll-to-visual mapping, reveal rules, gallery layout) lives in plain
//! modules that run and test on the host. The `web` module is the only part
//! that touches the DOM; it measures the page, feeds these modules and
//! writes their output back to styles and classes. The renderer is shared by
//! the browser canvas and the desktop preview binary.

pub mod app;
pub mod content;
pub mod error;
pub mod gallery;
pub mod mapping;
pub mod model;
pub mod obj;
pub mod progress;
pub mod render;
pub mod reveal;
pub mod scene;
pub mod showcase;
pub mod smoothing;
pub mod timeline;
pub mod tween;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{camera_from_scene, light_rig_from_scene};
pub use error::AssetError;
pub use gallery::{GalleryEvent, GalleryImage, GalleryViewer, MasonryLayout, GALLERY};
pub use mapping::{ColorMode, Marquee, ScrollMapping, ScrollPhase};
pub use model::{AnimationClip, Bounds, Normalization, ShowcaseModel};
pub use obj::{parse_obj, Mesh};
pub use progress::{ManualProgress, ProgressSource, ScrollProgress, ScrollRegion, TimeProgress};
pub use render::{CameraParams, LightRig, Renderer};
pub use reveal::{EdgeTrigger, RevealGate, ViewportRect};
pub use scene::{Scene, SceneObject};
pub use showcase::{ShowcaseFrame, ShowcasePresenter};
pub use smoothing::{CancellationToken, Smoother, SmoothingTask};
pub use timeline::{IntroSequencer, IntroView, Schedule, SequenceStage};
pub use tween::ScrollTween;
pub use viewport::{StaticViewport, Viewport, ViewportProvider};
