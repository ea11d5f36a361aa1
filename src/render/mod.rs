mod common;
mod gpu;

pub use common::{CameraParams, DirectionalLight, LightRig, MAX_DIRECTIONAL_LIGHTS};
pub use gpu::Renderer;
