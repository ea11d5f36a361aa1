use glam::{Mat4, Vec3};

/// Directional lights the shader evaluates per fragment.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 2;

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Light arriving from `direction` (pointing from the scene towards the light).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl DirectionalLight {
    /// Light placed at `position` shining at the origin.
    pub fn from_position(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: position.normalize_or_zero(),
            color,
            intensity: intensity.max(0.0),
        }
    }

    pub const OFF: Self = Self {
        direction: Vec3::Y,
        color: Vec3::ZERO,
        intensity: 0.0,
    };
}

/// Lighting state consumed by the renderer's uniform buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightRig {
    /// Ambient color premultiplied by its intensity.
    pub ambient: Vec3,
    pub directional: [DirectionalLight; MAX_DIRECTIONAL_LIGHTS],
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.8),
            directional: [
                DirectionalLight::from_position(Vec3::new(10.0, 10.0, 10.0), Vec3::ONE, 2.0),
                DirectionalLight::OFF,
            ],
        }
    }
}
