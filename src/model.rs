//! Loaded showcase model: geometry, its bounds and the transform that puts
//! it at a known size in the middle of the frame.

use std::f32::consts::TAU;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::obj::{parse_obj, Mesh};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self { min: first, max: first }, |bounds, p| Self {
            min: bounds.min.min(p),
            max: bounds.max.max(p),
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }
}

/// Uniform scale plus translation mapping a model into a centered box whose
/// largest side equals the target size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub scale: f32,
    pub translation: Vec3,
}

impl Normalization {
    pub fn fit(bounds: &Bounds, target_size: f32) -> Self {
        let max_dimension = bounds.max_dimension();
        let scale = if max_dimension > f32::EPSILON {
            target_size / max_dimension
        } else {
            1.0
        };
        Self {
            scale,
            translation: -bounds.center() * scale,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_scale(Vec3::splat(self.scale))
    }

    pub fn apply(&self, point: Vec3) -> Vec3 {
        point * self.scale + self.translation
    }
}

/// Looping vertical float bundled with the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub amplitude: f32,
    #[serde(skip)]
    time: f32,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32, amplitude: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(f32::EPSILON),
            amplitude,
            time: 0.0,
        }
    }

    pub fn advance(&mut self, delta_seconds: f32) {
        self.time = (self.time + delta_seconds.max(0.0)).rem_euclid(self.duration);
    }

    pub fn offset(&self) -> Vec3 {
        Vec3::Y * self.amplitude * (TAU * self.time / self.duration).sin()
    }
}

/// Model ready to be drawn.
#[derive(Debug, Clone)]
pub struct ShowcaseModel {
    pub mesh: Mesh,
    pub bounds: Bounds,
    pub normalization: Normalization,
    pub clips: Vec<AnimationClip>,
}

impl ShowcaseModel {
    pub fn new(mesh: Mesh, target_size: f32, clips: Vec<AnimationClip>) -> Option<Self> {
        let bounds = Bounds::from_points(mesh.positions())?;
        Some(Self {
            normalization: Normalization::fit(&bounds, target_size),
            mesh,
            bounds,
            clips,
        })
    }

    /// Parses OBJ text fetched from `path`.
    pub fn from_obj(
        path: &str,
        text: &str,
        target_size: f32,
        clips: Vec<AnimationClip>,
    ) -> Result<Self, AssetError> {
        let mesh = parse_obj(text).map_err(|source| AssetError::Parse {
            path: path.to_string(),
            source,
        })?;
        // `parse_obj` guarantees at least one vertex.
        Self::new(mesh, target_size, clips).ok_or_else(|| AssetError::Parse {
            path: path.to_string(),
            source: anyhow::anyhow!("mesh has no vertices"),
        })
    }

    pub fn advance_clips(&mut self, delta_seconds: f32) {
        for clip in &mut self.clips {
            clip.advance(delta_seconds);
        }
    }

    pub fn clip_offset(&self) -> Vec3 {
        self.clips.iter().map(AnimationClip::offset).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corners(min: Vec3, max: Vec3) -> Vec<Vec3> {
        vec![min, Vec3::new(max.x, min.y, min.z), Vec3::new(min.x, max.y, max.z), max]
    }

    #[test]
    fn normalizes_to_target_size_and_centers() {
        let min = Vec3::new(10.0, -5.0, 3.0);
        let bounds = Bounds::from_points(corners(min, min + Vec3::new(200.0, 50.0, 10.0))).unwrap();
        assert_eq!(bounds.size(), Vec3::new(200.0, 50.0, 10.0));

        let fit = Normalization::fit(&bounds, 4.0);
        assert!((fit.scale - 0.02).abs() < 1e-6);
        assert!(fit.apply(bounds.center()).length() < 1e-5);

        let world = fit.matrix().transform_point3(bounds.center());
        assert!(world.length() < 1e-5);
        let extent = fit.apply(bounds.max) - fit.apply(bounds.min);
        assert!((extent.max_element() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_bounds_keep_unit_scale() {
        let point = Vec3::new(1.0, 2.0, 3.0);
        let bounds = Bounds::from_points([point]).unwrap();
        let fit = Normalization::fit(&bounds, 4.0);
        assert_eq!(fit.scale, 1.0);
        assert_eq!(fit.apply(point), Vec3::ZERO);
        assert!(Bounds::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn clips_loop_and_offset_vertically() {
        let mut clip = AnimationClip::new("float", 4.0, 0.5);
        clip.advance(1.0);
        assert!((clip.offset().y - 0.5).abs() < 1e-5);
        clip.advance(4.0);
        assert!((clip.offset().y - 0.5).abs() < 1e-4);
        assert_eq!(clip.offset().x, 0.0);
    }

    #[test]
    fn parse_failures_name_the_asset() {
        let err = ShowcaseModel::from_obj("models/broken.obj", "v 1 2\n", 4.0, Vec::new()).unwrap_err();
        assert_eq!(err.path(), "models/broken.obj");
    }
}
