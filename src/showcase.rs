//! Lazy, scroll-driven presentation of the showcase model.
//!
//! The presenter owns no GPU or DOM state. It decides when the asset should
//! be requested, keeps the loaded model and turns the smoothed rotation into
//! the per-frame model matrix the renderer draws.

use glam::{Mat4, Vec3};

use crate::error::AssetError;
use crate::model::ShowcaseModel;
use crate::scene::Scene;
use crate::timeline::SequenceStage;

/// Fraction of the rotation applied around Y.
pub const YAW_FACTOR: f32 = 0.05;
/// Fraction of the rotation applied around X.
pub const PITCH_FACTOR: f32 = 0.5;

#[derive(Debug, Default)]
pub enum LoadState {
    /// Waiting for the intro to reveal the 3D layer.
    #[default]
    Deferred,
    Loading,
    Ready(Box<ShowcaseModel>),
    Failed,
}

/// Asset request issued once the model becomes visible.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub path: String,
    pub target_size: f32,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShowcaseFrame {
    pub model: Mat4,
    pub color: Vec3,
}

#[derive(Debug)]
pub struct ShowcasePresenter {
    request: ModelRequest,
    color: Vec3,
    state: LoadState,
    rotation: f32,
}

impl ShowcasePresenter {
    pub fn new(request: ModelRequest, color: Vec3) -> Self {
        Self {
            request,
            color,
            state: LoadState::Deferred,
            rotation: 0.0,
        }
    }

    /// Presenter for the model entry of `scene`, if it has one with an asset.
    pub fn from_scene(scene: &Scene) -> Option<Self> {
        let model = scene.model()?;
        let path = model.asset.clone()?;
        Some(Self::new(
            ModelRequest {
                path,
                target_size: model.size,
            },
            model.color,
        ))
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn model(&self) -> Option<&ShowcaseModel> {
        match &self.state {
            LoadState::Ready(model) => Some(&**model),
            _ => None,
        }
    }

    /// Feeds a sequencer stage. Returns the asset request the first time the
    /// model becomes visible and `None` on every other call.
    pub fn on_stage(&mut self, stage: SequenceStage) -> Option<ModelRequest> {
        if stage < SequenceStage::ModelVisible || !matches!(self.state, LoadState::Deferred) {
            return None;
        }
        log::info!("requesting showcase model {}", self.request.path);
        self.state = LoadState::Loading;
        Some(self.request.clone())
    }

    /// Completes the pending request. Failures are logged and leave the
    /// slot empty.
    pub fn finish_load(&mut self, result: Result<ShowcaseModel, AssetError>) {
        if !matches!(self.state, LoadState::Loading) {
            log::warn!("ignoring showcase load result with no pending request");
            return;
        }
        self.state = match result {
            Ok(model) => {
                log::info!(
                    "showcase model ready: {} vertices, {} triangles, scale {:.4}",
                    model.mesh.vertex_count(),
                    model.mesh.triangle_count(),
                    model.normalization.scale
                );
                LoadState::Ready(Box::new(model))
            }
            Err(err) => {
                log::error!("failed to load showcase model: {err}");
                LoadState::Failed
            }
        };
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Advances animation clips and returns the frame to draw, or `None`
    /// while nothing is loaded.
    pub fn advance(&mut self, delta_seconds: f32) -> Option<ShowcaseFrame> {
        let rotation = self.rotation;
        let color = self.color;
        let LoadState::Ready(model) = &mut self.state else {
            return None;
        };
        model.advance_clips(delta_seconds);
        Some(ShowcaseFrame {
            model: model_matrix(rotation, model),
            color,
        })
    }
}

/// Tumble around the model's own center, then the clip offset.
pub fn model_matrix(rotation: f32, model: &ShowcaseModel) -> Mat4 {
    Mat4::from_rotation_y(rotation * YAW_FACTOR)
        * Mat4::from_rotation_x(rotation * PITCH_FACTOR)
        * Mat4::from_translation(model.clip_offset())
        * model.normalization.matrix()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnimationClip;
    use crate::obj::parse_obj;

    const SLAB: &str = "v 0 0 0\nv 200 0 0\nv 200 50 0\nv 0 50 10\nf 1 2 3\nf 1 3 4\n";

    fn presenter() -> ShowcasePresenter {
        ShowcasePresenter::new(
            ModelRequest {
                path: "models/board.obj".into(),
                target_size: 4.0,
            },
            Vec3::ONE,
        )
    }

    fn loaded(clips: Vec<AnimationClip>) -> ShowcaseModel {
        ShowcaseModel::new(parse_obj(SLAB).unwrap(), 4.0, clips).unwrap()
    }

    #[test]
    fn requests_once_when_model_becomes_visible() {
        let mut presenter = presenter();
        for stage in &SequenceStage::ALL[..6] {
            assert!(presenter.on_stage(*stage).is_none());
        }
        let request = presenter.on_stage(SequenceStage::ModelVisible).unwrap();
        assert_eq!(request.path, "models/board.obj");
        assert!(presenter.on_stage(SequenceStage::ModelVisible).is_none());
        assert!(matches!(presenter.state(), LoadState::Loading));
    }

    #[test]
    fn renders_nothing_until_loaded() {
        let mut presenter = presenter();
        assert!(presenter.advance(0.016).is_none());
        presenter.on_stage(SequenceStage::ModelVisible);
        assert!(presenter.advance(0.016).is_none());
        presenter.finish_load(Ok(loaded(Vec::new())));
        assert!(presenter.advance(0.016).is_some());
    }

    #[test]
    fn failed_load_leaves_slot_empty() {
        let mut presenter = presenter();
        presenter.on_stage(SequenceStage::ModelVisible);
        presenter.finish_load(Err(AssetError::Status {
            path: "models/board.obj".into(),
            status: 404,
        }));
        assert!(matches!(presenter.state(), LoadState::Failed));
        assert!(presenter.advance(0.016).is_none());
        assert!(presenter.on_stage(SequenceStage::ModelVisible).is_none());
    }

    #[test]
    fn rotation_tumbles_around_both_axes() {
        let model = loaded(Vec::new());
        let rotation = std::f32::consts::PI;
        let expected = Mat4::from_rotation_y(rotation * 0.05) * Mat4::from_rotation_x(rotation * 0.5);
        let center = model.bounds.center();
        let moved = model_matrix(rotation, &model).transform_point3(center);
        assert!(moved.length() < 1e-4);

        let corner = model.bounds.max;
        let normalized = model.normalization.apply(corner);
        let actual = model_matrix(rotation, &model).transform_point3(corner);
        assert!((actual - expected.transform_point3(normalized)).length() < 1e-4);
    }

    #[test]
    fn clips_float_the_model() {
        let mut presenter = presenter();
        presenter.on_stage(SequenceStage::ModelVisible);
        presenter.finish_load(Ok(loaded(vec![AnimationClip::new("float", 4.0, 0.5)])));
        let frame = presenter.advance(1.0).unwrap();
        let center = frame.model.transform_point3(Vec3::new(100.0, 25.0, 5.0));
        assert!((center - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-4);
    }

    #[test]
    fn bundled_scene_describes_the_model() {
        let presenter = ShowcasePresenter::from_scene(&Scene::showcase().unwrap()).unwrap();
        assert_eq!(presenter.request.path, "models/board.obj");
        assert_eq!(presenter.request.target_size, 4.0);
    }
}
