use glam::{Mat4, Vec3};

use crate::render::{CameraParams, DirectionalLight, LightRig, MAX_DIRECTIONAL_LIGHTS};
use crate::scene::{ObjectKind, Scene};
use crate::viewport::ViewportProvider;

/// Camera distance used on compact viewports so the model fits the width.
pub const COMPACT_CAMERA_DISTANCE: f32 = 10.0;

const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 1000.0;

/// Builds the view-projection for the scene camera, looking at the origin.
pub fn camera_from_scene(scene: &Scene, viewport: &dyn ViewportProvider) -> CameraParams {
    let (mut position, fov) = scene
        .camera()
        .map(|camera| (camera.position, camera.fov))
        .unwrap_or((Vec3::new(0.0, 0.0, 8.0), 75.0));
    if viewport.is_compact() {
        position.z = COMPACT_CAMERA_DISTANCE;
    }

    let view = Mat4::look_at_rh(position, Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_rh(
        fov.to_radians(),
        viewport.aspect().max(0.01),
        NEAR_PLANE,
        FAR_PLANE,
    );
    CameraParams {
        view_proj: projection * view,
        position,
    }
}

/// Collects the scene's ambient lights and first directional lights.
pub fn light_rig_from_scene(scene: &Scene) -> LightRig {
    if scene.lights().next().is_none() {
        return LightRig::default();
    }

    let mut rig = LightRig {
        ambient: Vec3::ZERO,
        directional: [DirectionalLight::OFF; MAX_DIRECTIONAL_LIGHTS],
    };
    let mut slots = rig.directional.iter_mut();
    for light in scene.lights() {
        match light.kind {
            ObjectKind::Ambient => rig.ambient += light.color * light.intensity,
            ObjectKind::Directional => match slots.next() {
                Some(slot) => {
                    *slot = DirectionalLight::from_position(
                        light.position,
                        light.color,
                        light.intensity,
                    )
                }
                None => log::warn!(
                    "ignoring light {}: at most {MAX_DIRECTIONAL_LIGHTS} directional lights",
                    light.name
                ),
            },
            _ => {}
        }
    }
    rig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::StaticViewport;
    use once_cell::sync::Lazy;

    static SHOWCASE: Lazy<Scene> = Lazy::new(|| Scene::showcase().expect("bundled scene"));

    #[test]
    fn compact_viewports_pull_the_camera_back() {
        let wide = camera_from_scene(&SHOWCASE, &StaticViewport::new(1440, 900));
        let narrow = camera_from_scene(&SHOWCASE, &StaticViewport::new(390, 844));
        assert_eq!(wide.position.z, 8.0);
        assert_eq!(narrow.position.z, COMPACT_CAMERA_DISTANCE);
    }

    #[test]
    fn origin_projects_to_the_center() {
        let camera = camera_from_scene(&SHOWCASE, &StaticViewport::new(1280, 720));
        let clip = camera.view_proj.project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn bundled_lights_fill_the_rig() {
        let rig = light_rig_from_scene(&SHOWCASE);
        assert!((rig.ambient - Vec3::splat(0.8)).length() < 1e-5);
        let [key, fill] = rig.directional;
        assert_eq!(key.intensity, 2.0);
        assert!((key.direction - Vec3::splat(1.0).normalize()).length() < 1e-5);
        assert_eq!(fill.intensity, 1.0);
        assert!(fill.color.z > fill.color.x);
    }

    #[test]
    fn extra_directional_lights_are_dropped() {
        let xml = r#"<scene>
            <object><name>A</name><type>light</type><position>0 1 0</position></object>
            <object><name>B</name><type>light</type><position>1 0 0</position></object>
            <object><name>C</name><type>light</type><position>0 0 1</position></object>
        </scene>"#;
        let rig = light_rig_from_scene(&Scene::from_xml(xml).unwrap());
        assert_eq!(rig.ambient, Vec3::ZERO);
        assert_eq!(rig.directional[1].direction, Vec3::X);
    }
}
