use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::model::AnimationClip;

/// Scene description bundled with the site.
pub const SHOWCASE_XML: &str = include_str!("../assets/showcase.xml");

/// Camera, lights and model entry for the showcase canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub clips: Vec<AnimationClip>,
}

impl Scene {
    /// Parses the showcase scene XML.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let mut objects = Vec::new();
        for node in document.descendants().filter(|n| n.has_tag_name("object")) {
            let defaults = SceneObject::default();
            let name = required_text(&node, "name")?;
            let object = SceneObject {
                kind: optional_text(&node, "type")
                    .map(|kind| ObjectKind::parse(&kind))
                    .transpose()
                    .with_context(|| format!("object {name}"))?
                    .unwrap_or(ObjectKind::Mesh),
                asset: optional_text(&node, "asset"),
                color: parse_color(optional_text(&node, "color"), defaults.color)?,
                position: parse_vec3(optional_text(&node, "position"), defaults.position)?,
                fov: parse_f32(optional_text(&node, "fov"), defaults.fov)?,
                intensity: parse_f32(optional_text(&node, "intensity"), defaults.intensity)?,
                size: parse_f32(optional_text(&node, "size"), defaults.size)?,
                name,
            };
            objects.push(object);
        }

        let clips = document
            .descendants()
            .filter(|n| n.has_tag_name("clip"))
            .map(|node| -> Result<AnimationClip> {
                Ok(AnimationClip::new(
                    required_text(&node, "name")?,
                    parse_f32(optional_text(&node, "duration"), 1.0)?,
                    parse_f32(optional_text(&node, "amplitude"), 0.0)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { objects, clips })
    }

    /// The scene shipped in `assets/showcase.xml`.
    pub fn showcase() -> Result<Self> {
        Self::from_xml(SHOWCASE_XML)
    }

    pub fn camera(&self) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.kind == ObjectKind::Camera)
    }

    /// First mesh entry; the showcase draws a single model.
    pub fn model(&self) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.kind == ObjectKind::Mesh)
    }

    pub fn lights(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::Ambient | ObjectKind::Directional))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Camera,
    Ambient,
    Directional,
    Mesh,
}

impl ObjectKind {
    fn parse(value: &str) -> Result<Self> {
        Ok(match value {
            "camera" => Self::Camera,
            "ambient" => Self::Ambient,
            "light" | "directional" => Self::Directional,
            "mesh" => Self::Mesh,
            other => return Err(anyhow!("unknown object type {other:?}")),
        })
    }
}

/// Scene entry as written in the XML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// Path of the mesh file, relative to the site root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(default = "default_color")]
    pub color: Vec3,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    /// Largest side of the normalized model, in world units.
    #[serde(default = "default_size")]
    pub size: f32,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: ObjectKind::Mesh,
            asset: None,
            color: default_color(),
            position: Vec3::ZERO,
            fov: default_fov(),
            intensity: default_intensity(),
            size: default_size(),
        }
    }
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_fov() -> f32 {
    75.0
}

fn default_intensity() -> f32 {
    1.0
}

fn default_size() -> f32 {
    4.0
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_components<const N: usize>(value: &str, what: &str) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    let mut numbers = value.split_whitespace().map(str::parse::<f32>);
    for slot in &mut out {
        *slot = numbers
            .next()
            .ok_or_else(|| anyhow!("{what} is missing components"))?
            .with_context(|| format!("{what} {value:?} is not numeric"))?;
    }
    Ok(out)
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => Ok(Vec3::from_array(parse_components(&value, "vector")?)),
        None => Ok(default),
    }
}

/// Accepts `#rrggbb` or three 0-255 components.
fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    if let Some(hex) = value.strip_prefix('#') {
        let rgb = u32::from_str_radix(hex, 16)
            .ok()
            .filter(|_| hex.len() == 6)
            .ok_or_else(|| anyhow!("color {value:?} is not #rrggbb"))?;
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        return Ok(Vec3::new(channel(16), channel(8), channel(0)));
    }
    Ok(Vec3::from_array(parse_components(&value, "color")?) / 255.0)
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float {value:?}: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <object>
            <name>Camera</name>
            <type>camera</type>
            <fov>90</fov>
            <position>0 0 8</position>
        </object>
        <object>
            <name>Fill</name>
            <type>light</type>
            <intensity>1.5</intensity>
            <position>-10 5 -10</position>
            <color>#4488ff</color>
        </object>
        <object>
            <name>Board</name>
            <asset>models/board.obj</asset>
            <color>255 128 0</color>
        </object>
        <clip>
            <name>float</name>
            <duration>6</duration>
            <amplitude>0.1</amplitude>
        </clip>
    </scene>
    "#;

    #[test]
    fn parses_camera_lights_model_and_clips() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.objects.len(), 3);
        assert_eq!(scene.camera().map(|c| c.fov), Some(90.0));

        let fill = scene.lights().next().unwrap();
        assert_eq!(fill.kind, ObjectKind::Directional);
        assert_eq!(fill.position, Vec3::new(-10.0, 5.0, -10.0));
        assert!((fill.color - Vec3::new(68.0, 136.0, 255.0) / 255.0).length() < 1e-6);

        let model = scene.model().unwrap();
        assert_eq!(model.asset.as_deref(), Some("models/board.obj"));
        assert_eq!(model.size, 4.0);
        assert_eq!(model.color, Vec3::new(1.0, 128.0 / 255.0, 0.0));

        assert_eq!(scene.clips.len(), 1);
        assert_eq!(scene.clips[0].name, "float");
    }

    #[test]
    fn bundled_scene_parses() {
        let scene = Scene::showcase().unwrap();
        assert!(scene.camera().is_some());
        assert!(scene.model().and_then(|m| m.asset.as_ref()).is_some());
        assert_eq!(scene.lights().count(), 3);
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<scene><object><type>mesh</type></object></scene>";
        assert!(Scene::from_xml(bad).is_err());
    }

    #[test]
    fn unknown_type_is_an_error() {
        let bad = "<scene><object><name>X</name><type>spotlight</type></object></scene>";
        let err = Scene::from_xml(bad).unwrap_err();
        assert!(format!("{err:#}").contains("spotlight"));
    }
}
