use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Floats per interleaved vertex: `position.xyz` then `normal.xyz`.
pub const VERTEX_STRIDE: usize = 6;

/// Indexed triangle mesh with interleaved position/normal vertices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|chunk| Vec3::new(chunk[0], chunk[1], chunk[2]))
    }
}

/// Parses a Wavefront OBJ document.
///
/// Only geometry is read (`v`, `vn`, `f`); polygons are fan-triangulated and
/// normals are generated for corners that do not reference one.
pub fn parse_obj(data: &str) -> Result<Mesh> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut triangles: Vec<[Corner; 3]> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let line = line.trim();
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => positions.push(
                parse_vec3(parts).with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            Some("vn") => normals.push(
                parse_vec3(parts).with_context(|| format!("invalid normal on line {}", line_no + 1))?,
            ),
            Some("f") => {
                let polygon = parts
                    .map(|token| Corner::parse(token, positions.len(), normals.len()))
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                if polygon.len() < 3 {
                    bail!("face on line {} has fewer than 3 corners", line_no + 1);
                }
                for i in 1..polygon.len() - 1 {
                    triangles.push([polygon[0], polygon[i], polygon[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        bail!("OBJ file does not define any vertices");
    }
    if triangles.is_empty() {
        bail!("OBJ file does not define any faces");
    }

    let (mut mesh, missing) = weld(&positions, &normals, &triangles);
    if missing.iter().any(|m| *m) {
        smooth_normals(&mut mesh, &missing);
    }
    Ok(mesh)
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut next = || -> Result<f32> {
        Ok(parts
            .next()
            .ok_or_else(|| anyhow!("missing vector component"))?
            .parse::<f32>()?)
    };
    Ok(Vec3::new(next()?, next()?, next()?))
}

/// One polygon corner: `v`, `v/vt`, `v//vn` or `v/vt/vn`.
///
/// Indices are stored zero-based. Negative indices count back from the
/// vertices defined before the face line, so they are resolved while parsing.
#[derive(Debug, Clone, Copy)]
struct Corner {
    position: usize,
    normal: Option<usize>,
}

impl Corner {
    fn parse(token: &str, positions: usize, normals: usize) -> Result<Self> {
        let mut fields = token.split('/');
        let raw = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("missing vertex index in {token:?}"))?
            .parse::<i32>()
            .with_context(|| format!("bad vertex index in {token:?}"))?;
        let position =
            resolve_index(raw, positions).ok_or_else(|| anyhow!("vertex index {raw} out of range"))?;
        let _texcoord = fields.next();
        let normal = match fields.next() {
            Some(s) if !s.is_empty() => {
                let raw = s
                    .parse::<i32>()
                    .with_context(|| format!("bad normal index in {token:?}"))?;
                Some(
                    resolve_index(raw, normals)
                        .ok_or_else(|| anyhow!("normal index {raw} out of range"))?,
                )
            }
            _ => None,
        };
        Ok(Self { position, normal })
    }
}

/// Builds the indexed mesh. The second value flags vertices the file gave no normal.
fn weld(positions: &[Vec3], normals: &[Vec3], triangles: &[[Corner; 3]]) -> (Mesh, Vec<bool>) {
    let mut lookup: HashMap<(usize, Option<usize>), u32> = HashMap::new();
    let mut mesh = Mesh::default();
    let mut missing = Vec::new();

    for corner in triangles.iter().flatten() {
        let next = mesh.vertex_count() as u32;
        let index = *lookup
            .entry((corner.position, corner.normal))
            .or_insert_with(|| {
                let p = positions[corner.position];
                let n = corner.normal.map_or(Vec3::ZERO, |i| normals[i]);
                mesh.vertices.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z]);
                missing.push(corner.normal.is_none());
                next
            });
        mesh.indices.push(index);
    }

    (mesh, missing)
}

fn resolve_index(index: i32, len: usize) -> Option<usize> {
    match index {
        0 => None,
        i if i > 0 => {
            let zero_based = i as usize - 1;
            (zero_based < len).then_some(zero_based)
        }
        i => {
            let back = i.unsigned_abs() as usize;
            (back <= len).then(|| len - back)
        }
    }
}

/// Averages unit face normals into the vertices flagged in `missing`.
fn smooth_normals(mesh: &mut Mesh, missing: &[bool]) {
    let mut accum = vec![Vec3::ZERO; mesh.vertex_count()];
    let position = |vertices: &[f32], i: usize| Vec3::from_slice(&vertices[i * VERTEX_STRIDE..]);

    for triangle in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        let (pa, pb, pc) = (
            position(&mesh.vertices, a),
            position(&mesh.vertices, b),
            position(&mesh.vertices, c),
        );
        let face = (pb - pa).cross(pc - pa);
        if face.length_squared() > f32::EPSILON {
            let face = face.normalize();
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }
    }

    for (i, normal) in accum.into_iter().enumerate() {
        if !missing[i] {
            continue;
        }
        let normal = normal.normalize_or_zero();
        mesh.vertices[i * VERTEX_STRIDE + 3..i * VERTEX_STRIDE + 6]
            .copy_from_slice(&normal.to_array());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\n# unit quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";

    #[test]
    fn triangulates_polygons() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn generates_unit_normals_when_missing() {
        let mesh = parse_obj(QUAD).unwrap();
        for chunk in mesh.vertices.chunks_exact(VERTEX_STRIDE) {
            let normal = Vec3::from_slice(&chunk[3..]);
            assert!((normal - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn honours_explicit_normals_and_relative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 -1\nf -3//1 -2//1 -1//1\n";
        let mesh = parse_obj(obj).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(&mesh.vertices[3..6], &[0.0, 0.0, -1.0]);
    }

    #[test]
    fn relative_indices_count_back_from_the_face_line() {
        let obj = "o first\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n\
                   o second\nv 10 0 0\nv 11 0 0\nv 10 1 0\nf -3 -2 -1\n";
        let mesh = parse_obj(obj).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        let xs: Vec<f32> = mesh.positions().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 0.0, 10.0, 11.0, 10.0]);
    }

    #[test]
    fn generated_normals_leave_declared_ones_alone() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\nv 1 0 1\nv 0 1 1\nvn 1 0 0\n\
                   f 1//1 2//1 3//1\nf 4 5 6\n";
        let mesh = parse_obj(obj).unwrap();
        let normals: Vec<Vec3> = mesh
            .vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|chunk| Vec3::from_slice(&chunk[3..]))
            .collect();
        assert_eq!(normals.len(), 6);
        for declared in &normals[..3] {
            assert_eq!(*declared, Vec3::X);
        }
        for generated in &normals[3..] {
            assert!((*generated - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn rejects_out_of_range_faces() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n").unwrap_err();
        assert!(format!("{err:#}").contains("out of range"));
    }

    #[test]
    fn reports_bad_lines() {
        let err = parse_obj("v 0 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("invalid vertex on line 1"));
        assert!(parse_obj("# nothing here\n").is_err());
    }
}
