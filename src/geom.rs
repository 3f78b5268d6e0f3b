//! Lens mesh loading.
//!
//! A lens is described by a Wavefront OBJ file. Only the vertex positions and
//! their normals matter for refraction, so the loader reduces the file to two
//! index-aligned sequences. Normals can be matched to vertices in two ways:
//!
//! - [`NormalPairing::Sequential`]: the i-th `v` record goes with the i-th `vn`
//!   record. Faces are ignored, so point clouds without faces load fine.
//! - [`NormalPairing::Faces`]: the file is loaded through `tobj` and every
//!   distinct `v//vn` corner referenced by a face becomes one vertex, in
//!   order of first use.

use std::fs;
use std::path::Path;

use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::tag,
    character::complete::{space0, space1},
    combinator::eof,
    multi::many0_count,
    number::complete::double,
    sequence::preceded,
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::error::CausticError;

const MEMORY_SOURCE: &str = "<memory>";

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn sequential_pairs_in_file_order() {
        let text = "\
# lens
v 1.0 2.0 3.0
v 4.0 5.0 6.0
vt 0.5 0.5
vn 0.0 0.0 -1.0
vn 0.0 0.6 -0.8
f 1//1 2//2 1//1
";
        let mesh = Mesh::from_obj_str(text).unwrap();
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.vertices()[1], Point3::new(4.0, 5.0, 6.0));
        assert_eq!(mesh.normals()[1], Vector3::new(0.0, 0.6, -0.8));
    }

    #[test]
    fn homogeneous_and_trailing_components_are_ignored() {
        let text = "v 1 2 3 1.0\nv 1 2 3 0.2 0.3 0.4\nvn 0 0 1   \nvn 0 0 1 # up\n";
        let mesh = Mesh::from_obj_str(text).unwrap();
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.vertices()[0], Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn malformed_number_is_rejected_with_line() {
        let text = "v 1 2 3\nvn 0 zero 1\n";
        let err = Mesh::from_obj_str(text).unwrap_err();
        match err {
            CausticError::Parse { reason, .. } => assert!(reason.contains("line 2"), "{}", reason),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn missing_component_is_rejected() {
        assert!(Mesh::from_obj_str("v 1 2\nvn 0 0 1\n").is_err());
    }

    #[test]
    fn non_finite_value_is_rejected() {
        assert!(Mesh::from_obj_str("v 1 2 nan\nvn 0 0 1\n").is_err());
        assert!(Mesh::from_obj_str("v 1 2 3\nvn 0 inf 1\n").is_err());
    }

    #[test]
    fn vertex_without_normal_is_rejected() {
        let err = Mesh::from_obj_str("v 1 2 3\nv 4 5 6\nvn 0 0 1\n").unwrap_err();
        assert!(matches!(err, CausticError::Parse { .. }));
    }

    #[test]
    fn empty_mesh_is_rejected() {
        assert!(matches!(
            Mesh::from_obj_str("# nothing here\n"),
            Err(CausticError::Parse { .. })
        ));
    }

    #[test]
    fn crlf_line_endings() {
        let mesh = Mesh::from_obj_str("v 1 2 3\r\nvn 0 0 -1\r\n").unwrap();
        assert_eq!(mesh.normals()[0], Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let err = Mesh::from_file("does/not/exist.obj", NormalPairing::Sequential).unwrap_err();
        assert!(matches!(err, CausticError::Parse { .. }));
    }

    #[test]
    fn new_checks_lengths() {
        assert!(matches!(
            Mesh::new(vec![Point3::origin()], vec![]),
            Err(CausticError::Parse { .. })
        ));
        assert!(matches!(
            Mesh::new(vec![], vec![]),
            Err(CausticError::Parse { .. })
        ));
        assert!(Mesh::new(vec![Point3::origin()], vec![Vector3::z()]).is_ok());
    }
}

/// How vertex normals are matched to vertex positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NormalPairing {
    /// i-th `v` record with the i-th `vn` record.
    #[default]
    Sequential,
    /// Through the `v//vn` references of the faces. Vertices come out in
    /// order of first use by a face, and `v` records no face uses are dropped.
    Faces,
}

/// Vertex positions of a lens surface with one normal per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    normals: Vec<Vector3<f64>>,
}

enum Record {
    Position(Point3<f64>),
    Normal(Vector3<f64>),
}

impl Mesh {
    /// Builds a mesh from already paired data. Violations are reported as
    /// [`CausticError::Parse`] against `<memory>`, the same as for text input.
    pub fn new(
        vertices: Vec<Point3<f64>>,
        normals: Vec<Vector3<f64>>,
    ) -> Result<Self, CausticError> {
        check_pairing(vertices.len(), normals.len())
            .map_err(|r| CausticError::parse(Path::new(MEMORY_SOURCE), r))?;
        Ok(Self { vertices, normals })
    }

    pub fn from_file(path: impl AsRef<Path>, pairing: NormalPairing) -> Result<Self, CausticError> {
        let path = path.as_ref();
        let mesh = match pairing {
            NormalPairing::Sequential => {
                let text = fs::read_to_string(path)
                    .map_err(|e| CausticError::parse(path, e.to_string()))?;
                Self::parse_sequential(&text, path)?
            }
            NormalPairing::Faces => Self::load_faces(path)?,
        };
        log::info!(
            "loaded {} vertices with normals from {}",
            mesh.len(),
            path.display()
        );
        Ok(mesh)
    }

    /// Parses OBJ text with sequential pairing.
    pub fn from_obj_str(text: &str) -> Result<Self, CausticError> {
        Self::parse_sequential(text, Path::new(MEMORY_SOURCE))
    }

    fn parse_sequential(text: &str, path: &Path) -> Result<Self, CausticError> {
        let mut vertices = Vec::new();
        let mut normals = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let keyword = line.split_whitespace().next().unwrap_or_default();
            let parsed = match keyword {
                "v" => position(line),
                "vn" => normal(line),
                _ => continue,
            };
            let record = match parsed {
                Ok((_, record)) => record,
                Err(_) => {
                    return Err(CausticError::parse(
                        path,
                        format!("malformed `{}` record on line {}", keyword, number + 1),
                    ))
                }
            };
            match record {
                Record::Position(p) if p.coords.iter().all(|c| c.is_finite()) => vertices.push(p),
                Record::Normal(n) if n.iter().all(|c| c.is_finite()) => normals.push(n),
                _ => {
                    return Err(CausticError::parse(
                        path,
                        format!("non-finite value on line {}", number + 1),
                    ))
                }
            }
        }

        check_pairing(vertices.len(), normals.len()).map_err(|r| CausticError::parse(path, r))?;
        Ok(Self { vertices, normals })
    }

    fn load_faces(path: &Path) -> Result<Self, CausticError> {
        let options = tobj::LoadOptions {
            single_index: true,
            ..Default::default()
        };
        let (models, _) =
            tobj::load_obj(path, &options).map_err(|e| CausticError::parse(path, e.to_string()))?;

        let mut vertices = Vec::new();
        let mut normals = Vec::new();

        for m in models.iter() {
            let mesh = &m.mesh;
            if mesh.normals.len() != mesh.positions.len() {
                return Err(CausticError::parse(
                    path,
                    format!("model `{}` does not give every face corner a normal", m.name),
                ));
            }
            for vtx in 0..mesh.positions.len() / 3 {
                vertices.push(Point3::new(
                    mesh.positions[3 * vtx],
                    mesh.positions[3 * vtx + 1],
                    mesh.positions[3 * vtx + 2],
                ));
                normals.push(Vector3::new(
                    mesh.normals[3 * vtx],
                    mesh.normals[3 * vtx + 1],
                    mesh.normals[3 * vtx + 2],
                ));
            }
        }

        check_pairing(vertices.len(), normals.len()).map_err(|r| CausticError::parse(path, r))?;
        Ok(Self { vertices, normals })
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Number of vertices, which is also the number of normals.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

fn check_pairing(num_vertices: usize, num_normals: usize) -> Result<(), String> {
    if num_vertices == 0 {
        return Err("no vertex records found".to_string());
    }
    if num_vertices != num_normals {
        return Err(format!(
            "{} vertices but {} normals, every vertex needs exactly one normal",
            num_vertices, num_normals
        ));
    }
    Ok(())
}

fn component(input: &str) -> IResult<&str, f64> {
    preceded(space1, double)(input)
}

fn triple(input: &str) -> IResult<&str, [f64; 3]> {
    let (input, x) = component(input)?;
    let (input, y) = component(input)?;
    let (input, z) = component(input)?;
    Ok((input, [x, y, z]))
}

/// `v x y z [w]`, plus any trailing per-vertex colour some exporters append.
fn position(input: &str) -> IResult<&str, Record> {
    let (input, _) = tag("v")(input)?;
    let (input, [x, y, z]) = triple(input)?;
    let (input, _) = many0_count(component)(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = eof(input)?;
    Ok((input, Record::Position(Point3::new(x, y, z))))
}

fn normal(input: &str) -> IResult<&str, Record> {
    let (input, _) = tag("vn")(input)?;
    let (input, [x, y, z]) = triple(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = eof(input)?;
    Ok((input, Record::Normal(Vector3::new(x, y, z))))
}
