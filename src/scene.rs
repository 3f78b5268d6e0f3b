//! The lens and its refracted rays, ready to be projected at any depth.

use nalgebra::{Point2, Vector3};

use crate::{
    error::CausticError,
    geom::Mesh,
    projection::{self, NominalMapping},
    snell::{self, TirPolicy},
};


/// A loaded lens with one refracted direction per vertex.
///
/// Refraction happens once on construction; moving the receiver plane only
/// reruns the projection.
#[derive(Debug, Clone)]
pub struct Scene {
    mesh: Mesh,
    directions: Vec<Vector3<f64>>,
    mapping: NominalMapping,
}

impl Scene {
    pub fn new(
        mesh: Mesh,
        refr_index: f64,
        tir_policy: TirPolicy,
        mapping: NominalMapping,
    ) -> Result<Self, CausticError> {
        let directions = snell::refract_all(mesh.normals(), refr_index, tir_policy)?;
        log::info!(
            "refracted {} rays with refractive index {}",
            directions.len(),
            refr_index
        );
        Ok(Self {
            mesh,
            directions,
            mapping,
        })
    }

    /// Caustic points, in nominal coordinates, on the plane `z = depth`.
    pub fn points_at(&self, depth: f64) -> Result<Vec<Point2<f64>>, CausticError> {
        projection::project(self.mesh.vertices(), &self.directions, depth, &self.mapping)
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn directions(&self) -> &[Vector3<f64>] {
        &self.directions
    }
}
