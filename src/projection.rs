//! Projection of refracted rays onto the receiver plane.
//!
//! Three coordinate spaces are involved:
//! - mesh space, in which vertices and the receiver depth are given,
//! - the nominal 256 x 256 space the caustic is drawn and exported in,
//! - screen space, the pixels of the current window.
//!
//! [`NominalMapping`] links the first two and [`nominal_to_screen`] the last two.

use itertools::Itertools;
use nalgebra::{Point2, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::NOMINAL_SIZE;
use crate::error::CausticError;


/// Affine map from mesh-space (x, y) into the nominal 256-unit space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NominalMapping {
    pub scale: f64,
    pub offset: [f64; 2],
}

impl Default for NominalMapping {
    /// Mesh units are display units.
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: [0.0, 0.0],
        }
    }
}

impl NominalMapping {
    pub fn to_nominal(&self, point: Point2<f64>) -> Point2<f64> {
        point * self.scale + Vector2::from(self.offset)
    }
}

/// Pixel dimensions of the window the caustic is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSize {
    pub width: f32,
    pub height: f32,
}

impl WindowSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Intersects each ray `origin + t * direction` with the plane `z = depth`.
///
/// Rays parallel to the plane, and rays whose hit point overflows, are left
/// out; the remaining points keep the order of their rays. The plane may lie
/// on either side of the lens, so negative `t` is accepted.
pub fn intersect(
    origins: &[Point3<f64>],
    directions: &[Vector3<f64>],
    depth: f64,
) -> Result<Vec<Point2<f64>>, CausticError> {
    if origins.len() != directions.len() {
        return Err(CausticError::Projection(format!(
            "{} ray origins but {} directions",
            origins.len(),
            directions.len()
        )));
    }
    if !depth.is_finite() {
        return Err(CausticError::Projection(format!(
            "receiver plane depth must be finite, got {}",
            depth
        )));
    }

    let points: Vec<Point2<f64>> = origins
        .iter()
        .zip_eq(directions)
        .filter(|(_, v)| v.z != 0.0)
        .map(|(p, v)| {
            let t = (depth - p.z) / v.z;
            Point2::new(p.x + t * v.x, p.y + t * v.y)
        })
        .filter(|hit| hit.x.is_finite() && hit.y.is_finite())
        .collect();

    if points.is_empty() && directions.iter().any(|v| v.z != 0.0) {
        return Err(CausticError::Projection(format!(
            "no ray produced a finite intersection at depth {}",
            depth
        )));
    }
    Ok(points)
}

/// [`intersect`] followed by the mesh to nominal mapping.
pub fn project(
    origins: &[Point3<f64>],
    directions: &[Vector3<f64>],
    depth: f64,
    mapping: &NominalMapping,
) -> Result<Vec<Point2<f64>>, CausticError> {
    let points = intersect(origins, directions, depth)?;
    Ok(points.into_iter().map(|p| mapping.to_nominal(p)).collect())
}

/// Scales a nominal point to the pixel grid of `window`.
pub fn nominal_to_screen(point: &Point2<f64>, window: WindowSize) -> (f32, f32) {
    let scale_x = window.width / NOMINAL_SIZE as f32;
    let scale_y = window.height / NOMINAL_SIZE as f32;
    (point.x as f32 * scale_x, point.y as f32 * scale_y)
}
