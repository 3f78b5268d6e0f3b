//! Vector form of Snell's law for per-vertex refraction.
//!
//! Light arrives along `+z` and crosses the lens surface at every vertex. The
//! surface normal at the vertex decides how strongly the ray bends; the
//! refractive index `eta` is the ratio of the lens medium's index to that of
//! the incident medium.
//!
//! The refraction system provides:
//! - Refraction of a single normal with explicit failure reasons
//! - Batch refraction of a whole mesh with the failing vertex reported
//! - A configurable policy for total internal reflection
//!
//! # Mathematical Foundation
//!
//! For a unit outward normal `n` and incident direction `d`:
//! - `cos θi = -n·d`
//! - `sin² θt = (1/η)² (1 - cos² θi)`
//! - `r = d/η + (cos θi / η - cos θt) n`, then normalised

use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::config::DEGENERATE_LENGTH;
use crate::error::CausticError;

#[cfg(test)]
mod tests {

    use super::*;

    const ETA: f64 = 1.457;

    #[test]
    fn normal_incidence_does_not_bend() {
        for eta in [0.5, 1.0, 1.31, ETA, 2.4] {
            let r = refract(&Vector3::new(0.0, 0.0, -1.0), eta, TirPolicy::Abort).unwrap();
            assert!((r - incident()).norm() < 1e-12, "eta {}: {}", eta, r);
        }
    }

    #[test]
    fn normal_along_ray_reverses_it() {
        let r = refract(&Vector3::z(), ETA, TirPolicy::Abort).unwrap();
        assert!((r - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-12, "{}", r);
    }

    #[test]
    fn outward_normal_is_used_as_given() {
        let n = Vector3::new(0.2, 0.0, 1.0);
        let r = refract(&n, ETA, TirPolicy::Abort).unwrap();

        // r = d/eta + (cos_i/eta - cos_t) n with cos_i = -n.d, no reorientation
        let n = n.normalize();
        let cos_i = -n.dot(&incident());
        let sin2_t = (1.0 - cos_i * cos_i) / (ETA * ETA);
        let cos_t = (1.0 - sin2_t).sqrt();
        let expected = (incident() / ETA + (cos_i / ETA - cos_t) * n).normalize();
        assert!((r - expected).norm() < 1e-12, "{} vs {}", r, expected);
        assert!((r - Vector3::new(-0.3263, 0.0, -0.9453)).norm() < 1e-3, "{}", r);
    }

    #[test]
    fn same_media_passes_straight_through() {
        let n = Vector3::new(0.3, -0.2, -1.0).normalize();
        let r = refract(&n, 1.0, TirPolicy::Abort).unwrap();
        assert!((r - incident()).norm() < 1e-12);
    }

    #[test]
    fn angle30_incidence() {
        // normal tilted by 30 degrees in the xz plane
        let theta_i = 30f64.to_radians();
        let n = Vector3::new(theta_i.sin(), 0.0, -theta_i.cos());
        let eta = 1.31;
        let r = refract(&n, eta, TirPolicy::Abort).unwrap();

        let cos_t = r.dot(&-n);
        let theta_t = cos_t.acos();
        // sin(theta_i) = eta * sin(theta_t)
        assert!((theta_i.sin() - eta * theta_t.sin()).abs() < 1e-9);
        assert!((theta_t - 0.3916126).abs() < 1e-6, "theta_t: {}", theta_t);
    }

    #[test]
    fn outputs_are_unit_length() {
        let normals: Vec<Vector3<f64>> = (0..50)
            .map(|i| {
                let a = i as f64 * 0.05;
                Vector3::new(a.cos() * 0.7, a.sin() * 0.4, -1.0)
            })
            .collect();
        let refracted = refract_all(&normals, ETA, TirPolicy::Abort).unwrap();
        assert_eq!(refracted.len(), normals.len());
        for r in refracted {
            assert!((r.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn bends_towards_normal_entering_denser_medium() {
        let n = Vector3::new(0.5, 0.0, -1.0).normalize();
        let r = refract(&n, ETA, TirPolicy::Abort).unwrap();
        // the transmitted ray keeps travelling forward but is deflected
        assert!(r.z > 0.0);
        assert!(r.x < 0.0);
    }

    #[test]
    fn total_internal_reflection_aborts() {
        let n = Vector3::new(1.0, 0.0, -0.2).normalize();
        let err = refract(&n, 0.5, TirPolicy::Abort).unwrap_err();
        assert_eq!(err, Failure::TotalInternalReflection);

        let err = refract_all(&[Vector3::new(0.0, 0.0, -1.0), n], 0.5, TirPolicy::Abort)
            .unwrap_err();
        assert!(matches!(
            err,
            CausticError::Refraction { index: Some(1), .. }
        ));
    }

    #[test]
    fn total_internal_reflection_clamps_to_grazing() {
        let n = Vector3::new(1.0, 0.0, -0.2).normalize();
        let r = refract(&n, 0.5, TirPolicy::Clamp).unwrap();
        assert!((r.norm() - 1.0).abs() < 1e-12);
        // grazing: perpendicular to the normal
        assert!(r.dot(&n).abs() < 1e-9);
    }

    #[test]
    fn degenerate_and_non_finite_normals_fail() {
        assert_eq!(
            refract(&Vector3::zeros(), ETA, TirPolicy::Abort),
            Err(Failure::Degenerate)
        );
        assert_eq!(
            refract(&Vector3::new(f64::NAN, 0.0, -1.0), ETA, TirPolicy::Abort),
            Err(Failure::NonFinite)
        );
    }

    #[test]
    fn empty_input_and_bad_index_fail() {
        assert!(matches!(
            refract_all(&[], ETA, TirPolicy::Abort),
            Err(CausticError::Refraction { index: None, .. })
        ));
        for eta in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert!(refract_all(&[Vector3::z()], eta, TirPolicy::Abort).is_err());
        }
    }
}

/// What to do when a vertex would totally internally reflect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TirPolicy {
    /// Fail the whole refraction pass, naming the vertex.
    #[default]
    Abort,
    /// Clamp `sin θt` to 1 so the ray leaves along the surface.
    Clamp,
}

/// Why a single normal could not be refracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NonFinite,
    Degenerate,
    TotalInternalReflection,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::NonFinite => write!(f, "normal has non-finite components"),
            Failure::Degenerate => write!(f, "degenerate direction"),
            Failure::TotalInternalReflection => write!(f, "total internal reflection"),
        }
    }
}

/// Direction of the light arriving at the lens.
pub fn incident() -> Vector3<f64> {
    Vector3::z()
}

/// Refracts the incident ray at a surface with the given normal.
///
/// **Context**: Each vertex of the lens refracts the collimated incoming light
/// independently. The normal may come straight from a mesh file, so it is not
/// trusted to be unit length. It is taken to point outward and is never
/// reoriented, so a normal along `+z` sends the ray back along `-z`.
///
/// **How it Works**: Normalises the normal, then applies the vector form of
/// Snell's law. A negative discriminant is total internal reflection and is handled
/// according to `policy`. The result is normalised with a guard against
/// near-zero length so no NaN escapes.
pub fn refract(normal: &Vector3<f64>, eta: f64, policy: TirPolicy) -> Result<Vector3<f64>, Failure> {
    if !normal.iter().all(|c| c.is_finite()) {
        return Err(Failure::NonFinite);
    }
    let length = normal.norm();
    if length < DEGENERATE_LENGTH {
        return Err(Failure::Degenerate);
    }

    let d = incident();
    let n = normal / length;

    let ratio = 1.0 / eta;
    let cos_i = -n.dot(&d);
    let mut sin2_t = ratio * ratio * (1.0 - cos_i * cos_i);
    if sin2_t > 1.0 {
        match policy {
            TirPolicy::Abort => return Err(Failure::TotalInternalReflection),
            TirPolicy::Clamp => sin2_t = 1.0,
        }
    }
    let cos_t = (1.0 - sin2_t).sqrt();

    let refracted = ratio * d + (ratio * cos_i - cos_t) * n;
    refracted
        .try_normalize(DEGENERATE_LENGTH)
        .ok_or(Failure::Degenerate)
}

/// Refracts every normal of a mesh, preserving order.
///
/// Fails if `normals` is empty, if `eta` is not a finite positive number, or
/// as soon as any single normal fails.
pub fn refract_all(
    normals: &[Vector3<f64>],
    eta: f64,
    policy: TirPolicy,
) -> Result<Vec<Vector3<f64>>, CausticError> {
    if normals.is_empty() {
        return Err(CausticError::Refraction {
            index: None,
            reason: "no normals to refract".to_string(),
        });
    }
    if !(eta.is_finite() && eta > 0.0) {
        return Err(CausticError::Refraction {
            index: None,
            reason: format!("refractive index must be finite and positive, got {}", eta),
        });
    }

    normals
        .iter()
        .enumerate()
        .map(|(index, normal)| {
            refract(normal, eta, policy).map_err(|failure| CausticError::Refraction {
                index: Some(index),
                reason: failure.to_string(),
            })
        })
        .collect()
}
