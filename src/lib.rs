//! Caustics of refractive lenses.
//!
//! A lens mesh is loaded from a Wavefront OBJ file, light arriving along `+z`
//! is refracted at every vertex with Snell's law, and the refracted rays are
//! projected onto a receiver plane to form the caustic.

pub mod config;
pub mod error;
pub mod geom;
#[cfg(feature = "visualization")]
pub mod helpers;
pub mod output;
pub mod palette;
pub mod projection;
pub mod scene;
pub mod session;
pub mod settings;
pub mod snell;
