use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use nalgebra::Point2;

use crate::config::IMAGE_SIZE;
use crate::error::CausticError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_size() {
        let raster = Raster::from_points(&[]);
        let mut bytes = Vec::new();
        raster.write_ppm(&mut bytes).unwrap();

        let header = b"P6\n256 256\n255\n";
        assert_eq!(&bytes[..header.len()], header);
        assert_eq!(bytes.len(), header.len() + 256 * 256 * 3);
        assert!(bytes[header.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn points_light_their_pixel() {
        let raster = Raster::from_points(&[Point2::new(3.7, 10.2), Point2::new(255.9, 0.0)]);
        assert!(raster.is_lit(3, 10));
        assert!(raster.is_lit(255, 0));
        assert!(!raster.is_lit(4, 10));
        assert_eq!(raster.lit_count(), 2);

        let mut bytes = Vec::new();
        raster.write_ppm(&mut bytes).unwrap();
        let offset = b"P6\n256 256\n255\n".len() + (10 * 256 + 3) * 3;
        assert_eq!(&bytes[offset..offset + 3], &[255, 255, 255]);
    }

    #[test]
    fn out_of_range_points_are_dropped() {
        let raster = Raster::from_points(&[
            Point2::new(-0.5, 10.0),
            Point2::new(256.0, 10.0),
            Point2::new(10.0, -3.0),
            Point2::new(f64::NAN, 1.0),
        ]);
        assert_eq!(raster.lit_count(), 0);
    }

    #[test]
    fn save_to_unwritable_path_fails() {
        let err = save_ppm("/nonexistent-dir/caustics.ppm", &[]).unwrap_err();
        assert!(matches!(err, CausticError::Export { .. }));
    }
}

/// A square RGB image of the caustic, black except where a ray landed.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pixels: Vec<u8>,
}

impl Raster {
    pub fn from_points(points: &[Point2<f64>]) -> Self {
        let mut pixels = vec![0u8; IMAGE_SIZE * IMAGE_SIZE * 3];
        for point in points {
            if let Some(idx) = pixel_index(point) {
                pixels[idx..idx + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        Self { pixels }
    }

    pub fn is_lit(&self, x: usize, y: usize) -> bool {
        let idx = (y * IMAGE_SIZE + x) * 3;
        self.pixels[idx..idx + 3].iter().any(|&b| b != 0)
    }

    pub fn lit_count(&self) -> usize {
        self.pixels
            .chunks_exact(3)
            .filter(|px| px.iter().any(|&b| b != 0))
            .count()
    }

    /// Writes the raster as a binary PPM (P6).
    pub fn write_ppm<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write!(writer, "P6\n{} {}\n255\n", IMAGE_SIZE, IMAGE_SIZE)?;
        writer.write_all(&self.pixels)?;
        Ok(())
    }
}

fn pixel_index(point: &Point2<f64>) -> Option<usize> {
    let (x, y) = (point.x.floor(), point.y.floor());
    let size = IMAGE_SIZE as f64;
    if !(0.0..size).contains(&x) || !(0.0..size).contains(&y) {
        return None;
    }
    Some((y as usize * IMAGE_SIZE + x as usize) * 3)
}

/// Rasterises `points` and saves them as a PPM image at `path`.
pub fn save_ppm(path: impl AsRef<Path>, points: &[Point2<f64>]) -> Result<(), CausticError> {
    let path = path.as_ref();
    let export_error = |source| CausticError::Export {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(export_error)?;
    let mut writer = BufWriter::new(file);
    Raster::from_points(points)
        .write_ppm(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(export_error)?;

    log::info!("saved {} ({} points)", path.display(), points.len());
    Ok(())
}
