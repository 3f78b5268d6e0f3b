use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::config::NOMINAL_SIZE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_ignores_position() {
        let scheme = ColorScheme::White;
        assert_eq!(scheme.rgb(&Point2::new(3.0, 200.0), 5, 10), [255, 255, 255]);
    }

    #[test]
    fn gradient_follows_position_and_index() {
        let scheme = ColorScheme::Gradient;
        assert_eq!(scheme.rgb(&Point2::new(0.0, 256.0), 0, 4), [0, 255, 0]);
        assert_eq!(scheme.rgb(&Point2::new(128.0, 64.0), 2, 4), [127, 63, 127]);
    }

    #[test]
    fn gradient_clamps_out_of_range_points() {
        let scheme = ColorScheme::Gradient;
        assert_eq!(scheme.rgb(&Point2::new(-40.0, 900.0), 3, 3), [0, 255, 255]);
    }
}

/// How intersection points are coloured on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Every point white.
    White,
    /// Red from x, green from y, blue from the point's index.
    #[default]
    Gradient,
}

impl ColorScheme {
    /// Colour of the `index`-th of `count` points.
    pub fn rgb(&self, point: &Point2<f64>, index: usize, count: usize) -> [u8; 3] {
        match self {
            ColorScheme::White => [255, 255, 255],
            ColorScheme::Gradient => {
                let fraction = if count == 0 {
                    0.0
                } else {
                    index as f64 / count as f64
                };
                [
                    channel(point.x / NOMINAL_SIZE),
                    channel(point.y / NOMINAL_SIZE),
                    channel(fraction),
                ]
            }
        }
    }
}

fn channel(fraction: f64) -> u8 {
    (fraction * 255.0).clamp(0.0, 255.0) as u8
}
