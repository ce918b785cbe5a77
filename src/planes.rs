// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and the viewport rectangle on the complex plane.  Pixel (0, 0)
//! lands on the viewport's minimum corner; pixel (width, height), one
//! past the last pixel, would land on its maximum corner.
use num::Complex;

use crate::config::{Config, Viewport};

/// Describes the x, y of a pixel in the image.  Column first.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps pixels, and flat row-major pixel indices, onto the complex
/// plane.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    width: usize,
    height: usize,
    viewport: Viewport,
    // Width and height of the viewport.
    span: (f64, f64),
}

impl PlaneMapper {
    /// Takes the resolution and the viewport.  Both are assumed valid;
    /// `Config` has already checked them.
    pub fn new(width: usize, height: usize, viewport: Viewport) -> PlaneMapper {
        PlaneMapper {
            width,
            height,
            viewport,
            span: (
                viewport.real_max - viewport.real_min,
                viewport.imag_max - viewport.imag_min,
            ),
        }
    }

    /// The mapper for a run configuration.
    pub fn from_config(config: &Config) -> PlaneMapper {
        PlaneMapper::new(config.width(), config.height(), config.viewport())
    }

    /// The total number of pixels in the integral grid.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Given a pixel on the integral cartesian plane, return the
    /// corresponding point on the complex plane.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.viewport.real_min + self.span.0 * (pixel.0 as f64) / (self.width as f64),
            self.viewport.imag_min + self.span.1 * (pixel.1 as f64) / (self.height as f64),
        )
    }

    /// Turns a flat row-major offset back into a pixel, or `None` if
    /// the offset lies past the end of the image.
    #[inline]
    pub fn index_to_pixel(&self, index: usize) -> Option<Pixel> {
        if index >= self.len() {
            return None;
        }
        Some(Pixel(index % self.width, index / self.width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(width: usize, height: usize, viewport: (f64, f64, f64, f64)) -> PlaneMapper {
        let viewport = Viewport::new(viewport.0, viewport.1, viewport.2, viewport.3).unwrap();
        PlaneMapper::new(width, height, viewport)
    }

    #[test]
    fn pixel_to_point_on_positive_planes() {
        let pm = mapper(5, 5, (0.0, 5.0, 0.0, 5.0));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(2.0, 2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(4.0, 4.0));
    }

    #[test]
    fn pixel_to_points_on_mixed_planes() {
        let pm = mapper(4, 4, (-2.0, 2.0, -2.0, 2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(2.0, 2.0));
    }

    #[test]
    fn non_square_planes_scale_each_axis() {
        let pm = mapper(800, 600, (-2.0, 2.0, -2.0, 2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(400, 300)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(200, 150)), Complex::new(-1.0, -1.0));
    }

    #[test]
    fn index_to_pixel_is_row_major() {
        let pm = mapper(4, 3, (-2.0, 2.0, -2.0, 2.0));
        assert_eq!(pm.index_to_pixel(0), Some(Pixel(0, 0)));
        assert_eq!(pm.index_to_pixel(5), Some(Pixel(1, 1)));
        assert_eq!(pm.index_to_pixel(11), Some(Pixel(3, 2)));
        assert_eq!(pm.index_to_pixel(12), None);
    }
}
