// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time kernel and the loops that apply it to a span of
//! pixels.

use num::Complex;

use crate::error::Result;
use crate::partition::WorkRange;
use crate::planes::{Pixel, PlaneMapper};
use crate::raster::PartialImage;

/// This is our classic iterator function.  Starting from `z = c` it
/// returns the first iteration at which `|z|^2` exceeds 4, or
/// `max_iter` if the point never escapes.
#[inline]
pub fn escape_time(c: Complex<f64>, max_iter: u32) -> u32 {
    let mut z = c;
    for i in 0..max_iter {
        if z.norm_sqr() > 4.0 {
            return i;
        }
        z = z * z + c;
    }
    max_iter
}

/// Fills `out` with the counts for the flat pixel offsets in `span`.
/// `out` must be exactly `span.len()` long.
pub fn render_span(plane: &PlaneMapper, span: WorkRange, max_iter: u32, out: &mut [u32]) {
    debug_assert_eq!(out.len(), span.len());
    let width = plane.width();
    for (cell, index) in out.iter_mut().zip(span.indices()) {
        let point = plane.pixel_to_point(&Pixel(index % width, index / width));
        *cell = escape_time(point, max_iter);
    }
}

/// Allocates and computes one worker's partial image.
pub fn render_partial(plane: &PlaneMapper, span: WorkRange, max_iter: u32) -> Result<PartialImage> {
    let mut partial = PartialImage::new(span)?;
    render_span(plane, span, max_iter, partial.cells_mut());
    Ok(partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Viewport;

    #[test]
    fn origin_never_escapes() {
        assert_eq!(escape_time(Complex::new(0.0, 0.0), 1000), 1000);
    }

    #[test]
    fn far_point_escapes_immediately() {
        assert_eq!(escape_time(Complex::new(2.0, 2.0), 1000), 0);
    }

    #[test]
    fn boundary_of_four_does_not_escape() {
        // 1 -> 2 -> 5: |2|^2 == 4 is still inside, |5|^2 is out.
        assert_eq!(escape_time(Complex::new(1.0, 0.0), 1000), 2);
    }

    #[test]
    fn period_two_cycle_stays_bounded() {
        assert_eq!(escape_time(Complex::new(-1.0, 0.0), 500), 500);
    }

    #[test]
    fn is_deterministic() {
        let c = Complex::new(-0.743_643_887, 0.131_825_904);
        let first = escape_time(c, 5000);
        for _ in 0..10 {
            assert_eq!(escape_time(c, 5000), first);
        }
    }

    #[test]
    fn partial_matches_pointwise_kernel() {
        let plane = PlaneMapper::new(8, 4, Viewport::default());
        let span = WorkRange { start: 10, end: 22 };
        let partial = render_partial(&plane, span, 100).unwrap();
        assert_eq!(partial.len(), 12);
        for (offset, &count) in span.indices().zip(partial.cells()) {
            let pixel = plane.index_to_pixel(offset).unwrap();
            assert_eq!(count, escape_time(plane.pixel_to_point(&pixel), 100));
        }
    }

    #[test]
    fn empty_span_renders_nothing() {
        let plane = PlaneMapper::new(8, 4, Viewport::default());
        let partial = render_partial(&plane, WorkRange { start: 0, end: 0 }, 100).unwrap();
        assert!(partial.is_empty());
    }
}
