// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Output for a merged raster: an ASCII dump, a binary PGM with the
//! iteration bound as its scale, or any format the `image` crate can
//! write.

use image::ColorType;
use num::clamp;
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{MandelError, Result};
use crate::raster::{reserve_bytes, Raster};

/// Something that consumes a finished image.
pub trait ImageSink {
    /// Writes the whole raster.  `max_iter` is the value stored for
    /// points that never escaped.
    fn render(&mut self, raster: &Raster, max_iter: u32) -> Result<()>;
}

/// The terminal glyph for one cell: blank inside the set, otherwise
/// the last decimal digit of the escape iteration.
pub fn glyph(cell: u32, max_iter: u32) -> char {
    if cell == max_iter {
        ' '
    } else {
        (b'0' + (cell % 10) as u8) as char
    }
}

/// Writes one glyph per cell, one line per row.
pub struct AsciiSink<W: Write> {
    out: W,
}

impl<W: Write> AsciiSink<W> {
    /// Wraps a writer, usually stdout.
    pub fn new(out: W) -> Self {
        AsciiSink { out }
    }

    /// Gives the writer back.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ImageSink for AsciiSink<W> {
    fn render(&mut self, raster: &Raster, max_iter: u32) -> Result<()> {
        let mut line = String::with_capacity(raster.width() + 1);
        for row in raster.rows() {
            line.clear();
            line.extend(row.iter().map(|&cell| glyph(cell, max_iter)));
            line.push('\n');
            self.out.write_all(line.as_bytes())?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// The header of a binary graymap.
pub fn pgm_header(width: usize, height: usize, maxval: u32) -> String {
    format!("P5\n{} {}\n{}\n", width, height, maxval)
}

/// Writes a binary PGM whose maximum sample value is `max_iter - 1`.
/// Samples are clamped to that maximum and stored as one byte when it
/// fits, otherwise as two bytes, most significant first.
pub struct PgmSink<W: Write> {
    out: W,
}

impl PgmSink<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(PgmSink::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> PgmSink<W> {
    /// Wraps a writer.
    pub fn new(out: W) -> Self {
        PgmSink { out }
    }

    /// Gives the writer back.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ImageSink for PgmSink<W> {
    fn render(&mut self, raster: &Raster, max_iter: u32) -> Result<()> {
        let maxval = max_iter.saturating_sub(1);
        if maxval == 0 || maxval > u32::from(u16::max_value()) {
            return Err(MandelError::Sink(format!(
                "a PGM cannot hold a maximum sample of {}",
                maxval
            )));
        }
        self.out
            .write_all(pgm_header(raster.width(), raster.height(), maxval).as_bytes())?;

        let wide = maxval > u32::from(u8::max_value());
        let sample_size = if wide { 2 } else { 1 };
        let body_len = raster.len().checked_mul(sample_size).ok_or_else(|| {
            MandelError::AllocationFailed {
                cells: raster.len(),
            }
        })?;
        let mut body = reserve_bytes(body_len)?;
        for &cell in raster.cells() {
            let sample = cell.min(maxval);
            if wide {
                body.extend_from_slice(&(sample as u16).to_be_bytes());
            } else {
                body.push(sample as u8);
            }
        }
        self.out.write_all(&body)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Writes an 8-bit grayscale image through the `image` crate, in
/// whatever format the file extension names.  Escaped points are
/// scaled onto 0..=255; points inside the set are black.
pub struct GraySink {
    path: PathBuf,
}

impl GraySink {
    /// Output goes to `path` on render.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        GraySink {
            path: path.as_ref().to_path_buf(),
        }
    }
}

fn image_dimension(pixels: usize) -> Result<u32> {
    u32::try_from(pixels)
        .map_err(|_| MandelError::Sink(format!("{} pixels is too large for an image side", pixels)))
}

/// Brightness of one cell in an 8-bit image.
pub fn shade(cell: u32, max_iter: u32) -> u8 {
    if cell >= max_iter {
        return 0;
    }
    clamp(u64::from(cell) * 256 / u64::from(max_iter), 0, 255) as u8
}

impl ImageSink for GraySink {
    fn render(&mut self, raster: &Raster, max_iter: u32) -> Result<()> {
        let width = image_dimension(raster.width())?;
        let height = image_dimension(raster.height())?;
        let mut pixels = reserve_bytes(raster.len())?;
        pixels.extend(raster.cells().iter().map(|&cell| shade(cell, max_iter)));
        image::save_buffer(&self.path, &pixels, width, height, ColorType::Gray(8))
            .map_err(|e| MandelError::Sink(format!("{}: {}", self.path.display(), e)))
    }
}

/// Picks the sink for an output path: `.pgm` gets the PGM writer, any
/// other extension goes to the `image` crate.
pub fn sink_for_path(path: &Path) -> Result<Box<dyn ImageSink>> {
    let is_pgm = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pgm"))
        .unwrap_or(false);
    if is_pgm {
        Ok(Box::new(PgmSink::create(path)?))
    } else {
        Ok(Box::new(GraySink::new(path)))
    }
}
