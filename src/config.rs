// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run configuration.  A `Config` is built once, validated, and then
//! handed by reference to every component; nothing mutates it after
//! construction.

use num::Complex;
use std::fmt;
use std::str::FromStr;

use crate::error::{MandelError, Result};

/// Iteration bound used by both strategies unless told otherwise.
pub const DEFAULT_MAX_ITER: u32 = 1000;

/// The rectangle of the complex plane being rendered.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Left edge.
    pub real_min: f64,
    /// Right edge.
    pub real_max: f64,
    /// Top edge (row 0).
    pub imag_min: f64,
    /// Bottom edge.
    pub imag_max: f64,
}

impl Viewport {
    /// Rejects empty or inverted rectangles.
    pub fn new(real_min: f64, real_max: f64, imag_min: f64, imag_max: f64) -> Result<Viewport> {
        if !(real_min < real_max) {
            return Err(MandelError::Config(
                "the real minimum is not to the left of the real maximum".to_string(),
            ));
        }
        if !(imag_min < imag_max) {
            return Err(MandelError::Config(
                "the imaginary minimum is not below the imaginary maximum".to_string(),
            ));
        }
        Ok(Viewport {
            real_min,
            real_max,
            imag_min,
            imag_max,
        })
    }

    /// Corner mapped to pixel (0, 0).
    pub fn origin(&self) -> Complex<f64> {
        Complex::new(self.real_min, self.imag_min)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            real_min: -2.0,
            real_max: 2.0,
            imag_min: -2.0,
            imag_max: 2.0,
        }
    }
}

/// How work is split across the group.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Contiguous blocks of whole rows, merged by point-to-point messages.
    Rows,
    /// Contiguous blocks of the flattened pixel array, merged by a
    /// collective gather.
    Pixels,
}

impl FromStr for Strategy {
    type Err = MandelError;

    fn from_str(s: &str) -> Result<Strategy> {
        match s {
            "rows" | "row" => Ok(Strategy::Rows),
            "pixels" | "flat" => Ok(Strategy::Pixels),
            _ => Err(MandelError::Config(format!("unknown strategy '{}'", s))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strategy::Rows => write!(f, "rows"),
            Strategy::Pixels => write!(f, "pixels"),
        }
    }
}

/// What to do when the index space does not divide evenly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Remainder {
    /// Refuse to run.
    Reject,
    /// Drop the trailing indices, log a warning, and leave those cells
    /// at zero in the merged image.
    Truncate,
}

/// Resolution, iteration bound, viewport and remainder policy for one run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    width: usize,
    height: usize,
    max_iter: u32,
    viewport: Viewport,
    remainder: Remainder,
}

impl Config {
    /// Builds a validated configuration.  The remainder policy starts
    /// as `Reject`.
    pub fn new(width: usize, height: usize, max_iter: u32, viewport: Viewport) -> Result<Config> {
        if width == 0 || height == 0 {
            return Err(MandelError::Config(format!(
                "image size {}x{} has no pixels",
                width, height
            )));
        }
        if max_iter == 0 {
            return Err(MandelError::Config(
                "the iteration bound must be positive".to_string(),
            ));
        }
        Ok(Config {
            width,
            height,
            max_iter,
            viewport,
            remainder: Remainder::Reject,
        })
    }

    /// The built-in run for each strategy: 800x600 rows, 800x800 pixels.
    pub fn for_strategy(strategy: Strategy) -> Config {
        let height = match strategy {
            Strategy::Rows => 600,
            Strategy::Pixels => 800,
        };
        Config {
            width: 800,
            height,
            max_iter: DEFAULT_MAX_ITER,
            viewport: Viewport::default(),
            remainder: Remainder::Reject,
        }
    }

    /// Replaces the remainder policy.
    pub fn with_remainder(self, remainder: Remainder) -> Config {
        Config { remainder, ..self }
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Iteration bound; also the value stored for points that never escape.
    pub fn max_iter(&self) -> u32 {
        self.max_iter
    }

    /// Region of the complex plane.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Policy for indices left over after integer division.
    pub fn remainder(&self) -> Remainder {
        self.remainder
    }

    /// Total pixels in the image.
    pub fn pixels(&self) -> usize {
        self.width * self.height
    }

    /// Length of the one-dimensional index space a strategy partitions.
    pub fn index_space(&self, strategy: Strategy) -> usize {
        match strategy {
            Strategy::Rows => self.height,
            Strategy::Pixels => self.pixels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_strategy() {
        let rows = Config::for_strategy(Strategy::Rows);
        assert_eq!((rows.width(), rows.height()), (800, 600));
        let pixels = Config::for_strategy(Strategy::Pixels);
        assert_eq!((pixels.width(), pixels.height()), (800, 800));
        assert_eq!(pixels.max_iter(), 1000);
        assert_eq!(pixels.viewport(), Viewport::default());
        assert_eq!(pixels.remainder(), Remainder::Reject);
    }

    #[test]
    fn index_space_depends_on_strategy() {
        let config = Config::new(8, 4, 10, Viewport::default()).unwrap();
        assert_eq!(config.index_space(Strategy::Rows), 4);
        assert_eq!(config.index_space(Strategy::Pixels), 32);
    }

    #[test]
    fn rejects_degenerate_configurations() {
        assert!(Config::new(0, 4, 10, Viewport::default()).is_err());
        assert!(Config::new(4, 4, 0, Viewport::default()).is_err());
        assert!(Viewport::new(1.0, -1.0, -1.0, 1.0).is_err());
        assert!(Viewport::new(-1.0, 1.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("rows".parse::<Strategy>().unwrap(), Strategy::Rows);
        assert_eq!("flat".parse::<Strategy>().unwrap(), Strategy::Pixels);
        assert!("columns".parse::<Strategy>().is_err());
    }
}
