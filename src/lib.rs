#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer split across a worker group
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which `z -> z^2 + c`, started at `z = c`, stays bounded.  The
//! escape-time picture stores, for every pixel, how many iterations
//! its point took to leave the disc of radius two, or the iteration
//! bound if it never did.
//!
//! Every pixel is independent of every other, so the image is split
//! into one contiguous block per worker, each worker computes its
//! block alone, and the blocks are merged on rank 0.  Two splits are
//! offered and timed against each other:
//!
//! * `Strategy::Rows`: whole rows per worker, merged by point-to-point
//!   messages, and reported as computation time, communication time
//!   and their ratio;
//! * `Strategy::Pixels`: a slice of the flattened pixel array per
//!   worker, merged by one collective gather, and reported as total
//!   execution time.
//!
//! Workers are threads that share nothing: every partial image
//! reaches the coordinator as a copy through the `comm` module.

extern crate crossbeam;
extern crate failure;
extern crate image;
extern crate itertools;
extern crate log;
extern crate num;

pub mod comm;
pub mod config;
pub mod error;
pub mod gather;
pub mod kernel;
pub mod partition;
pub mod planes;
pub mod raster;
pub mod run;
pub mod sink;
pub mod timing;

pub use config::{Config, Remainder, Strategy, Viewport};
pub use error::{MandelError, Result};
pub use gather::{MergeOrder, Role};
pub use raster::{PartialImage, Raster};
pub use run::{render_sequential, run, Job, Outcome};
