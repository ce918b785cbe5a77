// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error types for mandelsplit.

use failure::Fail;
use std::io;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, MandelError>;

/// Everything that can go wrong while partitioning, computing,
/// gathering, timing, or writing an image.
#[derive(Debug, Fail)]
pub enum MandelError {
    /// A buffer could not be allocated.
    #[fail(display = "could not allocate a buffer of {} cells", cells)]
    AllocationFailed {
        /// Number of cells requested.
        cells: usize,
    },

    /// The index space does not divide evenly across the worker group
    /// and the configuration forbids dropping the remainder.
    #[fail(
        display = "{} indices do not divide evenly across {} workers ({} would be dropped)",
        total, workers, remainder
    )]
    NonDivisible {
        /// Size of the index space.
        total: usize,
        /// Size of the worker group.
        workers: usize,
        /// Indices that no worker would be assigned.
        remainder: usize,
    },

    /// A worker group must have at least one member.
    #[fail(display = "invalid worker count: {}", _0)]
    InvalidWorkers(usize),

    /// A rank outside the worker group.
    #[fail(display = "rank {} is outside a group of {}", rank, size)]
    InvalidRank {
        /// Offending rank.
        rank: usize,
        /// Group size.
        size: usize,
    },

    /// The communication phase took no measurable time.
    #[fail(display = "communication time is zero; the ratio is undefined")]
    ZeroCommunicationTime,

    /// An access past the end of an image buffer.
    #[fail(
        display = "block of {} cells at offset {} exceeds an image of {} cells",
        len, offset, size
    )]
    OutOfBounds {
        /// First cell of the block.
        offset: usize,
        /// Length of the block.
        len: usize,
        /// Total cells in the image.
        size: usize,
    },

    /// The message-passing layer failed.
    #[fail(display = "transport failure: {}", _0)]
    Transport(String),

    /// A worker thread panicked.
    #[fail(display = "worker {} panicked", _0)]
    WorkerPanicked(usize),

    /// The run configuration is unusable.
    #[fail(display = "invalid configuration: {}", _0)]
    Config(String),

    /// An image sink could not encode its output.
    #[fail(display = "image sink failed: {}", _0)]
    Sink(String),

    /// An I/O error while writing output.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for MandelError {
    fn from(err: io::Error) -> Self {
        MandelError::Io(err)
    }
}

impl MandelError {
    /// Transport errors are usually the echo of a failure elsewhere in
    /// the group: a peer hung up because it had already failed.
    pub fn is_transport(&self) -> bool {
        match self {
            MandelError::Transport(_) => true,
            _ => false,
        }
    }
}
