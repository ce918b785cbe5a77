// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Static work partitioning.
//!
//! Each rank gets one contiguous block of the index space: whole rows
//! for `Strategy::Rows`, flat pixel offsets for `Strategy::Pixels`.
//! Block size is plain integer division, so when the group size does
//! not divide the index space the tail is assigned to nobody.  The
//! `Plan` decides, once, whether that is acceptable.

use log::warn;
use std::ops::Range;

use crate::config::{Config, Remainder, Strategy};
use crate::error::{MandelError, Result};

/// A half-open range of indices, either rows or flat pixel offsets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WorkRange {
    /// First index owned.
    pub start: usize,
    /// One past the last index owned.
    pub end: usize,
}

impl WorkRange {
    /// Number of indices in the range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when the range owns nothing.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The range as a std `Range`, for iteration.
    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Rank `rank` of `workers` owns rows `[r * block, (r + 1) * block)`
/// with `block = height / workers`.
pub fn row_partition(rank: usize, workers: usize, height: usize) -> WorkRange {
    block_partition(rank, height / workers)
}

/// Rank `rank` of `workers` owns pixels `[r * block, (r + 1) * block)`
/// with `block = pixels / workers`.
pub fn flat_partition(rank: usize, workers: usize, pixels: usize) -> WorkRange {
    block_partition(rank, pixels / workers)
}

#[inline]
fn block_partition(rank: usize, block: usize) -> WorkRange {
    WorkRange {
        start: rank * block,
        end: (rank + 1) * block,
    }
}

/// The partition of one run: configuration, strategy and group size,
/// checked once up front.
#[derive(Copy, Clone, Debug)]
pub struct Plan {
    config: Config,
    strategy: Strategy,
    workers: usize,
}

impl Plan {
    /// Validates the group size and the remainder policy.  With
    /// `Remainder::Reject` an uneven split is an error; with
    /// `Remainder::Truncate` it is logged and allowed.
    pub fn new(config: &Config, strategy: Strategy, workers: usize) -> Result<Plan> {
        if workers == 0 {
            return Err(MandelError::InvalidWorkers(workers));
        }
        let plan = Plan {
            config: *config,
            strategy,
            workers,
        };
        let total = config.index_space(strategy);
        let remainder = total % workers;
        if remainder != 0 {
            match config.remainder() {
                Remainder::Reject => {
                    return Err(MandelError::NonDivisible {
                        total,
                        workers,
                        remainder,
                    })
                }
                Remainder::Truncate => {
                    let dropped = plan.unassigned();
                    warn!(
                        "{} {} left over across {} workers; pixels {}..{} will not be computed",
                        remainder,
                        match strategy {
                            Strategy::Rows => "rows",
                            Strategy::Pixels => "pixels",
                        },
                        workers,
                        dropped.start,
                        dropped.end
                    );
                }
            }
        }
        Ok(plan)
    }

    /// The configuration this plan partitions.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The distribution strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Size of the worker group.
    pub fn workers(&self) -> usize {
        self.workers
    }

    fn check_rank(&self, rank: usize) -> Result<()> {
        if rank >= self.workers {
            return Err(MandelError::InvalidRank {
                rank,
                size: self.workers,
            });
        }
        Ok(())
    }

    /// The indices a rank owns, in the strategy's own units.
    pub fn range(&self, rank: usize) -> Result<WorkRange> {
        self.check_rank(rank)?;
        Ok(match self.strategy {
            Strategy::Rows => row_partition(rank, self.workers, self.config.height()),
            Strategy::Pixels => flat_partition(rank, self.workers, self.config.pixels()),
        })
    }

    /// The flat pixel offsets a rank owns.  For rows this is the row
    /// block scaled by the image width.
    pub fn pixel_span(&self, rank: usize) -> Result<WorkRange> {
        let range = self.range(rank)?;
        Ok(match self.strategy {
            Strategy::Rows => WorkRange {
                start: range.start * self.config.width(),
                end: range.end * self.config.width(),
            },
            Strategy::Pixels => range,
        })
    }

    /// Pixels in every rank's block.
    pub fn block_pixels(&self) -> usize {
        match self.strategy {
            Strategy::Rows => (self.config.height() / self.workers) * self.config.width(),
            Strategy::Pixels => self.config.pixels() / self.workers,
        }
    }

    /// Pixels covered by the union of all blocks; always a prefix of
    /// the image.
    pub fn covered_pixels(&self) -> usize {
        self.block_pixels() * self.workers
    }

    /// Pixel offsets no rank computes.  Empty when the split is even.
    pub fn unassigned(&self) -> Range<usize> {
        self.covered_pixels()..self.config.pixels()
    }
}
