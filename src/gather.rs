// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Merging partial images into one raster on the coordinator.
//!
//! The row strategy merges with point-to-point messages: each
//! contributor sends its block once, and the coordinator drops each
//! block into the raster at `rank * block`.  The pixel strategy hands
//! the raster's covered prefix to a collective gather.  Either way the
//! position of a block depends only on its sender's rank, so the order
//! in which blocks arrive cannot change the result.

use log::debug;

use crate::comm::{Communicator, Tag};
use crate::config::Strategy;
use crate::error::{MandelError, Result};
use crate::partition::Plan;
use crate::raster::{PartialImage, Raster};

/// Rank of the worker that owns the merged image.
pub const COORDINATOR: usize = 0;

/// What a worker does during the merge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    /// Rank 0: receives every block and owns the result.
    Coordinator,
    /// Every other rank: sends its block and is done.
    Contributor,
}

impl Role {
    /// The role a rank plays.
    pub fn of(rank: usize) -> Role {
        if rank == COORDINATOR {
            Role::Coordinator
        } else {
            Role::Contributor
        }
    }
}

/// The order in which the coordinator accepts point-to-point blocks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MergeOrder {
    /// Strictly increasing rank.
    Ranked,
    /// Whichever contributor is ready first.
    Completion,
}

/// Merges with the method that matches the plan's strategy.  The
/// coordinator gets `Some(raster)`; contributors get `None`.
pub fn gather<C: Communicator>(
    comm: &C,
    plan: &Plan,
    partial: &PartialImage,
    order: MergeOrder,
) -> Result<Option<Raster>> {
    match plan.strategy() {
        Strategy::Rows => gather_point_to_point(comm, plan, partial, order),
        Strategy::Pixels => gather_collective(comm, plan, partial),
    }
}

/// Contributors send their whole block to the coordinator exactly
/// once.  The coordinator places its own block, then receives the
/// others straight into the raster.
pub fn gather_point_to_point<C: Communicator>(
    comm: &C,
    plan: &Plan,
    partial: &PartialImage,
    order: MergeOrder,
) -> Result<Option<Raster>> {
    check_group(comm, plan, partial)?;
    if Role::of(comm.rank()) == Role::Contributor {
        comm.send(COORDINATOR, Tag::Block, partial.cells())?;
        return Ok(None);
    }

    let config = plan.config();
    let block = plan.block_pixels();
    let mut raster = Raster::new(config.width(), config.height())?;
    raster.place(partial)?;

    let contributors = (0..comm.size()).filter(|&rank| rank != COORDINATOR);
    match order {
        MergeOrder::Ranked => {
            for rank in contributors {
                let slot = raster.block_mut(rank * block, block)?;
                comm.recv_into(rank, Tag::Block, slot)?;
                debug!("merged block from rank {}", rank);
            }
        }
        MergeOrder::Completion => {
            let mut pending: Vec<usize> = contributors.collect();
            while !pending.is_empty() {
                let (rank, cells) = comm.recv_any(&pending, Tag::Block)?;
                if cells.len() != block {
                    return Err(MandelError::Transport(format!(
                        "rank {} sent {} cells, expected {}",
                        rank,
                        cells.len(),
                        block
                    )));
                }
                raster.block_mut(rank * block, block)?.copy_from_slice(&cells);
                pending.retain(|&r| r != rank);
                debug!("merged block from rank {}, {} outstanding", rank, pending.len());
            }
        }
    }
    Ok(Some(raster))
}

/// Every rank contributes its block to one collective gather; the
/// coordinator's receive buffer is the covered prefix of the raster.
pub fn gather_collective<C: Communicator>(
    comm: &C,
    plan: &Plan,
    partial: &PartialImage,
) -> Result<Option<Raster>> {
    check_group(comm, plan, partial)?;
    match Role::of(comm.rank()) {
        Role::Contributor => {
            comm.gather(COORDINATOR, partial.cells(), None)?;
            Ok(None)
        }
        Role::Coordinator => {
            let config = plan.config();
            let mut raster = Raster::new(config.width(), config.height())?;
            {
                let recv = raster.block_mut(0, plan.covered_pixels())?;
                comm.gather(COORDINATOR, partial.cells(), Some(recv))?;
            }
            debug!("collective gather merged {} cells", plan.covered_pixels());
            Ok(Some(raster))
        }
    }
}

fn check_group<C: Communicator>(comm: &C, plan: &Plan, partial: &PartialImage) -> Result<()> {
    if comm.size() != plan.workers() {
        return Err(MandelError::Transport(format!(
            "group of {} cannot merge a plan for {} workers",
            comm.size(),
            plan.workers()
        )));
    }
    if partial.span() != plan.pixel_span(comm.rank())? {
        return Err(MandelError::Transport(format!(
            "rank {} holds a partial image for the wrong span",
            comm.rank()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::launch;
    use crate::config::{Config, Remainder, Viewport};
    use crate::kernel::render_partial;
    use crate::planes::PlaneMapper;
    use crate::run::render_sequential;

    fn merge(plan: &Plan, order: MergeOrder) -> Raster {
        let plane = PlaneMapper::from_config(plan.config());
        let results = launch(plan.workers(), |comm| -> Result<Option<Raster>> {
            let span = plan.pixel_span(comm.rank())?;
            let partial = render_partial(&plane, span, plan.config().max_iter())?;
            gather(&comm, plan, &partial, order)
        })
        .unwrap();
        let mut results = results.into_iter();
        let root = results.next().unwrap().unwrap().unwrap();
        for other in results {
            assert!(other.unwrap().is_none());
        }
        root
    }

    #[test]
    fn roles_follow_rank() {
        assert_eq!(Role::of(0), Role::Coordinator);
        assert_eq!(Role::of(1), Role::Contributor);
        assert_eq!(Role::of(7), Role::Contributor);
    }

    #[test]
    fn merged_image_matches_sequential_render() {
        let config = Config::new(32, 16, 120, Viewport::default()).unwrap();
        let expected = render_sequential(&config).unwrap();
        for &strategy in &[Strategy::Rows, Strategy::Pixels] {
            for &workers in &[1, 2, 4, 8] {
                let plan = Plan::new(&config, strategy, workers).unwrap();
                assert_eq!(
                    merge(&plan, MergeOrder::Ranked),
                    expected,
                    "{} with {} workers",
                    strategy,
                    workers
                );
            }
        }
    }

    #[test]
    fn completion_order_matches_ranked_order() {
        let config = Config::new(24, 24, 80, Viewport::default()).unwrap();
        let plan = Plan::new(&config, Strategy::Rows, 6).unwrap();
        assert_eq!(
            merge(&plan, MergeOrder::Completion),
            merge(&plan, MergeOrder::Ranked)
        );
    }

    #[test]
    fn truncated_tail_stays_zero() {
        let config = Config::new(10, 10, 60, Viewport::new(-2.0, 0.5, -1.25, 1.25).unwrap())
            .unwrap()
            .with_remainder(Remainder::Truncate);
        let expected = render_sequential(&config).unwrap();
        for &strategy in &[Strategy::Rows, Strategy::Pixels] {
            let plan = Plan::new(&config, strategy, 3).unwrap();
            let merged = merge(&plan, MergeOrder::Ranked);
            let covered = plan.covered_pixels();
            assert_eq!(&merged.cells()[..covered], &expected.cells()[..covered]);
            assert!(merged.cells()[covered..].iter().all(|&c| c == 0));
        }
    }
}
