// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Running a whole job: every worker executes `run_worker`, the
//! coordinator comes back with the merged raster and its timing.

use itertools::iproduct;
use log::{debug, error, info};
use std::time::Instant;

use crate::comm::{self, Communicator};
use crate::config::{Config, Strategy};
use crate::error::{MandelError, Result};
use crate::gather::{self, MergeOrder, Role};
use crate::kernel::{escape_time, render_partial};
use crate::partition::Plan;
use crate::planes::{Pixel, PlaneMapper};
use crate::raster::{alloc_cells, Raster};
use crate::timing::TimingSample;

/// What the coordinator holds when a job finishes.
#[derive(Debug)]
pub struct Outcome {
    /// The merged image.
    pub raster: Raster,
    /// Phase boundaries as seen by the coordinator.
    pub timing: TimingSample,
    /// The strategy that produced it.
    pub strategy: Strategy,
}

/// Everything needed to run one distributed render.
#[derive(Copy, Clone, Debug)]
pub struct Job {
    /// Resolution, bound, viewport and remainder policy.
    pub config: Config,
    /// Row blocks or flat pixel blocks.
    pub strategy: Strategy,
    /// Group size.
    pub workers: usize,
    /// Receive order for the row strategy's merge.
    pub order: MergeOrder,
}

impl Job {
    /// A job with the built-in configuration for `strategy`.
    pub fn new(strategy: Strategy, workers: usize) -> Job {
        Job {
            config: Config::for_strategy(strategy),
            strategy,
            workers,
            order: MergeOrder::Ranked,
        }
    }
}

/// One worker's part of a job.  Computes the rank's span, then takes
/// part in the merge.  Returns `Some` only on the coordinator.
pub fn run_worker<C: Communicator>(
    comm: &C,
    plan: &Plan,
    order: MergeOrder,
) -> Result<Option<Outcome>> {
    let rank = comm.rank();
    let config = plan.config();
    let plane = PlaneMapper::from_config(config);
    let span = plan.pixel_span(rank)?;

    let computation_start = Instant::now();
    let partial = render_partial(&plane, span, config.max_iter())?;
    let computation_end = Instant::now();
    debug!(
        "rank {} computed pixels {}..{}",
        rank, span.start, span.end
    );

    let communication_start = Instant::now();
    let merged = gather::gather(comm, plan, &partial, order)?;
    let communication_end = Instant::now();

    match (Role::of(rank), merged) {
        (Role::Coordinator, Some(raster)) => Ok(Some(Outcome {
            raster,
            timing: TimingSample::new(
                computation_start,
                computation_end,
                communication_start,
                communication_end,
            ),
            strategy: plan.strategy(),
        })),
        (Role::Contributor, None) => Ok(None),
        (role, _) => Err(MandelError::Transport(format!(
            "rank {} finished the merge inconsistently with its {:?} role",
            rank, role
        ))),
    }
}

/// Launches the worker group for a job and returns the coordinator's
/// outcome.  If several workers fail, the first failure that is not
/// just a peer hanging up is reported.
pub fn run(job: &Job) -> Result<Outcome> {
    let plan = Plan::new(&job.config, job.strategy, job.workers)?;
    info!(
        "rendering {}x{} (max {} iterations) by {} across {} workers",
        job.config.width(),
        job.config.height(),
        job.config.max_iter(),
        job.strategy,
        job.workers
    );

    let results = comm::launch(job.workers, |comm| run_worker(&comm, &plan, job.order))?;
    let outcome = coordinator_outcome(results)?;
    info!(
        "merged {} cells in {:?}",
        outcome.raster.len(),
        outcome.timing.execution_time()
    );
    Ok(outcome)
}

/// Picks the coordinator's outcome out of every worker's result, or
/// the failure that brought the group down.
fn coordinator_outcome(results: Vec<Result<Option<Outcome>>>) -> Result<Outcome> {
    let mut outcome = None;
    let mut failures = Vec::new();
    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(Some(o)) => outcome = Some(o),
            Ok(None) => (),
            Err(e) => {
                error!("worker {} failed: {}", rank, e);
                failures.push(e);
            }
        }
    }
    if !failures.is_empty() {
        let first = failures
            .iter()
            .position(|e| !e.is_transport())
            .unwrap_or(0);
        return Err(failures.swap_remove(first));
    }

    outcome.ok_or_else(|| MandelError::Transport("the coordinator returned no image".to_string()))
}

/// The single-worker reference: every pixel, in row-major order.
pub fn render_sequential(config: &Config) -> Result<Raster> {
    let plane = PlaneMapper::from_config(config);
    let mut cells = alloc_cells(config.pixels())?;
    for (cell, (row, column)) in cells
        .iter_mut()
        .zip(iproduct!(0..config.height(), 0..config.width()))
    {
        *cell = escape_time(plane.pixel_to_point(&Pixel(column, row)), config.max_iter());
    }
    Raster::from_cells(config.width(), config.height(), cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Remainder, Viewport};

    fn job(strategy: Strategy, workers: usize) -> Job {
        Job {
            config: Config::new(40, 20, 150, Viewport::default()).unwrap(),
            strategy,
            workers,
            order: MergeOrder::Ranked,
        }
    }

    #[test]
    fn distributed_run_matches_sequential() {
        for &strategy in &[Strategy::Rows, Strategy::Pixels] {
            let job = job(strategy, 4);
            let outcome = run(&job).unwrap();
            assert_eq!(outcome.strategy, strategy);
            assert_eq!(outcome.raster, render_sequential(&job.config).unwrap());
            assert!(outcome.timing.execution_time() >= outcome.timing.computation_time());
        }
    }

    #[test]
    fn sequential_render_marks_origin_as_inside() {
        let config = Config::new(4, 4, 1000, Viewport::default()).unwrap();
        let raster = render_sequential(&config).unwrap();
        // pixel (2, 2) is the origin; pixel (0, 0) is -2-2i
        assert_eq!(raster.get(2, 2), Some(1000));
        assert_eq!(raster.get(0, 0), Some(0));
    }

    #[test]
    fn uneven_job_is_rejected_before_launch() {
        match run(&job(Strategy::Rows, 3)) {
            Err(MandelError::NonDivisible { .. }) => (),
            other => panic!("expected NonDivisible, got {:?}", other.map(|o| o.raster.len())),
        }
    }

    #[test]
    fn uneven_job_runs_when_truncation_is_allowed() {
        let config = Config::new(40, 20, 150, Viewport::new(-2.0, 0.5, -1.25, 1.25).unwrap())
            .unwrap()
            .with_remainder(Remainder::Truncate);
        let expected = render_sequential(&config).unwrap();
        for &strategy in &[Strategy::Rows, Strategy::Pixels] {
            let job = Job {
                config,
                strategy,
                workers: 3,
                order: MergeOrder::Ranked,
            };
            let covered = Plan::new(&config, strategy, 3).unwrap().covered_pixels();
            assert!(covered < 800);
            // the dropped tail would hold escaping points if it were computed
            assert!(expected.cells()[covered..].iter().any(|&c| c != 0));

            let outcome = run(&job).unwrap();
            assert_eq!(outcome.raster.len(), 800);
            assert_eq!(&outcome.raster.cells()[..covered], &expected.cells()[..covered]);
            assert!(outcome.raster.cells()[covered..].iter().all(|&c| c == 0));
        }
    }

    #[test]
    fn failed_worker_is_reported_over_hung_up_peers() {
        let job = job(Strategy::Pixels, 4);
        let plan = Plan::new(&job.config, job.strategy, job.workers).unwrap();
        let results = comm::launch(job.workers, |comm| {
            if comm.rank() == 2 {
                return Err(MandelError::Config("injected".to_string()));
            }
            run_worker(&comm, &plan, job.order)
        })
        .unwrap();

        // every peer of the failed rank gave up instead of waiting on it
        for (rank, result) in results.iter().enumerate() {
            match result {
                Err(MandelError::Config(_)) => assert_eq!(rank, 2),
                Err(e) => assert!(e.is_transport(), "rank {}: {}", rank, e),
                Ok(_) => panic!("rank {} finished despite the failure", rank),
            }
        }
        match coordinator_outcome(results) {
            Err(MandelError::Config(reason)) => assert_eq!(reason, "injected"),
            other => panic!("expected the injected error, got {:?}", other.map(|o| o.raster.len())),
        }
    }

    #[test]
    fn transport_failure_is_reported_when_nothing_else_failed() {
        let results: Vec<Result<Option<Outcome>>> = vec![
            Ok(None),
            Err(MandelError::Transport("rank 0 hung up".to_string())),
        ];
        match coordinator_outcome(results) {
            Err(e) => assert!(e.is_transport()),
            Ok(_) => panic!("expected a transport error"),
        }
    }

    #[test]
    fn completion_order_job() {
        let mut job = job(Strategy::Rows, 5);
        job.order = MergeOrder::Completion;
        let outcome = run(&job).unwrap();
        assert_eq!(outcome.raster, render_sequential(&job.config).unwrap());
    }
}
