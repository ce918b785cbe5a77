// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Wall-clock phase timing for the coordinator.

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::Strategy;
use crate::error::{MandelError, Result};

/// Computation-to-communication ratio.  A zero communication time
/// yields `ZeroCommunicationTime` rather than an infinite or NaN ratio.
pub fn ratio(computation: Duration, communication: Duration) -> Result<f64> {
    if communication == Duration::from_secs(0) {
        return Err(MandelError::ZeroCommunicationTime);
    }
    Ok(computation.as_secs_f64() / communication.as_secs_f64())
}

/// The four phase boundaries recorded during one run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimingSample {
    computation_start: Instant,
    computation_end: Instant,
    communication_start: Instant,
    communication_end: Instant,
}

impl TimingSample {
    /// Records the boundaries in the order they happened.
    pub fn new(
        computation_start: Instant,
        computation_end: Instant,
        communication_start: Instant,
        communication_end: Instant,
    ) -> TimingSample {
        TimingSample {
            computation_start,
            computation_end,
            communication_start,
            communication_end,
        }
    }

    /// Time spent in the kernel.
    pub fn computation_time(&self) -> Duration {
        self.computation_end
            .saturating_duration_since(self.computation_start)
    }

    /// Time spent merging.
    pub fn communication_time(&self) -> Duration {
        self.communication_end
            .saturating_duration_since(self.communication_start)
    }

    /// Start of computation to end of communication.
    pub fn execution_time(&self) -> Duration {
        self.communication_end
            .saturating_duration_since(self.computation_start)
    }

    /// See [`ratio`].
    pub fn ratio(&self) -> Result<f64> {
        ratio(self.computation_time(), self.communication_time())
    }

    /// The console report for a strategy.
    pub fn report(&self, strategy: Strategy) -> Report {
        Report {
            sample: *self,
            strategy,
        }
    }
}

/// Console lines for a finished run.  The row strategy reports both
/// phases and their ratio; the pixel strategy reports total execution
/// time.
pub struct Report {
    sample: TimingSample,
    strategy: Strategy,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.strategy {
            Strategy::Rows => {
                writeln!(
                    f,
                    "Computation time: {:.6} seconds",
                    self.sample.computation_time().as_secs_f64()
                )?;
                writeln!(
                    f,
                    "Communication time: {:.6} seconds",
                    self.sample.communication_time().as_secs_f64()
                )?;
                match self.sample.ratio() {
                    Ok(ratio) => writeln!(f, "Computation to communication ratio: {:.6}", ratio),
                    Err(e) => writeln!(f, "Computation to communication ratio: undefined ({})", e),
                }
            }
            Strategy::Pixels => writeln!(
                f,
                "Execution time: {:.6} seconds",
                self.sample.execution_time().as_secs_f64()
            ),
        }
    }
}
