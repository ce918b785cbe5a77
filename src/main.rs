// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate log;
extern crate mandelsplit;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use log::warn;
use std::io;
use std::path::Path;
use std::str::FromStr;

use mandelsplit::sink::{self, AsciiSink, ImageSink};
use mandelsplit::{Job, MergeOrder, Remainder, Result, Strategy};

const STRATEGY: &str = "strategy";
const WORKERS: &str = "workers";
const OUTPUT: &str = "output";
const ASCII: &str = "ascii";
const ALLOW_REMAINDER: &str = "allow-remainder";
const ANY_ORDER: &str = "any-order";

const MAX_WORKERS: usize = 1024;

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> std::result::Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandelsplit")
        .version("0.1.0")
        .about("Mandelbrot renderer split across a worker group")
        .arg(
            Arg::with_name(STRATEGY)
                .long(STRATEGY)
                .short("s")
                .takes_value(true)
                .possible_values(&["rows", "pixels"])
                .default_value("rows")
                .help("Split the image into row blocks or flat pixel blocks"),
        )
        .arg(
            Arg::with_name(WORKERS)
                .long(WORKERS)
                .short("w")
                .takes_value(true)
                .default_value("4")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        MAX_WORKERS,
                        "Could not parse worker count",
                        &format!("Worker count must be between 1 and {}", MAX_WORKERS),
                    )
                })
                .help("Number of workers in the group"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Write the image here; .pgm is written raw, other extensions as 8-bit gray"),
        )
        .arg(
            Arg::with_name(ASCII)
                .long(ASCII)
                .short("a")
                .help("Print the image to the terminal as digits"),
        )
        .arg(
            Arg::with_name(ALLOW_REMAINDER)
                .long(ALLOW_REMAINDER)
                .help("Run even if the workers do not divide the image; leftover pixels stay 0"),
        )
        .arg(
            Arg::with_name(ANY_ORDER)
                .long(ANY_ORDER)
                .help("Merge row blocks in arrival order instead of rank order"),
        )
        .get_matches()
}

fn render(matches: &ArgMatches) -> Result<()> {
    let strategy = Strategy::from_str(matches.value_of(STRATEGY).unwrap_or("rows"))?;
    let workers = matches
        .value_of(WORKERS)
        .and_then(|s| usize::from_str(s).ok())
        .unwrap_or(4);

    let cores = num_cpus::get();
    if workers > cores {
        warn!("{} workers on {} cores; timings will include contention", workers, cores);
    }

    let mut job = Job::new(strategy, workers);
    if matches.is_present(ALLOW_REMAINDER) {
        job.config = job.config.with_remainder(Remainder::Truncate);
    }
    if matches.is_present(ANY_ORDER) {
        match strategy {
            Strategy::Rows => job.order = MergeOrder::Completion,
            Strategy::Pixels => warn!(
                "--{} has no effect on the collective pixel gather; blocks merge by rank",
                ANY_ORDER
            ),
        }
    }

    let outcome = mandelsplit::run(&job)?;
    print!("{}", outcome.timing.report(strategy));

    let max_iter = job.config.max_iter();
    if matches.is_present(ASCII) {
        let stdout = io::stdout();
        AsciiSink::new(stdout.lock()).render(&outcome.raster, max_iter)?;
    }
    if let Some(output) = matches.value_of(OUTPUT) {
        sink::sink_for_path(Path::new(output))?.render(&outcome.raster, max_iter)?;
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = args();
    if let Err(e) = render(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
