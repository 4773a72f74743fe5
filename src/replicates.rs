//! Independent repetitions of one scenario.
//!
//! Replicate `i` runs with seed `base + i` (wrapping), where `base` is the
//! configured seed or a single fresh draw. Every replicate owns its own
//! networks, queue, state and random streams, so replicates can run on any
//! number of worker threads and still produce the same summaries.

use std::thread;

use log::{debug, info};
use serde::Serialize;

use crate::error::SimError;
use crate::parameters::Parameters;
use crate::simulation::Simulation;
use crate::summary::Summary;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplicateSummary {
    pub replicate: usize,
    #[serde(flatten)]
    pub summary: Summary,
}

/// Seed of replicate `index` given the base seed.
#[must_use]
pub fn replicate_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add(index as u64)
}

fn run_one(
    parameters: &Parameters,
    base: u64,
    replicate: usize,
) -> Result<ReplicateSummary, SimError> {
    let parameters = Parameters {
        random_seed: Some(replicate_seed(base, replicate)),
        retain_event_log: false,
        ..parameters.clone()
    };
    let summary = Simulation::run(parameters)?;
    debug!("replicate {replicate} finished: {:?}", summary.outcome);
    Ok(ReplicateSummary { replicate, summary })
}

/// Runs `count` replicates of `parameters` on up to `threads` workers.
///
/// Replicates are dealt round-robin to the workers. The result is sorted by
/// replicate index.
///
/// # Errors
///
/// Returns `InvalidParameter` if `threads` is zero, and otherwise the error
/// of the lowest-numbered replicate that failed.
pub fn run_replicates(
    parameters: &Parameters,
    count: usize,
    threads: usize,
) -> Result<Vec<ReplicateSummary>, SimError> {
    if threads == 0 {
        return Err(SimError::invalid("threads", "at least one worker is needed"));
    }
    parameters.validate()?;
    let base = parameters.random_seed.unwrap_or_else(crate::rand::random::<u64>);
    let workers = threads.min(count.max(1));
    info!("running {count} replicate(s) from base seed {base} on {workers} worker(s)");

    let mut results: Vec<(usize, Result<ReplicateSummary, SimError>)> = if workers == 1 {
        (0..count)
            .map(|replicate| (replicate, run_one(parameters, base, replicate)))
            .collect()
    } else {
        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    scope.spawn(move || {
                        (worker..count)
                            .step_by(workers)
                            .map(|replicate| (replicate, run_one(parameters, base, replicate)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut merged = Vec::with_capacity(count);
            for handle in handles {
                match handle.join() {
                    Ok(batch) => merged.extend(batch),
                    Err(_) => {
                        return Err(SimError::SimError(
                            "a replicate worker panicked".to_string(),
                        ))
                    }
                }
            }
            Ok(merged)
        })?
    };

    results.sort_by_key(|(replicate, _)| *replicate);
    results.into_iter().map(|(_, result)| result).collect()
}
