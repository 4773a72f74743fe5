//! Vaccine opinion dynamics (a voter model on the behavioural graph).
//!
//! At each of its opinion events a node picks one behavioural neighbour at
//! random and adopts that neighbour's opinion. Turning from pro- to
//! anti-vaccine is less likely when a severe case has been seen nearby or
//! suffered by the node itself; every other adoption always happens.

use log::{debug, trace};

use crate::define_rng;
use crate::error::SimError;
use crate::event::{Event, Outcome};
use crate::parameters::OpinionParameters;
use crate::rand::Rng;
use crate::random::{days_to_seconds, RandomExt};
use crate::simulation::Simulation;
use crate::NodeId;

define_rng!(OpinionRng);

/// Result of one opinion event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpinionUpdate {
    pub pro_vax: bool,
    pub changed: bool,
}

/// Probability of adopting `proposed` when currently holding `current`.
#[must_use]
pub fn change_probability(
    current: bool,
    proposed: bool,
    neighbour_was_severe: bool,
    self_was_severe: bool,
    parameters: &OpinionParameters,
) -> f64 {
    let mut probability: f64 = 1.0;
    if current && !proposed {
        if neighbour_was_severe {
            probability -= parameters.neighbour_penalty;
        }
        if self_was_severe {
            probability -= parameters.self_penalty;
        }
    }
    probability.max(0.0)
}

/// Applies one opinion event for `node` without touching any state.
///
/// `opinions` and `severity` are indexed by node; `neighbours` is the node's
/// behavioural neighbour list. A node without neighbours keeps its opinion
/// and draws nothing.
pub fn apply_opinion_event<R: Rng + ?Sized>(
    node: NodeId,
    neighbours: &[NodeId],
    opinions: &[bool],
    severity: &[f64],
    parameters: &OpinionParameters,
    rng: &mut R,
) -> OpinionUpdate {
    let current = opinions[node];
    if neighbours.is_empty() {
        return OpinionUpdate {
            pro_vax: current,
            changed: false,
        };
    }

    let picked = neighbours[rng.random_range(0..neighbours.len())];
    let proposed = opinions[picked];
    let threshold = parameters.severe_threshold;
    let probability = change_probability(
        current,
        proposed,
        neighbours.iter().any(|&other| severity[other] >= threshold),
        severity[node] >= threshold,
        parameters,
    );

    let pro_vax = if rng.random::<f64>() < probability {
        proposed
    } else {
        current
    };
    OpinionUpdate {
        pro_vax,
        changed: pro_vax != current,
    }
}

/// Draws initial opinions and schedules each node's first opinion event
/// uniformly within the first update interval.
pub(crate) fn init(simulation: &mut Simulation) -> Result<(), SimError> {
    let anti_vax_fraction = simulation.parameters().anti_vax_fraction;
    let interval = days_to_seconds(simulation.parameters().opinion.update_interval);
    let total = simulation.layout().total();

    for node in 0..total {
        let pro_vax = !simulation.sample_bool(OpinionRng, anti_vax_fraction);
        simulation.status_mut().set_pro_vax(node, pro_vax);
    }
    for node in 0..total {
        let time = simulation.sample_range(OpinionRng, 0..interval);
        simulation.add_event(time, Event::OpinionUpdate { node })?;
    }
    debug!(
        "{} of {total} nodes start pro-vaccine",
        simulation.status().pro_vax_count()
    );
    Ok(())
}

pub(crate) fn handle_opinion_update(
    simulation: &mut Simulation,
    node: NodeId,
) -> Result<Outcome, SimError> {
    let parameters = simulation.parameters().opinion;
    let update = simulation.sample(OpinionRng, |rng| {
        apply_opinion_event(
            node,
            simulation.networks().behavioral.neighbours(node),
            simulation.status().opinions(),
            simulation.status().severities(),
            &parameters,
            rng,
        )
    });

    let outcome = if update.changed {
        simulation.status_mut().set_pro_vax(node, update.pro_vax);
        simulation.record_opinion_change();
        trace!("{node} changed opinion, pro-vaccine: {}", update.pro_vax);
        Outcome::OpinionChanged {
            pro_vax: update.pro_vax,
        }
    } else {
        Outcome::OpinionKept
    };

    let interval = days_to_seconds(parameters.update_interval);
    simulation.schedule_after(interval, Event::OpinionUpdate { node })?;
    Ok(outcome)
}
