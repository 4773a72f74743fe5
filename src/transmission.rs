//! Infection and the waning of post-infection immunity.
//!
//! An infected node becomes immune at once. Each physical neighbour that is
//! not immune when the infection is applied is infected with probability
//! `beta` after a log-normal generation time, and that neighbour's
//! post-infection immunity is scheduled to wane a log-normal delay after its
//! own infection time. Infections landing on an immune node change nothing.

use log::{debug, trace};

use crate::define_rng;
use crate::error::SimError;
use crate::event::{Event, Outcome};
use crate::network::Adjacency;
use crate::parameters::Parameters;
use crate::rand::seq::index;
use crate::random::RandomExt;
use crate::simulation::Simulation;
use crate::NodeId;

define_rng!(TransmissionRng);
define_rng!(SeverityRng);

/// `r0 / mean physical degree`, capped at one, unless `beta` is configured.
/// A graph without edges cannot transmit, so its beta is zero.
///
/// The cap does not change which contacts transmit: draws are uniform in
/// `[0, 1)`, so any ratio of one or more already succeeds every time.
#[must_use]
pub fn transmission_probability(parameters: &Parameters, physical: &Adjacency) -> f64 {
    if let Some(beta) = parameters.beta {
        return beta;
    }
    let mean_degree = physical.mean_degree();
    if mean_degree > 0.0 {
        (parameters.r0 / mean_degree).min(1.0)
    } else {
        0.0
    }
}

/// Schedules a seed infection at `t = 0` for each of `patient_zero_count`
/// distinct nodes.
pub(crate) fn init(simulation: &mut Simulation) -> Result<(), SimError> {
    let count = simulation.parameters().patient_zero_count;
    let total = simulation.layout().total();
    let patient_zeros = simulation.sample(TransmissionRng, |rng| {
        index::sample(rng, total, count).into_vec()
    });
    for &node in &patient_zeros {
        trace!(
            "patient zero {node} has {} contacts",
            simulation.networks().physical.degree(node)
        );
        simulation.add_event(
            0,
            Event::Transmission {
                primary: None,
                secondary: node,
            },
        )?;
    }
    debug!("seeded {count} patient zeros: {patient_zeros:?}");
    Ok(())
}

pub(crate) fn handle_transmission(
    simulation: &mut Simulation,
    primary: Option<NodeId>,
    secondary: NodeId,
) -> Result<Outcome, SimError> {
    if simulation.status().is_immune(secondary) {
        trace!("{secondary} is immune, transmission from {primary:?} has no effect");
        return Ok(Outcome::AlreadyImmune);
    }

    let tier = simulation.layout().tier_of(secondary);
    let distribution = simulation.severity_distribution(tier);
    let severity = simulation.sample(SeverityRng, |rng| distribution.sample(rng))?;
    simulation.record_infection(secondary, severity);

    let beta = simulation.beta();
    let generation = simulation.generation_time();
    let immunity = simulation.infection_immunity();
    let neighbours = simulation.networks().physical.neighbours(secondary).to_vec();
    let mut scheduled = 0;
    for neighbour in neighbours {
        if simulation.status().is_immune(neighbour)
            || !simulation.sample_bool(TransmissionRng, beta)
        {
            continue;
        }
        let transmission_time = simulation
            .current_time()
            .saturating_add(simulation.sample_distr(TransmissionRng, generation));
        simulation.add_event(
            transmission_time,
            Event::Transmission {
                primary: Some(secondary),
                secondary: neighbour,
            },
        )?;
        let resusceptible_time =
            transmission_time.saturating_add(simulation.sample_distr(TransmissionRng, immunity));
        simulation.add_event(resusceptible_time, Event::Resusceptible { node: neighbour })?;
        scheduled += 1;
    }

    trace!("{primary:?} infected {tier} node {secondary} (severity {severity:.3}), {scheduled} onward transmissions");
    Ok(Outcome::Infected { severity })
}

pub(crate) fn handle_resusceptible(simulation: &mut Simulation, node: NodeId) -> Outcome {
    simulation.status_mut().set_immune(node, false);
    Outcome::ImmunityWaned
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::network::NetworkParameters;
    use crate::parameters::AgeSplit;
    use crate::random::ModeDispersion;

    fn ring_parameters() -> Parameters {
        Parameters {
            population: 6,
            age_split: AgeSplit {
                child: 1.0,
                adult: 0.0,
                elderly: 0.0,
            },
            patient_zero_count: 0,
            beta: Some(1.0),
            infection_immunity: ModeDispersion::new(1.0e6, 1.1),
            random_seed: Some(3),
            network: NetworkParameters::rings_only(),
            ..Parameters::default()
        }
    }

    #[test]
    fn beta_is_derived_from_r0() {
        let mut physical = Adjacency::new(4);
        physical.add_edge(0, 1);
        physical.add_edge(2, 3);
        let parameters = Parameters {
            r0: 0.5,
            ..Parameters::default()
        };
        assert_relative_eq!(transmission_probability(&parameters, &physical), 0.5);

        let parameters = Parameters {
            r0: 3.0,
            ..Parameters::default()
        };
        assert_relative_eq!(transmission_probability(&parameters, &physical), 1.0);
    }

    #[test]
    fn beta_override_and_empty_graph() {
        let physical = Adjacency::new(4);
        assert_relative_eq!(
            transmission_probability(&Parameters::default(), &physical),
            0.0
        );
        let parameters = Parameters {
            beta: Some(0.3),
            ..Parameters::default()
        };
        assert_relative_eq!(transmission_probability(&parameters, &physical), 0.3);
    }

    #[test]
    fn patient_zeros_are_distinct() {
        let parameters = Parameters {
            population: 10,
            patient_zero_count: 10,
            random_seed: Some(4),
            network: NetworkParameters::rings_only(),
            ..Parameters::default()
        };
        let mut simulation = Simulation::new(parameters).unwrap();
        init(&mut simulation).unwrap();
        assert_eq!(simulation.pending_transmissions(), 10);

        let mut seeds = Vec::new();
        while let Some(record) = simulation.step().unwrap() {
            if record.event.subject().is_none() {
                if let Some(node) = record.secondary() {
                    seeds.push(node);
                }
            }
            if seeds.len() == 10 {
                break;
            }
        }
        seeds.sort_unstable();
        assert_eq!(seeds, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn infection_schedules_every_susceptible_neighbour() {
        let mut simulation = Simulation::new(ring_parameters()).unwrap();
        simulation.status_mut().set_immune(1, true);
        simulation
            .add_event(
                0,
                Event::Transmission {
                    primary: None,
                    secondary: 0,
                },
            )
            .unwrap();

        let record = simulation.step().unwrap().unwrap();
        assert!(record.is_infection());
        assert!(simulation.status().is_immune(0));
        // Neighbours 2, 4 and 5 are susceptible; each gets a transmission and
        // a waning event.
        assert_eq!(simulation.pending_transmissions(), 3);
        assert_eq!(simulation.pending_events(), 6);
        let severity = simulation.status().severity(0);
        assert!(severity > 0.0 && severity <= 1.0);
    }

    #[test]
    fn resusceptible_clears_immunity_only() {
        let mut simulation = Simulation::new(ring_parameters()).unwrap();
        simulation.status_mut().set_immune(2, true);
        simulation.status_mut().raise_severity(2, 0.7);
        assert_eq!(handle_resusceptible(&mut simulation, 2), Outcome::ImmunityWaned);
        assert!(!simulation.status().is_immune(2));
        assert_relative_eq!(simulation.status().severity(2), 0.7);
    }
}
