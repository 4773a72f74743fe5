//! Vaccination offers and the waning of vaccine protection.
//!
//! Every node is offered a vaccine once during the initial offer window and
//! again every revaccination interval after each offer, whether it accepted or
//! not. Pro-vaccine nodes accept and become immune until a log-normally
//! distributed protection period has passed.

use log::{debug, trace};

use crate::define_rng;
use crate::error::SimError;
use crate::event::{Event, Outcome};
use crate::parameters::VaccinationSchedule;
use crate::random::{days_to_seconds, RandomExt};
use crate::simulation::Simulation;
use crate::tier::Tier;
use crate::NodeId;

define_rng!(VaccinationRng);

/// Elderly people are offered vaccines first.
const WAVE_ORDER: [Tier; 3] = [Tier::Elderly, Tier::Adult, Tier::Child];

fn offset_within(simulation: &Simulation, length: u64) -> u64 {
    if length == 0 {
        0
    } else {
        simulation.sample_range(VaccinationRng, 0..length)
    }
}

/// Schedules each node's first offer.
pub(crate) fn init(simulation: &mut Simulation) -> Result<(), SimError> {
    let parameters = simulation.parameters();
    let delay = days_to_seconds(parameters.vaccination_delay);
    let window = days_to_seconds(parameters.vaccination_offer_window);
    let schedule = parameters.vaccination_schedule;
    let layout = simulation.layout();

    match schedule {
        VaccinationSchedule::Uniform => {
            for node in 0..layout.total() {
                let time = delay.saturating_add(offset_within(simulation, window));
                simulation.add_event(time, Event::VaccinationOffer { node })?;
            }
        }
        VaccinationSchedule::OldestFirst => {
            let wave = window / 3;
            for (index, tier) in (0u64..).zip(WAVE_ORDER) {
                let start = delay.saturating_add(wave * index);
                for node in layout.range(tier) {
                    let time = start.saturating_add(offset_within(simulation, wave));
                    simulation.add_event(time, Event::VaccinationOffer { node })?;
                }
                trace!("{tier} vaccination wave starts at {start}s");
            }
        }
    }
    debug!(
        "scheduled {} first vaccination offers ({schedule:?})",
        layout.total()
    );
    Ok(())
}

pub(crate) fn handle_offer(simulation: &mut Simulation, node: NodeId) -> Result<Outcome, SimError> {
    let outcome = if simulation.status().is_pro_vax(node) {
        let status = simulation.status_mut();
        status.set_immune(node, true);
        status.set_active_vax(node, true);
        simulation.record_vaccination();
        Outcome::Vaccinated
    } else {
        simulation.record_refusal();
        Outcome::Refused
    };
    trace!("vaccine offer to {node}: {outcome:?}");

    let interval = days_to_seconds(simulation.parameters().revaccination_interval);
    simulation.schedule_after(interval, Event::VaccinationOffer { node })?;
    let duration = simulation.sample_distr(VaccinationRng, simulation.vaccine_duration());
    simulation.schedule_after(duration, Event::VaccinationWaned { node })?;
    Ok(outcome)
}

pub(crate) fn handle_waned(simulation: &mut Simulation, node: NodeId) -> Outcome {
    let status = simulation.status_mut();
    status.set_immune(node, false);
    status.set_active_vax(node, false);
    Outcome::VaccinationEnded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::network::NetworkParameters;
    use crate::parameters::{AgeSplit, Parameters};
    use crate::random::SECONDS_PER_DAY;

    fn parameters(schedule: VaccinationSchedule) -> Parameters {
        Parameters {
            population: 40,
            age_split: AgeSplit {
                child: 0.5,
                adult: 0.25,
                elderly: 0.25,
            },
            vaccination_schedule: schedule,
            vaccination_delay: 10.0,
            vaccination_offer_window: 30.0,
            random_seed: Some(21),
            network: NetworkParameters::rings_only(),
            ..Parameters::default()
        }
    }

    fn first_offers(schedule: VaccinationSchedule) -> (Simulation, Vec<(u64, NodeId)>) {
        let mut simulation = Simulation::new(parameters(schedule)).unwrap();
        // Keeps the run alive while offers are drained.
        simulation
            .add_event(
                u64::MAX,
                Event::Transmission {
                    primary: None,
                    secondary: 0,
                },
            )
            .unwrap();
        init(&mut simulation).unwrap();
        // Short protection periods can interleave waning events.
        let mut offers = Vec::new();
        while offers.len() < 40 {
            let record = simulation.step().unwrap().unwrap();
            if record.kind() == EventKind::Vax {
                offers.push((record.time, record.subject().unwrap()));
            }
        }
        (simulation, offers)
    }

    #[test]
    fn uniform_offers_fall_in_window() {
        let (_, offers) = first_offers(VaccinationSchedule::Uniform);
        let start = 10 * SECONDS_PER_DAY;
        let end = 40 * SECONDS_PER_DAY;
        for (time, _) in offers {
            assert!((start..end).contains(&time));
        }
    }

    #[test]
    fn oldest_are_offered_first() {
        let (simulation, offers) = first_offers(VaccinationSchedule::OldestFirst);
        let layout = simulation.layout();
        let tiers: Vec<Tier> = offers
            .iter()
            .map(|&(_, node)| layout.tier_of(node))
            .collect();
        assert!(tiers[..10].iter().all(|&tier| tier == Tier::Elderly));
        assert!(tiers[10..20].iter().all(|&tier| tier == Tier::Adult));
        assert_eq!(tiers.len(), 40);
        assert!(tiers[20..].iter().all(|&tier| tier == Tier::Child));

        let wave = 10 * SECONDS_PER_DAY;
        let start = 10 * SECONDS_PER_DAY;
        for (time, node) in offers {
            let index = match layout.tier_of(node) {
                Tier::Elderly => 0,
                Tier::Adult => 1,
                Tier::Child => 2,
            };
            assert!((start + index * wave..start + (index + 1) * wave).contains(&time));
        }
    }

    #[test]
    fn pro_vax_node_accepts() {
        let (mut simulation, _) = first_offers(VaccinationSchedule::Uniform);
        simulation.status_mut().set_pro_vax(5, true);
        assert_eq!(handle_offer(&mut simulation, 5).unwrap(), Outcome::Vaccinated);
        assert!(simulation.status().is_immune(5));
        assert!(simulation.status().has_active_vax(5));
        assert_eq!(simulation.progress().vaccinations, 1);

        assert_eq!(handle_waned(&mut simulation, 5), Outcome::VaccinationEnded);
        assert!(!simulation.status().is_immune(5));
        assert!(!simulation.status().has_active_vax(5));
    }

    #[test]
    fn anti_vax_node_refuses_but_is_offered_again() {
        let mut simulation = Simulation::new(parameters(VaccinationSchedule::Uniform)).unwrap();
        let queued = simulation.pending_events();
        assert_eq!(handle_offer(&mut simulation, 7).unwrap(), Outcome::Refused);
        assert!(!simulation.status().is_immune(7));
        assert_eq!(simulation.progress().refusals, 1);
        // Next offer and a waning event are scheduled either way.
        assert_eq!(simulation.pending_events(), queued + 2);
    }
}
