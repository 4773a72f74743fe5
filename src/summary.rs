//! Terminal statistics of a run.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::simulation::Simulation;

/// How an outbreak ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutbreakOutcome {
    /// No transmission was pending any more.
    BurnedOut,
    /// Transmissions were still pending when the kill event fired.
    Endemic,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub random_seed: u64,
    /// Transmissions that infected someone, patient zeros included.
    pub transmissions: usize,
    pub distinct_infected: usize,
    /// Time of the last transmission event, or of the kill event if
    /// transmissions were still pending then.
    pub last_infection_time: Option<u64>,
    pub vaccinations: usize,
    pub refusals: usize,
    pub opinion_changes: usize,
    pub peak_active_cases: usize,
    pub final_pro_vax: usize,
    pub final_immune: usize,
    pub events_processed: usize,
    pub end_time: u64,
    /// Absent until the run has finished.
    pub outcome: Option<OutbreakOutcome>,
}

impl Summary {
    #[must_use]
    pub fn collect(simulation: &Simulation) -> Self {
        let progress = simulation.progress();
        Summary {
            random_seed: simulation.random_seed(),
            transmissions: progress.transmissions,
            distinct_infected: simulation.distinct_infected(),
            last_infection_time: simulation.last_infection_time(),
            vaccinations: progress.vaccinations,
            refusals: progress.refusals,
            opinion_changes: progress.opinion_changes,
            peak_active_cases: simulation.peak_active_cases(),
            final_pro_vax: progress.pro_vax,
            final_immune: progress.immune,
            events_processed: progress.events_processed,
            end_time: progress.time,
            outcome: simulation.outcome(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_names() {
        assert_eq!(OutbreakOutcome::BurnedOut.to_string(), "burned_out");
        assert_eq!(
            serde_json::to_value(OutbreakOutcome::Endemic).unwrap(),
            "endemic"
        );
    }

    #[test]
    fn summary_serializes_outcome_name() {
        let summary = Summary {
            random_seed: 1,
            transmissions: 3,
            distinct_infected: 3,
            last_infection_time: Some(2 * 86_400 + 5),
            vaccinations: 0,
            refusals: 0,
            opinion_changes: 0,
            peak_active_cases: 2,
            final_pro_vax: 0,
            final_immune: 3,
            events_processed: 10,
            end_time: 2 * 86_400 + 5,
            outcome: Some(OutbreakOutcome::BurnedOut),
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["outcome"], "burned_out");
        assert_eq!(value["last_infection_time"], 2 * 86_400 + 5);
    }
}
