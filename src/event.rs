//! Simulation events and the records kept once they are applied.

use serde::Serialize;
use strum::Display;

use crate::NodeId;

/// A pending state transition. Each variant carries only the nodes it acts on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// `primary` infects `secondary`. Seed infections have no primary.
    #[serde(rename = "trans")]
    Transmission {
        primary: Option<NodeId>,
        secondary: NodeId,
    },
    /// The node is offered a vaccine.
    #[serde(rename = "vax")]
    VaccinationOffer { node: NodeId },
    /// An administered vaccination stops protecting the node.
    #[serde(rename = "unvax")]
    VaccinationWaned { node: NodeId },
    /// Immunity from a past infection wears off.
    #[serde(rename = "resusceptible")]
    Resusceptible { node: NodeId },
    /// The node reconsiders its opinion on vaccination.
    #[serde(rename = "opinion")]
    OpinionUpdate { node: NodeId },
    /// Ends the run, discarding whatever is still pending.
    #[serde(rename = "kill")]
    Kill,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Trans,
    Vax,
    Unvax,
    Resusceptible,
    Opinion,
    Kill,
}

impl Event {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Transmission { .. } => EventKind::Trans,
            Event::VaccinationOffer { .. } => EventKind::Vax,
            Event::VaccinationWaned { .. } => EventKind::Unvax,
            Event::Resusceptible { .. } => EventKind::Resusceptible,
            Event::OpinionUpdate { .. } => EventKind::Opinion,
            Event::Kill => EventKind::Kill,
        }
    }

    /// The infecting node of a transmission, or the affected node of any
    /// other event.
    #[must_use]
    pub fn subject(&self) -> Option<NodeId> {
        match *self {
            Event::Transmission { primary, .. } => primary,
            Event::VaccinationOffer { node }
            | Event::VaccinationWaned { node }
            | Event::Resusceptible { node }
            | Event::OpinionUpdate { node } => Some(node),
            Event::Kill => None,
        }
    }

    /// The node being infected, for transmissions.
    #[must_use]
    pub fn secondary(&self) -> Option<NodeId> {
        match *self {
            Event::Transmission { secondary, .. } => Some(secondary),
            _ => None,
        }
    }
}

/// What applying an event did.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The secondary was susceptible and is now infected.
    Infected { severity: f64 },
    /// The secondary was already immune; nothing changed.
    AlreadyImmune,
    Vaccinated,
    Refused,
    VaccinationEnded,
    ImmunityWaned,
    OpinionKept,
    OpinionChanged { pro_vax: bool },
    Killed,
}

/// An applied event, as retained in the event log and handed to listeners.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct EventRecord {
    pub time: u64,
    #[serde(flatten)]
    pub event: Event,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl EventRecord {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    #[must_use]
    pub fn subject(&self) -> Option<NodeId> {
        self.event.subject()
    }

    #[must_use]
    pub fn secondary(&self) -> Option<NodeId> {
        self.event.secondary()
    }

    /// True for transmissions that actually infected someone.
    #[must_use]
    pub fn is_infection(&self) -> bool {
        matches!(self.outcome, Outcome::Infected { .. })
    }
}
