//! The simulation object and its run loop.
//!
//! A [`Simulation`] owns everything a run mutates: the event queue, the node
//! status arrays, the two graphs, the random streams, the counters and the
//! event log. Event handlers live in [`transmission`](crate::transmission),
//! [`vaccination`](crate::vaccination) and [`voter`](crate::voter); each
//! receives the simulation explicitly.
//!
//! The loop pops the earliest event, applies it, records it and notifies
//! listeners. It stops when a kill event fires or when no transmission is
//! pending any more, discarding whatever else is still queued.

use log::{debug, info, trace};
use serde::Serialize;

use crate::active_cases::ActiveCases;
use crate::error::SimError;
use crate::event::{Event, EventRecord, Outcome};
use crate::network::{self, Networks};
use crate::parameters::Parameters;
use crate::plan::Queue;
use crate::random::{days_to_seconds, RandomExt, RandomStreams, SeverityDistribution, WaitTime};
use crate::status::NodeStatus;
use crate::summary::{OutbreakOutcome, Summary};
use crate::tier::{PerTier, Tier, TierLayout};
use crate::{transmission, vaccination, voter, NodeId};

/// Running totals after an event.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub time: u64,
    pub transmissions: usize,
    pub active_cases: usize,
    pub vaccinations: usize,
    pub refusals: usize,
    pub opinion_changes: usize,
    pub events_processed: usize,
    pub immune: usize,
    pub active_vaccinations: usize,
    pub pro_vax: usize,
}

type Listener = Box<dyn FnMut(&EventRecord, &Progress)>;

#[derive(Copy, Clone, Debug)]
struct Durations {
    generation: WaitTime,
    infection_immunity: WaitTime,
    vaccine: WaitTime,
}

pub struct Simulation {
    parameters: Parameters,
    random_seed: u64,
    layout: TierLayout,
    networks: Networks,
    status: NodeStatus,
    queue: Queue<Event>,
    random: RandomStreams,
    current_time: u64,
    beta: f64,
    durations: Durations,
    severity: PerTier<SeverityDistribution>,
    pending_transmissions: usize,
    active_cases: ActiveCases,
    ever_infected: Vec<bool>,
    distinct_infected: usize,
    transmissions: usize,
    vaccinations: usize,
    refusals: usize,
    opinion_changes: usize,
    events_processed: usize,
    last_infection_time: Option<u64>,
    outcome: Option<OutbreakOutcome>,
    event_log: Vec<EventRecord>,
    listeners: Vec<Listener>,
}

impl Simulation {
    /// Validates `parameters`, picks the random seed and builds the networks.
    /// No event is scheduled yet; see [`init`](Self::init).
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for invalid parameters and
    /// `NetworkExhausted` if the networks cannot be built.
    pub fn new(mut parameters: Parameters) -> Result<Self, SimError> {
        parameters.validate()?;
        let random_seed = match parameters.random_seed {
            Some(seed) => seed,
            None => {
                let seed = crate::rand::random();
                info!("no random seed configured, drew {seed}");
                seed
            }
        };
        parameters.random_seed = Some(random_seed);

        let layout = parameters.tier_layout();
        let random = RandomStreams::new(random_seed);
        let networks = network::builder::build(&parameters.network, layout, &random)?;
        let beta = transmission::transmission_probability(&parameters, &networks.physical);
        debug!(
            "population {} split {:?}, beta {beta:.4}",
            layout.total(),
            Tier::ALL.map(|tier| layout.size(tier))
        );

        let durations = Durations {
            generation: parameters.generation_time.wait_time("generation_time")?,
            infection_immunity: parameters
                .infection_immunity
                .wait_time("infection_immunity")?,
            vaccine: parameters
                .vaccine_duration
                .resolved()
                .wait_time("vaccine_duration")?,
        };
        let severity = PerTier {
            child: parameters.severity_distribution(Tier::Child)?,
            adult: parameters.severity_distribution(Tier::Adult)?,
            elderly: parameters.severity_distribution(Tier::Elderly)?,
        };
        let total = layout.total();

        Ok(Simulation {
            random_seed,
            layout,
            networks,
            status: NodeStatus::new(total),
            queue: Queue::new(),
            random,
            current_time: 0,
            beta,
            durations,
            severity,
            pending_transmissions: 0,
            active_cases: ActiveCases::new(days_to_seconds(parameters.active_case_window)),
            ever_infected: vec![false; total],
            distinct_infected: 0,
            transmissions: 0,
            vaccinations: 0,
            refusals: 0,
            opinion_changes: 0,
            events_processed: 0,
            last_infection_time: None,
            outcome: None,
            event_log: Vec::new(),
            listeners: Vec::new(),
            parameters,
        })
    }

    /// Assigns initial opinions and schedules the initial events: patient
    /// zeros, the kill event, first vaccination offers and first opinion
    /// events, in that order.
    ///
    /// # Errors
    ///
    /// Propagates scheduling errors.
    pub fn init(&mut self) -> Result<(), SimError> {
        transmission::init(self)?;
        let kill_time = days_to_seconds(self.parameters.max_duration);
        self.add_event(kill_time, Event::Kill)?;
        vaccination::init(self)?;
        voter::init(self)?;
        debug!("{} initial events scheduled", self.queue.len());
        Ok(())
    }

    /// Builds, initialises and runs a simulation to completion.
    ///
    /// # Errors
    ///
    /// Returns any setup or run error.
    pub fn run(parameters: Parameters) -> Result<Summary, SimError> {
        let mut simulation = Simulation::new(parameters)?;
        simulation.init()?;
        simulation.execute()?;
        Ok(simulation.summary())
    }

    /// Schedules `event` at `time`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTime` if `time` is before the current time.
    pub fn add_event(&mut self, time: u64, event: Event) -> Result<(), SimError> {
        if time < self.current_time {
            return Err(SimError::InvalidTime {
                time,
                current: self.current_time,
            });
        }
        if matches!(event, Event::Transmission { .. }) {
            self.pending_transmissions += 1;
        }
        self.queue.add_plan(time, event);
        Ok(())
    }

    /// Schedules `event` `delay` seconds from now.
    pub(crate) fn schedule_after(&mut self, delay: u64, event: Event) -> Result<(), SimError> {
        self.add_event(self.current_time.saturating_add(delay), event)
    }

    /// Registers a callback invoked after every applied event.
    pub fn subscribe(&mut self, listener: impl FnMut(&EventRecord, &Progress) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Processes the earliest pending event. Returns `None` once the run is
    /// over.
    ///
    /// # Errors
    ///
    /// Returns any error raised while applying the event.
    pub fn step(&mut self) -> Result<Option<EventRecord>, SimError> {
        if self.outcome.is_some() {
            return Ok(None);
        }
        let Some(plan) = self.queue.get_next_plan() else {
            self.finish(OutbreakOutcome::BurnedOut);
            return Ok(None);
        };
        self.current_time = plan.time;
        let event = plan.data;
        if matches!(event, Event::Transmission { .. }) {
            self.pending_transmissions -= 1;
        }

        let outcome = self.apply(event)?;
        self.events_processed += 1;
        self.active_cases.advance(self.current_time);
        let record = EventRecord {
            time: self.current_time,
            event,
            outcome,
        };
        trace!("applied {record:?}");
        if self.parameters.retain_event_log {
            self.event_log.push(record);
        }
        let progress = self.progress();
        for listener in &mut self.listeners {
            listener(&record, &progress);
        }

        if self.outcome.is_none() && self.pending_transmissions == 0 {
            if matches!(event, Event::Transmission { .. }) {
                self.last_infection_time = Some(self.current_time);
            }
            self.queue.clear();
            self.finish(OutbreakOutcome::BurnedOut);
        }
        Ok(Some(record))
    }

    /// Runs until the outbreak burns out or the kill event fires.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an event.
    pub fn execute(&mut self) -> Result<(), SimError> {
        while self.step()?.is_some() {}
        Ok(())
    }

    fn apply(&mut self, event: Event) -> Result<Outcome, SimError> {
        match event {
            Event::Transmission { primary, secondary } => {
                transmission::handle_transmission(self, primary, secondary)
            }
            Event::Resusceptible { node } => Ok(transmission::handle_resusceptible(self, node)),
            Event::VaccinationOffer { node } => vaccination::handle_offer(self, node),
            Event::VaccinationWaned { node } => Ok(vaccination::handle_waned(self, node)),
            Event::OpinionUpdate { node } => voter::handle_opinion_update(self, node),
            Event::Kill => Ok(self.kill()),
        }
    }

    fn kill(&mut self) -> Outcome {
        if self.pending_transmissions > 0 {
            self.last_infection_time = Some(self.current_time);
        }
        self.queue.clear();
        self.pending_transmissions = 0;
        self.finish(OutbreakOutcome::Endemic);
        Outcome::Killed
    }

    fn finish(&mut self, outcome: OutbreakOutcome) {
        info!(
            "run finished at {}s after {} events: {outcome}",
            self.current_time, self.events_processed
        );
        self.outcome = Some(outcome);
    }

    pub(crate) fn record_infection(&mut self, node: NodeId, severity: f64) {
        self.status.raise_severity(node, severity);
        self.status.set_immune(node, true);
        self.transmissions += 1;
        if !self.ever_infected[node] {
            self.ever_infected[node] = true;
            self.distinct_infected += 1;
        }
        self.active_cases.record(self.current_time);
    }

    pub(crate) fn record_vaccination(&mut self) {
        self.vaccinations += 1;
    }

    pub(crate) fn record_refusal(&mut self) {
        self.refusals += 1;
    }

    pub(crate) fn record_opinion_change(&mut self) {
        self.opinion_changes += 1;
    }

    pub(crate) fn status_mut(&mut self) -> &mut NodeStatus {
        &mut self.status
    }

    pub(crate) fn severity_distribution(&self, tier: Tier) -> SeverityDistribution {
        *self.severity.get(tier)
    }

    pub(crate) fn generation_time(&self) -> WaitTime {
        self.durations.generation
    }

    pub(crate) fn infection_immunity(&self) -> WaitTime {
        self.durations.infection_immunity
    }

    pub(crate) fn vaccine_duration(&self) -> WaitTime {
        self.durations.vaccine
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            time: self.current_time,
            transmissions: self.transmissions,
            active_cases: self.active_cases.count(),
            vaccinations: self.vaccinations,
            refusals: self.refusals,
            opinion_changes: self.opinion_changes,
            events_processed: self.events_processed,
            immune: self.status.immune_count(),
            active_vaccinations: self.status.active_vax_count(),
            pro_vax: self.status.pro_vax_count(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary::collect(self)
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    #[must_use]
    pub fn layout(&self) -> TierLayout {
        self.layout
    }

    #[must_use]
    pub fn networks(&self) -> &Networks {
        &self.networks
    }

    #[must_use]
    pub fn status(&self) -> &NodeStatus {
        &self.status
    }

    #[must_use]
    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    /// Per-contact transmission probability.
    #[must_use]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn pending_transmissions(&self) -> usize {
        self.pending_transmissions
    }

    #[must_use]
    pub fn distinct_infected(&self) -> usize {
        self.distinct_infected
    }

    #[must_use]
    pub fn peak_active_cases(&self) -> usize {
        self.active_cases.peak()
    }

    #[must_use]
    pub fn last_infection_time(&self) -> Option<u64> {
        self.last_infection_time
    }

    #[must_use]
    pub fn outcome(&self) -> Option<OutbreakOutcome> {
        self.outcome
    }

    /// Every applied event in order, if the log is retained.
    #[must_use]
    pub fn event_log(&self) -> &[EventRecord] {
        &self.event_log
    }
}

impl RandomExt for Simulation {
    fn random_streams(&self) -> &RandomStreams {
        &self.random
    }
}
