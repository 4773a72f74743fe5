//! Discrete-event simulation of an infectious disease spreading over a
//! contact network while vaccines are offered and vaccine opinions evolve.
//!
//! A population is split into three age tiers (children, adults, elderly).
//! Two graphs connect it: a *physical* contact graph over which infections
//! travel, and a *behavioural* influence graph over which vaccine opinions
//! travel. Both start from per-tier ring lattices and are densified with
//! random small-world links inside and between tiers.
//!
//! A [`Simulation`] owns the event queue and all run state. Events are
//! processed in time order:
//! * `trans`: an infection attempt, which may schedule further attempts on
//!   the infected node's physical neighbours.
//! * `resusceptible`: post-infection immunity ends.
//! * `vax` / `unvax`: a vaccine offer and the end of vaccine protection.
//! * `opinion`: a voter-model update on the behavioural graph.
//! * `kill`: the run ends after its maximum duration.
//!
//! A run also ends as soon as no infection attempt is pending. Runs are fully
//! reproducible from their random seed, and independent replicates can be
//! spread over worker threads with [`run_replicates`].
//!
//! ```no_run
//! use vaxnet::{Parameters, Simulation};
//!
//! let parameters = Parameters {
//!     random_seed: Some(42),
//!     ..Parameters::default()
//! };
//! let summary = Simulation::run(parameters).unwrap();
//! println!("{} transmissions", summary.transmissions);
//! ```
pub mod active_cases;
pub mod error;
pub mod event;
pub mod log;
pub mod network;
pub mod parameters;
pub mod plan;
pub mod random;
pub mod replicates;
pub mod runner;
pub mod simulation;
pub mod status;
pub mod summary;
pub mod tier;
pub mod transmission;
pub mod vaccination;
pub mod voter;

// Re-exported for use in macros and by models that name stream types.
pub use rand;

/// Nodes are numbered `0..population`, tier by tier.
pub type NodeId = usize;

pub use error::SimError;
pub use event::{Event, EventKind, EventRecord, Outcome};
pub use network::{Adjacency, NetworkParameters, Networks};
pub use parameters::{load_parameters_from_json, Parameters};
pub use replicates::{run_replicates, ReplicateSummary};
pub use simulation::{Progress, Simulation};
pub use summary::{OutbreakOutcome, Summary};
pub use tier::{PerTier, Tier, TierLayout};
