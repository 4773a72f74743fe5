//! Named random number streams.
//!
//! Every stochastic concern in a run (network construction, transmission,
//! severity, vaccination, opinion) draws from its own generator. Each
//! generator is seeded from the run's base seed offset by a hash of the
//! stream's name, so adding draws to one concern never perturbs another and a
//! fixed base seed replays a run exactly.
mod context_ext;
mod lognormal;
mod macros;

use std::any::{Any, TypeId};
use std::cell::RefCell;

use rustc_hash::FxHashMap as HashMap;

pub use context_ext::RandomExt;
pub use lognormal::{
    days_to_seconds, ModeDispersion, SeverityDistribution, WaitTime, SECONDS_PER_DAY,
};
pub use macros::define_rng;

use crate::rand::{Rng, SeedableRng};

pub trait RngId: Copy + Clone + 'static {
    type RngType: SeedableRng + Rng + 'static;
    fn get_name() -> &'static str;
}

// This is a wrapper that allows for future support for different types of
// random number generators (anything that implements SeedableRng is valid).
struct RngHolder {
    rng: Box<dyn Any>,
}

/// Stores a base seed for all rngs and the rngs themselves, keyed by their
/// `RngId`. The map lives in a `RefCell` so a sample can be drawn through a
/// shared reference while other parts of the simulation are borrowed.
pub struct RandomStreams {
    base_seed: u64,
    rng_holders: RefCell<HashMap<TypeId, RngHolder>>,
}

impl RandomStreams {
    /// Rngs are created lazily the first time a stream is sampled.
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        RandomStreams {
            base_seed,
            rng_holders: RefCell::new(HashMap::default()),
        }
    }
}

impl RandomExt for RandomStreams {
    fn random_streams(&self) -> &RandomStreams {
        self
    }
}
