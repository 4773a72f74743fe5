use std::any::TypeId;
use std::cell::RefMut;

use log::trace;
use xxhash_rust::xxh3::xxh3_64;

use crate::rand::distr::uniform::{SampleRange, SampleUniform};
use crate::rand::distr::Distribution;
use crate::rand::{Rng, SeedableRng};
use crate::random::{RandomStreams, RngHolder, RngId};

/// Gets a mutable reference to the random number generator associated with the given
/// [`RngId`]. If the Rng has not been used before, one will be created from the base seed.
///
/// # Panics
///
/// Panics if the same stream is already borrowed, which only happens when a
/// sampler closure tries to sample from the stream it is running on.
fn get_rng<R: RngId>(streams: &RandomStreams) -> RefMut<R::RngType> {
    let rng_holders = streams.rng_holders.borrow_mut();
    RefMut::map(rng_holders, |holders| {
        holders
            .entry(TypeId::of::<R>())
            // Create a new rng holder if it doesn't exist yet
            .or_insert_with(|| {
                trace!(
                    "creating new RNG (seed={}) for stream {}",
                    streams.base_seed,
                    R::get_name()
                );
                let seed_offset = xxh3_64(R::get_name().as_bytes());
                RngHolder {
                    rng: Box::new(R::RngType::seed_from_u64(
                        streams.base_seed.wrapping_add(seed_offset),
                    )),
                }
            })
            .rng
            .downcast_mut::<R::RngType>()
            .expect("rng stored under a different type id")
    })
}

/// Sampling helpers for anything that owns a [`RandomStreams`].
pub trait RandomExt {
    fn random_streams(&self) -> &RandomStreams;

    /// Gets a random sample from the generator associated with the given
    /// [`RngId`] by applying the specified sampler function.
    fn sample<R: RngId, T>(&self, _rng_id: R, sampler: impl FnOnce(&mut R::RngType) -> T) -> T {
        let mut rng = get_rng::<R>(self.random_streams());
        sampler(&mut rng)
    }

    /// Gets a random sample from the specified distribution using the
    /// generator associated with the given [`RngId`].
    fn sample_distr<R: RngId, T>(&self, _rng_id: R, distribution: impl Distribution<T>) -> T {
        let mut rng = get_rng::<R>(self.random_streams());
        distribution.sample::<R::RngType>(&mut rng)
    }

    /// Gets a random sample within the range provided by `range`.
    fn sample_range<R: RngId, S, T>(&self, rng_id: R, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(rng_id, |rng| rng.random_range(range))
    }

    /// Gets a random boolean value which is true with probability `p`.
    /// Probabilities outside `[0, 1]` saturate.
    fn sample_bool<R: RngId>(&self, rng_id: R, p: f64) -> bool {
        self.sample(rng_id, |rng| rng.random::<f64>() < p)
    }
}
