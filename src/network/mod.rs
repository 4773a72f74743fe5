//! Physical-contact and behavioural-influence graphs.
//!
//! Both graphs cover the whole population. The physical graph carries
//! transmission; the behavioural graph carries opinion. They share the ring
//! lattice of each tier and some mirrored random links, but are otherwise
//! built independently. See [`builder`] for the construction procedure.
mod adjacency;
pub mod builder;

pub use adjacency::Adjacency;
pub use builder::NetworkBuilder;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::tier::{PerTier, Tier};

/// The two graphs a simulation runs on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Networks {
    pub physical: Adjacency,
    pub behavioral: Adjacency,
}

/// Link densities within one tier. Densities are per node and are multiplied
/// by [`NetworkParameters::contact_factor`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierLinks {
    /// Each node is linked to the next `ring_degree` nodes of its tier.
    pub ring_degree: usize,
    /// Random physical links, added to no existing physical link.
    pub physical_links: f64,
    /// Random behavioural links.
    pub behavioral_links: f64,
    /// Chance that a random physical link is copied into the behavioural graph.
    pub mirror_probability: f64,
}

/// Links between two tiers. Densities are per node of `from`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossTierLinks {
    pub from: Tier,
    pub to: Tier,
    pub physical_links: f64,
    /// Behavioural-only links, added between nodes not already linked in either graph.
    pub behavioral_links: f64,
    pub mirror_probability: f64,
    /// When set, behavioural links across the pair only let the younger node
    /// listen to the older one.
    pub directional: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParameters {
    /// Scales daily contact-survey densities to the simulated contact period.
    pub contact_factor: f64,
    pub tiers: PerTier<TierLinks>,
    pub cross_tier: Vec<CrossTierLinks>,
    /// Consecutive rejected draws allowed before an edge is declared impossible.
    pub max_redraws: usize,
}

impl Default for NetworkParameters {
    fn default() -> Self {
        NetworkParameters {
            contact_factor: 3.0,
            tiers: PerTier {
                child: TierLinks {
                    ring_degree: 2,
                    physical_links: 0.5,
                    behavioral_links: 0.5,
                    mirror_probability: 0.0,
                },
                adult: TierLinks {
                    ring_degree: 2,
                    physical_links: 0.5,
                    behavioral_links: 0.75,
                    mirror_probability: 0.0,
                },
                elderly: TierLinks {
                    ring_degree: 0,
                    physical_links: 0.75,
                    behavioral_links: 0.25,
                    mirror_probability: 0.5,
                },
            },
            cross_tier: vec![
                CrossTierLinks {
                    from: Tier::Child,
                    to: Tier::Adult,
                    physical_links: 0.3,
                    behavioral_links: 0.1,
                    mirror_probability: 0.5,
                    directional: true,
                },
                CrossTierLinks {
                    from: Tier::Adult,
                    to: Tier::Elderly,
                    physical_links: 0.1,
                    behavioral_links: 0.1,
                    mirror_probability: 0.5,
                    directional: false,
                },
                CrossTierLinks {
                    from: Tier::Child,
                    to: Tier::Elderly,
                    physical_links: 0.1,
                    behavioral_links: 0.05,
                    mirror_probability: 0.5,
                    directional: true,
                },
            ],
            max_redraws: 10_000,
        }
    }
}

fn check_density(name: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(
            name,
            format!("must be non-negative and finite, got {value}"),
        ))
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), SimError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::invalid(
            name,
            format!("must lie in [0, 1], got {value}"),
        ))
    }
}

impl NetworkParameters {
    /// A network made of tier rings only.
    #[must_use]
    pub fn rings_only() -> Self {
        NetworkParameters {
            contact_factor: 0.0,
            ..NetworkParameters::default()
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidParameter` for negative or non-finite densities,
    /// probabilities outside `[0, 1]`, a tier linked to itself, or a zero
    /// redraw cap.
    pub fn validate(&self) -> Result<(), SimError> {
        check_density("network.contact_factor", self.contact_factor)?;
        for tier in Tier::ALL {
            let links = self.tiers.get(tier);
            check_density("network.tiers.physical_links", links.physical_links)?;
            check_density("network.tiers.behavioral_links", links.behavioral_links)?;
            check_probability("network.tiers.mirror_probability", links.mirror_probability)?;
        }
        for link in &self.cross_tier {
            if link.from == link.to {
                return Err(SimError::invalid(
                    "network.cross_tier",
                    format!("cannot link tier {} to itself", link.from),
                ));
            }
            check_density("network.cross_tier.physical_links", link.physical_links)?;
            check_density("network.cross_tier.behavioral_links", link.behavioral_links)?;
            check_probability(
                "network.cross_tier.mirror_probability",
                link.mirror_probability,
            )?;
        }
        if self.max_redraws == 0 {
            return Err(SimError::invalid(
                "network.max_redraws",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(NetworkParameters::default().validate().is_ok());
        assert!(NetworkParameters::rings_only().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut parameters = NetworkParameters::default();
        parameters.contact_factor = -1.0;
        assert!(parameters.validate().is_err());

        let mut parameters = NetworkParameters::default();
        parameters.tiers.elderly.mirror_probability = 1.5;
        assert!(parameters.validate().is_err());

        let mut parameters = NetworkParameters::default();
        parameters.cross_tier[0].to = Tier::Child;
        assert!(parameters.validate().is_err());

        let mut parameters = NetworkParameters::default();
        parameters.max_redraws = 0;
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn deserializes_partial_json() {
        let parameters: NetworkParameters =
            serde_json::from_str(r#"{ "contact_factor": 1.5 }"#).unwrap();
        assert!((parameters.contact_factor - 1.5).abs() < f64::EPSILON);
        assert_eq!(parameters.cross_tier.len(), 3);
        assert_eq!(parameters.tiers.elderly.ring_degree, 0);
    }
}
