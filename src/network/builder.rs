//! Randomised construction of the physical and behavioural graphs.
//!
//! Construction runs tier by tier and then across tiers:
//!
//! 1. Each node is linked to the next `ring_degree` nodes of its tier, wrapping
//!    around. Ring links go into both graphs.
//! 2. Random physical links join two distinct nodes of the tier that are not
//!    already physically linked. Each may be copied into the behavioural graph.
//! 3. Random behavioural links join two distinct nodes of the tier.
//! 4. For every configured tier pair, random physical links join a node of
//!    each tier, optionally mirrored into the behavioural graph. Directional
//!    mirrors only let the younger node hear the older one.
//! 5. Behavioural-only links join tier pairs not yet linked in either graph.
//!
//! The number of random links at each step is `round(size * density *
//! contact_factor)`. Rejected draws are retried up to `max_redraws` times in a
//! row before the build fails with [`SimError::NetworkExhausted`].

use std::ops::Range;

use log::{debug, info, trace};

use crate::define_rng;
use crate::error::SimError;
use crate::network::{Adjacency, CrossTierLinks, NetworkParameters, Networks};
use crate::random::RandomExt;
use crate::tier::{Tier, TierLayout};
use crate::NodeId;

define_rng!(NetworkRng);

pub struct NetworkBuilder<'a, R: RandomExt + ?Sized> {
    parameters: &'a NetworkParameters,
    layout: TierLayout,
    random: &'a R,
    networks: Networks,
}

/// Builds both graphs for `layout`, drawing from the network stream of
/// `random`.
///
/// # Errors
///
/// Returns `NetworkExhausted` if some requested link cannot be placed.
pub fn build<R: RandomExt + ?Sized>(
    parameters: &NetworkParameters,
    layout: TierLayout,
    random: &R,
) -> Result<Networks, SimError> {
    NetworkBuilder::new(parameters, layout, random).build()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn link_count(size: usize, density: f64, contact_factor: f64) -> usize {
    (size as f64 * density * contact_factor).round() as usize
}

impl<'a, R: RandomExt + ?Sized> NetworkBuilder<'a, R> {
    #[must_use]
    pub fn new(parameters: &'a NetworkParameters, layout: TierLayout, random: &'a R) -> Self {
        let total = layout.total();
        NetworkBuilder {
            parameters,
            layout,
            random,
            networks: Networks {
                physical: Adjacency::new(total),
                behavioral: Adjacency::new(total),
            },
        }
    }

    /// # Errors
    ///
    /// Returns `NetworkExhausted` if some requested link cannot be placed.
    pub fn build(mut self) -> Result<Networks, SimError> {
        for tier in Tier::ALL {
            self.link_ring(tier);
            self.physical_small_world(tier)?;
            self.behavioral_small_world(tier)?;
        }
        let parameters = self.parameters;
        for link in &parameters.cross_tier {
            self.cross_tier_physical(link)?;
        }
        for link in &parameters.cross_tier {
            self.cross_tier_behavioral(link)?;
        }

        info!(
            "built networks for {} nodes: mean physical degree {:.3}, mean behavioral degree {:.3}",
            self.layout.total(),
            self.networks.physical.mean_degree(),
            self.networks.behavioral.mean_degree()
        );
        Ok(self.networks)
    }

    fn link_ring(&mut self, tier: Tier) {
        let ring_degree = self.parameters.tiers.get(tier).ring_degree;
        let range = self.layout.range(tier);
        let size = range.len();
        if ring_degree == 0 || size < 2 {
            return;
        }
        for local in 0..size {
            for step in 1..=ring_degree {
                let target = (local + step) % size;
                if target == local {
                    continue;
                }
                let (a, b) = (range.start + local, range.start + target);
                self.networks.physical.add_edge(a, b);
                self.networks.behavioral.add_edge(a, b);
            }
        }
        debug!("linked {tier} ring of {size} nodes with degree {ring_degree}");
    }

    fn physical_small_world(&mut self, tier: Tier) -> Result<(), SimError> {
        let links = *self.parameters.tiers.get(tier);
        let range = self.layout.range(tier);
        let count = link_count(range.len(), links.physical_links, self.parameters.contact_factor);
        let stage = format!(
            "{tier} physical small-world (density {} x contact factor {})",
            links.physical_links, self.parameters.contact_factor
        );
        Self::check_within_tier_capacity(&stage, range.len(), count)?;

        for _ in 0..count {
            let (a, b) = self.draw_pair(&stage, &range, &range, |networks, a, b| {
                a == b || networks.physical.contains(a, b)
            })?;
            self.networks.physical.add_edge(a, b);
            if self.mirror(links.mirror_probability) {
                self.networks.behavioral.add_edge(a, b);
            }
        }
        debug!("added {count} links in {stage}");
        Ok(())
    }

    fn behavioral_small_world(&mut self, tier: Tier) -> Result<(), SimError> {
        let links = *self.parameters.tiers.get(tier);
        let range = self.layout.range(tier);
        let count = link_count(range.len(), links.behavioral_links, self.parameters.contact_factor);
        let stage = format!(
            "{tier} behavioral small-world (density {} x contact factor {})",
            links.behavioral_links, self.parameters.contact_factor
        );
        if count > 0 && range.len() < 2 {
            return Err(SimError::NetworkExhausted { stage, attempts: 0 });
        }

        for _ in 0..count {
            let (a, b) = self.draw_pair(&stage, &range, &range, |_, a, b| a == b)?;
            self.networks.behavioral.add_edge(a, b);
        }
        debug!("added {count} links in {stage}");
        Ok(())
    }

    fn cross_tier_physical(&mut self, link: &CrossTierLinks) -> Result<(), SimError> {
        let (from, to) = (self.layout.range(link.from), self.layout.range(link.to));
        if from.is_empty() || to.is_empty() {
            debug!("skipping {} -> {} links, a tier is empty", link.from, link.to);
            return Ok(());
        }
        let count = link_count(from.len(), link.physical_links, self.parameters.contact_factor);
        let stage = format!(
            "{} -> {} physical links (density {} x contact factor {})",
            link.from, link.to, link.physical_links, self.parameters.contact_factor
        );
        if count > from.len() * to.len() {
            return Err(SimError::NetworkExhausted { stage, attempts: 0 });
        }

        for _ in 0..count {
            let (a, b) = self.draw_pair(&stage, &from, &to, |networks, a, b| {
                networks.physical.contains(a, b)
            })?;
            self.networks.physical.add_edge(a, b);
            if self.mirror(link.mirror_probability) {
                self.add_behavioral(link, a, b);
            }
        }
        debug!("added {count} links in {stage}");
        Ok(())
    }

    fn cross_tier_behavioral(&mut self, link: &CrossTierLinks) -> Result<(), SimError> {
        let (from, to) = (self.layout.range(link.from), self.layout.range(link.to));
        if from.is_empty() || to.is_empty() {
            return Ok(());
        }
        let count = link_count(from.len(), link.behavioral_links, self.parameters.contact_factor);
        let stage = format!(
            "{} -> {} behavioral links (density {} x contact factor {})",
            link.from, link.to, link.behavioral_links, self.parameters.contact_factor
        );
        if count > from.len() * to.len() {
            return Err(SimError::NetworkExhausted { stage, attempts: 0 });
        }

        for _ in 0..count {
            let (a, b) = self.draw_pair(&stage, &from, &to, |networks, a, b| {
                networks.physical.connected(a, b) || networks.behavioral.connected(a, b)
            })?;
            self.add_behavioral(link, a, b);
        }
        debug!("added {count} links in {stage}");
        Ok(())
    }

    /// `a` belongs to `link.from` and `b` to `link.to`.
    fn add_behavioral(&mut self, link: &CrossTierLinks, a: NodeId, b: NodeId) {
        if link.directional {
            let (younger, older) = if link.from < link.to { (a, b) } else { (b, a) };
            self.networks.behavioral.add_arc(younger, older);
        } else {
            self.networks.behavioral.add_edge(a, b);
        }
    }

    fn mirror(&self, probability: f64) -> bool {
        probability > 0.0 && self.random.sample_bool(NetworkRng, probability)
    }

    fn check_within_tier_capacity(stage: &str, size: usize, count: usize) -> Result<(), SimError> {
        let distinct_pairs = size * size.saturating_sub(1) / 2;
        if count > distinct_pairs {
            return Err(SimError::NetworkExhausted {
                stage: stage.to_string(),
                attempts: 0,
            });
        }
        Ok(())
    }

    /// Draws `(a, b)` with `a` uniform in `from` and `b` uniform in `to`,
    /// redrawing while `reject` holds.
    fn draw_pair(
        &self,
        stage: &str,
        from: &Range<NodeId>,
        to: &Range<NodeId>,
        reject: impl Fn(&Networks, NodeId, NodeId) -> bool,
    ) -> Result<(NodeId, NodeId), SimError> {
        let max_redraws = self.parameters.max_redraws;
        for attempt in 0..=max_redraws {
            let a = self.random.sample_range(NetworkRng, from.clone());
            let b = self.random.sample_range(NetworkRng, to.clone());
            if !reject(&self.networks, a, b) {
                if attempt > 0 {
                    trace!("{stage}: placed ({a}, {b}) after {attempt} redraws");
                }
                return Ok((a, b));
            }
        }
        Err(SimError::NetworkExhausted {
            stage: stage.to_string(),
            attempts: max_redraws,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::TierLinks;
    use crate::random::RandomStreams;
    use crate::tier::PerTier;

    fn no_links() -> TierLinks {
        TierLinks {
            ring_degree: 0,
            physical_links: 0.0,
            behavioral_links: 0.0,
            mirror_probability: 0.0,
        }
    }

    fn default_networks(seed: u64) -> Networks {
        let streams = RandomStreams::new(seed);
        build(
            &NetworkParameters::default(),
            TierLayout::new(190, 625, 185),
            &streams,
        )
        .unwrap()
    }

    #[test]
    fn every_node_is_present() {
        let networks = default_networks(1);
        assert_eq!(networks.physical.len(), 1000);
        assert_eq!(networks.behavioral.len(), 1000);
    }

    #[test]
    fn no_self_loops() {
        let networks = default_networks(2);
        assert!(!networks.physical.has_self_loops());
        assert!(!networks.behavioral.has_self_loops());
    }

    #[test]
    fn physical_graph_is_symmetric() {
        let networks = default_networks(3);
        for (node, neighbours) in networks.physical.iter() {
            for &other in neighbours {
                assert!(networks.physical.contains(other, node));
            }
        }
    }

    #[test]
    fn physical_small_world_adds_no_repeats_within_elderly_tier() {
        // The elderly tier has no ring, so every within-tier physical link is random.
        let networks = default_networks(4);
        let layout = TierLayout::new(190, 625, 185);
        let elderly = layout.range(Tier::Elderly);
        for node in elderly.clone() {
            let mut within: Vec<NodeId> = networks
                .physical
                .neighbours(node)
                .iter()
                .copied()
                .filter(|other| elderly.contains(other))
                .collect();
            let before = within.len();
            within.sort_unstable();
            within.dedup();
            assert_eq!(within.len(), before);
        }
    }

    #[test]
    fn ring_only_network() {
        let streams = RandomStreams::new(5);
        let networks = build(
            &NetworkParameters::rings_only(),
            TierLayout::new(6, 0, 0),
            &streams,
        )
        .unwrap();

        for node in 0..6 {
            assert_eq!(networks.physical.degree(node), 4);
            assert_eq!(networks.behavioral.degree(node), 4);
        }
        let mut neighbours = networks.physical.neighbours(0).to_vec();
        neighbours.sort_unstable();
        assert_eq!(neighbours, vec![1, 2, 4, 5]);
    }

    #[test]
    fn same_seed_same_networks() {
        assert_eq!(default_networks(9), default_networks(9));
        assert_ne!(default_networks(9), default_networks(10));
    }

    #[test]
    fn saturated_tier_exhausts_redraws() {
        // A ring of degree two on three nodes already joins every pair.
        let parameters = NetworkParameters {
            contact_factor: 1.0,
            tiers: PerTier {
                child: TierLinks {
                    ring_degree: 2,
                    physical_links: 1.0,
                    ..no_links()
                },
                adult: no_links(),
                elderly: no_links(),
            },
            cross_tier: Vec::new(),
            max_redraws: 100,
        };
        let streams = RandomStreams::new(6);
        match build(&parameters, TierLayout::new(3, 0, 0), &streams) {
            Err(SimError::NetworkExhausted { attempts, .. }) => assert_eq!(attempts, 100),
            other => panic!("expected NetworkExhausted, got {other:?}"),
        }
    }

    #[test]
    fn impossible_request_fails_immediately() {
        let streams = RandomStreams::new(7);
        match build(
            &NetworkParameters::default(),
            TierLayout::new(1, 0, 0),
            &streams,
        ) {
            Err(SimError::NetworkExhausted { attempts, stage }) => {
                assert_eq!(attempts, 0);
                assert!(stage.contains("child"));
            }
            other => panic!("expected NetworkExhausted, got {other:?}"),
        }
    }

    #[test]
    fn exhausted_message_names_tier_and_density() {
        let streams = RandomStreams::new(7);
        let error = build(
            &NetworkParameters::default(),
            TierLayout::new(1, 0, 0),
            &streams,
        )
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "network construction failed in child physical small-world \
             (density 0.5 x contact factor 3): more links requested than distinct pairs"
        );
    }

    fn edge_count(adjacency: &Adjacency) -> usize {
        adjacency.iter().map(|(_, n)| n.len()).sum::<usize>() / 2
    }

    fn mirrored_small_world(mirror_probability: f64, size: usize, seed: u64) -> Networks {
        let parameters = NetworkParameters {
            contact_factor: 1.0,
            tiers: PerTier {
                child: no_links(),
                adult: no_links(),
                elderly: TierLinks {
                    physical_links: 1.0,
                    mirror_probability,
                    ..no_links()
                },
            },
            cross_tier: Vec::new(),
            max_redraws: 1000,
        };
        let streams = RandomStreams::new(seed);
        build(&parameters, TierLayout::new(0, 0, size), &streams).unwrap()
    }

    #[test]
    fn small_world_mirror_copies_every_physical_link() {
        let networks = mirrored_small_world(1.0, 20, 14);
        assert_eq!(edge_count(&networks.physical), 20);
        for (node, neighbours) in networks.physical.iter() {
            for &other in neighbours {
                assert!(networks.behavioral.contains(node, other));
            }
        }
        assert_eq!(networks.physical, networks.behavioral);
    }

    #[test]
    fn small_world_half_mirror_copies_about_half() {
        let networks = mirrored_small_world(0.5, 200, 15);
        assert_eq!(edge_count(&networks.physical), 200);
        let mirrored = edge_count(&networks.behavioral);
        assert!((70..=130).contains(&mirrored), "mirrored {mirrored} of 200");
        for (node, neighbours) in networks.behavioral.iter() {
            for &other in neighbours {
                assert!(networks.physical.contains(node, other));
            }
        }
    }

    #[test]
    fn small_world_without_mirror_leaves_behavior_empty() {
        let networks = mirrored_small_world(0.0, 50, 16);
        assert_eq!(edge_count(&networks.physical), 50);
        assert_eq!(edge_count(&networks.behavioral), 0);
    }

    #[test]
    fn cross_tier_half_mirror_copies_about_half() {
        let parameters = NetworkParameters {
            contact_factor: 1.0,
            tiers: PerTier {
                child: no_links(),
                adult: no_links(),
                elderly: no_links(),
            },
            cross_tier: vec![CrossTierLinks {
                from: Tier::Child,
                to: Tier::Adult,
                physical_links: 1.0,
                behavioral_links: 0.0,
                mirror_probability: 0.5,
                directional: false,
            }],
            max_redraws: 1000,
        };
        let streams = RandomStreams::new(17);
        let networks = build(&parameters, TierLayout::new(200, 200, 0), &streams).unwrap();

        assert_eq!(edge_count(&networks.physical), 200);
        let mirrored = edge_count(&networks.behavioral);
        assert!((70..=130).contains(&mirrored), "mirrored {mirrored} of 200");
    }

    #[test]
    fn directional_mirror_points_younger_to_older() {
        let parameters = NetworkParameters {
            contact_factor: 1.0,
            tiers: PerTier {
                child: no_links(),
                adult: no_links(),
                elderly: no_links(),
            },
            cross_tier: vec![CrossTierLinks {
                from: Tier::Child,
                to: Tier::Adult,
                physical_links: 1.0,
                behavioral_links: 0.0,
                mirror_probability: 1.0,
                directional: true,
            }],
            max_redraws: 1000,
        };
        let streams = RandomStreams::new(8);
        let layout = TierLayout::new(10, 10, 0);
        let networks = build(&parameters, layout, &streams).unwrap();

        let child_arcs: usize = layout
            .range(Tier::Child)
            .map(|node| networks.behavioral.degree(node))
            .sum();
        assert_eq!(child_arcs, 10);
        for adult in layout.range(Tier::Adult) {
            assert_eq!(networks.behavioral.degree(adult), 0);
        }
        for child in layout.range(Tier::Child) {
            for &other in networks.behavioral.neighbours(child) {
                assert_eq!(layout.tier_of(other), Tier::Adult);
                assert!(networks.physical.contains(child, other));
            }
        }
    }

    #[test]
    fn behavioral_cross_links_avoid_existing_pairs() {
        let parameters = NetworkParameters {
            contact_factor: 1.0,
            tiers: PerTier {
                child: no_links(),
                adult: no_links(),
                elderly: no_links(),
            },
            cross_tier: vec![CrossTierLinks {
                from: Tier::Adult,
                to: Tier::Elderly,
                physical_links: 1.0,
                behavioral_links: 1.0,
                mirror_probability: 0.0,
                directional: false,
            }],
            max_redraws: 1000,
        };
        let streams = RandomStreams::new(12);
        let layout = TierLayout::new(0, 8, 8);
        let networks = build(&parameters, layout, &streams).unwrap();

        for (node, neighbours) in networks.behavioral.iter() {
            for &other in neighbours {
                assert!(!networks.physical.connected(node, other));
            }
        }
        assert_eq!(
            networks.behavioral.iter().map(|(_, n)| n.len()).sum::<usize>(),
            16
        );
    }

    #[test]
    fn empty_tier_pair_is_skipped() {
        let streams = RandomStreams::new(13);
        let mut parameters = NetworkParameters::default();
        parameters.tiers.elderly = no_links();
        let networks = build(&parameters, TierLayout::new(50, 50, 0), &streams).unwrap();
        assert_eq!(networks.physical.len(), 100);
    }
}
