//! Age tiers and the contiguous index ranges they occupy.
//!
//! Nodes are plain indices in `[0, total)`. The first `N1` indices are
//! children, the next `N2` adults and the last `N3` elderly people, so tier
//! membership never needs to be stored per node.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::NodeId;

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tier {
    Child,
    Adult,
    Elderly,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Child, Tier::Adult, Tier::Elderly];
}

/// A value per tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerTier<T> {
    pub child: T,
    pub adult: T,
    pub elderly: T,
}

impl<T> PerTier<T> {
    pub fn get(&self, tier: Tier) -> &T {
        match tier {
            Tier::Child => &self.child,
            Tier::Adult => &self.adult,
            Tier::Elderly => &self.elderly,
        }
    }
}

/// Tier sizes and the boundaries derived from them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TierLayout {
    sizes: [usize; 3],
}

impl TierLayout {
    #[must_use]
    pub fn new(children: usize, adults: usize, elderly: usize) -> Self {
        TierLayout {
            sizes: [children, adults, elderly],
        }
    }

    fn index(tier: Tier) -> usize {
        match tier {
            Tier::Child => 0,
            Tier::Adult => 1,
            Tier::Elderly => 2,
        }
    }

    #[must_use]
    pub fn size(&self, tier: Tier) -> usize {
        self.sizes[Self::index(tier)]
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.sizes.iter().sum()
    }

    /// First global index of `tier`.
    #[must_use]
    pub fn offset(&self, tier: Tier) -> usize {
        self.sizes[..Self::index(tier)].iter().sum()
    }

    #[must_use]
    pub fn range(&self, tier: Tier) -> Range<NodeId> {
        let start = self.offset(tier);
        start..start + self.size(tier)
    }

    /// # Panics
    ///
    /// Panics if `node` is outside the population.
    #[must_use]
    pub fn tier_of(&self, node: NodeId) -> Tier {
        let [children, adults, elderly] = self.sizes;
        if node < children {
            Tier::Child
        } else if node < children + adults {
            Tier::Adult
        } else {
            assert!(
                node < children + adults + elderly,
                "node {node} is outside the population"
            );
            Tier::Elderly
        }
    }
}
