use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::profile::HolderTier;

/// Inclusive lower bound at which a tier starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThreshold {
    pub min_count: u32,
    pub tier: HolderTier,
}

impl TierThreshold {
    pub const fn new(min_count: u32, tier: HolderTier) -> Self {
        Self { min_count, tier }
    }
}

/// Default thresholds of the collection
pub const DEFAULT_TIER_THRESHOLDS: [TierThreshold; 6] = [
    TierThreshold::new(0, HolderTier::None),
    TierThreshold::new(1, HolderTier::Bronze),
    TierThreshold::new(5, HolderTier::Silver),
    TierThreshold::new(10, HolderTier::Gold),
    TierThreshold::new(20, HolderTier::Diamond),
    TierThreshold::new(50, HolderTier::Whale),
];

/// Step function from a token count to a [`HolderTier`]
///
/// A table is only constructible when it is:
/// * total: the first threshold starts at 0, so every count has a tier
/// * ordered: `min_count` strictly increases
/// * monotonic: tiers strictly increase along with `min_count`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTable {
    thresholds: Vec<TierThreshold>,
}

impl TierTable {
    pub fn new(thresholds: Vec<TierThreshold>) -> Result<Self, Error> {
        let first = thresholds
            .first()
            .ok_or_else(|| Error::Config("Tier table must not be empty".to_string()))?;

        if first.min_count != 0 {
            return Err(Error::Config(format!(
                "Tier table must start at 0, starts at {}",
                first.min_count
            )));
        }

        for pair in thresholds.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            if upper.min_count <= lower.min_count {
                return Err(Error::Config(format!(
                    "Tier thresholds must strictly increase ({} then {})",
                    lower.min_count, upper.min_count
                )));
            }
            if upper.tier <= lower.tier {
                return Err(Error::Config(format!(
                    "Tier {:?} at {} does not rank above {:?}",
                    upper.tier, upper.min_count, lower.tier
                )));
            }
        }

        Ok(Self { thresholds })
    }

    /// Tier of the last threshold whose `min_count` is at most `count`
    pub fn tier_for(&self, count: u32) -> HolderTier {
        let reached = self.thresholds.partition_point(|t| t.min_count <= count);
        // the first threshold is 0 so `reached` is at least 1
        self.thresholds[reached.saturating_sub(1)].tier
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_TIER_THRESHOLDS.to_vec(),
        }
    }
}
