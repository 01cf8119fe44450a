use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named bucket starting at `min_tps` (inclusive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankTier {
    pub name: String,
    pub message: String,
    pub min_tps: f64,
}

impl RankTier {
    pub fn new(name: &str, message: &str, min_tps: f64) -> Self {
        Self {
            name: name.to_string(),
            message: message.to_string(),
            min_tps,
        }
    }
}

pub fn default_tiers() -> Vec<RankTier> {
    vec![
        RankTier::new("Sloth", "Warming up. Those thumbs have more in them.", 0.0),
        RankTier::new("Turtle", "Steady taps. Now find another gear.", 3.0),
        RankTier::new("Rabbit", "Quick fingers! Solid round.", 5.0),
        RankTier::new("Cheetah", "Blazing. Few can keep up with that.", 7.0),
        RankTier::new("Lightning", "Unreal speed. Tap legend.", 9.0),
    ]
}

/// Ordered tier table. Every real TPS value lands in exactly one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct RankTable {
    tiers: Vec<RankTier>,
}

impl RankTable {
    /// Tiers must be non-empty, start at 0 and ascend strictly
    pub fn new(tiers: Vec<RankTier>) -> Result<Self> {
        let first = tiers
            .first()
            .ok_or_else(|| Error::InvalidRankTable("no tiers".to_string()))?;
        if first.min_tps != 0.0 {
            return Err(Error::InvalidRankTable(format!(
                "lowest tier '{}' must start at 0, not {}",
                first.name, first.min_tps
            )));
        }
        for pair in tiers.windows(2) {
            if !(pair[1].min_tps > pair[0].min_tps) {
                return Err(Error::InvalidRankTable(format!(
                    "tier '{}' ({}) does not ascend past '{}' ({})",
                    pair[1].name, pair[1].min_tps, pair[0].name, pair[0].min_tps
                )));
            }
        }
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[RankTier] {
        &self.tiers
    }

    /// Index of the highest tier whose threshold `tps` meets; NaN and negatives fall to 0
    pub fn index_of(&self, tps: f64) -> usize {
        self.tiers
            .iter()
            .rposition(|tier| tps >= tier.min_tps)
            .unwrap_or(0)
    }

    pub fn classify(&self, tps: f64) -> &RankTier {
        &self.tiers[self.index_of(tps)]
    }
}

impl Default for RankTable {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cut_points() {
        let table = RankTable::default();
        assert_eq!(table.classify(0.0).name, "Sloth");
        assert_eq!(table.classify(2.99).name, "Sloth");
        assert_eq!(table.classify(4.5).name, "Turtle");
        assert_eq!(table.classify(6.0).name, "Rabbit");
        assert_eq!(table.classify(8.9).name, "Cheetah");
        assert_eq!(table.classify(9.0).name, "Lightning");
        assert_eq!(table.classify(120.0).name, "Lightning");
    }

    #[test]
    fn boundary_value_belongs_to_higher_tier() {
        let table = RankTable::default();
        assert_eq!(table.index_of(3.0), 1);
        assert_eq!(table.index_of(5.0), 2);
        assert_eq!(table.index_of(7.0), 3);
    }

    #[test]
    fn total_over_odd_inputs() {
        let table = RankTable::default();
        assert_eq!(table.index_of(-1.0), 0);
        assert_eq!(table.index_of(f64::NAN), 0);
        assert_eq!(table.index_of(f64::NEG_INFINITY), 0);
        assert_eq!(table.index_of(f64::INFINITY), 4);
    }

    #[test]
    fn monotonic_over_a_sweep() {
        let table = RankTable::default();
        let mut last = 0;
        for step in 0..=1200 {
            let idx = table.index_of(step as f64 / 100.0);
            assert!(idx >= last, "tier dropped at {}", step);
            last = idx;
        }
        assert_eq!(last, table.tiers().len() - 1);
    }

    #[test]
    fn rejects_empty_table() {
        assert!(matches!(
            RankTable::new(vec![]),
            Err(Error::InvalidRankTable(_))
        ));
    }

    #[test]
    fn rejects_gap_below_first_tier() {
        let tiers = vec![RankTier::new("a", "", 1.0), RankTier::new("b", "", 2.0)];
        assert!(RankTable::new(tiers).is_err());
    }

    #[test]
    fn rejects_overlapping_tiers() {
        let tiers = vec![
            RankTier::new("a", "", 0.0),
            RankTier::new("b", "", 4.0),
            RankTier::new("c", "", 4.0),
        ];
        assert!(RankTable::new(tiers).is_err());
    }

    #[test]
    fn custom_table() {
        let tiers = vec![RankTier::new("slow", "", 0.0), RankTier::new("fast", "", 10.0)];
        let table = RankTable::new(tiers).unwrap();
        assert_eq!(table.classify(9.99).name, "slow");
        assert_eq!(table.classify(10.0).name, "fast");
    }
}
