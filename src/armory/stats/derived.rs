use serde::{Deserialize, Serialize};

use super::base::BaseStats;
use super::types::StatName;

/// Stats after all equipped attachments are applied, with the untouched base kept
/// alongside for delta display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    #[serde(flatten)]
    pub stats: BaseStats,
    #[serde(rename = "baseStats")]
    pub base_stats: BaseStats,
}

impl DerivedStats {
    pub fn from_base(base: &BaseStats) -> Self {
        Self {
            stats: base.clone(),
            base_stats: base.clone(),
        }
    }

    /// Signed change of a stat against the base.
    pub fn delta(&self, stat: StatName) -> f64 {
        self.stats.value(stat) - self.base_stats.value(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_flat_with_embedded_base() {
        let derived = DerivedStats::from_base(&BaseStats::default());
        let value = serde_json::to_value(&derived).unwrap();
        assert!(value.get("weight").is_some());
        assert!(value.get("sightingRange").is_some());
        assert!(value["baseStats"].get("weight").is_some());

        let back: DerivedStats = serde_json::from_value(value).unwrap();
        assert_eq!(back, derived);
    }

    #[test]
    fn delta_is_zero_without_attachments() {
        let derived = DerivedStats::from_base(&BaseStats::default());
        for stat in StatName::ALL {
            assert_eq!(derived.delta(stat), 0.0);
        }
    }
}
