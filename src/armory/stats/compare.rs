use super::base::BaseStats;
use super::types::{StatChange, StatName};

/// One row of the comparison tool: the live loadout against a saved one.
#[derive(Debug, Clone, PartialEq)]
pub struct StatComparison {
    pub stat: StatName,
    pub current: f64,
    pub other: f64,
    /// `current - other`.
    pub difference: f64,
    pub change: StatChange,
}

pub fn compare(current: &BaseStats, other: &BaseStats) -> Vec<StatComparison> {
    StatName::ALL
        .into_iter()
        .map(|stat| {
            let (c, o) = (current.value(stat), other.value(stat));
            StatComparison {
                stat,
                current: c,
                other: o,
                difference: c - o,
                change: stat.direction().classify(c, o),
            }
        })
        .collect()
}
