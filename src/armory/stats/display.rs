use super::base::BaseStats;
use super::derived::DerivedStats;
use super::types::{StatChange, StatName};

/// A row in the stats panel. Firing modes and caliber are text-only rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKey {
    Numeric(StatName),
    FiringModes,
    Caliber,
}

pub struct StatGroup {
    pub name: &'static str,
    pub keys: &'static [StatKey],
}

pub const STAT_GROUPS: [StatGroup; 3] = [
    StatGroup {
        name: "Performance",
        keys: &[
            StatKey::Numeric(StatName::Accuracy),
            StatKey::Numeric(StatName::MuzzleVelocity),
            StatKey::Numeric(StatName::EffectiveDistance),
            StatKey::Numeric(StatName::FireRate),
        ],
    },
    StatGroup {
        name: "Control",
        keys: &[
            StatKey::Numeric(StatName::VerticalRecoil),
            StatKey::Numeric(StatName::HorizontalRecoil),
            StatKey::Numeric(StatName::Ergonomics),
            StatKey::Numeric(StatName::Weight),
        ],
    },
    StatGroup {
        name: "Technical",
        keys: &[
            StatKey::Numeric(StatName::Durability),
            StatKey::Numeric(StatName::SightingRange),
            StatKey::FiringModes,
            StatKey::Caliber,
        ],
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct StatLine {
    pub label: String,
    pub value: String,
    /// Bar fill in percent, `None` for text-only rows.
    pub bar: Option<f64>,
    pub change: StatChange,
}

/// "sightingRange" -> "Sighting Range".
pub fn label(wire_name: &str) -> String {
    let mut out = String::with_capacity(wire_name.len() + 4);
    for (i, c) in wire_name.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

/// Whole numbers print without decimals, the rest with at most two.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        return format!("{v:.0}");
    }
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn format_signed(v: f64) -> String {
    if v > 0.0 {
        format!("+{}", format_number(v))
    } else {
        format_number(v)
    }
}

pub fn format_stat(stats: &BaseStats, stat: StatName) -> String {
    let v = format_number(stats.value(stat));
    match stat {
        StatName::Weight => format!("{v} kg"),
        StatName::MuzzleVelocity => format!("{v} m/s"),
        StatName::EffectiveDistance => format!("{v} m"),
        StatName::FireRate => format!("{v} rpm"),
        StatName::Durability => {
            format!("{}/{}", stats.durability.current, stats.durability.max)
        }
        _ => v,
    }
}

fn bar_max(stat: StatName) -> f64 {
    match stat {
        StatName::Weight => 10.0,
        StatName::SightingRange => 1000.0,
        StatName::VerticalRecoil => 200.0,
        StatName::HorizontalRecoil => 400.0,
        StatName::MuzzleVelocity => 1000.0,
        StatName::EffectiveDistance => 1000.0,
        StatName::FireRate => 1200.0,
        StatName::Durability | StatName::Ergonomics | StatName::Accuracy => 100.0,
    }
}

/// Bar fill in percent against a fixed per-stat maximum, capped at 100.
pub fn bar_percentage(stats: &BaseStats, stat: StatName) -> f64 {
    let pct = match stat {
        StatName::Durability => stats.durability.ratio() * 100.0,
        _ => stats.value(stat) * 100.0 / bar_max(stat),
    };
    pct.clamp(0.0, 100.0)
}

pub fn change(derived: &DerivedStats, stat: StatName) -> StatChange {
    stat.direction().classify(derived.delta(stat), 0.0)
}

pub fn stat_line(derived: &DerivedStats, key: StatKey) -> StatLine {
    match key {
        StatKey::Numeric(stat) => StatLine {
            label: label(stat.as_str()),
            value: format_stat(&derived.stats, stat),
            bar: Some(bar_percentage(&derived.stats, stat)),
            change: change(derived, stat),
        },
        StatKey::FiringModes => StatLine {
            label: label("firingModes"),
            value: derived.stats.firing_modes.join(", "),
            bar: None,
            change: StatChange::Unchanged,
        },
        StatKey::Caliber => StatLine {
            label: label("caliber"),
            value: derived.stats.caliber.clone(),
            bar: None,
            change: StatChange::Unchanged,
        },
    }
}

/// All panel rows, grouped.
pub fn stat_panel(derived: &DerivedStats) -> Vec<(&'static str, Vec<StatLine>)> {
    STAT_GROUPS
        .iter()
        .map(|group| {
            let lines = group.keys.iter().map(|&k| stat_line(derived, k)).collect();
            (group.name, lines)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::stats::types::Durability;

    #[test]
    fn labels_split_camel_case() {
        assert_eq!(label("sightingRange"), "Sighting Range");
        assert_eq!(label("weight"), "Weight");
        assert_eq!(label("firingModes"), "Firing Modes");
    }

    #[test]
    fn numbers_drop_trailing_zeros() {
        assert_eq!(format_number(850.0), "850");
        assert_eq!(format_number(3.4), "3.4");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_signed(75.0), "+75");
        assert_eq!(format_signed(-5.0), "-5");
    }

    #[test]
    fn units_follow_stat() {
        let stats = BaseStats {
            durability: Durability::new(95, 100),
            weight: 3.4,
            ..BaseStats::default()
        };
        assert_eq!(format_stat(&stats, StatName::Weight), "3.4 kg");
        assert_eq!(format_stat(&stats, StatName::FireRate), "800 rpm");
        assert_eq!(format_stat(&stats, StatName::Durability), "95/100");
    }

    #[test]
    fn bars_are_capped() {
        let stats = BaseStats {
            fire_rate: 2400.0,
            vertical_recoil: -10.0,
            ..BaseStats::default()
        };
        assert_eq!(bar_percentage(&stats, StatName::FireRate), 100.0);
        assert_eq!(bar_percentage(&stats, StatName::VerticalRecoil), 0.0);
        assert_eq!(bar_percentage(&stats, StatName::Weight), 30.0);
    }

    #[test]
    fn panel_has_three_groups_of_four() {
        let derived = DerivedStats::from_base(&BaseStats::default());
        let panel = stat_panel(&derived);
        assert_eq!(panel.len(), 3);
        assert!(panel.iter().all(|(_, lines)| lines.len() == 4));
        assert_eq!(panel[2].1[2].value, "Single Fire, Full Auto");
        assert!(panel[2].1[2].bar.is_none());
    }
}
