use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Newtypes ────────────────────────────────────────────────────────

/// Weapon durability. `current` never exceeds `max` after aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Durability {
    pub current: i32,
    pub max: i32,
}

impl Durability {
    pub fn new(current: i32, max: i32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    /// Shift `max` by `delta` and pull `current` down if it now exceeds it.
    /// Durability is whole points, so `delta` is rounded to the nearest one and the
    /// sum saturates at the `i32` bounds.
    pub fn shift_max(self, delta: f64) -> Self {
        let max = self.max.saturating_add(delta.round() as i32);
        Self {
            current: self.current.min(max),
            max,
        }
    }

    pub fn ratio(self) -> f64 {
        if self.max <= 0 {
            return 0.0;
        }
        f64::from(self.current) / f64::from(self.max)
    }
}

// ── Enums ───────────────────────────────────────────────────────────

/// The closed set of numeric stats an attachment may modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatName {
    Durability,
    Weight,
    Ergonomics,
    Accuracy,
    SightingRange,
    VerticalRecoil,
    HorizontalRecoil,
    MuzzleVelocity,
    EffectiveDistance,
    FireRate,
}

impl StatName {
    pub const ALL: [StatName; 10] = [
        StatName::Durability,
        StatName::Weight,
        StatName::Ergonomics,
        StatName::Accuracy,
        StatName::SightingRange,
        StatName::VerticalRecoil,
        StatName::HorizontalRecoil,
        StatName::MuzzleVelocity,
        StatName::EffectiveDistance,
        StatName::FireRate,
    ];

    /// Wire name, as used in catalog documents and exports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Durability => "durability",
            Self::Weight => "weight",
            Self::Ergonomics => "ergonomics",
            Self::Accuracy => "accuracy",
            Self::SightingRange => "sightingRange",
            Self::VerticalRecoil => "verticalRecoil",
            Self::HorizontalRecoil => "horizontalRecoil",
            Self::MuzzleVelocity => "muzzleVelocity",
            Self::EffectiveDistance => "effectiveDistance",
            Self::FireRate => "fireRate",
        }
    }

    /// Stats clamped at zero after every individual modifier application.
    pub fn is_non_negative(self) -> bool {
        matches!(
            self,
            Self::Weight
                | Self::Ergonomics
                | Self::Accuracy
                | Self::SightingRange
                | Self::MuzzleVelocity
                | Self::EffectiveDistance
                | Self::FireRate
        )
    }

    pub fn direction(self) -> StatDirection {
        match self {
            Self::Durability
            | Self::Accuracy
            | Self::MuzzleVelocity
            | Self::SightingRange
            | Self::Ergonomics
            | Self::EffectiveDistance => StatDirection::HigherIsBetter,
            Self::Weight | Self::VerticalRecoil | Self::HorizontalRecoil => {
                StatDirection::LowerIsBetter
            }
            Self::FireRate => StatDirection::Neutral,
        }
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStat(pub String);

impl fmt::Display for UnknownStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown stat name '{}'", self.0)
    }
}

impl std::error::Error for UnknownStat {}

impl FromStr for StatName {
    type Err = UnknownStat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stat| stat.as_str() == s)
            .ok_or_else(|| UnknownStat(s.to_string()))
    }
}

/// Whether a larger value of a stat is an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatDirection {
    HigherIsBetter,
    LowerIsBetter,
    Neutral,
}

/// How a stat moved relative to a reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatChange {
    Better,
    Worse,
    Unchanged,
}

impl StatDirection {
    pub fn classify(self, value: f64, reference: f64) -> StatChange {
        if value == reference {
            return StatChange::Unchanged;
        }
        let higher = value > reference;
        match self {
            Self::HigherIsBetter if higher => StatChange::Better,
            Self::HigherIsBetter => StatChange::Worse,
            Self::LowerIsBetter if higher => StatChange::Worse,
            Self::LowerIsBetter => StatChange::Better,
            Self::Neutral => StatChange::Unchanged,
        }
    }
}
