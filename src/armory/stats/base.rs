use serde::{Deserialize, Serialize};

use super::types::{Durability, StatName};

/// Zero-attachment reference stats of a weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStats {
    pub durability: Durability,
    pub weight: f64,
    pub ergonomics: f64,
    pub accuracy: f64,
    pub sighting_range: f64,
    pub vertical_recoil: f64,
    pub horizontal_recoil: f64,
    pub muzzle_velocity: f64,
    pub effective_distance: f64,
    pub fire_rate: f64,
    #[serde(default)]
    pub firing_modes: Vec<String>,
    #[serde(default)]
    pub caliber: String,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            durability: Durability::new(100, 100),
            weight: 3.0,
            ergonomics: 60.0,
            accuracy: 75.0,
            sighting_range: 500.0,
            vertical_recoil: 70.0,
            horizontal_recoil: 150.0,
            muzzle_velocity: 850.0,
            effective_distance: 500.0,
            fire_rate: 800.0,
            firing_modes: vec!["Single Fire".into(), "Full Auto".into()],
            caliber: String::new(),
        }
    }
}

impl BaseStats {
    /// Scalar stat slot. `None` for durability, which is a two-field record.
    pub fn scalar_mut(&mut self, stat: StatName) -> Option<&mut f64> {
        match stat {
            StatName::Durability => None,
            StatName::Weight => Some(&mut self.weight),
            StatName::Ergonomics => Some(&mut self.ergonomics),
            StatName::Accuracy => Some(&mut self.accuracy),
            StatName::SightingRange => Some(&mut self.sighting_range),
            StatName::VerticalRecoil => Some(&mut self.vertical_recoil),
            StatName::HorizontalRecoil => Some(&mut self.horizontal_recoil),
            StatName::MuzzleVelocity => Some(&mut self.muzzle_velocity),
            StatName::EffectiveDistance => Some(&mut self.effective_distance),
            StatName::FireRate => Some(&mut self.fire_rate),
        }
    }

    /// Numeric view of a stat. Durability reads as its `max`.
    pub fn value(&self, stat: StatName) -> f64 {
        match stat {
            StatName::Durability => f64::from(self.durability.max),
            StatName::Weight => self.weight,
            StatName::Ergonomics => self.ergonomics,
            StatName::Accuracy => self.accuracy,
            StatName::SightingRange => self.sighting_range,
            StatName::VerticalRecoil => self.vertical_recoil,
            StatName::HorizontalRecoil => self.horizontal_recoil,
            StatName::MuzzleVelocity => self.muzzle_velocity,
            StatName::EffectiveDistance => self.effective_distance,
            StatName::FireRate => self.fire_rate,
        }
    }
}
