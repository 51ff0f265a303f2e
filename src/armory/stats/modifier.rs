use serde::{Deserialize, Serialize};

use super::base::BaseStats;
use super::derived::DerivedStats;
use super::types::StatName;
use crate::armory::parts::equipped::EquippedAttachments;

/// A signed delta applied to one stat by an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: StatName,
    pub value: f64,
}

impl StatModifier {
    pub fn new(stat: StatName, value: f64) -> Self {
        Self { stat, value }
    }

    /// Apply this delta in place. Non-negative stats are clamped right after the
    /// addition, so a later positive delta starts from zero, not from a negative sum.
    pub fn apply(&self, stats: &mut BaseStats) {
        if self.stat == StatName::Durability {
            stats.durability = stats.durability.shift_max(self.value);
            return;
        }
        if let Some(slot) = stats.scalar_mut(self.stat) {
            *slot += self.value;
            if self.stat.is_non_negative() {
                *slot = slot.max(0.0);
            }
        }
    }
}

/// Rebuild derived stats from the base and every occupied slot, in slot insertion order.
///
/// Never incremental: unequipping is a recompute with the slot left empty.
pub fn aggregate(base: &BaseStats, equipped: &EquippedAttachments) -> DerivedStats {
    let mut derived = DerivedStats::from_base(base);
    for (_, attachment) in equipped.occupied() {
        for modifier in &attachment.stat_modifiers {
            modifier.apply(&mut derived.stats);
        }
    }
    derived
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::parts::attachment::{Attachment, AttachmentType, Category};
    use crate::armory::stats::types::Durability;

    fn attachment(id: &str, modifiers: &[(StatName, f64)]) -> Attachment {
        Attachment {
            id: id.into(),
            name: id.into(),
            kind: AttachmentType::Muzzle,
            category: Category::Functional,
            compatible_slots: vec![],
            stat_modifiers: modifiers
                .iter()
                .map(|&(stat, value)| StatModifier::new(stat, value))
                .collect(),
            description: None,
            model_path: None,
            image_url: None,
        }
    }

    fn equipped(items: Vec<(&str, Attachment)>) -> EquippedAttachments {
        items
            .into_iter()
            .map(|(slot, a)| (slot.to_string(), Some(a)))
            .collect()
    }

    #[test]
    fn empty_loadout_reproduces_base() {
        let base = BaseStats::default();
        let derived = aggregate(&base, &EquippedAttachments::default());
        assert_eq!(derived.stats, base);
        assert_eq!(derived.base_stats, base);
    }

    #[test]
    fn equip_order_does_not_matter_without_durability() {
        let suppressor = attachment(
            "a1",
            &[
                (StatName::MuzzleVelocity, -15.0),
                (StatName::VerticalRecoil, -10.0),
                (StatName::Weight, 0.5),
            ],
        );
        let grip = attachment(
            "a2",
            &[(StatName::Ergonomics, 10.0), (StatName::VerticalRecoil, -5.0)],
        );
        let base = BaseStats::default();

        let ab = aggregate(
            &base,
            &equipped(vec![("muzzle_1", suppressor.clone()), ("grip_1", grip.clone())]),
        );
        let ba = aggregate(
            &base,
            &equipped(vec![("grip_1", grip), ("muzzle_1", suppressor)]),
        );
        assert_eq!(ab, ba);
        assert_eq!(ab.stats.vertical_recoil, 55.0);
        assert_eq!(ab.stats.ergonomics, 70.0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let base = BaseStats::default();
        let loadout = equipped(vec![(
            "barrel_1",
            attachment(
                "a3",
                &[(StatName::Accuracy, 8.0), (StatName::Weight, 0.8)],
            ),
        )]);
        let first = aggregate(&base, &loadout);
        let second = aggregate(&base, &loadout);
        assert_eq!(first, second);
        assert_eq!(first.stats.weight.to_bits(), second.stats.weight.to_bits());
    }

    #[test]
    fn durability_gain_keeps_current() {
        let base = BaseStats {
            durability: Durability::new(90, 100),
            ..BaseStats::default()
        };
        let derived = aggregate(
            &base,
            &equipped(vec![(
                "receiver_1",
                attachment("r", &[(StatName::Durability, 10.0)]),
            )]),
        );
        assert_eq!(derived.stats.durability, Durability { current: 90, max: 110 });
    }

    #[test]
    fn durability_loss_clamps_current_to_new_max() {
        let base = BaseStats {
            durability: Durability::new(100, 100),
            ..BaseStats::default()
        };
        let derived = aggregate(
            &base,
            &equipped(vec![(
                "receiver_1",
                attachment("r", &[(StatName::Durability, -20.0)]),
            )]),
        );
        assert_eq!(derived.stats.durability, Durability { current: 80, max: 80 });
    }

    #[test]
    fn non_negative_clamp_applies_per_step() {
        let base = BaseStats {
            weight: 3.0,
            ..BaseStats::default()
        };
        let derived = aggregate(
            &base,
            &equipped(vec![(
                "stock_1",
                attachment("s", &[(StatName::Weight, -5.0), (StatName::Weight, 1.0)]),
            )]),
        );
        assert_eq!(derived.stats.weight, 1.0);

        // Same behaviour when the deltas come from separate slots.
        let derived = aggregate(
            &base,
            &equipped(vec![
                ("stock_1", attachment("s", &[(StatName::Weight, -5.0)])),
                ("grip_1", attachment("g", &[(StatName::Weight, 1.0)])),
            ]),
        );
        assert_eq!(derived.stats.weight, 1.0);
    }

    #[test]
    fn recoil_may_go_negative() {
        let base = BaseStats {
            vertical_recoil: 10.0,
            ..BaseStats::default()
        };
        let derived = aggregate(
            &base,
            &equipped(vec![(
                "muzzle_1",
                attachment("c", &[(StatName::VerticalRecoil, -15.0)]),
            )]),
        );
        assert_eq!(derived.stats.vertical_recoil, -5.0);
    }

    #[test]
    fn empty_slots_and_empty_modifiers_contribute_nothing() {
        let base = BaseStats::default();
        let mut loadout = equipped(vec![("sight_1", attachment("plain", &[]))]);
        loadout.set("muzzle_1".into(), None);
        assert_eq!(aggregate(&base, &loadout).stats, base);
    }

    #[test]
    fn unequip_recomputes_from_base() {
        let base = BaseStats::default();
        let mut loadout = equipped(vec![(
            "sight_1",
            attachment("acog", &[(StatName::SightingRange, 150.0)]),
        )]);
        assert_eq!(aggregate(&base, &loadout).stats.sighting_range, 650.0);
        loadout.set("sight_1".into(), None);
        assert_eq!(aggregate(&base, &loadout).stats, base);
    }
}
