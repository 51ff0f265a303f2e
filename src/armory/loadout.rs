use bevy::prelude::*;

use super::parts::attachment::Attachment;
use super::parts::compat::CategoryFilters;
use super::parts::equipped::EquippedAttachments;
use super::parts::weapon::Weapon;
use super::stats::derived::DerivedStats;
use super::stats::modifier::aggregate;

/// Controller state for the bench: which weapon is on it, what is attached, and
/// the stats that follow from that. Only the controller systems mutate it.
#[derive(Resource, Debug, Default)]
pub struct Loadout {
    weapon: Option<Weapon>,
    equipped: EquippedAttachments,
    derived: Option<DerivedStats>,
    active_slot: Option<String>,
    pub filters: CategoryFilters,
    generation: u64,
}

impl Loadout {
    pub fn weapon(&self) -> Option<&Weapon> {
        self.weapon.as_ref()
    }

    pub fn weapon_id(&self) -> Option<&str> {
        self.weapon.as_ref().map(|w| w.id.as_str())
    }

    pub fn equipped(&self) -> &EquippedAttachments {
        &self.equipped
    }

    pub fn derived(&self) -> Option<&DerivedStats> {
        self.derived.as_ref()
    }

    pub fn active_slot(&self) -> Option<&str> {
        self.active_slot.as_deref()
    }

    /// Selection generation. Bumped on every weapon selection; weapon-scoped
    /// background results carry the value they were issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Put a weapon on the bench with nothing attached. Returns the new generation.
    pub fn select_weapon(&mut self, weapon: Weapon) -> u64 {
        self.generation += 1;
        self.weapon = Some(weapon);
        self.equipped.clear();
        self.active_slot = None;
        self.recompute();
        self.generation
    }

    /// Swap in an edited version of the selected weapon without touching the
    /// equipped set or the generation.
    pub fn refresh_weapon(&mut self, weapon: Weapon) {
        if self.weapon_id() == Some(weapon.id.as_str()) {
            self.weapon = Some(weapon);
            self.recompute();
        }
    }

    /// Attach (or clear with `None`) and close the open slot menu.
    pub fn equip(&mut self, slot_id: &str, attachment: Option<Attachment>) -> Option<Attachment> {
        let previous = self.equipped.set(slot_id.to_string(), attachment);
        self.active_slot = None;
        self.recompute();
        previous
    }

    /// Open the slot's option menu, or close it if it is already open.
    pub fn toggle_slot(&mut self, slot_id: &str) {
        if self.active_slot.as_deref() == Some(slot_id) {
            self.active_slot = None;
        } else {
            self.active_slot = Some(slot_id.to_string());
        }
    }

    pub fn close_slot(&mut self) {
        self.active_slot = None;
    }

    /// Replace the whole equipped set, as when a saved configuration or preset loads.
    pub fn replace_equipped(&mut self, equipped: EquippedAttachments) {
        self.equipped = equipped;
        self.active_slot = None;
        self.recompute();
    }

    /// Derived stats exist only once a weapon is selected.
    pub fn recompute(&mut self) {
        self.derived = self
            .weapon
            .as_ref()
            .map(|w| aggregate(&w.base_stats, &self.equipped));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::parts::attachment::{AttachmentType, Category};
    use crate::armory::stats::base::BaseStats;
    use crate::armory::stats::modifier::StatModifier;
    use crate::armory::stats::types::StatName;

    fn weapon(id: &str) -> Weapon {
        Weapon {
            id: id.into(),
            name: format!("Weapon {id}"),
            caliber: "7.62x39mm".into(),
            base_stats: BaseStats::default(),
            description: None,
            model_path: None,
            image_url: None,
        }
    }

    fn grip() -> Attachment {
        Attachment {
            id: "a2".into(),
            name: "Tactical Grip".into(),
            kind: AttachmentType::Grip,
            category: Category::Functional,
            compatible_slots: vec!["grip_1".into()],
            stat_modifiers: vec![
                StatModifier::new(StatName::Ergonomics, 10.0),
                StatModifier::new(StatName::VerticalRecoil, -5.0),
            ],
            description: None,
            model_path: None,
            image_url: None,
        }
    }

    #[test]
    fn no_stats_without_weapon() {
        let mut loadout = Loadout::default();
        loadout.recompute();
        assert!(loadout.derived().is_none());
    }

    #[test]
    fn equip_and_unequip_recompute_from_base() {
        let mut loadout = Loadout::default();
        loadout.select_weapon(weapon("1"));
        loadout.toggle_slot("grip_1");
        loadout.equip("grip_1", Some(grip()));
        assert_eq!(loadout.active_slot(), None);
        assert_eq!(loadout.derived().unwrap().stats.ergonomics, 70.0);

        let removed = loadout.equip("grip_1", None);
        assert_eq!(removed.map(|a| a.id), Some("a2".to_string()));
        assert_eq!(loadout.derived().unwrap().stats, BaseStats::default());
    }

    #[test]
    fn selecting_weapon_resets_and_bumps_generation() {
        let mut loadout = Loadout::default();
        let first = loadout.select_weapon(weapon("1"));
        loadout.equip("grip_1", Some(grip()));
        loadout.toggle_slot("sight_1");

        let second = loadout.select_weapon(weapon("2"));
        assert!(second > first);
        assert!(!loadout.is_current(first));
        assert!(loadout.is_current(second));
        assert!(loadout.equipped().is_empty());
        assert_eq!(loadout.active_slot(), None);
        assert_eq!(loadout.derived().unwrap().stats.ergonomics, 60.0);
    }

    #[test]
    fn toggle_slot_opens_then_closes() {
        let mut loadout = Loadout::default();
        loadout.toggle_slot("barrel_1");
        assert_eq!(loadout.active_slot(), Some("barrel_1"));
        loadout.toggle_slot("muzzle_1");
        assert_eq!(loadout.active_slot(), Some("muzzle_1"));
        loadout.toggle_slot("muzzle_1");
        assert_eq!(loadout.active_slot(), None);
    }

    #[test]
    fn replace_equipped_is_wholesale() {
        let mut loadout = Loadout::default();
        loadout.select_weapon(weapon("1"));
        loadout.equip("grip_1", Some(grip()));

        let replacement: EquippedAttachments =
            [("stock_1".to_string(), None)].into_iter().collect();
        loadout.replace_equipped(replacement);
        assert!(loadout.equipped().get("grip_1").is_none());
        assert_eq!(loadout.equipped().iter().count(), 1);
        assert_eq!(loadout.derived().unwrap().stats.ergonomics, 60.0);
    }

    #[test]
    fn refresh_ignores_other_weapons() {
        let mut loadout = Loadout::default();
        loadout.select_weapon(weapon("1"));
        let before = loadout.generation();
        let mut edited = weapon("2");
        edited.base_stats.weight = 9.0;
        loadout.refresh_weapon(edited);
        assert_eq!(loadout.weapon_id(), Some("1"));

        let mut edited = weapon("1");
        edited.base_stats.weight = 4.0;
        loadout.refresh_weapon(edited);
        assert_eq!(loadout.derived().unwrap().stats.weight, 4.0);
        assert_eq!(loadout.generation(), before);
    }
}
