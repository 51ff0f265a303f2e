use std::collections::HashMap;

use bevy::prelude::*;

use super::attachment::Attachment;
use super::compat::{self, CategoryFilters};
use super::presets::Preset;
use super::slot::Slot;
use super::weapon::Weapon;

/// Everything the viewer can show: weapons, attachments, per-weapon slots and presets.
/// Filled from the remote catalog or the bundled JSON.
#[derive(Resource, Debug, Clone, Default)]
pub struct Catalog {
    /// Ordered by name.
    pub weapons: Vec<Weapon>,
    pub attachments: Vec<Attachment>,
    /// Weapon id → ordered slot list.
    pub slots: HashMap<String, Vec<Slot>>,
    /// Weapon id → presets.
    pub presets: HashMap<String, Vec<Preset>>,
}

impl Catalog {
    pub fn weapon(&self, id: &str) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn attachment(&self, id: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.id == id)
    }

    pub fn slots_for(&self, weapon_id: &str) -> &[Slot] {
        self.slots.get(weapon_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn presets_for(&self, weapon_id: &str) -> &[Preset] {
        self.presets.get(weapon_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn preset(&self, weapon_id: &str, preset_id: &str) -> Option<&Preset> {
        self.presets_for(weapon_id).iter().find(|p| p.id == preset_id)
    }

    pub fn attachments_for_weapon(&self, weapon_id: &str) -> Vec<&Attachment> {
        compat::attachments_for_weapon(&self.attachments, weapon_id)
    }

    pub fn compatible(
        &self,
        weapon_id: &str,
        slot_id: &str,
        filters: &CategoryFilters,
    ) -> Vec<&Attachment> {
        compat::compatible_for_slot(&self.attachments, weapon_id, slot_id, filters)
    }

    pub fn sort_weapons(&mut self) {
        self.weapons.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Replace (or add) a weapon wholesale, keeping name order.
    pub fn upsert_weapon(&mut self, weapon: Weapon) {
        self.weapons.retain(|w| w.id != weapon.id);
        self.weapons.push(weapon);
        self.sort_weapons();
    }

    pub fn set_weapon_model(&mut self, weapon_id: &str, model_path: String) -> bool {
        match self.weapons.iter_mut().find(|w| w.id == weapon_id) {
            Some(w) => {
                w.model_path = Some(model_path);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::stats::base::BaseStats;

    fn weapon(id: &str, name: &str) -> Weapon {
        Weapon {
            id: id.into(),
            name: name.into(),
            caliber: "5.56x45mm".into(),
            base_stats: BaseStats::default(),
            description: None,
            model_path: None,
            image_url: None,
        }
    }

    #[test]
    fn upsert_replaces_and_keeps_name_order() {
        let mut cat = Catalog {
            weapons: vec![weapon("2", "AK-74M"), weapon("1", "HK 416A5")],
            ..default()
        };
        cat.upsert_weapon(weapon("3", "M4A1"));
        cat.upsert_weapon(weapon("1", "HK 416A5 Custom"));
        let ids: Vec<_> = cat.weapons.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
        assert_eq!(cat.weapon("1").unwrap().name, "HK 416A5 Custom");
    }

    #[test]
    fn unknown_weapon_has_no_slots_or_presets() {
        let cat = Catalog::default();
        assert!(cat.slots_for("9").is_empty());
        assert!(cat.presets_for("9").is_empty());
    }

    #[test]
    fn model_path_update() {
        let mut cat = Catalog {
            weapons: vec![weapon("1", "HK 416A5")],
            ..default()
        };
        assert!(cat.set_weapon_model("1", "models/weapons/1_ab_hk.glb".into()));
        assert!(!cat.set_weapon_model("7", "x.glb".into()));
        assert_eq!(
            cat.weapon("1").unwrap().model_path.as_deref(),
            Some("models/weapons/1_ab_hk.glb")
        );
    }
}
