use serde::{Deserialize, Serialize};

use super::attachment::{Attachment, Category};
use super::slot::weapon_of_slot;

/// Category toggles from the filter bar. An attachment is hidden when its
/// category's toggle is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFilters {
    pub vital_parts: bool,
    pub functional_mods: bool,
    pub equipment_parts: bool,
}

impl Default for CategoryFilters {
    fn default() -> Self {
        Self {
            vital_parts: true,
            functional_mods: true,
            equipment_parts: true,
        }
    }
}

impl CategoryFilters {
    pub fn allows(&self, category: Category) -> bool {
        match category {
            Category::Vital => self.vital_parts,
            Category::Functional => self.functional_mods,
            Category::Equipment => self.equipment_parts,
        }
    }

    pub fn toggle(&mut self, category: Category) {
        match category {
            Category::Vital => self.vital_parts = !self.vital_parts,
            Category::Functional => self.functional_mods = !self.functional_mods,
            Category::Equipment => self.equipment_parts = !self.equipment_parts,
        }
    }
}

/// Attachments with at least one compatible slot on `weapon_id`, catalog order.
pub fn attachments_for_weapon<'a>(
    catalog: &'a [Attachment],
    weapon_id: &str,
) -> Vec<&'a Attachment> {
    catalog
        .iter()
        .filter(|a| {
            a.compatible_slots
                .iter()
                .any(|s| weapon_of_slot(s) == Some(weapon_id))
        })
        .collect()
}

/// Attachments that fit `slot_id` and pass the category filters, catalog order.
///
/// `weapon_id` narrows nothing by itself: slot ids already carry the weapon. It is
/// checked so a slot from another weapon resolves to an empty list.
pub fn compatible_for_slot<'a>(
    catalog: &'a [Attachment],
    weapon_id: &str,
    slot_id: &str,
    filters: &CategoryFilters,
) -> Vec<&'a Attachment> {
    if weapon_of_slot(slot_id).is_some_and(|w| w != weapon_id) {
        return Vec::new();
    }
    catalog
        .iter()
        .filter(|a| a.fits(slot_id) && filters.allows(a.category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::parts::attachment::AttachmentType;

    fn part(id: &str, category: Category, slots: &[&str]) -> Attachment {
        Attachment {
            id: id.into(),
            name: id.into(),
            kind: AttachmentType::Muzzle,
            category,
            compatible_slots: slots.iter().map(|s| s.to_string()).collect(),
            stat_modifiers: vec![],
            description: None,
            model_path: None,
            image_url: None,
        }
    }

    #[test]
    fn disabled_category_is_excluded() {
        let catalog = vec![
            part("1", Category::Vital, &["s1"]),
            part("2", Category::Functional, &["s1"]),
        ];
        let filters = CategoryFilters {
            vital_parts: false,
            functional_mods: true,
            equipment_parts: true,
        };
        let ids: Vec<_> = compatible_for_slot(&catalog, "1", "s1", &filters)
            .into_iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn keeps_catalog_order() {
        let catalog = vec![
            part("c", Category::Functional, &["muzzle_1"]),
            part("a", Category::Equipment, &["muzzle_1", "muzzle_2"]),
            part("b", Category::Vital, &["muzzle_2"]),
            part("d", Category::Vital, &["muzzle_1"]),
        ];
        let ids: Vec<_> =
            compatible_for_slot(&catalog, "1", "muzzle_1", &CategoryFilters::default())
                .into_iter()
                .map(|a| a.id.as_str())
                .collect();
        assert_eq!(ids, vec!["c", "a", "d"]);
    }

    #[test]
    fn slot_of_other_weapon_resolves_empty() {
        let catalog = vec![part("a", Category::Vital, &["muzzle_2"])];
        assert!(
            compatible_for_slot(&catalog, "1", "muzzle_2", &CategoryFilters::default())
                .is_empty()
        );
    }

    #[test]
    fn weapon_scope_matches_slot_weapon_segment() {
        let catalog = vec![
            part("a", Category::Vital, &["barrel_1"]),
            part("b", Category::Vital, &["barrel_11"]),
            part("c", Category::Vital, &["barrel_2", "stock_1"]),
        ];
        let ids: Vec<_> = attachments_for_weapon(&catalog, "1")
            .into_iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn toggle_flips_one_category() {
        let mut filters = CategoryFilters::default();
        filters.toggle(Category::Equipment);
        assert!(!filters.allows(Category::Equipment));
        assert!(filters.allows(Category::Vital));
    }
}
