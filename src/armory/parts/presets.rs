use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use super::equipped::EquippedAttachments;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetEntry {
    pub slot: String,
    pub attachment: String,
}

/// Highlighted stat on a preset card. Free text: presets may advertise stats
/// (e.g. noise) that attachments do not model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedStat {
    pub stat: String,
    pub value: f64,
    pub is_positive: bool,
}

/// Curated loadout bundled with the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub attachments: Vec<PresetEntry>,
    #[serde(default)]
    pub featured_stats: Vec<FeaturedStat>,
}

impl Preset {
    /// Build the equipped set from catalog attachments, in preset order.
    pub fn resolve(&self, catalog: &[Attachment]) -> EquippedAttachments {
        let mut equipped = EquippedAttachments::new();
        for entry in &self.attachments {
            match catalog.iter().find(|a| a.id == entry.attachment) {
                Some(a) => {
                    equipped.set(entry.slot.clone(), Some(a.clone()));
                }
                None => warn!(
                    "Preset {} references unknown attachment {}, skipped",
                    self.id, entry.attachment
                ),
            }
        }
        equipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::parts::attachment::{AttachmentType, Category};

    fn part(id: &str) -> Attachment {
        Attachment {
            id: id.into(),
            name: id.into(),
            kind: AttachmentType::Sight,
            category: Category::Equipment,
            compatible_slots: vec!["sight_1".into()],
            stat_modifiers: vec![],
            description: None,
            model_path: None,
            image_url: None,
        }
    }

    #[test]
    fn unknown_attachments_are_skipped() {
        let preset = Preset {
            id: "preset_1_9".into(),
            name: "Test".into(),
            description: String::new(),
            image_url: None,
            attachments: vec![
                PresetEntry { slot: "sight_1".into(), attachment: "a4".into() },
                PresetEntry { slot: "muzzle_1".into(), attachment: "missing".into() },
            ],
            featured_stats: vec![],
        };
        let equipped = preset.resolve(&[part("a4")]);
        assert_eq!(equipped.occupied_count(), 1);
        assert_eq!(equipped.get("sight_1").map(|a| a.id.as_str()), Some("a4"));
    }
}
