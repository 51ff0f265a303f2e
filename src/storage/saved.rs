use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::armory::loadout::Loadout;
use crate::armory::parts::equipped::EquippedAttachments;
use crate::armory::stats::derived::DerivedStats;

pub const LOCAL_ID_PREFIX: &str = "local_";

/// A named snapshot of a loadout. Never edited after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedConfiguration {
    pub id: String,
    pub name: String,
    pub weapon_id: String,
    pub weapon_name: String,
    pub attachments: EquippedAttachments,
    pub stats: DerivedStats,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_local: bool,
}

impl SavedConfiguration {
    pub fn has_local_id(id: &str) -> bool {
        id.starts_with(LOCAL_ID_PREFIX)
    }
}

/// Everything needed to save except the id and timestamp, which the store assigns.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDraft {
    pub name: String,
    pub weapon_id: String,
    pub weapon_name: String,
    pub attachments: EquippedAttachments,
    pub stats: DerivedStats,
}

impl ConfigDraft {
    /// `None` when the name is blank or no weapon is selected.
    pub fn from_loadout(name: &str, loadout: &Loadout) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let weapon = loadout.weapon()?;
        let stats = loadout.derived()?.clone();
        Some(Self {
            name: name.to_string(),
            weapon_id: weapon.id.clone(),
            weapon_name: weapon.name.clone(),
            attachments: loadout.equipped().clone(),
            stats,
        })
    }

    pub fn into_saved(self, id: String, is_local: bool, created_at: DateTime<Utc>) -> SavedConfiguration {
        SavedConfiguration {
            id,
            name: self.name,
            weapon_id: self.weapon_id,
            weapon_name: self.weapon_name,
            attachments: self.attachments,
            stats: self.stats,
            created_at,
            is_local,
        }
    }
}

/// Hex sha256 of the attachments and stats documents.
pub fn content_hash(attachments_json: &str, stats_json: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(attachments_json.as_bytes());
    hasher.update(stats_json.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::parts::weapon::Weapon;
    use crate::armory::stats::base::BaseStats;

    fn loadout() -> Loadout {
        let mut loadout = Loadout::default();
        loadout.select_weapon(Weapon {
            id: "3".into(),
            name: "M4A1".into(),
            caliber: "5.56x45mm NATO".into(),
            base_stats: BaseStats::default(),
            description: None,
            model_path: None,
            image_url: None,
        });
        loadout
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(ConfigDraft::from_loadout("   ", &loadout()).is_none());
        assert!(ConfigDraft::from_loadout("x", &Loadout::default()).is_none());
    }

    #[test]
    fn draft_snapshots_loadout() {
        let draft = ConfigDraft::from_loadout("  Night ops ", &loadout()).unwrap();
        assert_eq!(draft.name, "Night ops");
        assert_eq!(draft.weapon_id, "3");
        assert_eq!(draft.weapon_name, "M4A1");
        assert_eq!(draft.stats.stats, BaseStats::default());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let saved = ConfigDraft::from_loadout("A", &loadout())
            .unwrap()
            .into_saved("local_x".into(), true, Utc::now());
        let v = serde_json::to_value(&saved).unwrap();
        assert_eq!(v["weaponId"], "3");
        assert_eq!(v["isLocal"], true);
        assert!(v["createdAt"].is_string());
        assert!(SavedConfiguration::has_local_id(&saved.id));
    }

    #[test]
    fn hash_is_stable_hex() {
        let a = content_hash("{}", "{\"weight\":3}");
        assert_eq!(a, content_hash("{}", "{\"weight\":3}"));
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_hash("{}", "{\"weight\":4}"));
    }
}
