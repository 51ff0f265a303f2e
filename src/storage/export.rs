use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StorageError;
use crate::armory::parts::equipped::EquippedAttachments;
use crate::armory::parts::weapon::Weapon;
use crate::armory::stats::derived::DerivedStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedWeapon {
    pub id: String,
    pub name: String,
    pub caliber: String,
}

/// Shareable JSON snapshot of the bench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub weapon: ExportedWeapon,
    pub attachments: EquippedAttachments,
    pub stats: DerivedStats,
    pub export_date: DateTime<Utc>,
}

impl ExportDocument {
    pub fn new(
        weapon: &Weapon,
        attachments: &EquippedAttachments,
        stats: &DerivedStats,
        export_date: DateTime<Utc>,
    ) -> Self {
        Self {
            weapon: ExportedWeapon {
                id: weapon.id.clone(),
                name: weapon.name.clone(),
                caliber: weapon.caliber.clone(),
            },
            attachments: attachments.clone(),
            stats: stats.clone(),
            export_date,
        }
    }
}

pub fn png_file_name(weapon: &Weapon) -> String {
    format!("{}_config.png", weapon.export_stem())
}

pub fn json_file_name(weapon: &Weapon) -> String {
    format!("{}_config.json", weapon.export_stem())
}

/// Write `<stem>_config.json` into `dir`, creating it if needed.
pub fn write_json(dir: &Path, weapon: &Weapon, doc: &ExportDocument) -> Result<PathBuf, StorageError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(json_file_name(weapon));
    std::fs::write(&path, serde_json::to_string_pretty(doc)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::stats::base::BaseStats;

    fn ak() -> Weapon {
        Weapon {
            id: "2".into(),
            name: "AK 74M".into(),
            caliber: "5.45x39mm".into(),
            base_stats: BaseStats::default(),
            description: None,
            model_path: None,
            image_url: None,
        }
    }

    #[test]
    fn file_names_use_stem() {
        assert_eq!(png_file_name(&ak()), "AK-74M_config.png");
        assert_eq!(json_file_name(&ak()), "AK-74M_config.json");
    }

    #[test]
    fn writes_document_with_wire_names() {
        let dir = tempfile::tempdir().unwrap();
        let weapon = ak();
        let doc = ExportDocument::new(
            &weapon,
            &EquippedAttachments::new(),
            &DerivedStats::from_base(&weapon.base_stats),
            Utc::now(),
        );
        let path = write_json(&dir.path().join("exports"), &weapon, &doc).unwrap();
        assert!(path.ends_with("AK-74M_config.json"));

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["weapon"]["caliber"], "5.45x39mm");
        assert!(value["exportDate"].is_string());
        assert!(value["stats"]["baseStats"].is_object());

        let back: ExportDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }
}
