use serde::{Deserialize, Serialize};

use crate::armory::stats::base::BaseStats;

/// A weapon definition. Admin edits replace the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weapon {
    pub id: String,
    pub name: String,
    pub caliber: String,
    pub base_stats: BaseStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Weapon {
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.caliber)
    }

    /// File name stem for exports: whitespace runs become a single `-`.
    pub fn export_stem(&self) -> String {
        let mut stem = String::with_capacity(self.name.len());
        let mut in_run = false;
        for c in self.name.chars() {
            if c.is_whitespace() {
                if !in_run {
                    stem.push('-');
                }
                in_run = true;
            } else {
                stem.push(c);
                in_run = false;
            }
        }
        stem
    }

    /// Placeholder body color, keyed by weapon id.
    pub fn placeholder_color(&self) -> [f32; 3] {
        match self.id.as_str() {
            "2" => [0.47, 0.40, 0.33],
            "3" => [0.33, 0.40, 0.47],
            _ => [0.33, 0.33, 0.33],
        }
    }
}
