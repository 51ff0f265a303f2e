use serde::{Deserialize, Serialize};

use crate::armory::stats::display::format_signed;
use crate::armory::stats::modifier::StatModifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentType {
    Barrel,
    Stock,
    Grip,
    Sight,
    Underbarrel,
    Muzzle,
    Magazine,
    Receiver,
    Handguard,
}

impl AttachmentType {
    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "barrel" => Self::Barrel,
            "stock" => Self::Stock,
            "grip" => Self::Grip,
            "sight" => Self::Sight,
            "underbarrel" => Self::Underbarrel,
            "muzzle" => Self::Muzzle,
            "magazine" => Self::Magazine,
            "receiver" => Self::Receiver,
            "handguard" => Self::Handguard,
            _ => return None,
        })
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Barrel => "Barrel",
            Self::Stock => "Stock",
            Self::Grip => "Grip",
            Self::Sight => "Sight",
            Self::Underbarrel => "Underbarrel",
            Self::Muzzle => "Muzzle",
            Self::Magazine => "Magazine",
            Self::Receiver => "Receiver",
            Self::Handguard => "Handguard",
        }
    }

    /// Placeholder box size (x, y, z) in model units.
    pub fn placeholder_size(self) -> [f32; 3] {
        match self {
            Self::Muzzle => [0.12, 0.12, 0.3],
            Self::Barrel => [0.1, 0.1, 0.6],
            Self::Stock => [0.3, 0.12, 0.7],
            Self::Grip => [0.1, 0.2, 0.1],
            Self::Sight => [0.2, 0.12, 0.15],
            Self::Underbarrel => [0.1, 0.15, 0.3],
            Self::Handguard => [0.2, 0.15, 0.5],
            Self::Magazine => [0.12, 0.5, 0.2],
            Self::Receiver => [0.1, 0.1, 0.1],
        }
    }
}

/// Category used by the panel filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Vital,
    Functional,
    Equipment,
}

impl Category {
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "vital" => Some(Self::Vital),
            "functional" => Some(Self::Functional),
            "equipment" => Some(Self::Equipment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttachmentType,
    pub category: Category,
    #[serde(default)]
    pub compatible_slots: Vec<String>,
    #[serde(default)]
    pub stat_modifiers: Vec<StatModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Attachment {
    pub fn fits(&self, slot_id: &str) -> bool {
        self.compatible_slots.iter().any(|s| s == slot_id)
    }

    /// The `n` largest modifiers by magnitude.
    pub fn top_modifiers(&self, n: usize) -> Vec<&StatModifier> {
        let mut sorted: Vec<&StatModifier> = self.stat_modifiers.iter().collect();
        sorted.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
        sorted.truncate(n);
        sorted
    }
}

/// Short modifier label, e.g. `MUZ: +75`.
pub fn badge(m: &StatModifier) -> String {
    let short: String = m.stat.as_str().chars().take(3).collect();
    format!("{}: {}", short.to_uppercase(), format_signed(m.value))
}
