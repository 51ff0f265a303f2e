use bevy::prelude::*;
use serde::Deserialize;

use super::error::StorageError;
use crate::armory::parts::attachment::{Attachment, AttachmentType, Category};
use crate::armory::stats::modifier::StatModifier;
use crate::armory::stats::types::StatName;

// ── Wire records ────────────────────────────────────────────────────

/// Attachment as stored: enums and stat names still raw strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    #[serde(default)]
    pub compatible_slots: Vec<String>,
    #[serde(default)]
    pub stat_modifiers: Vec<ModifierRecord>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModifierRecord {
    pub stat: String,
    pub value: f64,
}

impl AttachmentRecord {
    /// Typed attachment. An unknown type or category rejects the record; an unknown
    /// stat name only drops that modifier.
    pub fn into_attachment(self) -> Result<Attachment, StorageError> {
        let kind = AttachmentType::from_wire(&self.kind).ok_or_else(|| {
            StorageError::InvalidRecord(format!(
                "attachment {}: unknown type '{}'",
                self.id, self.kind
            ))
        })?;
        let category = Category::from_wire(&self.category).ok_or_else(|| {
            StorageError::InvalidRecord(format!(
                "attachment {}: unknown category '{}'",
                self.id, self.category
            ))
        })?;

        let mut stat_modifiers = Vec::with_capacity(self.stat_modifiers.len());
        for m in self.stat_modifiers {
            match m.stat.parse::<StatName>() {
                Ok(stat) => stat_modifiers.push(StatModifier::new(stat, m.value)),
                Err(e) => warn!("Attachment {}: dropping modifier, {e}", self.id),
            }
        }

        Ok(Attachment {
            id: self.id,
            name: self.name,
            kind,
            category,
            compatible_slots: self.compatible_slots,
            stat_modifiers,
            description: self.description,
            model_path: self.model_path,
            image_url: self.image_url,
        })
    }
}

/// Decode one stored attachment document.
pub fn decode_attachment(json: &str) -> Result<Attachment, StorageError> {
    let record: AttachmentRecord = serde_json::from_str(json)?;
    record.into_attachment()
}

/// Keep the attachments that decode, logging the ones that do not.
pub fn typed_attachments(records: Vec<AttachmentRecord>) -> Vec<Attachment> {
    records
        .into_iter()
        .filter_map(|r| match r.into_attachment() {
            Ok(a) => Some(a),
            Err(e) => {
                warn!("Skipping {e}");
                None
            }
        })
        .collect()
}
