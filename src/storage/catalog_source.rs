use std::collections::HashMap;

use anyhow::{Context, Result};
use bevy::prelude::*;

use super::error::StorageError;
use super::records::{AttachmentRecord, typed_attachments};
use super::repo::Fetched;
use super::sqlite_repo::SqliteRepo;
use crate::armory::parts::attachment::Attachment;
use crate::armory::parts::presets::Preset;
use crate::armory::parts::registry::Catalog;
use crate::armory::parts::slot::Slot;
use crate::armory::parts::weapon::Weapon;

const WEAPONS_JSON: &str = include_str!("../../assets/catalog/weapons.json");
const ATTACHMENTS_JSON: &str = include_str!("../../assets/catalog/attachments.json");
const SLOTS_JSON: &str = include_str!("../../assets/catalog/attachment-slots.json");
const PRESETS_JSON: &str = include_str!("../../assets/catalog/presets.json");

/// The demo catalog compiled into the binary.
pub fn bundled() -> Result<Catalog> {
    let weapons: Vec<Weapon> =
        serde_json::from_str(WEAPONS_JSON).context("decoding bundled weapons.json")?;
    let records: Vec<AttachmentRecord> =
        serde_json::from_str(ATTACHMENTS_JSON).context("decoding bundled attachments.json")?;
    let slots: HashMap<String, Vec<Slot>> =
        serde_json::from_str(SLOTS_JSON).context("decoding bundled attachment-slots.json")?;
    let presets: HashMap<String, Vec<Preset>> =
        serde_json::from_str(PRESETS_JSON).context("decoding bundled presets.json")?;

    let mut catalog = Catalog {
        weapons,
        attachments: typed_attachments(records),
        slots,
        presets,
    };
    catalog.sort_weapons();
    Ok(catalog)
}

/// Catalog from the remote store, or the bundled one when the remote is absent,
/// failing, or empty. Presets always come from the bundle; weapons without stored
/// slots keep their bundled slot list.
pub async fn load_catalog(remote: Option<&SqliteRepo>, bundled: Catalog) -> Fetched<Catalog> {
    let Some(remote) = remote else {
        return Fetched::degraded(bundled, "remote store disabled, using demo data");
    };
    match read_remote(remote).await {
        Ok((weapons, _, _)) if weapons.is_empty() => {
            info!("Remote catalog is empty, using bundled demo data");
            Fetched::degraded(bundled, "remote catalog is empty, using demo data")
        }
        Ok((weapons, attachments, mut slots)) => {
            for (weapon_id, bundled_slots) in &bundled.slots {
                if !slots.contains_key(weapon_id) {
                    slots.insert(weapon_id.clone(), bundled_slots.clone());
                }
            }
            info!(
                "Loaded remote catalog: {} weapons, {} attachments",
                weapons.len(),
                attachments.len()
            );
            Fetched::Fresh(Catalog {
                weapons,
                attachments,
                slots,
                presets: bundled.presets,
            })
        }
        Err(e) => {
            warn!("Remote catalog unavailable, using bundled demo data: {e}");
            Fetched::degraded(bundled, format!("{e}, using demo data"))
        }
    }
}

type RemoteCatalog = (Vec<Weapon>, Vec<Attachment>, HashMap<String, Vec<Slot>>);

async fn read_remote(remote: &SqliteRepo) -> Result<RemoteCatalog, StorageError> {
    let weapons = remote.list_weapons().await?;
    let attachments = remote.list_attachments().await?;
    let slots = remote.weapon_slots().await?;
    Ok((weapons, attachments, slots))
}

/// Copy a catalog into the remote store (weapons, attachments, slot lists).
/// Presets are not stored. Returns the number of documents written.
pub async fn seed_remote(remote: &SqliteRepo, catalog: &Catalog) -> Result<usize, StorageError> {
    let mut written = 0;
    for weapon in &catalog.weapons {
        remote.upsert_weapon(weapon).await?;
        written += 1;
    }
    for attachment in &catalog.attachments {
        remote.upsert_attachment(attachment).await?;
        written += 1;
    }
    for (weapon_id, slots) in &catalog.slots {
        remote.set_weapon_slots(weapon_id, slots).await?;
        written += 1;
    }
    info!("Seeded remote store with {written} documents");
    Ok(written)
}

/// Fresh per-weapon data fetched when a weapon is selected.
#[derive(Debug, Clone)]
pub struct WeaponScope {
    pub weapon_id: String,
    pub attachments: Vec<Attachment>,
    pub slots: Option<Vec<Slot>>,
}

pub async fn load_weapon_scope(remote: &SqliteRepo, weapon_id: &str) -> Result<WeaponScope, StorageError> {
    Ok(WeaponScope {
        weapon_id: weapon_id.to_string(),
        attachments: remote.attachments_for_weapon(weapon_id).await?,
        slots: remote.slots_for_weapon(weapon_id).await?,
    })
}

/// Fold a weapon scope into the catalog: attachments replaced by id (new ones
/// appended), slot list replaced when the store had one.
pub fn merge_scope(catalog: &mut Catalog, scope: WeaponScope) {
    for attachment in scope.attachments {
        match catalog.attachments.iter_mut().find(|a| a.id == attachment.id) {
            Some(existing) => *existing = attachment,
            None => catalog.attachments.push(attachment),
        }
    }
    if let Some(slots) = scope.slots {
        catalog.slots.insert(scope.weapon_id, slots);
    }
}
