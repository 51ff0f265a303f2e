use std::collections::HashMap;
use std::path::Path;

use bevy::prelude::*;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use super::error::StorageError;
use super::object_store::ObjectKind;
use super::records::decode_attachment;
use super::saved::{SavedConfiguration, content_hash};
use crate::armory::parts::attachment::Attachment;
use crate::armory::parts::slot::{Slot, weapon_of_slot};
use crate::armory::parts::weapon::Weapon;

/// SQLite document store: the remote catalog and saved configurations.
/// Cloning shares the pool, so background tasks can own a handle.
#[derive(Resource, Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidRecord(format!("bad timestamp '{s}': {e}")))
}

impl SqliteRepo {
    pub async fn new(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ── Catalog reads ───────────────────────────────────────────────

    /// All weapons, ordered by name. Rows that fail to decode are skipped.
    pub async fn list_weapons(&self) -> Result<Vec<Weapon>, StorageError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as(r#"SELECT id, spec_json FROM weapons ORDER BY name"#)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, json)| match serde_json::from_str::<Weapon>(&json) {
                Ok(w) => Some(w),
                Err(e) => {
                    warn!("Skipping weapon {id}: {e}");
                    None
                }
            })
            .collect())
    }

    pub async fn list_attachments(&self) -> Result<Vec<Attachment>, StorageError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as(r#"SELECT id, spec_json FROM attachments ORDER BY rowid"#)
                .fetch_all(&self.pool)
                .await?;
        Ok(decode_rows(rows))
    }

    /// Attachments with at least one compatible slot on `weapon_id`.
    pub async fn attachments_for_weapon(
        &self,
        weapon_id: &str,
    ) -> Result<Vec<Attachment>, StorageError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"SELECT a.id, a.spec_json FROM attachments a
               WHERE a.id IN (SELECT attachment_id FROM attachment_slots WHERE weapon_id = ?)
               ORDER BY a.rowid"#,
        )
        .bind(weapon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(decode_rows(rows))
    }

    /// Weapon id → slot list, for every weapon that has one stored.
    pub async fn weapon_slots(&self) -> Result<HashMap<String, Vec<Slot>>, StorageError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as(r#"SELECT weapon_id, slots_json FROM weapon_slots"#)
                .fetch_all(&self.pool)
                .await?;

        let mut slots = HashMap::new();
        for (weapon_id, json) in rows {
            match serde_json::from_str::<Vec<Slot>>(&json) {
                Ok(list) => {
                    slots.insert(weapon_id, list);
                }
                Err(e) => warn!("Skipping slots of weapon {weapon_id}: {e}"),
            }
        }
        Ok(slots)
    }

    pub async fn slots_for_weapon(&self, weapon_id: &str) -> Result<Option<Vec<Slot>>, StorageError> {
        let row: Option<(String,)> =
            sqlx::query_as(r#"SELECT slots_json FROM weapon_slots WHERE weapon_id = ?"#)
                .bind(weapon_id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((json,)) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    // ── Catalog writes ──────────────────────────────────────────────

    pub async fn upsert_weapon(&self, weapon: &Weapon) -> Result<(), StorageError> {
        let spec_json = serde_json::to_string(weapon)?;
        sqlx::query(
            r#"INSERT INTO weapons (id, name, spec_json, updated_at) VALUES (?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name, spec_json = excluded.spec_json, updated_at = excluded.updated_at"#,
        )
        .bind(&weapon.id)
        .bind(&weapon.name)
        .bind(&spec_json)
        .bind(timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Writes the attachment document and re-indexes its compatible slots.
    pub async fn upsert_attachment(&self, attachment: &Attachment) -> Result<(), StorageError> {
        let spec_json = serde_json::to_string(attachment)?;
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"INSERT INTO attachments (id, name, spec_json, updated_at) VALUES (?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name, spec_json = excluded.spec_json, updated_at = excluded.updated_at"#,
        )
        .bind(&attachment.id)
        .bind(&attachment.name)
        .bind(&spec_json)
        .bind(timestamp(&Utc::now()))
        .execute(&mut *tx)
        .await?;

        sqlx::query(r#"DELETE FROM attachment_slots WHERE attachment_id = ?"#)
            .bind(&attachment.id)
            .execute(&mut *tx)
            .await?;
        for slot_id in &attachment.compatible_slots {
            let Some(weapon_id) = weapon_of_slot(slot_id) else {
                warn!("Attachment {}: slot id '{slot_id}' names no weapon", attachment.id);
                continue;
            };
            sqlx::query(
                r#"INSERT OR IGNORE INTO attachment_slots (attachment_id, slot_id, weapon_id)
                   VALUES (?, ?, ?)"#,
            )
            .bind(&attachment.id)
            .bind(slot_id)
            .bind(weapon_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn set_weapon_slots(&self, weapon_id: &str, slots: &[Slot]) -> Result<(), StorageError> {
        let slots_json = serde_json::to_string(slots)?;
        sqlx::query(r#"INSERT OR REPLACE INTO weapon_slots (weapon_id, slots_json) VALUES (?, ?)"#)
            .bind(weapon_id)
            .bind(&slots_json)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Point a stored weapon or attachment at an uploaded model. `false` if the item
    /// is not in the store.
    pub async fn set_model_path(
        &self,
        kind: ObjectKind,
        item_id: &str,
        model_path: &str,
    ) -> Result<bool, StorageError> {
        match kind {
            ObjectKind::Weapon => {
                let row: Option<(String,)> =
                    sqlx::query_as(r#"SELECT spec_json FROM weapons WHERE id = ?"#)
                        .bind(item_id)
                        .fetch_optional(&self.pool)
                        .await?;
                let Some((json,)) = row else {
                    return Ok(false);
                };
                let mut weapon: Weapon = serde_json::from_str(&json)?;
                weapon.model_path = Some(model_path.to_string());
                self.upsert_weapon(&weapon).await?;
            }
            ObjectKind::Attachment => {
                let row: Option<(String,)> =
                    sqlx::query_as(r#"SELECT spec_json FROM attachments WHERE id = ?"#)
                        .bind(item_id)
                        .fetch_optional(&self.pool)
                        .await?;
                let Some((json,)) = row else {
                    return Ok(false);
                };
                let mut attachment = decode_attachment(&json)?;
                attachment.model_path = Some(model_path.to_string());
                self.upsert_attachment(&attachment).await?;
            }
        }
        Ok(true)
    }

    // ── Saved configurations ────────────────────────────────────────

    pub async fn insert_config(&self, config: &SavedConfiguration) -> Result<(), StorageError> {
        let attachments_json = serde_json::to_string(&config.attachments)?;
        let stats_json = serde_json::to_string(&config.stats)?;
        let hash = content_hash(&attachments_json, &stats_json);

        sqlx::query(
            r#"INSERT INTO saved_configs
                 (id, name, weapon_id, weapon_name, attachments_json, stats_json, content_hash, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&config.id)
        .bind(&config.name)
        .bind(&config.weapon_id)
        .bind(&config.weapon_name)
        .bind(&attachments_json)
        .bind(&stats_json)
        .bind(&hash)
        .bind(timestamp(&config.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Configurations for a weapon, newest first.
    pub async fn list_configs(
        &self,
        weapon_id: &str,
    ) -> Result<Vec<SavedConfiguration>, StorageError> {
        let rows: Vec<ConfigRow> = sqlx::query_as(
            r#"SELECT id, name, weapon_id, weapon_name, attachments_json, stats_json, created_at
               FROM saved_configs WHERE weapon_id = ? ORDER BY created_at DESC"#,
        )
        .bind(weapon_id)
        .fetch_all(&self.pool)
        .await?;

        let mut configs = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.0.clone();
            match config_from_row(row) {
                Ok(c) => configs.push(c),
                Err(e) => warn!("Skipping saved configuration {id}: {e}"),
            }
        }
        Ok(configs)
    }

    pub async fn delete_config(&self, id: &str) -> Result<bool, StorageError> {
        let done = sqlx::query(r#"DELETE FROM saved_configs WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

type ConfigRow = (String, String, String, String, String, String, String);

fn config_from_row(row: ConfigRow) -> Result<SavedConfiguration, StorageError> {
    let (id, name, weapon_id, weapon_name, attachments_json, stats_json, created_at) = row;
    Ok(SavedConfiguration {
        id,
        name,
        weapon_id,
        weapon_name,
        attachments: serde_json::from_str(&attachments_json)?,
        stats: serde_json::from_str(&stats_json)?,
        created_at: parse_timestamp(&created_at)?,
        is_local: false,
    })
}

fn decode_rows(rows: Vec<(String, String)>) -> Vec<Attachment> {
    rows.into_iter()
        .filter_map(|(id, json)| match decode_attachment(&json) {
            Ok(a) => Some(a),
            Err(e) => {
                warn!("Skipping attachment {id}: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::parts::attachment::{AttachmentType, Category};
    use crate::armory::parts::equipped::EquippedAttachments;
    use crate::armory::stats::base::BaseStats;
    use crate::armory::stats::derived::DerivedStats;
    use chrono::Duration;

    fn weapon(id: &str, name: &str) -> Weapon {
        Weapon {
            id: id.into(),
            name: name.into(),
            caliber: "5.45x39mm".into(),
            base_stats: BaseStats::default(),
            description: None,
            model_path: None,
            image_url: None,
        }
    }

    fn attachment(id: &str, slots: &[&str]) -> Attachment {
        Attachment {
            id: id.into(),
            name: id.into(),
            kind: AttachmentType::Muzzle,
            category: Category::Functional,
            compatible_slots: slots.iter().map(|s| s.to_string()).collect(),
            stat_modifiers: vec![],
            description: None,
            model_path: None,
            image_url: None,
        }
    }

    fn with_repo<F, Fut>(f: F)
    where
        F: FnOnce(SqliteRepo) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let dir = tempfile::tempdir().unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let repo = SqliteRepo::new(&dir.path().join("bench.db")).await.unwrap();
            f(repo).await;
        });
    }

    #[test]
    fn weapons_come_back_ordered_by_name() {
        with_repo(|repo| async move {
            repo.upsert_weapon(&weapon("3", "M4A1")).await.unwrap();
            repo.upsert_weapon(&weapon("2", "AK-74M")).await.unwrap();
            repo.upsert_weapon(&weapon("1", "HK 416A5")).await.unwrap();
            let names: Vec<_> = repo
                .list_weapons()
                .await
                .unwrap()
                .into_iter()
                .map(|w| w.name)
                .collect();
            assert_eq!(names, vec!["AK-74M", "HK 416A5", "M4A1"]);
        });
    }

    #[test]
    fn weapon_scoped_attachment_query() {
        with_repo(|repo| async move {
            repo.upsert_attachment(&attachment("a1", &["muzzle_1", "muzzle_2"]))
                .await
                .unwrap();
            repo.upsert_attachment(&attachment("a9", &["muzzle_2"])).await.unwrap();
            repo.upsert_attachment(&attachment("a11", &["muzzle_11"])).await.unwrap();

            let ids: Vec<_> = repo
                .attachments_for_weapon("1")
                .await
                .unwrap()
                .into_iter()
                .map(|a| a.id)
                .collect();
            assert_eq!(ids, vec!["a1"]);

            // Re-indexing drops the old slot rows.
            repo.upsert_attachment(&attachment("a1", &["muzzle_2"])).await.unwrap();
            assert!(repo.attachments_for_weapon("1").await.unwrap().is_empty());
            assert_eq!(repo.attachments_for_weapon("2").await.unwrap().len(), 2);
        });
    }

    #[test]
    fn model_path_updates_stored_document() {
        with_repo(|repo| async move {
            repo.upsert_weapon(&weapon("1", "HK 416A5")).await.unwrap();
            let path = "models/weapons/1_abcd_hk.glb";
            assert!(repo.set_model_path(ObjectKind::Weapon, "1", path).await.unwrap());
            assert!(!repo.set_model_path(ObjectKind::Attachment, "zz", path).await.unwrap());
            let w = &repo.list_weapons().await.unwrap()[0];
            assert_eq!(w.model_path.as_deref(), Some(path));
        });
    }

    #[test]
    fn slots_round_trip() {
        with_repo(|repo| async move {
            let slots = vec![
                Slot { id: "barrel_1".into(), name: "Barrel".into(), position: None },
                Slot { id: "grip_1".into(), name: "Pistol Grip".into(), position: None },
            ];
            repo.set_weapon_slots("1", &slots).await.unwrap();
            assert_eq!(repo.slots_for_weapon("1").await.unwrap(), Some(slots.clone()));
            assert_eq!(repo.slots_for_weapon("2").await.unwrap(), None);
            assert_eq!(repo.weapon_slots().await.unwrap().get("1"), Some(&slots));
        });
    }

    #[test]
    fn configs_list_newest_first() {
        with_repo(|repo| async move {
            let now = Utc::now();
            let base = BaseStats::default();
            for (i, id) in ["old", "new"].iter().enumerate() {
                let config = SavedConfiguration {
                    id: id.to_string(),
                    name: id.to_string(),
                    weapon_id: "1".into(),
                    weapon_name: "HK 416A5".into(),
                    attachments: EquippedAttachments::new(),
                    stats: DerivedStats::from_base(&base),
                    created_at: now + Duration::seconds(i as i64),
                    is_local: false,
                };
                repo.insert_config(&config).await.unwrap();
            }
            let ids: Vec<_> = repo
                .list_configs("1")
                .await
                .unwrap()
                .into_iter()
                .map(|c| c.id)
                .collect();
            assert_eq!(ids, vec!["new", "old"]);
            assert!(repo.list_configs("2").await.unwrap().is_empty());
            assert!(repo.delete_config("old").await.unwrap());
            assert_eq!(repo.list_configs("1").await.unwrap().len(), 1);
        });
    }
}
