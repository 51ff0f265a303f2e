use bevy::prelude::*;
use chrono::Utc;
use uuid::Uuid;

use super::error::StorageError;
use super::local_store::LocalStore;
use super::repo::Fetched;
use super::saved::{ConfigDraft, LOCAL_ID_PREFIX, SavedConfiguration};
use super::sqlite_repo::SqliteRepo;

/// Saved-configuration access with remote-first, local-fallback semantics.
/// Cheap to clone into background tasks.
#[derive(Resource, Clone)]
pub struct ConfigStore {
    remote: Option<SqliteRepo>,
    local: LocalStore,
}

fn local_id() -> String {
    format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4().simple())
}

/// Run a local-file operation on tokio's blocking pool.
async fn on_local<T, F>(local: &LocalStore, op: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce(&LocalStore) -> Result<T, StorageError> + Send + 'static,
{
    let local = local.clone();
    tokio::task::spawn_blocking(move || op(&local)).await?
}

impl ConfigStore {
    pub fn new(remote: Option<SqliteRepo>, local: LocalStore) -> Self {
        Self { remote, local }
    }

    pub fn remote(&self) -> Option<&SqliteRepo> {
        self.remote.as_ref()
    }

    /// Write to the remote store unless `prefer_local`. Any remote problem falls back
    /// to the local file and is reported as degraded.
    pub async fn save(&self, draft: ConfigDraft, prefer_local: bool) -> Fetched<SavedConfiguration> {
        if prefer_local {
            return self.save_local(draft, None).await;
        }
        let Some(remote) = &self.remote else {
            return self
                .save_local(draft, Some(StorageError::Unavailable.to_string()))
                .await;
        };

        let saved = draft
            .clone()
            .into_saved(Uuid::new_v4().to_string(), false, Utc::now());
        match remote.insert_config(&saved).await {
            Ok(()) => {
                info!("Saved configuration {} ({})", saved.name, saved.id);
                Fetched::Fresh(saved)
            }
            Err(e) => {
                warn!("Remote save failed, saving locally: {e}");
                self.save_local(draft, Some(e.to_string())).await
            }
        }
    }

    async fn save_local(
        &self,
        draft: ConfigDraft,
        remote_failure: Option<String>,
    ) -> Fetched<SavedConfiguration> {
        let saved = draft.into_saved(local_id(), true, Utc::now());
        let record = saved.clone();
        let written = on_local(&self.local, move |local| local.append(&record)).await;
        match (remote_failure, written) {
            (None, Ok(())) => Fetched::Fresh(saved),
            (Some(reason), Ok(())) => Fetched::degraded(saved, format!("{reason}; saved locally")),
            (_, Err(e)) => {
                warn!("Failed to write local store {}: {e}", self.local.path().display());
                Fetched::degraded(saved, format!("not persisted: {e}"))
            }
        }
    }

    /// Remote configurations for the weapon (newest first), then local ones.
    pub async fn load(&self, weapon_id: &str) -> Fetched<Vec<SavedConfiguration>> {
        let owned = weapon_id.to_string();
        let local = on_local(&self.local, move |local| Ok(local.for_weapon(&owned)))
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to read local configurations: {e}");
                Vec::new()
            });
        let Some(remote) = &self.remote else {
            return Fetched::Fresh(local);
        };
        match remote.list_configs(weapon_id).await {
            Ok(mut configs) => {
                configs.extend(local);
                Fetched::Fresh(configs)
            }
            Err(e) => {
                warn!("Remote load failed, showing local configurations only: {e}");
                Fetched::degraded(local, e.to_string())
            }
        }
    }

    /// `local_` ids are removed from the local file, everything else remotely.
    pub async fn delete(&self, id: &str) -> Fetched<bool> {
        if SavedConfiguration::has_local_id(id) {
            let owned = id.to_string();
            return match on_local(&self.local, move |local| local.delete(&owned)).await {
                Ok(found) => Fetched::Fresh(found),
                Err(e) => {
                    warn!("Failed to delete local configuration {id}: {e}");
                    Fetched::degraded(false, e.to_string())
                }
            };
        }
        let Some(remote) = &self.remote else {
            return Fetched::degraded(false, StorageError::Unavailable.to_string());
        };
        match remote.delete_config(id).await {
            Ok(found) => Fetched::Fresh(found),
            Err(e) => {
                warn!("Remote delete of {id} failed: {e}");
                Fetched::degraded(false, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::loadout::Loadout;
    use crate::armory::parts::weapon::Weapon;
    use crate::armory::stats::base::BaseStats;

    fn draft(name: &str) -> ConfigDraft {
        let mut loadout = Loadout::default();
        loadout.select_weapon(Weapon {
            id: "1".into(),
            name: "HK 416A5".into(),
            caliber: "5.56x45mm NATO".into(),
            base_stats: BaseStats::default(),
            description: None,
            model_path: None,
            image_url: None,
        });
        ConfigDraft::from_loadout(name, &loadout).unwrap()
    }

    #[test]
    fn without_remote_saves_locally_and_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(None, LocalStore::new(dir.path().join("saved_configs.json")));
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let saved = store.save(draft("Offline"), false).await;
            assert!(saved.is_degraded());
            let saved = saved.into_value();
            assert!(saved.id.starts_with("local_"));
            assert!(saved.is_local);

            let loaded = store.load("1").await;
            assert!(!loaded.is_degraded());
            assert_eq!(loaded.value(), &vec![saved.clone()]);
            assert!(store.load("2").await.value().is_empty());

            assert_eq!(store.delete(&saved.id).await, Fetched::Fresh(true));
            assert!(store.load("1").await.value().is_empty());
        });
    }

    #[test]
    fn closed_remote_degrades_to_local() {
        let dir = tempfile::tempdir().unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let repo = SqliteRepo::new(&dir.path().join("bench.db")).await.unwrap();
            repo.close().await;
            let store = ConfigStore::new(
                Some(repo),
                LocalStore::new(dir.path().join("saved_configs.json")),
            );

            let saved = store.save(draft("Fallback"), false).await;
            assert!(saved.reason().is_some());
            let saved = saved.into_value();
            assert!(saved.id.starts_with("local_") && saved.is_local);

            let loaded = store.load("1").await;
            assert!(loaded.is_degraded());
            assert_eq!(loaded.value().len(), 1);
            assert_eq!(loaded.value()[0].id, saved.id);

            assert!(store.delete("some-remote-id").await.is_degraded());
        });
    }

    #[test]
    fn remote_first_then_local() {
        let dir = tempfile::tempdir().unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let repo = SqliteRepo::new(&dir.path().join("bench.db")).await.unwrap();
            let store = ConfigStore::new(
                Some(repo),
                LocalStore::new(dir.path().join("saved_configs.json")),
            );

            let local = store.save(draft("Mine"), true).await;
            assert!(!local.is_degraded());
            let remote = store.save(draft("Shared"), false).await;
            let remote = match remote {
                Fetched::Fresh(c) => c,
                Fetched::Degraded { reason, .. } => panic!("unexpected fallback: {reason}"),
            };
            assert!(!remote.is_local);
            assert!(Uuid::parse_str(&remote.id).is_ok());

            let names: Vec<_> = store
                .load("1")
                .await
                .into_value()
                .into_iter()
                .map(|c| c.name)
                .collect();
            assert_eq!(names, vec!["Shared", "Mine"]);

            assert_eq!(store.delete(&remote.id).await, Fetched::Fresh(true));
        });
    }

    #[test]
    fn concurrent_local_saves_all_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(None, LocalStore::new(dir.path().join("saved_configs.json")));
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let handles: Vec<_> = (0..12)
                .map(|i| {
                    let store = store.clone();
                    tokio::spawn(async move { store.save(draft(&format!("Build {i}")), true).await })
                })
                .collect();
            let mut ids = Vec::new();
            for h in handles {
                let saved = h.await.unwrap();
                assert!(!saved.is_degraded());
                ids.push(saved.into_value().id);
            }

            let loaded = store.load("1").await.into_value();
            assert_eq!(loaded.len(), 12);
            assert!(ids.iter().all(|id| loaded.iter().any(|c| &c.id == id)));
        });
    }

    #[test]
    fn corrupt_local_file_degrades_save_without_losing_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved_configs.json");
        std::fs::write(&path, "[oops").unwrap();
        let store = ConfigStore::new(None, LocalStore::new(&path));
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let saved = store.save(draft("Kept"), true).await;
            assert!(saved.reason().is_some_and(|r| r.contains("not persisted")));
        });
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[oops");
    }
}
