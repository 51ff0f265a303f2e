use bevy::prelude::*;
use tokio::task::JoinHandle;

use crate::armory::events::BenchCommand;
use crate::armory::loadout::Loadout;
use crate::armory::parts::registry::Catalog;
use crate::config::settings::Settings;
use crate::notices::Notices;
use crate::storage::catalog_source::{self, WeaponScope, load_catalog, load_weapon_scope, merge_scope};
use crate::storage::error::StorageError;
use crate::storage::local_store::LocalStore;
use crate::storage::object_store::ObjectStore;
use crate::storage::persistence::ConfigStore;
use crate::storage::repo::Fetched;
use crate::storage::saved::{ConfigDraft, SavedConfiguration};
use crate::storage::sqlite_repo::SqliteRepo;

/// Persisted tokio runtime for background store calls.
#[derive(Resource)]
pub struct TokioRuntime(pub tokio::runtime::Runtime);

#[derive(Resource, Debug, Default)]
pub struct CatalogStatus {
    pub ready: bool,
    /// Serving the bundled demo catalog.
    pub demo: bool,
}

/// Saved configurations of the selected weapon.
#[derive(Resource, Debug, Default)]
pub struct SavedConfigs {
    pub items: Vec<SavedConfiguration>,
    pub loading: bool,
    /// Id of the configuration the stats are compared against.
    pub comparing: Option<String>,
}

impl SavedConfigs {
    pub fn get(&self, id: &str) -> Option<&SavedConfiguration> {
        self.items.iter().find(|c| c.id == id)
    }

    pub fn comparison(&self) -> Option<&SavedConfiguration> {
        self.get(self.comparing.as_deref()?)
    }

    /// Remote entries stay newest first, local ones after them.
    fn add(&mut self, config: SavedConfiguration) {
        if config.is_local {
            self.items.push(config);
        } else {
            self.items.insert(0, config);
        }
    }

    fn remove(&mut self, id: &str) {
        self.items.retain(|c| c.id != id);
        if self.comparing.as_deref() == Some(id) {
            self.comparing = None;
        }
    }
}

/// A background task issued for one weapon selection.
struct Tagged<T> {
    generation: u64,
    handle: JoinHandle<T>,
}

/// In-flight store calls. Weapon-scoped results carry the selection generation
/// they were issued for and are dropped once it is stale.
#[derive(Resource, Default)]
pub struct PendingTasks {
    catalog: Option<JoinHandle<Fetched<Catalog>>>,
    scope: Option<Tagged<Result<WeaponScope, StorageError>>>,
    configs: Option<Tagged<Fetched<Vec<SavedConfiguration>>>>,
    saves: Vec<Tagged<Fetched<SavedConfiguration>>>,
    deletes: Vec<Tagged<(String, Fetched<bool>)>>,
}

impl PendingTasks {
    pub fn request_catalog(&mut self, rt: &TokioRuntime, store: &ConfigStore, bundled: Catalog) {
        let remote = store.remote().cloned();
        self.catalog = Some(rt.0.spawn(async move { load_catalog(remote.as_ref(), bundled).await }));
    }

    /// No-op without a remote store; the bundled catalog already holds everything.
    pub fn request_weapon_scope(
        &mut self,
        rt: &TokioRuntime,
        store: &ConfigStore,
        weapon_id: &str,
        generation: u64,
    ) {
        let Some(remote) = store.remote().cloned() else {
            return;
        };
        let weapon_id = weapon_id.to_string();
        let handle = rt.0.spawn(async move { load_weapon_scope(&remote, &weapon_id).await });
        self.scope = Some(Tagged { generation, handle });
    }

    pub fn request_configs(
        &mut self,
        rt: &TokioRuntime,
        store: &ConfigStore,
        weapon_id: &str,
        generation: u64,
    ) {
        let store = store.clone();
        let weapon_id = weapon_id.to_string();
        let handle = rt.0.spawn(async move { store.load(&weapon_id).await });
        self.configs = Some(Tagged { generation, handle });
    }

    pub fn request_save(
        &mut self,
        rt: &TokioRuntime,
        store: &ConfigStore,
        draft: ConfigDraft,
        prefer_local: bool,
        generation: u64,
    ) {
        let store = store.clone();
        let handle = rt.0.spawn(async move { store.save(draft, prefer_local).await });
        self.saves.push(Tagged { generation, handle });
    }

    pub fn request_delete(&mut self, rt: &TokioRuntime, store: &ConfigStore, id: &str, generation: u64) {
        let store = store.clone();
        let id = id.to_string();
        let handle = rt.0.spawn(async move {
            let result = store.delete(&id).await;
            (id, result)
        });
        self.deletes.push(Tagged { generation, handle });
    }
}

// ── Polling helpers ─────────────────────────────────────────────────

fn take_finished<T>(rt: &TokioRuntime, slot: &mut Option<JoinHandle<T>>) -> Option<T> {
    if !slot.as_ref()?.is_finished() {
        return None;
    }
    let handle = slot.take()?;
    match rt.0.block_on(handle) {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Background store task failed: {e}");
            None
        }
    }
}

fn take_finished_tagged<T>(rt: &TokioRuntime, slot: &mut Option<Tagged<T>>) -> Option<(u64, T)> {
    if !slot.as_ref()?.handle.is_finished() {
        return None;
    }
    let Tagged { generation, handle } = slot.take()?;
    let mut handle = Some(handle);
    take_finished(rt, &mut handle).map(|value| (generation, value))
}

fn drain_finished<T>(rt: &TokioRuntime, tasks: &mut Vec<Tagged<T>>) -> Vec<(u64, T)> {
    let mut done = Vec::new();
    let mut i = 0;
    while i < tasks.len() {
        if tasks[i].handle.is_finished() {
            let mut slot = Some(tasks.swap_remove(i));
            if let Some(result) = take_finished_tagged(rt, &mut slot) {
                done.push(result);
            }
        } else {
            i += 1;
        }
    }
    done
}

// ── Plugin ──────────────────────────────────────────────────────────

pub struct StoragePlugin;

impl Plugin for StoragePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CatalogStatus>()
            .init_resource::<SavedConfigs>()
            .init_resource::<PendingTasks>()
            .add_systems(Startup, init_storage)
            .add_systems(
                Update,
                (poll_catalog, poll_weapon_scope, poll_configs, poll_saves, poll_deletes)
                    .run_if(resource_exists::<TokioRuntime>),
            )
            .add_systems(Last, close_store_on_exit.run_if(on_message::<AppExit>));
    }
}

fn init_storage(world: &mut World) {
    let settings = world.resource::<Settings>().clone();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            world.write_message(AppExit::error());
            return;
        }
    };

    let bundled = match catalog_source::bundled() {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Bundled catalog is unreadable: {e:#}");
            world.write_message(AppExit::error());
            return;
        }
    };

    let remote = if settings.remote_enabled {
        let db_path = settings.remote_db_path();
        info!("Initializing SQLite at {:?}", db_path);
        match rt.block_on(SqliteRepo::new(&db_path)) {
            Ok(repo) => {
                info!("SQLite initialized successfully");
                Some(repo)
            }
            Err(e) => {
                error!("Failed to initialize SQLite: {e}");
                None
            }
        }
    } else {
        info!("Remote store disabled in settings");
        None
    };

    let store = ConfigStore::new(remote, LocalStore::new(settings.local_store_path()));
    let rt = TokioRuntime(rt);
    world.resource_mut::<PendingTasks>().request_catalog(&rt, &store, bundled);

    world.insert_resource(store);
    world.insert_resource(ObjectStore::new(settings.objects_path()));
    // Keep runtime alive for background store calls
    world.insert_resource(rt);
}

fn close_store_on_exit(rt: Option<Res<TokioRuntime>>, store: Option<Res<ConfigStore>>) {
    let (Some(rt), Some(remote)) = (rt, store.as_deref().and_then(ConfigStore::remote)) else {
        return;
    };
    rt.0.block_on(remote.close());
    info!("SQLite connection pool closed");
}

fn poll_catalog(
    rt: Res<TokioRuntime>,
    mut tasks: ResMut<PendingTasks>,
    mut catalog: ResMut<Catalog>,
    mut status: ResMut<CatalogStatus>,
    mut notices: ResMut<Notices>,
    mut commands_out: MessageWriter<BenchCommand>,
) {
    let Some(fetched) = take_finished(&rt, &mut tasks.catalog) else {
        return;
    };
    status.ready = true;
    status.demo = fetched.is_degraded();
    if let Some(reason) = fetched.reason() {
        notices.warning(format!("Catalog: {reason}"));
    }
    *catalog = fetched.into_value();
    info!("Catalog ready: {} weapons", catalog.weapons.len());

    if let Some(first) = catalog.weapons.first() {
        commands_out.write(BenchCommand::SelectWeapon(first.id.clone()));
    }
}

fn poll_weapon_scope(
    rt: Res<TokioRuntime>,
    mut tasks: ResMut<PendingTasks>,
    loadout: Res<Loadout>,
    mut catalog: ResMut<Catalog>,
    mut notices: ResMut<Notices>,
) {
    let Some((generation, result)) = take_finished_tagged(&rt, &mut tasks.scope) else {
        return;
    };
    if !loadout.is_current(generation) {
        debug!("Dropping attachment list for stale selection {generation}");
        return;
    }
    match result {
        Ok(scope) => {
            debug!(
                "Refreshed {} attachments for weapon {}",
                scope.attachments.len(),
                scope.weapon_id
            );
            merge_scope(&mut catalog, scope);
        }
        Err(e) => {
            warn!("Failed to refresh weapon attachments: {e}");
            notices.warning(format!("Could not refresh attachments: {e}"));
        }
    }
}

fn poll_configs(
    rt: Res<TokioRuntime>,
    mut tasks: ResMut<PendingTasks>,
    loadout: Res<Loadout>,
    mut saved: ResMut<SavedConfigs>,
    mut notices: ResMut<Notices>,
) {
    let Some((generation, fetched)) = take_finished_tagged(&rt, &mut tasks.configs) else {
        return;
    };
    if !loadout.is_current(generation) {
        debug!("Dropping saved configurations for stale selection {generation}");
        return;
    }
    if let Some(reason) = fetched.reason() {
        notices.warning(format!("Showing local configurations only: {reason}"));
    }
    saved.items = fetched.into_value();
    saved.loading = false;
}

fn poll_saves(
    rt: Res<TokioRuntime>,
    mut tasks: ResMut<PendingTasks>,
    loadout: Res<Loadout>,
    mut saved: ResMut<SavedConfigs>,
    mut notices: ResMut<Notices>,
) {
    for (generation, fetched) in drain_finished(&rt, &mut tasks.saves) {
        let name = &fetched.value().name;
        match fetched.reason() {
            None => notices.success(format!("Configuration \"{name}\" saved")),
            Some(reason) => notices.warning(format!("Configuration \"{name}\": {reason}")),
        };
        if loadout.is_current(generation) {
            saved.add(fetched.into_value());
        }
    }
}

fn poll_deletes(
    rt: Res<TokioRuntime>,
    mut tasks: ResMut<PendingTasks>,
    loadout: Res<Loadout>,
    mut saved: ResMut<SavedConfigs>,
    mut notices: ResMut<Notices>,
) {
    for (generation, (id, fetched)) in drain_finished(&rt, &mut tasks.deletes) {
        match fetched {
            Fetched::Fresh(found) => {
                if !found {
                    debug!("Configuration {id} was already gone");
                }
                if loadout.is_current(generation) {
                    saved.remove(&id);
                }
                notices.info("Configuration deleted");
            }
            Fetched::Degraded { reason, .. } => {
                notices.warning(format!("Could not delete configuration: {reason}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::parts::equipped::EquippedAttachments;
    use crate::armory::stats::base::BaseStats;
    use crate::armory::stats::derived::DerivedStats;
    use chrono::Utc;

    fn config(id: &str, is_local: bool) -> SavedConfiguration {
        SavedConfiguration {
            id: id.into(),
            name: id.into(),
            weapon_id: "1".into(),
            weapon_name: "HK 416A5".into(),
            attachments: EquippedAttachments::new(),
            stats: DerivedStats::from_base(&BaseStats::default()),
            created_at: Utc::now(),
            is_local,
        }
    }

    #[test]
    fn new_remote_saves_go_first_and_local_last() {
        let mut saved = SavedConfigs::default();
        saved.items = vec![config("r1", false), config("local_a", true)];
        saved.add(config("r2", false));
        saved.add(config("local_b", true));
        let ids: Vec<_> = saved.items.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r1", "local_a", "local_b"]);
    }

    #[test]
    fn removing_compared_config_closes_comparison() {
        let mut saved = SavedConfigs::default();
        saved.items = vec![config("r1", false)];
        saved.comparing = Some("r1".into());
        assert!(saved.comparison().is_some());
        saved.remove("r1");
        assert!(saved.items.is_empty());
        assert!(saved.comparing.is_none());
    }

    #[test]
    fn finished_tasks_are_drained_with_their_generation() {
        let rt = TokioRuntime(tokio::runtime::Runtime::new().unwrap());
        let mut tasks = vec![
            Tagged { generation: 1, handle: rt.0.spawn(async { "a" }) },
            Tagged { generation: 2, handle: rt.0.spawn(async { "b" }) },
        ];
        while tasks.iter().any(|t| !t.handle.is_finished()) {
            std::thread::yield_now();
        }
        let mut done = drain_finished(&rt, &mut tasks);
        done.sort();
        assert_eq!(done, vec![(1, "a"), (2, "b")]);
        assert!(tasks.is_empty());
    }

    #[test]
    fn empty_slot_yields_nothing() {
        let rt = TokioRuntime(tokio::runtime::Runtime::new().unwrap());
        let mut slot: Option<JoinHandle<()>> = None;
        assert!(take_finished(&rt, &mut slot).is_none());

        let mut slot = Some(rt.0.spawn(async { 7 }));
        while !slot.as_ref().unwrap().is_finished() {
            std::thread::yield_now();
        }
        assert_eq!(take_finished(&rt, &mut slot), Some(7));
        assert!(slot.is_none());
    }
}
