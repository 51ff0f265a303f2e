use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bevy::prelude::*;
use tokio::task::JoinHandle;

use crate::armory::components::BenchPhase;
use crate::armory::loadout::Loadout;
use crate::armory::parts::registry::Catalog;
use crate::armory::parts::slot::{Axis, Slot};
use crate::armory::parts::weapon::Weapon;
use crate::notices::Notices;
use crate::storage::catalog_source::{self, seed_remote};
use crate::storage::error::StorageError;
use crate::storage::object_store::{FileClass, ObjectKind, ObjectStore};
use crate::storage::persistence::ConfigStore;
use crate::storage::sqlite_repo::SqliteRepo;

use super::storage_plugin::TokioRuntime;
use super::widgets::*;

// ── Components ──────────────────────────────────────────────────────

#[derive(Component)]
struct AdminRoot;

#[derive(Component)]
struct ProgressText;

#[derive(Component)]
enum AdminButton {
    Back,
    ImportModel,
    ImportImage,
    SeedStore,
    ApplySlots,
}

#[derive(Component)]
struct SlotField;

// ── Background work ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportTarget {
    Model,
    Image,
}

impl ImportTarget {
    fn class(self) -> FileClass {
        match self {
            Self::Model => FileClass::Model,
            Self::Image => FileClass::Image,
        }
    }
}

#[derive(Debug)]
struct ImportOutcome {
    weapon_id: String,
    target: ImportTarget,
    reference: String,
    /// Written to the remote store, not only to this session's catalog.
    persisted: bool,
}

struct ImportTask {
    progress: Arc<AtomicU32>,
    handle: JoinHandle<Result<ImportOutcome, StorageError>>,
}

#[derive(Resource, Default)]
struct AdminTasks {
    import: Option<ImportTask>,
    writes: Vec<JoinHandle<Result<String, StorageError>>>,
}

// ── Plugin ──────────────────────────────────────────────────────────

pub struct AdminPlugin;

impl Plugin for AdminPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AdminTasks>()
            .add_systems(OnEnter(BenchPhase::Admin), spawn_admin_screen)
            .add_systems(OnExit(BenchPhase::Admin), despawn::<AdminRoot>)
            .add_systems(
                Update,
                admin_button_system.run_if(in_state(BenchPhase::Admin)),
            )
            .add_systems(
                Update,
                (poll_import, poll_writes).run_if(resource_exists::<TokioRuntime>),
            );
    }
}

fn axis_key(slot_id: &str, axis: Axis) -> String {
    let suffix = match axis {
        Axis::X => "x",
        Axis::Y => "y",
        Axis::Z => "z",
    };
    format!("{slot_id}:{suffix}")
}

fn spawn_admin_screen(
    mut commands: Commands,
    loadout: Res<Loadout>,
    catalog: Res<Catalog>,
    store: Option<Res<ConfigStore>>,
) {
    let remote = store.as_deref().and_then(ConfigStore::remote).is_some();

    commands
        .spawn((
            AdminRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Center,
                padding: UiRect::all(Val::Px(20.0)),
                row_gap: Val::Px(10.0),
                overflow: Overflow::scroll_y(),
                ..default()
            },
            ScrollPosition::default(),
            BackgroundColor(Color::srgba(0.05, 0.05, 0.08, 0.97)),
        ))
        .with_children(|root| {
            spawn_title(root, "Admin");
            let status = if remote {
                "Remote store: connected"
            } else {
                "Remote store: unavailable, edits apply to this session only"
            };
            spawn_label(root, status, 13.0, COLOR_TEXT_DIM);

            root.spawn(row_node()).with_children(|row| {
                spawn_button(row, "Back to bench", AdminButton::Back);
                if remote {
                    spawn_button(row, "Seed store from demo data", AdminButton::SeedStore);
                }
            });

            let Some(weapon) = loadout.weapon() else {
                spawn_label(root, "Select a weapon on the bench first", 14.0, COLOR_TEXT_DIM);
                return;
            };

            root.spawn((panel_node(640.0), BackgroundColor(COLOR_PANEL)))
                .with_children(|p| {
                    spawn_title(p, &weapon.display_label());
                    let model = weapon.model_path.as_deref().unwrap_or("none (placeholder)");
                    spawn_label(p, &format!("Model: {model}"), 13.0, COLOR_TEXT);
                    let image = weapon.image_url.as_deref().unwrap_or("none");
                    spawn_label(p, &format!("Thumbnail: {image}"), 13.0, COLOR_TEXT);
                    p.spawn(row_node()).with_children(|row| {
                        spawn_button(row, "Import model (.glb/.gltf)", AdminButton::ImportModel);
                        spawn_button(row, "Import thumbnail", AdminButton::ImportImage);
                    });
                    p.spawn((
                        ProgressText,
                        Text::new(""),
                        TextFont { font_size: 13.0, ..default() },
                        TextColor(COLOR_ACCENT),
                    ));
                });

            root.spawn((panel_node(640.0), BackgroundColor(COLOR_PANEL)))
                .with_children(|p| {
                    spawn_title(p, "Slot positions");
                    for slot in catalog.slots_for(&weapon.id) {
                        let pos = slot.position_for(&weapon.id);
                        p.spawn(row_node()).with_children(|row| {
                            row.spawn((
                                Text::new(&slot.name),
                                TextFont { font_size: 13.0, ..default() },
                                TextColor(COLOR_TEXT),
                                Node { width: Val::Px(160.0), ..default() },
                            ));
                            for (axis, v) in [(Axis::X, pos.x), (Axis::Y, pos.y), (Axis::Z, pos.z)] {
                                spawn_text_input(row, &axis_key(&slot.id, axis), &v.to_string(), 90.0, SlotField);
                            }
                        });
                    }
                    spawn_button(p, "Apply positions", AdminButton::ApplySlots);
                });
        });
}

// ── Actions ─────────────────────────────────────────────────────────

/// Apply the editor fields to `slots`. Malformed values leave their axis alone;
/// returns how many were ignored.
fn apply_slot_fields(slots: &mut [Slot], field: impl Fn(&str) -> String) -> usize {
    let mut ignored = 0;
    for slot in slots.iter_mut() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let raw = field(&axis_key(&slot.id, axis));
            if !slot.set_axis(axis, &raw) {
                ignored += 1;
            }
        }
    }
    ignored
}

fn admin_button_system(
    q: Query<(&Interaction, &AdminButton), Changed<Interaction>>,
    fields: Query<&TextInput, With<SlotField>>,
    loadout: Res<Loadout>,
    mut catalog: ResMut<Catalog>,
    mut tasks: ResMut<AdminTasks>,
    mut notices: ResMut<Notices>,
    mut next_state: ResMut<NextState<BenchPhase>>,
    store: Option<Res<ConfigStore>>,
    objects: Option<Res<ObjectStore>>,
    rt: Option<Res<TokioRuntime>>,
) {
    let remote = store.as_deref().and_then(ConfigStore::remote).cloned();
    for (interaction, button) in &q {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match button {
            AdminButton::Back => next_state.set(BenchPhase::Bench),
            AdminButton::SeedStore => {
                let (Some(rt), Some(remote)) = (rt.as_deref(), remote.clone()) else {
                    continue;
                };
                let demo = match catalog_source::bundled() {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Bundled catalog is unreadable: {e:#}");
                        continue;
                    }
                };
                tasks.writes.push(rt.0.spawn(async move {
                    let n = seed_remote(&remote, &demo).await?;
                    Ok::<_, StorageError>(format!("Seeded store with {n} documents, restart to load it"))
                }));
            }
            AdminButton::ImportModel | AdminButton::ImportImage => {
                let target = match button {
                    AdminButton::ImportModel => ImportTarget::Model,
                    _ => ImportTarget::Image,
                };
                let (Some(rt), Some(objects), Some(weapon)) =
                    (rt.as_deref(), objects.as_deref(), loadout.weapon())
                else {
                    continue;
                };
                if tasks.import.is_some() {
                    notices.warning("An import is already running");
                    continue;
                }
                let Some(src) = pick_import_file(target) else {
                    continue;
                };
                if FileClass::of(&src) != Some(target.class()) {
                    notices.error(format!("Invalid file type: {}", src.display()));
                    continue;
                }
                tasks.import = Some(start_import(rt, objects.clone(), remote.clone(), weapon.clone(), src, target));
            }
            AdminButton::ApplySlots => {
                let Some(weapon_id) = loadout.weapon_id().map(str::to_string) else {
                    continue;
                };
                let Some(slots) = catalog.slots.get_mut(&weapon_id) else {
                    continue;
                };
                let ignored = apply_slot_fields(slots, |key| read_field(&fields, key));
                if ignored > 0 {
                    notices.warning(format!("Ignored {ignored} invalid values"));
                }
                let slots = slots.clone();
                match (rt.as_deref(), remote.clone()) {
                    (Some(rt), Some(remote)) => {
                        tasks.writes.push(rt.0.spawn(async move {
                            remote.set_weapon_slots(&weapon_id, &slots).await?;
                            Ok::<_, StorageError>("Slot positions saved".to_string())
                        }));
                    }
                    _ => {
                        notices.info("Slot positions updated for this session");
                    }
                }
            }
        }
    }
}

fn pick_import_file(target: ImportTarget) -> Option<PathBuf> {
    let dialog = rfd::FileDialog::new();
    match target {
        ImportTarget::Model => dialog.add_filter("3D model", &["glb", "gltf"]),
        ImportTarget::Image => dialog.add_filter("Image", &["png", "jpg", "jpeg", "webp"]),
    }
    .pick_file()
}

async fn persist_import(
    remote: &SqliteRepo,
    mut weapon: Weapon,
    target: ImportTarget,
    reference: &str,
) -> Result<bool, StorageError> {
    match target {
        ImportTarget::Model => remote.set_model_path(ObjectKind::Weapon, &weapon.id, reference).await,
        ImportTarget::Image => {
            if !remote.list_weapons().await?.iter().any(|w| w.id == weapon.id) {
                return Ok(false);
            }
            weapon.image_url = Some(reference.to_string());
            remote.upsert_weapon(&weapon).await?;
            Ok(true)
        }
    }
}

/// The earlier upload for the same item that `new` replaces, if the store owns it.
fn superseded<'a>(previous: Option<&'a str>, new: &str, item_id: &str) -> Option<&'a str> {
    let previous = previous?;
    let (new_dir, _) = new.rsplit_once('/')?;
    let (dir, file) = previous.rsplit_once('/')?;
    (previous != new && dir == new_dir && file.starts_with(&format!("{item_id}_"))).then_some(previous)
}

fn start_import(
    rt: &TokioRuntime,
    objects: ObjectStore,
    remote: Option<SqliteRepo>,
    weapon: Weapon,
    src: PathBuf,
    target: ImportTarget,
) -> ImportTask {
    let progress = Arc::new(AtomicU32::new(0.0f32.to_bits()));
    let reporter = progress.clone();
    let runtime = rt.0.handle().clone();
    let handle = rt.0.spawn_blocking(move || -> Result<ImportOutcome, StorageError> {
        let stored = objects.upload(&src, ObjectKind::Weapon, &weapon.id, |p| {
            reporter.store(p.to_bits(), Ordering::Relaxed);
        })?;
        debug!("Upload {} is {} bytes, sha256 {}", stored.reference, stored.bytes, stored.sha256);
        let weapon_id = weapon.id.clone();
        let previous = match target {
            ImportTarget::Model => weapon.model_path.clone(),
            ImportTarget::Image => weapon.image_url.clone(),
        };
        let persisted = match &remote {
            Some(remote) => runtime.block_on(persist_import(remote, weapon, target, &stored.reference))?,
            None => false,
        };
        if persisted
            && let Some(old) = superseded(previous.as_deref(), &stored.reference, &weapon_id)
        {
            match objects.delete(old) {
                Ok(true) => info!("Removed superseded upload {old}"),
                Ok(false) => {}
                Err(e) => warn!("Failed to remove superseded upload {old}: {e}"),
            }
        }
        Ok(ImportOutcome {
            weapon_id,
            target,
            reference: stored.reference,
            persisted,
        })
    });
    ImportTask { progress, handle }
}

fn poll_import(
    rt: Res<TokioRuntime>,
    mut tasks: ResMut<AdminTasks>,
    mut catalog: ResMut<Catalog>,
    mut loadout: ResMut<Loadout>,
    mut notices: ResMut<Notices>,
    mut progress_text: Query<&mut Text, With<ProgressText>>,
) {
    let Some(task) = &tasks.import else {
        return;
    };
    if !task.handle.is_finished() {
        let pct = f32::from_bits(task.progress.load(Ordering::Relaxed)) * 100.0;
        for mut text in &mut progress_text {
            **text = format!("Uploading... {pct:.0}%");
        }
        return;
    }
    let Some(task) = tasks.import.take() else {
        return;
    };
    for mut text in &mut progress_text {
        **text = String::new();
    }

    match rt.0.block_on(task.handle) {
        Ok(Ok(outcome)) => {
            apply_import(&mut catalog, &mut loadout, &outcome);
            let what = match outcome.target {
                ImportTarget::Model => "Model",
                ImportTarget::Image => "Thumbnail",
            };
            if outcome.persisted {
                notices.success(format!("{what} imported"));
            } else {
                notices.warning(format!("{what} imported for this session only (weapon not in store)"));
            }
        }
        Ok(Err(e)) => {
            warn!("Import failed: {e}");
            notices.error(format!("Import failed: {e}"));
        }
        Err(e) => error!("Import task failed: {e}"),
    }
}

/// Point the catalog weapon at the stored file and refresh the bench if it is selected.
fn apply_import(catalog: &mut Catalog, loadout: &mut Loadout, outcome: &ImportOutcome) {
    match outcome.target {
        ImportTarget::Model => {
            catalog.set_weapon_model(&outcome.weapon_id, outcome.reference.clone());
        }
        ImportTarget::Image => {
            if let Some(mut weapon) = catalog.weapon(&outcome.weapon_id).cloned() {
                weapon.image_url = Some(outcome.reference.clone());
                catalog.upsert_weapon(weapon);
            }
        }
    }
    if let Some(weapon) = catalog.weapon(&outcome.weapon_id).cloned() {
        loadout.refresh_weapon(weapon);
    }
}

fn poll_writes(rt: Res<TokioRuntime>, mut tasks: ResMut<AdminTasks>, mut notices: ResMut<Notices>) {
    let mut i = 0;
    while i < tasks.writes.len() {
        if !tasks.writes[i].is_finished() {
            i += 1;
            continue;
        }
        let handle = tasks.writes.swap_remove(i);
        match rt.0.block_on(handle) {
            Ok(Ok(message)) => {
                info!("{message}");
                notices.success(message);
            }
            Ok(Err(e)) => {
                warn!("Store write failed: {e}");
                notices.error(format!("Store write failed: {e}"));
            }
            Err(e) => error!("Store write task failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::catalog_source::bundled;
    use std::collections::HashMap;

    #[test]
    fn slot_fields_apply_valid_values_only() {
        let mut slots = vec![Slot {
            id: "muzzle_1".into(),
            name: "Muzzle".into(),
            position: None,
        }];
        let values: HashMap<String, String> = [
            ("muzzle_1:x".to_string(), "0.5".to_string()),
            ("muzzle_1:y".to_string(), "abc".to_string()),
            ("muzzle_1:z".to_string(), " 2.25 ".to_string()),
        ]
        .into();
        let ignored = apply_slot_fields(&mut slots, |k| values.get(k).cloned().unwrap_or_default());
        assert_eq!(ignored, 1);
        let p = slots[0].position.unwrap();
        assert_eq!((p.x, p.y, p.z), (0.5, 0.0, 2.25));
    }

    #[test]
    fn only_own_uploads_are_superseded() {
        let new = "models/weapons/1_bbb_hk.glb";
        assert_eq!(
            superseded(Some("models/weapons/1_aaa_hk.glb"), new, "1"),
            Some("models/weapons/1_aaa_hk.glb")
        );
        assert_eq!(superseded(Some(new), new, "1"), None);
        assert_eq!(superseded(Some("models/weapons/2_aaa_ak.glb"), new, "1"), None);
        assert_eq!(superseded(Some("rifle.glb"), new, "1"), None);
        assert_eq!(superseded(None, new, "1"), None);
    }

    #[test]
    fn import_updates_catalog_and_selected_weapon() {
        let mut catalog = bundled().unwrap();
        let mut loadout = Loadout::default();
        loadout.select_weapon(catalog.weapon("1").unwrap().clone());

        let outcome = ImportOutcome {
            weapon_id: "1".into(),
            target: ImportTarget::Model,
            reference: "models/weapons/1_abc_hk.glb".into(),
            persisted: false,
        };
        apply_import(&mut catalog, &mut loadout, &outcome);
        assert_eq!(
            catalog.weapon("1").unwrap().model_path.as_deref(),
            Some("models/weapons/1_abc_hk.glb")
        );
        assert_eq!(
            loadout.weapon().unwrap().model_path.as_deref(),
            Some("models/weapons/1_abc_hk.glb")
        );

        let outcome = ImportOutcome {
            target: ImportTarget::Image,
            reference: "images/weapons/1_abc_hk.png".into(),
            ..outcome
        };
        apply_import(&mut catalog, &mut loadout, &outcome);
        assert_eq!(
            catalog.weapon("1").unwrap().image_url.as_deref(),
            Some("images/weapons/1_abc_hk.png")
        );
    }

    #[test]
    fn import_writes_file_and_model_path() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("hk.glb");
        std::fs::write(&src, b"glTF").unwrap();
        let rt = TokioRuntime(tokio::runtime::Runtime::new().unwrap());
        let remote = rt
            .0
            .block_on(SqliteRepo::new(&dir.path().join("bench.db")))
            .unwrap();
        let weapon = bundled().unwrap().weapon("1").unwrap().clone();
        rt.0.block_on(remote.upsert_weapon(&weapon)).unwrap();

        let objects = ObjectStore::new(dir.path().join("objects"));
        let task = start_import(&rt, objects.clone(), Some(remote.clone()), weapon, src, ImportTarget::Model);
        let outcome = rt.0.block_on(task.handle).unwrap().unwrap();
        assert!(outcome.persisted);
        assert!(objects.resolve(&outcome.reference).exists());
        assert_eq!(f32::from_bits(task.progress.load(Ordering::Relaxed)), 1.0);

        let stored = rt.0.block_on(remote.list_weapons()).unwrap();
        assert_eq!(stored[0].model_path.as_deref(), Some(outcome.reference.as_str()));
    }
}
