use bevy::prelude::*;

use crate::armory::components::BenchPhase;
use crate::armory::events::{BenchCommand, CameraCommand};
use crate::armory::loadout::Loadout;
use crate::armory::parts::registry::Catalog;
use crate::config::settings::Settings;
use crate::notices::Notices;
use crate::storage::persistence::ConfigStore;
use crate::storage::saved::ConfigDraft;

use super::export_plugin::ExportButton;
use super::storage_plugin::{CatalogStatus, PendingTasks, SavedConfigs, TokioRuntime};
use super::widgets::*;

// ── Layout markers ──────────────────────────────────────────────────

#[derive(Component)]
pub struct BenchRoot;

#[derive(Component)]
pub struct WeaponListPanel;

#[derive(Component)]
pub struct PresetsPanel;

#[derive(Component)]
pub struct SavedPanel;

#[derive(Component)]
pub struct StatsPanel;

#[derive(Component)]
pub struct ComparePanel;

#[derive(Component)]
pub struct FilterRow;

/// Full-window layer that holds the floating slot markers.
#[derive(Component)]
pub struct SlotOverlay;

#[derive(Component)]
struct WeaponButton(String);

#[derive(Component)]
struct AdminButton;

#[derive(Component)]
struct CameraButton(CameraCommand);

// ── Plugin ──────────────────────────────────────────────────────────

pub struct BenchPlugin;

impl Plugin for BenchPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<BenchPhase>()
            .add_message::<BenchCommand>()
            .add_message::<CameraCommand>()
            .init_resource::<Catalog>()
            .init_resource::<Loadout>()
            .add_systems(OnEnter(BenchPhase::Bench), spawn_bench_layout)
            .add_systems(OnExit(BenchPhase::Bench), (despawn::<BenchRoot>, despawn::<SlotOverlay>))
            .add_systems(
                Update,
                (
                    apply_bench_commands,
                    rebuild_weapon_list,
                    (weapon_list_system, toolbar_system).run_if(in_state(BenchPhase::Bench)),
                    reload_settings,
                ),
            );
    }
}

// ── Controller ──────────────────────────────────────────────────────

/// Store work the controller asks for after applying a command.
#[derive(Debug)]
enum StoreRequest {
    WeaponData { weapon_id: String, generation: u64 },
    Save { draft: ConfigDraft, prefer_local: bool, generation: u64 },
    Delete { id: String, generation: u64 },
}

/// Apply one command to the bench state. All `Loadout` mutation happens here.
fn apply_command(
    command: BenchCommand,
    catalog: &Catalog,
    loadout: &mut Loadout,
    saved: &mut SavedConfigs,
    notices: &mut Notices,
) -> Option<StoreRequest> {
    match command {
        BenchCommand::SelectWeapon(id) => {
            let Some(weapon) = catalog.weapon(&id).cloned() else {
                warn!("Unknown weapon {id}");
                return None;
            };
            let generation = loadout.select_weapon(weapon);
            saved.items.clear();
            saved.comparing = None;
            saved.loading = true;
            info!("Selected weapon {id} (selection {generation})");
            Some(StoreRequest::WeaponData { weapon_id: id, generation })
        }
        BenchCommand::Equip { slot_id, attachment_id } => {
            loadout.weapon()?;
            let attachment = match attachment_id {
                Some(aid) => {
                    let Some(a) = catalog.attachment(&aid) else {
                        warn!("Unknown attachment {aid}");
                        return None;
                    };
                    if !a.fits(&slot_id) {
                        warn!("{} does not fit {slot_id}", a.name);
                        notices.error(format!("{} does not fit this slot", a.name));
                        return None;
                    }
                    Some(a.clone())
                }
                None => None,
            };
            match &attachment {
                Some(a) => notices.success(format!("{} equipped", a.name)),
                None => notices.info("Attachment removed"),
            };
            loadout.equip(&slot_id, attachment);
            None
        }
        BenchCommand::ToggleSlot(slot_id) => {
            loadout.toggle_slot(&slot_id);
            None
        }
        BenchCommand::CloseSlot => {
            loadout.close_slot();
            None
        }
        BenchCommand::ToggleFilter(category) => {
            loadout.filters.toggle(category);
            None
        }
        BenchCommand::ApplyPreset(preset_id) => {
            let weapon_id = loadout.weapon_id()?.to_string();
            let Some(preset) = catalog.preset(&weapon_id, &preset_id) else {
                warn!("Unknown preset {preset_id} for weapon {weapon_id}");
                return None;
            };
            loadout.replace_equipped(preset.resolve(&catalog.attachments));
            notices.success("Preset configuration applied");
            None
        }
        BenchCommand::LoadConfig(id) => {
            let config = saved.get(&id)?;
            if loadout.weapon_id() != Some(config.weapon_id.as_str()) {
                warn!("Configuration {id} belongs to weapon {}", config.weapon_id);
                return None;
            }
            loadout.replace_equipped(config.attachments.clone());
            notices.success("Configuration loaded");
            None
        }
        BenchCommand::SaveConfig { name, prefer_local } => {
            let Some(draft) = ConfigDraft::from_loadout(&name, loadout) else {
                notices.warning("Enter a configuration name first");
                return None;
            };
            Some(StoreRequest::Save {
                draft,
                prefer_local,
                generation: loadout.generation(),
            })
        }
        BenchCommand::DeleteConfig(id) => Some(StoreRequest::Delete {
            id,
            generation: loadout.generation(),
        }),
        BenchCommand::CompareWith(id) => {
            saved.comparing = id.filter(|id| saved.get(id).is_some());
            None
        }
    }
}

fn apply_bench_commands(
    mut commands_in: MessageReader<BenchCommand>,
    catalog: Res<Catalog>,
    mut loadout: ResMut<Loadout>,
    mut saved: ResMut<SavedConfigs>,
    mut tasks: ResMut<PendingTasks>,
    mut notices: ResMut<Notices>,
    store: Option<Res<ConfigStore>>,
    rt: Option<Res<TokioRuntime>>,
) {
    for command in commands_in.read() {
        let Some(request) =
            apply_command(command.clone(), &catalog, &mut loadout, &mut saved, &mut notices)
        else {
            continue;
        };
        let (Some(rt), Some(store)) = (rt.as_deref(), store.as_deref()) else {
            warn!("Storage is not initialized, dropping {request:?}");
            saved.loading = false;
            continue;
        };
        match request {
            StoreRequest::WeaponData { weapon_id, generation } => {
                tasks.request_weapon_scope(rt, store, &weapon_id, generation);
                tasks.request_configs(rt, store, &weapon_id, generation);
            }
            StoreRequest::Save { draft, prefer_local, generation } => {
                tasks.request_save(rt, store, draft, prefer_local, generation);
            }
            StoreRequest::Delete { id, generation } => {
                tasks.request_delete(rt, store, &id, generation);
            }
        }
    }
}

fn reload_settings(
    keyboard: Res<ButtonInput<KeyCode>>,
    inputs: Query<&TextInput>,
    mut settings: ResMut<Settings>,
    mut notices: ResMut<Notices>,
) {
    if keyboard.just_pressed(KeyCode::F5) && !typing(&inputs) {
        settings.reload();
        notices.set_ttl(settings.notice_ttl_secs);
        notices.info("Settings reloaded");
    }
}

// ── Layout ──────────────────────────────────────────────────────────

fn column_node(width: f32) -> Node {
    Node {
        width: Val::Px(width),
        height: Val::Percent(100.0),
        flex_direction: FlexDirection::Column,
        padding: UiRect::all(Val::Px(8.0)),
        row_gap: Val::Px(8.0),
        overflow: Overflow::scroll_y(),
        ..default()
    }
}

fn spawn_bench_layout(mut commands: Commands) {
    commands
        .spawn((
            BenchRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Row,
                justify_content: JustifyContent::SpaceBetween,
                ..default()
            },
            Pickable::IGNORE,
        ))
        .with_children(|root| {
            root.spawn((column_node(300.0), ScrollPosition::default()))
                .with_children(|left| {
                    left.spawn((WeaponListPanel, panel_node(284.0), BackgroundColor(COLOR_PANEL)));
                    left.spawn((PresetsPanel, panel_node(284.0), BackgroundColor(COLOR_PANEL)));
                    left.spawn((SavedPanel, panel_node(284.0), BackgroundColor(COLOR_PANEL)));
                });

            root.spawn((
                Node {
                    flex_grow: 1.0,
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    padding: UiRect::all(Val::Px(8.0)),
                    row_gap: Val::Px(6.0),
                    ..default()
                },
                Pickable::IGNORE,
            ))
            .with_children(|center| {
                center.spawn(row_node()).with_children(|bar| {
                    spawn_button(bar, "<", CameraButton(CameraCommand::RotateLeft));
                    spawn_button(bar, ">", CameraButton(CameraCommand::RotateRight));
                    spawn_button(bar, "+", CameraButton(CameraCommand::ZoomIn));
                    spawn_button(bar, "-", CameraButton(CameraCommand::ZoomOut));
                    spawn_button(bar, "Reset", CameraButton(CameraCommand::Reset));
                    spawn_button(bar, "Auto-rotate", CameraButton(CameraCommand::ToggleAutoRotate));
                    spawn_button(bar, "Export PNG", ExportButton::Png);
                    spawn_button(bar, "Export JSON", ExportButton::Json);
                    spawn_button(bar, "Admin", AdminButton);
                });
                center.spawn((FilterRow, row_node()));
            });

            root.spawn((column_node(330.0), ScrollPosition::default()))
                .with_children(|right| {
                    right.spawn((StatsPanel, panel_node(314.0), BackgroundColor(COLOR_PANEL)));
                    right.spawn((ComparePanel, panel_node(314.0), BackgroundColor(COLOR_PANEL)));
                });
        });

    commands.spawn((
        SlotOverlay,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        },
        GlobalZIndex(1),
        Pickable::IGNORE,
    ));
}

fn rebuild_weapon_list(
    mut commands: Commands,
    catalog: Res<Catalog>,
    loadout: Res<Loadout>,
    status: Res<CatalogStatus>,
    panel: Query<(Entity, Option<&Children>), With<WeaponListPanel>>,
    added: Query<(), Added<WeaponListPanel>>,
) {
    if !(catalog.is_changed() || status.is_changed() || loadout.is_changed() || !added.is_empty()) {
        return;
    }
    let Some(panel) = clear_children(&mut commands, &panel) else {
        return;
    };
    commands.entity(panel).with_children(|p| {
        spawn_title(p, "Weapons");
        if !status.ready {
            spawn_label(p, "Loading catalog...", 14.0, COLOR_TEXT_DIM);
            return;
        }
        if status.demo {
            spawn_label(p, "Demo data", 12.0, COLOR_TEXT_DIM);
        }
        for weapon in &catalog.weapons {
            let color = if loadout.weapon_id() == Some(weapon.id.as_str()) {
                COLOR_BTN_ACTIVE
            } else {
                COLOR_BTN
            };
            spawn_button_colored(p, &weapon.display_label(), WeaponButton(weapon.id.clone()), color);
        }
    });
}

fn weapon_list_system(
    q: Query<(&Interaction, &WeaponButton), Changed<Interaction>>,
    loadout: Res<Loadout>,
    mut commands_out: MessageWriter<BenchCommand>,
) {
    for (interaction, btn) in &q {
        if *interaction == Interaction::Pressed && loadout.weapon_id() != Some(btn.0.as_str()) {
            commands_out.write(BenchCommand::SelectWeapon(btn.0.clone()));
        }
    }
}

fn toolbar_system(
    camera_q: Query<(&Interaction, &CameraButton), Changed<Interaction>>,
    admin_q: Query<&Interaction, (Changed<Interaction>, With<AdminButton>)>,
    mut camera_out: MessageWriter<CameraCommand>,
    mut next_state: ResMut<NextState<BenchPhase>>,
) {
    for (interaction, btn) in &camera_q {
        if *interaction == Interaction::Pressed {
            camera_out.write(btn.0);
        }
    }
    for interaction in &admin_q {
        if *interaction == Interaction::Pressed {
            next_state.set(BenchPhase::Admin);
        }
    }
}
