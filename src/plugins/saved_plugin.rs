use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::prelude::*;

use crate::armory::components::BenchPhase;
use crate::armory::events::BenchCommand;
use crate::armory::loadout::Loadout;
use crate::armory::parts::presets::Preset;
use crate::armory::parts::registry::Catalog;
use crate::armory::stats::display::{format_signed, label};
use crate::storage::saved::SavedConfiguration;

use super::bench_plugin::{PresetsPanel, SavedPanel};
use super::storage_plugin::SavedConfigs;
use super::widgets::*;

const NAME_FIELD: &str = "config_name";

#[derive(Component)]
struct SavedList;

#[derive(Component)]
struct SaveButton {
    prefer_local: bool,
}

#[derive(Component)]
enum SavedAction {
    Load(String),
    Compare(String),
    Delete(String),
}

#[derive(Component)]
struct PresetButton(String);

#[derive(Component)]
struct NameInput;

pub struct SavedPlugin;

impl Plugin for SavedPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                spawn_saved_header,
                rebuild_saved_list,
                rebuild_presets_panel,
                saved_panel_system,
            )
                .chain()
                .run_if(in_state(BenchPhase::Bench)),
        );
    }
}

// ── Saved configurations ────────────────────────────────────────────

fn spawn_saved_header(mut commands: Commands, panel: Query<Entity, Added<SavedPanel>>) {
    for panel in &panel {
        commands.entity(panel).with_children(|p| {
            spawn_title(p, "Saved Configurations");
            spawn_text_input(p, NAME_FIELD, "", 264.0, NameInput);
            p.spawn(row_node()).with_children(|row| {
                spawn_button(row, "Save", SaveButton { prefer_local: false });
                spawn_button(row, "Save locally", SaveButton { prefer_local: true });
            });
            p.spawn((
                SavedList,
                Node {
                    flex_direction: FlexDirection::Column,
                    row_gap: Val::Px(6.0),
                    ..default()
                },
            ));
        });
    }
}

fn spawn_saved_card(list: &mut ChildSpawnerCommands, config: &SavedConfiguration, comparing: bool) {
    list.spawn((
        Node {
            flex_direction: FlexDirection::Column,
            padding: UiRect::all(Val::Px(6.0)),
            row_gap: Val::Px(4.0),
            border_radius: BorderRadius::all(Val::Px(5.0)),
            ..default()
        },
        BackgroundColor(COLOR_CARD),
    ))
    .with_children(|card| {
        spawn_label(card, &config.name, 14.0, COLOR_TEXT);
        let mut meta = format!(
            "{} · {} attachments · {}",
            config.weapon_name,
            config.attachments.occupied_count(),
            config.created_at.format("%Y-%m-%d %H:%M")
        );
        if config.is_local {
            meta.push_str(" · local");
        }
        spawn_label(card, &meta, 11.0, COLOR_TEXT_DIM);
        card.spawn(row_node()).with_children(|row| {
            spawn_button(row, "Load", SavedAction::Load(config.id.clone()));
            let compare_color = if comparing { COLOR_BTN_ACTIVE } else { COLOR_BTN };
            spawn_button_colored(row, "Compare", SavedAction::Compare(config.id.clone()), compare_color);
            spawn_button(row, "Delete", SavedAction::Delete(config.id.clone()));
        });
    });
}

fn rebuild_saved_list(
    mut commands: Commands,
    saved: Res<SavedConfigs>,
    loadout: Res<Loadout>,
    list: Query<(Entity, Option<&Children>), With<SavedList>>,
    added: Query<(), Added<SavedList>>,
) {
    if !(saved.is_changed() || loadout.is_changed() || !added.is_empty()) {
        return;
    }
    let Some(list) = clear_children(&mut commands, &list) else {
        return;
    };
    commands.entity(list).with_children(|l| {
        if loadout.weapon().is_none() {
            spawn_label(l, "Select a weapon", 13.0, COLOR_TEXT_DIM);
            return;
        }
        if saved.loading {
            spawn_label(l, "Loading...", 13.0, COLOR_TEXT_DIM);
            return;
        }
        if saved.items.is_empty() {
            spawn_label(l, "No saved configurations", 13.0, COLOR_TEXT_DIM);
        }
        for config in &saved.items {
            spawn_saved_card(l, config, saved.comparing.as_deref() == Some(config.id.as_str()));
        }
    });
}

fn saved_panel_system(
    saves: Query<(&Interaction, &SaveButton), Changed<Interaction>>,
    actions: Query<(&Interaction, &SavedAction), Changed<Interaction>>,
    presets: Query<(&Interaction, &PresetButton), Changed<Interaction>>,
    mut name_input: Query<&mut TextInput, With<NameInput>>,
    saved: Res<SavedConfigs>,
    mut commands_out: MessageWriter<BenchCommand>,
) {
    for (interaction, save) in &saves {
        if *interaction != Interaction::Pressed {
            continue;
        }
        let Ok(mut input) = name_input.single_mut() else {
            continue;
        };
        commands_out.write(BenchCommand::SaveConfig {
            name: input.value.clone(),
            prefer_local: save.prefer_local,
        });
        if !input.value.trim().is_empty() {
            input.value.clear();
        }
    }

    for (interaction, action) in &actions {
        if *interaction != Interaction::Pressed {
            continue;
        }
        let command = match action {
            SavedAction::Load(id) => BenchCommand::LoadConfig(id.clone()),
            SavedAction::Compare(id) if saved.comparing.as_deref() == Some(id.as_str()) => {
                BenchCommand::CompareWith(None)
            }
            SavedAction::Compare(id) => BenchCommand::CompareWith(Some(id.clone())),
            SavedAction::Delete(id) => BenchCommand::DeleteConfig(id.clone()),
        };
        commands_out.write(command);
    }

    for (interaction, preset) in &presets {
        if *interaction == Interaction::Pressed {
            commands_out.write(BenchCommand::ApplyPreset(preset.0.clone()));
        }
    }
}

// ── Presets ─────────────────────────────────────────────────────────

fn spawn_preset_card(panel: &mut ChildSpawnerCommands, preset: &Preset) {
    panel
        .spawn((
            Node {
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(6.0)),
                row_gap: Val::Px(4.0),
                border_radius: BorderRadius::all(Val::Px(5.0)),
                ..default()
            },
            BackgroundColor(COLOR_CARD),
        ))
        .with_children(|card| {
            spawn_label(card, &preset.name, 14.0, COLOR_TEXT);
            spawn_label(card, &preset.description, 11.0, COLOR_TEXT_DIM);
            card.spawn(row_node()).with_children(|row| {
                for featured in &preset.featured_stats {
                    let color = if featured.is_positive { COLOR_BETTER } else { COLOR_WORSE };
                    let text = format!("{} {}", label(&featured.stat), format_signed(featured.value));
                    spawn_label(row, &text, 11.0, color);
                }
            });
            spawn_button(card, "Apply", PresetButton(preset.id.clone()));
        });
}

fn rebuild_presets_panel(
    mut commands: Commands,
    catalog: Res<Catalog>,
    loadout: Res<Loadout>,
    mut shown_for: Local<Option<String>>,
    panel: Query<(Entity, Option<&Children>), With<PresetsPanel>>,
    added: Query<(), Added<PresetsPanel>>,
) {
    let weapon_id = loadout.weapon_id().map(str::to_string);
    if !(catalog.is_changed() || *shown_for != weapon_id || !added.is_empty()) {
        return;
    }
    let Some(panel) = clear_children(&mut commands, &panel) else {
        return;
    };
    *shown_for = weapon_id;
    commands.entity(panel).with_children(|p| {
        spawn_title(p, "Presets");
        let presets = shown_for.as_deref().map(|id| catalog.presets_for(id)).unwrap_or_default();
        if presets.is_empty() {
            spawn_label(p, "No presets for this weapon", 13.0, COLOR_TEXT_DIM);
        }
        for preset in presets {
            spawn_preset_card(p, preset);
        }
    });
}
