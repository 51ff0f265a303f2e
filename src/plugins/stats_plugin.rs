use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::prelude::*;

use crate::armory::components::BenchPhase;
use crate::armory::events::BenchCommand;
use crate::armory::loadout::Loadout;
use crate::armory::stats::compare::compare;
use crate::armory::stats::display::{StatLine, format_number, format_signed, label, stat_panel};
use crate::armory::stats::types::StatChange;

use super::bench_plugin::{ComparePanel, StatsPanel};
use super::storage_plugin::SavedConfigs;
use super::widgets::*;

#[derive(Component)]
struct CloseCompareButton;

pub struct StatsPlugin;

impl Plugin for StatsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (rebuild_stats_panel, rebuild_compare_panel, compare_panel_system)
                .run_if(in_state(BenchPhase::Bench)),
        );
    }
}

fn change_color(change: StatChange) -> Color {
    match change {
        StatChange::Better => COLOR_BETTER,
        StatChange::Worse => COLOR_WORSE,
        StatChange::Unchanged => COLOR_TEXT,
    }
}

fn spawn_stat_line(parent: &mut ChildSpawnerCommands, line: &StatLine) {
    parent
        .spawn(Node {
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(2.0),
            ..default()
        })
        .with_children(|row| {
            row.spawn(Node {
                justify_content: JustifyContent::SpaceBetween,
                ..default()
            })
            .with_children(|text| {
                spawn_label(text, &line.label, 13.0, COLOR_TEXT_DIM);
                spawn_label(text, &line.value, 13.0, change_color(line.change));
            });

            let Some(pct) = line.bar else {
                return;
            };
            row.spawn((
                Node {
                    width: Val::Percent(100.0),
                    height: Val::Px(4.0),
                    border_radius: BorderRadius::all(Val::Px(2.0)),
                    ..default()
                },
                BackgroundColor(COLOR_BAR_BG),
            ))
            .with_children(|bar| {
                let fill = match line.change {
                    StatChange::Unchanged => COLOR_ACCENT,
                    change => change_color(change),
                };
                bar.spawn((
                    Node {
                        width: Val::Percent(pct as f32),
                        height: Val::Percent(100.0),
                        border_radius: BorderRadius::all(Val::Px(2.0)),
                        ..default()
                    },
                    BackgroundColor(fill),
                ));
            });
        });
}

fn rebuild_stats_panel(
    mut commands: Commands,
    loadout: Res<Loadout>,
    panel: Query<(Entity, Option<&Children>), With<StatsPanel>>,
    added: Query<(), Added<StatsPanel>>,
) {
    if !(loadout.is_changed() || !added.is_empty()) {
        return;
    }
    let Some(panel) = clear_children(&mut commands, &panel) else {
        return;
    };
    commands.entity(panel).with_children(|p| {
        let (Some(weapon), Some(derived)) = (loadout.weapon(), loadout.derived()) else {
            spawn_title(p, "Stats");
            spawn_label(p, "Select a weapon", 14.0, COLOR_TEXT_DIM);
            return;
        };
        spawn_title(p, &weapon.name);
        let count = loadout.equipped().occupied_count();
        spawn_label(p, &format!("{count} attachments equipped"), 12.0, COLOR_TEXT_DIM);

        for (group, lines) in stat_panel(derived) {
            spawn_label(p, group, 15.0, COLOR_ACCENT);
            for line in &lines {
                spawn_stat_line(p, line);
            }
        }
    });
}

fn rebuild_compare_panel(
    mut commands: Commands,
    loadout: Res<Loadout>,
    saved: Res<SavedConfigs>,
    panel: Query<(Entity, Option<&Children>), With<ComparePanel>>,
    added: Query<(), Added<ComparePanel>>,
) {
    if !(loadout.is_changed() || saved.is_changed() || !added.is_empty()) {
        return;
    }
    let Some(panel) = clear_children(&mut commands, &panel) else {
        return;
    };
    commands.entity(panel).with_children(|p| {
        spawn_title(p, "Compare");
        let (Some(derived), Some(other)) = (loadout.derived(), saved.comparison()) else {
            spawn_label(p, "Pick a saved configuration to compare", 13.0, COLOR_TEXT_DIM);
            return;
        };
        spawn_label(p, &format!("Current vs \"{}\"", other.name), 13.0, COLOR_TEXT);

        for row in compare(&derived.stats, &other.stats.stats) {
            p.spawn(Node {
                justify_content: JustifyContent::SpaceBetween,
                ..default()
            })
            .with_children(|r| {
                spawn_label(r, &label(row.stat.as_str()), 12.0, COLOR_TEXT_DIM);
                spawn_label(
                    r,
                    &format!(
                        "{} / {}  ({})",
                        format_number(row.current),
                        format_number(row.other),
                        format_signed(row.difference)
                    ),
                    12.0,
                    change_color(row.change),
                );
            });
        }
        spawn_button(p, "Close", CloseCompareButton);
    });
}

fn compare_panel_system(
    q: Query<&Interaction, (Changed<Interaction>, With<CloseCompareButton>)>,
    mut commands_out: MessageWriter<BenchCommand>,
) {
    for interaction in &q {
        if *interaction == Interaction::Pressed {
            commands_out.write(BenchCommand::CompareWith(None));
        }
    }
}
