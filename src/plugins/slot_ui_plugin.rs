use std::collections::HashMap;

use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::armory::components::{BenchCamera, BenchPhase, WeaponRoot};
use crate::armory::events::BenchCommand;
use crate::armory::loadout::Loadout;
use crate::armory::parts::attachment::{Attachment, Category, badge};
use crate::armory::parts::registry::Catalog;
use crate::armory::parts::slot::Slot;
use crate::armory::projection::{CameraModel, ScreenAnchor, Surface, Viewport, project_slot};
use crate::armory::stats::types::StatChange;
use crate::config::settings::Settings;

use super::bench_plugin::{FilterRow, SlotOverlay};
use super::widgets::*;

const MARKER_SIZE: f32 = 28.0;
const OPTIONS_WIDTH: f32 = 260.0;
const OPTIONS_MAX_HEIGHT: f32 = 360.0;

/// Latest screen anchor per slot id of the selected weapon.
#[derive(Resource, Debug, Default)]
pub struct SlotAnchors(pub HashMap<String, ScreenAnchor>);

/// Fallback refresh so markers never drift for long.
#[derive(Resource)]
struct MarkerPoll(Timer);

#[derive(Component)]
struct SlotMarker {
    slot_id: String,
}

#[derive(Component)]
struct SlotOptionsPanel;

#[derive(Component)]
struct OptionButton {
    slot_id: String,
    attachment_id: String,
}

#[derive(Component)]
struct RemoveButton(String);

#[derive(Component)]
struct CloseOptionsButton;

#[derive(Component)]
struct FilterButton(Category);

// ── Plugin ──────────────────────────────────────────────────────────

pub struct SlotUiPlugin;

impl Plugin for SlotUiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SlotAnchors>()
            .add_systems(Startup, init_marker_poll)
            .add_systems(
                Update,
                (
                    rebuild_slot_markers,
                    rebuild_filter_row,
                    update_slot_anchors,
                    place_markers,
                    slot_ui_system,
                )
                    .chain()
                    .run_if(in_state(BenchPhase::Bench)),
            );
    }
}

fn init_marker_poll(mut commands: Commands, settings: Res<Settings>) {
    commands.insert_resource(MarkerPoll(Timer::from_seconds(
        settings.marker_poll_interval_secs.max(0.01),
        TimerMode::Repeating,
    )));
}

// ── Anchors ─────────────────────────────────────────────────────────

/// Slot reference points in world space, following the weapon root transform.
pub fn slot_world_points(
    slots: &[Slot],
    weapon_id: &str,
    root: &GlobalTransform,
) -> Vec<(String, Vec3)> {
    slots
        .iter()
        .map(|s| (s.id.clone(), root.transform_point(s.position_for(weapon_id))))
        .collect()
}

pub fn compute_anchors(
    points: &[(String, Vec3)],
    camera: &CameraModel,
    surface: &Surface,
    viewport: &Viewport,
) -> HashMap<String, ScreenAnchor> {
    points
        .iter()
        .map(|(id, p)| (id.clone(), project_slot(*p, camera, surface, viewport, id)))
        .collect()
}

/// Top-left corner for the options panel next to its marker, kept in the window.
pub fn options_position(anchor: &ScreenAnchor, viewport: &Viewport) -> Vec2 {
    let mut x = anchor.x + MARKER_SIZE;
    if x + OPTIONS_WIDTH > viewport.width {
        x = anchor.x - MARKER_SIZE - OPTIONS_WIDTH;
    }
    let y = anchor.y - MARKER_SIZE;
    let max_y = (viewport.height - OPTIONS_MAX_HEIGHT).max(0.0);
    Vec2::new(x.max(0.0), y.clamp(0.0, max_y))
}

fn update_slot_anchors(
    time: Res<Time>,
    settings: Res<Settings>,
    loadout: Res<Loadout>,
    catalog: Res<Catalog>,
    mut poll: ResMut<MarkerPoll>,
    mut resized: MessageReader<WindowResized>,
    window_q: Query<&Window, With<PrimaryWindow>>,
    camera_q: Query<(Ref<GlobalTransform>, &Projection), With<BenchCamera>>,
    root_q: Query<Ref<GlobalTransform>, With<WeaponRoot>>,
    added: Query<(), Added<SlotMarker>>,
    mut anchors: ResMut<SlotAnchors>,
) {
    let polled = poll.0.tick(time.delta()).just_finished();
    let resized = resized.read().count() > 0;
    let (Ok((camera_gt, projection)), Ok(root_gt), Ok(window)) =
        (camera_q.single(), root_q.single(), window_q.single())
    else {
        return;
    };
    let moved = camera_gt.is_changed() || root_gt.is_changed();
    if !(polled || resized || moved || loadout.is_changed() || !added.is_empty()) {
        return;
    }

    let Some(weapon_id) = loadout.weapon_id() else {
        anchors.0.clear();
        return;
    };
    let (fov, near, far) = match projection {
        Projection::Perspective(p) => (p.fov.to_degrees(), p.near, p.far),
        _ => (settings.camera_fov, settings.camera_near, settings.camera_far),
    };
    let camera = CameraModel::looking(
        camera_gt.translation(),
        camera_gt.forward().into(),
        camera_gt.up().into(),
        fov,
        near,
        far,
    );
    let surface = Surface {
        left: 0.0,
        top: 0.0,
        width: window.width(),
        height: window.height(),
    };
    let viewport = Viewport {
        width: window.width(),
        height: window.height(),
    };
    let points = slot_world_points(catalog.slots_for(weapon_id), weapon_id, &root_gt);
    let next = compute_anchors(&points, &camera, &surface, &viewport);
    if anchors.0 != next {
        anchors.0 = next;
    }
}

fn place_markers(
    anchors: Res<SlotAnchors>,
    loadout: Res<Loadout>,
    window_q: Query<&Window, With<PrimaryWindow>>,
    mut markers: Query<(&SlotMarker, &mut Node), Without<SlotOptionsPanel>>,
    mut panel_q: Query<&mut Node, With<SlotOptionsPanel>>,
    added_markers: Query<(), Added<SlotMarker>>,
    added_panel: Query<(), Added<SlotOptionsPanel>>,
) {
    if !(anchors.is_changed() || !added_markers.is_empty() || !added_panel.is_empty()) {
        return;
    }
    for (marker, mut node) in &mut markers {
        match anchors.0.get(&marker.slot_id) {
            Some(a) if a.visible => {
                node.display = Display::Flex;
                node.left = Val::Px(a.x - MARKER_SIZE / 2.0);
                node.top = Val::Px(a.y - MARKER_SIZE / 2.0);
            }
            _ => node.display = Display::None,
        }
    }

    let (Ok(mut panel), Ok(window)) = (panel_q.single_mut(), window_q.single()) else {
        return;
    };
    let anchor = loadout.active_slot().and_then(|id| anchors.0.get(id));
    match anchor {
        Some(a) if a.visible => {
            let viewport = Viewport {
                width: window.width(),
                height: window.height(),
            };
            let at = options_position(a, &viewport);
            panel.display = Display::Flex;
            panel.left = Val::Px(at.x);
            panel.top = Val::Px(at.y);
        }
        _ => panel.display = Display::None,
    }
}

// ── Markers & options ───────────────────────────────────────────────

fn rebuild_slot_markers(
    mut commands: Commands,
    loadout: Res<Loadout>,
    catalog: Res<Catalog>,
    overlay: Query<(Entity, Option<&Children>), With<SlotOverlay>>,
    added: Query<(), Added<SlotOverlay>>,
) {
    if !(loadout.is_changed() || catalog.is_changed() || !added.is_empty()) {
        return;
    }
    let Some(overlay) = clear_children(&mut commands, &overlay) else {
        return;
    };
    let Some(weapon_id) = loadout.weapon_id() else {
        return;
    };

    commands.entity(overlay).with_children(|layer| {
        for slot in catalog.slots_for(weapon_id) {
            let equipped = loadout.equipped().get(&slot.id);
            let color = if loadout.active_slot() == Some(slot.id.as_str()) {
                COLOR_BTN_ACTIVE
            } else if equipped.is_some() {
                COLOR_ACCENT.with_alpha(0.85)
            } else {
                COLOR_BTN
            };
            spawn_marker(layer, slot, equipped, color);
        }

        if let Some(slot_id) = loadout.active_slot() {
            let slot = catalog.slots_for(weapon_id).iter().find(|s| s.id == slot_id);
            let title = slot.map_or(slot_id, |s| s.name.as_str());
            layer.spawn((
                SlotOptionsPanel,
                Node {
                    position_type: PositionType::Absolute,
                    display: Display::None,
                    max_height: Val::Px(OPTIONS_MAX_HEIGHT),
                    overflow: Overflow::scroll_y(),
                    ..panel_node(OPTIONS_WIDTH)
                },
                ScrollPosition::default(),
                BackgroundColor(COLOR_PANEL),
            ))
            .with_children(|panel| {
                spawn_title(panel, title);
                let options = catalog.compatible(weapon_id, slot_id, &loadout.filters);
                if options.is_empty() {
                    spawn_label(panel, "No compatible attachments", 13.0, COLOR_TEXT_DIM);
                }
                let current = loadout.equipped().get(slot_id).map(|a| a.id.as_str());
                for attachment in options {
                    spawn_option(panel, slot_id, attachment, current == Some(attachment.id.as_str()));
                }
                panel.spawn(row_node()).with_children(|row| {
                    if current.is_some() {
                        spawn_button(row, "Remove", RemoveButton(slot_id.to_string()));
                    }
                    spawn_button(row, "Close", CloseOptionsButton);
                });
            });
        }
    });
}

fn spawn_marker(
    layer: &mut ChildSpawnerCommands,
    slot: &Slot,
    equipped: Option<&Attachment>,
    color: Color,
) {
    let label = match equipped {
        Some(a) => format!("{}: {}", slot.name, a.name),
        None => slot.name.clone(),
    };
    layer
        .spawn((
            SlotMarker {
                slot_id: slot.id.clone(),
            },
            Button,
            HoverTint { base: color },
            Node {
                position_type: PositionType::Absolute,
                display: Display::None,
                height: Val::Px(MARKER_SIZE),
                min_width: Val::Px(MARKER_SIZE),
                padding: UiRect::horizontal(Val::Px(8.0)),
                align_items: AlignItems::Center,
                border_radius: BorderRadius::all(Val::Px(MARKER_SIZE / 2.0)),
                ..default()
            },
            BackgroundColor(color),
        ))
        .with_children(|m| {
            m.spawn((
                Text::new(label),
                TextFont { font_size: 12.0, ..default() },
                TextColor(COLOR_TEXT),
            ));
        });
}

fn spawn_option(panel: &mut ChildSpawnerCommands, slot_id: &str, attachment: &Attachment, current: bool) {
    let color = if current { COLOR_BTN_ACTIVE } else { COLOR_CARD };
    panel
        .spawn((
            OptionButton {
                slot_id: slot_id.to_string(),
                attachment_id: attachment.id.clone(),
            },
            Button,
            HoverTint { base: color },
            Node {
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(6.0)),
                row_gap: Val::Px(3.0),
                border_radius: BorderRadius::all(Val::Px(5.0)),
                ..default()
            },
            BackgroundColor(color),
        ))
        .with_children(|card| {
            spawn_label(card, &attachment.name, 14.0, COLOR_TEXT);
            card.spawn(row_node()).with_children(|badges| {
                spawn_label(badges, attachment.kind.display_name(), 11.0, COLOR_TEXT_DIM);
                for m in attachment.top_modifiers(2) {
                    let color = match m.stat.direction().classify(m.value, 0.0) {
                        StatChange::Better => COLOR_BETTER,
                        StatChange::Worse => COLOR_WORSE,
                        StatChange::Unchanged => COLOR_TEXT_DIM,
                    };
                    spawn_label(badges, &badge(m), 11.0, color);
                }
            });
        });
}

fn rebuild_filter_row(
    mut commands: Commands,
    loadout: Res<Loadout>,
    row: Query<(Entity, Option<&Children>), With<FilterRow>>,
    added: Query<(), Added<FilterRow>>,
) {
    if !(loadout.is_changed() || !added.is_empty()) {
        return;
    }
    let Some(row) = clear_children(&mut commands, &row) else {
        return;
    };
    commands.entity(row).with_children(|r| {
        for (category, label) in [
            (Category::Vital, "Vital parts"),
            (Category::Functional, "Functional mods"),
            (Category::Equipment, "Equipment parts"),
        ] {
            let color = if loadout.filters.allows(category) {
                COLOR_BTN_ACTIVE
            } else {
                COLOR_BTN
            };
            spawn_button_colored(r, label, FilterButton(category), color);
        }
    });
}

fn slot_ui_system(
    markers: Query<(&Interaction, &SlotMarker), Changed<Interaction>>,
    options: Query<(&Interaction, &OptionButton), Changed<Interaction>>,
    removes: Query<(&Interaction, &RemoveButton), Changed<Interaction>>,
    closes: Query<&Interaction, (Changed<Interaction>, With<CloseOptionsButton>)>,
    filters: Query<(&Interaction, &FilterButton), Changed<Interaction>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    inputs: Query<&TextInput>,
    mut commands_out: MessageWriter<BenchCommand>,
) {
    if keyboard.just_pressed(KeyCode::Escape) && !typing(&inputs) {
        commands_out.write(BenchCommand::CloseSlot);
    }
    for (interaction, marker) in &markers {
        if *interaction == Interaction::Pressed {
            commands_out.write(BenchCommand::ToggleSlot(marker.slot_id.clone()));
        }
    }
    for (interaction, option) in &options {
        if *interaction == Interaction::Pressed {
            commands_out.write(BenchCommand::Equip {
                slot_id: option.slot_id.clone(),
                attachment_id: Some(option.attachment_id.clone()),
            });
        }
    }
    for (interaction, remove) in &removes {
        if *interaction == Interaction::Pressed {
            commands_out.write(BenchCommand::Equip {
                slot_id: remove.0.clone(),
                attachment_id: None,
            });
        }
    }
    for interaction in &closes {
        if *interaction == Interaction::Pressed {
            commands_out.write(BenchCommand::CloseSlot);
        }
    }
    for (interaction, filter) in &filters {
        if *interaction == Interaction::Pressed {
            commands_out.write(BenchCommand::ToggleFilter(filter.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armory::parts::slot::SlotPosition;

    fn slot(id: &str, position: Option<SlotPosition>) -> Slot {
        Slot {
            id: id.into(),
            name: id.into(),
            position,
        }
    }

    #[test]
    fn world_points_follow_root_rotation() {
        let slots = vec![slot(
            "muzzle_1",
            Some(SlotPosition { x: 0.0, y: 0.0, z: 2.0 }),
        )];
        let root = GlobalTransform::from(Transform::from_rotation(Quat::from_rotation_y(
            std::f32::consts::FRAC_PI_2,
        )));
        let points = slot_world_points(&slots, "1", &root);
        assert!((points[0].1 - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn origin_slot_lands_on_surface_center() {
        let points = vec![("handguard_1".to_string(), Vec3::ZERO)];
        let surface = Surface {
            left: 0.0,
            top: 0.0,
            width: 800.0,
            height: 600.0,
        };
        let viewport = Viewport {
            width: 800.0,
            height: 600.0,
        };
        let anchors = compute_anchors(&points, &CameraModel::default(), &surface, &viewport);
        let a = anchors["handguard_1"];
        assert!(a.visible);
        assert!((a.x - 400.0).abs() < 1e-3 && (a.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn options_panel_flips_left_near_right_edge() {
        let viewport = Viewport {
            width: 1000.0,
            height: 800.0,
        };
        let left = options_position(&ScreenAnchor { x: 100.0, y: 300.0, visible: true }, &viewport);
        assert_eq!(left, Vec2::new(128.0, 272.0));

        let right = options_position(&ScreenAnchor { x: 900.0, y: 700.0, visible: true }, &viewport);
        assert_eq!(right.x, 900.0 - MARKER_SIZE - OPTIONS_WIDTH);
        assert_eq!(right.y, 800.0 - OPTIONS_MAX_HEIGHT);
    }
}
