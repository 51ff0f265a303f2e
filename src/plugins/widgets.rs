use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::picking::hover::HoverMap;
use bevy::prelude::*;

// ── Colors ──────────────────────────────────────────────────────────

pub const COLOR_PANEL: Color = Color::srgba(0.08, 0.08, 0.12, 0.92);
pub const COLOR_BTN: Color = Color::srgba(0.18, 0.20, 0.28, 1.0);
pub const COLOR_BTN_HOVER: Color = Color::srgba(0.28, 0.32, 0.42, 1.0);
pub const COLOR_BTN_ACTIVE: Color = Color::srgba(0.15, 0.35, 0.60, 1.0);
pub const COLOR_TEXT: Color = Color::WHITE;
pub const COLOR_TEXT_DIM: Color = Color::srgba(0.55, 0.55, 0.6, 1.0);
pub const COLOR_ACCENT: Color = Color::srgba(0.2, 0.7, 1.0, 1.0);
pub const COLOR_CARD: Color = Color::srgba(0.12, 0.14, 0.20, 1.0);
pub const COLOR_BETTER: Color = Color::srgb(0.3, 0.85, 0.4);
pub const COLOR_WORSE: Color = Color::srgb(0.95, 0.35, 0.3);
pub const COLOR_BAR_BG: Color = Color::srgba(0.2, 0.2, 0.26, 1.0);
pub const COLOR_INPUT_BG: Color = Color::srgba(0.10, 0.10, 0.16, 1.0);
pub const COLOR_INPUT_FOCUS: Color = Color::srgba(0.15, 0.15, 0.25, 1.0);

pub struct WidgetsPlugin;

impl Plugin for WidgetsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (ui_scroll_system, text_input_system, button_hover_system));
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

pub fn despawn<T: Component>(mut commands: Commands, query: Query<Entity, With<T>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

/// Despawn every child of the container tagged `T`, leaving the container.
pub fn clear_children<T: Component>(
    commands: &mut Commands,
    containers: &Query<(Entity, Option<&Children>), With<T>>,
) -> Option<Entity> {
    let (entity, children) = containers.iter().next()?;
    if let Some(children) = children {
        for child in children.iter() {
            commands.entity(child).despawn();
        }
    }
    Some(entity)
}

/// Buttons with this marker get the hover tint from `button_hover_system`.
#[derive(Component)]
pub struct HoverTint {
    pub base: Color,
}

pub fn spawn_title(parent: &mut ChildSpawnerCommands, title: &str) {
    parent.spawn((
        Text::new(title),
        TextFont { font_size: 18.0, ..default() },
        TextColor(COLOR_ACCENT),
        Node { margin: UiRect::vertical(Val::Px(6.0)), ..default() },
    ));
}

pub fn spawn_label(parent: &mut ChildSpawnerCommands, text: &str, size: f32, color: Color) {
    parent.spawn((
        Text::new(text),
        TextFont { font_size: size, ..default() },
        TextColor(color),
    ));
}

pub fn spawn_button<C: Component>(parent: &mut ChildSpawnerCommands, label: &str, marker: C) {
    spawn_button_colored(parent, label, marker, COLOR_BTN);
}

pub fn spawn_button_colored<C: Component>(
    parent: &mut ChildSpawnerCommands,
    label: &str,
    marker: C,
    color: Color,
) {
    parent.spawn((
        marker,
        Button,
        HoverTint { base: color },
        Node {
            min_height: Val::Px(30.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            padding: UiRect::axes(Val::Px(10.0), Val::Px(4.0)),
            border_radius: BorderRadius::all(Val::Px(5.0)),
            ..default()
        },
        BackgroundColor(color),
    )).with_children(|btn| {
        btn.spawn((
            Text::new(label),
            TextFont { font_size: 14.0, ..default() },
            TextColor(COLOR_TEXT),
        ));
    });
}

pub fn panel_node(width: f32) -> Node {
    Node {
        width: Val::Px(width),
        flex_direction: FlexDirection::Column,
        padding: UiRect::all(Val::Px(10.0)),
        row_gap: Val::Px(6.0),
        border_radius: BorderRadius::all(Val::Px(8.0)),
        ..default()
    }
}

pub fn row_node() -> Node {
    Node {
        flex_direction: FlexDirection::Row,
        flex_wrap: FlexWrap::Wrap,
        align_items: AlignItems::Center,
        column_gap: Val::Px(6.0),
        row_gap: Val::Px(4.0),
        ..default()
    }
}

fn button_hover_system(
    mut q: Query<(&Interaction, &HoverTint, &mut BackgroundColor), Changed<Interaction>>,
) {
    for (interaction, tint, mut bg) in &mut q {
        *bg = match interaction {
            Interaction::Hovered => BackgroundColor(COLOR_BTN_HOVER),
            _ => BackgroundColor(tint.base),
        };
    }
}

// ── UI Scroll ───────────────────────────────────────────────────────

const SCROLL_LINE_HEIGHT: f32 = 21.0;

fn ui_scroll_system(
    mut mouse_wheel: MessageReader<MouseWheel>,
    hover_map: Res<HoverMap>,
    mut scroll_q: Query<&mut ScrollPosition>,
) {
    for ev in mouse_wheel.read() {
        let mut dy = -ev.y;
        if ev.unit == MouseScrollUnit::Line {
            dy *= SCROLL_LINE_HEIGHT;
        }

        for pointer_map in hover_map.values() {
            for &entity in pointer_map.keys() {
                if let Ok(mut scroll) = scroll_q.get_mut(entity) {
                    scroll.y = (scroll.y + dy).max(0.0);
                }
            }
        }
    }
}

/// True while any UI node is under the pointer, so 3D controls can ignore the wheel.
pub fn pointer_over_ui(hover_map: &HoverMap, nodes: &Query<(), With<Node>>) -> bool {
    hover_map
        .values()
        .any(|pointer_map| pointer_map.keys().any(|&e| nodes.contains(e)))
}

// ── Text Input Widget ───────────────────────────────────────────────

#[derive(Component)]
pub struct TextInput {
    pub value: String,
    pub focused: bool,
    pub field_key: String,
}

#[derive(Component)]
pub struct TextInputDisplay;

fn text_input_system(
    mut inputs: Query<(&Interaction, &mut TextInput, &mut BackgroundColor, &Children)>,
    mut displays: Query<&mut Text, With<TextInputDisplay>>,
    mut keyboard_events: MessageReader<KeyboardInput>,
) {
    for (interaction, mut input, _, _) in &mut inputs {
        if *interaction == Interaction::Pressed {
            input.focused = true;
        }
    }

    let events: Vec<_> = keyboard_events.read().cloned().collect();

    for (_interaction, mut input, mut bg, children) in &mut inputs {
        if !input.focused {
            *bg = BackgroundColor(COLOR_INPUT_BG);
            continue;
        }
        *bg = BackgroundColor(COLOR_INPUT_FOCUS);

        for event in &events {
            if !event.state.is_pressed() {
                continue;
            }
            match &event.logical_key {
                Key::Backspace => {
                    input.value.pop();
                }
                Key::Escape | Key::Enter => {
                    input.focused = false;
                }
                Key::Space => input.value.push(' '),
                Key::Character(c) => {
                    input.value.push_str(c.as_str());
                }
                _ => {}
            }
        }

        for child in children.iter() {
            if let Ok(mut text) = displays.get_mut(child) {
                **text = if input.value.is_empty() {
                    "...".into()
                } else {
                    input.value.clone()
                };
            }
        }
    }

    // Unfocus all others when one is clicked
    let any_clicked = inputs.iter().any(|(i, _, _, _)| *i == Interaction::Pressed);
    if any_clicked {
        for (interaction, mut input, _, _) in &mut inputs {
            if *interaction != Interaction::Pressed {
                input.focused = false;
            }
        }
    }
}

pub fn spawn_text_input<C: Component>(
    parent: &mut ChildSpawnerCommands,
    field_key: &str,
    value: &str,
    width: f32,
    marker: C,
) {
    parent.spawn((
        marker,
        TextInput {
            value: value.into(),
            focused: false,
            field_key: field_key.into(),
        },
        Button,
        Node {
            width: Val::Px(width),
            height: Val::Px(28.0),
            justify_content: JustifyContent::FlexStart,
            align_items: AlignItems::Center,
            padding: UiRect::horizontal(Val::Px(6.0)),
            border_radius: BorderRadius::all(Val::Px(4.0)),
            ..default()
        },
        BackgroundColor(COLOR_INPUT_BG),
    )).with_children(|input| {
        input.spawn((
            TextInputDisplay,
            Text::new(if value.is_empty() { "..." } else { value }),
            TextFont { font_size: 14.0, ..default() },
            TextColor(COLOR_TEXT),
        ));
    });
}

pub fn read_field<F: bevy::ecs::query::QueryFilter>(inputs: &Query<&TextInput, F>, key: &str) -> String {
    for input in inputs.iter() {
        if input.field_key == key {
            return input.value.clone();
        }
    }
    String::new()
}

/// Any text field has keyboard focus, so global shortcuts should stand down.
pub fn typing(inputs: &Query<&TextInput>) -> bool {
    inputs.iter().any(|i| i.focused)
}
