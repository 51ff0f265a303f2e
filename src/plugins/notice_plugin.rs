use bevy::prelude::*;

use crate::config::settings::Settings;
use crate::notices::Notices;

use super::widgets::*;

#[derive(Component)]
struct NoticeStack;

#[derive(Component)]
struct NoticeToast(u64);

pub struct NoticePlugin;

impl Plugin for NoticePlugin {
    fn build(&self, app: &mut App) {
        let ttl = app
            .world()
            .get_resource::<Settings>()
            .map_or(Settings::default().notice_ttl_secs, |s| s.notice_ttl_secs);
        app.insert_resource(Notices::new(ttl))
            .add_systems(Startup, spawn_notice_stack)
            .add_systems(Update, (tick_notices, dismiss_system, rebuild_notice_stack).chain());
    }
}

fn spawn_notice_stack(mut commands: Commands) {
    commands.spawn((
        NoticeStack,
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            right: Val::Px(350.0),
            width: Val::Px(320.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(6.0),
            ..default()
        },
        GlobalZIndex(2),
        Pickable::IGNORE,
    ));
}

fn tick_notices(time: Res<Time>, mut notices: ResMut<Notices>) {
    // Remaining time changes every frame; only expiry should trigger a rebuild.
    if notices.bypass_change_detection().tick(time.delta_secs()) {
        notices.set_changed();
    }
}

fn dismiss_system(
    q: Query<(&Interaction, &NoticeToast), Changed<Interaction>>,
    mut notices: ResMut<Notices>,
) {
    for (interaction, toast) in &q {
        if *interaction == Interaction::Pressed {
            notices.dismiss(toast.0);
        }
    }
}

fn rebuild_notice_stack(
    mut commands: Commands,
    notices: Res<Notices>,
    stack: Query<(Entity, Option<&Children>), With<NoticeStack>>,
) {
    if !notices.is_changed() {
        return;
    }
    let Some(stack) = clear_children(&mut commands, &stack) else {
        return;
    };
    commands.entity(stack).with_children(|s| {
        for notice in notices.iter() {
            s.spawn((
                NoticeToast(notice.id),
                Button,
                Node {
                    padding: UiRect::axes(Val::Px(12.0), Val::Px(8.0)),
                    border_radius: BorderRadius::all(Val::Px(6.0)),
                    ..default()
                },
                BackgroundColor(notice.level.color()),
            ))
            .with_children(|toast| {
                spawn_label(toast, &notice.message, 14.0, COLOR_TEXT);
            });
        }
    });
}
