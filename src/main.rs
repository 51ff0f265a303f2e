mod armory;
mod assets_map;
mod config;
mod notices;
mod plugins;
mod storage;

use bevy::asset::io::AssetSourceBuilder;
use bevy::prelude::*;

use assets_map::OBJECTS_SOURCE;
use config::settings::Settings;
use plugins::{
    admin_plugin::AdminPlugin, bench_plugin::BenchPlugin, export_plugin::ExportPlugin,
    notice_plugin::NoticePlugin, saved_plugin::SavedPlugin, slot_ui_plugin::SlotUiPlugin,
    stats_plugin::StatsPlugin, storage_plugin::StoragePlugin, viewer_plugin::ViewerPlugin,
    widgets::WidgetsPlugin,
};

fn main() {
    let settings = Settings::load_or_default();
    let objects_dir = settings.objects_path().to_string_lossy().into_owned();

    App::new()
        // Uploaded models are served from the data directory, not the bundled assets.
        .register_asset_source(
            OBJECTS_SOURCE,
            AssetSourceBuilder::platform_default(&objects_dir, None),
        )
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Gunsmith Bench".into(),
                resolution: (settings.window_width, settings.window_height).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(settings)
        .add_plugins(WidgetsPlugin)
        .add_plugins(NoticePlugin)
        .add_plugins(StoragePlugin)
        .add_plugins(BenchPlugin)
        .add_plugins(ViewerPlugin)
        .add_plugins(SlotUiPlugin)
        .add_plugins(StatsPlugin)
        .add_plugins(SavedPlugin)
        .add_plugins(ExportPlugin)
        .add_plugins(AdminPlugin)
        .run();
}
