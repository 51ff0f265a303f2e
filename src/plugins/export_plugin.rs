use std::path::PathBuf;

use bevy::prelude::*;
use bevy::render::view::screenshot::{Screenshot, save_to_disk};
use chrono::Utc;

use crate::armory::components::BenchPhase;
use crate::armory::loadout::Loadout;
use crate::config::settings::Settings;
use crate::notices::Notices;
use crate::storage::export::{ExportDocument, png_file_name, write_json};

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportButton {
    Png,
    Json,
}

pub struct ExportPlugin;

impl Plugin for ExportPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, export_system.run_if(in_state(BenchPhase::Bench)));
    }
}

/// Ask for the export directory, starting at the configured one.
fn pick_export_dir(settings: &Settings) -> Option<PathBuf> {
    let default_dir = settings.export_path();
    if let Err(e) = std::fs::create_dir_all(&default_dir) {
        warn!("Failed to create export directory {}: {e}", default_dir.display());
    }
    rfd::FileDialog::new()
        .set_title("Export configuration")
        .set_directory(&default_dir)
        .pick_folder()
}

fn export_system(
    mut commands: Commands,
    q: Query<(&Interaction, &ExportButton), Changed<Interaction>>,
    loadout: Res<Loadout>,
    settings: Res<Settings>,
    mut notices: ResMut<Notices>,
) {
    for (interaction, button) in &q {
        if *interaction != Interaction::Pressed {
            continue;
        }
        let (Some(weapon), Some(derived)) = (loadout.weapon(), loadout.derived()) else {
            notices.warning("Select a weapon first");
            continue;
        };
        let Some(dir) = pick_export_dir(&settings) else {
            continue;
        };

        match button {
            ExportButton::Png => {
                let path = dir.join(png_file_name(weapon));
                info!("Saving screenshot to {}", path.display());
                commands
                    .spawn(Screenshot::primary_window())
                    .observe(save_to_disk(path.clone()));
                notices.success(format!("Screenshot saved to {}", path.display()));
            }
            ExportButton::Json => {
                let doc = ExportDocument::new(weapon, loadout.equipped(), derived, Utc::now());
                match write_json(&dir, weapon, &doc) {
                    Ok(path) => {
                        info!("Exported configuration to {}", path.display());
                        notices.success(format!("Configuration exported to {}", path.display()));
                    }
                    Err(e) => {
                        warn!("Export failed: {e}");
                        notices.error(format!("Export failed: {e}"));
                    }
                }
            }
        }
    }
}
