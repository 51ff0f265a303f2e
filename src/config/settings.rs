use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::armory::projection::CameraModel;

/// User-editable settings, loaded from settings.ron.
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window_width: u32,
    pub window_height: u32,
    pub camera_position: [f32; 3],
    /// Vertical field of view in degrees.
    pub camera_fov: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Radians per second while auto-rotate is on.
    pub auto_rotate_speed: f32,
    /// Fallback marker refresh when no camera or window change was seen.
    pub marker_poll_interval_secs: f32,
    pub notice_ttl_secs: f32,
    pub remote_enabled: bool,
    pub remote_db_file: String,
    pub local_store_file: String,
    pub objects_dir: String,
    /// Empty means `<data dir>/exports`.
    pub export_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_width: 1400,
            window_height: 900,
            camera_position: [0.0, 0.0, 5.0],
            camera_fov: 45.0,
            camera_near: 0.1,
            camera_far: 1000.0,
            min_zoom: 2.0,
            max_zoom: 10.0,
            auto_rotate_speed: 0.5,
            marker_poll_interval_secs: 0.1,
            notice_ttl_secs: 5.0,
            remote_enabled: true,
            remote_db_file: "gunsmith_bench.db".into(),
            local_store_file: "saved_configs.json".into(),
            objects_dir: "objects".into(),
            export_dir: String::new(),
        }
    }
}

impl Settings {
    /// Get the data directory for settings and stores.
    pub fn data_dir() -> PathBuf {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("gunsmith_bench")
    }

    /// Path to the settings file.
    pub fn file_path() -> PathBuf {
        Self::data_dir().join("settings.ron")
    }

    pub fn remote_db_path(&self) -> PathBuf {
        Self::data_dir().join(&self.remote_db_file)
    }

    pub fn local_store_path(&self) -> PathBuf {
        Self::data_dir().join(&self.local_store_file)
    }

    pub fn objects_path(&self) -> PathBuf {
        Self::data_dir().join(&self.objects_dir)
    }

    pub fn export_path(&self) -> PathBuf {
        if self.export_dir.is_empty() {
            Self::data_dir().join("exports")
        } else {
            PathBuf::from(&self.export_dir)
        }
    }

    pub fn camera(&self) -> CameraModel {
        CameraModel {
            position: Vec3::from_array(self.camera_position),
            fov_y: self.camera_fov,
            near: self.camera_near,
            far: self.camera_far,
            ..default()
        }
    }

    pub fn clamp_zoom(&self, distance: f32) -> f32 {
        distance.clamp(self.min_zoom, self.max_zoom)
    }

    /// Load from file, or create default if not found.
    pub fn load_or_default() -> Self {
        let path = Self::file_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(settings) => return settings,
                    Err(e) => {
                        warn!("Failed to parse settings.ron: {e}, using defaults");
                        return Self::default();
                    }
                },
                Err(e) => {
                    warn!("Failed to read settings.ron: {e}, using defaults");
                    return Self::default();
                }
            }
        }
        let settings = Self::default();
        settings.save();
        settings
    }

    pub fn parse(contents: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(contents)
    }

    /// Save current settings to file.
    pub fn save(&self) {
        let path = Self::file_path();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let pretty = ron::ser::PrettyConfig::default();
        match ron::ser::to_string_pretty(self, pretty) {
            Ok(s) => {
                if let Err(e) = std::fs::write(&path, s) {
                    warn!("Failed to write settings.ron: {e}");
                }
            }
            Err(e) => {
                warn!("Failed to serialize settings: {e}");
            }
        }
    }

    /// Reload from file (F5).
    pub fn reload(&mut self) {
        *self = Self::load_or_default();
        info!("Settings reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let s = Settings::parse("(camera_fov: 60.0, remote_enabled: false)").unwrap();
        assert_eq!(s.camera_fov, 60.0);
        assert!(!s.remote_enabled);
        assert_eq!(s.notice_ttl_secs, 5.0);
        assert_eq!(s.marker_poll_interval_secs, 0.1);
    }

    #[test]
    fn pretty_output_parses_back() {
        let text =
            ron::ser::to_string_pretty(&Settings::default(), ron::ser::PrettyConfig::default())
                .unwrap();
        let back = Settings::parse(&text).unwrap();
        assert_eq!(back.window_width, 1400);
        assert_eq!(back.local_store_file, "saved_configs.json");
    }

    #[test]
    fn zoom_is_clamped() {
        let s = Settings::default();
        assert_eq!(s.clamp_zoom(1.0), 2.0);
        assert_eq!(s.clamp_zoom(12.0), 10.0);
        assert_eq!(s.clamp_zoom(4.0), 4.0);
    }

    #[test]
    fn camera_matches_defaults() {
        assert_eq!(Settings::default().camera(), CameraModel::default());
    }

    #[test]
    fn blank_export_dir_uses_data_dir() {
        let s = Settings::default();
        assert!(s.export_path().ends_with("exports"));
        let custom = Settings {
            export_dir: "/tmp/out".into(),
            ..Settings::default()
        };
        assert_eq!(custom.export_path(), PathBuf::from("/tmp/out"));
    }
}
