use bevy::prelude::*;

use super::parts::attachment::Category;

/// User intents applied to the `Loadout` by the bench controller.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum BenchCommand {
    SelectWeapon(String),
    Equip {
        slot_id: String,
        /// `None` clears the slot.
        attachment_id: Option<String>,
    },
    ToggleSlot(String),
    CloseSlot,
    ToggleFilter(Category),
    ApplyPreset(String),
    LoadConfig(String),
    SaveConfig {
        name: String,
        prefer_local: bool,
    },
    DeleteConfig(String),
    /// Saved configuration to compare the live stats against, `None` to close.
    CompareWith(Option<String>),
}

/// Camera control buttons.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCommand {
    RotateLeft,
    RotateRight,
    ZoomIn,
    ZoomOut,
    Reset,
    ToggleAutoRotate,
}
