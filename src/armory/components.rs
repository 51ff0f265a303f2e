use bevy::prelude::*;

// ── Marker components ───────────────────────────────────────────────

#[derive(Component)]
pub struct BenchCamera;

/// Parent of everything drawn for the selected weapon. Auto-rotate spins it.
#[derive(Component)]
pub struct WeaponRoot;

/// The loaded scene or the placeholder body under `WeaponRoot`.
#[derive(Component)]
pub struct WeaponBody;

#[derive(Component)]
pub struct AttachmentPlaceholder {
    pub slot_id: String,
}

// ── Bench phase state ───────────────────────────────────────────────

#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BenchPhase {
    #[default]
    Bench,
    Admin,
}
