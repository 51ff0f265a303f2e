pub mod attachment;
pub mod compat;
pub mod equipped;
pub mod presets;
pub mod registry;
pub mod slot;
pub mod weapon;
