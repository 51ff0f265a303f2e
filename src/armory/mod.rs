pub mod components;
pub mod events;
pub mod loadout;
pub mod parts;
pub mod projection;
pub mod stats;
