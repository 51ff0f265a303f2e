use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

// ── Slot kind ───────────────────────────────────────────────────────

/// Slot type, parsed from the id prefix (`<type>_<weaponId>[_suffix]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Barrel,
    Muzzle,
    Stock,
    Grip,
    Sight,
    Underbarrel,
    Handguard,
    Magazine,
    Mount,
    Receiver,
    Bolt,
    Gasblock,
    Other,
}

impl SlotKind {
    pub fn from_slot_id(slot_id: &str) -> Self {
        let prefix = slot_id.split('_').next().unwrap_or_default();
        match prefix {
            "barrel" => Self::Barrel,
            "muzzle" => Self::Muzzle,
            "stock" => Self::Stock,
            "grip" => Self::Grip,
            "sight" => Self::Sight,
            "underbarrel" => Self::Underbarrel,
            "handguard" => Self::Handguard,
            "magazine" => Self::Magazine,
            "mount" => Self::Mount,
            "receiver" => Self::Receiver,
            "bolt" => Self::Bolt,
            "gasblock" => Self::Gasblock,
            _ => Self::Other,
        }
    }

    /// Screen-space nudge (px) applied to the floating label so it clears the model.
    pub fn pixel_offset(self) -> (f32, f32) {
        match self {
            Self::Barrel => (120.0, 0.0),
            Self::Muzzle => (160.0, 0.0),
            Self::Stock => (-120.0, 0.0),
            Self::Grip => (0.0, 40.0),
            Self::Sight => (0.0, -40.0),
            Self::Underbarrel => (0.0, 30.0),
            Self::Mount => (0.0, -30.0),
            Self::Magazine => (0.0, 50.0),
            Self::Receiver => (0.0, -20.0),
            Self::Handguard | Self::Bolt | Self::Gasblock | Self::Other => (0.0, 0.0),
        }
    }

    /// Reference attachment point on the bundled placeholder models.
    pub fn default_position(self, weapon_id: &str) -> Vec3 {
        let p = match (weapon_id, self) {
            ("2", Self::Barrel) => [0.0, 0.0, 1.7],
            ("2", Self::Muzzle) => [0.0, 0.0, 2.0],
            ("2", Self::Stock) => [0.0, 0.0, -1.4],
            ("2", Self::Grip) => [0.0, -0.3, -0.25],
            ("2", Self::Sight) => [0.0, 0.18, 0.2],
            ("2", Self::Underbarrel) => [0.0, -0.2, 0.7],
            ("2", Self::Handguard) => [0.0, 0.0, 0.6],
            ("2", Self::Magazine) => [0.0, -0.45, 0.15],
            ("2", Self::Mount) => [0.0, 0.2, 0.5],
            ("2", Self::Receiver) => [0.0, 0.05, -0.2],
            ("2", Self::Gasblock) => [0.0, 0.1, 0.9],
            ("3", Self::Barrel) => [0.0, 0.0, 1.75],
            ("3", Self::Muzzle) => [0.0, 0.0, 2.05],
            ("3", Self::Stock) => [0.0, 0.0, -1.45],
            ("3", Self::Grip) => [0.0, -0.33, -0.28],
            ("3", Self::Sight) => [0.0, 0.16, 0.25],
            ("3", Self::Underbarrel) => [0.0, -0.18, 0.75],
            ("3", Self::Handguard) => [0.0, 0.0, 0.65],
            ("3", Self::Magazine) => [0.0, -0.48, 0.18],
            ("3", Self::Mount) => [0.0, 0.17, 0.55],
            ("3", Self::Receiver) => [0.0, 0.06, -0.25],
            ("3", Self::Bolt) => [0.15, 0.0, -0.2],
            (_, Self::Barrel) => [0.0, 0.0, 1.8],
            (_, Self::Muzzle) => [0.0, 0.0, 2.1],
            (_, Self::Stock) => [0.0, 0.0, -1.5],
            (_, Self::Grip) => [0.0, -0.35, -0.3],
            (_, Self::Sight) => [0.0, 0.15, 0.3],
            (_, Self::Underbarrel) => [0.0, -0.15, 0.8],
            (_, Self::Handguard) => [0.0, 0.0, 0.7],
            (_, Self::Magazine) => [0.0, -0.5, 0.2],
            (_, Self::Mount) => [0.0, 0.15, 0.6],
            (_, Self::Receiver) => [0.0, 0.05, -0.3],
            _ => [0.0, 0.0, 0.0],
        };
        Vec3::from_array(p)
    }
}

// ── Slot ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<SlotPosition> for Vec3 {
    fn from(p: SlotPosition) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Named attachment point on a weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<SlotPosition>,
}

impl Slot {
    pub fn kind(&self) -> SlotKind {
        SlotKind::from_slot_id(&self.id)
    }

    /// Weapon id segment of the slot id, if the id follows the naming convention.
    pub fn weapon_id(&self) -> Option<&str> {
        weapon_of_slot(&self.id)
    }

    /// Stored position, or the placeholder reference point for this slot type.
    pub fn position_for(&self, weapon_id: &str) -> Vec3 {
        self.position
            .map(Vec3::from)
            .unwrap_or_else(|| self.kind().default_position(weapon_id))
    }

    /// Admin edit of one coordinate. Malformed input leaves the slot untouched.
    pub fn set_axis(&mut self, axis: Axis, raw: &str) -> bool {
        let Some(v) = parse_numeric_input(raw) else {
            return false;
        };
        let pos = self.position.get_or_insert_with(SlotPosition::default);
        match axis {
            Axis::X => pos.x = v,
            Axis::Y => pos.y = v,
            Axis::Z => pos.z = v,
        }
        true
    }
}

pub fn weapon_of_slot(slot_id: &str) -> Option<&str> {
    slot_id.split('_').nth(1).filter(|s| !s.is_empty())
}

/// Parse a numeric form field. `None` for empty, malformed, or non-finite input.
pub fn parse_numeric_input(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_comes_from_prefix() {
        assert_eq!(SlotKind::from_slot_id("barrel_1"), SlotKind::Barrel);
        assert_eq!(SlotKind::from_slot_id("sight_2_rear"), SlotKind::Sight);
        assert_eq!(SlotKind::from_slot_id("laser_1"), SlotKind::Other);
        assert_eq!(SlotKind::Other.pixel_offset(), (0.0, 0.0));
    }

    #[test]
    fn weapon_id_is_second_segment() {
        assert_eq!(weapon_of_slot("barrel_1"), Some("1"));
        assert_eq!(weapon_of_slot("sight_12_rear"), Some("12"));
        assert_eq!(weapon_of_slot("barrel"), None);
    }

    #[test]
    fn missing_position_falls_back_to_reference_point() {
        let slot = Slot {
            id: "muzzle_2".into(),
            name: "Muzzle".into(),
            position: None,
        };
        assert_eq!(slot.position_for("2"), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(slot.position_for("9"), Vec3::new(0.0, 0.0, 2.1));
    }

    #[test]
    fn malformed_axis_input_is_ignored() {
        let mut slot = Slot {
            id: "grip_1".into(),
            name: "Pistol Grip".into(),
            position: Some(SlotPosition { x: 0.0, y: -0.35, z: -0.3 }),
        };
        assert!(!slot.set_axis(Axis::Y, "abc"));
        assert!(!slot.set_axis(Axis::Y, ""));
        assert!(!slot.set_axis(Axis::Y, "NaN"));
        assert_eq!(slot.position.unwrap().y, -0.35);
        assert!(slot.set_axis(Axis::Y, " -0.4 "));
        assert_eq!(slot.position.unwrap().y, -0.4);
    }
}
