use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::attachment::Attachment;

/// Slot id → attachment (or empty), kept in insertion order.
///
/// Re-equipping a slot that is already present keeps its original position, so the
/// aggregation order only changes when a new slot is first touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquippedAttachments {
    entries: Vec<(String, Option<Attachment>)>,
}

impl EquippedAttachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `attachment` (or nothing) in `slot_id`. Returns what was there before.
    pub fn set(&mut self, slot_id: String, attachment: Option<Attachment>) -> Option<Attachment> {
        match self.entries.iter_mut().find(|(s, _)| *s == slot_id) {
            Some((_, current)) => std::mem::replace(current, attachment),
            None => {
                self.entries.push((slot_id, attachment));
                None
            }
        }
    }

    pub fn get(&self, slot_id: &str) -> Option<&Attachment> {
        self.entries
            .iter()
            .find(|(s, _)| s == slot_id)
            .and_then(|(_, a)| a.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Attachment>)> {
        self.entries.iter().map(|(s, a)| (s.as_str(), a.as_ref()))
    }

    /// Occupied slots only, in insertion order.
    pub fn occupied(&self) -> impl Iterator<Item = (&str, &Attachment)> {
        self.entries
            .iter()
            .filter_map(|(s, a)| a.as_ref().map(|a| (s.as_str(), a)))
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied().count()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied_count() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl FromIterator<(String, Option<Attachment>)> for EquippedAttachments {
    fn from_iter<I: IntoIterator<Item = (String, Option<Attachment>)>>(iter: I) -> Self {
        let mut equipped = Self::new();
        for (slot, attachment) in iter {
            equipped.set(slot, attachment);
        }
        equipped
    }
}

impl Serialize for EquippedAttachments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (slot, attachment) in self.iter() {
            map.serialize_entry(slot, &attachment)?;
        }
        map.end()
    }
}

struct EntriesVisitor;

impl<'de> Visitor<'de> for EntriesVisitor {
    type Value = EquippedAttachments;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of slot ids to attachments")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut equipped = EquippedAttachments::new();
        while let Some((slot, attachment)) = access.next_entry::<String, Option<Attachment>>()? {
            equipped.set(slot, attachment);
        }
        Ok(equipped)
    }
}

impl<'de> Deserialize<'de> for EquippedAttachments {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor)
    }
}
