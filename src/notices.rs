use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn color(self) -> Color {
        match self {
            Self::Success => Color::srgb(0.18, 0.55, 0.3),
            Self::Info => Color::srgb(0.2, 0.4, 0.65),
            Self::Warning => Color::srgb(0.75, 0.55, 0.1),
            Self::Error => Color::srgb(0.7, 0.2, 0.2),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub message: String,
    pub level: NoticeLevel,
    /// Seconds left before it disappears.
    pub remaining: f32,
}

/// Toast queue, oldest first.
#[derive(Resource, Debug, Default)]
pub struct Notices {
    items: Vec<Notice>,
    next_id: u64,
    ttl: f32,
}

impl Notices {
    pub fn new(ttl: f32) -> Self {
        Self {
            ttl,
            ..default()
        }
    }

    pub fn set_ttl(&mut self, ttl: f32) {
        self.ttl = ttl;
    }

    pub fn push(&mut self, message: impl Into<String>, level: NoticeLevel) -> u64 {
        self.next_id += 1;
        self.items.push(Notice {
            id: self.next_id,
            message: message.into(),
            level,
            remaining: self.ttl,
        });
        self.next_id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(message, NoticeLevel::Success)
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(message, NoticeLevel::Info)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> u64 {
        self.push(message, NoticeLevel::Warning)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(message, NoticeLevel::Error)
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Age every notice by `dt` seconds and drop the expired ones. Returns true if
    /// anything was removed.
    pub fn tick(&mut self, dt: f32) -> bool {
        let before = self.items.len();
        for n in &mut self.items {
            n.remaining -= dt;
        }
        self.items.retain(|n| n.remaining > 0.0);
        self.items.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_expire_after_ttl() {
        let mut notices = Notices::new(5.0);
        notices.info("AK-74M selected");
        assert!(!notices.tick(4.0));
        notices.success("Suppressor equipped");
        assert!(notices.tick(1.5));
        let left: Vec<_> = notices.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(left, vec!["Suppressor equipped"]);
        notices.tick(4.0);
        assert_eq!(notices.iter().count(), 0);
    }

    #[test]
    fn dismiss_by_id() {
        let mut notices = Notices::new(5.0);
        let a = notices.warning("remote store unavailable");
        let b = notices.error("Error loading 3D model");
        assert_ne!(a, b);
        assert!(notices.dismiss(a));
        assert!(!notices.dismiss(a));
        assert_eq!(notices.iter().count(), 1);
        assert_eq!(notices.iter().next().unwrap().level, NoticeLevel::Error);
    }
}
