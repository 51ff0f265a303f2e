/// Result of a data-access call that never hard-fails: either what was asked for,
/// or a fallback value plus the reason the primary source was not used.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Fresh(T),
    Degraded { value: T, reason: String },
}

impl<T> Fetched<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Fetched::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Fetched::Fresh(v) | Fetched::Degraded { value: v, .. } => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Fetched::Fresh(v) | Fetched::Degraded { value: v, .. } => v,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Fetched::Fresh(_) => None,
            Fetched::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_keeps_value_and_reason() {
        let f = Fetched::degraded(vec![1, 2], "offline");
        assert_eq!(f.value(), &vec![1, 2]);
        assert_eq!(f.reason(), Some("offline"));
        assert!(f.is_degraded());
        assert!(!Fetched::Fresh(1).is_degraded());
    }
}
