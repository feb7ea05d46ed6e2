use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    expires_at: Instant,
}

/// Transient status-bar messages. Newest wins; each expires on its own.
#[derive(Debug)]
pub struct Toasts {
    lifetime: Duration,
    queue: VecDeque<Toast>,
}

impl Toasts {
    pub const MIN_LIFETIME: Duration = Duration::from_secs(3);
    pub const MAX_LIFETIME: Duration = Duration::from_secs(5);

    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime: lifetime.clamp(Self::MIN_LIFETIME, Self::MAX_LIFETIME),
            queue: VecDeque::new(),
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, ToastKind::Info, Instant::now());
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, ToastKind::Success, Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, ToastKind::Error, Instant::now());
    }

    pub fn push(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) {
        let message = message.into();
        tracing::debug!(%message, ?kind, "toast");
        self.queue.push_back(Toast {
            message,
            kind,
            expires_at: now + self.lifetime,
        });
    }

    pub fn prune(&mut self, now: Instant) {
        self.queue.retain(|t| t.expires_at > now);
    }

    pub fn current(&self) -> Option<&Toast> {
        self.queue.back()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(Duration::from_secs(4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_toast_is_current() {
        let mut toasts = Toasts::default();
        let now = Instant::now();
        toasts.push("first", ToastKind::Info, now);
        toasts.push("second", ToastKind::Error, now);

        let current = toasts.current().unwrap();
        assert_eq!(current.message, "second");
        assert_eq!(current.kind, ToastKind::Error);
    }

    #[test]
    fn toasts_expire_after_lifetime() {
        let mut toasts = Toasts::new(Duration::from_secs(4));
        let now = Instant::now();
        toasts.push("old", ToastKind::Success, now);
        toasts.push("new", ToastKind::Success, now + Duration::from_secs(2));

        toasts.prune(now + Duration::from_secs(3));
        assert_eq!(toasts.len(), 2);

        toasts.prune(now + Duration::from_secs(4));
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts.current().unwrap().message, "new");

        toasts.prune(now + Duration::from_secs(6));
        assert!(toasts.current().is_none());
    }

    #[test]
    fn lifetime_is_clamped() {
        let mut toasts = Toasts::new(Duration::from_secs(60));
        let now = Instant::now();
        toasts.push("x", ToastKind::Info, now);
        toasts.prune(now + Toasts::MAX_LIFETIME);
        assert!(toasts.current().is_none());

        let mut toasts = Toasts::new(Duration::ZERO);
        toasts.push("y", ToastKind::Info, now);
        toasts.prune(now + Duration::from_millis(2999));
        assert_eq!(toasts.len(), 1);
    }
}
