//! Single-slot transient error banner.
//!
//! The newest message always replaces the previous one and disappears once
//! `ttl` has elapsed. Expiry is evaluated on read so no timer task is needed.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct ErrorBanner {
    ttl: Duration,
    slot: Option<(String, Instant)>,
}

impl ErrorBanner {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: None }
    }

    pub fn raise(&mut self, message: impl Into<String>) {
        self.slot = Some((message.into(), Instant::now()));
    }

    pub fn dismiss(&mut self) {
        self.slot = None;
    }

    /// The message, if one was raised less than `ttl` ago.
    pub fn current(&self) -> Option<&str> {
        let (message, raised_at) = self.slot.as_ref()?;
        (raised_at.elapsed() < self.ttl).then_some(message.as_str())
    }
}
