//! Transient user-visible notifications.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::traits::{Clock, Notifier};

pub const ERROR_TITLE: &str = "Error";

/// Report a failed fetch cycle to the user. Delivery failures are only logged.
pub fn notify_error(notifier: &dyn Notifier, message: &str) {
    if let Err(e) = notifier.notify(ERROR_TITLE, message) {
        tracing::warn!("Failed to deliver error notification: {}", e);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// `None` means the toast stays until dismissed.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Toast {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| now >= t)
    }
}

/// Stack of toasts shown by the front-end.
///
/// Toasts stack in arrival order with no deduplication. Each one expires
/// after the configured TTL or can be dismissed by id.
#[derive(Clone)]
pub struct ToastBoard {
    clock: Arc<dyn Clock>,
    ttl: Option<Duration>,
    next_id: Arc<AtomicU64>,
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl ToastBoard {
    /// A `ttl_secs` of zero, or one too large to represent, keeps toasts
    /// until they are dismissed.
    pub fn new(clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        let ttl = (ttl_secs > 0)
            .then(|| i64::try_from(ttl_secs).ok().and_then(Duration::try_seconds))
            .flatten();
        Self {
            clock,
            ttl,
            next_id: Arc::new(AtomicU64::new(1)),
            toasts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Toast>> {
        self.toasts.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, title: &str, body: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now_utc();
        self.lock().push(Toast {
            id,
            title: title.to_string(),
            body: body.to_string(),
            created_at: now,
            expires_at: self.ttl.and_then(|ttl| now.checked_add_signed(ttl)),
        });
        id
    }

    /// Currently visible toasts, oldest first. Expired toasts are removed.
    pub fn active(&self) -> Vec<Toast> {
        let now = self.clock.now_utc();
        let mut toasts = self.lock();
        toasts.retain(|t| !t.is_expired(now));
        toasts.clone()
    }

    /// Returns whether a toast with this id was showing.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut toasts = self.lock();
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        toasts.len() != before
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Notifier for ToastBoard {
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        tracing::info!("{}: {}", title, body);
        self.push(title, body);
        Ok(())
    }
}
