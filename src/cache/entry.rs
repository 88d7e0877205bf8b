//! Cache Entry Module
//!
//! Defines a stored value together with its absolute expiration instant.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A single cached value and the instant it stops being live.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Absolute expiration instant, None = deadline never assigned
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructors ==
    /// Creates an entry that expires at the given absolute instant.
    pub fn with_deadline(value: V, expires_at: Instant) -> Self {
        Self {
            value,
            expires_at: Some(expires_at),
        }
    }

    /// Creates an entry that expires `ttl` after `now`.
    pub fn with_ttl(value: V, now: Instant, ttl: Duration) -> Self {
        Self::with_deadline(value, deadline_after(now, ttl))
    }

    /// Creates an entry without a deadline.
    ///
    /// Such an entry is never live: every lookup treats it as absent until a
    /// deadline is assigned with one of the `update_with_*` methods.
    pub fn unset(value: V) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    // == Liveness ==
    /// Checks whether the entry is live at `now`.
    ///
    /// Boundary condition: an entry whose deadline equals `now` is expired.
    /// An entry with an unset deadline is never live.
    pub fn is_live(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(expires) if expires > now)
    }

    /// Returns the value if the entry is live at `now`.
    pub fn value_at(&self, now: Instant) -> Option<&V> {
        if self.is_live(now) {
            Some(&self.value)
        } else {
            None
        }
    }

    // == Time To Live ==
    /// Returns the time left until expiration, or None if no deadline is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has already expired
    /// - `Some(remaining)` if the entry is still live
    /// - `None` if the deadline was never assigned
    pub fn ttl_remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }

    // == Updates ==
    /// Replaces the value and keeps the current deadline.
    pub fn update_value(&mut self, value: V) {
        self.value = value;
    }

    /// Replaces both the value and the deadline.
    pub fn update_with_deadline(&mut self, value: V, expires_at: Instant) {
        self.value = value;
        self.expires_at = Some(expires_at);
    }

    /// Replaces the value and moves the deadline to `ttl` after `now`.
    pub fn update_with_ttl(&mut self, value: V, now: Instant, ttl: Duration) {
        self.update_with_deadline(value, deadline_after(now, ttl));
    }
}

// == Expiry ==
/// How the deadline of a newly written entry is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Expire this long after the write
    Ttl(Duration),
    /// Expire at an absolute instant, which may already be in the past
    At(Instant),
}

impl Expiry {
    /// Resolves to an absolute deadline, measuring TTLs from `now`.
    pub fn deadline(self, now: Instant) -> Instant {
        match self {
            Expiry::Ttl(ttl) => deadline_after(now, ttl),
            Expiry::At(at) => at,
        }
    }

    /// Wraps `value` in an entry expiring per this policy.
    pub fn into_entry<V>(self, value: V, now: Instant) -> CacheEntry<V> {
        CacheEntry::with_deadline(value, self.deadline(now))
    }
}

impl From<Duration> for Expiry {
    fn from(ttl: Duration) -> Self {
        Expiry::Ttl(ttl)
    }
}

impl From<Instant> for Expiry {
    fn from(at: Instant) -> Self {
        Expiry::At(at)
    }
}

// == Utility Functions ==
/// Roughly 30 years, the same horizon tokio uses for its far-future instant.
pub(crate) const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Adds `ttl` to `now`, saturating at a far-future instant on overflow.
pub(crate) fn deadline_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE)
}
