//! Cache Entry Module
//!
//! Defines individual cache entries and their expiration instant.

use std::time::Duration;

use tokio::time::Instant;

// == Expiry ==
/// When an entry stops being visible to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The entry never expires.
    Never,
    /// The entry expires at this instant.
    At(Instant),
}

impl Expiry {
    // == From TTL ==
    /// Resolves a TTL measured from `now`.
    ///
    /// A zero TTL means "never expires". A TTL so large that `now + ttl` does not
    /// fit the clock is also treated as never expiring.
    pub fn from_ttl(now: Instant, ttl: Duration) -> Self {
        if ttl.is_zero() {
            return Expiry::Never;
        }
        now.checked_add(ttl).map_or(Expiry::Never, Expiry::At)
    }

    // == Is Expired ==
    /// Checks if the expiry has been reached at `now`.
    ///
    /// Boundary condition: an entry whose expiration instant is at or before
    /// `now` is expired.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self {
            Expiry::At(at) => *at <= now,
            Expiry::Never => false,
        }
    }

    // == Remaining ==
    /// Returns the time left before expiry, or `None` if it never expires.
    ///
    /// Returns `Some(Duration::ZERO)` once the expiry has passed.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Expiry::At(at) => Some(at.saturating_duration_since(Instant::now())),
            Expiry::Never => None,
        }
    }
}

// == Cache Entry ==
/// A stored value together with its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the value stops being visible
    pub expiry: Expiry,
}

impl<V> CacheEntry<V> {
    /// Creates an entry expiring `ttl` from now (zero = never).
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expiry: Expiry::from_ttl(Instant::now(), ttl),
        }
    }

    /// Checks if the entry has expired.
    pub fn is_expired(&self) -> bool {
        self.expiry.is_expired_at(Instant::now())
    }
}
