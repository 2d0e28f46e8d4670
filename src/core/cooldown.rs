//! Timestamp-based cooldown gates for rate-limited side effects.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The side effects that are rate limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownChannel {
    AudioAlert,
    ObjectAlert,
    EvidenceClip,
    Snapshot,
}

/// Gate that lets a channel fire once per cooldown period.
///
/// A channel may fire when `now - last_fired_at >= cooldown`. A channel that
/// has never fired is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cooldown {
    channel: CooldownChannel,
    cooldown: Duration,
    last_fired_at: Option<DateTime<Utc>>,
}

impl Cooldown {
    pub fn new(channel: CooldownChannel, cooldown: Duration) -> Self {
        Self {
            channel,
            cooldown,
            last_fired_at: None,
        }
    }

    /// Check whether the channel may fire at `now`.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        match self.last_fired_at {
            None => true,
            Some(last) => now - last >= self.cooldown,
        }
    }

    /// Fire if ready. Returns whether the channel fired.
    pub fn try_fire(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_ready(now) {
            self.mark_fired(now);
            true
        } else {
            false
        }
    }

    /// Record a firing unconditionally.
    pub fn mark_fired(&mut self, now: DateTime<Utc>) {
        tracing::debug!(channel = ?self.channel, "Cooldown started");
        self.last_fired_at = Some(now);
    }
}
