//! Wall-clock time as it appears on the wire.
//!
//! Two places carry time:
//!
//! - the `x-timestamp` auth header, captured when the headers are built rather
//!   than when the call was first issued, so the replay window a server can
//!   enforce is local to the request carrying them;
//! - the `validAfter` / `validBefore` bounds of a signed payment, described by
//!   [`ValidityWindow`].
//!
//! Both are whole seconds since the Unix epoch. In JSON they travel as decimal
//! strings (`"1699999999"`), the form ERC-3009 payloads use for `uint256`
//! fields.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<u64>().map(Self).map_err(|_| {
            serde::de::Error::custom(format!("timestamp must be decimal seconds, got {s:?}"))
        })
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UnixTimestamp {
    /// Creates a timestamp from raw seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Current wall-clock time.
    ///
    /// # Panics
    ///
    /// Panics if the system clock is set before the Unix epoch.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("SystemTime before UNIX epoch?!?")
            .as_secs();
        Self(now)
    }

    /// Raw seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// `secs` earlier, clamped at the epoch.
    #[must_use]
    pub const fn saturating_sub(self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }

    /// `secs` later, clamped at `u64::MAX`.
    #[must_use]
    pub const fn saturating_add(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

/// The span in which a signed payment authorization can be settled.
///
/// Opens before the signing instant to tolerate a server clock running behind
/// the client's, and closes after the requirement's `maxTimeoutSeconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    /// Earliest settlement time (`validAfter`).
    pub valid_after: UnixTimestamp,
    /// Latest settlement time (`validBefore`).
    pub valid_before: UnixTimestamp,
}

impl ValidityWindow {
    /// Window around `signed_at`: `backdate_secs` before it to `valid_for_secs`
    /// after it.
    #[must_use]
    pub const fn around(signed_at: UnixTimestamp, backdate_secs: u64, valid_for_secs: u64) -> Self {
        Self {
            valid_after: signed_at.saturating_sub(backdate_secs),
            valid_before: signed_at.saturating_add(valid_for_secs),
        }
    }

    /// Whether `at` falls inside the window (bounds exclusive, as ERC-3009
    /// checks them).
    #[must_use]
    pub fn contains(&self, at: UnixTimestamp) -> bool {
        self.valid_after < at && at < self.valid_before
    }
}
