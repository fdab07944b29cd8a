// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Share tokens: time-bounded, revocable, read-only handles on a session.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Length of a rendered share token: 16 random bytes as lowercase hex.
pub const TOKEN_LEN: usize = 32;

/// Fallback expiry when `expires_in` is missing or unrecognized: one hour.
pub const DEFAULT_EXPIRY_MS: u64 = 3_600_000;

/// Sanity cap on parsed expiries: one year.
const MAX_EXPIRY_MS: u64 = 365 * 24 * 3_600_000;

/// A read-only handle binding a public URL to a session. Dangling shares
/// (session stopped afterwards) are permitted and fail to resolve at use
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub token: String,
    pub session_name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Share {
    /// A share is expired once `now >= expires_at` and must then be treated
    /// as absent.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Generate a fresh share token: 16 bytes of OS randomness, lowercase hex.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Parse an `expires_in` duration string: `Nh`, `Nm`, or `Nd` with a
/// non-negative integer `N`. Returns milliseconds, capped at one year.
/// Unrecognized values fall back to one hour. So does `0` of any unit:
/// parsed lifetimes are always positive, since a zero-length share could
/// only mint a token that is expired the moment it is created.
pub fn parse_expires_in(value: &str) -> u64 {
    let value = value.trim();
    let Some(unit) = value.chars().last() else {
        return DEFAULT_EXPIRY_MS;
    };
    let digits = &value[..value.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return DEFAULT_EXPIRY_MS;
    }
    let Ok(n) = digits.parse::<u64>() else {
        // Longer than u64 digits; treat as unrecognized rather than saturate.
        return DEFAULT_EXPIRY_MS;
    };
    let per_unit: u64 = match unit {
        'm' => 60_000,
        'h' => 3_600_000,
        'd' => 24 * 3_600_000,
        _ => return DEFAULT_EXPIRY_MS,
    };
    let ms = n.saturating_mul(per_unit);
    if ms == 0 {
        // "0h" is well-formed but useless; give it the default lifetime.
        return DEFAULT_EXPIRY_MS;
    }
    ms.min(MAX_EXPIRY_MS)
}

#[cfg(test)]
#[path = "share_tests.rs"]
mod tests;
