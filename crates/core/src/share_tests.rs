// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use std::collections::HashSet;
use yare::parameterized;

#[parameterized(
    thirty_minutes = { "30m", 30 * 60_000 },
    two_hours = { "2h", 2 * 3_600_000 },
    one_day = { "1d", 24 * 3_600_000 },
    unknown_unit = { "10w", DEFAULT_EXPIRY_MS },
    garbage = { "soon", DEFAULT_EXPIRY_MS },
    empty = { "", DEFAULT_EXPIRY_MS },
    negative = { "-5m", DEFAULT_EXPIRY_MS },
    zero = { "0h", DEFAULT_EXPIRY_MS },
    missing_number = { "h", DEFAULT_EXPIRY_MS },
)]
fn parse_expires_in_cases(input: &str, expected_ms: u64) {
    assert_eq!(parse_expires_in(input), expected_ms);
}

#[test]
fn parse_expires_in_caps_at_one_year() {
    assert_eq!(parse_expires_in("9999d"), 365 * 24 * 3_600_000);
}

#[test]
fn token_is_32_lowercase_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), TOKEN_LEN);
    assert!(token.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
}

#[test]
fn tokens_do_not_collide_over_many_trials() {
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        assert!(seen.insert(generate_token()));
    }
}

#[test]
fn share_expiry_is_inclusive_at_the_boundary() {
    let now = chrono::Utc::now();
    let share = Share {
        token: generate_token(),
        session_name: "demo".into(),
        created_at: now,
        expires_at: now,
    };
    assert!(share.is_expired(now));
}

proptest! {
    /// Any recognized duration parses to a positive value within the
    /// one-year sanity bound.
    #[test]
    fn recognized_durations_stay_in_bounds(n in 1u64..100_000, unit in prop::sample::select(vec!['m', 'h', 'd'])) {
        let ms = parse_expires_in(&format!("{n}{unit}"));
        prop_assert!(ms > 0);
        prop_assert!(ms <= 365 * 24 * 3_600_000);
    }

    /// Unrecognized strings always map to the one-hour default.
    #[test]
    fn unrecognized_strings_use_default(s in "[a-z ]{0,12}") {
        prop_assert_eq!(parse_expires_in(&s), DEFAULT_EXPIRY_MS);
    }
}
