//! Relevance scoring and priority mapping.
//!
//! All functions here are pure: the caller supplies the reference time,
//! so a given input always maps to the same score and band.

// Aging factors are tiny relative to i64 scores
#![allow(clippy::cast_possible_wrap)]

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::job::Priority;
use crate::meta::UrlMeta;

/// URLs first seen within this window get a freshness bonus.
const FRESH_WINDOW_MINUTES: i64 = 10;
/// Per-link score weight and its cap.
const INBOUND_LINK_WEIGHT: i64 = 3;
const INBOUND_LINK_CAP: i64 = 30;
/// One aging point per this many seconds waited.
const AGING_STEP_SECS: u64 = 30;

/// Score a URL for developer relevance at the given reference time.
#[must_use]
pub fn score(meta: &UrlMeta, now: DateTime<Utc>) -> i64 {
    let mut score = 0;

    let age = now.signed_duration_since(meta.first_seen_at);
    if age < chrono::Duration::minutes(FRESH_WINDOW_MINUTES) {
        score += 20;
    }
    if meta.depth <= 2 {
        score += 30;
    }
    if !meta.has_query_params() {
        score += 10;
    }
    if meta.is_docs() {
        score += 40;
    }
    if meta.is_api() {
        score += 35;
    }
    if meta.is_spec() {
        score += 50;
    }
    if meta.has_code_blocks() {
        score += 30;
    }
    if meta.content_type.as_deref() == Some("md") {
        score += 20;
    }
    score += (i64::from(meta.inbound_links) * INBOUND_LINK_WEIGHT).min(INBOUND_LINK_CAP);
    if meta.is_blog() {
        score -= 15;
    }
    if meta.is_recrawl() {
        score -= 25;
    }

    score
}

/// Map a score onto its urgency band.
#[must_use]
pub const fn score_to_priority(score: i64) -> Priority {
    if score >= 90 {
        Priority::P0Urgent
    } else if score >= 60 {
        Priority::P1High
    } else if score >= 30 {
        Priority::P2Normal
    } else {
        Priority::P3Low
    }
}

/// Raise a score by one point per 30 seconds waited, so long-waiting
/// low-priority jobs cannot starve forever.
#[must_use]
pub const fn apply_aging(score: i64, waited: Duration) -> i64 {
    score + (waited.as_secs() / AGING_STEP_SECS) as i64
}
