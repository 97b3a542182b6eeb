//! Derived pre-order status.
//!
//! The stored flag alone can't answer "is this product in pre-order right
//! now": the availability instant may already have passed while the sweep
//! hasn't run yet, or the stored date may be garbage. Status is therefore
//! computed on read from `(flag, available_at, now)`; the sweep only
//! reconciles the stored flag with what this derivation already decided.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::PreorderRecord;

/// Pre-order status of one product at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum PreorderStatus {
    /// Flag unset; a normal product.
    NotPreorder,
    /// Flagged, and either open-ended or the availability instant is still
    /// ahead.
    Active {
        available_at: Option<DateTime<Utc>>,
    },
    /// Flagged, but the availability instant has passed. Evaluates as a
    /// normal product; the sweep will clear the stored flag.
    Lapsed { available_at: DateTime<Utc> },
    /// Flagged with an unparsable date/time. Evaluates as a normal product;
    /// the sweep skips it with a warning.
    Invalid,
}

impl PreorderStatus {
    /// Derive the status from a record at `now`.
    pub fn derive(record: &PreorderRecord, now: DateTime<Utc>) -> Self {
        if !record.is_preorder {
            return Self::NotPreorder;
        }
        match record.available_at() {
            Err(_) => Self::Invalid,
            Ok(None) => Self::Active { available_at: None },
            Ok(Some(at)) if at <= now => Self::Lapsed { available_at: at },
            Ok(Some(at)) => Self::Active {
                available_at: Some(at),
            },
        }
    }

    /// Whether pre-order behavior (price, label, banners) applies.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Whether the sweep should clear the stored flag.
    pub fn is_due_for_release(&self) -> bool {
        matches!(self, Self::Lapsed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flagged(date: Option<&str>, time: Option<&str>) -> PreorderRecord {
        PreorderRecord {
            is_preorder: true,
            available_date: date.map(String::from),
            available_time: time.map(String::from),
            ..Default::default()
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn unflagged_record_is_not_preorder() {
        let record = PreorderRecord::default();
        let status = PreorderStatus::derive(&record, at("2026-01-01T00:00:00Z"));
        assert_eq!(status, PreorderStatus::NotPreorder);
    }

    #[test]
    fn future_instant_is_active() {
        let record = flagged(Some("2026-06-01"), Some("12:00"));
        let status = PreorderStatus::derive(&record, at("2026-01-01T00:00:00Z"));
        assert!(status.is_active());
        assert!(!status.is_due_for_release());
    }

    #[test]
    fn open_ended_preorder_is_active() {
        let record = flagged(None, None);
        let status = PreorderStatus::derive(&record, at("2026-01-01T00:00:00Z"));
        assert_eq!(
            status,
            PreorderStatus::Active { available_at: None }
        );
    }

    #[test]
    fn passed_instant_is_lapsed_and_due() {
        let record = flagged(Some("2020-01-01"), Some("00:00"));
        let status = PreorderStatus::derive(&record, at("2026-01-01T00:00:00Z"));
        assert!(status.is_due_for_release());
        assert!(!status.is_active());
    }

    #[test]
    fn instant_exactly_now_counts_as_lapsed() {
        let record = flagged(Some("2026-01-01"), Some("00:00"));
        let status = PreorderStatus::derive(&record, at("2026-01-01T00:00:00Z"));
        assert!(status.is_due_for_release());
    }

    #[test]
    fn garbage_date_is_invalid_not_lapsed() {
        let record = flagged(Some("soon (tm)"), None);
        let status = PreorderStatus::derive(&record, at("2026-01-01T00:00:00Z"));
        assert_eq!(status, PreorderStatus::Invalid);
        assert!(!status.is_due_for_release());
    }
}
