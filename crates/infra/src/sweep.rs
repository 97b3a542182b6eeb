//! The lifecycle sweep: release pre-orders whose date has passed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use preorder_catalog::{meta, meta::keys, PreorderRecord, PreorderStatus};
use preorder_core::MetadataStore;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Flagged products the pass looked at.
    pub examined: usize,
    /// Flags cleared because the availability instant had passed.
    pub released: usize,
    /// Records skipped because their stored date/time would not parse.
    pub skipped_invalid: usize,
    /// Records that changed under us between query and write.
    pub skipped_contended: usize,
}

/// Run one sweep pass at `now`.
///
/// One-way and idempotent: a pass over unchanged state is a no-op. The flag
/// is re-read immediately before every write so an overlapping sweep or a
/// concurrent merchant edit is skipped instead of clobbered. Unparsable
/// dates never count as "past"; those records are left alone and reported.
pub fn run_sweep<S: MetadataStore>(store: &S, now: DateTime<Utc>) -> SweepReport {
    let mut ids = store.products_where(keys::IS_PRE_ORDER, "yes");
    for id in store.products_where(keys::LEGACY_IS_PREORDER, "yes") {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    let mut report = SweepReport::default();

    for id in ids {
        report.examined += 1;
        let record = PreorderRecord::load(store, id);
        if !record.is_preorder {
            report.skipped_contended += 1;
            continue;
        }

        match PreorderStatus::derive(&record, now) {
            PreorderStatus::Invalid => {
                warn!(product_id = %id, "skipping pre-order with unparsable availability date/time");
                report.skipped_invalid += 1;
            }
            PreorderStatus::Lapsed { available_at } => {
                // Re-check right before writing; the merchant may have
                // unflagged (or another sweep released) since the query.
                if meta::is_preorder_flagged(store, id) {
                    meta::clear_preorder_flag(store, id);
                    debug!(product_id = %id, %available_at, "released pre-order");
                    report.released += 1;
                } else {
                    report.skipped_contended += 1;
                }
            }
            PreorderStatus::Active { .. } | PreorderStatus::NotPreorder => {}
        }
    }

    info!(
        examined = report.examined,
        released = report.released,
        skipped_invalid = report.skipped_invalid,
        skipped_contended = report.skipped_contended,
        "sweep pass finished"
    );

    report
}
