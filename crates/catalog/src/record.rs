//! The per-product pre-order record.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use preorder_core::{DomainResult, MetadataStore, ProductId};

use crate::meta::{self, keys};

/// Raw pre-order fields for one product, as stored.
///
/// Fields stay in their stored string form; typed views (`date`, `price`,
/// `available_at`, ...) are computed on read so that malformed merchant
/// input degrades predictably instead of corrupting stored state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreorderRecord {
    pub is_preorder: bool,
    pub available_date: Option<String>,
    pub available_time: Option<String>,
    pub preorder_price: Option<String>,
    pub preorder_discount: Option<String>,
    /// Advisory only; stored and surfaced, drives no behavior.
    pub dynamic_inventory: bool,
}

impl PreorderRecord {
    /// Load the record for one product, honoring legacy key aliases.
    pub fn load<S: MetadataStore>(store: &S, product_id: ProductId) -> Self {
        let field = |key: &str, legacy: Option<&str>| meta::read_field(store, product_id, key, legacy);

        Self {
            is_preorder: meta::is_preorder_flagged(store, product_id),
            available_date: field(keys::DATE, None),
            available_time: field(keys::TIME, None),
            preorder_price: field(keys::PRICE, Some(keys::LEGACY_PRICE)),
            preorder_discount: field(keys::DISCOUNT, Some(keys::LEGACY_DISCOUNT)),
            dynamic_inventory: meta::parse_flag(
                field(keys::DYNAMIC_INVENTORY, None).as_deref(),
            ),
        }
    }

    /// Typed availability date, `Err` on a malformed stored string.
    pub fn date(&self) -> DomainResult<Option<NaiveDate>> {
        self.available_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(meta::parse_date)
            .transpose()
    }

    /// Typed availability time-of-day, `Err` on a malformed stored string.
    pub fn time(&self) -> DomainResult<Option<NaiveTime>> {
        self.available_time
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(meta::parse_time)
            .transpose()
    }

    /// The absolute instant the pre-order period ends.
    ///
    /// A date without a time means midnight; a time without a date yields no
    /// instant at all. Stored values are interpreted as UTC; mapping store
    /// wall-clock time to UTC is the host adapter's concern.
    pub fn available_at(&self) -> DomainResult<Option<DateTime<Utc>>> {
        let Some(date) = self.date()? else {
            return Ok(None);
        };
        let time = self.time()?.unwrap_or(NaiveTime::MIN);
        Ok(Some(Utc.from_utc_datetime(&date.and_time(time))))
    }

    /// Fixed pre-order price, if one parses.
    pub fn price(&self) -> Option<Decimal> {
        meta::parse_decimal(self.preorder_price.as_deref())
    }

    /// Discount percentage, if one parses and lies in `[0, 100]`.
    /// Out-of-range values are treated as not set rather than producing
    /// negative or inflated prices.
    pub fn discount_percent(&self) -> Option<Decimal> {
        meta::parse_decimal(self.preorder_discount.as_deref())
            .filter(|d| *d >= Decimal::ZERO && *d <= Decimal::ONE_HUNDRED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preorder_core::InMemoryMetadataStore;

    fn record_with(date: Option<&str>, time: Option<&str>) -> PreorderRecord {
        PreorderRecord {
            is_preorder: true,
            available_date: date.map(String::from),
            available_time: time.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn available_at_combines_date_and_time() {
        let record = record_with(Some("2026-03-01"), Some("14:30"));
        let at = record.available_at().unwrap().unwrap();
        assert_eq!(at.to_rfc3339(), "2026-03-01T14:30:00+00:00");
    }

    #[test]
    fn date_without_time_means_midnight() {
        let record = record_with(Some("2026-03-01"), None);
        let at = record.available_at().unwrap().unwrap();
        assert_eq!(at.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }

    #[test]
    fn time_without_date_yields_no_instant() {
        let record = record_with(None, Some("14:30"));
        assert_eq!(record.available_at().unwrap(), None);
    }

    #[test]
    fn malformed_date_is_an_error_not_a_past_instant() {
        let record = record_with(Some("whenever"), None);
        assert!(record.available_at().is_err());
    }

    #[test]
    fn out_of_range_discount_is_ignored() {
        let mut record = PreorderRecord {
            preorder_discount: Some("150".to_string()),
            ..Default::default()
        };
        assert_eq!(record.discount_percent(), None);

        record.preorder_discount = Some("-5".to_string());
        assert_eq!(record.discount_percent(), None);

        record.preorder_discount = Some("20".to_string());
        assert_eq!(record.discount_percent(), Some("20".parse().unwrap()));
    }

    #[test]
    fn load_reads_legacy_aliases() {
        let store = InMemoryMetadataStore::new();
        let id = ProductId::new();

        store.set(id, "_is_preorder", "yes");
        store.set(id, "_preorder_price", "25.00");
        store.set(id, "_preorder_discount", "10");

        let record = PreorderRecord::load(&store, id);
        assert!(record.is_preorder);
        assert_eq!(record.price(), Some("25.00".parse().unwrap()));
        assert_eq!(record.discount_percent(), Some("10".parse().unwrap()));
    }
}
