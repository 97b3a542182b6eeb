//! Canonical metadata keys and the field codec.
//!
//! Everything this engine knows about a product lives in host metadata as
//! strings. This module owns the key names, the `yes`/`no` flag encoding,
//! the date/time/decimal parsing rules, and the normalizing save path for
//! the product editor fields.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use preorder_core::{DomainError, DomainResult, MetadataStore, ProductId};

/// Canonical metadata keys (the `_pre_order_*` spelling is written; the
/// `_preorder_*` spelling is accepted read-only as a legacy alias).
pub mod keys {
    pub const IS_PRE_ORDER: &str = "_is_pre_order";
    pub const DATE: &str = "_pre_order_date";
    pub const TIME: &str = "_pre_order_time";
    pub const PRICE: &str = "_pre_order_price";
    pub const DISCOUNT: &str = "_pre_order_discount";
    pub const DYNAMIC_INVENTORY: &str = "_dynamic_inventory";

    /// Legacy aliases found in older data. Never written.
    pub const LEGACY_IS_PREORDER: &str = "_is_preorder";
    pub const LEGACY_PRICE: &str = "_preorder_price";
    pub const LEGACY_DISCOUNT: &str = "_preorder_discount";
}

/// Stored encoding of a boolean flag.
pub fn flag_value(on: bool) -> &'static str {
    if on { "yes" } else { "no" }
}

/// A flag is set only by the exact value `yes`; anything else (including
/// absence and the empty-string sentinel) is off.
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw == Some("yes")
}

/// Parse a stored date field (`YYYY-MM-DD`).
pub fn parse_date(raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| DomainError::invalid_date(format!("{raw:?}: {e}")))
}

/// Parse a stored time-of-day field (`HH:MM`, seconds tolerated).
pub fn parse_time(raw: &str) -> DomainResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| DomainError::invalid_date(format!("{raw:?}: {e}")))
}

/// Parse a stored numeric field. Missing, empty, and malformed values are
/// all "not set", never an error.
pub fn parse_decimal(raw: Option<&str>) -> Option<Decimal> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<Decimal>().ok()
}

/// Read a field, falling through to its legacy alias when the canonical key
/// is absent or empty.
pub fn read_field<S: MetadataStore>(
    store: &S,
    product_id: ProductId,
    key: &str,
    legacy: Option<&str>,
) -> Option<String> {
    match store.get(product_id, key) {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            let legacy = legacy?;
            store
                .get(product_id, legacy)
                .filter(|v| !v.trim().is_empty())
        }
    }
}

/// Whether the product is flagged as pre-order right now (canonical or
/// legacy key).
pub fn is_preorder_flagged<S: MetadataStore>(store: &S, product_id: ProductId) -> bool {
    parse_flag(
        read_field(
            store,
            product_id,
            keys::IS_PRE_ORDER,
            Some(keys::LEGACY_IS_PREORDER),
        )
        .as_deref(),
    )
}

/// Clear the pre-order flag on both the canonical key and, when older data
/// carries it, the legacy alias. Leaves every other field untouched so
/// re-flagging restores the merchant's input.
pub fn clear_preorder_flag<S: MetadataStore>(store: &S, product_id: ProductId) {
    store.set(product_id, keys::IS_PRE_ORDER, flag_value(false));
    if store
        .get(product_id, keys::LEGACY_IS_PREORDER)
        .is_some_and(|v| !v.trim().is_empty())
    {
        store.set(product_id, keys::LEGACY_IS_PREORDER, flag_value(false));
    }
}

/// Fields submitted from the product editor, before normalization.
///
/// `None` for a text field means the field was absent from the submission
/// (stored as empty, matching the host form semantics). Checkboxes are
/// present-or-absent, hence plain bools.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EditorFields {
    pub is_preorder: bool,
    pub dynamic_inventory: bool,
    pub available_date: Option<String>,
    pub available_time: Option<String>,
    pub preorder_price: Option<String>,
    pub preorder_discount: Option<String>,
}

/// Normalize and persist the editor fields.
///
/// All fields are written regardless of the flag; status is derived on read,
/// so unflagging preserves the raw values. Numeric fields that fail decimal
/// parsing are stored as empty.
pub fn save_editor_fields<S: MetadataStore>(
    store: &S,
    product_id: ProductId,
    fields: &EditorFields,
) {
    store.set(
        product_id,
        keys::IS_PRE_ORDER,
        flag_value(fields.is_preorder),
    );
    store.set(
        product_id,
        keys::DYNAMIC_INVENTORY,
        flag_value(fields.dynamic_inventory),
    );
    store.set(
        product_id,
        keys::DATE,
        fields.available_date.as_deref().unwrap_or("").trim(),
    );
    store.set(
        product_id,
        keys::TIME,
        fields.available_time.as_deref().unwrap_or("").trim(),
    );
    store.set(
        product_id,
        keys::PRICE,
        &normalize_decimal(fields.preorder_price.as_deref()),
    );
    store.set(
        product_id,
        keys::DISCOUNT,
        &normalize_decimal(fields.preorder_discount.as_deref()),
    );
}

fn normalize_decimal(raw: Option<&str>) -> String {
    match parse_decimal(raw) {
        Some(value) => value.normalize().to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preorder_core::InMemoryMetadataStore;

    #[test]
    fn flag_parses_only_exact_yes() {
        assert!(parse_flag(Some("yes")));
        assert!(!parse_flag(Some("no")));
        assert!(!parse_flag(Some("Yes")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn decimal_parsing_treats_garbage_as_unset() {
        assert_eq!(parse_decimal(Some("19.99")), Some("19.99".parse().unwrap()));
        assert_eq!(parse_decimal(Some("  42 ")), Some("42".parse().unwrap()));
        assert_eq!(parse_decimal(Some("")), None);
        assert_eq!(parse_decimal(Some("abc")), None);
        assert_eq!(parse_decimal(None), None);
    }

    #[test]
    fn date_and_time_parsing_reject_malformed_strings() {
        assert!(parse_date("2026-03-01").is_ok());
        assert!(parse_date("soon").is_err());
        assert!(parse_date("2026-13-40").is_err());

        assert!(parse_time("09:30").is_ok());
        assert!(parse_time("09:30:15").is_ok());
        assert!(parse_time("half past nine").is_err());
    }

    #[test]
    fn read_field_falls_through_to_legacy_alias() {
        let store = InMemoryMetadataStore::new();
        let id = ProductId::new();

        store.set(id, keys::LEGACY_PRICE, "12.50");
        let value = read_field(&store, id, keys::PRICE, Some(keys::LEGACY_PRICE));
        assert_eq!(value.as_deref(), Some("12.50"));

        // Canonical wins once present.
        store.set(id, keys::PRICE, "15.00");
        let value = read_field(&store, id, keys::PRICE, Some(keys::LEGACY_PRICE));
        assert_eq!(value.as_deref(), Some("15.00"));
    }

    #[test]
    fn save_normalizes_checkboxes_and_decimals() {
        let store = InMemoryMetadataStore::new();
        let id = ProductId::new();

        save_editor_fields(
            &store,
            id,
            &EditorFields {
                is_preorder: true,
                dynamic_inventory: false,
                available_date: Some("2026-06-01".to_string()),
                available_time: None,
                preorder_price: Some(" 19.90 ".to_string()),
                preorder_discount: Some("not a number".to_string()),
            },
        );

        assert_eq!(store.get(id, keys::IS_PRE_ORDER).as_deref(), Some("yes"));
        assert_eq!(store.get(id, keys::DYNAMIC_INVENTORY).as_deref(), Some("no"));
        assert_eq!(store.get(id, keys::DATE).as_deref(), Some("2026-06-01"));
        assert_eq!(store.get(id, keys::TIME).as_deref(), Some(""));
        assert_eq!(store.get(id, keys::PRICE).as_deref(), Some("19.9"));
        assert_eq!(store.get(id, keys::DISCOUNT).as_deref(), Some(""));
    }

    #[test]
    fn unflagging_preserves_raw_fields() {
        let store = InMemoryMetadataStore::new();
        let id = ProductId::new();

        let mut fields = EditorFields {
            is_preorder: true,
            available_date: Some("2026-06-01".to_string()),
            preorder_price: Some("9.99".to_string()),
            ..Default::default()
        };
        save_editor_fields(&store, id, &fields);

        fields.is_preorder = false;
        save_editor_fields(&store, id, &fields);

        assert_eq!(store.get(id, keys::IS_PRE_ORDER).as_deref(), Some("no"));
        assert_eq!(store.get(id, keys::DATE).as_deref(), Some("2026-06-01"));
        assert_eq!(store.get(id, keys::PRICE).as_deref(), Some("9.99"));
    }

    #[test]
    fn clear_flag_also_clears_populated_legacy_key() {
        let store = InMemoryMetadataStore::new();
        let id = ProductId::new();

        store.set(id, keys::IS_PRE_ORDER, "yes");
        store.set(id, keys::LEGACY_IS_PREORDER, "yes");

        clear_preorder_flag(&store, id);

        assert_eq!(store.get(id, keys::IS_PRE_ORDER).as_deref(), Some("no"));
        assert_eq!(
            store.get(id, keys::LEGACY_IS_PREORDER).as_deref(),
            Some("no")
        );
        assert!(!is_preorder_flagged(&store, id));
    }
}
