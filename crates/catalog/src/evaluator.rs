//! Storefront evaluation: price, button label, display strings.
//!
//! Pure function of its inputs: no store access, no clock access, no side
//! effects. The host adapter loads the record, supplies the regular price
//! and `now`, and feeds the result into its own rendering/price filters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::record::PreorderRecord;
use crate::status::PreorderStatus;

/// Button label shown instead of the host's add-to-cart text.
pub const PREORDER_BUTTON_LABEL: &str = "Pre-order Now";

/// The product shapes the host distinguishes. Only simple products get the
/// label/banner overrides; variations still get price evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Simple,
    Variable,
}

/// Everything the storefront needs for one product view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub status: PreorderStatus,
    /// The price to charge and display. Falls back to the regular price
    /// whenever pre-order pricing does not apply.
    pub effective_price: Decimal,
    /// `Some` only when the add-to-cart text should be replaced; `None`
    /// keeps the host default.
    pub button_label: Option<&'static str>,
    /// Replacement price text when a fixed pre-order price is set; `None`
    /// keeps the host's own price rendering.
    pub price_display: Option<String>,
    /// Availability banner, present only when both date and time are set.
    pub availability_display: Option<String>,
}

/// Evaluate one product view.
pub fn evaluate(
    record: &PreorderRecord,
    regular_price: Decimal,
    kind: ProductKind,
    now: DateTime<Utc>,
) -> Evaluation {
    let status = PreorderStatus::derive(record, now);
    let active = status.is_active();
    let simple = matches!(kind, ProductKind::Simple);

    // Precedence when both a fixed price and a discount are set: the
    // discount applies to the fixed pre-order price.
    let effective_price = if active {
        match (record.price(), record.discount_percent()) {
            (Some(price), Some(percent)) => discounted(price, percent),
            (Some(price), None) => price,
            (None, Some(percent)) => discounted(regular_price, percent),
            (None, None) => regular_price,
        }
    } else {
        regular_price
    };

    let button_label = (active && simple).then_some(PREORDER_BUTTON_LABEL);

    let price_display = if active && simple {
        record.price().map(|price| match record.discount_percent() {
            Some(percent) => format!(
                "Pre-order Price: {} / Discounted Price: {} (Pre-order Price)",
                format_amount(price),
                format_amount(discounted(price, percent)),
            ),
            None => format!("{} (Pre-order Price)", format_amount(price)),
        })
    } else {
        None
    };

    let availability_display = if active && simple {
        match (record.date(), record.time()) {
            (Ok(Some(date)), Ok(Some(time))) => Some(format!(
                "Pre-order Available on: {} at {}",
                date.format("%B %-d, %Y"),
                time.format("%H:%M"),
            )),
            _ => None,
        }
    } else {
        None
    };

    Evaluation {
        status,
        effective_price,
        button_label,
        price_display,
        availability_display,
    }
}

fn discounted(base: Decimal, percent: Decimal) -> Decimal {
    base - base * percent / Decimal::ONE_HUNDRED
}

fn format_amount(value: Decimal) -> String {
    format!("${:.2}", value)
}


#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;

    fn cents(max: i64) -> impl Strategy<Value = Decimal> {
        (0..max).prop_map(|c| Decimal::new(c, 2))
    }

    fn now() -> DateTime<Utc> {
        "2026-01-15T12:00:00Z".parse().unwrap()
    }

    proptest! {
        #[test]
        fn unflagged_price_is_always_regular(
            regular in cents(10_000_000),
            price in proptest::option::of(cents(10_000_000)),
            discount in proptest::option::of(0u32..=100),
        ) {
            let record = PreorderRecord {
                is_preorder: false,
                preorder_price: price.map(|p| p.to_string()),
                preorder_discount: discount.map(|d| d.to_string()),
                ..Default::default()
            };

            let eval = evaluate(&record, regular, ProductKind::Simple, now());
            prop_assert_eq!(eval.effective_price, regular);
        }

        #[test]
        fn fixed_price_only_wins(regular in cents(10_000_000), price in cents(10_000_000)) {
            let record = PreorderRecord {
                is_preorder: true,
                preorder_price: Some(price.to_string()),
                ..Default::default()
            };

            let eval = evaluate(&record, regular, ProductKind::Simple, now());
            prop_assert_eq!(eval.effective_price, price);
        }

        #[test]
        fn discount_only_scales_regular(regular in cents(10_000_000), discount in 0u32..=100) {
            let record = PreorderRecord {
                is_preorder: true,
                preorder_discount: Some(discount.to_string()),
                ..Default::default()
            };

            let expected = regular
                - regular * Decimal::from(discount) / Decimal::ONE_HUNDRED;
            let eval = evaluate(&record, regular, ProductKind::Simple, now());
            prop_assert_eq!(eval.effective_price, expected);
        }

        #[test]
        fn effective_price_never_exceeds_the_applicable_basis(
            regular in cents(10_000_000),
            price in proptest::option::of(cents(10_000_000)),
            discount in proptest::option::of(0u32..=100),
        ) {
            let record = PreorderRecord {
                is_preorder: true,
                preorder_price: price.map(|p| p.to_string()),
                preorder_discount: discount.map(|d| d.to_string()),
                ..Default::default()
            };

            let basis = price.unwrap_or(regular);
            let eval = evaluate(&record, regular, ProductKind::Simple, now());
            prop_assert!(eval.effective_price <= basis);
            prop_assert!(eval.effective_price >= Decimal::ZERO);
        }
    }
}
