//! Read-only order view and lifecycle events.
//!
//! Orders belong to the host commerce platform; this crate only sees the
//! slice the engine needs: enough to spot a pre-order line item and to
//! address a notification. Nothing here writes back.

use serde::{Deserialize, Serialize};

use preorder_catalog::meta;
use preorder_core::{MetadataStore, OrderId, ProductId};

/// Host order status values the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

/// One product entry (with quantity) within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub name: String,
}

/// The read-only order slice handed in by the host adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub billing_email: String,
    pub lines: Vec<LineItem>,
}

impl Order {
    pub fn new(
        id: OrderId,
        status: OrderStatus,
        billing_email: impl Into<String>,
        lines: Vec<LineItem>,
    ) -> Self {
        Self {
            id,
            status,
            billing_email: billing_email.into(),
            lines,
        }
    }
}

/// Order lifecycle transitions that can trigger a pre-order notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    /// Checkout finished; the order exists.
    Placed,
    /// Moved from pending into processing.
    Processing,
    /// Marked completed.
    Completed,
}

impl LifecycleEvent {
    /// Map a host status transition onto a notification-relevant event.
    ///
    /// `from` is `None` when the order was just created. Transitions the
    /// engine doesn't care about (cancellation, refunds, backwards moves)
    /// map to `None`.
    pub fn for_transition(from: Option<OrderStatus>, to: OrderStatus) -> Option<Self> {
        match (from, to) {
            (None, OrderStatus::Pending) => Some(Self::Placed),
            (Some(OrderStatus::Pending), OrderStatus::Processing) => Some(Self::Processing),
            (Some(_), OrderStatus::Completed) => Some(Self::Completed),
            _ => None,
        }
    }
}

/// The first line item whose product is flagged as pre-order *at read time*.
///
/// Scans in order and stops at the first hit, so an order with many
/// pre-order lines still produces at most one notification.
pub fn first_preorder_line<'a, S: MetadataStore>(
    order: &'a Order,
    store: &S,
) -> Option<&'a LineItem> {
    order
        .lines
        .iter()
        .find(|line| meta::is_preorder_flagged(store, line.product_id))
}
