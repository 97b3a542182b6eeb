//! Host hook adapter.
//!
//! The host platform dispatches events (product saved, price computed,
//! storefront render, order status changed); this adapter is what it
//! registers. Each callback is a thin shim over the pure functions in the
//! domain crates; no behavior lives here beyond wiring and logging.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::error;

use preorder_catalog::{evaluate, meta, EditorFields, Evaluation, PreorderRecord, ProductKind};
use preorder_core::{MetadataStore, ProductId};
use preorder_notify::{notify_for_event, NotificationId, NotificationQueue};
use preorder_sales::{LifecycleEvent, Order, OrderStatus};

/// Callbacks the host registers against its event dispatcher.
pub struct PreorderHooks<S, Q> {
    store: S,
    queue: Q,
    admin_email: String,
}

impl<S, Q> PreorderHooks<S, Q>
where
    S: MetadataStore,
    Q: NotificationQueue,
{
    pub fn new(store: S, queue: Q, admin_email: impl Into<String>) -> Self {
        Self {
            store,
            queue,
            admin_email: admin_email.into(),
        }
    }

    /// Product editor opening: the stored fields for form prefill.
    pub fn on_product_editor_render(&self, product_id: ProductId) -> EditorFields {
        let record = PreorderRecord::load(&self.store, product_id);
        EditorFields {
            is_preorder: record.is_preorder,
            dynamic_inventory: record.dynamic_inventory,
            available_date: record.available_date,
            available_time: record.available_time,
            preorder_price: record.preorder_price,
            preorder_discount: record.preorder_discount,
        }
    }

    /// Product editor submitted: normalize and persist the fields.
    pub fn on_product_save(&self, product_id: ProductId, fields: &EditorFields) {
        meta::save_editor_fields(&self.store, product_id, fields);
    }

    /// Price filter: the amount the host should charge and display.
    pub fn on_price_compute(
        &self,
        product_id: ProductId,
        regular_price: Decimal,
        kind: ProductKind,
        now: DateTime<Utc>,
    ) -> Decimal {
        let record = PreorderRecord::load(&self.store, product_id);
        evaluate(&record, regular_price, kind, now).effective_price
    }

    /// Product page render: the full storefront view (price, button label,
    /// price text, availability banner).
    pub fn on_storefront_render(
        &self,
        product_id: ProductId,
        regular_price: Decimal,
        kind: ProductKind,
        now: DateTime<Utc>,
    ) -> Evaluation {
        let record = PreorderRecord::load(&self.store, product_id);
        evaluate(&record, regular_price, kind, now)
    }

    /// Order status transition: queue at most one notification.
    ///
    /// Queue failures are logged and swallowed; notification is
    /// best-effort and must never disturb the order flow.
    pub fn on_order_status_changed(
        &self,
        order: &Order,
        from: Option<OrderStatus>,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> Option<NotificationId> {
        let event = LifecycleEvent::for_transition(from, to)?;

        match notify_for_event(&self.store, &self.queue, event, order, &self.admin_email, now) {
            Ok(id) => id,
            Err(e) => {
                error!(order_id = %order.id, ?event, error = %e, "failed to queue pre-order notification");
                None
            }
        }
    }
}
