//! The notification step: detect, compose, enqueue.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use preorder_core::MetadataStore;
use preorder_sales::{first_preorder_line, LifecycleEvent, Order};

use crate::message;
use crate::queue::{Notification, NotificationId, NotificationQueue, QueueError};

/// React to an order lifecycle event.
///
/// Scans the order for a pre-order line (flag read at call time, first hit
/// wins) and, if one is found, enqueues exactly one email for the event.
/// Returns the queued id, or `None` when the order carries no pre-order
/// line. Never blocks on mail transport.
pub fn notify_for_event<S, Q>(
    store: &S,
    queue: &Q,
    event: LifecycleEvent,
    order: &Order,
    admin_email: &str,
    now: DateTime<Utc>,
) -> Result<Option<NotificationId>, QueueError>
where
    S: MetadataStore,
    Q: NotificationQueue,
{
    let Some(line) = first_preorder_line(order, store) else {
        debug!(order_id = %order.id, ?event, "no pre-order line items, nothing to send");
        return Ok(None);
    };

    let email = message::compose(event, order, admin_email);
    let notification = Notification::new(order.id, event, email, now);
    let id = queue.enqueue(notification)?;

    info!(
        order_id = %order.id,
        product_id = %line.product_id,
        ?event,
        notification_id = %id,
        "queued pre-order notification"
    );

    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use preorder_catalog::meta::keys;
    use preorder_core::{InMemoryMetadataStore, OrderId, ProductId};
    use preorder_sales::{LineItem, OrderStatus};

    use crate::queue::InMemoryNotificationQueue;

    fn now() -> DateTime<Utc> {
        "2026-01-15T12:00:00Z".parse().unwrap()
    }

    fn order_with(lines: Vec<LineItem>) -> Order {
        Order::new(OrderId::new(), OrderStatus::Pending, "buyer@example.com", lines)
    }

    fn line(product_id: ProductId) -> LineItem {
        LineItem {
            product_id,
            quantity: 2,
            name: "console".to_string(),
        }
    }

    #[test]
    fn queues_once_for_an_order_with_many_preorder_lines() {
        let store = InMemoryMetadataStore::new();
        let queue = InMemoryNotificationQueue::new();
        let a = ProductId::new();
        let b = ProductId::new();
        store.set(a, keys::IS_PRE_ORDER, "yes");
        store.set(b, keys::IS_PRE_ORDER, "yes");

        let order = order_with(vec![line(a), line(b)]);
        let id = notify_for_event(
            &store,
            &queue,
            LifecycleEvent::Placed,
            &order,
            "admin@shop.example",
            now(),
        )
        .unwrap();

        assert!(id.is_some());
        assert_eq!(queue.backlog().unwrap(), 1);
    }

    #[test]
    fn skips_orders_without_preorder_lines() {
        let store = InMemoryMetadataStore::new();
        let queue = InMemoryNotificationQueue::new();

        let order = order_with(vec![line(ProductId::new())]);
        let id = notify_for_event(
            &store,
            &queue,
            LifecycleEvent::Completed,
            &order,
            "admin@shop.example",
            now(),
        )
        .unwrap();

        assert_eq!(id, None);
        assert_eq!(queue.backlog().unwrap(), 0);
    }
}
