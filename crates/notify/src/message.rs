//! Per-event email composition.

use preorder_sales::{LifecycleEvent, Order};

use crate::mailer::OutboundEmail;

pub const ADMIN_PURCHASE_SUBJECT: &str = "Pre-order Product Purchase Notification";
pub const CUSTOMER_CONFIRMATION_SUBJECT: &str = "Pre-order Confirmation";
pub const CUSTOMER_COMPLETION_SUBJECT: &str = "Pre-order Product Confirmation";

/// Compose the one email a lifecycle event produces for an order that
/// contains a pre-order line.
///
/// `Placed` notifies the shop admin; `Processing` and `Completed` address
/// the order's billing email.
pub fn compose(event: LifecycleEvent, order: &Order, admin_email: &str) -> OutboundEmail {
    match event {
        LifecycleEvent::Placed => OutboundEmail {
            to: admin_email.to_string(),
            subject: ADMIN_PURCHASE_SUBJECT.to_string(),
            body: format!(
                "A pre-order product has been purchased. Order ID: {}",
                order.id
            ),
        },
        LifecycleEvent::Processing => OutboundEmail {
            to: order.billing_email.clone(),
            subject: CUSTOMER_CONFIRMATION_SUBJECT.to_string(),
            body: "Thank you for placing a pre-order. Your order will be processed \
                   as soon as the product becomes available."
                .to_string(),
        },
        LifecycleEvent::Completed => OutboundEmail {
            to: order.billing_email.clone(),
            subject: CUSTOMER_COMPLETION_SUBJECT.to_string(),
            body: format!("Thank you for your pre-order. Your order ID is: {}", order.id),
        },
    }
}
