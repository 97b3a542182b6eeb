//! `preorder-sales` — read-only order model and pre-order line detection.

pub mod order;

pub use order::{first_preorder_line, LifecycleEvent, LineItem, Order, OrderStatus};
