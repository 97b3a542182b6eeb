//! Product metadata collaborator (key-value fields owned by the host).
//!
//! The host commerce platform stores arbitrary string metadata against each
//! product. This engine never owns that storage; it reads and writes through
//! this trait. Absent keys and empty strings are equivalent ("not set"):
//! hosts commonly return an empty string for a missing key, so callers must
//! treat both the same.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::id::ProductId;

/// Key-value metadata store attached to products.
///
/// Writes are last-wins; the store gives no transactional guarantees beyond
/// per-key atomicity. Callers that must tolerate concurrent writers re-read
/// before writing (see the lifecycle sweep).
pub trait MetadataStore: Send + Sync {
    /// Read one metadata value. `None` and `Some("")` both mean "not set".
    fn get(&self, product_id: ProductId, key: &str) -> Option<String>;

    /// Write one metadata value (empty string clears it).
    fn set(&self, product_id: ProductId, key: &str, value: &str);

    /// All products whose stored value for `key` equals `value` exactly.
    fn products_where(&self, key: &str, value: &str) -> Vec<ProductId>;
}

impl<S> MetadataStore for Arc<S>
where
    S: MetadataStore + ?Sized,
{
    fn get(&self, product_id: ProductId, key: &str) -> Option<String> {
        (**self).get(product_id, key)
    }

    fn set(&self, product_id: ProductId, key: &str, value: &str) {
        (**self).set(product_id, key, value)
    }

    fn products_where(&self, key: &str, value: &str) -> Vec<ProductId> {
        (**self).products_where(key, value)
    }
}

/// In-memory metadata store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    entries: RwLock<HashMap<ProductId, HashMap<String, String>>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn get(&self, product_id: ProductId, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&product_id).and_then(|m| m.get(key)).cloned()
    }

    fn set(&self, product_id: ProductId, key: &str, value: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(product_id)
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    fn products_where(&self, key: &str, value: &str) -> Vec<ProductId> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|(_, m)| m.get(key).is_some_and(|v| v == value))
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_last_written_value() {
        let store = InMemoryMetadataStore::new();
        let id = ProductId::new();

        assert_eq!(store.get(id, "_is_pre_order"), None);

        store.set(id, "_is_pre_order", "yes");
        assert_eq!(store.get(id, "_is_pre_order").as_deref(), Some("yes"));

        store.set(id, "_is_pre_order", "no");
        assert_eq!(store.get(id, "_is_pre_order").as_deref(), Some("no"));
    }

    #[test]
    fn products_where_matches_exact_values_only() {
        let store = InMemoryMetadataStore::new();
        let a = ProductId::new();
        let b = ProductId::new();
        let c = ProductId::new();

        store.set(a, "_is_pre_order", "yes");
        store.set(b, "_is_pre_order", "no");
        store.set(c, "_pre_order_price", "10");

        let flagged = store.products_where("_is_pre_order", "yes");
        assert_eq!(flagged, vec![a]);
    }

    #[test]
    fn keys_are_scoped_per_product() {
        let store = InMemoryMetadataStore::new();
        let a = ProductId::new();
        let b = ProductId::new();

        store.set(a, "_pre_order_price", "19.99");
        assert_eq!(store.get(b, "_pre_order_price"), None);
    }
}
