use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use crate::common::error::Result;
use crate::domain::{EntityId, PurchaseOutcome};
use crate::storage::{CatalogStore, ProductRepository};

/// Decrements stock for a purchase. The one write path over shared mutable
/// state in the catalog.
///
/// The whole load/check/decrement/persist sequence runs under a lock, so two
/// in-flight purchases cannot both observe the same stock level and lose a
/// decrement.
pub struct PurchaseProduct {
    products: Arc<dyn ProductRepository>,
    write_lock: Mutex<()>,
}

impl PurchaseProduct {
    pub fn new(store: &CatalogStore) -> Self {
        Self {
            products: store.products.clone(),
            write_lock: Mutex::new(()),
        }
    }

    /// Business rejections (unknown product, not enough stock) come back as
    /// unsuccessful outcomes, never as errors. Zero quantity is accepted and
    /// leaves stock untouched.
    pub async fn execute(&self, id: &EntityId, quantity: u32) -> Result<PurchaseOutcome> {
        let _guard = self.write_lock.lock().await;

        let Some(product) = self.products.find_by_id(id).await? else {
            return Ok(PurchaseOutcome::rejected("Product not found"));
        };

        let available = match product.available_quantity {
            Some(available) => available,
            None => return Ok(PurchaseOutcome::rejected("Not enough stock")),
        };
        if available < i64::from(quantity) {
            return Ok(PurchaseOutcome::rejected("Not enough stock"));
        }

        let remaining = available - i64::from(quantity);
        let updated = self
            .products
            .update(&product.id, json!({ "availableQuantity": remaining }))
            .await?;
        debug!(id = %product.id, quantity, remaining, "purchase completed");
        Ok(PurchaseOutcome::completed(updated))
    }
}
