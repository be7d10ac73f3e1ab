use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::filters::FilterMap;
use crate::common::error::Result;
use crate::domain::{Comment, EntityId, Product};

/// A persisted entity: knows its collection name, exposes its identity, and
/// accepts audit stamps from the repository on create/update.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> &EntityId;
    fn set_id(&mut self, id: EntityId);
    fn stamp_created(&mut self, at: DateTime<Utc>);
    fn stamp_updated(&mut self, at: DateTime<Utc>);
}

macro_rules! impl_record {
    ($ty:ty, $collection:literal) => {
        impl Record for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> &EntityId {
                &self.id
            }

            fn set_id(&mut self, id: EntityId) {
                self.id = id;
            }

            fn stamp_created(&mut self, at: DateTime<Utc>) {
                self.created_at = Some(at);
            }

            fn stamp_updated(&mut self, at: DateTime<Utc>) {
                self.updated_at = Some(at);
            }
        }
    };
}

impl_record!(crate::domain::Product, "products");
impl_record!(crate::domain::Category, "categories");
impl_record!(crate::domain::Seller, "sellers");
impl_record!(crate::domain::ProductImage, "product_images");
impl_record!(crate::domain::PriceHistoryEntry, "price_history");
impl_record!(crate::domain::PaymentMethod, "payment_methods");

/// Uniform data access over one collection, independent of the backend.
///
/// Lookups never fail on absence; `update` and `delete` return
/// `CatalogError::NotFound` when no record carries the id. Every mutation
/// persists the full collection before returning.
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<T>>;
    async fn find_all(&self) -> Result<Vec<T>>;
    async fn find_by(&self, filters: &FilterMap) -> Result<Vec<T>>;
    /// Assigns the next numeric identity, stamps audit fields, appends, and
    /// persists. Returns the stored record.
    async fn create(&self, record: T) -> Result<T>;
    /// Shallow-merges `patch` over the stored document and persists.
    async fn update(&self, id: &EntityId, patch: Value) -> Result<T>;
    async fn delete(&self, id: &EntityId) -> Result<()>;
}

/// Product-collection queries beyond the generic contract.
#[async_trait]
pub trait ProductRepository: Repository<Product> {
    /// Case-insensitive substring match over title, description, brand, and
    /// model. Callers are expected to reject blank queries before this.
    async fn search(&self, query: &str) -> Result<Vec<Product>>;
    /// Products whose `categories` list contains the id (loose equality).
    async fn find_by_category(&self, category_id: &EntityId) -> Result<Vec<Product>>;
}

/// Read access to the review side collection, keyed by product id.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn product_comments(&self, product_id: &EntityId) -> Result<Vec<Comment>>;
}

/// Shallow JSON merge: top-level keys of `patch` overwrite the target's.
pub(crate) fn merge_patch(target: Value, patch: Value) -> Value {
    match (target, patch) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}

/// Next numeric identity: 1 + the highest numeric id, or 1 when empty.
/// Non-numeric ids do not participate.
pub(crate) fn next_id<T: Record>(records: &[T]) -> i64 {
    records
        .iter()
        .filter_map(|r| r.id().as_int())
        .max()
        .map_or(1, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_top_level_keys_only() {
        let merged = merge_patch(
            json!({"id": 1, "price": 100, "title": "a"}),
            json!({"price": 200}),
        );
        assert_eq!(merged, json!({"id": 1, "price": 200, "title": "a"}));
    }
}
