use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::common::error::{CatalogError, Result};
use crate::domain::{
    Category, EntityId, PriceHistoryEntry, PriceType, Product, ProductImage, Seller,
};
use crate::storage::{CatalogStore, FilterMap, ProductRepository, Repository};

/// A product joined with everything the detail page renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
    pub seller: Option<Seller>,
    pub images: Vec<ProductImage>,
    pub price_history: Vec<PriceHistoryEntry>,
    pub current_price: f64,
}

/// Listing row: the product plus its cover image and effective price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    #[serde(flatten)]
    pub product: Product,
    pub main_image: Option<ProductImage>,
    pub current_price: f64,
}

/// Composes denormalized product views out of the per-collection
/// repositories, and owns the price-update write path.
pub struct ProductDetailsService {
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn Repository<Category>>,
    sellers: Arc<dyn Repository<Seller>>,
    images: Arc<dyn Repository<ProductImage>>,
    price_history: Arc<dyn Repository<PriceHistoryEntry>>,
}

impl ProductDetailsService {
    pub fn new(store: &CatalogStore) -> Self {
        Self {
            products: store.products.clone(),
            categories: store.categories.clone(),
            sellers: store.sellers.clone(),
            images: store.images.clone(),
            price_history: store.price_history.clone(),
        }
    }

    /// Fetches the base product, joins category, seller, images, and price
    /// history concurrently, and derives the current price. A missing
    /// product is `CatalogError::NotFound`.
    pub async fn product_with_details(&self, id: &EntityId) -> Result<ProductDetails> {
        let mut product =
            self.products
                .find_by_id(id)
                .await?
                .ok_or_else(|| CatalogError::NotFound {
                    collection: "products",
                    id: id.to_string(),
                })?;
        product.enforce_single_selection();

        let by_product = FilterMap::new().field("productId", &product.id);
        let (category, seller, mut images, mut history) = tokio::try_join!(
            self.category_of(&product),
            self.seller_of(&product),
            self.images.find_by(&by_product),
            self.price_history.find_by(&by_product),
        )?;

        images.sort_by_key(|image| image.order);
        history.sort_by(|a, b| b.date.cmp(&a.date));
        let current_price = current_price(&history, product.price);

        Ok(ProductDetails {
            product,
            category,
            seller,
            images,
            price_history: history,
            current_price,
        })
    }

    /// Products carrying the category, each with cover image and current
    /// price attached. The per-product fetches run concurrently across the
    /// list; correctness is per product, batch efficiency is not promised.
    pub async fn products_by_category(&self, category_id: &EntityId) -> Result<Vec<ProductSummary>> {
        let products = self.products.find_by_category(category_id).await?;
        self.summarize(products).await
    }

    /// Products offered by the seller, same shape as `products_by_category`.
    pub async fn products_by_seller(&self, seller_id: &EntityId) -> Result<Vec<ProductSummary>> {
        let products = self
            .products
            .find_by(&FilterMap::new().field("sellerId", seller_id))
            .await?;
        self.summarize(products).await
    }

    /// Moves the product to a new price: updates the stored `price`, demotes
    /// every current history entry to historical, inserts the fresh current
    /// entry, and returns the recomposed view. Fails before touching history
    /// when the product does not exist.
    pub async fn update_price(&self, id: &EntityId, new_price: f64) -> Result<ProductDetails> {
        let product = self
            .products
            .update(id, json!({ "price": new_price }))
            .await?;

        let still_current = self
            .price_history
            .find_by(
                &FilterMap::new()
                    .field("productId", &product.id)
                    .field("type", "current"),
            )
            .await?;
        for entry in &still_current {
            self.price_history
                .update(&entry.id, json!({ "type": "historical" }))
                .await?;
        }

        self.price_history
            .create(PriceHistoryEntry {
                id: EntityId::default(),
                product_id: product.id.clone(),
                price: new_price,
                currency: "ARS".to_string(),
                date: Utc::now(),
                kind: PriceType::Current,
                created_at: None,
                updated_at: None,
            })
            .await?;

        debug!(id = %id, new_price, demoted = still_current.len(), "price updated");
        self.product_with_details(id).await
    }

    async fn category_of(&self, product: &Product) -> Result<Option<Category>> {
        match &product.category_id {
            Some(id) => self.categories.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn seller_of(&self, product: &Product) -> Result<Option<Seller>> {
        match &product.seller_id {
            Some(id) => self.sellers.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn summarize(&self, products: Vec<Product>) -> Result<Vec<ProductSummary>> {
        let summaries = join_all(
            products
                .into_iter()
                .map(|product| self.summary_of(product)),
        )
        .await;
        summaries.into_iter().collect()
    }

    async fn summary_of(&self, product: Product) -> Result<ProductSummary> {
        let by_product = FilterMap::new().field("productId", &product.id);
        let (mut images, mut history) = tokio::try_join!(
            self.images.find_by(&by_product),
            self.price_history.find_by(&by_product),
        )?;
        images.sort_by_key(|image| image.order);
        history.sort_by(|a, b| b.date.cmp(&a.date));
        let current_price = current_price(&history, product.price);
        let main_image = images
            .iter()
            .find(|image| image.is_main)
            .or_else(|| images.first())
            .cloned();
        Ok(ProductSummary {
            product,
            main_image,
            current_price,
        })
    }
}

/// Newest entry still marked current, else the base price. Expects history
/// sorted descending by date.
fn current_price(history: &[PriceHistoryEntry], base: f64) -> f64 {
    history
        .iter()
        .find(|entry| entry.kind == PriceType::Current)
        .map(|entry| entry.price)
        .unwrap_or(base)
}
