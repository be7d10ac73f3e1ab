use std::sync::Arc;

use crate::common::error::Result;
use crate::domain::{Comment, EntityId, PaymentMethod, Product, ReviewSummary, Seller};
use crate::storage::{CatalogStore, CommentStore, ProductRepository, Repository};

pub struct GetProduct {
    products: Arc<dyn ProductRepository>,
}

impl GetProduct {
    pub fn new(store: &CatalogStore) -> Self {
        Self {
            products: store.products.clone(),
        }
    }

    /// Absence is a valid `None` result, not an error.
    pub async fn execute(&self, id: &EntityId) -> Result<Option<Product>> {
        self.products.find_by_id(id).await
    }
}

pub struct GetAllProducts {
    products: Arc<dyn ProductRepository>,
}

impl GetAllProducts {
    pub fn new(store: &CatalogStore) -> Self {
        Self {
            products: store.products.clone(),
        }
    }

    pub async fn execute(&self) -> Result<Vec<Product>> {
        self.products.find_all().await
    }
}

pub struct SearchProducts {
    products: Arc<dyn ProductRepository>,
}

impl SearchProducts {
    pub fn new(store: &CatalogStore) -> Self {
        Self {
            products: store.products.clone(),
        }
    }

    /// A blank query yields nothing. "No query" and "match everything" are
    /// different requests; the second one is `GetAllProducts`.
    pub async fn execute(&self, query: &str) -> Result<Vec<Product>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.products.search(query).await
    }
}

pub struct FindProductsByCategory {
    products: Arc<dyn ProductRepository>,
}

impl FindProductsByCategory {
    pub fn new(store: &CatalogStore) -> Self {
        Self {
            products: store.products.clone(),
        }
    }

    pub async fn execute(&self, category_id: &EntityId) -> Result<Vec<Product>> {
        self.products.find_by_category(category_id).await
    }
}

pub struct GetProductComments {
    comments: Arc<dyn CommentStore>,
}

impl GetProductComments {
    pub fn new(store: &CatalogStore) -> Self {
        Self {
            comments: store.comments.clone(),
        }
    }

    pub async fn execute(&self, product_id: &EntityId) -> Result<Vec<Comment>> {
        self.comments.product_comments(product_id).await
    }
}

pub struct GetReviewSummary {
    comments: Arc<dyn CommentStore>,
}

impl GetReviewSummary {
    pub fn new(store: &CatalogStore) -> Self {
        Self {
            comments: store.comments.clone(),
        }
    }

    pub async fn execute(&self, product_id: &EntityId) -> Result<ReviewSummary> {
        let comments = self.comments.product_comments(product_id).await?;
        Ok(ReviewSummary::from_comments(&comments))
    }
}

pub struct GetSeller {
    sellers: Arc<dyn Repository<Seller>>,
}

impl GetSeller {
    pub fn new(store: &CatalogStore) -> Self {
        Self {
            sellers: store.sellers.clone(),
        }
    }

    pub async fn execute(&self, id: &EntityId) -> Result<Option<Seller>> {
        self.sellers.find_by_id(id).await
    }
}

pub struct GetPaymentMethods {
    payment_methods: Arc<dyn Repository<PaymentMethod>>,
}

impl GetPaymentMethods {
    pub fn new(store: &CatalogStore) -> Self {
        Self {
            payment_methods: store.payment_methods.clone(),
        }
    }

    /// Enabled methods, most preferred first (ascending `priority`).
    pub async fn execute(&self) -> Result<Vec<PaymentMethod>> {
        let mut methods = self.payment_methods.find_all().await?;
        methods.retain(|method| method.enabled);
        methods.sort_by_key(|method| method.priority);
        Ok(methods)
    }
}
