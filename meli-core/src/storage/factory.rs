use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::json_file::{
    read_comment_map, read_documents, JsonFileCommentStore, JsonFileRepository,
};
use super::relational::SqliteCatalog;
use super::traits::{CommentStore, ProductRepository, Record, Repository};
use crate::common::error::Result;
use crate::config::{CatalogConfig, StorageBackend};
use crate::domain::{
    Category, Comment, PaymentMethod, PriceHistoryEntry, Product, ProductImage, Seller,
};

/// Every collection handle the catalog needs, wired against one backend.
///
/// Consumers depend on these traits only; which backend is live is decided
/// here, once, at startup. Backends are never mixed within one store.
pub struct CatalogStore {
    pub products: Arc<dyn ProductRepository>,
    pub categories: Arc<dyn Repository<Category>>,
    pub sellers: Arc<dyn Repository<Seller>>,
    pub images: Arc<dyn Repository<ProductImage>>,
    pub price_history: Arc<dyn Repository<PriceHistoryEntry>>,
    pub payment_methods: Arc<dyn Repository<PaymentMethod>>,
    pub comments: Arc<dyn CommentStore>,
}

pub fn build_store(config: &CatalogConfig) -> Result<CatalogStore> {
    match config.backend {
        StorageBackend::File => {
            info!(data_dir = %config.data_dir.display(), "using flat-file storage");
            Ok(file_store(&config.data_dir))
        }
        StorageBackend::Sqlite => {
            info!(path = %config.database_path.display(), "using sqlite storage");
            sqlite_store(&config.database_path)
        }
    }
}

pub fn file_store(data_dir: &Path) -> CatalogStore {
    CatalogStore {
        products: Arc::new(JsonFileRepository::<Product>::new(data_dir)),
        categories: Arc::new(JsonFileRepository::<Category>::new(data_dir)),
        sellers: Arc::new(JsonFileRepository::<Seller>::new(data_dir)),
        images: Arc::new(JsonFileRepository::<ProductImage>::new(data_dir)),
        price_history: Arc::new(JsonFileRepository::<PriceHistoryEntry>::new(data_dir)),
        payment_methods: Arc::new(JsonFileRepository::<PaymentMethod>::new(data_dir)),
        comments: Arc::new(JsonFileCommentStore::new(data_dir)),
    }
}

fn sqlite_store(path: &Path) -> Result<CatalogStore> {
    let catalog = SqliteCatalog::open(path)?;
    Ok(CatalogStore {
        products: Arc::new(catalog.repository::<Product>()),
        categories: Arc::new(catalog.repository::<Category>()),
        sellers: Arc::new(catalog.repository::<Seller>()),
        images: Arc::new(catalog.repository::<ProductImage>()),
        price_history: Arc::new(catalog.repository::<PriceHistoryEntry>()),
        payment_methods: Arc::new(catalog.repository::<PaymentMethod>()),
        comments: Arc::new(catalog.comment_store()),
    })
}

/// Copies the flat-file seed collections into the SQLite database,
/// preserving ids, so both backends answer the same queries.
pub async fn seed_sqlite_from_files(config: &CatalogConfig) -> Result<()> {
    let catalog = SqliteCatalog::open(&config.database_path)?;
    for collection in [
        Product::COLLECTION,
        Category::COLLECTION,
        Seller::COLLECTION,
        ProductImage::COLLECTION,
        PriceHistoryEntry::COLLECTION,
        PaymentMethod::COLLECTION,
    ] {
        let path = config.data_dir.join(format!("{collection}.json"));
        let docs = read_documents(&path).await?;
        let imported = catalog.import_documents(collection, &docs)?;
        info!(collection, imported, "seeded collection");
    }
    let map = read_comment_map(&config.data_dir.join("comments.json")).await?;
    let entries: Vec<(String, Vec<Comment>)> = map.into_iter().collect();
    let imported = catalog.import_comments(&entries)?;
    info!(imported, "seeded comments");
    Ok(())
}
