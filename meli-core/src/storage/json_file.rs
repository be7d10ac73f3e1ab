//! Flat-file backend: one pretty-printed JSON document per collection.
//!
//! Reads go back to disk on every call so out-of-band edits to the seed
//! files show up on the next request. Writes serialize the whole collection
//! to a temp file in the same directory and rename it over the original, so
//! a concurrent reader never observes a torn document.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::filters::FilterMap;
use super::traits::{merge_patch, next_id, CommentStore, ProductRepository, Record, Repository};
use crate::common::error::{CatalogError, Result};
use crate::domain::{Comment, EntityId, Product};

pub struct JsonFileRepository<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> JsonFileRepository<T> {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{}.json", T::COLLECTION)),
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    async fn load(&self) -> Result<Vec<T>> {
        read_or_empty(&self.path).await
    }

    async fn persist(&self, records: &[T]) -> Result<()> {
        write_pretty(&self.path, &serde_json::to_value(records)?).await
    }
}

/// Reads a whole collection, degrading to empty on a missing or malformed
/// file. Availability wins over strictness on the read path; writes stay
/// strict.
async fn read_or_empty<D: DeserializeOwned + Default>(path: &Path) -> Result<D> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "collection file missing, reading as empty");
            return Ok(D::default());
        }
        Err(err) => return Err(err.into()),
    };
    match serde_json::from_str(&raw) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            warn!(path = %path.display(), %err, "collection file unreadable, reading as empty");
            Ok(D::default())
        }
    }
}

/// Replaces `path` with the pretty-printed document via temp-then-rename.
async fn write_pretty(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let pretty = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, pretty.as_bytes()).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl<T: Record> Repository<T> for JsonFileRepository<T> {
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<T>> {
        let records = self.load().await?;
        Ok(records.into_iter().find(|r| r.id() == id))
    }

    async fn find_all(&self) -> Result<Vec<T>> {
        self.load().await
    }

    async fn find_by(&self, filters: &FilterMap) -> Result<Vec<T>> {
        let records = self.load().await?;
        if filters.is_empty() {
            return Ok(records);
        }
        let mut matched = Vec::new();
        for record in records {
            let doc = serde_json::to_value(&record)?;
            if filters.matches(&doc) {
                matched.push(record);
            }
        }
        Ok(matched)
    }

    async fn create(&self, mut record: T) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        record.set_id(EntityId::Int(next_id(&records)));
        let now = Utc::now();
        record.stamp_created(now);
        record.stamp_updated(now);
        records.push(record.clone());
        self.persist(&records).await?;
        debug!(collection = T::COLLECTION, id = %record.id(), "created record");
        Ok(record)
    }

    async fn update(&self, id: &EntityId, patch: Value) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let position = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| CatalogError::NotFound {
                collection: T::COLLECTION,
                id: id.to_string(),
            })?;
        let merged = merge_patch(serde_json::to_value(&records[position])?, patch);
        let mut updated: T = serde_json::from_value(merged)?;
        updated.stamp_updated(Utc::now());
        records[position] = updated.clone();
        self.persist(&records).await?;
        debug!(collection = T::COLLECTION, id = %id, "updated record");
        Ok(updated)
    }

    async fn delete(&self, id: &EntityId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let position = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| CatalogError::NotFound {
                collection: T::COLLECTION,
                id: id.to_string(),
            })?;
        records.remove(position);
        self.persist(&records).await?;
        debug!(collection = T::COLLECTION, id = %id, "deleted record");
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for JsonFileRepository<Product> {
    async fn search(&self, query: &str) -> Result<Vec<Product>> {
        let needle = query.trim().to_lowercase();
        let products = self.load().await?;
        Ok(products
            .into_iter()
            .filter(|p| {
                [&p.title, &p.description, &p.brand, &p.model]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect())
    }

    async fn find_by_category(&self, category_id: &EntityId) -> Result<Vec<Product>> {
        let products = self.load().await?;
        Ok(products
            .into_iter()
            .filter(|p| p.categories.iter().any(|c| c == category_id))
            .collect())
    }
}

/// Review side collection: a JSON object mapping product id to its comments.
pub struct JsonFileCommentStore {
    path: PathBuf,
}

impl JsonFileCommentStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("comments.json"),
        }
    }
}

#[async_trait]
impl CommentStore for JsonFileCommentStore {
    async fn product_comments(&self, product_id: &EntityId) -> Result<Vec<Comment>> {
        let map: BTreeMap<String, Vec<Comment>> = read_or_empty(&self.path).await?;
        Ok(map
            .into_iter()
            .find(|(key, _)| EntityId::from(key.as_str()) == *product_id)
            .map(|(_, comments)| comments)
            .unwrap_or_default())
    }
}

/// Raw documents of one collection file, for seeding other backends.
pub(crate) async fn read_documents(path: &Path) -> Result<Vec<Value>> {
    read_or_empty(path).await
}

/// Raw comment map of the side collection file.
pub(crate) async fn read_comment_map(path: &Path) -> Result<BTreeMap<String, Vec<Comment>>> {
    read_or_empty(path).await
}
