//! SQLite backend: one table per collection, records stored as JSON
//! documents, every operation parameterized SQL.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use tracing::{debug, warn};

use super::filters::{canonical, FilterMap, FilterValue};
use super::traits::{merge_patch, CommentStore, ProductRepository, Record, Repository};
use crate::common::error::{CatalogError, Result};
use crate::domain::{Comment, EntityId, Product};

/// Shared connection for the relational backend.
///
/// rusqlite is synchronous; the catalog's collections are small enough that
/// statements run inline on the executor behind a process-wide lock.
pub struct SqliteCatalog {
    conn: Arc<Mutex<Connection>>,
}

const COLLECTION_TABLES: &[&str] = &[
    "products",
    "categories",
    "sellers",
    "product_images",
    "price_history",
    "payment_methods",
];

impl SqliteCatalog {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        for table in COLLECTION_TABLES {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (id TEXT PRIMARY KEY, doc TEXT NOT NULL);"
            ))?;
        }
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS comments (product_id TEXT NOT NULL, doc TEXT NOT NULL);",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn repository<T: Record>(&self) -> SqliteRepository<T> {
        SqliteRepository {
            conn: self.conn.clone(),
            _marker: PhantomData,
        }
    }

    pub fn comment_store(&self) -> SqliteCommentStore {
        SqliteCommentStore {
            conn: self.conn.clone(),
        }
    }

    /// Bulk-loads collection documents, keeping their ids. Used when seeding
    /// the database from the flat-file collections.
    pub fn import_documents(&self, collection: &str, docs: &[Value]) -> Result<usize> {
        if !COLLECTION_TABLES.contains(&collection) {
            return Err(CatalogError::Database {
                message: format!("unknown collection: {collection}"),
            });
        }
        let conn = self.conn.lock().unwrap();
        let mut imported = 0;
        for doc in docs {
            let Some(id) = doc.get("id").and_then(canonical) else {
                warn!(collection, "skipping document without a scalar id");
                continue;
            };
            conn.execute(
                &format!("INSERT OR REPLACE INTO {collection} (id, doc) VALUES (?1, ?2)"),
                params![id, serde_json::to_string(doc)?],
            )?;
            imported += 1;
        }
        Ok(imported)
    }

    /// Replaces the review side collection with the given map.
    pub fn import_comments(&self, map: &[(String, Vec<Comment>)]) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM comments", [])?;
        let mut imported = 0;
        for (product_id, comments) in map {
            let key = EntityId::from(product_id.as_str()).canonical();
            for comment in comments {
                conn.execute(
                    "INSERT INTO comments (product_id, doc) VALUES (?1, ?2)",
                    params![key, serde_json::to_string(comment)?],
                )?;
                imported += 1;
            }
        }
        Ok(imported)
    }
}

pub struct SqliteRepository<T> {
    conn: Arc<Mutex<Connection>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> SqliteRepository<T> {
    /// Decodes rows, skipping any the document column no longer parses into.
    /// Same availability stance as the flat-file read path.
    fn decode_rows(docs: Vec<String>) -> Vec<T> {
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            match serde_json::from_str(&doc) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(collection = T::COLLECTION, %err, "skipping unreadable row");
                }
            }
        }
        records
    }

    fn select_docs(&self, where_clause: &str, params: Vec<SqlValue>) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let sql = if where_clause.is_empty() {
            format!("SELECT doc FROM {} ORDER BY rowid", T::COLLECTION)
        } else {
            format!(
                "SELECT doc FROM {} WHERE {} ORDER BY rowid",
                T::COLLECTION,
                where_clause
            )
        };
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut docs = Vec::new();
        while let Some(row) = rows.next()? {
            docs.push(row.get::<_, String>(0)?);
        }
        Ok(docs)
    }

    fn next_id(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("SELECT id FROM {}", T::COLLECTION))?;
        let mut rows = stmt.query([])?;
        let mut max = 0i64;
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            if let Some(n) = EntityId::from(id.as_str()).as_int() {
                max = max.max(n);
            }
        }
        Ok(max + 1)
    }

    fn store(&self, record: &T) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (id, doc) VALUES (?1, ?2)",
                T::COLLECTION
            ),
            params![record.id().canonical(), serde_json::to_string(record)?],
        )?;
        Ok(())
    }

    fn doc_by_id(&self, id: &EntityId) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("SELECT doc FROM {} WHERE id = ?1", T::COLLECTION))?;
        let mut rows = stmt.query(params![id.canonical()])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

/// WHERE clause of equality conjunctions over `json_extract`. Each filter
/// value compares both natively (so `1` matches `1.0`) and as text (so `1`
/// matches `"1"`), keeping SQL behavior aligned with the in-memory matcher.
fn filter_clause(filters: &FilterMap) -> (String, Vec<SqlValue>) {
    let mut clauses = Vec::new();
    let mut params = Vec::new();
    for (field, filter) in filters.iter() {
        let path = format!("$.{field}");
        let values: Vec<&Value> = match filter {
            FilterValue::One(value) => vec![value],
            FilterValue::Any(values) => values.iter().collect(),
        };
        let mut arms = Vec::new();
        for value in values {
            arms.push(
                "(json_extract(doc, ?) = ? OR CAST(json_extract(doc, ?) AS TEXT) = ?)".to_string(),
            );
            params.push(SqlValue::Text(path.clone()));
            params.push(to_native(value));
            params.push(SqlValue::Text(path.clone()));
            params.push(to_text(value));
        }
        clauses.push(format!("({})", arms.join(" OR ")));
    }
    (clauses.join(" AND "), params)
}

fn to_native(value: &Value) -> SqlValue {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::String(s) => SqlValue::Text(s.clone()),
        _ => SqlValue::Null,
    }
}

fn to_text(value: &Value) -> SqlValue {
    match canonical(value) {
        Some(text) => SqlValue::Text(text),
        None => SqlValue::Null,
    }
}

#[async_trait]
impl<T: Record> Repository<T> for SqliteRepository<T> {
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<T>> {
        match self.doc_by_id(id)? {
            Some(doc) => match serde_json::from_str(&doc) {
                Ok(record) => Ok(Some(record)),
                Err(err) => {
                    warn!(collection = T::COLLECTION, %id, %err, "skipping unreadable row");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<T>> {
        let docs = self.select_docs("", Vec::new())?;
        Ok(Self::decode_rows(docs))
    }

    async fn find_by(&self, filters: &FilterMap) -> Result<Vec<T>> {
        let (clause, params) = filter_clause(filters);
        let docs = self.select_docs(&clause, params)?;
        Ok(Self::decode_rows(docs))
    }

    async fn create(&self, mut record: T) -> Result<T> {
        record.set_id(EntityId::Int(self.next_id()?));
        let now = Utc::now();
        record.stamp_created(now);
        record.stamp_updated(now);
        self.store(&record)?;
        debug!(collection = T::COLLECTION, id = %record.id(), "created record");
        Ok(record)
    }

    async fn update(&self, id: &EntityId, patch: Value) -> Result<T> {
        let doc = self.doc_by_id(id)?.ok_or_else(|| CatalogError::NotFound {
            collection: T::COLLECTION,
            id: id.to_string(),
        })?;
        let merged = merge_patch(serde_json::from_str(&doc)?, patch);
        let mut updated: T = serde_json::from_value(merged)?;
        updated.stamp_updated(Utc::now());
        self.store(&updated)?;
        debug!(collection = T::COLLECTION, id = %id, "updated record");
        Ok(updated)
    }

    async fn delete(&self, id: &EntityId) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", T::COLLECTION),
            params![id.canonical()],
        )?;
        if affected == 0 {
            return Err(CatalogError::NotFound {
                collection: T::COLLECTION,
                id: id.to_string(),
            });
        }
        debug!(collection = T::COLLECTION, id = %id, "deleted record");
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for SqliteRepository<Product> {
    async fn search(&self, query: &str) -> Result<Vec<Product>> {
        let needle = query.trim().to_lowercase();
        let docs = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn.prepare(
                "SELECT doc FROM products \
                 WHERE instr(lower(json_extract(doc, '$.title')), ?1) > 0 \
                    OR instr(lower(json_extract(doc, '$.description')), ?1) > 0 \
                    OR instr(lower(json_extract(doc, '$.brand')), ?1) > 0 \
                    OR instr(lower(json_extract(doc, '$.model')), ?1) > 0 \
                 ORDER BY rowid",
            )?;
            let mut rows = stmt.query(params![needle])?;
            let mut docs = Vec::new();
            while let Some(row) = rows.next()? {
                docs.push(row.get::<_, String>(0)?);
            }
            docs
        };
        Ok(Self::decode_rows(docs))
    }

    async fn find_by_category(&self, category_id: &EntityId) -> Result<Vec<Product>> {
        let docs = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn.prepare(
                "SELECT doc FROM products \
                 WHERE EXISTS (\
                     SELECT 1 FROM json_each(json_extract(doc, '$.categories')) \
                     WHERE CAST(json_each.value AS TEXT) = ?1\
                 ) ORDER BY rowid",
            )?;
            let mut rows = stmt.query(params![category_id.canonical()])?;
            let mut docs = Vec::new();
            while let Some(row) = rows.next()? {
                docs.push(row.get::<_, String>(0)?);
            }
            docs
        };
        Ok(Self::decode_rows(docs))
    }
}

pub struct SqliteCommentStore {
    conn: Arc<Mutex<Connection>>,
}

#[async_trait]
impl CommentStore for SqliteCommentStore {
    async fn product_comments(&self, product_id: &EntityId) -> Result<Vec<Comment>> {
        let docs = {
            let conn = self.conn.lock().unwrap();
            let mut stmt =
                conn.prepare("SELECT doc FROM comments WHERE product_id = ?1 ORDER BY rowid")?;
            let mut rows = stmt.query(params![product_id.canonical()])?;
            let mut docs = Vec::new();
            while let Some(row) = rows.next()? {
                docs.push(row.get::<_, String>(0)?);
            }
            docs
        };
        let mut comments = Vec::with_capacity(docs.len());
        for doc in docs {
            match serde_json::from_str(&doc) {
                Ok(comment) => comments.push(comment),
                Err(err) => warn!(%err, "skipping unreadable comment row"),
            }
        }
        Ok(comments)
    }
}
