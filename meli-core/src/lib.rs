pub mod app;
pub mod common;
pub mod config;
pub mod domain;
pub mod services;
pub mod storage;

pub use common::error::{CatalogError, Result};
pub use config::{CatalogConfig, StorageBackend};
pub use domain::*;
