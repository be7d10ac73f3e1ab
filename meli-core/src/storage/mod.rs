pub mod factory;
pub mod filters;
pub mod json_file;
pub mod relational;
pub mod traits;

pub use factory::{build_store, file_store, seed_sqlite_from_files, CatalogStore};
pub use filters::{FilterMap, FilterValue};
pub use traits::{CommentStore, ProductRepository, Record, Repository};
