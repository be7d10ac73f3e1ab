//! Single-purpose application operations invoked by the process front end.
//! Each one wraps one repository or service call; dependencies are injected
//! at construction.

pub mod purchase;
pub mod queries;

pub use purchase::PurchaseProduct;
pub use queries::{
    FindProductsByCategory, GetAllProducts, GetPaymentMethods, GetProduct, GetProductComments,
    GetReviewSummary, GetSeller, SearchProducts,
};
