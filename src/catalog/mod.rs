pub mod models;
mod posts;

pub use models::{Post, PostSummary};
pub use posts::{Catalog, CatalogError};
