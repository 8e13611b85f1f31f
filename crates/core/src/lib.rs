pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod feed;
pub mod resolver;

pub use catalog::{load_catalog, Catalog, CatalogError, IndustryTable};
pub use domain::product::{BaseRecord, IndustryRecord, RawQuantity};
pub use domain::recommendation::RecommendationResult;
pub use errors::{ApplicationError, InterfaceError, ResolveError};
pub use feed::{FeedError, FeedRow, UploadFeed};
pub use resolver::{resolve, RecommendationResolver};
