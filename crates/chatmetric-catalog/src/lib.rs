//! Post-batch catalog refresh.
//!
//! After results land, the query catalog is asked to pick up the new
//! objects. Today that means starting a Glue crawler.

pub mod crawler;
pub mod error;

pub use crawler::{CatalogTrigger, GlueCrawlerTrigger, RefreshStatus};
pub use error::CatalogError;
