use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Glue error: {0}")]
    Glue(String),

    #[error("crawler {name} not found")]
    CrawlerNotFound { name: String },
}
