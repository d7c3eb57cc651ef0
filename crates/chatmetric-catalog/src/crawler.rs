use aws_sdk_glue::Client;
use tracing::info;

use chatmetric_core::BoxFuture;

use crate::error::CatalogError;

/// Outcome of a successful refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    Started,
    /// A run was already in progress and will see the new objects.
    AlreadyRunning,
}

/// Tells the downstream catalog that new results exist.
pub trait CatalogTrigger: Send + Sync {
    fn refresh(&self) -> BoxFuture<'_, Result<RefreshStatus, CatalogError>>;
}

/// Starts a named Glue crawler.
pub struct GlueCrawlerTrigger {
    client: Client,
    name: String,
}

impl GlueCrawlerTrigger {
    pub fn new(config: &aws_config::SdkConfig, name: impl Into<String>) -> Self {
        Self {
            client: Client::new(config),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<RefreshStatus, CatalogError> {
        match self.client.start_crawler().name(&self.name).send().await {
            Ok(_) => {
                info!(crawler = %self.name, "crawler started");
                Ok(RefreshStatus::Started)
            }
            Err(e) => {
                let err = e.into_service_error();
                if err.is_crawler_running_exception() {
                    info!(crawler = %self.name, "crawler already running");
                    Ok(RefreshStatus::AlreadyRunning)
                } else if err.is_entity_not_found_exception() {
                    Err(CatalogError::CrawlerNotFound {
                        name: self.name.clone(),
                    })
                } else {
                    Err(CatalogError::Glue(err.to_string()))
                }
            }
        }
    }
}

impl CatalogTrigger for GlueCrawlerTrigger {
    fn refresh(&self) -> BoxFuture<'_, Result<RefreshStatus, CatalogError>> {
        Box::pin(self.start())
    }
}
