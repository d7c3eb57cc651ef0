//! One scoring run over every configured client.

use tracing::{error, info, warn};

use chatmetric_bedrock::scoring::ScoringClient;
use chatmetric_catalog::CatalogTrigger;
use chatmetric_core::aggregate::aggregate_sessions;
use chatmetric_core::locations::S3Location;
use chatmetric_core::models::message::Conversation;
use chatmetric_core::models::score::ScoreHistogram;
use chatmetric_storage::records::RecordSource;
use chatmetric_storage::sink::{ResultSink, WriteReceipt};

use crate::batch::score_batch;
use crate::error::PipelineError;

/// Collaborators for a run. Built before the run, dropped after it.
pub struct PipelineContext<'a> {
    pub source: &'a dyn RecordSource,
    pub sink: &'a dyn ResultSink,
    pub scoring: ScoringClient,
    /// Rubric plus answer-format rules.
    pub system_prompt: String,
    pub concurrency: usize,
}

/// Where one client's records come from and where its results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientJob {
    pub client: String,
    pub source: S3Location,
    pub destination: S3Location,
}

impl ClientJob {
    pub fn new(client: impl Into<String>, source_base: &S3Location, export_base: &S3Location) -> Self {
        let client = client.into();
        Self {
            source: source_base.join_client(&client),
            destination: export_base.join_client(&client),
            client,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSummary {
    pub client: String,
    pub conversations: usize,
    pub skipped: usize,
    pub histogram: ScoreHistogram,
    pub receipt: WriteReceipt,
}

#[derive(Debug, Clone)]
pub struct FailedClient {
    pub client: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub clients: Vec<ClientSummary>,
    pub failed: Vec<FailedClient>,
    /// Whether the catalog refresh was requested and accepted.
    pub catalog_refreshed: bool,
}

/// Read and aggregate every conversation stored under `location`.
pub async fn load_conversations(
    source: &dyn RecordSource,
    location: &S3Location,
) -> Result<Vec<Conversation>, PipelineError> {
    let records = source
        .read_records(location)
        .await
        .map_err(PipelineError::Read)?;
    Ok(aggregate_sessions(records))
}

/// Score one client's sessions and replace its results.
pub async fn run_client(
    ctx: &PipelineContext<'_>,
    job: &ClientJob,
) -> Result<ClientSummary, PipelineError> {
    let conversations = load_conversations(ctx.source, &job.source).await?;
    let total = conversations.len();
    info!(client = %job.client, conversations = total, "scoring batch");

    let report = score_batch(&ctx.scoring, &ctx.system_prompt, conversations, ctx.concurrency).await;

    let receipt = ctx
        .sink
        .write_results(&job.destination, &report.sessions)
        .await
        .map_err(PipelineError::Write)?;

    for (score, count) in report.histogram.iter() {
        info!(client = %job.client, score, count, "score histogram");
    }
    info!(
        client = %job.client,
        scored = report.sessions.len(),
        skipped = report.skipped.len(),
        key = %receipt.key,
        "client complete"
    );

    Ok(ClientSummary {
        client: job.client.clone(),
        conversations: total,
        skipped: report.skipped.len(),
        histogram: report.histogram,
        receipt,
    })
}

/// Run every job in order, then refresh the catalog once if anything was
/// written. A failing client does not stop the others.
pub async fn run_all(
    ctx: &PipelineContext<'_>,
    jobs: &[ClientJob],
    catalog: Option<&dyn CatalogTrigger>,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for job in jobs {
        match run_client(ctx, job).await {
            Ok(client) => summary.clients.push(client),
            Err(e) => {
                error!(client = %job.client, error = %e, "client run failed");
                summary.failed.push(FailedClient {
                    client: job.client.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if let Some(trigger) = catalog {
        if summary.clients.is_empty() {
            info!("nothing written, skipping catalog refresh");
        } else {
            match trigger.refresh().await {
                Ok(status) => {
                    info!(status = ?status, "catalog refresh requested");
                    summary.catalog_refreshed = true;
                }
                Err(e) => warn!(error = %e, "catalog refresh failed"),
            }
        }
    }

    summary
}
