use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatmetric_bedrock::oracle::BedrockOracle;
use chatmetric_bedrock::scoring::{RetryPolicy, ScoringClient};
use chatmetric_catalog::{CatalogTrigger, GlueCrawlerTrigger};
use chatmetric_cli::aws::{build_aws_config, validate_credentials};
use chatmetric_cli::config::{self, ChatmetricConfig, CredentialSource};
use chatmetric_core::models::score::ScoreScale;
use chatmetric_core::rubric::system_prompt;
use chatmetric_core::transcript::render;
use chatmetric_engine::{ClientJob, PipelineContext, load_conversations, run_all};
use chatmetric_storage::client::build_client;
use chatmetric_storage::records::S3RecordSource;
use chatmetric_storage::sink::S3ParquetSink;

#[derive(Parser)]
#[command(name = "chatmetric", version, about = "Grade survey conversations for insight")]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true, env = "CHATMETRIC_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score every configured client and replace its results.
    Score {
        /// Only run these clients (repeatable).
        #[arg(long = "client")]
        clients: Vec<String>,

        /// Do not start the catalog crawler afterwards.
        #[arg(long)]
        no_crawler: bool,
    },
    /// Print one client's transcripts without calling the model.
    Preview {
        client: String,

        #[arg(long)]
        limit: Option<usize>,
    },
    /// Validate credentials and show the effective configuration.
    Check,
    /// Write a starter config file.
    Init {
        #[arg(long)]
        region: String,
        #[arg(long)]
        source_base: String,
        #[arg(long)]
        export_base: String,
        #[arg(long)]
        model_id: String,
        #[arg(long = "client")]
        clients: Vec<String>,
        /// Use this AWS profile instead of the default credential chain.
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        crawler_name: Option<String>,
        /// Overwrite an existing config.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let path = config::config_path(cli.config.as_deref())?;

    match cli.command {
        Command::Score {
            clients,
            no_crawler,
        } => {
            let config = config::load_config(&path)?;
            score(&config, &clients, no_crawler).await
        }
        Command::Preview { client, limit } => {
            let config = config::load_config(&path)?;
            preview(&config, &client, limit).await
        }
        Command::Check => {
            let config = config::load_config(&path)?;
            check(&config).await
        }
        Command::Init {
            region,
            source_base,
            export_base,
            model_id,
            clients,
            profile,
            crawler_name,
            force,
        } => {
            if path.exists() && !force {
                return Err(eyre::eyre!(
                    "config already exists at {} (use --force to overwrite)",
                    path.display()
                ));
            }
            let credentials = match profile {
                Some(profile_name) => CredentialSource::Profile { profile_name },
                None => CredentialSource::DefaultChain,
            };
            let config = ChatmetricConfig {
                config_version: 0,
                region,
                credentials,
                source_base,
                export_base,
                clients,
                model_id,
                rubric_path: None,
                oracle_timeout_secs: 300,
                max_attempts: 3,
                concurrency: 4,
                crawler_name,
            };
            config::save_config(&path, &config)?;
            // Re-read so an invalid location is reported now, not on first run.
            config::load_config(&path)?;
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn score(config: &ChatmetricConfig, only: &[String], no_crawler: bool) -> Result<()> {
    let sdk_config = build_aws_config(&config.region, &config.credentials).await;
    let s3 = build_client(&sdk_config);
    let source = S3RecordSource::new(s3.clone());
    let sink = S3ParquetSink::new(s3);

    let oracle = Arc::new(BedrockOracle::new(&sdk_config, config.model_id.clone()));
    let scoring = ScoringClient::new(oracle)
        .with_timeout(config.oracle_timeout())
        .with_retry(RetryPolicy {
            max_attempts: config.max_attempts,
            ..RetryPolicy::default()
        });

    let source_base = config.source_base()?;
    let export_base = config.export_base()?;
    let jobs: Vec<ClientJob> = config
        .clients
        .iter()
        .filter(|c| only.is_empty() || only.contains(c))
        .map(|c| ClientJob::new(c.as_str(), &source_base, &export_base))
        .collect();
    if jobs.is_empty() {
        return Err(eyre::eyre!("no configured client matches the selection"));
    }

    let crawler = match (&config.crawler_name, no_crawler) {
        (Some(name), false) => Some(GlueCrawlerTrigger::new(&sdk_config, name.clone())),
        _ => None,
    };

    let ctx = PipelineContext {
        source: &source,
        sink: &sink,
        scoring,
        system_prompt: system_prompt(&config.rubric()?, ScoreScale::SURVEY),
        concurrency: config.concurrency,
    };

    info!(clients = jobs.len(), model_id = %config.model_id, "starting run");
    let summary = run_all(
        &ctx,
        &jobs,
        crawler.as_ref().map(|c| c as &dyn CatalogTrigger),
    )
    .await;
    drop(ctx);

    for client in &summary.clients {
        println!(
            "{}: {} scored, {} skipped -> {}",
            client.client,
            client.histogram.total(),
            client.skipped,
            client.receipt.key
        );
    }
    for failed in &summary.failed {
        println!("{}: FAILED ({})", failed.client, failed.error);
    }

    if summary.failed.is_empty() {
        Ok(())
    } else {
        Err(eyre::eyre!(
            "{} of {} clients failed",
            summary.failed.len(),
            jobs.len()
        ))
    }
}

async fn preview(config: &ChatmetricConfig, client: &str, limit: Option<usize>) -> Result<()> {
    let sdk_config = build_aws_config(&config.region, &config.credentials).await;
    let source = S3RecordSource::new(build_client(&sdk_config));
    let location = config.source_base()?.join_client(client);

    let conversations = load_conversations(&source, &location).await?;
    let shown = limit.unwrap_or(conversations.len());

    for conversation in conversations.iter().take(shown) {
        println!("== {} ({} messages)", conversation.session_id, conversation.len());
        print!("{}", render(conversation));
        println!();
    }
    println!("{} of {} sessions shown", shown.min(conversations.len()), conversations.len());
    Ok(())
}

async fn check(config: &ChatmetricConfig) -> Result<()> {
    let sdk_config = build_aws_config(&config.region, &config.credentials).await;
    let identity = validate_credentials(&sdk_config).await?;

    println!("account:     {}", identity.account_id);
    println!("principal:   {}", identity.arn);
    println!("region:      {}", config.region);
    println!("credentials: {}", config::describe_credentials(&config.credentials));
    println!("source:      {}", config.source_base()?);
    println!("export:      {}", config.export_base()?);
    println!("clients:     {}", config.clients.join(", "));
    println!("model:       {}", config.model_id);
    match &config.rubric_path {
        Some(path) => println!("rubric:      {}", path.display()),
        None => println!("rubric:      built-in"),
    }
    if let Some(name) = &config.crawler_name {
        println!("crawler:     {name}");
    }
    Ok(())
}
