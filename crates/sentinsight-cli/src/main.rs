mod display;
mod import;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sentinsight_ai::{HttpSentimentClassifier, OnnxSentimentClassifier, SentimentClassifier};
use sentinsight_core::{OpinionId, Scope};
use sentinsight_pipeline::{
    BatchPipeline, CancellationToken, PipelineConfig, RunRequest, Target, limit_from_signed,
};
use sentinsight_store::DuckStore;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "sentinsight", version)]
#[command(about = "Annotate course reviews with sentiment and rule-based categories")]
struct Cli {
    /// DuckDB database file holding the opinions.
    #[arg(long, global = true, env = "SENTINSIGHT_DB", default_value = "sentinsight.duckdb")]
    db: PathBuf,

    /// Directory with a local ONNX sentiment model (model.onnx, tokenizer.json).
    #[arg(long, global = true, env = "SENTINSIGHT_MODEL_DIR", conflicts_with = "inference_url")]
    model_dir: Option<PathBuf>,

    /// Text-classification endpoint to use instead of a local model.
    #[arg(long, global = true, env = "SENTINSIGHT_INFERENCE_URL")]
    inference_url: Option<String>,

    /// Model name reported for the remote endpoint.
    #[arg(long, global = true, default_value = "remote-sentiment")]
    model_name: String,

    /// Opinions fetched per batch.
    #[arg(long, global = true, env = "SENTINSIGHT_BATCH_SIZE", default_value_t = 10)]
    batch_size: usize,

    /// Internal batch size for the sentiment model.
    #[arg(long, global = true, env = "SENTINSIGHT_CLASSIFIER_BATCH_SIZE", default_value_t = 8)]
    classifier_batch_size: usize,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone, Copy)]
struct LimitArg {
    /// Maximum opinions to process; zero or negative processes all.
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    limit: i64,
}

#[derive(Subcommand)]
enum Command {
    /// Annotate every pending opinion with sentiment and categories.
    Analyze {
        #[command(flatten)]
        limit: LimitArg,
        /// Pending opinions to pass over first.
        #[arg(long, default_value_t = 0)]
        skip: usize,
    },
    /// Annotate pending opinions about one professor.
    Professor {
        id: i64,
        #[command(flatten)]
        limit: LimitArg,
    },
    /// Annotate pending opinions whose course name contains NAME.
    Course {
        name: String,
        #[command(flatten)]
        limit: LimitArg,
    },
    /// Add categories to opinions that lack them. Needs no sentiment model.
    Categorize {
        #[command(flatten)]
        limit: LimitArg,
    },
    /// Show pending counts.
    Stats {
        #[arg(long, conflicts_with = "course")]
        professor: Option<i64>,
        #[arg(long)]
        course: Option<String>,
    },
    /// Print one opinion with its annotations.
    Show { id: String },
    /// Load opinions from a JSON array file.
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    info!("sentinsight v{}", env!("CARGO_PKG_VERSION"));

    let store = DuckStore::open_persistent(&cli.db)
        .with_context(|| format!("opening {}", cli.db.display()))?;

    match &cli.command {
        Command::Analyze { limit, skip } => {
            let request = RunRequest::new(Scope::All, Target::Full)
                .with_limit(limit_from_signed(limit.limit))
                .with_skip(*skip);
            run(&cli, &store, request).await
        }
        Command::Professor { id, limit } => {
            let request = RunRequest::new(Scope::Professor(*id), Target::Full)
                .with_limit(limit_from_signed(limit.limit));
            run(&cli, &store, request).await
        }
        Command::Course { name, limit } => {
            let request = RunRequest::new(Scope::Course(name.clone()), Target::Full)
                .with_limit(limit_from_signed(limit.limit));
            run(&cli, &store, request).await
        }
        Command::Categorize { limit } => {
            let request = RunRequest::new(Scope::All, Target::CategorizationOnly)
                .with_limit(limit_from_signed(limit.limit));
            run(&cli, &store, request).await
        }
        Command::Stats { professor, course } => {
            let scope = match (professor, course) {
                (Some(id), _) => Scope::Professor(*id),
                (None, Some(name)) => Scope::Course(name.clone()),
                (None, None) => Scope::All,
            };
            let classifier = load_classifier(&cli)?;
            let mut pipeline = BatchPipeline::new(&store, pipeline_config(&cli));
            if let Some(c) = classifier.as_deref() {
                pipeline = pipeline.with_classifier(c);
            }
            let stats = pipeline.pending(&scope).await?;
            display::print_stats(&stats, cli.json)
        }
        Command::Show { id } => {
            let opinion = store
                .get_opinion(&OpinionId::new(id.as_str()))?
                .with_context(|| format!("no opinion with id {id}"))?;
            display::print_opinion(&opinion, cli.json)
        }
        Command::Import { file } => {
            let count = import::import_file(&store, file)?;
            eprintln!("  Imported {count} opinions into {}", cli.db.display());
            Ok(())
        }
    }
}

async fn run(cli: &Cli, store: &DuckStore, request: RunRequest) -> anyhow::Result<()> {
    let classifier = if request.target.needs_sentiment() {
        Some(load_classifier(cli)?.context(
            "no sentiment model configured: pass --model-dir or --inference-url",
        )?)
    } else {
        None
    };

    let mut pipeline = BatchPipeline::new(store, pipeline_config(cli));
    if let Some(c) = classifier.as_deref() {
        pipeline = pipeline.with_classifier(c);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current batch");
            on_interrupt.cancel();
        }
    });

    match pipeline.run(&request, &cancel).await {
        Ok(report) => display::print_report(&report, cli.json),
        Err(e) => {
            if let Some(partial) = e.partial_report() {
                display::print_report(partial, cli.json)?;
            }
            Err(e.into())
        }
    }
}

fn pipeline_config(cli: &Cli) -> PipelineConfig {
    PipelineConfig {
        batch_size: cli.batch_size,
        classifier_batch_size: cli.classifier_batch_size,
        ..Default::default()
    }
}

fn load_classifier(cli: &Cli) -> anyhow::Result<Option<Box<dyn SentimentClassifier>>> {
    if let Some(dir) = &cli.model_dir {
        return Ok(Some(Box::new(load_onnx(dir)?)));
    }
    if let Some(url) = &cli.inference_url {
        let timeout = PipelineConfig::default().classify_timeout;
        let classifier = HttpSentimentClassifier::new(url.clone(), cli.model_name.clone(), timeout)
            .context("building inference client")?;
        return Ok(Some(Box::new(classifier)));
    }
    Ok(None)
}

fn load_onnx(dir: &Path) -> anyhow::Result<OnnxSentimentClassifier> {
    OnnxSentimentClassifier::load(dir)
        .with_context(|| format!("loading sentiment model from {}", dir.display()))
}
