use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::{ConfigOverrides, EvidenceConfig};
use evidence_citation::{CitationReport, ClaimCitations};
use evidence_protocol::{serialize_json_pretty, CommandResponse};
use report::ReportInput;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

mod config;
mod pipeline;
mod report;

#[derive(Parser)]
#[command(name = "evidence")]
#[command(about = "Email evidence ingestion, analytics and citation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./evidence.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Wrap output in a JSON envelope (implies --quiet)
    #[arg(long, global = true)]
    json: bool,

    /// Mailbox archive directory (overrides [archive].dir)
    #[arg(long, global = true)]
    archive_dir: Option<PathBuf>,

    /// Exhibit registry file (overrides [registry].path)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Claim bucket file (overrides [claims].path)
    #[arg(long, global = true)]
    claims: Option<PathBuf>,

    /// Graph snapshot file (overrides [graph].snapshot)
    #[arg(long, global = true)]
    graph_snapshot: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-actor message volume, continuance mentions and reply latency
    Stats,

    /// Threads grouped by normalized subject
    Threads,

    /// Citations per claim bucket
    Cite(CiteArgs),

    /// Claim × source-type corroboration matrix and suggested exhibits
    Corroborate,

    /// Markdown summary of statistics and corroboration
    Report(ReportArgs),
}

#[derive(Args)]
struct CiteArgs {
    /// Only this claim bucket
    #[arg(long)]
    claim: Option<String>,
}

#[derive(Args)]
struct ReportArgs {
    /// Write the report to a file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

/// What a command produced
enum Output {
    Data(Value),
    Markdown(String),
    Written { path: PathBuf, bytes: usize },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    if cli.json {
        cli.quiet = true;
    }
    init_logging(&cli);

    let json_output = cli.json;
    match run(cli).await {
        Ok(output) => emit(output, json_output),
        Err(err) if json_output => {
            println!(
                "{}",
                serialize_json_pretty(&CommandResponse::error(format!("{err:#}")))?
            );
            std::process::exit(1);
        }
        Err(err) => Err(err),
    }
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

async fn run(cli: Cli) -> Result<Output> {
    let mut config = EvidenceConfig::load(cli.config.as_deref())?;
    config.apply(ConfigOverrides {
        archive_dir: cli.archive_dir,
        registry: cli.registry,
        claims: cli.claims,
        graph_snapshot: cli.graph_snapshot,
    });

    match cli.command {
        Commands::Stats => run_stats(&config).await,
        Commands::Threads => run_threads(&config).await,
        Commands::Cite(args) => run_cite(&config, args).await,
        Commands::Corroborate => run_corroborate(&config).await,
        Commands::Report(args) => run_report(&config, args).await,
    }
}

async fn run_stats(config: &EvidenceConfig) -> Result<Output> {
    let corpus = pipeline::load_corpus(config).await;
    let stats = corpus.stats(&corpus.threads());
    Ok(Output::Data(serde_json::to_value(stats)?))
}

async fn run_threads(config: &EvidenceConfig) -> Result<Output> {
    let corpus = pipeline::load_corpus(config).await;
    let summaries: Vec<_> = corpus.threads().iter().map(|t| t.summary()).collect();
    Ok(Output::Data(serde_json::to_value(summaries)?))
}

async fn run_cite(config: &EvidenceConfig, args: CiteArgs) -> Result<Output> {
    let corpus = pipeline::load_corpus(config).await;
    let report = pipeline::cite(config, &corpus).await?;
    let claims: Vec<&ClaimCitations> = match &args.claim {
        Some(claim) => vec![report
            .claim(claim)
            .with_context(|| format!("Unknown claim bucket '{claim}'"))?],
        None => report.claims.iter().collect(),
    };
    Ok(Output::Data(citations_by_claim(&report, &claims)))
}

async fn run_corroborate(config: &EvidenceConfig) -> Result<Output> {
    let corpus = pipeline::load_corpus(config).await;
    let (_, matrix) = pipeline::corroborate(config, &corpus).await?;
    Ok(Output::Data(serde_json::to_value(matrix)?))
}

async fn run_report(config: &EvidenceConfig, args: ReportArgs) -> Result<Output> {
    let corpus = pipeline::load_corpus(config).await;
    let threads = corpus.threads();
    let stats = corpus.stats(&threads);
    let summaries: Vec<_> = threads.iter().map(|t| t.summary()).collect();
    let (citations, matrix) = pipeline::corroborate(config, &corpus).await?;

    let markdown = report::render_markdown(&ReportInput {
        ingest: &corpus.report,
        stats: &stats,
        threads: &summaries,
        matrix: &matrix,
        graph_status: citations.graph_status,
    });

    match args.out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &markdown)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            Ok(Output::Written {
                path,
                bytes: markdown.len(),
            })
        }
        None => Ok(Output::Markdown(markdown)),
    }
}

fn citations_by_claim(report: &CitationReport, claims: &[&ClaimCitations]) -> Value {
    let by_claim: serde_json::Map<String, Value> = claims
        .iter()
        .map(|c| {
            (
                c.claim.clone(),
                json!({
                    "label": c.label,
                    "emails": c.emails,
                    "documents": c.documents,
                    "graph": c.graph,
                }),
            )
        })
        .collect();
    json!({
        "claims": by_claim,
        "graphStatus": report.graph_status,
    })
}

fn emit(output: Output, json_output: bool) -> Result<()> {
    if json_output {
        let response = match output {
            Output::Data(data) => CommandResponse::ok(&data)?,
            Output::Markdown(markdown) => CommandResponse::ok(&json!({ "markdown": markdown }))?,
            Output::Written { path, bytes } => {
                let message = format!("Report written to {}", path.display());
                CommandResponse::ok_with_message(&json!({ "path": path, "bytes": bytes }), message)?
            }
        };
        println!("{}", serialize_json_pretty(&response)?);
        return Ok(());
    }

    match output {
        Output::Data(data) => println!("{}", serde_json::to_string_pretty(&data)?),
        Output::Markdown(markdown) => print!("{markdown}"),
        Output::Written { path, bytes } => {
            eprintln!("Report written to {} ({bytes} bytes)", path.display())
        }
    }
    Ok(())
}
