use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use incident_intel::config::{Config, LoggingConfig, Resolved};
use incident_intel::engine::default_fix_id;
use incident_intel::report::{render_artifact, ExportFormat};
use incident_intel::{store, Engine, Incident};

#[derive(Parser)]
#[command(
    name = "incident-intel",
    about = "Incident intelligence engine: insights, related incidents, fix prediction and RCA reports",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (overrides INCIDENT_INTEL_CONFIG and ./incident-intel.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Incident data file (JSON)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind address
        #[arg(long)]
        bind: Option<String>,
    },

    /// List incidents in the data file
    List {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Show the prioritized insight feed for an incident
    Insights {
        /// Incident ID
        id: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Rank related past incidents
    Related {
        /// Incident ID
        id: String,

        /// Maximum number of related incidents
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Predict whether a fix will resolve an incident
    Predict {
        /// Incident ID
        id: String,

        /// Fix identifier (defaults to the first recommendation)
        #[arg(long)]
        fix: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Generate a root cause analysis report
    Report {
        /// Incident ID
        id: String,

        /// Output format: md, json or html
        #[arg(long, default_value = "md")]
        format: String,

        /// Write RCA-<reportId>.<ext> into this directory instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    // Logs go to stderr so stdout stays parseable.
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load(config: &Config) -> Result<Vec<Incident>> {
    store::load_incidents(&config.store.path)
        .with_context(|| "failed to load incident data (use --data or [store] path)")
}

fn locate<'a>(incidents: &'a [Incident], id: &str) -> Result<&'a Incident> {
    let (_, incident) = store::find(incidents, id)?;
    Ok(incident)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolved = match &cli.config {
        Some(path) => Resolved {
            config: Config::load(path)?,
            source: Some(path.clone()),
            fallbacks: Vec::new(),
        },
        None => Config::resolve(),
    };

    init_tracing(&resolved.config.logging);
    resolved.log();

    let mut config = resolved.config;
    if let Some(data) = cli.data {
        config.store.path = data;
    }
    let engine = Engine::from_config(&config);

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            tracing::info!(bind = %config.server.bind, "Starting incident-intel server");
            incident_intel::serve(&config).await?;
        }
        Commands::List { json } => {
            let incidents = load(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&incidents)?);
            } else if incidents.is_empty() {
                println!("No incidents found.");
            } else {
                println!("{:<24} | {:<8} | {:<24} | {:<10} | Status", "ID", "Severity", "Pattern", "Namespace");
                println!("{:-<24}-|-{:-<8}-|-{:-<24}-|-{:-<10}-|-{:-<8}", "", "", "", "", "");
                for i in &incidents {
                    println!(
                        "{:<24} | {:<8} | {:<24} | {:<10} | {}",
                        i.id, i.severity, i.pattern, i.resource.namespace, i.status
                    );
                }
            }
        }
        Commands::Insights { id, json } => {
            let incidents = load(&config)?;
            let current = locate(&incidents, &id)?;
            let insights = engine.insights(current, &incidents);
            if json {
                println!("{}", serde_json::to_string_pretty(&insights)?);
            } else {
                println!("\nInsights for {}", current.id);
                for insight in &insights {
                    println!("[{:>2}] {} {}", insight.priority, insight.icon, insight.text);
                }
                println!();
            }
        }
        Commands::Related { id, limit, json } => {
            let incidents = load(&config)?;
            let current = locate(&incidents, &id)?;
            let related = engine.related(current, &incidents, limit);
            if json {
                println!("{}", serde_json::to_string_pretty(&related)?);
            } else if related.is_empty() {
                println!("No related incidents found.");
            } else {
                println!("{:<24} | {:<5} | {:<10} | Reasons", "ID", "Score", "Confidence");
                println!("{:-<24}-|-{:-<5}-|-{:-<10}-|-{:-<40}", "", "", "", "");
                for r in &related {
                    println!(
                        "{:<24} | {:<5} | {:>9}% | {}",
                        r.incident.id,
                        r.similarity_score,
                        r.correlation_confidence,
                        r.match_reasons.join("; ")
                    );
                }
            }
        }
        Commands::Predict { id, fix, json } => {
            let incidents = load(&config)?;
            let current = locate(&incidents, &id)?;
            let fix = fix.unwrap_or_else(|| default_fix_id(current));
            let prediction = engine.predict(current, &fix, &incidents);
            if json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else {
                println!("\n=== Fix Success Prediction ===");
                println!("Fix:         {}", prediction.fix_id);
                println!("Probability: {}%", prediction.probability);
                println!("Confidence:  {}%", prediction.confidence.round());
                println!("Risk:        {}", prediction.risk);
                println!("\nFactors:");
                for f in &prediction.factors {
                    println!(
                        " - {:<22} score {:>5.1} x {:.2}  {}",
                        f.name, f.score, f.weight, f.description
                    );
                }
                println!("\n{}", prediction.explanation);
                println!("==============================\n");
            }
        }
        Commands::Report { id, format, out } => {
            let incidents = load(&config)?;
            let current = locate(&incidents, &id)?;
            let format: ExportFormat = format.parse()?;
            let report = engine.report(current);
            let artifact = render_artifact(&report, format)?;
            match out {
                Some(dir) => {
                    let path = dir.join(&artifact.filename);
                    std::fs::write(&path, &artifact.body)
                        .with_context(|| format!("failed to write report: {}", path.display()))?;
                    tracing::info!(path = %path.display(), mime = artifact.mime_type, "Report written");
                    println!("{}", path.display());
                }
                None => print!("{}", artifact.body),
            }
        }
    }

    Ok(())
}
