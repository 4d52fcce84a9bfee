use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use shopdoc_render::asset::ResolutionEvent;
use shopdoc_render::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "shopdoc", about = "Repair-shop document renderer", version)]
struct Cli {
    /// JSON configuration file; `SHOPDOC_*` environment variables otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a document from a JSON record
    Render {
        #[command(subcommand)]
        document: DocumentCommand,
    },

    /// Spell an amount in Indian-scale words
    Words {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },

    /// Show every path probed while resolving a logo reference
    TraceLogo {
        /// Absolute path, web path or URL; the default logo when omitted
        reference: Option<String>,
    },
}

#[derive(Subcommand)]
enum DocumentCommand {
    /// Job sheet
    JobSheet {
        #[command(flatten)]
        target: TargetArgs,

        /// Copy type (customer, office, both); unknown keys print the customer copy
        #[arg(long, default_value = "customer")]
        copy: String,
    },

    /// Tax invoice
    Invoice {
        #[command(flatten)]
        target: TargetArgs,

        /// Copy type (original, duplicate, customer); the record's own copy
        /// type when omitted
        #[arg(long)]
        copy: Option<String>,
    },

    /// Estimate
    Estimate {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Input JSON record
    #[arg(short, long)]
    input: PathBuf,

    /// Paper format (a4, a5, thermal, thermal-2); unknown keys print A4
    #[arg(long, default_value = "a4")]
    format: String,

    /// Write the PDF here instead of the configured storage
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl TargetArgs {
    fn paper(&self) -> PaperFormat {
        PaperFormat::from_key(&self.format)
    }
}

async fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            log::debug!("Loading config from {}", path.display());
            EngineConfig::load(path)
                .await
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => {
            let config = EngineConfig::from_env();
            config.validate()?;
            Ok(config)
        }
    }
}

async fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Invalid record in {}", path.display()))
}

async fn render(config: &EngineConfig, request: DocumentRequest, output: Option<PathBuf>) -> Result<()> {
    let engine = RenderEngine::new(config)?;

    match output {
        Some(output) => {
            let pdf = engine.render(request).await?;
            tokio::fs::write(&output, &pdf.bytes)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Rendered {} page(s) → {}",
                pdf.page_count,
                output.display()
            );
        }
        None => {
            engine.prepare().await;
            let generated = engine.generate(request).await?;
            println!(
                "Rendered {} page(s) → {}",
                generated.page_count,
                generated.locator.stored_at.display()
            );
            println!("{}", generated.locator.url);
        }
    }

    Ok(())
}

fn trace_logo(config: &EngineConfig, reference: Option<&str>) {
    let observer = RecordingObserver::new();
    let resolver =
        AssetResolver::new(SearchRoots::from_config(config)).with_observer(Arc::new(observer.clone()));
    let resolved = resolver.resolve(reference);

    for event in observer.events() {
        match event {
            ResolutionEvent::Candidate { path, outcome } => {
                println!("  {}: {:?}", path.display(), outcome);
            }
            ResolutionEvent::RemoteNotFetched { url } => {
                println!("  {url}: not fetched, searching local copies");
            }
            ResolutionEvent::Unresolved { .. } => {}
        }
    }

    match resolved {
        Some(path) => println!("Resolved: {}", path.display()),
        None => println!("No usable logo found"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { document } => {
            let config = load_config(cli.config.as_deref()).await?;
            match document {
                DocumentCommand::JobSheet { target, copy } => {
                    let record: JobSheetRecord = read_record(&target.input).await?;
                    let copy = JobSheetCopy::from_key(&copy);
                    let request = DocumentRequest::job_sheet(record, target.paper(), copy);
                    render(&config, request, target.output).await?;
                }
                DocumentCommand::Invoice { target, copy } => {
                    let record: InvoiceRecord = read_record(&target.input).await?;
                    let copy = copy.as_deref().map(InvoiceCopy::from_key);
                    let request = DocumentRequest::invoice(record, target.paper(), copy);
                    render(&config, request, target.output).await?;
                }
                DocumentCommand::Estimate { target } => {
                    let record: EstimateRecord = read_record(&target.input).await?;
                    let request = DocumentRequest::estimate(record, target.paper());
                    render(&config, request, target.output).await?;
                }
            }
        }

        Commands::Words { amount } => {
            println!("{}", number_to_words(amount));
        }

        Commands::TraceLogo { reference } => {
            let config = load_config(cli.config.as_deref()).await?;
            trace_logo(&config, reference.as_deref());
        }
    }

    Ok(())
}
