//! Command-line interface for dealscope
//!
//! # Usage
//!
//! ```bash
//! # Offline run against a canned profile
//! dealscope analyze --demo agritech
//!
//! # Extract from a document with an OpenAI-compatible endpoint
//! export OPENAI_API_KEY="..."
//! export OPENAI_API_BASE="http://localhost:1234/v1"
//! dealscope analyze --file memo.txt --provider openai --model your-model --format json
//! ```

mod render;

use anyhow::{Context, bail};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use deal_engine::{
    AnalysisInput, DemoProfile, EngineConfig, Orchestrator, ProgressObserver, ReferenceData,
};
use deal_llm::LLMProvider;
use deal_llm::providers::{AnthropicProvider, OpenAIConfig, OpenAIProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dealscope", version)]
#[command(about = "Multi-agent investment analysis for startup pitch documents", long_about = None)]
struct Cli {
    /// Log filter, overrides DEALSCOPE_LOG
    #[arg(long, global = true, value_name = "FILTER")]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a document or a demo profile
    Analyze(AnalyzeArgs),
    /// List the demo profiles
    Demos,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "demo"])))]
struct AnalyzeArgs {
    /// Pitch document to analyze (plain text)
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Demo profile to analyze instead of a document
    #[arg(long, value_name = "NAME")]
    demo: Option<DemoProfile>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Generative-text provider used for extraction and qualitative calls
    #[arg(long, value_enum, default_value_t = ProviderKind::Offline)]
    provider: ProviderKind,

    /// Model name, overrides DEALSCOPE_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Reference tables (JSON) replacing the built-in set
    #[arg(long, value_name = "PATH")]
    reference: Option<PathBuf>,

    /// Do not print progress to stderr
    #[arg(long, short)]
    quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ProviderKind {
    Offline,
    Openai,
    Anthropic,
}

impl ProviderKind {
    /// Model used when neither --model nor DEALSCOPE_MODEL is given
    fn default_model(self) -> Option<&'static str> {
        match self {
            Self::Openai => Some("gpt-4o-mini"),
            Self::Offline | Self::Anthropic => None,
        }
    }

    fn build(self) -> anyhow::Result<Option<Arc<dyn LLMProvider>>> {
        let provider: Arc<dyn LLMProvider> = match self {
            Self::Offline => return Ok(None),
            Self::Openai => {
                let config = OpenAIConfig::from_env().context("OpenAI provider configuration")?;
                Arc::new(OpenAIProvider::with_config(config)?)
            }
            Self::Anthropic => {
                Arc::new(AnthropicProvider::from_env().context("Anthropic provider configuration")?)
            }
        };
        Ok(Some(provider))
    }
}

fn engine_config(args: &AnalyzeArgs) -> anyhow::Result<EngineConfig> {
    let env_model = std::env::var("DEALSCOPE_MODEL").is_ok();
    let mut config = EngineConfig::default().with_env()?;

    if let Some(model) = &args.model {
        config.model.clone_from(model);
    } else if let (false, Some(model)) = (env_model, args.provider.default_model()) {
        config.model = model.to_string();
    }

    config.validate()?;
    Ok(config)
}

async fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let input = match (&args.file, args.demo) {
        (Some(path), _) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            AnalysisInput::Document(text)
        }
        (None, Some(profile)) => AnalysisInput::Demo(profile),
        (None, None) => bail!("either --file or --demo is required"),
    };

    let mut builder = Orchestrator::builder().config(engine_config(&args)?);
    if let Some(provider) = args.provider.build()? {
        builder = builder.provider(provider);
    }
    if let Some(path) = &args.reference {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let reference = ReferenceData::from_json_str(&json)
            .with_context(|| format!("invalid reference data in {}", path.display()))?;
        info!(version = %reference.version, "Loaded reference data");
        builder = builder.reference(Arc::new(reference));
    }
    let orchestrator = builder.build()?;

    let progress = |message: &str, percent: u8| eprintln!("[{percent:>3}%] {message}");
    let observer: Option<&dyn ProgressObserver> = if args.quiet { None } else { Some(&progress) };

    let bundle = orchestrator.analyze(&input, observer).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&bundle)?),
        OutputFormat::Text => print!("{}", render::text(&bundle)),
    }
    Ok(())
}

fn list_demos() {
    for profile in DemoProfile::ALL {
        println!("{:<10} {}", profile.name(), profile.description());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = deal_utils::Config::from_env().context("invalid logging configuration")?;
    if let Some(filter) = &cli.log {
        config = config.with_log_filter(filter.clone());
    }
    deal_utils::init_tracing_with(&config);

    match cli.command {
        Command::Analyze(args) => analyze(args).await,
        Command::Demos => {
            list_demos();
            Ok(())
        }
    }
}
