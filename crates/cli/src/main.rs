//! apidoc-mcp CLI
//!
//! Command-line interface for turning API documentation into MCP services.

use anyhow::{Context, Result};
use apidoc_mcp_common::{FormatTag, PipelineConfig};
use apidoc_mcp_pipeline::{Pipeline, PipelineOutcome, RunOptions};
use clap::{Parser, ValueEnum};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "apidoc-mcp")]
#[command(version, about = "Convert API documentation into an MCP service", long_about = None)]
#[command(after_help = "EXAMPLES:\n  \
    # Convert a local OpenAPI document\n  \
    apidoc-mcp ./petstore.yaml\n\n  \
    # Convert a Markdown API description into a named service\n  \
    apidoc-mcp ./users.md --format markdown --name users\n\n  \
    # Crawl a documentation page without using the cache\n  \
    apidoc-mcp https://docs.example.com/api --format html --no-cache\n\n  \
    # Use a configuration file\n  \
    apidoc-mcp ./swagger.json --config apidoc-mcp.yaml")]
struct Cli {
    /// Path or URL of the API documentation
    input: String,

    /// Documentation format
    #[arg(short, long, value_enum, default_value_t = InputFormat::Auto)]
    format: InputFormat,

    /// Output directory (default ./O_MCP_SERVER_LIST)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Service name, used as title and output subfolder
    #[arg(short, long)]
    name: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Neither read nor write the document cache
    #[arg(long)]
    no_cache: bool,

    /// Cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// Detect from the source
    Auto,
    /// Swagger 2.0 JSON or YAML
    Swagger,
    /// OpenAPI 3.x JSON or YAML
    Openapi,
    /// Markdown API description
    Markdown,
    /// HTML documentation page
    Html,
}

impl InputFormat {
    fn tag(self) -> Option<FormatTag> {
        match self {
            InputFormat::Auto => None,
            InputFormat::Swagger => Some(FormatTag::Swagger),
            InputFormat::Openapi => Some(FormatTag::OpenApi),
            InputFormat::Markdown => Some(FormatTag::Markdown),
            InputFormat::Html => Some(FormatTag::Html),
        }
    }
}

fn init_tracing(verbose: bool) {
    let base_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| if verbose { "debug" } else { "info" }.to_string());
    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n{} {:#}", "✗ Conversion failed:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;
    debug!(?config, "effective configuration");

    println!("{} Converting: {}", "→".cyan(), cli.input);
    if let Some(tag) = cli.format.tag() {
        println!("{} Format: {}", "→".cyan(), tag.to_string().yellow());
    }
    if cli.verbose {
        println!("  Output: {}", config.output_dir.display());
        if config.cache_enabled {
            println!("  Cache: {}", config.cache_dir.display());
        } else {
            println!("  Cache: disabled");
        }
    }

    let base_url_env = config.base_url_env.clone();
    let pipeline = Pipeline::new(config).context("Failed to set up the pipeline")?;
    let options = RunOptions {
        format: cli.format.tag(),
        service_name: cli.name.clone(),
    };
    let outcome = pipeline
        .run(&cli.input, &options)
        .with_context(|| format!("Failed to convert {}", cli.input))?;

    print_summary(&outcome, cli.verbose);
    print_startup_guide(&outcome, &base_url_env);
    Ok(())
}

/// Defaults, then the config file, then command-line flags
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(cache_dir) = &cli.cache_dir {
        config.cache_dir = cache_dir.clone();
    }
    if cli.no_cache {
        config.cache_enabled = false;
    }
    Ok(config)
}

fn print_summary(outcome: &PipelineOutcome, verbose: bool) {
    let metrics = &outcome.metrics;

    println!("\n{}", "✓ MCP service generated!".green().bold());
    println!("\n{}", "Summary:".bold());
    println!(
        "  Service: {}",
        outcome.document.title().unwrap_or("API Service").yellow()
    );
    println!("  Endpoints: {}", metrics.endpoints_count);
    println!("  Generated functions: {}", metrics.generated_count);
    if metrics.incomplete_endpoints > 0 {
        println!(
            "  Skipped endpoints: {}",
            metrics.incomplete_endpoints.to_string().yellow()
        );
    }
    if metrics.cache_hit {
        println!("  Document: {}", "from cache".cyan());
    }

    println!("\n{}", "Timings:".bold());
    println!("  Parse: {}", seconds(metrics.parse_time));
    println!("  Convert: {}", seconds(metrics.convert_time));
    println!("  Generate: {}", seconds(metrics.generate_time));
    println!("  Total: {}", seconds(metrics.total_time));

    if verbose && !outcome.report.incomplete.is_empty() {
        println!("\n{}", "Skipped endpoints:".bold());
        for skipped in &outcome.report.incomplete {
            println!("  • {}: {}", skipped.label().cyan(), skipped.reason);
        }
    }

    println!("\n{}", "Generated files:".bold());
    for file in &outcome.report.files {
        println!("  {}", file.display());
    }
}

fn print_startup_guide(outcome: &PipelineOutcome, base_url_env: &str) {
    let server = outcome.output_dir.join("mcp_server.py");
    let base_url = outcome
        .document
        .servers()
        .into_iter()
        .next()
        .map(|(url, _)| url)
        .unwrap_or_else(|| "https://api.example.com".to_string());

    println!("\n{}", "Next steps:".bold());
    println!("  1. Install dependencies: pip install mcp httpx");
    println!("  2. Run the server: python {}", server.display());
    println!("  3. Or inspect it with: mcp dev {}", server.display());
    println!(
        "  4. Point it at the API: {}={} python {}",
        base_url_env,
        base_url,
        server.display()
    );
}

fn seconds(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}
