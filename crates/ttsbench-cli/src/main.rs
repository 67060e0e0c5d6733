use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ttsbench_benchmark::{
    catalog, create_provider, load_samples, BenchmarkRunner, ResultsStore, RunOptions, RunOutcome,
    PROVIDER_KEYS,
};
use ttsbench_core::{BenchConfig, CostEstimator, TtsProvider};

#[derive(Parser)]
#[command(name = "ttsbench")]
#[command(about = "TTS provider latency, quality and cost benchmark", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run benchmarks and merge them into the results file
    Run {
        /// Provider keys to benchmark (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        providers: Vec<String>,

        /// Languages to include (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        languages: Vec<String>,

        /// Measured iterations per sample
        #[arg(short, long)]
        iterations: Option<u32>,

        /// Warmup runs per sample
        #[arg(short, long)]
        warmup: Option<u32>,

        /// Output directory for metrics and audio
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Test sample YAML file
        #[arg(short, long)]
        samples: Option<PathBuf>,

        /// Benchmark config YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Re-run providers even when complete results exist
        #[arg(long)]
        force: bool,
    },

    /// Print a summary of the saved results
    Report {
        /// Output directory holding metrics/benchmark_results.json
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Benchmark config YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the cost comparison table
    Costs,

    /// List provider keys and their languages
    Providers,
}

struct RunArgs {
    providers: Vec<String>,
    languages: Vec<String>,
    iterations: Option<u32>,
    warmup: Option<u32>,
    output_dir: Option<PathBuf>,
    samples: Option<PathBuf>,
    config: Option<PathBuf>,
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            providers,
            languages,
            iterations,
            warmup,
            output_dir,
            samples,
            config,
            force,
        } => {
            cmd_run(RunArgs {
                providers,
                languages,
                iterations,
                warmup,
                output_dir,
                samples,
                config,
                force,
            })
            .await?
        }
        Commands::Report { output_dir, config } => cmd_report(output_dir, config)?,
        Commands::Costs => cmd_costs(),
        Commands::Providers => cmd_providers(),
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<BenchConfig> {
    match path {
        Some(p) => Ok(BenchConfig::load(p)?),
        None => Ok(BenchConfig::default()),
    }
}

async fn init_providers(keys: &[String]) -> Vec<(String, Box<dyn TtsProvider>)> {
    let mut providers = Vec::new();
    for key in keys {
        match create_provider(key).await {
            Ok(provider) => {
                info!("Initialized {}", provider.name());
                providers.push((key.clone(), provider));
            }
            Err(e) => warn!("Failed to initialize {}: {}", key, e),
        }
    }
    providers
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(iterations) = args.iterations {
        config.defaults.iterations = iterations;
    }
    if let Some(warmup) = args.warmup {
        config.defaults.warmup_runs = warmup;
    }
    if !args.languages.is_empty() {
        config.defaults.languages = args.languages;
    }
    if let Some(dir) = args.output_dir {
        config.paths.output_dir = dir;
    }
    if let Some(samples) = args.samples {
        config.paths.samples_file = samples;
    }
    if args.force {
        config.defaults.skip_existing = false;
    }

    let keys: Vec<String> = if args.providers.is_empty() {
        PROVIDER_KEYS.iter().map(|k| k.to_string()).collect()
    } else {
        args.providers
    };

    let providers = init_providers(&keys).await;
    if providers.is_empty() {
        anyhow::bail!("No providers initialized. Check API keys in .env");
    }

    let samples = load_samples(&config.paths.samples_file)?;
    info!(
        "Loaded {} samples from {:?}",
        samples.len(),
        config.paths.samples_file
    );

    let runner = BenchmarkRunner::new(
        providers,
        &config.paths.output_dir,
        RunOptions {
            iterations: config.defaults.iterations,
            warmup_runs: config.defaults.warmup_runs,
            skip_existing: config.defaults.skip_existing,
        },
    );

    println!();
    println!("Running benchmark...");
    println!("  Providers:  {}", runner.provider_keys().join(", "));
    println!("  Languages:  {}", config.defaults.languages.join(", "));
    println!("  Iterations: {}", config.defaults.iterations);
    println!("  Warmup:     {}", config.defaults.warmup_runs);
    println!("  Results:    {}", runner.results_path().display());
    println!("  Audio:      {}", runner.audio_dir().display());
    if !runner.existing().is_empty() {
        println!(
            "  Existing:   {} providers from {}",
            runner.existing().providers.len(),
            runner.existing().timestamp
        );
    }
    println!();

    let outcome = runner.run(&samples, &config.defaults.languages).await?;
    let path = runner.save(&outcome)?;

    print_outcome(&outcome);
    println!("Results saved to {}", path.display());
    println!();

    Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
    println!();
    println!("Benchmark Summary:");
    println!("{:-<78}", "");
    println!(
        "  {:<28} {:>8} {:>14} {:>10} {:>12}",
        "Provider", "Samples", "Latency (ms)", "RTF", "Cost (USD)"
    );
    println!("{:-<78}", "");
    for benchmark in outcome.results.values() {
        println!(
            "  {:<28} {:>8} {:>14.1} {:>9.2}x {:>12.6}",
            benchmark.provider,
            benchmark.results.len(),
            benchmark.total_latency_mean_ms(),
            benchmark.avg_realtime_factor(),
            benchmark.total_cost_usd()
        );
    }
    if !outcome.skipped.is_empty() {
        println!("  Skipped (existing results): {}", outcome.skipped.join(", "));
    }
    println!();
}

fn cmd_report(output_dir: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(config.as_ref())?;
    if let Some(dir) = output_dir {
        config.paths.output_dir = dir;
    }

    let path = config.results_path();
    let snapshot = ResultsStore::load(&path);
    if snapshot.is_empty() {
        println!("No results found at {}", path.display());
        return Ok(());
    }

    println!();
    println!("Results from {} ({} iterations)", snapshot.timestamp, snapshot.iterations);
    println!("{:-<86}", "");
    println!(
        "  {:<20} {:>8} {:>14} {:>10} {:>12}  {}",
        "Key", "Samples", "Latency (ms)", "RTF", "Cost (USD)", "Languages"
    );
    println!("{:-<86}", "");
    for key in snapshot.providers.keys() {
        match snapshot.entry(key) {
            Ok(Some(entry)) => println!(
                "  {:<20} {:>8} {:>14.1} {:>9.2}x {:>12.6}  {}",
                key,
                entry.results.len(),
                entry.total_latency_mean_ms,
                entry.avg_realtime_factor,
                entry.total_cost_usd,
                entry.languages_tested.join(",")
            ),
            Ok(None) => {}
            Err(e) => println!("  {:<20} unreadable entry: {}", key, e),
        }
    }
    println!();

    Ok(())
}

fn cmd_costs() {
    println!();
    println!("{}", CostEstimator::comparison_table());
}

fn cmd_providers() {
    println!();
    println!("Available Providers:");
    println!("{:-<78}", "");
    println!("  {:<18} {:<26} {:>10}  {}", "Key", "Name", "$/1M chars", "Languages");
    println!("{:-<78}", "");
    for (key, config) in catalog() {
        let streaming = if config.supports_streaming { " (streaming)" } else { "" };
        println!(
            "  {:<18} {:<26} {:>10.2}  {}{}",
            key,
            config.name,
            config.pricing_per_1m_chars,
            config.supported_languages.join(","),
            streaming
        );
    }
    println!();
}
