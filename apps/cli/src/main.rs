use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use orator_core::{
    AnalysisClient, AnalysisResult, FsStore, HttpAnalysisBackend, InferenceCache, ProgressTicker,
    digest_file, format_report_readable, format_timestamp, group_events, render_timeline,
};

const TIMELINE_WIDTH: usize = 58;

#[derive(Parser)]
#[command(name = "orator")]
#[command(about = "Upload videos for speech analysis and browse the graded reports")]
struct Cli {
    /// Analysis server address (persisted for later runs)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a video file (served from cache when the content is known)
    Analyze {
        /// Path to the video file
        video: PathBuf,

        /// Re-upload even if a cached analysis exists
        #[arg(short, long)]
        force: bool,

        /// Print the raw analysis JSON instead of the report
        #[arg(long)]
        json: bool,
    },

    /// List cached analyses
    List,

    /// Show a cached analysis by digest prefix
    Show {
        /// Digest prefix, as printed by `list`
        digest: String,

        /// Print the raw analysis JSON instead of the report
        #[arg(long)]
        json: bool,
    },
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cache = match InferenceCache::load(Box::new(FsStore::open_default())) {
        Ok(cache) => cache,
        Err(e) => fail(format!(
            "could not load the state file at {}: {}",
            FsStore::default_path().display(),
            e
        )),
    };

    if let Some(server) = &cli.server {
        cache.set_server_address(server)?;
    }

    match cli.command {
        Commands::Analyze { video, force, json } => cmd_analyze(cache, &video, force, json).await,
        Commands::List => cmd_list(&cache),
        Commands::Show { digest, json } => cmd_show(&cache, &digest, json),
    }
}

async fn cmd_analyze(cache: InferenceCache, video: &Path, force: bool, json: bool) -> Result<()> {
    if !video.is_file() {
        fail(format!("no such video file: {}", video.display()));
    }

    println!(
        "\n{}  {}\n",
        style("orator").cyan().bold(),
        style("Speech Analyzer").dim()
    );

    // Step 1: digest the content
    let spinner = create_spinner("Digesting video...");
    let digest = match digest_file(video).await {
        Ok(digest) => digest,
        Err(e) => {
            spinner.finish_and_clear();
            fail(e);
        }
    };
    spinner.finish_with_message(format!(
        "{} Digested: {}",
        style("✓").green().bold(),
        style(digest.short()).yellow()
    ));

    // Step 2: fetch the analysis (cache or upload)
    let server = cache.server_address().to_string();
    let cached = !force && cache.has(&digest);
    let mut client = AnalysisClient::new(Box::new(HttpAnalysisBackend::new(&server)), cache);

    let result = if cached {
        let result = client.analyze_with_digest(digest, video, false).await?;
        println!(
            "{} Analyzed {}",
            style("✓").green().bold(),
            style("(cached)").dim()
        );
        result
    } else {
        let ticker = ProgressTicker::start(Duration::from_millis(250));
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos:>3}% {msg}")
                .unwrap(),
        );
        bar.set_message(format!("Analyzing on {}", server));

        let analyze = client.analyze_with_digest(digest, video, force);
        tokio::pin!(analyze);

        let outcome = loop {
            tokio::select! {
                outcome = &mut analyze => break outcome,
                _ = tokio::time::sleep(Duration::from_millis(120)) => {
                    bar.set_position(u64::from(ticker.value()));
                }
            }
        };

        // The estimate must stop on every exit, success or not.
        ticker.stop();
        bar.finish_and_clear();

        match outcome {
            Ok(result) => {
                println!("{} Analyzed", style("✓").green().bold());
                result
            }
            Err(e) => fail(e),
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }

    Ok(())
}

fn cmd_list(cache: &InferenceCache) -> Result<()> {
    println!(
        "\n{}  {}\n",
        style("orator").cyan().bold(),
        style("Analysis Library").dim()
    );

    if cache.is_empty() {
        println!("No analyses cached yet. Run {} first.", style("orator analyze <video>").cyan());
        return Ok(());
    }

    for entry in cache.entries() {
        let problems = group_events(&entry.data.detected_events)
            .iter()
            .map(|bucket| format!("{} ×{}", bucket.name, bucket.count))
            .collect::<Vec<_>>()
            .join(", ");
        let name = if entry.data.video_name.is_empty() {
            "(unnamed)"
        } else {
            &entry.data.video_name
        };

        println!(
            "{}  {:>3}  {:<10}  {:<24}  {}",
            style(entry.id.short()).yellow(),
            style(format!("{:.0}", entry.data.score)).bold(),
            entry.data.creation_date,
            name,
            style(problems).dim()
        );
    }

    let average = cache
        .entries()
        .iter()
        .map(|entry| entry.data.score)
        .sum::<f64>()
        / cache.len() as f64;
    println!(
        "\n{} videos · average score {:.0}",
        cache.len(),
        average
    );

    Ok(())
}

fn cmd_show(cache: &InferenceCache, prefix: &str, json: bool) -> Result<()> {
    let Some(entry) = cache.find_by_prefix(prefix) else {
        fail(format!("no cached analysis matches digest prefix {prefix:?}"));
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry.data)?);
    } else {
        print_report(&entry.data);
    }

    Ok(())
}

fn print_report(result: &AnalysisResult) {
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", format_report_readable(result));

    let duration = result.duration_hint();
    let rows = render_timeline(&result.detected_events, duration, TIMELINE_WIDTH);
    if !rows.is_empty() {
        println!("## Timeline (0:00 – {})\n", format_timestamp(duration));
        for row in rows {
            println!("{:<20} {}", row.name, style(row.bar).red());
        }
        println!();
    }
}
