use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use slowlog_digest::{Analyzer, JsonFormatter, LimitPolicy, Report, TextFormatter};
use std::io::Write;
use std::time::{Duration, Instant};
use tokio::io::AsyncRead;

#[derive(Debug, Parser)]
#[clap(
    name = "slowlog-digest",
    version,
    about = "A fast MySQL slow query log profiler"
)]
struct Arguments {
    /// Slow log files to analyze; reads standard input when none are given
    #[clap(value_name = "LOG_FILES")]
    log_files: Vec<String>,

    /// Limit output to the given count or percentage of query classes (e.g. 10 or 5%)
    #[clap(long, value_name = "N|P%", default_value_t = LimitPolicy::default())]
    limit: LimitPolicy,

    /// Output format for results
    #[clap(long, value_enum, default_value = "text")]
    output_format: OutputFormat,

    /// Leave example queries out of the text report
    #[clap(long)]
    no_examples: bool,

    /// don't print anything to stderr, not even a progress spinner.
    #[clap(short = 'q', long)]
    quiet: bool,
}

#[derive(Debug, ValueEnum, Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

type Source = (String, Box<dyn AsyncRead + Unpin + Send>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Arguments::parse();
    let start_time = Instant::now();

    let sources = open_sources(&args).await?;

    let mut analyzer = Analyzer::new(true);
    if !args.quiet {
        analyzer = analyzer.with_progress(create_spinner());
    }

    for (name, reader) in sources {
        analyzer
            .analyze(reader, &name)
            .await
            .with_context(|| format!("Failed to read {}", name))?;
    }

    let report = analyzer.finalize(args.limit)?;
    output_results(&report, &args)?;

    debug!("Analysis completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

async fn open_sources(args: &Arguments) -> anyhow::Result<Vec<Source>> {
    if args.log_files.is_empty() {
        if !args.quiet {
            eprintln!("Reading from STDIN ...");
        }
        return Ok(vec![("STDIN".to_string(), Box::new(tokio::io::stdin()))]);
    }

    let mut sources: Vec<Source> = Vec::new();
    for path in &args.log_files {
        match tokio::fs::File::open(path).await {
            Ok(file) => {
                info!("Opened {}", path);
                sources.push((path.clone(), Box::new(file)));
            }
            Err(e) => {
                error!("Failed to open {}: {}", path, e);
                continue;
            }
        }
    }

    if sources.is_empty() {
        bail!("None of the given log files could be opened");
    }
    Ok(sources)
}

fn output_results(report: &Report, args: &Arguments) -> anyhow::Result<()> {
    let output = match args.output_format {
        OutputFormat::Json => JsonFormatter::new().with_pretty(true).format(report)?,
        OutputFormat::Text => TextFormatter::new()
            .with_examples(!args.no_examples)
            .format(report)?,
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} events {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
