use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use tt_runtime::io::{JsonLinesSource, TextFileSink};
use tt_runtime::metrics::{MetricsRegistry, StageTimer};
use tt_runtime::{init_tracing, run, Engine, ParsePolicy, TrendOptions};

/// Rank trending mentions and hashtags over sliding time windows.
#[derive(Debug, Parser)]
#[command(name = "trending", version)]
struct Args {
    /// Sliding window length in minutes
    #[arg(long, default_value_t = 30)]
    window_size: i64,
    /// Sliding window stride in minutes
    #[arg(long, default_value_t = 5)]
    window_freq: i64,
    /// Output file; one line per (type, window)
    #[arg(long)]
    save_to: PathBuf,
    /// JSON-lines file of {"json": ..., "is_retweet": ...} rows
    #[arg(long)]
    read_from: PathBuf,
    /// Include retweets
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    retweet: bool,
    /// Comma list; post text must contain one of these
    #[arg(long)]
    contains: Option<String>,
    /// Comma list; post text must contain none of these
    #[arg(long)]
    not_contains: Option<String>,
    /// Keep posts at or after this ISO-8601 instant
    #[arg(long)]
    start: Option<String>,
    /// Keep posts at or before this ISO-8601 instant
    #[arg(long)]
    stop: Option<String>,
    /// Comma list of entities left out of the aggregation
    #[arg(long)]
    filter_entities: Option<String>,
    #[arg(long, default_value_t = 10)]
    top_k: usize,
    /// Timely worker threads
    #[arg(long, default_value_t = 1)]
    workers: usize,
    #[arg(long, default_value_t = Engine::Dataflow)]
    engine: Engine,
    #[arg(long, default_value_t = ParsePolicy::Fail)]
    on_parse_error: ParsePolicy,
}

impl From<Args> for TrendOptions {
    fn from(args: Args) -> Self {
        TrendOptions {
            window_size: args.window_size,
            window_freq: args.window_freq,
            save_to: Some(args.save_to),
            read_from: Some(args.read_from),
            retweet: args.retweet,
            contains: args.contains,
            not_contains: args.not_contains,
            start: args.start,
            stop: args.stop,
            filter_entities: args.filter_entities,
            top_k: args.top_k,
            workers: args.workers,
            engine: args.engine,
            on_parse_error: args.on_parse_error,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let options = TrendOptions::from(Args::parse());
    let config = options.validate()?;
    info!(
        read_from = %config.read_from.display(),
        save_to = %config.save_to.display(),
        window_size_ms = config.settings.windows.size_ms(),
        window_freq_ms = config.settings.windows.freq_ms(),
        top_k = config.settings.top_k.k,
        "trending starting"
    );

    let metrics = MetricsRegistry::default();
    let timer = StageTimer::start();
    let mut source = JsonLinesSource::new(&config.read_from);
    let mut sink = TextFileSink::new(&config.save_to);
    let written = run(&config, &mut source, &mut sink, &metrics)?;

    let summary = metrics.snapshot().to_json_line("trending", Some(timer.elapsed()));
    info!(written, %summary, "final metrics summary");
    Ok(())
}
