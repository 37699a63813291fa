use anyhow::Result;
use clap::Parser;
use tracing::info;

use tt_core::time::MILLIS_PER_MINUTE;
use tt_core::RawRecord;
use tt_runtime::metrics::{MetricsRegistry, StageTimer};
use tt_runtime::{init_tracing, run_engine, Engine, TrendOptions};
use tt_views::format_group;

/// Run the trend pipeline over a deterministic synthetic feed and print the result lines.
#[derive(Debug, Parser)]
#[command(name = "trend_demo")]
struct Args {
    #[arg(long, default_value_t = 2_000)]
    posts: u64,
    #[arg(long, default_value_t = 2)]
    workers: usize,
    #[arg(long, default_value_t = Engine::Dataflow)]
    engine: Engine,
    #[arg(long, default_value_t = 3)]
    top_k: usize,
}

const HANDLES: [&str; 6] = ["NASA", "esa", "SpaceX", "jaxa", "isro", "RocketLab"];
const TAGS: [&str; 5] = ["Launch", "mars", "moon", "ISS", "starship"];
// 2016-01-01T00:00:00Z
const FEED_START_MS: i64 = 1_451_606_400_000;

fn synthetic_feed(posts: u64) -> Vec<RawRecord> {
    (0..posts)
        .map(|i| {
            // Skew: lower indexes dominate, and the favourite drifts every 200 posts.
            let drift = (i / 200) as usize;
            let handle = HANDLES[((i * i + drift as u64) % 7 % 6) as usize];
            let tag = TAGS[(drift + (i % 3) as usize) % TAGS.len()];
            let ts = FEED_START_MS + (i as i64) * 45_000;
            let json = serde_json::json!({
                "timestamp_ms": ts.to_string(),
                "text": format!("update {i} from @{handle} #{tag}"),
                "entities": {
                    "user_mentions": [{ "screen_name": handle }],
                    "hashtags": [{ "text": tag }],
                },
            });
            RawRecord::new(json.to_string(), i % 10 == 0)
        })
        .collect()
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    info!(posts = args.posts, workers = args.workers, "trend_demo starting");

    let options = TrendOptions {
        window_size: 30,
        window_freq: 10,
        retweet: false,
        top_k: args.top_k,
        ..TrendOptions::default()
    };
    let settings = options.settings()?;
    let metrics = MetricsRegistry::default();
    let timer = StageTimer::start();

    let feed = synthetic_feed(args.posts);
    let groups = run_engine(args.engine, args.workers, feed, &settings, &metrics)?;
    for group in &groups {
        println!("{}", format_group(group));
    }

    let elapsed = timer.elapsed();
    info!(
        windows_per_event = settings.windows.windows_per_event(),
        span_minutes = (args.posts as i64 * 45_000) / MILLIS_PER_MINUTE,
        "feed summary"
    );
    let final_snapshot = metrics.snapshot();
    info!(summary = %final_snapshot.to_json_line("trend_demo", Some(elapsed)), "final metrics summary");
    Ok(())
}
