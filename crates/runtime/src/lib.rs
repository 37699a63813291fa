//! Runtime bootstrap, configuration, I/O boundaries and the two execution engines.

use tracing::info;
use tracing_subscriber::EnvFilter;
use tt_core::{TrendError, TrendResult};

pub mod config;
pub mod dataflow;
pub mod io;
pub mod metrics;
pub mod pipeline;

pub use config::{Engine, ParsePolicy, PipelineSettings, TrendConfig, TrendOptions};
pub use pipeline::{run, run_engine};

pub fn init_tracing() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .try_init();
}

/// `RUST_LOG`-style directives, falling back to `info` when unset or unparsable.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Start a single-process timely runtime, run the closure once per worker and collect
/// each worker's result in worker order.
pub fn start_runtime<T, F>(workers: usize, f: F) -> TrendResult<Vec<T>>
where
    T: Send + 'static,
    F: Fn(usize, &mut timely::worker::Worker<timely::communication::allocator::Generic>) -> T
        + Send
        + Sync
        + 'static,
{
    let workers = workers.max(1);
    info!(%workers, "starting timely runtime");
    let guards = timely::execute(timely::Config::process(workers), move |worker| {
        let index = worker.index();
        f(index, worker)
    })
    .map_err(TrendError::Runtime)?;

    guards
        .join()
        .into_iter()
        .map(|res| res.map_err(TrendError::Runtime))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_honours_directives() {
        let filter = log_filter(Some("tt_views=debug"));
        assert!(filter.to_string().contains("tt_views=debug"), "{filter}");
    }

    #[test]
    fn log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).to_string(), "info");
    }
}
