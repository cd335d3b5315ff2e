//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// JSON-lines subscriber with timestamps, filtered by `RUST_LOG`.
pub fn subscriber<W>(writer: W) -> impl ::tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_writer(writer)
        .finish()
}

/// Initialize tracing/logging for the process, writing to stdout.
///
/// Returns whether this call installed the subscriber.
pub fn init() -> bool {
    init_with_writer(std::io::stdout)
}

/// Same as [`init`], but logs go to `writer`. Binaries whose stdout is their
/// result pass `std::io::stderr`.
pub fn init_with_writer<W>(writer: W) -> bool
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    subscriber(writer).try_init().is_ok()
}
