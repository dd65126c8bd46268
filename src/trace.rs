//! Tracing hooks for queue growth, compaction and eviction.
//!
//! Enable with `--features tracing`. Without the feature every macro expands
//! to nothing, so the hot paths carry no logging cost.

/// Install a `tracing` subscriber that prints queue events to stdout.
///
/// The filter is read from `RUST_LOG` and falls back to `cask=trace`. Intended
/// for tests and quick debugging sessions; applications should install their
/// own subscriber instead.
///
/// Panics if a global subscriber has already been installed.
#[cfg(feature = "tracing")]
#[cfg_attr(docsrs, doc(cfg(feature = "tracing")))]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cask=trace"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .init();
}

/// Install a `tracing` subscriber.
///
/// The `tracing` feature is disabled, so this does nothing.
#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use debug_noop as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use trace_noop as trace;
