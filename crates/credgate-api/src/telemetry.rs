//! Tracing subscriber setup shared by the binaries

use credgate_core::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to the
/// credgate crates, with `tower_http` request traces at debug.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "credgate_api={level},credgate_core={level},audit=info,tower_http=debug",
            level = config.level
        )
        .into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // Already installed (tests, embedding): keep the existing subscriber
    let result = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {e}");
    }
}
