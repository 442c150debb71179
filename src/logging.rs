//! Tracing subscriber setup
//!
//! Human-readable output goes to stderr. When a log file is given, the same
//! events are also written there as JSON lines through a non-blocking writer;
//! the returned guard must be kept alive until shutdown to flush it.

use std::path::Path;

use anyhow::{Context, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directives used when `RUST_LOG` is not set
const DEFAULT_DIRECTIVES: &[&str] = &["version_meta=info", "h2=warn", "hyper=warn", "reqwest=warn"];

fn env_filter() -> anyhow::Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();

    if std::env::var("RUST_LOG").is_err() {
        for directive in DEFAULT_DIRECTIVES {
            filter = filter.add_directive(directive.parse::<Directive>()?);
        }
    }

    Ok(filter)
}

pub fn init_logging(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("log path {:?} has no file name", path))?;

            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {:?}", dir))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
