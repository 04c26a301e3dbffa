//! Tracing bootstrap

use deploy_hook_core::api::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` wins over `logging.level`. The returned guard must be held
/// until exit so buffered file output gets flushed.
pub fn init_logging(cfg: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = build_filter(cfg)?;
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match cfg.directory() {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, &cfg.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()?;
            tracing::debug!(directory = %dir.display(), "file logging enabled");
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()?;
            Ok(None)
        }
    }
}

fn build_filter(cfg: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&cfg.level)?),
    }
}
