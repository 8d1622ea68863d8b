//! Logging flags and tracing subscriber setup for the `playground` binary.

use std::{io, sync::Once};

use clap::{ArgAction, Args, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Timestamp, level, target and fields.
    #[default]
    Full,
    /// Level and message only.
    Compact,
    /// One JSON object per event.
    Json,
}

/// Logging arguments shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct LogArgs {
    /// Increase logging verbosity (1=ERROR, 2=WARN, 3=INFO, 4=DEBUG, 5=TRACE).
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        default_value = "3",
        env = "PLAYGROUND_LOG_LEVEL",
        global = true
    )]
    pub level: u8,

    /// Log output format.
    #[arg(long = "log-format", default_value = "full", env = "PLAYGROUND_LOG_FORMAT", global = true)]
    pub format: LogFormat,
}

impl Default for LogArgs {
    fn default() -> Self {
        Self { level: 3, format: LogFormat::Full }
    }
}

impl LogArgs {
    /// Maps the verbosity count to a level filter.
    pub const fn level_filter(&self) -> LevelFilter {
        match self.level {
            0 => LevelFilter::OFF,
            1 => LevelFilter::ERROR,
            2 => LevelFilter::WARN,
            3 => LevelFilter::INFO,
            4 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Installs the global subscriber. `RUST_LOG` overrides the verbosity.
    pub fn init_tracing_subscriber(&self) -> eyre::Result<()> {
        let filter =
            EnvFilter::builder().with_default_directive(self.level_filter().into()).from_env_lossy();

        let base = tracing_subscriber::fmt::layer().with_writer(io::stderr);
        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.format {
            LogFormat::Full => Box::new(base),
            LogFormat::Compact => Box::new(base.compact()),
            LogFormat::Json => Box::new(base.json()),
        };

        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
            .map_err(|e| eyre::eyre!("Failed to initialize tracing subscriber: {}", e))
    }
}

/// Initialize tracing for tests. Only the first call has an effect.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter =
            EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy();

        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}
