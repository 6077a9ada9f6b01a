use std::io::IsTerminal;

use clap::ValueEnum;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Wire format for log output: machine-readable JSON for production,
/// human-readable pretty output for development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Default log level when `RUST_LOG` is unset: `verbose` maps to debug,
/// `concise` to info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogVerbosity {
    Verbose,
    Concise,
}

impl LogVerbosity {
    fn default_directive(self) -> &'static str {
        match self {
            LogVerbosity::Verbose => "debug",
            LogVerbosity::Concise => "info",
        }
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the
/// verbosity-derived filter when set.
pub fn setup_tracing(format: LogFormat, verbosity: LogVerbosity) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_error::ErrorLayer::default());

    match format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
        LogFormat::Pretty => {
            let enable_color = std::io::stdout().is_terminal();
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_ansi(enable_color),
                )
                .try_init()?;
        }
    }

    Ok(())
}
