//! Beacon Agent CLI Entry Point
//!
//! This is the main entry point for the Beacon Agent binary.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use beacon_agent::beacon::scheduler::{parse_target_url, phone_forever};
use beacon_agent::beacon::sink::{LogSink, StdoutSink, TracingSink};
use beacon_agent::cli::config::{Config, LogFormat, LoggingConfig, SinkKind};
use beacon_agent::cli::duration::format_duration;

#[derive(Parser)]
#[command(name = "beacon-agent")]
#[command(author, version, about = "Beacon Agent - Periodically phones home to a collector")]
struct Cli {
    /// Collector URL to phone home to
    url: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Timeout for individual request
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Delay between failed requests
    #[arg(long, value_parser = humantime::parse_duration)]
    retry: Option<Duration>,

    /// Delay between successful requests
    #[arg(long, value_parser = humantime::parse_duration)]
    interval: Option<Duration>,

    /// Public host:port for IP lookup
    #[arg(long)]
    lookup_addr: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Flags win over the config file
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.collector.url = Some(url.clone());
        }
        if let Some(timeout) = self.timeout {
            config.probe.timeout = timeout;
        }
        if let Some(retry) = self.retry {
            config.probe.retry = retry;
        }
        if let Some(interval) = self.interval {
            config.probe.interval = interval;
        }
        if let Some(lookup_addr) = &self.lookup_addr {
            config.probe.lookup_addr = lookup_addr.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default_config(),
    };
    cli.apply(&mut config);

    let Some(raw_url) = config.collector.url.clone() else {
        Cli::command()
            .error(ErrorKind::MissingRequiredArgument, "the collector <URL> is required")
            .exit();
    };

    init_logging(&config.logging, cli.verbose)?;

    let target = parse_target_url(&raw_url)?;
    let timings = config.timings();
    info!(
        url = %target,
        lookup_addr = %config.probe.lookup_addr,
        timeout = %format_duration(timings.timeout),
        "Starting Beacon Agent..."
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            cancel.cancel();
        }
    });

    let sink: Box<dyn LogSink> = match config.logging.sink {
        SinkKind::Tracing => Box::new(TracingSink),
        SinkKind::Stdout => Box::new(StdoutSink),
    };

    phone_forever(target, timings, &config.probe.lookup_addr, sink, &cancel)
        .await
        .context("Failed to start beacon")?;

    Ok(())
}

/// Diagnostics go to stderr so stdout carries only outcome lines
fn init_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let log_level = if verbose {
        Level::DEBUG
    } else {
        logging
            .level
            .parse::<Level>()
            .with_context(|| format!("Invalid log level: {}", logging.level))?
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true);

    match logging.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.compact().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish())?,
    }

    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term_signal) => {
                term_signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
