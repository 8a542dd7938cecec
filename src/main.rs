use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use peerwatch::{
    CommandSource, CycleOutcome, DryRunTransport, FileSource, Monitor, MonitorError,
    ReportSource, Settings, SignalCliTransport, StateStore, Transport,
};

#[derive(Parser, Debug)]
#[command(name = "peerwatch")]
#[command(about = "Notify subscribers when WireGuard peers reconnect")]
struct Args {
    /// Path to a TOML config file (default: /etc/peerwatch/config.toml, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the durable state file
    #[arg(long)]
    state: Option<PathBuf>,

    /// Path to the client registry (network_data.json)
    #[arg(long)]
    registry: Option<PathBuf>,

    /// WireGuard interface to sample (default: all)
    #[arg(short, long)]
    interface: Option<String>,

    /// Read the connectivity report from a file instead of running `wg show`
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log notifications instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Run a cycle every N seconds instead of once
    #[arg(short, long, value_name = "SECS", conflicts_with = "status")]
    watch: Option<u64>,

    /// Print the stored peer table and exit
    #[arg(long)]
    status: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_directive = if args.verbose {
        "peerwatch=debug"
    } else {
        "peerwatch=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    if let Some(state) = args.state.clone() {
        settings.paths.state = state;
    }
    if let Some(registry) = args.registry.clone() {
        settings.paths.registry = registry;
    }
    if let Some(interface) = args.interface.clone() {
        settings.sampler.interface = interface;
    }

    let store = StateStore::new(&settings.paths.state);

    if args.status {
        return print_status(&store);
    }

    let mut monitor = build_monitor(&args, &settings, store);

    match args.watch {
        Some(secs) => run_watch(&mut monitor, Duration::from_secs(secs.max(1))).await,
        None => run_once(&mut monitor).await,
    }
}

/// Wire the configured source and transport into a monitor.
fn build_monitor(args: &Args, settings: &Settings, store: StateStore) -> Monitor {
    let source: Box<dyn ReportSource> = match &args.report {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(CommandSource::from_settings(&settings.sampler)),
    };

    let transport: Box<dyn Transport> = if args.dry_run {
        Box::new(DryRunTransport)
    } else {
        Box::new(SignalCliTransport::from_settings(&settings.transport))
    };

    tracing::info!(
        state = %settings.paths.state.display(),
        registry = %settings.paths.registry.display(),
        source = %source.description(),
        transport = %transport.description(),
        "Starting peerwatch",
    );

    Monitor::new(&settings.paths.registry, store, source, transport)
        .with_thresholds(settings.thresholds)
}

/// Run a single cycle; fatal errors exit non-zero.
async fn run_once(monitor: &mut Monitor) -> Result<()> {
    match monitor.run_cycle().await {
        Ok(CycleOutcome::Bootstrapped { state_path }) => {
            println!(
                "Created blank state file at {}. Add subscribers and run again.",
                state_path.display()
            );
            Ok(())
        }
        Ok(CycleOutcome::Completed(_)) => Ok(()),
        Err(e) => {
            tracing::error!(error = %e, "Cycle failed");
            Err(e.into())
        }
    }
}

/// Run cycles on an interval until interrupted.
async fn run_watch(monitor: &mut Monitor, interval: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match monitor.run_cycle().await {
                    Ok(_) => {}
                    Err(MonitorError::Locked(path)) => {
                        tracing::warn!(lockfile = %path.display(), "Another cycle is running, skipping");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Cycle failed");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                return Ok(());
            }
        }
    }
}

/// Print the stored peer table.
fn print_status(store: &StateStore) -> Result<()> {
    let Some(state) = store.peek()? else {
        println!("No state file at {}", store.path().display());
        return Ok(());
    };

    println!(
        "{} peers, {} subscribers ({})",
        state.peers.len(),
        state.subscribers.len(),
        store.path().display()
    );
    for record in state.peers.values() {
        println!();
        println!("{}", record);
    }
    Ok(())
}
