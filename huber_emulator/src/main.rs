//! # Huber Motor Emulator Binary
//!
//! Serves the Huber SMC command protocol over TCP, with a JSON backdoor for
//! test harnesses.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: protocol on 127.0.0.1:9999, backdoor on 127.0.0.1:10000
//! huber_emulator
//!
//! # Config file with a port override
//! huber_emulator --config config/huber.toml --port 5000
//!
//! # Verbose JSON logs
//! huber_emulator -v --json
//! ```

#![deny(warnings)]

use clap::Parser;
use huber_common::prelude::*;
use huber_emulator::core::{EmulatorContext, EmulatorCore};
use huber_emulator::error::EmulatorError;
use huber_emulator::server::{BackdoorServer, StreamServer};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Huber SMC motor controller emulator
#[derive(Parser, Debug)]
#[command(name = "huber_emulator")]
#[command(version)]
#[command(about = "Emulates a Huber SMC motor axis controller over TCP")]
#[command(long_about = None)]
struct Args {
    /// Path to the emulator configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to bind both listeners to
    #[arg(long)]
    bind: Option<String>,

    /// Port of the command protocol
    #[arg(short, long)]
    port: Option<u16>,

    /// Port of the JSON backdoor
    #[arg(long)]
    backdoor_port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Emulator failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), EmulatorError> {
    let args = Args::parse();

    let loaded = load_config(&args);
    let log_level = match &loaded {
        Ok(config) => Level::from(config.shared.log_level),
        Err(_) => Level::INFO,
    };
    setup_tracing(&args, log_level);
    let config = loaded?;

    info!(
        "{} emulator v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    let context = EmulatorContext::from_config(&config).into_shared();
    let mut core = EmulatorCore::new(
        context,
        Duration::from_micros(u64::from(config.simulation.cycle_time_us)),
    );

    let running = core.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let bind = config.server.bind.as_str();
    let stream_server = StreamServer::bind((bind, config.server.port), core.context(), core.running_flag())?;
    let backdoor_server = BackdoorServer::bind(
        (bind, config.server.backdoor_port),
        core.context(),
        core.running_flag(),
    )?;

    let stream_thread = thread::Builder::new()
        .name("stream-server".to_string())
        .spawn(move || stream_server.serve())?;
    let backdoor_thread = thread::Builder::new()
        .name("backdoor-server".to_string())
        .spawn(move || backdoor_server.serve())?;

    core.run();

    for (name, handle) in [("stream-server", stream_thread), ("backdoor-server", backdoor_thread)] {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("{} failed: {}", name, e),
            Err(_) => return Err(EmulatorError::ThreadPanicked(name)),
        }
    }

    info!("Emulator shutdown complete");
    Ok(())
}

/// Load the configuration file (or defaults) and apply CLI overrides.
fn load_config(args: &Args) -> Result<EmulatorConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => EmulatorConfig::load(path)?,
        None => EmulatorConfig::default(),
    };

    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(port) = args.backdoor_port {
        config.server.backdoor_port = port;
    }

    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args, configured: Level) {
    let level = if args.verbose { Level::DEBUG } else { configured };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
