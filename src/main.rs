//! Facegate CLI
//!
//! Command-line interface for running the continuous validation loop
//! against a recognition service, checking connectivity, and capturing
//! diagnostic snapshots. The camera is simulated with a mock video source.

use clap::{Args, Parser, Subcommand};
use facegate::{
    camera::{CameraLifecycle, SharedSource},
    capture::{FrameCapture, MockVideoSource, VideoSource},
    config::FileConfig,
    metrics::MetricsRegistry,
    scheduler::ValidationScheduler,
    status::StatusView,
    transport::HttpTransport,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "facegate", version, about = "Continuous face validation client")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the capture-and-validate loop until Ctrl-C.
    Run(RunArgs),
    /// Check that the recognition service is reachable.
    Check(EndpointArgs),
    /// Capture a single snapshot to a JPEG file.
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct EndpointArgs {
    /// Base URL of the recognition service (overrides the config file).
    #[arg(long)]
    url: Option<String>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    endpoint: EndpointArgs,

    /// Stop after this many seconds.
    #[arg(long)]
    duration: Option<u64>,

    /// Native size of the simulated camera, e.g. 1920x1080.
    #[arg(long, value_parser = parse_size)]
    source_size: Option<(u32, u32)>,

    /// Display `Processing` while a request is outstanding.
    #[arg(long)]
    show_processing: bool,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,

    /// Native size of the simulated camera, e.g. 1920x1080.
    #[arg(long, value_parser = parse_size)]
    source_size: Option<(u32, u32)>,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width = w.parse().map_err(|_| format!("invalid width '{}'", w))?;
    let height = h.parse().map_err(|_| format!("invalid height '{}'", h))?;
    Ok((width, height))
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    let result = match cli.command {
        Command::Run(args) => {
            apply_endpoint(&mut config, &args.endpoint);
            if let Some((width, height)) = args.source_size {
                config.capture.width = width;
                config.capture.height = height;
            }
            config.scheduler.show_processing |= args.show_processing;
            run(config, args.duration.map(Duration::from_secs))
        }
        Command::Check(args) => {
            apply_endpoint(&mut config, &args);
            check(config)
        }
        Command::Snapshot(args) => {
            if let Some((width, height)) = args.source_size {
                config.capture.width = width;
                config.capture.height = height;
            }
            snapshot(config, &args.out)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn apply_endpoint(config: &mut FileConfig, args: &EndpointArgs) {
    if let Some(url) = &args.url {
        config.transport.base_url = url.clone();
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

fn run(config: FileConfig, duration: Option<Duration>) -> CliResult {
    config.validate()?;
    info!("Facegate v{}", facegate::VERSION);
    info!("This is a demonstration using a mock camera source");

    let stop = Arc::new(Notify::new());
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.notify_one())?;
    }

    let metrics = MetricsRegistry::new()?;
    let source: SharedSource = Arc::new(Mutex::new(MockVideoSource::new()));
    let mut camera = CameraLifecycle::new(Arc::clone(&source), config.capture.clone());
    let transport = Arc::new(HttpTransport::new(&config.transport));
    info!(url = transport.validate_url(), "Validation endpoint");

    let scheduler = ValidationScheduler::new(
        config.scheduler.clone(),
        source,
        transport,
        metrics.clone(),
    )?;
    let mut status = scheduler.subscribe_status();
    #[cfg(feature = "metrics")]
    let exported_status = scheduler.subscribe_status();

    runtime()?.block_on(async {
        #[cfg(feature = "metrics")]
        if let Some(addr) = config.metrics.bind_addr() {
            let server = facegate::metrics::MetricsServer::new(addr, metrics.clone())
                .with_status(exported_status);
            tokio::spawn(async move {
                if let Err(e) = server.run().await {
                    warn!("Metrics server failed: {}", e);
                }
            });
        }

        tokio::spawn(async move {
            while status.changed().await.is_ok() {
                let view = StatusView::from_status(&status.borrow_and_update());
                println!("{}", view);
            }
        });

        camera.start()?;

        let shutdown = async {
            match duration {
                Some(duration) => {
                    tokio::select! {
                        _ = stop.notified() => {}
                        _ = tokio::time::sleep(duration) => {}
                    }
                }
                None => stop.notified().await,
            }
        };
        scheduler.run(camera.subscribe(), shutdown).await;
        camera.stop();
        Ok::<_, Box<dyn std::error::Error>>(())
    })?;

    let totals = metrics.snapshot();
    info!(
        "Done: {} ticks, {} attempts, {} granted, {} denied, {} rejected, {} transport errors",
        totals.ticks,
        totals.attempts,
        totals.granted,
        totals.denied,
        totals.rejected,
        totals.transport_errors
    );
    Ok(())
}

fn check(config: FileConfig) -> CliResult {
    config.validate()?;
    let transport = HttpTransport::new(&config.transport);
    let url = config.transport.probe_url();

    match runtime()?.block_on(transport.probe()) {
        Ok(status) => {
            println!("Connected: {} (HTTP {})", url, status);
            Ok(())
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Connection check failed");
            Err(e.into())
        }
    }
}

fn snapshot(config: FileConfig, out: &Path) -> CliResult {
    config.capture.validate()?;
    let mut source = MockVideoSource::new();
    source.open(&config.capture)?;

    let frame = FrameCapture::new()
        .capture(&mut source)
        .ok_or("video source not ready")?;
    std::fs::write(out, frame.jpeg())?;
    source.close();

    println!(
        "Wrote {}x{} snapshot ({} bytes) to {}",
        frame.width(),
        frame.height(),
        frame.jpeg().len(),
        out.display()
    );
    Ok(())
}
