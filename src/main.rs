use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use mjpeg_relay::{RelayConfig, RelayServer, StreamSource};

#[derive(Parser, Debug)]
#[command(name = "mjpeg-relay")]
#[command(about = "HTTP serving core for a lightweight MJPEG streamer")]
#[command(version)]
#[command(
    long_about = "Republishes a continuously refreshed JPEG frame to many concurrent \
HTTP clients as a multipart MJPEG stream, a one-shot snapshot, or a JSON status ping. \
The capture producer hands frames over through a shared StreamSource."
)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "mjpeg-relay.toml",
        help = "Path to TOML configuration file"
    )]
    config: String,

    /// Override the host to bind to
    #[arg(long, help = "Host name or address to bind to")]
    host: Option<String>,

    /// Override the port to listen on
    #[arg(short, long, help = "Port to listen on")]
    port: Option<u16>,

    /// Override the request timeout in seconds
    #[arg(long, value_name = "SECONDS", help = "Request head timeout in seconds")]
    timeout: Option<u64>,

    /// Override the refresh interval in microseconds
    #[arg(
        long,
        value_name = "MICROS",
        help = "Refresh tick interval in microseconds"
    )]
    refresh_interval: Option<u64>,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(
        long,
        help = "Validate configuration file and exit without starting the server"
    )]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(
        long,
        value_name = "FORMAT",
        help = "Log output format: json, pretty, or compact"
    )]
    log_format: Option<String>,
}

// All HTTP logic runs on a single-threaded reactor; the capture producer
// is the only other thread and talks through the StreamSource mutex.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config();
        return Ok(());
    }

    // Initialize logging
    init_logging(&args)?;

    info!("Starting mjpeg-relay v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    // Load and validate configuration
    let mut config = match RelayConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // CLI flags win over file and environment
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(timeout) = args.timeout {
        config.server.timeout_seconds = timeout;
    }
    if let Some(refresh_interval) = args.refresh_interval {
        config.stream.refresh_interval_us = refresh_interval;
    }

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    config.validate().map_err(|e| {
        error!("Configuration validation failed: {}", e);
        e
    })?;

    // The capture component publishes into this source from its own
    // thread; until it does, the relay serves the blank frame.
    let source = Arc::new(StreamSource::new());

    let server = RelayServer::builder()
        .config(config)
        .source(Arc::clone(&source))
        .build()?;

    let bound = server.bind().await?;

    let shutdown = CancellationToken::new();
    spawn_signal_handlers(shutdown.clone());

    bound.serve(shutdown).await?;

    info!("mjpeg-relay exited");
    Ok(())
}

/// Cancel the shutdown token on SIGINT or SIGTERM.
fn spawn_signal_handlers(shutdown: CancellationToken) {
    // Handle SIGTERM (systemd stop) - Unix only
    #[cfg(unix)]
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    error!("Failed to register SIGTERM handler: {}", e);
                    return;
                }
            };
            if sigterm.recv().await.is_some() {
                info!("Received SIGTERM signal");
                shutdown.cancel();
            }
        });
    }

    // Handle SIGINT (Ctrl+C) - Cross-platform
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received SIGINT signal (Ctrl+C)");
            shutdown.cancel();
        }
    });
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    };

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    // Create environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mjpeg_relay={}", log_level)));

    // Configure format based on options
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() {
    println!("# mjpeg-relay Configuration File");
    println!("# These are the built-in defaults; override in TOML or env vars");
    println!();

    let default_config = RelayConfig::default();
    match toml::to_string_pretty(&default_config) {
        Ok(toml_str) => println!("{}", toml_str),
        Err(e) => eprintln!("Failed to render default config: {}", e),
    }
}
