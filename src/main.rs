use clap::Parser;
use filerelay::app::Application;
use filerelay::config::Config;
use filerelay::Result;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "filerelay")]
#[command(about = "Peer-to-peer streaming file relay server", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Bind port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Generate example configuration file
    #[arg(long, value_name = "FILE")]
    generate_config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(config_path) = args.generate_config {
        println!("Generating example configuration file: {:?}", config_path);
        Config::create_example(&config_path)?;
        println!("Example configuration file created successfully!");
        println!("Edit the file and run: filerelay --config {:?}", config_path);
        return Ok(());
    }

    init_logging(&args.log_level)?;

    info!("filerelay v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = if let Some(config_path) = args.config {
        info!("Loading configuration from: {:?}", config_path);
        Config::from_file(config_path)?
    } else {
        info!("No configuration file specified, using defaults");
        Config::default()
    };

    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.server.bind_port = port;
    }

    let mut app = Application::new(config);

    let shutdown = tokio::spawn(async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for Ctrl+C");
        info!("received Ctrl+C, shutting down gracefully...");
    });

    tokio::select! {
        result = app.run() => {
            if let Err(e) = result {
                error!("server error: {}", e);
                return Err(e);
            }
        }
        _ = shutdown => {
            info!("shutdown complete");
        }
    }

    app.shutdown().await;

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(level)
        .map_err(|e| filerelay::RelayError::Config(format!("invalid log level: {e}")))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();

    Ok(())
}
