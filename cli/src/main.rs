use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

mod commands;

use commands::Commands;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "idgate")]
#[command(about = "Inspect and drive configured OAuth login providers", long_about = None)]
struct Cli {
    /// Provider settings file
    #[arg(short = 'c', long = "config", env = "IDGATE_CONFIG", default_value = "idgate.toml")]
    config: PathBuf,

    /// Abort network calls after this many seconds
    #[arg(long = "timeout-secs", default_value_t = 30)]
    timeout_secs: u64,

    /// Enable debug output
    #[arg(long = "debug", default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!("warn,{}=debug,idgate_oauth=debug", env!("CARGO_CRATE_NAME")).into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let options = commands::RunOptions {
        config_path: cli.config,
        timeout: Duration::from_secs(cli.timeout_secs),
    };

    if let Err(e) = cli.command.run(options).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
