use std::env;

use catastro_scrap::cli::CliArgs;
use catastro_scrap::config::log_level;
use catastro_scrap::{info_time, process::process_street, Config, Result};
use chrono::Local;
use clap::Parser;
use tracing::{debug, warn, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let args = CliArgs::parse();

    let level = log_level(&args, |key| env::var(key).ok());
    init_logging(*level.as_ref().unwrap_or(&Level::INFO));
    if let Err(name) = &level {
        warn!("Unknown log level '{name}', logging at info (expected trace, debug, info, warn or error)");
    }
    debug!("Arguments: {:?}", args);

    let config = Config::from_args(&args)?;
    process_street(&config).await?;
    info_time!(start_time, "Full program time:");

    Ok(())
}

/// Diagnostics go to stderr; `RUST_LOG` wins over the computed level.
fn init_logging(level: Level) {
    let filter = match env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => ["hyper=warn", "reqwest=warn"]
            .into_iter()
            .filter_map(|d| d.parse::<Directive>().ok())
            .fold(
                EnvFilter::new(format!("catastro_scrap={level}")),
                EnvFilter::add_directive,
            ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
