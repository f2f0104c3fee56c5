use color_eyre::Result;
use spark_cloud::cli::{parse_args, run_cli_command, USAGE};
use spark_cloud::ClientConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "spark_cloud=info";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    run_cli_command(command, ClientConfig::from_env()).await
}
