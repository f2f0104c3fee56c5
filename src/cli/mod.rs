//! CLI for `spark-events`.
//!
//! - Argument parsing
//! - Version display
//! - Command dispatch against a [`SparkClient`]
//!
//! ```ignore
//! use spark_cloud::cli::{parse_args, run_cli_command};
//! use spark_cloud::ClientConfig;
//!
//! let command = parse_args(std::env::args())?;
//! run_cli_command(command, ClientConfig::from_env()).await?;
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, USAGE};
pub use version::{version_string, VERSION};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use futures::StreamExt;
use std::future::Future;
use std::io::Write;

use crate::cloud::{EventFilter, SparkClient};
use crate::config::ClientConfig;
use crate::error::SparkError;
use crate::sse::EventStream;

fn report(err: SparkError) -> color_eyre::Report {
    tracing::debug!("[{}] {}", err.error_code(), err);
    eyre!("{}\nHint: {}", err.user_message(), err.recovery_hint())
}

/// Execute a parsed command.
pub async fn run_cli_command(command: CliCommand, config: ClientConfig) -> Result<()> {
    match command {
        CliCommand::Version => {
            println!("{}", version_string());
            Ok(())
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        CliCommand::Devices => {
            let client = SparkClient::new(config).map_err(report)?;
            handle_devices(&client).await
        }
        CliCommand::Publish {
            name,
            data,
            private,
        } => {
            let client = SparkClient::new(config).map_err(report)?;
            let response = client
                .publish_event(&name, data.as_deref(), private)
                .await
                .map_err(report)?;
            if response.ok {
                println!("Event published successfully");
                Ok(())
            } else {
                Err(eyre!("The cloud did not accept event '{}'", name))
            }
        }
        CliCommand::Listen { filter } => {
            let client = SparkClient::new(config).map_err(report)?;
            handle_listen(&client, &filter).await
        }
    }
}

async fn handle_devices(client: &SparkClient) -> Result<()> {
    let devices = client.list_devices().await.map_err(report)?;
    if devices.is_empty() {
        println!("No devices");
    }
    for device in devices {
        let status = if device.connected { "online" } else { "offline" };
        println!("{}  {:<24} {}", device.id, device.display_name(), status);
    }
    Ok(())
}

/// Print every record as one JSON line until the stream ends or Ctrl-C.
async fn handle_listen(client: &SparkClient, filter: &EventFilter) -> Result<()> {
    let mut events = client.get_event_stream(filter).await.map_err(report)?;
    let mut stdout = std::io::stdout();

    print_events(&mut events, tokio::signal::ctrl_c(), &mut stdout).await?;

    let stats = events.stats();
    tracing::info!(
        "Event stream closed: {} record(s), {} skipped, {} overflow(s)",
        stats.records_emitted,
        stats.records_skipped,
        stats.overflows
    );
    Ok(())
}

/// Write records to `out` until the stream ends or `shutdown` resolves.
///
/// `shutdown` is created once and polled on every turn of the loop, so a
/// signal that arrives while a record is being written is not lost.
async fn print_events<S, W>(events: &mut EventStream, shutdown: S, out: &mut W) -> Result<()>
where
    S: Future,
    W: Write,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Records already parsed are written before shutting down
            biased;
            item = events.next() => match item {
                Some(Ok(record)) => {
                    let line = serde_json::to_string(&record)?;
                    writeln!(out, "{}", line)?;
                    out.flush()?;
                }
                Some(Err(err)) => return Err(report(err.into())),
                None => break,
            },
            _ = &mut shutdown => {
                tracing::info!("Interrupted, closing event stream");
                break;
            }
        }
    }

    Ok(())
}
