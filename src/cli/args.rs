//! Command-line argument parsing for `spark-events`.

use thiserror::Error;

use crate::cloud::EventFilter;

pub const USAGE: &str = "\
Usage:
  spark-events listen [EVENT] [--device ID|mine]   print events as JSON lines
  spark-events publish NAME [DATA] [--private]     publish an event
  spark-events devices                             list your devices
  spark-events --version

Environment:
  SPARK_ACCESS_TOKEN   access token (required)
  SPARK_API_URL        API root (default https://api.particle.io)
  RUST_LOG             log filter (default spark_cloud=info)";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Version,
    Help,
    /// Subscribe and print records until interrupted
    Listen { filter: EventFilter },
    Publish {
        name: String,
        data: Option<String>,
        private: bool,
    },
    Devices,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("missing command")]
    MissingCommand,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("{0} requires a value")]
    MissingValue(&'static str),

    #[error("publish requires an event name")]
    MissingEventName,
}

/// Parse command-line arguments (program name first).
///
/// # Examples
///
/// ```
/// use spark_cloud::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["spark-events".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut args = args.skip(1);
    let command = args.next().ok_or(ArgsError::MissingCommand)?;

    match command.as_str() {
        "--version" | "-V" | "version" => Ok(CliCommand::Version),
        "--help" | "-h" | "help" => Ok(CliCommand::Help),
        "devices" => match args.next() {
            None => Ok(CliCommand::Devices),
            Some(extra) => Err(ArgsError::UnexpectedArgument(extra)),
        },
        "listen" => parse_listen(args),
        "publish" => parse_publish(args),
        other => Err(ArgsError::UnknownCommand(other.to_string())),
    }
}

fn parse_listen<I>(mut args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut event: Option<String> = None;
    let mut device: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--device" | "-d" => {
                device = Some(args.next().ok_or(ArgsError::MissingValue("--device"))?);
            }
            _ if arg.starts_with('-') => return Err(ArgsError::UnexpectedArgument(arg)),
            _ if event.is_none() => event = Some(arg),
            _ => return Err(ArgsError::UnexpectedArgument(arg)),
        }
    }

    let filter = match device.as_deref() {
        None => EventFilter::all(),
        Some("mine") => EventFilter::mine(),
        Some(id) => EventFilter::device(id),
    };
    let filter = match event {
        Some(name) => filter.with_name(name),
        None => filter,
    };

    Ok(CliCommand::Listen { filter })
}

fn parse_publish<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut name: Option<String> = None;
    let mut data: Option<String> = None;
    let mut private = false;

    for arg in args {
        match arg.as_str() {
            "--private" | "-p" => private = true,
            _ if arg.starts_with("--") => return Err(ArgsError::UnexpectedArgument(arg)),
            _ if name.is_none() => name = Some(arg),
            _ if data.is_none() => data = Some(arg),
            _ => return Err(ArgsError::UnexpectedArgument(arg)),
        }
    }

    Ok(CliCommand::Publish {
        name: name.ok_or(ArgsError::MissingEventName)?,
        data,
        private,
    })
}
