//! Command-line argument parsing for `sse-tail`.
//!
//! Parsing is done by hand: the CLI only has a handful of flags.

use std::time::Duration;

use thiserror::Error;

use crate::config::SessionConfig;

/// Usage text printed for `--help` and on argument errors.
pub const USAGE: &str = "\
Usage: sse-tail [OPTIONS] <URL>

Options:
  --json                 Print each event as a JSON line
  --retry-ms <MS>        Initial reconnection delay in milliseconds
  --last-event-id <ID>   Resume from this event ID on the first connect
  -H, --header <K: V>    Extra request header (repeatable)
  -V, --version          Print version
  -h, --help             Print this help";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Stream events from a URL (default)
    Tail(TailOptions),
}

/// Options for streaming events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TailOptions {
    /// Endpoint to stream
    pub url: String,
    /// Print events as JSON lines
    pub json: bool,
    /// Initial retry override
    pub retry_ms: Option<u64>,
    /// Resumption ID for the first connect
    pub last_event_id: Option<String>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
}

impl TailOptions {
    /// Build the session config, flags taking precedence over the environment.
    pub fn session_config(&self, base: SessionConfig) -> SessionConfig {
        let mut config = base;

        if let Some(ms) = self.retry_ms {
            config = config.with_retry(Duration::from_millis(ms));
        }
        if let Some(id) = &self.last_event_id {
            config = config.with_last_event_id(id.clone());
        }
        for (name, value) in &self.headers {
            config = config.with_header(name.clone(), value.clone());
        }

        config
    }
}

/// Error type for argument parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgsError {
    /// No URL was given
    #[error("missing <URL> argument")]
    MissingUrl,

    /// A flag that takes a value was last
    #[error("{0} requires a value")]
    MissingValue(String),

    /// `--retry-ms` was not a number
    #[error("invalid --retry-ms value: {0}")]
    InvalidRetry(String),

    /// A header without a colon
    #[error("invalid header {0:?}, expected \"Name: value\"")]
    InvalidHeader(String),

    /// An unrecognized flag
    #[error("unknown option: {0}")]
    UnknownFlag(String),
}

/// Parse command-line arguments and return the appropriate command.
///
/// # Arguments
///
/// * `args` - Iterator of command-line arguments (typically `std::env::args()`)
///
/// # Examples
///
/// ```
/// use sse_session::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["sse-tail".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut options = TailOptions::default();
    let mut url = None;
    // Skip the program name
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--json" => options.json = true,
            "--retry-ms" => {
                let value = args.next().ok_or_else(|| ArgsError::MissingValue(arg.clone()))?;
                let ms = value
                    .parse::<u64>()
                    .map_err(|_| ArgsError::InvalidRetry(value.clone()))?;
                options.retry_ms = Some(ms);
            }
            "--last-event-id" => {
                let value = args.next().ok_or_else(|| ArgsError::MissingValue(arg.clone()))?;
                options.last_event_id = Some(value);
            }
            "--header" | "-H" => {
                let value = args.next().ok_or_else(|| ArgsError::MissingValue(arg.clone()))?;
                options.headers.push(parse_header(&value)?);
            }
            flag if flag.starts_with('-') => return Err(ArgsError::UnknownFlag(flag.to_string())),
            _ => url = Some(arg),
        }
    }

    options.url = url.ok_or(ArgsError::MissingUrl)?;
    Ok(CliCommand::Tail(options))
}

fn parse_header(raw: &str) -> Result<(String, String), ArgsError> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| ArgsError::InvalidHeader(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ArgsError::InvalidHeader(raw.to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
