//! CLI module for `sse-tail`.
//!
//! `sse-tail` connects to an event-stream endpoint and prints every event
//! it receives until interrupted:
//!
//! ```ignore
//! use sse_session::cli::{parse_args, run_tail, CliCommand};
//!
//! match parse_args(std::env::args())? {
//!     CliCommand::Tail(options) => run_tail(options).await?,
//!     _ => {}
//! }
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, TailOptions, USAGE};
pub use version::{version_line, VERSION};

use std::io::{self, Write};

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::info;

use crate::adapters::ReqwestHttpClient;
use crate::config::SessionConfig;
use crate::event::Event;
use crate::session::StreamSession;

/// Write one event to `out`.
///
/// Plain mode prints the canonical block followed by a blank line, so the
/// output is itself a valid event stream. JSON mode prints one object per
/// line.
pub fn print_event(out: &mut impl Write, event: &Event, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, event)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}\n", event.to_block())?;
    }
    out.flush()
}

/// Stream events from `options.url` to stdout until Ctrl-C or a fatal error.
pub async fn run_tail(options: TailOptions) -> Result<()> {
    let config = options.session_config(SessionConfig::from_env());
    let client = ReqwestHttpClient::new();

    let session = StreamSession::connect(options.url.clone(), client, config)
        .await
        .wrap_err_with(|| format!("Failed to connect to {}", options.url))?;

    let mut events = session.events();
    let stdout = io::stdout();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing session");
                events.cancel();
                return Ok(());
            }
            item = events.recv() => match item {
                Some(Ok(event)) => {
                    print_event(&mut stdout.lock(), &event, options.json)
                        .wrap_err("Failed to write event")?;
                }
                Some(Err(e)) => return Err(e).wrap_err("Event stream ended with an error"),
                None => return Ok(()),
            },
        }
    }
}
