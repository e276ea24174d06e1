use color_eyre::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sse_session::cli::{parse_args, run_tail, version_line, CliCommand, USAGE};

/// Send logs to stderr so stdout carries only events.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    match command {
        CliCommand::Version => println!("{}", version_line()),
        CliCommand::Help => println!("{}", USAGE),
        CliCommand::Tail(options) => {
            init_tracing();
            run_tail(options).await?;
        }
    }

    Ok(())
}
