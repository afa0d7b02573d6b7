mod config;
mod editor;
mod error;
mod host;
mod inject;
mod ipc;
mod suggest;

use std::{fs, io, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{Config, LogConfig},
    error::Error,
    ipc::{PipeMessage, PipeWriter, SegmentUpdate, SendError},
};

#[derive(Parser)]
#[command(name = "sidecar-tui")]
#[command(about = "Translation sidecar editor with AI ghost-text suggestions")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Segment socket path (overrides the config)
    #[arg(long, global = true)]
    socket: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the editor (receives segments from the host tool)
    Editor,
    /// Publish one segment to a running editor
    Send {
        #[arg(long)]
        source: String,
        #[arg(long, default_value = "")]
        target: String,
        #[arg(long, default_value = "en")]
        source_lang: String,
        #[arg(long, default_value = "ko")]
        target_lang: String,
    },
    /// Stand in for the host tool: stdin lines become segments
    Host {
        #[arg(long, default_value = "en")]
        source_lang: String,
        #[arg(long, default_value = "ko")]
        target_lang: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    if let Some(socket) = cli.socket {
        config.transport.socket_path = socket;
    }

    // The editor owns the terminal, so it logs to a file.
    init_logging(&config.log, matches!(cli.command, Commands::Editor));

    let result = match cli.command {
        Commands::Editor => editor::run(&config).await,
        Commands::Send {
            source,
            target,
            source_lang,
            target_lang,
        } => {
            send(
                &config,
                SegmentUpdate::new(source, target, source_lang, target_lang),
            )
            .await;
            Ok(())
        }
        Commands::Host {
            source_lang,
            target_lang,
        } => host::run(&config.transport, &source_lang, &target_lang).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ Error::Config { .. }) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Fire-and-forget: the outcome is printed, never turned into a failure.
async fn send(config: &Config, update: SegmentUpdate) {
    let writer = PipeWriter::new(
        &config.transport.socket_path,
        config.transport.connect_timeout(),
    );
    match writer.send_message(&PipeMessage::SegmentUpdate(update)).await {
        Ok(()) => println!("sent"),
        Err(SendError::ConnectFailed(e)) => println!("connect failed: {e}"),
        Err(SendError::TimedOut) => println!("timed out"),
        Err(e) => println!("send failed: {e}"),
    }
}

fn init_logging(log: &LogConfig, to_file: bool) {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log.filter));
    let Ok(filter) = filter else {
        return;
    };

    if !to_file {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .try_init();
        return;
    }

    if let Some(dir) = log.path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let Ok(log_file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log.path)
    else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
