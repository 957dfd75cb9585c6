// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The `panemux` binary: parses CLI arguments, wires up logging, and hands off to
//! [`panemux::Mux::run`].

use clap::Parser;
use panemux::geometry::Size;
use panemux::host::CrosstermHost;
use panemux::pty::PtyRunner;
use panemux::{Mux, MuxError};

/// A full-screen, in-process terminal multiplexer.
#[derive(Debug, Parser)]
#[command(name = "panemux", version, about)]
struct Args {
    /// The key sequence that introduces a command chord.
    #[arg(long, default_value = "`")]
    prefix: String,

    /// Program to run in the first pane (defaults to `$SHELL`).
    #[arg(long)]
    command: Option<String>,

    /// Arguments passed to `--command`.
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn init_logging() {
    if std::env::var("PANEMUX_LOG").is_err() {
        return;
    }
    let file_appender = tracing_appender::rolling::never(".", "panemux.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    // Leaked deliberately: the guard must outlive every log call in the process, and
    // there is no earlier point to own it than `main` itself.
    Box::leak(Box::new(guard));
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("PANEMUX_LOG"))
        .init();
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_logging();
    let args = Args::parse();

    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
    let program = args.command.unwrap_or(shell);
    let program_args = args.args;

    let host = CrosstermHost::new();
    let size = {
        use panemux::host::HostTerminal;
        host.size()
    }
    .map_err(MuxError::Io)
    .map_err(|e| miette::Report::new(e))?;

    let runner_factory: panemux::RunnerFactory = Box::new(move |size: Size| {
        PtyRunner::spawn(&program, &program_args, size).map(|r| Box::new(r) as Box<dyn panemux::pane::Runner>)
    });

    let mux = Mux::builder()
        .prefix(args.prefix.as_bytes())
        .size(size)
        .build(runner_factory)
        .map_err(miette::Report::new)?;

    mux.run().await
}
