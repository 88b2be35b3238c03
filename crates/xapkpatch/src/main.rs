use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{Level, error};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use xapkpatch::prelude::*;

fn init_tracing(verbose: bool) {
    let mp = (*progress::GLOBAL_MP).clone();
    let progress_writer = move || MultiProgressWriter::new(mp.clone());

    // Each stream decides on colour for itself.
    let diagnostics = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(verbose)
        .with_level(verbose)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr.with_max_level(Level::WARN));

    let narration = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(verbose)
        .with_level(verbose)
        .with_ansi(std::io::stdout().is_terminal())
        .with_writer(progress_writer.with_min_level(Level::INFO));

    tracing_subscriber::registry()
        .with(if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO })
        .with(diagnostics)
        .with(narration)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match program::program(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
