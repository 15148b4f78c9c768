//! kanata-diff CLI

mod cli;
mod terminal;

use std::backtrace::Backtrace;
use std::io;
use std::panic::{self, AssertUnwindSafe};

use clap::Parser;
use kanata_diff::{EXIT_UNEXPECTED, Error, Reporter, compare_files_with};
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() {
    let cli = Cli::parse();
    let stages = cli.stage_set().unwrap_or_else(|e| e.exit());

    let metrics_handle = if cli.metrics {
        kanata_diff::metrics::CliRecorder::new().install()
    } else {
        None
    };
    kanata_diff::metrics::init();

    let default_level = if cli.verbose {
        "kanata_log=debug,kanata_diff=debug"
    } else {
        "kanata_log=warn,kanata_diff=info"
    };
    let mut filter = EnvFilter::from_default_env();
    for directive in default_level.split(',') {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(console::colors_enabled_stderr())
        .with_writer(io::stderr)
        .init();

    panic::set_hook(Box::new(|info| {
        terminal::error(&format!("Unexpected error: {info}"));
        eprintln!("{}", Backtrace::force_capture());
    }));

    let color = cli.color.enabled();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let reporter = Reporter::new(
            io::stdout().lock(),
            cli.file1.display().to_string(),
            cli.file2.display().to_string(),
        )
        .with_color(color);
        compare_files_with(reporter, &cli.file1, &cli.file2, &stages)
    }));

    let exit_code = match outcome {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            report_error(&e);
            e.exit_code()
        }
        Err(_) => EXIT_UNEXPECTED,
    };

    if let Some(handle) = metrics_handle {
        handle.print_summary();
    }

    std::process::exit(exit_code);
}

fn report_error(e: &Error) {
    match e {
        Error::Trace(kanata_diff::TraceError::FileAccess { .. }) => {
            terminal::error(&format!("Error: {e}"));
        }
        _ => {
            terminal::error(&format!("Unexpected error: {e}"));
            let mut source = std::error::Error::source(e);
            while let Some(cause) = source {
                terminal::dim(&format!("caused by: {cause}"));
                source = cause.source();
            }
            eprintln!("{}", Backtrace::force_capture());
        }
    }
}
