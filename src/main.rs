// Entrypoint for the CLI application.
// - Keeps `main` small: load settings, set up logging, hand the parsed
//   command to the dispatcher.
// - Failed platform calls are reported by the dispatcher; `main` only maps
//   the outcome to an exit code.

use clap::Parser;
use std::io::{self, Write};
use std::process;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use sclbl::api::ApiClient;
use sclbl::cli::Cli;
use sclbl::config::Settings;
use sclbl::ui::Dispatcher;

/// Configuration error (sysexits.h `EX_CONFIG`).
const EXIT_CONFIG: i32 = 78;
/// Internal software error (sysexits.h `EX_SOFTWARE`).
const EXIT_SOFTWARE: i32 = 70;

fn main() {
    // An unknown profile means a broken build or deployment: stop here.
    let mut settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("sclbl: {e}");
            process::exit(EXIT_CONFIG);
        }
    };

    let cli = Cli::parse();
    // `SCLBL_DEBUG` counts as a single `--debug`.
    let verbosity = cli.debug.max(u8::from(settings.debug));
    settings.debug = verbosity > 0;
    setup_logging(verbosity);

    let api = match ApiClient::from_env() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("sclbl: {e:#}");
            process::exit(EXIT_SOFTWARE);
        }
    };

    let mut dispatcher = Dispatcher::new(api, &settings);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = match dispatcher
        .dispatch(&cli.command, &mut out)
        .and_then(|outcome| out.flush().map(|()| outcome))
    {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("sclbl: failed to write output: {e}");
            process::exit(EXIT_SOFTWARE);
        }
    };
    process::exit(outcome.exit_code(cli.strict_exit));
}

/// Log to stderr. `--debug` sets the default level; `RUST_LOG` directives
/// (e.g. `sclbl::api=trace`) refine it.
fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_names(false);

    // Ignore the error: a subscriber may already be installed.
    let _ = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .try_init();

    match level {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}
