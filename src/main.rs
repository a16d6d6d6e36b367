use std::io;
use std::process;

use clap::Parser;
use nextver::cli::{self, Args};
use nextver::ui;

fn init_logging(verbose: bool) {
    // RUST_LOG wins; stderr keeps stdout clean for json/yaml output
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if verbose { "nextver=debug" } else { "warn" })
    });

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Err(e) = cli::run(&args, &mut out) {
        ui::display_error(&e.to_string());

        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("  Caused by: {err}");
            source = err.source();
        }

        process::exit(1);
    }
}
