//! `hqlc` binary entry point. Parses [`Cli`], wires up `tracing`, runs the
//! pipeline, and maps the result to spec.md section 6's exit codes: `0`
//! on success, `1` on any compile or toolchain error — the same
//! parse-then-dispatch shape as `faxt/src/main.rs`'s `fn main`.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hql_drv::{compile, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Commands::Compile(command) = cli.command else {
        unreachable!("`compile` is the only subcommand");
    };
    let debug = command.debug;
    let time = command.time;
    let config = command.into_config(cli.verbose);

    if debug {
        tracing::debug!(?config, "resolved configuration");
    }

    match compile(&config) {
        Ok(outcome) => {
            if !outcome.rendered_diagnostics.trim().is_empty() {
                eprint!("{}", outcome.rendered_diagnostics);
            }
            if time {
                for (phase, elapsed) in &outcome.timings {
                    eprintln!("{phase}: {elapsed:?}");
                }
            }
            println!("{}", outcome.output_path.display());
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };
    let subscriber = fmt::layer().with_target(false).with_thread_ids(false).with_thread_names(false);
    let _ = tracing_subscriber::registry().with(filter).with(subscriber).try_init();
}
