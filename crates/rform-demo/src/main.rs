#![forbid(unsafe_code)]

//! rform demo binary entry point.

mod cli;
mod scenarios;

use rform_sync::SyncConfig;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let opts = cli::Opts::parse();
    init_tracing();

    let config = SyncConfig::from_env();
    tracing::debug!(?config, ?opts, "starting demo");

    let report = match opts.scenario {
        cli::Scenario::Counter => scenarios::counter::run(&opts.subject, opts.clicks, config),
        cli::Scenario::Rhythm => {
            scenarios::rhythm::run(&opts.subject, opts.ticks, opts.seed, config)
        }
    };
    match report {
        Ok(report) => println!("{report:#}"),
        Err(e) => {
            eprintln!("Demo failed: {e}");
            std::process::exit(1);
        }
    }
}
