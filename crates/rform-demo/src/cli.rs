#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually. Supports environment overrides via the
//! `RFORM_DEMO_*` prefix; explicit flags win over the environment.

use std::env;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
rform demo: headless remote forms against an in-memory surface

USAGE:
    rform-demo [OPTIONS] [SCENARIO]

SCENARIOS:
    counter     Mounted counter form with +1 / reset buttons (default)
    rhythm      Tick-driven rhythm game with a scrolling note chart

OPTIONS:
    --subject=NAME   Subject the form is shown to (default: steve)
    --clicks=N       Counter: simulated +1 clicks (default: 5)
    --ticks=N        Rhythm: ticks to simulate (default: 120)
    --seed=N         Rhythm: chart and press seed (default: 42)
    --help, -h       Show this help message
    --version, -V    Show version

ENVIRONMENT VARIABLES:
    RFORM_DEMO_SCENARIO   Override the scenario
    RFORM_DEMO_SUBJECT    Override --subject
    RFORM_DEMO_CLICKS     Override --clicks
    RFORM_DEMO_TICKS      Override --ticks
    RFORM_DEMO_SEED       Override --seed
    RFORM_NAMESPACE       Document namespace (default: rform)
    RFORM_SCHEMA          Document schema (default: custom_form)
    RFORM_SCREEN_ID       Presented screen id
    RFORM_CLOSE_LABEL     Close button label
    RFORM_CATCH_PANICS    Catch callback panics (1/true/yes/on)
    RUST_LOG              Log filter (default: info)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Counter,
    Rhythm,
}

impl Scenario {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "counter" => Some(Self::Counter),
            "rhythm" => Some(Self::Rhythm),
            _ => None,
        }
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    pub scenario: Scenario,
    pub subject: String,
    /// Counter: number of simulated clicks.
    pub clicks: u32,
    /// Rhythm: number of ticks to simulate.
    pub ticks: u64,
    /// Rhythm: seed for the chart and the simulated presses.
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            scenario: Scenario::Counter,
            subject: "steve".into(),
            clicks: 5,
            ticks: 120,
            seed: 42,
        }
    }
}

impl Opts {
    /// Parse from process args and environment, exiting on `--help`,
    /// `--version`, or bad input.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("rform-demo {VERSION}");
                process::exit(0);
            }
            Err(ParseError::InvalidValue { flag, value }) => {
                eprintln!("Invalid {flag} value: {value}");
                process::exit(1);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        if let Some(raw) = get_env("RFORM_DEMO_SCENARIO") {
            opts.scenario = Scenario::parse(&raw).ok_or(ParseError::InvalidValue {
                flag: "RFORM_DEMO_SCENARIO",
                value: raw,
            })?;
        }
        if let Some(raw) = get_env("RFORM_DEMO_SUBJECT").filter(|v| !v.trim().is_empty()) {
            opts.subject = raw.trim().to_string();
        }
        if let Some(raw) = get_env("RFORM_DEMO_CLICKS") {
            opts.clicks = parse_number("RFORM_DEMO_CLICKS", &raw)?;
        }
        if let Some(raw) = get_env("RFORM_DEMO_TICKS") {
            opts.ticks = parse_number("RFORM_DEMO_TICKS", &raw)?;
        }
        if let Some(raw) = get_env("RFORM_DEMO_SEED") {
            opts.seed = parse_number("RFORM_DEMO_SEED", &raw)?;
        }

        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                other => {
                    if let Some(value) = other.strip_prefix("--subject=") {
                        if value.trim().is_empty() {
                            return Err(ParseError::InvalidValue {
                                flag: "--subject",
                                value: value.to_string(),
                            });
                        }
                        opts.subject = value.trim().to_string();
                    } else if let Some(value) = other.strip_prefix("--clicks=") {
                        opts.clicks = parse_number("--clicks", value)?;
                    } else if let Some(value) = other.strip_prefix("--ticks=") {
                        opts.ticks = parse_number("--ticks", value)?;
                    } else if let Some(value) = other.strip_prefix("--seed=") {
                        opts.seed = parse_number("--seed", value)?;
                    } else if let Some(scenario) = Scenario::parse(other) {
                        opts.scenario = scenario;
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }
        Ok(opts)
    }
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: &str) -> Result<T, ParseError> {
    raw.trim().parse().map_err(|_| ParseError::InvalidValue {
        flag,
        value: raw.to_string(),
    })
}
