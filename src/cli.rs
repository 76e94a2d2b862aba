//! Command-line parsing for the `rasterband` binary.

use crate::core::config::RunConfig;
use crate::core::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Print usage.
    Help,
    /// List the available filters.
    List,
    /// Describe one filter.
    Info {
        /// Filter name.
        filter: String,
    },
    /// Filter an image.
    Run {
        /// Configuration file to load before applying the flags.
        config: Option<PathBuf>,
        /// Values given on the command line.
        overrides: RunConfig,
    },
}

/// Usage text.
pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [-c <config.toml>] -i <input> -f <filter> [options] [filter args...]
       {program} list
       {program} info <filter>

Options:
  -c, --config <path>      Read run settings from a TOML file (flags win)
  -i, --input <path>       Image to filter
  -f, --filter <name>      Filter to apply (see 'list')
  -I, --iterations <n>     Apply the filter n times (default: 1)
  -o, --output <path>      Output PNG (default: <input>_<filter>.png)
  -w, --bands <n>          Row bands per iteration (default: 2 x threads)
  -t, --threads <n>        Worker threads (default: all cores)
  -h, --help               Show this help message

Set RUST_LOG=debug for engine diagnostics."
    )
}

/// Parse the arguments following the program name.
pub fn parse_args<I>(args: I) -> Result<Command, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();

    match args.first().map(String::as_str) {
        None => return Ok(Command::Help),
        Some("list") => return Ok(Command::List),
        Some("help") => return Ok(Command::Help),
        Some("info") => {
            return args
                .get(1)
                .map(|filter| Command::Info { filter: filter.clone() })
                .ok_or_else(|| ConfigError::InvalidOption {
                    option: "info".to_string(),
                    reason: "expects a filter name".to_string(),
                })
        }
        _ => {}
    }

    let mut config = None;
    let mut overrides = RunConfig::default();
    let mut positional_only = false;
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        if positional_only || !is_flag(&arg) {
            overrides.args.push(arg);
            continue;
        }

        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--" => positional_only = true,
            "-c" | "--config" => config = Some(PathBuf::from(value(&arg, iter.next())?)),
            "-i" | "--input" => overrides.input = Some(PathBuf::from(value(&arg, iter.next())?)),
            "-o" | "--output" => overrides.output = Some(PathBuf::from(value(&arg, iter.next())?)),
            "-f" | "--filter" => overrides.filter = Some(value(&arg, iter.next())?),
            "-I" | "--iterations" => overrides.iterations = Some(number(&arg, iter.next())?),
            "-w" | "--bands" => overrides.bands = Some(number(&arg, iter.next())?),
            "-t" | "--threads" => overrides.threads = Some(number(&arg, iter.next())?),
            _ => {
                return Err(ConfigError::InvalidOption {
                    option: arg,
                    reason: "unknown flag".to_string(),
                })
            }
        }
    }

    Ok(Command::Run { config, overrides })
}

/// Negative numbers are filter arguments, not flags.
fn is_flag(arg: &str) -> bool {
    arg.starts_with('-') && arg.len() > 1 && arg.parse::<f64>().is_err()
}

fn value(flag: &str, next: Option<String>) -> Result<String, ConfigError> {
    next.ok_or_else(|| ConfigError::InvalidOption {
        option: flag.to_string(),
        reason: "expects a value".to_string(),
    })
}

fn number<T>(flag: &str, next: Option<String>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = value(flag, next)?;
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidOption {
        option: flag.to_string(),
        reason: format!("'{}' is not a valid count: {}", raw, e),
    })
}
