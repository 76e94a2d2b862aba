//! Rasterband CLI - band-parallel image filtering
//!
//! Reads an image, applies one filter a number of times and writes a PNG.

use anyhow::{Context, Result};
use log::{debug, info};
use rasterband::cli::{self, Command};
use rasterband::prelude::*;
use std::io::Write;
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let program = std::env::args().next().unwrap_or_else(|| rasterband::NAME.to_string());

    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            report_config_error(&e);
            eprintln!();
            eprintln!("{}", cli::usage(&program));
            return ExitCode::FAILURE;
        }
    };

    let outcome = match command {
        Command::Help => {
            println!("{}", cli::usage(&program));
            Ok(())
        }
        Command::List => {
            list_filters();
            Ok(())
        }
        Command::Info { filter } => filter_info(&filter),
        Command::Run { config, overrides } => run(config, overrides),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn list_filters() {
    let registry = FilterRegistry::<u8>::with_builtins();

    println!("Available filters ({} total):", registry.len());
    println!();

    for (category, filters) in registry.grouped_by_category() {
        println!("  {}", category.display_name());
        for metadata in filters {
            let args = metadata.required_argument_names();
            if args.is_empty() {
                println!("      {:<14} {}", metadata.id, metadata.description);
            } else {
                println!("      {:<14} {} (requires {})", metadata.id, metadata.description, args);
            }
        }
        println!();
    }
}

fn filter_info(name: &str) -> Result<()> {
    let registry = FilterRegistry::<u8>::with_builtins();
    let metadata = registry
        .get_metadata(name)
        .ok_or_else(|| ConfigError::UnknownFilter { name: name.to_string() })?;

    println!("Filter: {}", metadata.name);
    println!("ID: {}", metadata.id);
    println!("Category: {}", metadata.category.display_name());
    println!("Neighbors: {:?}", metadata.neighbor_mode);
    println!();
    println!("Description:");
    println!("  {}", metadata.description);

    if !metadata.parameters.is_empty() {
        println!();
        println!("Arguments (positional):");
        for param in &metadata.parameters {
            match &param.default_value {
                Some(default) => println!("  {} [{:?}] = {}", param.name, param.kind, default),
                None => println!("  {} [{:?}] (required)", param.name, param.kind),
            }
            if !param.description.is_empty() {
                println!("    {}", param.description);
            }
        }
    }

    Ok(())
}

fn run(config: Option<std::path::PathBuf>, overrides: RunConfig) -> Result<()> {
    let base = match config {
        Some(path) => RunConfig::from_file(&path)?,
        None => RunConfig::default(),
    };
    let plan = base.merge(overrides).resolve()?;
    debug!("Run plan: {:?}", plan);

    let total_start = Instant::now();

    let read_start = Instant::now();
    let image = rasterband::io::read_image(&plan.input)
        .with_context(|| format!("Could not load '{}'", plan.input.display()))?;
    let read_ms = read_start.elapsed().as_millis();
    info!(
        "Loaded '{}' ({}x{}, {}-bit)",
        plan.input.display(),
        image.width(),
        image.height(),
        image.depth().bits()
    );

    let options = plan.engine_options().with_progress(print_progress);
    let mut engine = DynamicEngine::new(image, options);
    engine.set_filter(&plan.filter, &plan.args)?;

    let filter_start = Instant::now();
    let stats = engine.run(plan.iterations)?;
    let filter_ms = filter_start.elapsed().as_millis();
    debug!(
        "Applied '{}' {} time(s) over {} band(s) of {} row(s)",
        plan.filter, stats.iterations, stats.bands, stats.rows_per_band
    );

    let write_start = Instant::now();
    let written = engine
        .write_output(&plan.output)
        .with_context(|| format!("Could not save '{}'", plan.output.display()))?;
    let write_ms = write_start.elapsed().as_millis();

    info!("Wrote '{}'", written.display());
    info!(
        "Timing: read {} ms, filter {} ms, write {} ms, total {} ms",
        read_ms,
        filter_ms,
        write_ms,
        total_start.elapsed().as_millis()
    );

    Ok(())
}

fn print_progress(update: ProgressUpdate) {
    let mut out = std::io::stdout().lock();
    match update {
        ProgressUpdate::Progress {
            iteration,
            iterations,
            percent,
            ..
        } => {
            let _ = write!(out, "\rPRGRS: {:3.0}%, IT: {} / {}", percent, iteration + 1, iterations);
            let _ = out.flush();
        }
        ProgressUpdate::IterationCompleted {
            iteration,
            iterations,
            ..
        } => {
            let _ = write!(out, "\rPRGRS: 100%, IT: {} / {}", iteration + 1, iterations);
            if iteration + 1 == iterations {
                let _ = writeln!(out);
            }
            let _ = out.flush();
        }
        _ => {}
    }
}

fn report_error(error: &anyhow::Error) {
    let config = error.downcast_ref::<ConfigError>().or_else(|| {
        error.downcast_ref::<RasterError>().and_then(|e| match e {
            RasterError::Config(inner) => Some(inner),
            _ => None,
        })
    });

    match config {
        Some(config) => report_config_error(config),
        None => eprintln!("Error: {:#}", error),
    }
}

fn report_config_error(error: &ConfigError) {
    eprintln!("Error: {}", error);
    if let Some(fix) = error.suggested_fix() {
        eprintln!("Hint: {}", fix);
    }
}
