pub mod cli;
pub mod concentration;
pub mod config;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod normalize;
pub mod schema;
pub mod timedim;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info, warn};

use crate::{
    cli::{AnalyzeArgs, Cli, Commands, NormalizeArgs},
    concentration::AnalysisRequest,
    config::Settings,
    data::{Cell, Column, Dataset},
    timedim::PeriodGrain,
};

/// Name of the derived period-key column appended before per-period analysis.
pub const PERIOD_KEY_COLUMN: &str = "period_key";

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_pareto", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Normalize(args) => handle_normalize(&args),
        Commands::Analyze(args) => handle_analyze(&args),
    }
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings> {
    match path {
        Some(path) => {
            Settings::load(path).with_context(|| format!("Loading settings from {path:?}"))
        }
        None => Ok(Settings::default()),
    }
}

fn handle_normalize(args: &NormalizeArgs) -> Result<()> {
    let settings = load_settings(args.settings.as_deref())?;
    let delimiter = io_utils::resolve_delimiter(&args.input, args.delimiter);
    info!("Normalizing '{}'", args.input.display());

    let raw = io_utils::read_dataset(&args.input, delimiter)
        .with_context(|| format!("Reading dataset from {:?}", args.input))?;
    let outcome = normalize::normalize(&raw, &settings)
        .with_context(|| format!("Normalizing {:?}", args.input))?;
    for warning in &outcome.warnings {
        warn!("{warning}");
    }

    let mut schema = outcome.schema;
    if !args.no_time {
        let time_info = timedim::detect_time_dimensions(&outcome.dataset, &settings);
        for warning in &time_info.warnings {
            warn!("{warning}");
        }
        info!("Detected period grain '{}'", time_info.period_grain.as_str());
        schema.apply_time_detection(&time_info);
    }

    if let Some(output) = &args.output {
        io_utils::write_dataset_csv(&outcome.dataset, output, delimiter)
            .with_context(|| format!("Writing normalized dataset to {output:?}"))?;
        info!("Normalized dataset written to {output:?}");
    }
    schema
        .save(&args.schema)
        .with_context(|| format!("Writing schema to {:?}", args.schema))?;

    let step_counts = normalize::summarize_steps(&outcome.transformations);
    info!(
        "Schema for {} column(s) written to {:?} ({} transformation step(s): {})",
        schema.metadata.column_count,
        args.schema,
        outcome.transformations.len(),
        step_counts
            .iter()
            .map(|(step, count)| format!("{step}x{count}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<()> {
    let settings = load_settings(args.settings.as_deref())?;
    let delimiter = io_utils::resolve_delimiter(&args.input, args.delimiter);
    let thresholds = cli::validate_thresholds(&args.thresholds, &settings.default_thresholds)?;
    info!(
        "Analyzing '{}' grouped by '{}' over '{}'",
        args.input.display(),
        args.group_by,
        args.value
    );

    let raw = io_utils::read_dataset(&args.input, delimiter)
        .with_context(|| format!("Reading dataset from {:?}", args.input))?;
    let outcome = normalize::normalize(&raw, &settings)
        .with_context(|| format!("Normalizing {:?}", args.input))?;
    for warning in &outcome.warnings {
        warn!("{warning}");
    }

    let mut dataset = outcome.dataset;
    let period_key_column = if args.no_time {
        None
    } else {
        attach_period_key(&mut dataset, &settings)?
    };

    let request = AnalysisRequest {
        group_by: args.group_by.clone(),
        value_column: args.value.clone(),
        period_key_column,
        thresholds,
    };
    let result = concentration::analyze(&dataset, &request, &settings)?;

    match &args.output {
        Some(path) => {
            io_utils::write_json_pretty(&result, path)
                .with_context(|| format!("Writing analysis to {path:?}"))?;
            info!("Analysis written to {path:?}");
        }
        None => {
            let rendered =
                serde_json::to_string_pretty(&result).context("Serializing analysis result")?;
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{rendered}").context("Writing analysis to stdout")?;
        }
    }
    info!(
        "Computed concentration for {} period(s)",
        result.data.periods.len()
    );
    Ok(())
}

/// Detects a time dimension and appends the derived period-key column when a
/// grain was found. Uses a pre-existing `period_key` column untouched.
fn attach_period_key(dataset: &mut Dataset, settings: &Settings) -> Result<Option<String>> {
    if dataset.column(PERIOD_KEY_COLUMN).is_some() {
        return Ok(Some(PERIOD_KEY_COLUMN.to_string()));
    }
    let time_info = timedim::detect_time_dimensions(dataset, settings);
    for warning in &time_info.warnings {
        warn!("{warning}");
    }
    if time_info.period_grain == PeriodGrain::None {
        return Ok(None);
    }
    info!(
        "Detected period grain '{}'; analyzing per period",
        time_info.period_grain.as_str()
    );
    let keys = timedim::compose_period_key(dataset, time_info.period_grain, &time_info.derivations)
        .context("Composing period keys")?;
    dataset.columns.push(Column::new(
        PERIOD_KEY_COLUMN,
        keys.into_iter().map(|k| Some(Cell::Text(k))).collect(),
    ));
    Ok(Some(PERIOD_KEY_COLUMN.to_string()))
}
