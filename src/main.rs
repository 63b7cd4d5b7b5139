//! CatLens - exploratory analysis of categorical columns
//!
//! A CLI tool that summarizes categorical columns of a CSV file, compares
//! user share with conversion per group and tests two columns for
//! association with a chi-squared test and affinity heatmaps.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (invalid input, degenerate data, IO, rendering)

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod plot;
mod report;

use analysis::{ConversionColumns, CorrelationOptions};
use anyhow::{Context, Result};
use cli::{Args, Command, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use loader::LoadOptions;
use models::Table;
use plot::{file_stem_component, BarChartStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Load configuration before logging so `[general] verbose` applies
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("CatLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match source {
        ConfigSource::File(ref path) => info!("Loaded config from: {}", path.display()),
        ConfigSource::Defaults => debug!("No config file found, using defaults"),
        ConfigSource::Fallback(ref reason) => warn!("Failed to load config: {}", reason),
    }

    if let Err(e) = run(&args, &config) {
        error!("Analysis failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle init-config: generate a default .catlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("Edit it to customize output directory, thresholds, chart sizes and colours.");
    Ok(())
}

/// Initialize logging at the given level.
///
/// Logs go to stderr so stdout only carries report text.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load the input table and dispatch the selected analysis.
fn run(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();
    let output_dir = PathBuf::from(&config.general.output_dir);

    let table = loader::load_csv(
        args.input_path(),
        &LoadOptions {
            delimiter: args.delimiter_byte(),
            show_progress: !args.quiet,
        },
    )?;

    match args.command {
        Command::Summary { ref columns, .. } => run_summary(&table, columns, config)?,
        Command::SaveSummary {
            ref columns,
            ref name,
        } => {
            let path = report::save_unique_values_summary(&table, columns, name, &output_dir)?;
            println!("File saved successfully: {}", path.display());
        }
        Command::Conversion {
            ref column,
            sort_by,
            ascending,
            format,
            no_chart,
            ..
        } => {
            let columns = ConversionColumns {
                group: column,
                id: &config.conversion.id_column,
                flag: &config.conversion.flag_column,
            };
            let summary = analysis::conversion_summary(&table, &columns, sort_by, ascending)?;

            let chart = if no_chart {
                None
            } else {
                let path = output_dir.join(format!(
                    "{}_share_vs_conversion.png",
                    file_stem_component(column)
                ));
                let style = BarChartStyle::from_hex(
                    (config.conversion.chart_width, config.conversion.chart_height),
                    &config.conversion.share_color,
                    &config.conversion.conversion_color,
                    &config.conversion.average_color,
                )?;
                plot::render_share_vs_conversion(&summary, &style, &path)
                    .context("Failed to render share vs. conversion chart")?;
                Some(path)
            };

            match format {
                OutputFormat::Json => {
                    println!("{}", report::generate_json_report(&summary, chart.as_deref())?)
                }
                OutputFormat::Text => {
                    print!("{}", report::generate_conversion_report(&summary));
                    if let Some(ref path) = chart {
                        println!("Chart saved to: {}", path.display());
                    }
                }
            }
        }
        Command::Correlate {
            ref var1,
            ref var2,
            format,
            no_chart,
            ..
        } => {
            let options = CorrelationOptions {
                min_sample: config.correlation.min_sample,
                yates_correction: config.correlation.yates_correction,
            };
            let result = analysis::analyze(&table, var1, var2, options)?;

            let chart = if no_chart {
                None
            } else {
                let path = output_dir.join(format!(
                    "{}_vs_{}_heatmaps.png",
                    file_stem_component(var1),
                    file_stem_component(var2)
                ));
                plot::render_correlation_heatmaps(
                    &result,
                    (config.correlation.chart_width, config.correlation.chart_height),
                    &path,
                )
                .context("Failed to render correlation heatmaps")?;
                Some(path)
            };

            let output = match format {
                OutputFormat::Json => report::generate_json_report(&result, chart.as_deref())?,
                OutputFormat::Text => report::generate_correlation_report(&result, chart.as_deref()),
            };
            println!("{}", output);
        }
        Command::InitConfig => handle_init_config()?,
    }

    debug!("Finished in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Print the unique-value summary of each requested column.
fn run_summary(table: &Table, columns: &[String], config: &Config) -> Result<()> {
    let top_n = config.summary.top_n;
    let summaries = analysis::summarize_columns(table, columns)?;

    for summary in &summaries {
        print!("{}", report::generate_column_summary(summary, top_n));
    }

    Ok(())
}

/// Where the active configuration came from.
enum ConfigSource {
    File(PathBuf),
    Defaults,
    /// The default file exists but could not be parsed.
    Fallback(String),
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so the source is returned for logging later.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // An explicit path must load
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::File(PathBuf::from(DEFAULT_CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(format!("{:#}", e)))),
    }
}
