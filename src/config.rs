//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.catlens.toml` files.

use crate::cli::{Args, Command};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".catlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Unique-value summary settings.
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Correlation analysis settings.
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Share vs. conversion settings.
    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory for charts and summary files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> String {
    "outputs".to_string()
}

/// Unique-value summary settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Number of most frequent values printed per column.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

/// Correlation analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Cells with fewer observations get no affinity value.
    #[serde(default = "default_min_sample")]
    pub min_sample: u64,

    /// Apply the Yates continuity correction on 2x2 tables.
    #[serde(default = "default_true")]
    pub yates_correction: bool,

    /// Heatmap figure width in pixels.
    #[serde(default = "default_heatmap_width")]
    pub chart_width: u32,

    /// Heatmap figure height in pixels.
    #[serde(default = "default_heatmap_height")]
    pub chart_height: u32,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_sample: default_min_sample(),
            yates_correction: true,
            chart_width: default_heatmap_width(),
            chart_height: default_heatmap_height(),
        }
    }
}

fn default_min_sample() -> u64 {
    crate::analysis::correlation::DEFAULT_MIN_SAMPLE
}

fn default_heatmap_width() -> u32 {
    1400
}

fn default_heatmap_height() -> u32 {
    1800
}

/// Share vs. conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Column identifying users.
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Column holding the conversion flag.
    #[serde(default = "default_flag_column")]
    pub flag_column: String,

    /// Bar chart width in pixels.
    #[serde(default = "default_bar_width")]
    pub chart_width: u32,

    /// Bar chart height in pixels.
    #[serde(default = "default_bar_height")]
    pub chart_height: u32,

    /// Colour of the user share bars.
    #[serde(default = "default_share_color")]
    pub share_color: String,

    /// Colour of the conversion rate bars.
    #[serde(default = "default_conversion_color")]
    pub conversion_color: String,

    /// Colour of the average conversion line.
    #[serde(default = "default_average_color")]
    pub average_color: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            flag_column: default_flag_column(),
            chart_width: default_bar_width(),
            chart_height: default_bar_height(),
            share_color: default_share_color(),
            conversion_color: default_conversion_color(),
            average_color: default_average_color(),
        }
    }
}

fn default_id_column() -> String {
    "user_id".to_string()
}

fn default_flag_column() -> String {
    "booked".to_string()
}

fn default_bar_width() -> u32 {
    1600
}

fn default_bar_height() -> u32 {
    800
}

fn default_share_color() -> String {
    "#d3d3d3".to_string()
}

fn default_conversion_color() -> String {
    "#ffd700".to_string()
}

fn default_average_color() -> String {
    "#ff6347".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.catlens.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref output_dir) = args.output_dir {
            self.general.output_dir = output_dir.to_string_lossy().into_owned();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }

        match args.command {
            Command::Summary { top: Some(top), .. } => {
                self.summary.top_n = top;
            }
            Command::Conversion {
                ref id_column,
                ref flag_column,
                ..
            } => {
                if let Some(id_column) = id_column {
                    self.conversion.id_column = id_column.clone();
                }
                if let Some(flag_column) = flag_column {
                    self.conversion.flag_column = flag_column.clone();
                }
            }
            Command::Correlate {
                min_sample,
                no_yates,
                ..
            } => {
                if let Some(min_sample) = min_sample {
                    self.correlation.min_sample = min_sample;
                }
                if no_yates {
                    self.correlation.yates_correction = false;
                }
            }
            _ => {}
        }
    }

    /// Log level from the merged settings; `quiet` wins over `verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use std::path::PathBuf;

    fn make_args(command: Command) -> Args {
        Args {
            input: Some(PathBuf::from("data.csv")),
            config: None,
            verbose: false,
            quiet: false,
            delimiter: ",".to_string(),
            output_dir: None,
            command,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output_dir, "outputs");
        assert_eq!(config.summary.top_n, 10);
        assert_eq!(config.correlation.min_sample, 25);
        assert!(config.correlation.yates_correction);
        assert_eq!(config.conversion.id_column, "user_id");
        assert_eq!(config.conversion.flag_column, "booked");
        assert_eq!(
            (config.conversion.chart_width, config.conversion.chart_height),
            (1600, 800)
        );
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r##"
[general]
output_dir = "charts"
verbose = true

[correlation]
min_sample = 40
yates_correction = false

[conversion]
flag_column = "converted"
share_color = "#cccccc"
"##;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output_dir, "charts");
        assert!(config.general.verbose);
        assert_eq!(config.correlation.min_sample, 40);
        assert!(!config.correlation.yates_correction);
        assert_eq!(config.correlation.chart_width, 1400);
        assert_eq!(config.conversion.flag_column, "converted");
        assert_eq!(config.conversion.id_column, "user_id");
        assert_eq!(config.conversion.share_color, "#cccccc");
        assert_eq!(config.summary.top_n, 10);
    }

    #[test]
    fn test_merge_correlate_args() {
        let mut config = Config::default();
        let mut args = make_args(Command::Correlate {
            var1: "a".to_string(),
            var2: "b".to_string(),
            min_sample: Some(5),
            no_yates: true,
            format: OutputFormat::Text,
            no_chart: false,
        });
        args.output_dir = Some(PathBuf::from("out"));

        config.merge_with_args(&args);
        assert_eq!(config.correlation.min_sample, 5);
        assert!(!config.correlation.yates_correction);
        assert_eq!(config.general.output_dir, "out");
    }

    #[test]
    fn test_merge_keeps_config_without_flags() {
        let mut config: Config = toml::from_str("[summary]\ntop_n = 3\n").unwrap();
        config.merge_with_args(&make_args(Command::Summary {
            columns: vec!["a".to_string()],
            top: None,
        }));
        assert_eq!(config.summary.top_n, 3);

        config.merge_with_args(&make_args(Command::Summary {
            columns: vec!["a".to_string()],
            top: Some(7),
        }));
        assert_eq!(config.summary.top_n, 7);
    }

    #[test]
    fn test_merge_conversion_columns() {
        let mut config = Config::default();
        config.merge_with_args(&make_args(Command::Conversion {
            column: "channel".to_string(),
            id_column: None,
            flag_column: Some("paid".to_string()),
            sort_by: Default::default(),
            ascending: false,
            format: OutputFormat::Text,
            no_chart: true,
        }));
        assert_eq!(config.conversion.id_column, "user_id");
        assert_eq!(config.conversion.flag_column, "paid");
    }

    #[test]
    fn test_log_level_honours_config_verbose() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);

        config.general.verbose = false;
        assert_eq!(config.log_level(false), tracing::Level::INFO);

        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        config.merge_with_args(&args);
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[summary]\ntop_n = 4\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.summary.top_n, 4);

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[summary\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[correlation]"));
        assert!(toml_str.contains("[conversion]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.correlation.chart_height, 1800);
    }
}
