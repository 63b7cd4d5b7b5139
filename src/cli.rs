//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::SortKey;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// CatLens - exploratory analysis of categorical columns
///
/// Summarize value frequencies, compare user share with conversion per
/// group, and test two categorical columns for association with a
/// chi-squared test and affinity heatmaps.
///
/// Examples:
///   catlens -i bookings.csv summary device_type country --top 5
///   catlens -i bookings.csv save-summary device_type country --name bookings
///   catlens -i bookings.csv conversion device_type --sort-by conversion-rate
///   catlens -i bookings.csv correlate device_type plan --min-sample 30
///   catlens init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CSV file to analyze
    ///
    /// Required by every command except init-config.
    #[arg(short, long, value_name = "CSV", env = "CATLENS_INPUT", global = true)]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .catlens.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Field delimiter of the CSV file
    #[arg(long, default_value = ",", value_name = "CHAR", global = true)]
    pub delimiter: String,

    /// Directory for charts and summary files
    ///
    /// Overrides [general] output_dir from the config file.
    #[arg(short, long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Analyses offered by the tool.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print distinct, missing and most frequent values per column
    Summary {
        /// Columns to summarize
        #[arg(required = true, value_name = "COLUMN")]
        columns: Vec<String>,

        /// Number of most frequent values to show
        #[arg(long, value_name = "N")]
        top: Option<usize>,
    },

    /// Write the full value counts of columns to a text file
    SaveSummary {
        /// Columns to include; unknown columns are skipped
        #[arg(required = true, value_name = "COLUMN")]
        columns: Vec<String>,

        /// Dataset name used in the file name and heading
        #[arg(long, value_name = "NAME")]
        name: String,
    },

    /// Compare user share and conversion rate per group
    Conversion {
        /// Column to group by
        #[arg(value_name = "COLUMN")]
        column: String,

        /// Column identifying users
        #[arg(long, value_name = "COLUMN")]
        id_column: Option<String>,

        /// Column holding the conversion flag
        #[arg(long, value_name = "COLUMN")]
        flag_column: Option<String>,

        /// Field to order groups by
        #[arg(long, default_value = "user-share", value_name = "KEY")]
        sort_by: SortKey,

        /// Sort in ascending order
        #[arg(long)]
        ascending: bool,

        /// Output format (text, json)
        #[arg(long, default_value = "text", value_name = "FORMAT")]
        format: OutputFormat,

        /// Do not render the bar chart
        #[arg(long)]
        no_chart: bool,
    },

    /// Test two categorical columns for association
    Correlate {
        /// Row variable
        #[arg(value_name = "VAR1")]
        var1: String,

        /// Column variable
        #[arg(value_name = "VAR2")]
        var2: String,

        /// Minimum cell count for the affinity matrix
        #[arg(long, value_name = "N")]
        min_sample: Option<u64>,

        /// Disable the Yates continuity correction on 2x2 tables
        #[arg(long)]
        no_yates: bool,

        /// Output format (text, json)
        #[arg(long, default_value = "text", value_name = "FORMAT")]
        format: OutputFormat,

        /// Do not render the heatmaps
        #[arg(long)]
        no_chart: bool,
    },

    /// Generate a default .catlens.toml configuration file
    InitConfig,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether the command reads the input table.
    pub fn needs_input(&self) -> bool {
        !matches!(self.command, Command::InitConfig)
    }

    /// Get the input path (should be validated first).
    pub fn input_path(&self) -> &Path {
        self.input.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// The delimiter as a byte (should be validated first).
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Skip input validation for init-config
        if !self.needs_input() {
            return Ok(());
        }

        if self.delimiter.len() != 1 || !self.delimiter.is_ascii() {
            return Err(format!(
                "Delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            ));
        }

        let input = match self.input {
            Some(ref input) => input,
            None => return Err("An input file is required (--input or CATLENS_INPUT)".to_string()),
        };
        if !input.exists() {
            return Err(format!("Input file does not exist: {}", input.display()));
        }
        if !input.is_file() {
            return Err(format!("Input path is not a file: {}", input.display()));
        }

        match self.command {
            Command::Summary { top: Some(0), .. } => {
                return Err("--top must be at least 1".to_string());
            }
            Command::SaveSummary { ref name, .. } if name.trim().is_empty() => {
                return Err("--name must not be empty".to_string());
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn make_args(input: &Path, command: Command) -> Args {
        Args {
            input: Some(input.to_path_buf()),
            config: None,
            verbose: false,
            quiet: false,
            delimiter: ",".to_string(),
            output_dir: None,
            command,
        }
    }

    fn summary_command() -> Command {
        Command::Summary {
            columns: vec!["device".to_string()],
            top: None,
        }
    }

    #[test]
    fn test_validation_accepts_existing_file() {
        let file = NamedTempFile::new().unwrap();
        let args = make_args(file.path(), summary_command());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let args = make_args(Path::new("does/not/exist.csv"), summary_command());
        assert!(args.validate().is_err());

        let mut args = args;
        args.input = None;
        assert!(args.validate().unwrap_err().contains("input file is required"));
    }

    #[test]
    fn test_validation_directory_input() {
        let dir = tempfile::tempdir().unwrap();
        let args = make_args(dir.path(), summary_command());
        assert!(args.validate().unwrap_err().contains("not a file"));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path(), summary_command());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_delimiter() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path(), summary_command());

        args.delimiter = ";".to_string();
        assert!(args.validate().is_ok());
        assert_eq!(args.delimiter_byte(), b';');

        args.delimiter = ";;".to_string();
        assert!(args.validate().is_err());

        args.delimiter = "§".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_top_zero() {
        let file = NamedTempFile::new().unwrap();
        let args = make_args(
            file.path(),
            Command::Summary {
                columns: vec!["device".to_string()],
                top: Some(0),
            },
        );
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_needs_no_input() {
        let mut args = make_args(Path::new("missing.csv"), Command::InitConfig);
        args.input = None;
        assert!(!args.needs_input());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_correlate() {
        let args = Args::try_parse_from([
            "catlens",
            "-i",
            "data.csv",
            "correlate",
            "device",
            "plan",
            "--min-sample",
            "30",
            "--format",
            "json",
        ])
        .unwrap();

        match args.command {
            Command::Correlate {
                var1,
                var2,
                min_sample,
                no_yates,
                format,
                no_chart,
            } => {
                assert_eq!(var1, "device");
                assert_eq!(var2, "plan");
                assert_eq!(min_sample, Some(30));
                assert!(!no_yates);
                assert_eq!(format, OutputFormat::Json);
                assert!(!no_chart);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_conversion_sort_key() {
        let args = Args::try_parse_from([
            "catlens",
            "conversion",
            "channel",
            "--sort-by",
            "conversion-rate",
            "--ascending",
            "-o",
            "charts",
        ])
        .unwrap();

        assert_eq!(args.output_dir, Some(PathBuf::from("charts")));
        match args.command {
            Command::Conversion {
                sort_by, ascending, ..
            } => {
                assert_eq!(sort_by, SortKey::ConversionRate);
                assert!(ascending);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
