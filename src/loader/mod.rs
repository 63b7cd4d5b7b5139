//! CSV loading.
//!
//! Reads a delimited file with a header row into a [`Table`], inferring
//! each cell's type with [`Value::parse`].

use crate::models::{Table, Value};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Options for reading a CSV file.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether to show a spinner while reading.
    pub show_progress: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            show_progress: true,
        }
    }
}

/// Load a CSV file into a table.
pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<Table> {
    info!("Loading table from: {}", path.display());

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;

    let spinner = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Reading {}", path.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = read_table(file, options.delimiter)
        .with_context(|| format!("Failed to parse CSV file: {}", path.display()));

    if let Some(pb) = spinner {
        match &result {
            Ok(table) => pb.finish_with_message(format!("Loaded {} rows", table.len())),
            Err(_) => pb.abandon(),
        }
    }

    let table = result?;
    debug!(
        "Table shape: {} rows x {} columns",
        table.len(),
        table.column_names().len()
    );

    Ok(table)
}

/// Parse CSV content from any reader.
pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(false)
        .from_reader(reader);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to parse CSV row {}", index + 1))?;

        for (column, field) in columns.iter_mut().zip(record.iter()) {
            column.push(Value::parse(field));
        }
    }

    for column in columns.iter_mut() {
        widen_integers(column);
    }

    let named = headers
        .iter()
        .map(|h| h.to_string())
        .zip(columns)
        .collect();

    Table::from_columns(named)
}

/// Turn integers into floats in a purely numeric column that holds at least
/// one float, so `1` and `1.0` count as the same category.
fn widen_integers(column: &mut [Value]) {
    let numeric = column
        .iter()
        .all(|v| matches!(v, Value::Integer(_) | Value::Float(_) | Value::Missing));
    let has_float = column.iter().any(|v| matches!(v, Value::Float(_)));

    if !(numeric && has_float) {
        return;
    }

    for value in column.iter_mut() {
        if let Value::Integer(i) = *value {
            *value = Value::Float(i as f64);
        }
    }
}
