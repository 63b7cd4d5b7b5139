//! Text and JSON report generation.
//!
//! Every generator returns a `String`; `main` decides whether it goes to
//! stdout or to a file.

use crate::analysis::{summarize_column, ColumnSummary, ConversionSummary, CorrelationReport};
use crate::models::Table;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const RULE_WIDTH: usize = 60;

/// Generate the human-readable correlation report.
///
/// `chart` is the path of the rendered heatmaps, if any.
pub fn generate_correlation_report(report: &CorrelationReport, chart: Option<&Path>) -> String {
    let mut output = String::new();

    output.push_str(&generate_correlation_header(report));
    output.push_str(&generate_overview_section(report));
    output.push_str(&generate_chi_square_section(report));
    output.push_str(&generate_interpretation_section(report));
    output.push_str(&generate_visualization_section(chart));
    output.push_str(&generate_strongest_section(report));

    output
}

fn generate_correlation_header(report: &CorrelationReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "{}\nCorrelation analysis: {} vs {}\n{}\n",
        rule, report.var1, report.var2, rule
    )
}

fn generate_overview_section(report: &CorrelationReport) -> String {
    let mut section = String::new();

    section.push_str("\n1. Data overview:\n");
    section.push_str(&format!(
        "   {}: {} distinct values\n",
        report.var1, report.var1_distinct
    ));
    section.push_str(&format!(
        "   {}: {} distinct values\n",
        report.var2, report.var2_distinct
    ));
    section.push_str(&format!(
        "   Total observations: {}\n",
        report.observations
    ));

    section
}

fn generate_chi_square_section(report: &CorrelationReport) -> String {
    let test = &report.chi_square;
    let mut section = String::new();

    section.push_str("\n2. Pearson's chi-squared test:\n");
    section.push_str(&format!("   χ² = {:.2}\n", test.statistic));
    section.push_str(&format!("   p-value = {:.3}\n", test.p_value));
    section.push_str(&format!(
        "   Degrees of freedom = {}\n",
        test.degrees_of_freedom
    ));

    section
}

fn generate_interpretation_section(report: &CorrelationReport) -> String {
    format!("\n3. Interpretation:\n   {}\n", report.significance)
}

fn generate_visualization_section(chart: Option<&Path>) -> String {
    match chart {
        Some(path) => format!(
            "\n4. Visualization:\n   Heatmaps (counts, row percentages, affinity) saved to: {}\n",
            path.display()
        ),
        None => "\n4. Visualization:\n   Chart rendering skipped\n".to_string(),
    }
}

fn generate_strongest_section(report: &CorrelationReport) -> String {
    let mut section = String::new();

    section.push_str("\n5. Strongest associations:\n");
    for assoc in &report.strongest {
        section.push_str(&format!(
            "    {}: {} ({:.2}%)\n",
            assoc.row,
            assoc.column,
            assoc.share * 100.0
        ));
    }
    section.push('\n');

    section
}

/// Generate the console summary of one column, listing the `top_n` most
/// frequent values.
pub fn generate_column_summary(summary: &ColumnSummary, top_n: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("=== {} ===\n", summary.column));
    output.push_str(&format!("Unique values: {}\n", summary.distinct));
    output.push_str(&format!(
        "Missing values: {}\n",
        group_thousands(summary.missing as u64)
    ));
    output.push_str(&format!("\nTop {} most frequent values:\n", top_n));

    for entry in summary.top(top_n) {
        output.push_str(&format!(
            "'{}' - {} - {:.2}%\n",
            entry.value,
            group_thousands(entry.count as u64),
            entry.percentage
        ));
    }
    output.push_str("\n\n");

    output
}

/// Generate the contents of a unique-values summary file.
pub fn generate_unique_values_file(name: &str, summaries: &[ColumnSummary]) -> String {
    let mut lines: Vec<String> = vec![
        format!("Unique value summary per column in {}", name),
        "=".repeat(RULE_WIDTH),
        String::new(),
    ];

    for summary in summaries {
        lines.push(format!("Column: {}", summary.column));
        lines.push(format!("Distinct values: {}", summary.distinct));
        lines.push("Value - Count - Percent".to_string());

        for entry in &summary.counts {
            lines.push(format!(
                "'{}' - {} - {:.2}%",
                entry.value, entry.count, entry.percentage
            ));
        }

        if summary.missing > 0 {
            lines.push(format!(
                "NaN - {} - {:.2}%",
                summary.missing,
                summary.missing_percentage()
            ));
        }

        lines.push(String::new());
        lines.push("-".repeat(RULE_WIDTH));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Path of the unique-values summary file for a data set name.
pub fn unique_values_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{}_unique_values_summary.txt", name))
}

/// Summarize `columns` and write the listing to
/// `<output_dir>/<name>_unique_values_summary.txt`.
///
/// Columns missing from the table are skipped with a warning.
pub fn save_unique_values_summary<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    name: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let mut summaries = Vec::with_capacity(columns.len());
    for column in columns {
        let column = column.as_ref();
        if !table.has_column(column) {
            warn!("Skipping unknown column: {}", column);
            continue;
        }
        summaries.push(summarize_column(table, column)?);
    }

    let content = generate_unique_values_file(name, &summaries);

    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    let path = unique_values_path(output_dir, name);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;

    info!("Wrote unique value summary: {}", path.display());
    Ok(path)
}

/// Generate the console table of a conversion summary.
pub fn generate_conversion_report(summary: &ConversionSummary) -> String {
    let label_width = summary
        .rows
        .iter()
        .map(|r| r.group.to_string().chars().count())
        .chain(std::iter::once(summary.column.chars().count()))
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    output.push_str(&format!(
        "User share and conversion rate by {}\n",
        summary.column
    ));
    output.push_str(&"=".repeat(RULE_WIDTH));
    output.push('\n');
    output.push_str(&format!(
        "{:<width$}  {:>8}  {:>8}  {:>10}  {:>10}\n",
        summary.column,
        "users",
        "booked",
        "share %",
        "conv. %",
        width = label_width
    ));

    for row in &summary.rows {
        output.push_str(&format!(
            "{:<width$}  {:>8}  {:>8}  {:>10.2}  {:>10.2}\n",
            row.group.to_string(),
            row.total_users,
            row.booked_users,
            row.user_share,
            row.conversion_rate,
            width = label_width
        ));
    }

    output.push_str(&format!(
        "\nAverage conversion rate: {:.2}%\n",
        summary.global_conversion
    ));

    output
}

/// JSON document wrapping an analysis result.
#[derive(Debug, Serialize)]
struct JsonReport<'a, T: Serialize> {
    tool_version: &'static str,
    generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart: Option<&'a Path>,
    report: &'a T,
}

/// Generate a JSON report for a correlation or conversion result.
pub fn generate_json_report<T: Serialize>(report: &T, chart: Option<&Path>) -> Result<String> {
    let document = JsonReport {
        tool_version: env!("CARGO_PKG_VERSION"),
        generated_at: Utc::now(),
        chart,
        report,
    };
    serde_json::to_string_pretty(&document).map_err(Into::into)
}

/// Format an integer with `,` as thousands separator.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
