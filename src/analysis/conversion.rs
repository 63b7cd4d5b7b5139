//! Share of users and conversion rate per group.

use crate::error::AnalysisError;
use crate::models::{Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field to order conversion rows by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Share of all users (default)
    #[default]
    UserShare,
    /// Conversion rate within the group
    ConversionRate,
    /// Number of users in the group
    TotalUsers,
    /// Number of converted users in the group
    BookedUsers,
    /// Group label
    Label,
}

/// Aggregates of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRow {
    pub group: Value,
    pub total_users: usize,
    pub booked_users: f64,
    /// Percent, rounded to two decimals.
    pub conversion_rate: f64,
    /// Percent, rounded to two decimals.
    pub user_share: f64,
}

/// Per-group share and conversion for one column.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    pub column: String,
    pub rows: Vec<ConversionRow>,
    /// Conversion over all groups, in percent.
    pub global_conversion: f64,
}

/// Which columns identify users and conversions.
#[derive(Debug, Clone)]
pub struct ConversionColumns<'a> {
    pub group: &'a str,
    pub id: &'a str,
    pub flag: &'a str,
}

/// Group a table by `columns.group` and compute share and conversion.
///
/// Users are the non-missing ids of a group; conversions are the sum of the
/// flag column (booleans count as 0/1, missing as 0).
pub fn conversion_summary(
    table: &Table,
    columns: &ConversionColumns<'_>,
    sort_by: SortKey,
    ascending: bool,
) -> Result<ConversionSummary, AnalysisError> {
    let groups = table.column(columns.group)?;
    let ids = table.column(columns.id)?;
    let flags = table.column(columns.flag)?;

    if table.is_empty() {
        return Err(AnalysisError::EmptyTable);
    }

    let mut totals: BTreeMap<&Value, (usize, f64)> = BTreeMap::new();
    for ((group, id), flag) in groups.iter().zip(ids).zip(flags) {
        if group.is_missing() {
            continue;
        }
        let entry = totals.entry(group).or_insert((0, 0.0));
        if !id.is_missing() {
            entry.0 += 1;
        }
        entry.1 += flag.as_f64().unwrap_or(0.0);
    }

    let all_users: usize = totals.values().map(|(users, _)| users).sum();
    let all_booked: f64 = totals.values().map(|(_, booked)| booked).sum();

    let mut rows: Vec<ConversionRow> = totals
        .into_iter()
        .map(|(group, (total_users, booked_users))| ConversionRow {
            group: group.clone(),
            total_users,
            booked_users,
            conversion_rate: round2(ratio(booked_users, total_users as f64) * 100.0),
            user_share: round2(ratio(total_users as f64, all_users as f64) * 100.0),
        })
        .collect();

    sort_rows(&mut rows, sort_by, ascending);

    Ok(ConversionSummary {
        column: columns.group.to_string(),
        rows,
        global_conversion: round2(ratio(all_booked, all_users as f64) * 100.0),
    })
}

fn sort_rows(rows: &mut [ConversionRow], sort_by: SortKey, ascending: bool) {
    rows.sort_by(|a, b| {
        let ordering = match sort_by {
            SortKey::UserShare => a.user_share.total_cmp(&b.user_share),
            SortKey::ConversionRate => a.conversion_rate.total_cmp(&b.conversion_rate),
            SortKey::TotalUsers => a.total_users.cmp(&b.total_users),
            SortKey::BookedUsers => a.booked_users.total_cmp(&b.booked_users),
            SortKey::Label => a.group.cmp(&b.group),
        };
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

fn ratio(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: ConversionColumns<'static> = ConversionColumns {
        group: "channel",
        id: "user_id",
        flag: "booked",
    };

    fn table() -> Table {
        Table::from_labels(&[
            ("user_id", vec!["1", "2", "3", "4", "5", "6", "7", ""]),
            (
                "channel",
                vec!["ads", "ads", "seo", "ads", "seo", "mail", "", "seo"],
            ),
            (
                "booked",
                vec!["true", "false", "true", "true", "false", "false", "true", "false"],
            ),
        ])
    }

    #[test]
    fn test_conversion_summary() {
        let summary = conversion_summary(&table(), &COLUMNS, SortKey::UserShare, false).unwrap();

        assert_eq!(summary.column, "channel");
        assert_eq!(summary.rows.len(), 3);

        let ads = &summary.rows[0];
        assert_eq!(ads.group, Value::from("ads"));
        assert_eq!(ads.total_users, 3);
        assert_eq!(ads.booked_users, 2.0);
        assert_eq!(ads.conversion_rate, 66.67);
        assert_eq!(ads.user_share, 50.0);

        // seo has one missing id: 2 users, 1 booking
        let seo = summary.rows.iter().find(|r| r.group == Value::from("seo")).unwrap();
        assert_eq!(seo.total_users, 2);
        assert_eq!(seo.conversion_rate, 50.0);

        // 3 bookings over 6 users (the row without a channel is dropped)
        assert_eq!(summary.global_conversion, 50.0);
    }

    #[test]
    fn test_shares_sum_to_hundred() {
        let summary = conversion_summary(&table(), &COLUMNS, SortKey::Label, true).unwrap();
        let total: f64 = summary.rows.iter().map(|r| r.user_share).sum();
        assert!((total - 100.0).abs() < 0.05);
    }

    #[test]
    fn test_sort_orders() {
        let summary = conversion_summary(&table(), &COLUMNS, SortKey::Label, true).unwrap();
        let labels: Vec<String> = summary.rows.iter().map(|r| r.group.to_string()).collect();
        assert_eq!(labels, vec!["ads", "mail", "seo"]);

        let summary =
            conversion_summary(&table(), &COLUMNS, SortKey::ConversionRate, true).unwrap();
        assert_eq!(summary.rows[0].group, Value::from("mail"));
        assert_eq!(summary.rows[0].conversion_rate, 0.0);
    }

    #[test]
    fn test_numeric_flags() {
        let table = Table::from_labels(&[
            ("user_id", vec!["1", "2", "3", "4"]),
            ("channel", vec!["a", "a", "b", "b"]),
            ("booked", vec!["1", "0", "1", ""]),
        ]);
        let summary = conversion_summary(&table, &COLUMNS, SortKey::Label, true).unwrap();
        assert_eq!(summary.rows[0].booked_users, 1.0);
        assert_eq!(summary.rows[1].conversion_rate, 50.0);
    }

    #[test]
    fn test_missing_flag_column() {
        let table = Table::from_labels(&[("user_id", vec!["1"]), ("channel", vec!["a"])]);
        let err = conversion_summary(&table, &COLUMNS, SortKey::UserShare, false).unwrap_err();
        assert!(matches!(err, AnalysisError::ColumnNotFound { ref column, .. } if column == "booked"));
    }
}
