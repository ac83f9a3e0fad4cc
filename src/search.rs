//! Client-side filters over the applicant worksheet.
//!
//! Nothing is indexed: callers re-read the full worksheet and filter it here
//! on every request.

use crate::error::ValidationError;
use crate::record::{APPLICANT_COLUMNS, ApplicantRecord, display_contact_number, format_sheet_date};
use crate::store::Table;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;

pub const HISTORY_LEN: usize = 10;
pub const YEAR_MIN: i32 = 2023;
pub const YEAR_MAX: i32 = 2050;

/// Columns left out of the daily report
const REPORT_DROPPED: [&str; 3] = ["AGE", "GENDER", "CURRENT POSITION"];

/// Walk-in / online partition of the applicant rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionFilter {
    #[default]
    All,
    WalkIn,
    Online,
}

impl SubmissionFilter {
    pub fn matches(&self, record: &ApplicantRecord) -> bool {
        match self {
            SubmissionFilter::All => true,
            SubmissionFilter::WalkIn => !record.is_online(),
            SubmissionFilter::Online => record.is_online(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionFilter::All => "all",
            SubmissionFilter::WalkIn => "walk-in",
            SubmissionFilter::Online => "online",
        }
    }
}

/// Read every row of the applicant worksheet as a record
///
/// # Arguments
/// * `table` - The worksheet as returned by the store, in
///   [`APPLICANT_COLUMNS`] order
///
/// # Returns
/// One record per row, in sheet order
pub fn records_from_table(table: &Table) -> Vec<ApplicantRecord> {
    table
        .rows
        .iter()
        .map(|row| ApplicantRecord::from_row(row))
        .collect()
}

/// Case-insensitive substring match on the name
///
/// # Examples
/// ```
/// use ams::record::ApplicantRecord;
/// use ams::search::by_name;
///
/// let mut row = vec![String::new(); 12];
/// row[2] = "Juan Dela Cruz".to_string();
/// let records = vec![ApplicantRecord::from_row(&row)];
/// assert_eq!(by_name(&records, "dela").len(), 1);
/// assert!(by_name(&records, "santos").is_empty());
/// ```
pub fn by_name<'a>(records: &'a [ApplicantRecord], query: &str) -> Vec<&'a ApplicantRecord> {
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&needle))
        .collect()
}

/// Applicants whose `DATE` cell mentions `date`
///
/// # Arguments
/// * `records` - Every applicant
/// * `date` - Day to look for, matched as `MM/DD/YYYY` text
/// * `filter` - Walk-in/online partition, decided by the online marker
///
/// # Returns
/// Matching records in sheet order
pub fn by_date(
    records: &[ApplicantRecord],
    date: NaiveDate,
    filter: SubmissionFilter,
) -> Vec<&ApplicantRecord> {
    let needle = format_sheet_date(date);
    records
        .iter()
        .filter(|r| r.date.contains(&needle) && filter.matches(r))
        .collect()
}

/// Match on the date submitted; the walk-in/online split still follows the
/// marker on the record's `DATE`.
pub fn by_date_submitted(
    records: &[ApplicantRecord],
    date: NaiveDate,
    filter: SubmissionFilter,
) -> Vec<&ApplicantRecord> {
    let needle = format_sheet_date(date);
    records
        .iter()
        .filter(|r| r.date_submitted.contains(&needle) && filter.matches(r))
        .collect()
}

pub fn by_position<'a>(records: &'a [ApplicantRecord], position: &str) -> Vec<&'a ApplicantRecord> {
    records
        .iter()
        .filter(|r| r.desired_position == position)
        .collect()
}

/// Sorted distinct desired positions, for the position picker
pub fn positions(records: &[ApplicantRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.desired_position.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Applicants whose `DATE` cell mentions `year`
///
/// # Errors
/// `YearOutOfRange` unless `YEAR_MIN <= year <= YEAR_MAX`
pub fn by_year(
    records: &[ApplicantRecord],
    year: i32,
) -> Result<Vec<&ApplicantRecord>, ValidationError> {
    if !(YEAR_MIN..=YEAR_MAX).contains(&year) {
        return Err(ValidationError::YearOutOfRange {
            min: YEAR_MIN,
            max: YEAR_MAX,
        });
    }
    let needle = year.to_string();
    Ok(records.iter().filter(|r| r.date.contains(&needle)).collect())
}

/// The most recent entries, oldest first
///
/// # Arguments
/// * `records` - Every applicant, in sheet order
/// * `filter` - Applied before taking the last [`HISTORY_LEN`]
pub fn last_ten(records: &[ApplicantRecord], filter: SubmissionFilter) -> Vec<&ApplicantRecord> {
    let matching: Vec<&ApplicantRecord> = records.iter().filter(|r| filter.matches(r)).collect();
    let skip = matching.len().saturating_sub(HISTORY_LEN);
    matching.into_iter().skip(skip).collect()
}

/// Records as displayed: every column, commas stripped from contact numbers.
///
/// Cells other than the contact number are shown exactly as stored.
pub fn results_table(records: &[&ApplicantRecord]) -> Table {
    Table::with_rows(
        &APPLICANT_COLUMNS,
        records.iter().map(|r| r.display_row()).collect(),
    )
}

/// A whole worksheet as displayed and edited.
///
/// Rows stay as stored except for commas removed from `CONTACT NUMBER`, so
/// writing the result back only changes how contact numbers are written.
///
/// # Examples
/// ```
/// use ams::store::Table;
/// use ams::search::display_table;
///
/// let table = Table::with_rows(
///     &["NAME", "CONTACT NUMBER", "AGE"],
///     vec![vec!["ANA".into(), "0917,123,4567".into(), "N/A".into()]],
/// );
/// let shown = display_table(&table);
/// assert_eq!(shown.rows[0], vec!["ANA", "09171234567", "N/A"]);
/// ```
pub fn display_table(table: &Table) -> Table {
    let mut shown = table.clone();
    if let Some(contact) = shown.column_index("CONTACT NUMBER") {
        for row in shown.rows.iter_mut() {
            if let Some(cell) = row.get_mut(contact) {
                *cell = display_contact_number(cell);
            }
        }
    }
    shown
}

/// Prefix each row with its 1-based position under a blank header
pub fn numbered(mut table: Table) -> Table {
    table.columns.insert(0, " ".to_string());
    for (i, row) in table.rows.iter_mut().enumerate() {
        row.insert(0, (i + 1).to_string());
    }
    table
}

/// Printable daily report: numbered rows, personal columns dropped and an
/// empty `REMARKS` column to fill in by hand.
pub fn daily_report(records: &[&ApplicantRecord]) -> Table {
    let full = results_table(records);
    let keep: Vec<usize> = full
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !REPORT_DROPPED.contains(&c.as_str()))
        .map(|(i, _)| i)
        .collect();

    let mut columns: Vec<String> = keep.iter().map(|&i| full.columns[i].clone()).collect();
    columns.push("REMARKS".to_string());
    let rows = full
        .rows
        .iter()
        .map(|row| {
            let mut kept: Vec<String> = keep.iter().map(|&i| row[i].clone()).collect();
            kept.push(String::new());
            kept
        })
        .collect();

    numbered(Table { columns, rows })
}

/// A search as picked on the search page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Search {
    Name(String),
    Date {
        date: NaiveDate,
        filter: SubmissionFilter,
    },
    DateSubmitted {
        date: NaiveDate,
        filter: SubmissionFilter,
    },
    Position(String),
    Year(i32),
}

impl Search {
    /// Run against the full worksheet and shape the result for display
    pub fn run(&self, records: &[ApplicantRecord]) -> Result<Table, ValidationError> {
        let table = match self {
            Search::Name(query) => results_table(&by_name(records, query)),
            Search::Date { date, filter } => daily_report(&by_date(records, *date, *filter)),
            Search::DateSubmitted { date, filter } => {
                numbered(results_table(&by_date_submitted(records, *date, *filter)))
            }
            Search::Position(position) => results_table(&by_position(records, position)),
            Search::Year(year) => results_table(&by_year(records, *year)?),
        };
        Ok(table)
    }

    pub fn heading(&self) -> String {
        match self {
            Search::Name(query) => format!("Search Results for '{}'", query),
            Search::Date { date, .. } | Search::DateSubmitted { date, .. } => {
                format!("Search Results for '{}'", format_sheet_date(*date))
            }
            Search::Position(position) => {
                format!("Search Results for Desired Position '{}'", position)
            }
            Search::Year(year) => format!("Search Results for Year {}", year),
        }
    }

    /// Suggested file name for the CSV download of the results
    pub fn download_name(&self) -> String {
        match self {
            Search::Name(query) => format!("{}.csv", query),
            Search::Date { date, .. } | Search::DateSubmitted { date, .. } => {
                format!("{}.csv", date.format("%m-%d-%Y"))
            }
            Search::Position(position) => format!("{}.csv", position),
            Search::Year(year) => format!("APPLICANT SUMMARY {}.csv", year),
        }
    }
}
