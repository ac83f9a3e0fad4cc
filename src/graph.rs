#![cfg(not(tarpaulin_include))]
use crate::record::{ApplicantRecord, SHEET_DATE_FORMAT};
use chrono::{Duration, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref ONLINE_SUFFIX: Regex = Regex::new(r"\s*\(ONLINE\)").unwrap();
}

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Number of Applicants Over Time".to_string(),
            x_label: "Date".to_string(),
            y_label: "Number of Applicants".to_string(),
            width: 900,
            height: 500,
        }
    }
}

/// Calendar date of a `DATE` cell, online marker ignored.
///
/// Cells that are not a plain `MM/DD/YYYY` date give `None`.
pub fn chart_date(cell: &str) -> Option<NaiveDate> {
    let stripped = ONLINE_SUFFIX.replace_all(cell, "");
    NaiveDate::parse_from_str(stripped.trim(), SHEET_DATE_FORMAT).ok()
}

/// Applicants counted per day, in date order.
///
/// Rows whose date cannot be read are left out.
pub fn applicants_per_day(records: &[ApplicantRecord]) -> Vec<(NaiveDate, u32)> {
    let mut counts: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for date in records.iter().filter_map(|r| chart_date(&r.date)) {
        *counts.entry(date).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

/// Render a per-day count series as an SVG line chart
///
/// The x axis spans the series padded by a day on each side so a single point
/// still gets a drawable range.
#[cfg(feature = "web")]
pub fn render_line_chart(
    series: &[(NaiveDate, u32)],
    options: &ChartOptions,
) -> Result<String, Box<dyn std::error::Error>> {
    use plotters::prelude::*;

    let today = chrono::Local::now().date_naive();
    let first = series.first().map(|(d, _)| *d).unwrap_or(today);
    let last = series.last().map(|(d, _)| *d).unwrap_or(today);
    let max_y = series.iter().map(|(_, c)| *c).max().unwrap_or(0);

    let x_range = (first - Duration::days(1))..(last + Duration::days(1));
    let y_range = 0u32..max_y + 1;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_label_formatter(&|d: &NaiveDate| d.format(SHEET_DATE_FORMAT).to_string())
            .draw()?;

        chart.draw_series(LineSeries::new(series.iter().copied(), &BLUE))?;
        chart.draw_series(
            series
                .iter()
                .map(|&(d, c)| Circle::new((d, c), 3, BLUE.filled())),
        )?;

        root.present()?;
    }

    Ok(svg)
}
