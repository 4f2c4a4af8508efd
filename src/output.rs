//! Output formatting and persistence for analytics results.
//!
//! Supports JSON reports, plain-text summaries, CSV rendering of aggregate
//! rows, and export of filtered views back to delimited text.

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analytics::types::{AggregateRow, Insights, Kpis, Measure, ProgramDelta, ProgramDrilldown};
use crate::filter::{FilterParams, FilteredView};
use crate::records::COLUMNS;

/// Placeholder printed for absent values.
const ABSENT: &str = "—";

/// Envelope written around every JSON result.
#[derive(Debug, Serialize)]
pub struct Report<'a, T: Serialize> {
    pub generated_at: DateTime<Utc>,
    pub filter: &'a FilterParams,
    pub rows: usize,
    pub result: &'a T,
}

/// Serializes `result` as pretty JSON, together with the filter that produced it.
pub fn to_json<T: Serialize>(filter: &FilterParams, rows: usize, result: &T) -> Result<String> {
    let report = Report {
        generated_at: Utc::now(),
        filter,
        rows,
        result,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Writes the view with every source column, in view order, as
/// comma-separated UTF-8 (not the `;`/Latin-1 default of the loader).
///
/// The header row is written even when the view is empty.
pub fn export_view<W: Write>(view: &FilteredView<'_>, writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    writer.write_record(COLUMNS)?;
    for record in view.iter() {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Exports the view to `path`, replacing any existing file.
#[tracing::instrument(skip(view), fields(path = %path.display(), rows = view.len()))]
pub fn export_view_to_path(path: &Path, view: &FilteredView<'_>) -> Result<()> {
    let file = File::create(path)?;
    export_view(view, file)?;
    info!("Filtered view exported");
    Ok(())
}

/// Writes aggregate rows as `year,label,value` CSV.
pub fn write_aggregate_csv<W: Write>(rows: &[AggregateRow], writer: W) -> Result<()> {
    debug!(rows = rows.len(), "Writing aggregate rows");
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(["year", "label", "value"])?;
    for row in rows {
        let value = match row.value {
            Measure::Count(n) => n.to_string(),
            Measure::Share(s) => format!("{s:.6}"),
        };
        writer.write_record([
            row.year.to_string(),
            row.label.clone().unwrap_or_default(),
            value,
        ])?;
    }
    writer.flush()?;

    Ok(())
}

/// Formats a share as a percentage with one decimal, or the absent marker.
pub fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v * 100.0),
        None => ABSENT.to_string(),
    }
}

pub fn render_kpis(kpis: &Kpis) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Total enrollments: {}", kpis.total);
    let _ = writeln!(out, "Change vs previous year: {}", percent(kpis.yoy_delta));

    let latest = kpis
        .latest_year
        .map(|y| y.to_string())
        .unwrap_or_else(|| ABSENT.to_string());
    let _ = writeln!(
        out,
        "Female share ({latest}): {}",
        percent(kpis.female_share_latest_year)
    );

    match &kpis.top_category_share {
        Some(top) => {
            let _ = writeln!(
                out,
                "Largest category ({latest}): {} {}",
                top.category,
                percent(Some(top.share))
            );
        }
        None => {
            let _ = writeln!(out, "Largest category ({latest}): {ABSENT}");
        }
    }

    out
}

pub fn render_insights(insights: &Insights) -> String {
    let mut out = String::new();

    let (Some(first), Some(last)) = (insights.first_year, insights.last_year) else {
        let _ = writeln!(out, "No data for the selected filters.");
        return out;
    };

    let _ = writeln!(out, "Top growth ({first} -> {last})");
    write_deltas(&mut out, &insights.top_growth);

    let _ = writeln!(out);
    let _ = writeln!(out, "Top decline ({first} -> {last})");
    write_deltas(&mut out, &insights.top_decline);

    let _ = writeln!(out);
    let _ = writeln!(out, "Category participation ({first} -> {last}, percentage points)");
    if insights.category_shift.is_empty() {
        let _ = writeln!(out, "  {ABSENT}");
    }
    for shift in &insights.category_shift {
        let _ = writeln!(
            out,
            "  {}: {} -> {} ({:+.1} pp)",
            shift.category,
            percent(shift.share_first_year),
            percent(shift.share_last_year),
            shift.delta_percentage_points
        );
    }

    out
}

fn write_deltas(out: &mut String, deltas: &[ProgramDelta]) {
    if deltas.is_empty() {
        let _ = writeln!(out, "  {ABSENT}");
        return;
    }
    for d in deltas {
        let _ = writeln!(
            out,
            "  {}: {} -> {} ({:+}, {})",
            d.program,
            d.count_first_year,
            d.count_last_year,
            d.delta_absolute,
            percent(d.delta_relative)
        );
    }
}

pub fn render_drilldown(drill: &ProgramDrilldown) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", drill.program);
    for row in &drill.totals_by_year {
        let _ = writeln!(out, "  {}: {}", row.year, row.value.as_f64());
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "By sex ({}): M {} / F {}",
        drill.latest_year, drill.male_latest_year, drill.female_latest_year
    );
    let _ = writeln!(out, "By category ({}):", drill.latest_year);
    for row in &drill.categories_latest_year {
        let _ = writeln!(
            out,
            "  {}: {}",
            row.label.as_deref().unwrap_or(ABSENT),
            row.value.as_f64()
        );
    }
    let _ = writeln!(
        out,
        "Occupancy ({}): {}",
        drill.latest_year,
        percent(drill.occupancy_latest_year)
    );

    out
}
