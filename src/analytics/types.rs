//! Result types produced by the analytics functions.
//!
//! Undefined ratios are `None` and serialize as `null`; they are never encoded
//! as zero or NaN.

use std::collections::BTreeMap;

use serde::Serialize;

/// Label used for male enrollments in sex breakdowns.
pub const MALE: &str = "M";
/// Label used for female enrollments in sex breakdowns.
pub const FEMALE: &str = "F";

/// Numeric field of an [`AggregateRow`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Measure {
    Count(i64),
    /// Proportion in `[0, 1]`.
    Share(f64),
}

impl Measure {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Measure::Count(n) => n as f64,
            Measure::Share(s) => s,
        }
    }
}

/// One grouped value: a year, an optional second key (category or sex label)
/// and the measure for that group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: Measure,
}

impl AggregateRow {
    pub(crate) fn by_year(year: i32, value: Measure) -> Self {
        AggregateRow {
            year,
            label: None,
            value,
        }
    }

    pub(crate) fn labelled(year: i32, label: &str, value: Measure) -> Self {
        AggregateRow {
            year,
            label: Some(label.to_string()),
            value,
        }
    }
}

/// A category together with its share of a year's enrollments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub share: f64,
}

/// Headline indicators for a filtered view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total: i64,
    pub latest_year: Option<i32>,
    /// Relative change between the two most recent years present.
    pub yoy_delta: Option<f64>,
    pub female_share_latest_year: Option<f64>,
    pub top_category_share: Option<CategoryShare>,
    /// Every category's share of the latest year; empty when that year sums to 0.
    pub category_shares_latest_year: BTreeMap<String, f64>,
}

/// First-year vs last-year enrollment of a single program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramDelta {
    pub program: String,
    pub count_first_year: i64,
    pub count_last_year: i64,
    pub delta_absolute: i64,
    /// Absent when the program had no enrollments in the first year.
    pub delta_relative: Option<f64>,
}

/// Change in a category's participation between the first and last year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShift {
    pub category: String,
    /// Absent when the category has no rows in the first year.
    pub share_first_year: Option<f64>,
    /// Absent when the category has no rows in the last year.
    pub share_last_year: Option<f64>,
    pub delta_percentage_points: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Insights {
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub top_growth: Vec<ProgramDelta>,
    pub top_decline: Vec<ProgramDelta>,
    pub category_shift: Vec<CategoryShift>,
}

/// History and latest-year breakdowns of one program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramDrilldown {
    pub program: String,
    pub totals_by_year: Vec<AggregateRow>,
    pub latest_year: i32,
    pub male_latest_year: i64,
    pub female_latest_year: i64,
    pub categories_latest_year: Vec<AggregateRow>,
    /// Enrolled per seat offered in the latest year, absent without seats.
    pub occupancy_latest_year: Option<f64>,
}
