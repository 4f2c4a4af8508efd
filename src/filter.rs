//! Year-range, program and category selection over a [`RecordTable`].

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::FilterError;
use crate::records::{EnrollmentRecord, RecordTable};

/// Selection applied to a table. Every condition must hold for a record to be
/// kept; an empty program or category set keeps nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterParams {
    pub year_min: i32,
    pub year_max: i32,
    pub programs: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

impl FilterParams {
    pub fn new<P, C>(
        year_min: i32,
        year_max: i32,
        programs: P,
        categories: C,
    ) -> Result<Self, FilterError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let params = FilterParams {
            year_min,
            year_max,
            programs: programs.into_iter().map(Into::into).collect(),
            categories: categories.into_iter().map(Into::into).collect(),
        };
        params.validate()?;
        Ok(params)
    }

    /// Full year range, every program and every category in `table`.
    pub fn all(table: &RecordTable) -> Self {
        let (year_min, year_max) = table.year_bounds().unwrap_or((0, 0));
        FilterParams {
            year_min,
            year_max,
            programs: table.programs().into_iter().collect(),
            categories: table.categories().into_iter().collect(),
        }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.year_min > self.year_max {
            return Err(FilterError::InvalidFilterRange {
                year_min: self.year_min,
                year_max: self.year_max,
            });
        }
        Ok(())
    }

    pub fn matches(&self, record: &EnrollmentRecord) -> bool {
        (self.year_min..=self.year_max).contains(&record.origin_year)
            && self.programs.contains(&record.program)
            && self.categories.contains(&record.admission_category)
    }
}

/// Borrowed selection of records, in table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView<'a> {
    records: Vec<&'a EnrollmentRecord>,
}

impl<'a> FilteredView<'a> {
    /// View over every record of `table`.
    pub fn from_table(table: &'a RecordTable) -> Self {
        table.iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a EnrollmentRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Applies `params` again to an existing view.
    pub fn refine(&self, params: &FilterParams) -> Result<FilteredView<'a>, FilterError> {
        apply(self.records.iter().copied(), params)
    }

    /// Sub-view holding only the rows that satisfy `keep`.
    pub fn select(&self, keep: impl Fn(&EnrollmentRecord) -> bool) -> FilteredView<'a> {
        self.iter().filter(|r| keep(r)).collect()
    }

    /// Distinct years present in the view, ascending.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.iter().map(|r| r.origin_year).collect();
        set.into_iter().collect()
    }

    /// Distinct programs present in the view, ascending.
    pub fn programs(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.iter().map(|r| r.program.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }
}

impl<'a> FromIterator<&'a EnrollmentRecord> for FilteredView<'a> {
    fn from_iter<I: IntoIterator<Item = &'a EnrollmentRecord>>(iter: I) -> Self {
        FilteredView {
            records: iter.into_iter().collect(),
        }
    }
}

/// Selects the records of `table` that satisfy `params`.
pub fn filter<'a>(
    table: &'a RecordTable,
    params: &FilterParams,
) -> Result<FilteredView<'a>, FilterError> {
    apply(table.iter(), params)
}

fn apply<'a>(
    records: impl Iterator<Item = &'a EnrollmentRecord>,
    params: &FilterParams,
) -> Result<FilteredView<'a>, FilterError> {
    params.validate()?;
    Ok(records.filter(|r| params.matches(r)).collect())
}
