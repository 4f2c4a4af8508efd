use std::collections::BTreeMap;

use crate::analytics::types::{AggregateRow, FEMALE, MALE, Measure};
use crate::analytics::utility::{share_or_zero, sum_by};
use crate::filter::FilteredView;

/// Total enrollments per year, ascending by year.
pub fn totals_by_year(view: &FilteredView<'_>) -> Vec<AggregateRow> {
    sum_by(view.iter(), |r| r.origin_year, |r| r.enrolled_total)
        .into_iter()
        .map(|(year, total)| AggregateRow::by_year(year, Measure::Count(total)))
        .collect()
}

/// Male and female enrollments per year, as `F` then `M` rows for each year.
///
/// With `share` set, each count is divided by the year's `M + F`; a year where
/// both counts are zero reports two zero shares.
pub fn sex_shares_by_year(view: &FilteredView<'_>, share: bool) -> Vec<AggregateRow> {
    let mut by_year: BTreeMap<i32, (i64, i64)> = BTreeMap::new();
    for record in view.iter() {
        let entry = by_year.entry(record.origin_year).or_insert((0, 0));
        entry.0 += record.enrolled_female;
        entry.1 += record.enrolled_male;
    }

    let mut rows = Vec::with_capacity(by_year.len() * 2);
    for (year, (female, male)) in by_year {
        let (female, male) = if share {
            let both = female + male;
            (
                Measure::Share(share_or_zero(female, both)),
                Measure::Share(share_or_zero(male, both)),
            )
        } else {
            (Measure::Count(female), Measure::Count(male))
        };
        rows.push(AggregateRow::labelled(year, FEMALE, female));
        rows.push(AggregateRow::labelled(year, MALE, male));
    }
    rows
}

/// Total enrollments per `(year, category)`, ascending by year then category.
///
/// With `share` set, each value is divided by the year's total across
/// categories, or zero when that total is zero.
pub fn category_by_year(view: &FilteredView<'_>, share: bool) -> Vec<AggregateRow> {
    let groups = sum_by(
        view.iter(),
        |r| (r.origin_year, r.admission_category.as_str()),
        |r| r.enrolled_total,
    );

    let mut year_totals: BTreeMap<i32, i64> = BTreeMap::new();
    if share {
        for (&(year, _), total) in &groups {
            *year_totals.entry(year).or_insert(0) += total;
        }
    }

    groups
        .into_iter()
        .map(|((year, category), total)| {
            let value = if share {
                let year_total = year_totals.get(&year).copied().unwrap_or(0);
                Measure::Share(share_or_zero(total, year_total))
            } else {
                Measure::Count(total)
            };
            AggregateRow::labelled(year, category, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EnrollmentRecord, RecordTable};

    fn table() -> RecordTable {
        vec![
            EnrollmentRecord::new("Design", 2021, "General").with_enrolled(30, 10, 20),
            EnrollmentRecord::new("Design", 2020, "General").with_enrolled(10, 5, 5),
            EnrollmentRecord::new("Physics", 2020, "Exempt").with_enrolled(30, 0, 0),
            EnrollmentRecord::new("Physics", 2021, "Agreement").with_enrolled(10, 6, 2),
            EnrollmentRecord::new("Physics", 2022, "General").with_enrolled(0, 0, 0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_totals_by_year_ascending() {
        let table = table();
        let view = FilteredView::from_table(&table);
        let rows = totals_by_year(&view);
        assert_eq!(
            rows,
            vec![
                AggregateRow::by_year(2020, Measure::Count(40)),
                AggregateRow::by_year(2021, Measure::Count(40)),
                AggregateRow::by_year(2022, Measure::Count(0)),
            ]
        );
    }

    #[test]
    fn test_totals_by_year_empty_view() {
        let view = FilteredView::default();
        assert!(totals_by_year(&view).is_empty());
        assert!(sex_shares_by_year(&view, true).is_empty());
        assert!(category_by_year(&view, true).is_empty());
    }

    #[test]
    fn test_sex_counts_ordered_female_then_male() {
        let table = table();
        let view = FilteredView::from_table(&table);
        let rows = sex_shares_by_year(&view, false);
        let labels: Vec<(i32, &str)> = rows
            .iter()
            .map(|r| (r.year, r.label.as_deref().unwrap()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (2020, "F"),
                (2020, "M"),
                (2021, "F"),
                (2021, "M"),
                (2022, "F"),
                (2022, "M")
            ]
        );
        assert_eq!(rows[2].value, Measure::Count(22));
        assert_eq!(rows[3].value, Measure::Count(16));
    }

    #[test]
    fn test_sex_shares_zero_fill_when_no_split() {
        // Zero-fill here differs on purpose from the KPI female share, which is
        // absent when the denominator is zero.
        let table = table();
        let view = FilteredView::from_table(&table);
        let rows = sex_shares_by_year(&view, true);
        let year_2022: Vec<_> = rows.iter().filter(|r| r.year == 2022).collect();
        assert_eq!(year_2022.len(), 2);
        assert!(year_2022.iter().all(|r| r.value == Measure::Share(0.0)));
    }

    #[test]
    fn test_sex_shares_sum_to_zero_or_one() {
        let table = table();
        let view = FilteredView::from_table(&table);
        let rows = sex_shares_by_year(&view, true);
        for pair in rows.chunks(2) {
            let sum = pair[0].value.as_f64() + pair[1].value.as_f64();
            assert!(sum == 0.0 || (sum - 1.0).abs() < 1e-9, "sum was {sum}");
        }
    }

    #[test]
    fn test_negative_counts_divide_through() {
        // zero-fill only applies to a zero total; a negative one is divided by
        let table: RecordTable = vec![
            EnrollmentRecord::new("Design", 2020, "General").with_enrolled(-10, 5, -5),
            EnrollmentRecord::new("Design", 2021, "General").with_enrolled(10, 10, -15),
            EnrollmentRecord::new("Design", 2021, "Exempt").with_enrolled(-20, 0, 0),
        ]
        .into_iter()
        .collect();
        let view = FilteredView::from_table(&table);

        let sex = sex_shares_by_year(&view, true);
        assert_eq!(sex[0].value, Measure::Share(0.0));
        assert_eq!(sex[1].value, Measure::Share(0.0));
        assert_eq!(sex[2].value, Measure::Share(3.0));
        assert_eq!(sex[3].value, Measure::Share(-2.0));

        let categories = category_by_year(&view, true);
        assert!(categories.iter().all(|r| r.value.as_f64().is_finite()));
        assert_eq!(
            categories[1],
            AggregateRow::labelled(2021, "Exempt", Measure::Share(2.0))
        );
        assert_eq!(
            categories[2],
            AggregateRow::labelled(2021, "General", Measure::Share(-1.0))
        );

        assert_eq!(
            totals_by_year(&view),
            vec![
                AggregateRow::by_year(2020, Measure::Count(-10)),
                AggregateRow::by_year(2021, Measure::Count(-10)),
            ]
        );
    }

    #[test]
    fn test_category_by_year_absolute() {
        let table = table();
        let view = FilteredView::from_table(&table);
        let rows = category_by_year(&view, false);
        assert_eq!(
            rows,
            vec![
                AggregateRow::labelled(2020, "Exempt", Measure::Count(30)),
                AggregateRow::labelled(2020, "General", Measure::Count(10)),
                AggregateRow::labelled(2021, "Agreement", Measure::Count(10)),
                AggregateRow::labelled(2021, "General", Measure::Count(30)),
                AggregateRow::labelled(2022, "General", Measure::Count(0)),
            ]
        );
    }

    #[test]
    fn test_category_shares() {
        let table = table();
        let view = FilteredView::from_table(&table);
        let rows = category_by_year(&view, true);
        assert_eq!(rows[0].value, Measure::Share(0.75));
        assert_eq!(rows[1].value, Measure::Share(0.25));
        // a year whose total is zero reports zero shares
        assert_eq!(rows[4].value, Measure::Share(0.0));

        let sum_2021: f64 = rows
            .iter()
            .filter(|r| r.year == 2021)
            .map(|r| r.value.as_f64())
            .sum();
        assert!((sum_2021 - 1.0).abs() < 1e-9);
    }
}
