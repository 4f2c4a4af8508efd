use crate::analytics::aggregate::{category_by_year, totals_by_year};
use crate::analytics::types::ProgramDrilldown;
use crate::filter::FilteredView;
use crate::records::EnrollmentRecord;

/// Breaks a single program down: its yearly totals, plus the sex split,
/// category mix and occupancy of its most recent year.
///
/// Returns `None` when the program has no rows in `view`.
pub fn program_drilldown(view: &FilteredView<'_>, program: &str) -> Option<ProgramDrilldown> {
    let rows = view.select(|r| r.program == program);
    let latest_year = rows.iter().map(|r| r.origin_year).max()?;
    let latest = rows.select(|r| r.origin_year == latest_year);

    let mut rollup = EnrollmentRecord::new(program, latest_year, "");
    for record in latest.iter() {
        rollup.add_counts(record);
    }

    Some(ProgramDrilldown {
        program: program.to_string(),
        totals_by_year: totals_by_year(&rows),
        latest_year,
        male_latest_year: rollup.enrolled_male,
        female_latest_year: rollup.enrolled_female,
        categories_latest_year: category_by_year(&latest, false),
        occupancy_latest_year: rollup.occupancy(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::types::Measure;
    use crate::records::{EnrollmentRecord, RecordTable};

    fn table() -> RecordTable {
        vec![
            EnrollmentRecord::new("Design", 2020, "General")
                .with_enrolled(30, 10, 20)
                .with_seats(40, 10),
            EnrollmentRecord::new("Design", 2021, "General")
                .with_enrolled(25, 15, 10)
                .with_seats(40, 15),
            EnrollmentRecord::new("Design", 2021, "Exempt")
                .with_enrolled(15, 5, 10)
                .with_seats(10, 0),
            EnrollmentRecord::new("Physics", 2021, "General").with_enrolled(5, 5, 0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_unknown_program() {
        let table = table();
        let view = FilteredView::from_table(&table);
        assert_eq!(program_drilldown(&view, "Music"), None);
    }

    #[test]
    fn test_latest_year_breakdowns() {
        let table = table();
        let view = FilteredView::from_table(&table);
        let drill = program_drilldown(&view, "Design").unwrap();

        assert_eq!(drill.latest_year, 2021);
        assert_eq!(drill.totals_by_year.len(), 2);
        assert_eq!(drill.totals_by_year[1].value, Measure::Count(40));
        assert_eq!(drill.male_latest_year, 20);
        assert_eq!(drill.female_latest_year, 20);
        assert_eq!(drill.categories_latest_year.len(), 2);
        assert_eq!(
            drill.categories_latest_year[0].label.as_deref(),
            Some("Exempt")
        );
        assert_eq!(drill.occupancy_latest_year, Some(0.8));
    }

    #[test]
    fn test_occupancy_absent_without_seats() {
        let table = table();
        let view = FilteredView::from_table(&table);
        let drill = program_drilldown(&view, "Physics").unwrap();
        assert_eq!(drill.occupancy_latest_year, None);
        assert_eq!(drill.female_latest_year, 0);
    }
}
