use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::analytics::types::{CategoryShift, Insights, ProgramDelta};
use crate::analytics::utility::{share_or_zero, sum_by};
use crate::filter::FilteredView;
use crate::records::ratio;

/// Number of programs kept in each ranking.
pub const TOP_N: usize = 3;

/// Ranks programs by change between the view's first and last year and
/// reports how each admission category's share moved over the same span.
pub fn compute_insights(view: &FilteredView<'_>) -> Insights {
    let years = view.years();
    let (Some(&first_year), Some(&last_year)) = (years.first(), years.last()) else {
        return Insights::default();
    };

    let deltas = program_deltas(view, first_year, last_year);

    let mut top_growth = deltas.clone();
    top_growth.sort_by(|a, b| compare_change(b, a).then_with(|| a.program.cmp(&b.program)));
    top_growth.truncate(TOP_N);

    let mut top_decline = deltas;
    top_decline.sort_by(|a, b| compare_change(a, b).then_with(|| a.program.cmp(&b.program)));
    top_decline.truncate(TOP_N);

    Insights {
        first_year: Some(first_year),
        last_year: Some(last_year),
        top_growth,
        top_decline,
        category_shift: category_shift(view, first_year, last_year),
    }
}

/// Per-program change between `first_year` and `last_year`, in program order.
///
/// Only programs with rows in both years take part.
pub fn program_deltas(view: &FilteredView<'_>, first_year: i32, last_year: i32) -> Vec<ProgramDelta> {
    let by_program_year = sum_by(
        view.iter(),
        |r| (r.program.as_str(), r.origin_year),
        |r| r.enrolled_total,
    );

    let slice = |year: i32| {
        by_program_year
            .iter()
            .filter(|((_, y), _)| *y == year)
            .map(|(&(program, _), &n)| (program, n))
            .collect::<BTreeMap<_, _>>()
    };
    let first = slice(first_year);
    let last = slice(last_year);

    first
        .into_iter()
        .filter_map(|(program, count_first_year)| {
            let count_last_year = *last.get(program)?;
            let delta_absolute = count_last_year - count_first_year;
            Some(ProgramDelta {
                program: program.to_string(),
                count_first_year,
                count_last_year,
                delta_absolute,
                delta_relative: ratio(delta_absolute, count_first_year),
            })
        })
        .collect()
}

/// Ascending order on `(delta_absolute, delta_relative)`.
///
/// A missing relative change sorts below every present one.
pub fn compare_change(a: &ProgramDelta, b: &ProgramDelta) -> Ordering {
    a.delta_absolute
        .cmp(&b.delta_absolute)
        .then_with(|| match (a.delta_relative, b.delta_relative) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.total_cmp(&y),
        })
}

/// Category shares in `first_year` against `last_year`, outer-joined on category.
pub fn category_shift(view: &FilteredView<'_>, first_year: i32, last_year: i32) -> Vec<CategoryShift> {
    let first = shares_in_year(view, first_year);
    let last = shares_in_year(view, last_year);

    let categories: BTreeSet<&str> = first.keys().chain(last.keys()).copied().collect();

    categories
        .into_iter()
        .map(|category| {
            let share_first_year = first.get(category).copied();
            let share_last_year = last.get(category).copied();
            CategoryShift {
                category: category.to_string(),
                share_first_year,
                share_last_year,
                delta_percentage_points: (share_last_year.unwrap_or(0.0)
                    - share_first_year.unwrap_or(0.0))
                    * 100.0,
            }
        })
        .collect()
}

fn shares_in_year<'a>(view: &FilteredView<'a>, year: i32) -> BTreeMap<&'a str, f64> {
    let sums = sum_by(
        view.iter().filter(|r| r.origin_year == year),
        |r| r.admission_category.as_str(),
        |r| r.enrolled_total,
    );
    let total: i64 = sums.values().sum();
    sums.into_iter()
        .map(|(category, n)| (category, share_or_zero(n, total)))
        .collect()
}
