use std::collections::BTreeMap;

use crate::analytics::types::{CategoryShare, Kpis};
use crate::analytics::utility::sum_by;
use crate::filter::FilteredView;
use crate::records::{EnrollmentRecord, ratio};

/// Computes the headline indicators of a view.
///
/// An empty view yields a zero total and no ratios. Ratios whose denominator
/// is zero are left out instead of being reported as zero.
pub fn compute_kpis(view: &FilteredView<'_>) -> Kpis {
    let totals = sum_by(view.iter(), |r| r.origin_year, |r| r.enrolled_total);
    let total: i64 = totals.values().sum();

    let mut years = totals.iter().rev();
    let Some((&latest_year, &total_last)) = years.next() else {
        return Kpis::default();
    };

    let yoy_delta = years
        .next()
        .and_then(|(_, &total_prev)| ratio(total_last - total_prev, total_prev));

    let latest = view.select(|r| r.origin_year == latest_year);
    let mut rollup = EnrollmentRecord::default();
    for record in latest.iter() {
        rollup.add_counts(record);
    }
    let female_share_latest_year = rollup.female_share();

    let by_category = sum_by(
        latest.iter(),
        |r| r.admission_category.as_str(),
        |r| r.enrolled_total,
    );
    let category_total: i64 = by_category.values().sum();
    let category_shares_latest_year: BTreeMap<String, f64> = if category_total > 0 {
        by_category
            .into_iter()
            .map(|(category, n)| (category.to_string(), n as f64 / category_total as f64))
            .collect()
    } else {
        BTreeMap::new()
    };

    Kpis {
        total,
        latest_year: Some(latest_year),
        yoy_delta,
        female_share_latest_year,
        top_category_share: top_share(&category_shares_latest_year),
        category_shares_latest_year,
    }
}

/// Largest share; on a tie the category that sorts first wins.
fn top_share(shares: &BTreeMap<String, f64>) -> Option<CategoryShare> {
    let mut best: Option<(&String, f64)> = None;
    for (category, &share) in shares {
        match best {
            Some((_, top)) if share <= top => {}
            _ => best = Some((category, share)),
        }
    }
    best.map(|(category, share)| CategoryShare {
        category: category.clone(),
        share,
    })
}
