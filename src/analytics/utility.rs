use std::collections::BTreeMap;

use crate::records::EnrollmentRecord;

/// Sums `value` over `records`, grouped by `key`. Groups come back in key order.
pub fn sum_by<'a, K, I>(
    records: I,
    key: impl Fn(&'a EnrollmentRecord) -> K,
    value: impl Fn(&'a EnrollmentRecord) -> i64,
) -> BTreeMap<K, i64>
where
    K: Ord,
    I: IntoIterator<Item = &'a EnrollmentRecord>,
{
    let mut groups = BTreeMap::new();
    for record in records {
        *groups.entry(key(record)).or_insert(0) += value(record);
    }
    groups
}

/// `part / whole` with a zero whole mapped to a zero share.
///
/// Used by the share-mode aggregations only; indicators that must distinguish
/// "no data" use [`ratio`](crate::records::ratio) instead.
pub fn share_or_zero(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_or_zero() {
        assert_eq!(share_or_zero(3, 0), 0.0);
        assert_eq!(share_or_zero(0, 0), 0.0);
        assert_eq!(share_or_zero(1, 4), 0.25);
    }

    #[test]
    fn test_sum_by_groups_in_key_order() {
        let records = vec![
            EnrollmentRecord::new("B", 2021, "General").with_enrolled(5, 0, 0),
            EnrollmentRecord::new("A", 2020, "General").with_enrolled(2, 0, 0),
            EnrollmentRecord::new("B", 2021, "Exempt").with_enrolled(1, 0, 0),
        ];
        let sums = sum_by(&records, |r| r.program.as_str(), |r| r.enrolled_total);
        let pairs: Vec<_> = sums.into_iter().collect();
        assert_eq!(pairs, vec![("A", 2), ("B", 6)]);
    }
}
