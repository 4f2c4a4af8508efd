use serde::{Deserialize, Serialize};

/// Column names of the source files, in export order.
pub const COLUMNS: [&str; 11] = [
    "curso",
    "ano_origem",
    "tipo",
    "vagas",
    "vagas_remanescentes",
    "matriculados_total",
    "matriculados_sexo_masc",
    "matriculados_sexo_fem",
    "matrículas_chamada_conv",
    "matrículas_chamada_le",
    "matrículas_relação_adicional",
];

/// One cleaned row of the admission tables: a program's enrollment for a
/// single origin year and admission category.
///
/// Serde names follow the columns of the source files so an exported view
/// reads back with the same loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    #[serde(rename = "curso")]
    pub program: String,
    #[serde(rename = "ano_origem")]
    pub origin_year: i32,
    #[serde(rename = "tipo")]
    pub admission_category: String,

    #[serde(rename = "vagas")]
    pub seats_offered: i64,
    #[serde(rename = "vagas_remanescentes")]
    pub remaining_seats: i64,

    #[serde(rename = "matriculados_total")]
    pub enrolled_total: i64,
    #[serde(rename = "matriculados_sexo_masc")]
    pub enrolled_male: i64,
    #[serde(rename = "matriculados_sexo_fem")]
    pub enrolled_female: i64,

    // supplementary counters
    #[serde(rename = "matrículas_chamada_conv")]
    pub agreement_calls: i64,
    #[serde(rename = "matrículas_chamada_le")]
    pub waitlist_calls: i64,
    #[serde(rename = "matrículas_relação_adicional")]
    pub additional_list: i64,
}

impl EnrollmentRecord {
    pub fn new(program: &str, origin_year: i32, admission_category: &str) -> Self {
        EnrollmentRecord {
            program: program.to_string(),
            origin_year,
            admission_category: admission_category.to_string(),
            ..Default::default()
        }
    }

    /// Sets the total and the (independently sourced) sex split.
    pub fn with_enrolled(mut self, total: i64, male: i64, female: i64) -> Self {
        self.enrolled_total = total;
        self.enrolled_male = male;
        self.enrolled_female = female;
        self
    }

    pub fn with_seats(mut self, offered: i64, remaining: i64) -> Self {
        self.seats_offered = offered;
        self.remaining_seats = remaining;
        self
    }

    /// Adds every counter of `other` to this record, leaving the keys alone.
    pub fn add_counts(&mut self, other: &EnrollmentRecord) {
        self.seats_offered += other.seats_offered;
        self.remaining_seats += other.remaining_seats;
        self.enrolled_total += other.enrolled_total;
        self.enrolled_male += other.enrolled_male;
        self.enrolled_female += other.enrolled_female;
        self.agreement_calls += other.agreement_calls;
        self.waitlist_calls += other.waitlist_calls;
        self.additional_list += other.additional_list;
    }

    /// Enrolled students per seat offered, absent when no seats were offered.
    pub fn occupancy(&self) -> Option<f64> {
        ratio(self.enrolled_total, self.seats_offered)
    }

    /// Female share of the sex split, absent when both counts are zero.
    pub fn female_share(&self) -> Option<f64> {
        ratio(
            self.enrolled_female,
            self.enrolled_male + self.enrolled_female,
        )
    }
}

/// `part / whole`, or `None` when the whole is not positive.
pub fn ratio(part: i64, whole: i64) -> Option<f64> {
    if whole > 0 {
        Some(part as f64 / whole as f64)
    } else {
        None
    }
}

/// Validated, in-memory collection of enrollment records.
///
/// Rows are appended while loading and only read afterwards; nothing in the
/// crate hands out mutable access to a stored record.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    records: Vec<EnrollmentRecord>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EnrollmentRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[EnrollmentRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnrollmentRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct origin years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.origin_year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Distinct program names, ascending.
    pub fn programs(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.program.as_str()))
    }

    /// Distinct admission categories, ascending.
    pub fn categories(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.admission_category.as_str()))
    }

    /// `(min, max)` origin year, or `None` for an empty table.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.origin_year).min()?;
        let max = self.records.iter().map(|r| r.origin_year).max()?;
        Some((min, max))
    }
}

impl FromIterator<EnrollmentRecord> for RecordTable {
    fn from_iter<I: IntoIterator<Item = EnrollmentRecord>>(iter: I) -> Self {
        RecordTable {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a EnrollmentRecord;
    type IntoIter = std::slice::Iter<'a, EnrollmentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let set: std::collections::BTreeSet<&str> = values.collect();
    set.into_iter().map(str::to_string).collect()
}
