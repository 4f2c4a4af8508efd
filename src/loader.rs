//! Delimited-text loader for enrollment tables.
//!
//! Columns are located by header name once, when the file is opened; from then
//! on every row is read into a typed [`EnrollmentRecord`].

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::records::{EnrollmentRecord, RecordTable};

/// Character encoding of the source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Utf8,
    /// ISO-8859-1, the encoding the admission tables are published in.
    #[default]
    Latin1,
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "utf8" => Ok(Encoding::Utf8),
            "latin1" | "iso88591" => Ok(Encoding::Latin1),
            other => Err(format!("unsupported encoding '{other}'")),
        }
    }
}

/// How to read a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            delimiter: b';',
            encoding: Encoding::Latin1,
        }
    }
}

/// Header positions of the known columns.
struct Columns {
    program: usize,
    year: usize,
    category: usize,
    enrolled_total: usize,
    seats_offered: Option<usize>,
    remaining_seats: Option<usize>,
    enrolled_male: Option<usize>,
    enrolled_female: Option<usize>,
    agreement_calls: Option<usize>,
    waitlist_calls: Option<usize>,
    additional_list: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require =
            |name: &'static str| find(name).ok_or(LoadError::MissingColumn(name));

        Ok(Columns {
            program: require("curso")?,
            year: require("ano_origem")?,
            category: require("tipo")?,
            enrolled_total: require("matriculados_total")?,
            seats_offered: find("vagas"),
            remaining_seats: find("vagas_remanescentes"),
            enrolled_male: find("matriculados_sexo_masc"),
            enrolled_female: find("matriculados_sexo_fem"),
            agreement_calls: find("matrículas_chamada_conv"),
            waitlist_calls: find("matrículas_chamada_le"),
            additional_list: find("matrículas_relação_adicional"),
        })
    }

    /// Builds a record from one row, or `None` when the year cannot be read.
    ///
    /// The second value is the number of counter cells that had to be coerced.
    fn read(&self, row: &StringRecord) -> Option<(EnrollmentRecord, usize)> {
        let text = |idx: usize| row.get(idx).unwrap_or("").trim();
        let origin_year = parse_year(text(self.year))?;

        let mut coerced = 0;
        let mut count = |idx: Option<usize>| {
            let Some(i) = idx else { return 0 };
            let (n, exact) = read_count(text(i));
            if !exact {
                coerced += 1;
            }
            n
        };

        let record = EnrollmentRecord {
            program: text(self.program).to_string(),
            origin_year,
            admission_category: text(self.category).to_string(),
            seats_offered: count(self.seats_offered),
            remaining_seats: count(self.remaining_seats),
            enrolled_total: count(Some(self.enrolled_total)),
            enrolled_male: count(self.enrolled_male),
            enrolled_female: count(self.enrolled_female),
            agreement_calls: count(self.agreement_calls),
            waitlist_calls: count(self.waitlist_calls),
            additional_list: count(self.additional_list),
        };
        Some((record, coerced))
    }
}

/// Parses a counter cell. Blanks and non-numeric cells count as zero and
/// decimals are truncated toward zero.
pub fn parse_count(cell: &str) -> i64 {
    read_count(cell).0
}

/// Counter value plus whether the cell held it exactly. Blanks are exact
/// zeros, as are whole-valued decimals such as `12.0` written by spreadsheets.
fn read_count(cell: &str) -> (i64, bool) {
    let cell = cell.trim();
    if cell.is_empty() {
        return (0, true);
    }
    if let Ok(n) = cell.parse::<i64>() {
        return (n, true);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => (v.trunc() as i64, v.fract() == 0.0),
        _ => (0, false),
    }
}

fn parse_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    cell.parse::<i32>().ok().or_else(|| {
        let v = cell.parse::<f64>().ok()?;
        (v.is_finite() && v.fract() == 0.0).then_some(v as i32)
    })
}

/// Decodes raw bytes into text according to `encoding`.
pub fn decode(bytes: Vec<u8>, encoding: Encoding) -> Result<String, LoadError> {
    match encoding {
        Encoding::Utf8 => Ok(String::from_utf8(bytes)?),
        // every Latin-1 byte maps to the code point of the same value
        Encoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
    }
}

/// Reads a table from any byte source.
pub fn read_table<R: Read>(mut reader: R, options: LoadOptions) -> Result<RecordTable, LoadError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| LoadError::Io {
            path: "<reader>".to_string(),
            source,
        })?;
    parse_table(&decode(bytes, options.encoding)?, options.delimiter)
}

/// Loads the table stored at `path`.
#[tracing::instrument(skip(options), fields(path = %path.display()))]
pub fn load_table(path: &Path, options: LoadOptions) -> Result<RecordTable, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!(bytes = bytes.len(), encoding = ?options.encoding, "Source read, parsing");
    let table = parse_table(&decode(bytes, options.encoding)?, options.delimiter)?;
    info!(records = table.len(), "Enrollment table loaded");
    Ok(table)
}

fn parse_table(text: &str, delimiter: u8) -> Result<RecordTable, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = Columns::locate(rdr.headers()?)?;

    let mut table = RecordTable::new();
    let mut skipped = 0usize;
    let mut coerced = 0usize;

    for (line, result) in rdr.records().enumerate() {
        let row = result?;
        // header is line 1
        match columns.read(&row) {
            Some((record, cells)) => {
                if cells > 0 {
                    debug!(line = line + 2, cells, "Counter cells coerced");
                }
                coerced += cells;
                table.push(record);
            }
            None => {
                skipped += 1;
                debug!(line = line + 2, "Row without a readable year skipped");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, kept = table.len(), "Rows without a readable year were skipped");
    }
    if coerced > 0 {
        warn!(coerced, "Non-integer counter cells were truncated or set to zero");
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "curso;ano_origem;tipo;vagas;vagas_remanescentes;matriculados_total;matriculados_sexo_masc;matriculados_sexo_fem";

    fn load(text: &str) -> Result<RecordTable, LoadError> {
        read_table(text.as_bytes(), LoadOptions::default())
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12"), 12);
        assert_eq!(parse_count(" 7 "), 7);
        assert_eq!(parse_count("12.0"), 12);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("n/a"), 0);
        assert_eq!(parse_count("1.5"), 1);
        assert_eq!(parse_count("-2.7"), -2);
        // negative values are not corrected here
        assert_eq!(parse_count("-3"), -3);
    }

    #[test]
    fn test_read_count_flags_coerced_cells() {
        assert_eq!(read_count(""), (0, true));
        assert_eq!(read_count("12.0"), (12, true));
        assert_eq!(read_count("1.5"), (1, false));
        assert_eq!(read_count("abc"), (0, false));
        assert_eq!(read_count("inf"), (0, false));
    }

    #[test]
    fn test_fractional_counters_are_truncated() {
        let text = format!("{HEADER}\nDesign;2020;General;40.9;;12.5;abc;3\n");
        let table = load(&text).unwrap();
        let record = &table.records()[0];
        assert_eq!(record.seats_offered, 40);
        assert_eq!(record.enrolled_total, 12);
        assert_eq!(record.enrolled_male, 0);
        assert_eq!(record.enrolled_female, 3);
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("latin1".parse::<Encoding>(), Ok(Encoding::Latin1));
        assert_eq!("ISO-8859-1".parse::<Encoding>(), Ok(Encoding::Latin1));
        assert_eq!("UTF-8".parse::<Encoding>(), Ok(Encoding::Utf8));
        assert!("ebcdic".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_reads_typed_rows_and_trims_text() {
        let text = format!("{HEADER}\n  Design ;2020; General ;40;10;30;10;20\n");
        let table = load(&text).unwrap();
        assert_eq!(table.len(), 1);
        let record = &table.records()[0];
        assert_eq!(record.program, "Design");
        assert_eq!(record.admission_category, "General");
        assert_eq!(record.origin_year, 2020);
        assert_eq!(record.seats_offered, 40);
        assert_eq!(record.remaining_seats, 10);
        assert_eq!(record.enrolled_total, 30);
        assert_eq!(record.enrolled_female, 20);
        // optional counters absent from the header default to zero
        assert_eq!(record.waitlist_calls, 0);
    }

    #[test]
    fn test_blank_counters_become_zero() {
        let text = format!("{HEADER}\nDesign;2020;General;;;abc;;\n");
        let table = load(&text).unwrap();
        let record = &table.records()[0];
        assert_eq!(record.enrolled_total, 0);
        assert_eq!(record.enrolled_male, 0);
        assert_eq!(record.seats_offered, 0);
    }

    #[test]
    fn test_rows_without_year_are_skipped() {
        let text = format!("{HEADER}\nDesign;;General;1;1;1;1;1\nDesign;2021.0;General;1;1;1;1;1\n");
        let table = load(&text).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].origin_year, 2021);
    }

    #[test]
    fn test_missing_required_column() {
        let err = load("curso;ano_origem;vagas\nDesign;2020;3\n").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("tipo")));
    }

    #[test]
    fn test_latin1_decoding() {
        let mut bytes = b"curso;ano_origem;tipo;matriculados_total\n".to_vec();
        // "Música" with a Latin-1 encoded u-acute
        bytes.extend_from_slice(b"M\xfasica;2020;Isentos;4\n");
        let table = read_table(bytes.as_slice(), LoadOptions::default()).unwrap();
        assert_eq!(table.records()[0].program, "Música");
    }

    #[test]
    fn test_utf8_rejects_latin1_bytes() {
        let bytes = b"curso;ano_origem;tipo;matriculados_total\nM\xfasica;2020;Isentos;4\n".to_vec();
        let options = LoadOptions {
            encoding: Encoding::Utf8,
            ..Default::default()
        };
        let err = read_table(bytes.as_slice(), options).unwrap_err();
        assert!(matches!(err, LoadError::Encoding(_)));
    }

    #[test]
    fn test_comma_delimiter_and_supplementary_columns() {
        let text = "curso,ano_origem,tipo,matriculados_total,matrículas_chamada_le,matrículas_chamada_conv,matrículas_relação_adicional\nDesign,2020,General,9,2,3,4\n";
        let options = LoadOptions {
            delimiter: b',',
            encoding: Encoding::Utf8,
        };
        let table = read_table(text.as_bytes(), options).unwrap();
        let record = &table.records()[0];
        assert_eq!(record.waitlist_calls, 2);
        assert_eq!(record.agreement_calls, 3);
        assert_eq!(record.additional_list, 4);
    }

    #[test]
    fn test_load_table_missing_file() {
        let err = load_table(Path::new("/nonexistent/enrollment.csv"), LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
