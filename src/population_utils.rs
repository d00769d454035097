// population_utils.rs
use encoding_rs::Encoding;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::slice::Iter;
use thiserror::Error;

/// Source column header for the year-quarter period code (`기준_년분기_코드`).
pub const COL_PERIOD_CODE: &str = "기준_년분기_코드";
/// Source column header for the administrative district code (`행정동_코드`).
pub const COL_DISTRICT_CODE: &str = "행정동_코드";
/// Source column header for the administrative district name (`행정동_코드_명`).
pub const COL_DISTRICT_NAME: &str = "행정동_코드_명";
/// Source column header for the total footfall count (`총_유동인구_수`).
pub const COL_TOTAL_FOOTFALL: &str = "총_유동인구_수";
/// Source column header for footfall in the 10-19 age band (`연령대_10_유동인구_수`).
pub const COL_AGE_10S_FOOTFALL: &str = "연령대_10_유동인구_수";
/// Source column header for footfall in the 20-29 age band (`연령대_20_유동인구_수`).
pub const COL_AGE_20S_FOOTFALL: &str = "연령대_20_유동인구_수";
/// Source column header for footfall in the 30-39 age band (`연령대_30_유동인구_수`).
pub const COL_AGE_30S_FOOTFALL: &str = "연령대_30_유동인구_수";
/// Source column header for Friday footfall (`금요일_유동인구_수`).
pub const COL_FRIDAY_FOOTFALL: &str = "금요일_유동인구_수";
/// Source column header for Saturday footfall (`토요일_유동인구_수`).
pub const COL_SATURDAY_FOOTFALL: &str = "토요일_유동인구_수";
/// Source column header for Sunday footfall (`일요일_유동인구_수`).
pub const COL_SUNDAY_FOOTFALL: &str = "일요일_유동인구_수";

/// Errors raised while loading or indexing a [`PopulationStore`].
///
/// Loading never retries and never returns a partially filled store; the
/// first failure is final for that load call.
#[derive(Debug, Error)]
pub enum PopulationError {
    /// The file path is missing or unreadable.
    #[error("cannot read population file '{path}': {source}")]
    FileAccess {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A required column is missing from the header, the file does not decode
    /// under the requested encoding, or a numeric cell does not parse as a
    /// non-negative integer. `row` is the 0-based data-row index with the
    /// header excluded; header-level and decode failures report row `0`.
    #[error("bad population data at row {row}, column '{column}': {reason}")]
    DataFormat {
        row: usize,
        column: String,
        reason: String,
    },

    /// A caller-supplied record index is outside `[0, record_count)`.
    #[error("record index {index} is out of range for a store of {len} records")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One row of the district floating-population table.
///
/// Field names are ASCII renderings of the source table's Korean headers:
///
/// | field | source column |
/// |---|---|
/// | `period_code` | `기준_년분기_코드` |
/// | `district_code` | `행정동_코드` |
/// | `district_name` | `행정동_코드_명` |
/// | `total_footfall` | `총_유동인구_수` |
/// | `age_10s_footfall` | `연령대_10_유동인구_수` |
/// | `age_20s_footfall` | `연령대_20_유동인구_수` |
/// | `age_30s_footfall` | `연령대_30_유동인구_수` |
/// | `friday_footfall` | `금요일_유동인구_수` |
/// | `saturday_footfall` | `토요일_유동인구_수` |
/// | `sunday_footfall` | `일요일_유동인구_수` |
///
/// Records are created during load and never mutated afterwards. A
/// `(district_code, period_code)` pair should identify a record, but the
/// source exports are not guaranteed deduplicated, so equal pairs may appear
/// more than once and are kept as distinct records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationRecord {
    pub period_code: String,
    pub district_code: String,
    pub district_name: String,
    pub total_footfall: u64,
    pub age_10s_footfall: u64,
    pub age_20s_footfall: u64,
    pub age_30s_footfall: u64,
    pub friday_footfall: u64,
    pub saturday_footfall: u64,
    pub sunday_footfall: u64,
}

impl PopulationRecord {
    /// Mean of the Friday, Saturday and Sunday counts.
    pub fn weekend_average(&self) -> f64 {
        (self.friday_footfall + self.saturday_footfall + self.sunday_footfall) as f64 / 3.0
    }

    /// Combined footfall of the 10s, 20s and 30s age bands.
    pub fn youth_footfall(&self) -> u64 {
        self.age_10s_footfall + self.age_20s_footfall + self.age_30s_footfall
    }

    /// Share of the 10s-30s age bands in the total, as a percentage.
    ///
    /// Returns `0.0` when `total_footfall` is zero. That zero is a guard
    /// against division by zero, not a statement that no young visitors were
    /// present. The age-band columns do not sum to `total_footfall` (the
    /// source carries further bands this table does not load), so the ratio
    /// is against the full total rather than a youth-only denominator.
    pub fn youth_ratio(&self) -> f64 {
        if self.total_footfall == 0 {
            0.0
        } else {
            self.youth_footfall() as f64 / self.total_footfall as f64 * 100.0
        }
    }
}

impl fmt::Display for PopulationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: total {} visitors", self.district_name, self.total_footfall)
    }
}

/// An ordered, write-once collection of [`PopulationRecord`]s.
///
/// The store is filled once from a delimited file and then only read;
/// insertion order mirrors source row order. Because nothing mutates after
/// construction, shared references can be handed to concurrent readers
/// without locking.
///
/// ```
/// use footfall::population_utils::PopulationStore;
/// use std::io::Write;
///
/// let mut tmp_file = tempfile::Builder::new()
///     .prefix("pop_test")
///     .suffix(".csv")
///     .tempfile()
///     .expect("failed to create temporary file");
///
/// writeln!(tmp_file, "기준_년분기_코드,행정동_코드,행정동_코드_명,총_유동인구_수,연령대_10_유동인구_수,연령대_20_유동인구_수,연령대_30_유동인구_수,금요일_유동인구_수,토요일_유동인구_수,일요일_유동인구_수").unwrap();
/// writeln!(tmp_file, "20204,11740700,둔촌2동,7273534,1201597,880170,1051524,1036661,1015837,1040695").unwrap();
/// tmp_file.flush().unwrap();
///
/// let store = PopulationStore::from_csv_path(tmp_file.path().to_str().unwrap(), "utf-8")
///     .expect("load failed");
///
/// assert_eq!(store.record_count(), 1);
/// assert_eq!(store.total_footfall_sum(), 7273534);
/// assert_eq!(store.find_by_district_code("11740700").len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PopulationStore {
    records: Vec<PopulationRecord>,
}

impl PopulationStore {
    /// Loads the table at `path`, decoding it with the encoding named by
    /// `encoding_label` (a WHATWG label such as `"utf-8"` or `"euc-kr"`;
    /// `"euc-kr"` resolves to windows-949 and therefore also reads cp949
    /// exports).
    ///
    /// The encoding is always an explicit caller decision; nothing is
    /// sniffed from the file. Decoding is strict, all ten required columns
    /// must be present in the header, and the seven numeric columns must
    /// parse as integers on every row. Any failure aborts the whole load.
    pub fn from_csv_path(path: &str, encoding_label: &str) -> Result<Self, PopulationError> {
        let bytes = fs::read(path).map_err(|e| PopulationError::FileAccess {
            path: path.to_string(),
            source: e,
        })?;

        let encoding = Encoding::for_label(encoding_label.as_bytes()).ok_or_else(|| {
            PopulationError::DataFormat {
                row: 0,
                column: encoding_label.to_string(),
                reason: "unknown encoding label".to_string(),
            }
        })?;

        let (decoded, _, had_errors) = encoding.decode(&bytes);
        if had_errors {
            return Err(PopulationError::DataFormat {
                row: 0,
                column: encoding_label.to_string(),
                reason: "file contains byte sequences that do not decode under this encoding"
                    .to_string(),
            });
        }

        Self::parse_table(&decoded)
    }

    /// Convenience decorator around [`from_csv_path`](Self::from_csv_path):
    /// tries each label in `encoding_labels` in order and returns the first
    /// store that loads.
    ///
    /// A [`PopulationError::FileAccess`] failure is returned immediately,
    /// since no other encoding can recover a missing file. When every label
    /// fails to decode or parse, the last error is returned.
    pub fn from_csv_path_probing(
        path: &str,
        encoding_labels: &[&str],
    ) -> Result<Self, PopulationError> {
        let mut last_error = None;
        for label in encoding_labels {
            match Self::from_csv_path(path, label) {
                Ok(store) => return Ok(store),
                Err(e @ PopulationError::FileAccess { .. }) => return Err(e),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| PopulationError::DataFormat {
            row: 0,
            column: "*".to_string(),
            reason: "no candidate encodings supplied".to_string(),
        }))
    }

    fn parse_table(text: &str) -> Result<Self, PopulationError> {
        let mut rdr = csv::Reader::from_reader(text.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| PopulationError::DataFormat {
                row: 0,
                column: "*".to_string(),
                reason: e.to_string(),
            })?
            .clone();

        let column_index = |name: &str| -> Result<usize, PopulationError> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PopulationError::DataFormat {
                    row: 0,
                    column: name.to_string(),
                    reason: "column missing from header".to_string(),
                })
        };

        let period_idx = column_index(COL_PERIOD_CODE)?;
        let code_idx = column_index(COL_DISTRICT_CODE)?;
        let name_idx = column_index(COL_DISTRICT_NAME)?;
        let total_idx = column_index(COL_TOTAL_FOOTFALL)?;
        let age_10s_idx = column_index(COL_AGE_10S_FOOTFALL)?;
        let age_20s_idx = column_index(COL_AGE_20S_FOOTFALL)?;
        let age_30s_idx = column_index(COL_AGE_30S_FOOTFALL)?;
        let friday_idx = column_index(COL_FRIDAY_FOOTFALL)?;
        let saturday_idx = column_index(COL_SATURDAY_FOOTFALL)?;
        let sunday_idx = column_index(COL_SUNDAY_FOOTFALL)?;

        let mut records = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| PopulationError::DataFormat {
                row,
                column: "*".to_string(),
                reason: e.to_string(),
            })?;

            records.push(PopulationRecord {
                period_code: text_cell(&record, period_idx),
                district_code: text_cell(&record, code_idx),
                district_name: text_cell(&record, name_idx),
                total_footfall: int_cell(&record, row, COL_TOTAL_FOOTFALL, total_idx)?,
                age_10s_footfall: int_cell(&record, row, COL_AGE_10S_FOOTFALL, age_10s_idx)?,
                age_20s_footfall: int_cell(&record, row, COL_AGE_20S_FOOTFALL, age_20s_idx)?,
                age_30s_footfall: int_cell(&record, row, COL_AGE_30S_FOOTFALL, age_30s_idx)?,
                friday_footfall: int_cell(&record, row, COL_FRIDAY_FOOTFALL, friday_idx)?,
                saturday_footfall: int_cell(&record, row, COL_SATURDAY_FOOTFALL, saturday_idx)?,
                sunday_footfall: int_cell(&record, row, COL_SUNDAY_FOOTFALL, sunday_idx)?,
            });
        }

        Ok(PopulationStore { records })
    }

    /// Every record whose district name contains `query` as a substring, in
    /// store order. An empty result is not an error.
    pub fn find_by_district_name(&self, query: &str) -> Vec<&PopulationRecord> {
        self.records
            .iter()
            .filter(|r| r.district_name.contains(query))
            .collect()
    }

    /// Every record whose district code equals `code` exactly. One district
    /// usually appears once per measurement period, so several records can
    /// share a code.
    pub fn find_by_district_code(&self, code: &str) -> Vec<&PopulationRecord> {
        self.records
            .iter()
            .filter(|r| r.district_code == code)
            .collect()
    }

    /// Up to `n` records ordered by `total_footfall` descending. The sort is
    /// stable, so ties keep their store order; asking for more records than
    /// the store holds returns all of them.
    pub fn top_n_by_footfall(&self, n: usize) -> Vec<&PopulationRecord> {
        let mut ranked: Vec<&PopulationRecord> = self.records.iter().collect();
        ranked.sort_by_key(|r| std::cmp::Reverse(r.total_footfall));
        ranked.truncate(n);
        ranked
    }

    /// Sum of `total_footfall` over the whole store; `0` when empty.
    pub fn total_footfall_sum(&self) -> u64 {
        self.records.iter().map(|r| r.total_footfall).sum()
    }

    /// Citywide totals per age band, keyed `"10s"`, `"20s"`, `"30s"`.
    pub fn age_band_totals(&self) -> HashMap<String, u64> {
        let mut totals = HashMap::new();
        totals.insert(
            "10s".to_string(),
            self.records.iter().map(|r| r.age_10s_footfall).sum(),
        );
        totals.insert(
            "20s".to_string(),
            self.records.iter().map(|r| r.age_20s_footfall).sum(),
        );
        totals.insert(
            "30s".to_string(),
            self.records.iter().map(|r| r.age_30s_footfall).sum(),
        );
        totals
    }

    /// Number of loaded records (data rows, header excluded).
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record at `index` in store order.
    pub fn record_at(&self, index: usize) -> Result<&PopulationRecord, PopulationError> {
        self.records
            .get(index)
            .ok_or(PopulationError::IndexOutOfRange {
                index,
                len: self.records.len(),
            })
    }

    /// All records as a slice, in store order.
    pub fn records(&self) -> &[PopulationRecord] {
        &self.records
    }

    pub fn iter(&self) -> Iter<'_, PopulationRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a PopulationStore {
    type Item = &'a PopulationRecord;
    type IntoIter = Iter<'a, PopulationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn text_cell(record: &csv::StringRecord, index: usize) -> String {
    record.get(index).unwrap_or("").to_string()
}

fn int_cell(
    record: &csv::StringRecord,
    row: usize,
    column: &str,
    index: usize,
) -> Result<u64, PopulationError> {
    let raw = record.get(index).unwrap_or("");
    raw.trim()
        .parse::<u64>()
        .map_err(|_| PopulationError::DataFormat {
            row,
            column: column.to_string(),
            reason: format!("'{}' is not a non-negative integer", raw),
        })
}
