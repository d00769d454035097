// csv_utils.rs
use crate::clustering_utils::{kmeans_labels, KMeansConfig};
use encoding_rs::Encoding;
use rayon::prelude::*;
use std::collections::HashMap;
use std::error::Error;
use std::fs::{self, File};
use std::io::{Error as IoError, ErrorKind};

/// A builder for loading and reshaping delimited tables in memory.
///
/// Data is held as a header row plus `Vec<Vec<String>>` rows. Transform
/// methods chain on `&mut Self`; a failure inside a chained call is parked in
/// the builder's error slot (inspect with [`get_error`](CsvBuilder::get_error))
/// and subsequent mutating calls become no-ops, so a chain never panics
/// half-way through.
pub struct CsvBuilder {
    headers: Vec<String>,
    data: Vec<Vec<String>>,
    limit: Option<usize>,
    error: Option<Box<dyn Error>>,
}

impl Default for CsvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvBuilder {
    /// Creates a new, empty `CsvBuilder`.
    ///
    /// ```
    /// use footfall::csv_utils::CsvBuilder;
    ///
    /// let builder = CsvBuilder::new();
    ///
    /// // Initially, there are no headers or data
    /// assert!(builder.get_headers().is_none());
    /// assert!(builder.get_data().is_none());
    /// ```
    pub fn new() -> Self {
        CsvBuilder {
            headers: Vec::new(),
            data: Vec::new(),
            limit: None,
            error: None,
        }
    }

    /// Reads a UTF-8 CSV file at `file_path` and returns a `CsvBuilder`.
    ///
    /// ```
    /// use footfall::csv_utils::CsvBuilder;
    /// use csv::Writer;
    ///
    /// let tmp_file = tempfile::Builder::new()
    ///     .prefix("csv_test")
    ///     .suffix(".csv")
    ///     .tempfile()
    ///     .expect("failed to create temporary file");
    ///
    /// let mut writer = Writer::from_path(tmp_file.path()).expect("failed to create CSV writer");
    /// writer.write_record(&["행정동", "CAGR"]).expect("failed to write header");
    /// writer.write_record(&["성수동", "0.41"]).expect("write record");
    /// writer.flush().expect("flush writer");
    ///
    /// let csv_builder = CsvBuilder::from_csv(tmp_file.path().to_str().unwrap());
    ///
    /// assert!(csv_builder.get_headers().is_some());
    /// assert_eq!(csv_builder.get_data().unwrap().len(), 1);
    /// ```
    ///
    /// A missing file or malformed CSV leaves the builder empty with its
    /// error slot set.
    pub fn from_csv(file_path: &str) -> Self {
        let mut builder = CsvBuilder::new();

        match File::open(file_path) {
            Ok(file) => {
                let mut rdr = csv::Reader::from_reader(file);

                if let Ok(hdrs) = rdr.headers() {
                    builder.headers = hdrs.iter().map(String::from).collect();
                }

                for result in rdr.records() {
                    match result {
                        Ok(record) => builder.data.push(record.iter().map(String::from).collect()),
                        Err(e) => {
                            builder.error = Some(Box::new(e));
                            break;
                        }
                    }
                }
            }
            Err(e) => builder.error = Some(Box::new(e)),
        }

        builder
    }

    /// Reads a CSV file encoded in the encoding named by `encoding_label`
    /// (a WHATWG label; `"euc-kr"` resolves to windows-949 and covers the
    /// cp949 exports common to Korean government open-data portals).
    ///
    /// Decoding is strict: bytes that do not decode under the requested
    /// encoding park an error instead of being replaced.
    pub fn from_csv_with_encoding(file_path: &str, encoding_label: &str) -> Self {
        let mut builder = CsvBuilder::new();

        let bytes = match fs::read(file_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                builder.error = Some(Box::new(e));
                return builder;
            }
        };

        let encoding = match Encoding::for_label(encoding_label.as_bytes()) {
            Some(encoding) => encoding,
            None => {
                builder.error = Some(Box::new(IoError::new(
                    ErrorKind::InvalidInput,
                    format!("unknown encoding label '{}'", encoding_label),
                )));
                return builder;
            }
        };

        let (decoded, _, had_errors) = encoding.decode(&bytes);
        if had_errors {
            builder.error = Some(Box::new(IoError::new(
                ErrorKind::InvalidData,
                format!("file does not decode as {}", encoding.name()),
            )));
            return builder;
        }

        let mut rdr = csv::Reader::from_reader(decoded.as_bytes());

        if let Ok(hdrs) = rdr.headers() {
            builder.headers = hdrs.iter().map(String::from).collect();
        }

        for result in rdr.records() {
            match result {
                Ok(record) => builder.data.push(record.iter().map(String::from).collect()),
                Err(e) => {
                    builder.error = Some(Box::new(e));
                    break;
                }
            }
        }

        builder
    }

    /// Tries each encoding label in order and returns the first builder that
    /// loads cleanly. Mixed-provenance research files arrive in utf-8,
    /// euc-kr, or cp949 depending on which tool exported them, so callers
    /// that cannot know the encoding up front probe for it.
    ///
    /// When every label fails, the builder from the last attempt (error slot
    /// set) is returned.
    pub fn from_csv_auto(file_path: &str, encoding_labels: Vec<&str>) -> Self {
        let mut last = CsvBuilder::new();
        last.error = Some(Box::new(IoError::new(
            ErrorKind::InvalidInput,
            "no candidate encodings supplied",
        )));

        for label in encoding_labels {
            let builder = Self::from_csv_with_encoding(file_path, label);
            if builder.error.is_none() && builder.has_headers() {
                return builder;
            }
            last = builder;
        }

        last
    }

    /// Builds directly from an in-memory header row and data rows.
    pub fn from_raw_data(headers: Vec<String>, data: Vec<Vec<String>>) -> Self {
        CsvBuilder {
            headers,
            data,
            limit: None,
            error: None,
        }
    }

    /// Creates a copy of the `CsvBuilder`, dropping any parked error.
    pub fn from_copy(&self) -> Self {
        CsvBuilder {
            headers: self.headers.clone(),
            data: self.data.clone(),
            limit: self.limit,
            error: None,
        }
    }

    /// Replaces the header row.
    pub fn set_header(&mut self, header: Vec<&str>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        self.headers = header.into_iter().map(|s| s.to_string()).collect();
        self
    }

    /// Adds a data row.
    pub fn add_row(&mut self, row: Vec<&str>) -> &mut Self {
        if self.error.is_none() {
            let row_vec = row.into_iter().map(|s| s.to_string()).collect();
            self.data.push(row_vec);
        }
        self
    }

    /// Adds multiple data rows.
    pub fn add_rows(&mut self, rows: Vec<Vec<&str>>) -> &mut Self {
        if self.error.is_none() {
            for row in rows {
                let row_vec = row.into_iter().map(|s| s.to_string()).collect();
                self.data.push(row_vec);
            }
        }
        self
    }

    pub fn rename_columns(&mut self, renames: Vec<(&str, &str)>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        let rename_map: HashMap<&str, &str> = renames.into_iter().collect();

        self.headers = self
            .headers
            .iter()
            .map(|h| {
                let h_str = h.as_str();
                rename_map.get(h_str).unwrap_or(&h_str).to_string()
            })
            .collect();

        self
    }

    /// Removes the named columns; unknown names are ignored.
    pub fn drop_columns(&mut self, columns: Vec<&str>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        let keep: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !columns.contains(&h.as_str()))
            .map(|(i, _)| i)
            .collect();

        self.project_columns(&keep);
        self
    }

    /// Keeps only the named columns, in the order given; unknown names are
    /// ignored.
    pub fn retain_columns(&mut self, columns: Vec<&str>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        let keep: Vec<usize> = columns
            .iter()
            .filter_map(|name| self.headers.iter().position(|h| h == name))
            .collect();

        self.project_columns(&keep);
        self
    }

    fn project_columns(&mut self, keep: &[usize]) {
        self.headers = keep.iter().map(|&i| self.headers[i].clone()).collect();
        self.data = self
            .data
            .iter()
            .map(|row| {
                keep.iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
    }

    /// Sorts rows by one or more `(column, "ASC"|"DESC")` keys. Cells that
    /// both parse as numbers compare numerically, everything else compares
    /// as strings.
    pub fn cascade_sort(&mut self, orders: Vec<(String, String)>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        let column_indices: HashMap<&str, usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        self.data.sort_by(|a, b| {
            let mut cmp = std::cmp::Ordering::Equal;
            for (column_name, order) in &orders {
                if let Some(&index) = column_indices.get(column_name.as_str()) {
                    let a_val = &a[index];
                    let b_val = &b[index];

                    cmp = if let (Ok(a_num), Ok(b_num)) =
                        (a_val.parse::<f64>(), b_val.parse::<f64>())
                    {
                        if order == "ASC" {
                            a_num
                                .partial_cmp(&b_num)
                                .unwrap_or(std::cmp::Ordering::Equal)
                        } else {
                            b_num
                                .partial_cmp(&a_num)
                                .unwrap_or(std::cmp::Ordering::Equal)
                        }
                    } else if order == "ASC" {
                        a_val.cmp(b_val)
                    } else {
                        b_val.cmp(a_val)
                    };

                    if cmp != std::cmp::Ordering::Equal {
                        break;
                    }
                }
            }
            cmp
        });

        self
    }

    /// Truncates the data to at most `limit` rows.
    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);

        if self.data.len() > limit {
            self.data.truncate(limit);
        }

        self
    }

    /// Inner join with `other` on `left_key` / `right_key`: only rows whose
    /// key value appears on both sides survive, and rows with duplicate keys
    /// produce the cross-product of their matches, left-side order first.
    ///
    /// The key column is kept once under its left-side name. Non-key columns
    /// present on both sides are disambiguated with `left_suffix` /
    /// `right_suffix`, the way a pandas `merge(..., suffixes=...)` would.
    ///
    /// ```
    /// use footfall::csv_utils::CsvBuilder;
    ///
    /// let mut search = CsvBuilder::from_raw_data(
    ///     vec!["행정동".to_string(), "CAGR".to_string()],
    ///     vec![
    ///         vec!["성수동".to_string(), "0.41".to_string()],
    ///         vec!["연남동".to_string(), "0.28".to_string()],
    ///     ],
    /// );
    /// let ranking = CsvBuilder::from_raw_data(
    ///     vec!["행정동".to_string(), "점수".to_string()],
    ///     vec![vec!["성수동".to_string(), "91.2".to_string()]],
    /// );
    ///
    /// search.inner_join_with(&ranking, "행정동", "행정동", "_검색", "_하이브리드");
    ///
    /// // 연남동 has no ranking row, so only 성수동 survives
    /// assert_eq!(search.get_data().unwrap().len(), 1);
    /// ```
    pub fn inner_join_with(
        &mut self,
        other: &CsvBuilder,
        left_key: &str,
        right_key: &str,
        left_suffix: &str,
        right_suffix: &str,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        let left_key_idx = match self.headers.iter().position(|h| h == left_key) {
            Some(idx) => idx,
            None => {
                self.error = Some(Box::new(IoError::new(
                    ErrorKind::InvalidInput,
                    format!("join key '{}' not found in left table", left_key),
                )));
                return self;
            }
        };
        let right_key_idx = match other.headers.iter().position(|h| h == right_key) {
            Some(idx) => idx,
            None => {
                self.error = Some(Box::new(IoError::new(
                    ErrorKind::InvalidInput,
                    format!("join key '{}' not found in right table", right_key),
                )));
                return self;
            }
        };

        let left_non_key: Vec<&String> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != left_key_idx)
            .map(|(_, h)| h)
            .collect();
        let right_non_key: Vec<&String> = other
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != right_key_idx)
            .map(|(_, h)| h)
            .collect();

        let mut joined_headers = Vec::with_capacity(self.headers.len() + right_non_key.len());
        for (i, header) in self.headers.iter().enumerate() {
            if i == left_key_idx {
                joined_headers.push(header.clone());
            } else if right_non_key.iter().any(|h| *h == header) {
                joined_headers.push(format!("{}{}", header, left_suffix));
            } else {
                joined_headers.push(header.clone());
            }
        }
        for (i, header) in other.headers.iter().enumerate() {
            if i == right_key_idx {
                continue;
            }
            if left_non_key.iter().any(|h| h == &header) {
                joined_headers.push(format!("{}{}", header, right_suffix));
            } else {
                joined_headers.push(header.clone());
            }
        }

        let right_data = &other.data;
        let mut right_rows_by_key: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, row) in right_data.iter().enumerate() {
            if let Some(key) = row.get(right_key_idx) {
                right_rows_by_key.entry(key.as_str()).or_default().push(i);
            }
        }

        let joined_data: Vec<Vec<String>> = self
            .data
            .par_iter()
            .flat_map_iter(|left_row| {
                let matches = left_row
                    .get(left_key_idx)
                    .and_then(|key| right_rows_by_key.get(key.as_str()))
                    .map(|idxs| idxs.as_slice())
                    .unwrap_or(&[]);

                matches.iter().map(move |&right_idx| {
                    let right_row = &right_data[right_idx];
                    let mut joined = Vec::with_capacity(left_row.len() + right_row.len());
                    joined.extend(left_row.iter().cloned());
                    joined.extend(
                        right_row
                            .iter()
                            .enumerate()
                            .filter(|(i, _)| *i != right_key_idx)
                            .map(|(_, cell)| cell.clone()),
                    );
                    joined
                })
            })
            .collect();

        self.headers = joined_headers;
        self.data = joined_data;
        self
    }

    /// Runs k-means over the named numeric feature columns and appends the
    /// resulting cluster id as a new column. Unparsable feature cells park
    /// an error instead of being coerced.
    pub fn append_kmeans_cluster_column(
        &mut self,
        feature_columns: Vec<&str>,
        new_column_name: &str,
        config: KMeansConfig,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        let mut feature_indices = Vec::with_capacity(feature_columns.len());
        for name in &feature_columns {
            match self.headers.iter().position(|h| h == name) {
                Some(idx) => feature_indices.push(idx),
                None => {
                    self.error = Some(Box::new(IoError::new(
                        ErrorKind::InvalidInput,
                        format!("feature column '{}' not found", name),
                    )));
                    return self;
                }
            }
        }

        let mut matrix = Vec::with_capacity(self.data.len());
        for (row_number, row) in self.data.iter().enumerate() {
            let mut features = Vec::with_capacity(feature_indices.len());
            for (&idx, name) in feature_indices.iter().zip(&feature_columns) {
                let raw = row.get(idx).map(String::as_str).unwrap_or("");
                match raw.trim().parse::<f64>() {
                    Ok(value) => features.push(value),
                    Err(_) => {
                        self.error = Some(Box::new(IoError::new(
                            ErrorKind::InvalidData,
                            format!(
                                "row {}, column '{}': '{}' is not numeric",
                                row_number, name, raw
                            ),
                        )));
                        return self;
                    }
                }
            }
            matrix.push(features);
        }

        let labels = match kmeans_labels(&matrix, &config) {
            Ok(labels) => labels,
            Err(e) => {
                self.error = Some(e);
                return self;
            }
        };

        self.headers.push(new_column_name.to_string());
        for (row, label) in self.data.iter_mut().zip(labels) {
            row.push(label.to_string());
        }

        self
    }

    /// Saves the current headers and rows as a UTF-8 CSV file. Short rows are
    /// padded with empty cells so the output stays rectangular.
    pub fn save_as(&mut self, new_file_path: &str) -> Result<&mut Self, Box<dyn Error>> {
        let file = File::create(new_file_path)?;
        let mut wtr = csv::Writer::from_writer(file);

        if !self.headers.is_empty() {
            wtr.write_record(&self.headers)?;
        }

        let headers_len = self.headers.len();
        for record in &mut self.data {
            while record.len() < headers_len {
                record.push("".to_string());
            }
            wtr.write_record(&*record)?;
        }

        wtr.flush()?;

        Ok(self)
    }

    /// Prints one header name per line.
    pub fn print_columns(&mut self) -> &mut Self {
        println!();
        for header in &self.headers {
            println!("{}", header);
        }
        self
    }

    /// Prints the number of data rows in the CSV.
    pub fn print_row_count(&mut self) -> &mut Self {
        let row_count = self.data.len();
        println!();
        println!("Row count: {}", row_count);

        self
    }

    /// Prints an aligned preview of the table, capped at 30 rows.
    pub fn print_table(&mut self) -> &mut Self {
        const MAX_PREVIEW_ROWS: usize = 30;

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in self.data.iter().take(MAX_PREVIEW_ROWS) {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        println!();
        let header_line: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<width$}", h, width = w))
            .collect();
        println!("{}", header_line.join("  "));

        for row in self.data.iter().take(MAX_PREVIEW_ROWS) {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<width$}", cell, width = w))
                .collect();
            println!("{}", line.join("  "));
        }
        if self.data.len() > MAX_PREVIEW_ROWS {
            println!("... and {} more rows", self.data.len() - MAX_PREVIEW_ROWS);
        }
        println!("Total rows: {}", self.data.len());

        self
    }

    /// Checks if the CSV builder contains any data (either headers or rows).
    pub fn has_data(&self) -> bool {
        !self.headers.is_empty() || !self.data.is_empty()
    }

    /// Checks if the CSV builder contains headers.
    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    /// Retrieves a reference to the headers of the CSV if any headers exist.
    pub fn get_headers(&self) -> Option<&[String]> {
        if self.has_headers() {
            Some(&self.headers)
        } else {
            None
        }
    }

    /// Retrieves a reference to the data stored in the CSV builder if any
    /// data exists.
    pub fn get_data(&self) -> Option<&Vec<Vec<String>>> {
        if !self.data.is_empty() {
            Some(&self.data)
        } else {
            None
        }
    }

    /// The error parked by the most recent failed operation, if any.
    pub fn get_error(&self) -> Option<&(dyn Error + 'static)> {
        self.error.as_deref()
    }
}
