//! Per-period CSV store.
//!
//! One `YYYY-MM.csv` file per billing period, one row per schema row. Files
//! are written wholesale and never deleted; a yearly view concatenates the
//! stored months row by row.

mod index;

pub use index::YearIndex;

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::error::StorageError;
use crate::extract::TokenSource;
use crate::models::period::Period;
use crate::models::schema::ExtractionSchema;
use crate::receipt::ReceiptLineSet;

/// Index changes caused by a save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    /// The year had no stored months before.
    pub new_year: bool,
    /// The month was not stored before.
    pub new_month: bool,
}

/// Stored months of one year, concatenated per schema row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YearTable {
    pub year: i32,

    /// Months that loaded successfully, ascending.
    pub months: Vec<u32>,

    /// Schema row labels.
    pub names: Vec<String>,

    /// Values per month for each schema row.
    pub widths: Vec<usize>,

    /// For each schema row, the values of every month in `months` order.
    pub rows: Vec<Vec<String>>,
}

impl YearTable {
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Value of `row` for the month at position `month_pos` in `months`.
    pub fn cell(&self, row: usize, month_pos: usize, column: usize) -> Option<&str> {
        let width = *self.widths.get(row)?;
        if column >= width {
            return None;
        }
        self.rows
            .get(row)?
            .get(month_pos * width + column)
            .map(String::as_str)
    }
}

/// Period files of one schema in one directory.
#[derive(Debug)]
pub struct PeriodStore {
    dir: PathBuf,
    schema: ExtractionSchema,
    index: YearIndex,
    file_name: Regex,
}

impl PeriodStore {
    /// Open the store in the directory declared by the schema.
    pub fn open(schema: ExtractionSchema) -> Result<Self, StorageError> {
        let dir = schema.storage_path();
        Self::open_at(dir, schema)
    }

    /// Load the schema at `path` and open the store it declares.
    pub fn from_schema_file(path: &Path) -> crate::Result<Self> {
        let schema = ExtractionSchema::load(path)?;
        Ok(Self::open(schema)?)
    }

    /// Open the store in `dir`, creating it if needed, and scan its periods.
    pub fn open_at(
        dir: impl Into<PathBuf>,
        schema: ExtractionSchema,
    ) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut store = Self {
            dir,
            schema,
            index: YearIndex::new(),
            file_name: Regex::new(r"^([0-9]{4})-([0-9]{2})\.csv$")
                .expect("period file pattern is valid"),
        };
        store.rescan()?;
        Ok(store)
    }

    /// Rebuild the year index from the directory listing.
    ///
    /// Names other than `YYYY-MM.csv` with a month in `1..=12` are ignored.
    pub fn rescan(&mut self) -> Result<(), StorageError> {
        let io_error = |source| StorageError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut index = YearIndex::new();
        for entry in fs::read_dir(&self.dir).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            let name = entry.file_name();
            let Some(caps) = name.to_str().and_then(|n| self.file_name.captures(n)) else {
                continue;
            };
            if let (Ok(year), Ok(month)) = (caps[1].parse(), caps[2].parse()) {
                index.insert(year, month);
            }
        }

        debug!("Scanned {}: years {:?}", self.dir.display(), index.years());
        self.index = index;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    /// Years with stored periods, ascending.
    pub fn available_years(&self) -> Vec<i32> {
        self.index.years()
    }

    /// Stored months of `year`, ascending.
    pub fn months(&self, year: i32) -> Vec<u32> {
        self.index.months(year)
    }

    /// Path of the period file for `year` and `month`.
    pub fn compute_path(&self, year: i32, month: u32) -> PathBuf {
        self.dir.join(Period::new(year, month).file_name())
    }

    /// Write the export of `lines` as the record of `year`-`month`.
    ///
    /// An existing record for the period is overwritten.
    pub fn save(
        &mut self,
        year: i32,
        month: u32,
        lines: &ReceiptLineSet,
    ) -> Result<SaveOutcome, StorageError> {
        let period = Period::new(year, month);
        if !period.is_valid() {
            return Err(StorageError::InvalidPeriod { year, month });
        }

        let path = self.compute_path(year, month);
        info!("Writing period {} to {}", period, path.display());

        // Renamed over the target only once fully written.
        let mut file = NamedTempFile::new_in(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        lines
            .write_csv(&mut file, &self.schema.rows)
            .map_err(|source| StorageError::Csv {
                path: path.clone(),
                source,
            })?;
        file.persist(&path).map_err(|e| StorageError::Io {
            path: path.clone(),
            source: e.error,
        })?;

        let (new_year, new_month) = self.index.insert(year, month);
        Ok(SaveOutcome {
            new_year,
            new_month,
        })
    }

    /// Extract `input` and save it under the period it carries.
    ///
    /// Returns `None` without writing anything when no period was found.
    pub fn import(
        &mut self,
        source: &dyn TokenSource,
        input: &Path,
    ) -> crate::Result<Option<(Period, SaveOutcome)>> {
        let lines = source.line_set(input)?;

        let Some(period) = lines.first_period() else {
            debug!("No period in {}", input.display());
            return Ok(None);
        };

        let outcome = self.save(period.year, period.month, &lines)?;
        Ok(Some((period, outcome)))
    }

    /// Load the values of one period, validated against the schema.
    ///
    /// Every row must carry the schema row's label and exactly its number of
    /// values; any mismatch fails the whole month.
    pub fn load_month(&self, year: i32, month: u32) -> Result<Vec<Vec<String>>, StorageError> {
        let path = self.compute_path(year, month);
        let file = File::open(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| StorageError::Csv {
                path: path.clone(),
                source,
            })?;

        let rows = &self.schema.rows;
        if records.len() != rows.len() {
            error!(
                "{} has {} rows, schema has {}",
                path.display(),
                records.len(),
                rows.len()
            );
            return Err(StorageError::RowCount {
                path,
                expected: rows.len(),
                found: records.len(),
            });
        }

        let mut data = Vec::with_capacity(rows.len());
        for (i, (row, record)) in rows.iter().zip(&records).enumerate() {
            let line = i + 1;
            let expected = 1 + row.width();
            if record.len() != expected {
                error!(
                    "Illegal number of columns in line {} of {}, not matched to the schema",
                    line,
                    path.display()
                );
                return Err(StorageError::ColumnCount {
                    path,
                    line,
                    expected,
                    found: record.len(),
                });
            }
            if record[0] != row.name {
                error!("Line {} of {} is not matched to the schema", line, path.display());
                return Err(StorageError::LabelMismatch {
                    path,
                    line,
                    expected: row.name.clone(),
                    found: record[0].to_string(),
                });
            }
            data.push(record.iter().skip(1).map(str::to_string).collect());
        }

        Ok(data)
    }

    /// Load every stored month of `year` and concatenate them per row.
    ///
    /// Months that fail to load are skipped and left out of `months`.
    pub fn load_year(&self, year: i32) -> YearTable {
        let rows = &self.schema.rows;
        let mut table = YearTable {
            year,
            months: Vec::new(),
            names: rows.iter().map(|r| r.name.clone()).collect(),
            widths: rows.iter().map(|r| r.width()).collect(),
            rows: vec![Vec::new(); rows.len()],
        };

        for month in self.index.months(year) {
            match self.load_month(year, month) {
                Ok(data) => {
                    table.months.push(month);
                    for (values, month_values) in table.rows.iter_mut().zip(data) {
                        values.extend(month_values);
                    }
                }
                Err(e) => warn!("Skipping period {}: {}", Period::new(year, month), e),
            }
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReceiptError;
    use crate::extract::TsvFile;
    use crate::models::schema::SchemaRow;
    use crate::models::token::Token;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn schema() -> ExtractionSchema {
        ExtractionSchema::from_rows(vec![
            SchemaRow::new("Управление МКД", "руб", vec![0, 1, 2]),
            SchemaRow::new("Отопление", "руб", vec![0, -1]),
            SchemaRow::new("Газ", "руб", vec![0]),
        ])
    }

    fn receipt(month_name: &str, base: &str) -> ReceiptLineSet {
        let mut set = ReceiptLineSet::new();
        let bands: Vec<Vec<&str>> = vec![
            vec!["Период", month_name, "2024"],
            vec!["Управление", "МКД", base, "3,00", "15,50"],
            vec!["Отопление", "7.25"],
        ];
        for (b, texts) in bands.iter().enumerate() {
            set.add_line(
                texts
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Token::new(*t, i as f64, b.to_string(), i))
                    .collect(),
            );
        }
        set
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scan_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        let names = [
            "2024-07.csv",
            "2023-12.csv",
            "2024-13.csv",
            "2024-7.csv",
            "notes.txt",
            "2024-07.csv.bak",
        ];
        for name in names {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let store = PeriodStore::open_at(dir.path(), schema()).unwrap();

        assert_eq!(store.available_years(), vec![2023, 2024]);
        assert_eq!(store.months(2024), vec![7]);
        assert_eq!(store.months(2023), vec![12]);
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let storage = dir.path().join("nested").join(".data");

        let store = PeriodStore::open_at(&storage, schema()).unwrap();

        assert!(storage.is_dir());
        assert!(store.available_years().is_empty());
    }

    #[test]
    fn test_open_uses_schema_storage_dir() {
        let dir = TempDir::new().unwrap();
        let schema = schema()
            .with_source(&dir.path().join("schema.json"))
            .with_storage_dir("archive");

        let store = PeriodStore::open(schema).unwrap();
        assert_eq!(store.dir(), dir.path().join("archive"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = PeriodStore::open_at(dir.path(), schema()).unwrap();

        let outcome = store.save(2024, 7, &receipt("Июль", "12,50")).unwrap();
        assert_eq!(outcome, SaveOutcome { new_year: true, new_month: true });
        assert!(dir.path().join("2024-07.csv").is_file());

        let data = store.load_month(2024, 7).unwrap();
        assert_eq!(
            data,
            vec![
                strings(&["12,50", "3,00", "15,50"]),
                strings(&["7,25", ""]),
                strings(&["?"]),
            ]
        );
    }

    #[test]
    fn test_save_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = PeriodStore::open_at(dir.path(), schema()).unwrap();
        let lines = receipt("Июль", "12,50");

        store.save(2024, 7, &lines).unwrap();
        let first = fs::read(store.compute_path(2024, 7)).unwrap();

        let outcome = store.save(2024, 7, &lines).unwrap();
        let second = fs::read(store.compute_path(2024, 7)).unwrap();

        assert_eq!(outcome, SaveOutcome::default());
        assert_eq!(first, second);

        let outcome = store.save(2024, 8, &lines).unwrap();
        assert_eq!(outcome, SaveOutcome { new_year: false, new_month: true });
    }

    #[test]
    fn test_save_rejects_invalid_month() {
        let dir = TempDir::new().unwrap();
        let mut store = PeriodStore::open_at(dir.path(), schema()).unwrap();

        let err = store.save(2024, 13, &ReceiptLineSet::new()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidPeriod { month: 13, .. }));
    }

    #[test]
    fn test_save_rejects_unrepresentable_year() {
        let dir = TempDir::new().unwrap();
        let mut store = PeriodStore::open_at(dir.path(), schema()).unwrap();

        let err = store.save(-5, 7, &ReceiptLineSet::new()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidPeriod { year: -5, month: 7 }));
        let err = store.save(10000, 7, &ReceiptLineSet::new()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidPeriod { year: 10000, .. }));

        assert!(store.available_years().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_save_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let mut store = PeriodStore::open_at(dir.path(), schema()).unwrap();
        // A directory in place of the period file makes the final rename fail.
        fs::create_dir(store.compute_path(2024, 7)).unwrap();

        let err = store.save(2024, 7, &receipt("Июль", "12,50")).unwrap_err();

        assert!(matches!(err, StorageError::Io { .. }));
        assert!(store.months(2024).is_empty());
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("2024-07.csv")]);
    }

    #[test]
    fn test_import_saves_under_recovered_period() {
        let dir = TempDir::new().unwrap();
        let mut store = PeriodStore::open_at(dir.path().join(".data"), schema()).unwrap();
        let dated = dir.path().join("july.tsv");
        fs::write(
            &dated,
            "left\ttop\ttext\n0\t1\tПериод\n10\t1\tИюль\n20\t1\t2024\n\
             0\t2\tОтопление\n10\t2\t7.25\n",
        )
        .unwrap();
        let undated = dir.path().join("undated.tsv");
        fs::write(&undated, "left\ttop\ttext\n0\t1\tОтопление\n10\t1\t7.25\n").unwrap();

        let source = TsvFile::default();
        let (period, outcome) = store.import(&source, &dated).unwrap().unwrap();

        assert_eq!(period, Period::new(2024, 7));
        assert_eq!(outcome, SaveOutcome { new_year: true, new_month: true });
        assert_eq!(store.load_month(2024, 7).unwrap()[1], strings(&["7,25", ""]));

        assert!(store.import(&source, &undated).unwrap().is_none());
        assert_eq!(store.months(2024), vec![7]);

        let err = store.import(&source, &dir.path().join("missing.tsv")).unwrap_err();
        assert!(matches!(err, ReceiptError::Extraction(_)));
    }

    #[test]
    fn test_from_schema_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("schema.json"),
            r#"{"title": "Квартплата", "storage_dir": "archive", "rows_schema_csv_filename": "rows.csv"}"#,
        )
        .unwrap();
        fs::write(dir.path().join("rows.csv"), "name units columns\nГаз руб 0\n").unwrap();

        let store = PeriodStore::from_schema_file(&dir.path().join("schema.json")).unwrap();
        assert_eq!(store.dir(), dir.path().join("archive"));
        assert_eq!(store.schema().rows.len(), 1);

        let err = PeriodStore::from_schema_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ReceiptError::Schema(_)));
    }

    #[test]
    fn test_index_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = PeriodStore::open_at(dir.path(), schema()).unwrap();
            store.save(2024, 7, &receipt("Июль", "12,50")).unwrap();
        }

        let store = PeriodStore::open_at(dir.path(), schema()).unwrap();
        assert_eq!(store.months(2024), vec![7]);
        assert!(store.load_month(2024, 7).is_ok());
    }

    #[test]
    fn test_load_rejects_wrong_width() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("2024-07.csv"),
            "\"Управление МКД\" 1 2 3\nОтопление 1\nГаз 1\n",
        )
        .unwrap();
        let store = PeriodStore::open_at(dir.path(), schema()).unwrap();

        let err = store.load_month(2024, 7).unwrap_err();
        assert!(matches!(
            err,
            StorageError::ColumnCount { line: 2, expected: 3, found: 2, .. }
        ));
    }

    #[test]
    fn test_load_rejects_wrong_label() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("2024-07.csv"),
            "\"Управление МКД\" 1 2 3\nВода 1 \nГаз 1\n",
        )
        .unwrap();
        let store = PeriodStore::open_at(dir.path(), schema()).unwrap();

        let err = store.load_month(2024, 7).unwrap_err();
        assert!(matches!(err, StorageError::LabelMismatch { line: 2, .. }));
    }

    #[test]
    fn test_load_rejects_wrong_row_count() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2024-07.csv"), "\"Управление МКД\" 1 2 3\n").unwrap();
        let store = PeriodStore::open_at(dir.path(), schema()).unwrap();

        let err = store.load_month(2024, 7).unwrap_err();
        assert!(matches!(err, StorageError::RowCount { expected: 3, found: 1, .. }));
    }

    #[test]
    fn test_load_year_skips_broken_months() {
        let dir = TempDir::new().unwrap();
        let mut store = PeriodStore::open_at(dir.path(), schema()).unwrap();
        store.save(2024, 7, &receipt("Июль", "12,50")).unwrap();
        store.save(2024, 9, &receipt("Сентябрь", "13,00")).unwrap();
        fs::write(dir.path().join("2024-08.csv"), "broken\n").unwrap();
        store.rescan().unwrap();

        let table = store.load_year(2024);

        assert_eq!(table.months, vec![7, 9]);
        assert_eq!(table.names[0], "Управление МКД");
        assert_eq!(
            table.rows[0],
            strings(&["12,50", "3,00", "15,50", "13,00", "3,00", "15,50"])
        );
        assert_eq!(table.rows[2], strings(&["?", "?"]));
        assert_eq!(table.cell(0, 1, 0), Some("13,00"));
        assert_eq!(table.cell(1, 0, 0), Some("7,25"));
        assert_eq!(table.cell(1, 0, 2), None);
    }

    #[test]
    fn test_load_year_without_data() {
        let dir = TempDir::new().unwrap();
        let store = PeriodStore::open_at(dir.path(), schema()).unwrap();

        let table = store.load_year(2030);
        assert!(table.is_empty());
        assert_eq!(table.rows.len(), 3);
    }
}
