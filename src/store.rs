//! Tabular sheet store.
//!
//! The store is the system of record. It only knows two operations: read a
//! worksheet restricted to some columns, and overwrite a worksheet wholesale.
//! Appends are built on top of those two and are not atomic across callers.

use crate::error::{Result, StoreError};
use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A worksheet held in memory: named columns and rows of text cells.
///
/// An empty string is a null cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        Table {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows<S: AsRef<str>>(columns: &[S], rows: Vec<Vec<String>>) -> Self {
        Table {
            rows,
            ..Table::new(columns)
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Project onto `columns`, in that order.
    ///
    /// # Arguments
    /// * `worksheet` - Name used in the error when a column is missing
    /// * `columns` - Columns to keep; short rows are padded with nulls
    ///
    /// # Errors
    /// `MissingColumn` if any requested column does not exist
    ///
    /// # Examples
    /// ```
    /// use ams::store::Table;
    ///
    /// let table = Table::with_rows(&["A", "B"], vec![vec!["1".into()]]);
    /// let picked = table.select("sheet", &["B", "A"]).unwrap();
    /// assert_eq!(picked.rows, vec![vec!["".to_string(), "1".to_string()]]);
    /// assert!(table.select("sheet", &["C"]).is_err());
    /// ```
    pub fn select<S: AsRef<str>>(&self, worksheet: &str, columns: &[S]) -> Result<Table> {
        let indices = columns
            .iter()
            .map(|c| {
                self.column_index(c.as_ref())
                    .ok_or_else(|| StoreError::MissingColumn {
                        worksheet: worksheet.to_string(),
                        column: c.as_ref().to_string(),
                    })
            })
            .collect::<Result<Vec<usize>>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Table::with_rows(columns, rows))
    }

    /// Drop rows where every cell is null
    pub fn drop_blank_rows(&mut self) {
        self.rows
            .retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));
    }

    fn check_widths(&self, worksheet: &str) -> Result<()> {
        match self.rows.iter().find(|r| r.len() != self.columns.len()) {
            Some(row) => Err(StoreError::RowWidth {
                worksheet: worksheet.to_string(),
                expected: self.columns.len(),
                found: row.len(),
            }),
            None => Ok(()),
        }
    }
}

/// Read/overwrite contract of the backing spreadsheet
pub trait SheetStore: Send + Sync {
    /// Read `worksheet`, keeping only `columns`, without all-null rows.
    ///
    /// A worksheet that does not exist yet reads as an empty table.
    ///
    /// # Errors
    /// * `MissingColumn` if the worksheet exists but lacks one of `columns`
    /// * `Connection`, `Io` or `Encoding` if the backing storage fails
    fn read(&self, worksheet: &str, columns: &[&str]) -> Result<Table>;

    /// Replace the whole of `worksheet` with `table`
    ///
    /// # Errors
    /// `RowWidth` if a row does not have one cell per column; nothing is
    /// written in that case
    fn update(&self, worksheet: &str, table: &Table) -> Result<()>;
}

/// Read the worksheet, add `row` at the end and write everything back.
///
/// Two callers racing here can lose each other's rows; the store offers no
/// row-level append.
///
/// # Arguments
/// * `store` - Store holding the worksheet
/// * `worksheet` - Worksheet name
/// * `columns` - Expected columns; the existing sheet must have all of them
/// * `row` - New cells, one per column
///
/// # Returns
/// The worksheet as written, new row last
///
/// # Examples
/// ```
/// use ams::store::{MemoryStore, SheetStore, append_row};
///
/// let store = MemoryStore::new();
/// append_row(&store, "feedback", &["Title"], vec!["Hello".to_string()]).unwrap();
/// assert_eq!(store.read("feedback", &["Title"]).unwrap().len(), 1);
/// ```
pub fn append_row(
    store: &dyn SheetStore,
    worksheet: &str,
    columns: &[&str],
    row: Vec<String>,
) -> Result<Table> {
    let mut table = store.read(worksheet, columns)?;
    table.rows.push(row);
    store.update(worksheet, &table)?;
    debug!("appended row {} to worksheet '{}'", table.len(), worksheet);
    Ok(table)
}

fn read_from(workbook: Option<&Table>, worksheet: &str, columns: &[&str]) -> Result<Table> {
    let mut table = match workbook {
        Some(existing) if !existing.columns.is_empty() => existing.select(worksheet, columns)?,
        _ => Table::new(columns),
    };
    table.drop_blank_rows();
    Ok(table)
}

/// Worksheets kept in process memory; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: Mutex<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, worksheet: &str, table: Table) -> Self {
        self.sheets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(worksheet.to_string(), table);
        self
    }

    /// Raw worksheet contents, blank rows included
    pub fn snapshot(&self, worksheet: &str) -> Option<Table> {
        self.sheets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(worksheet)
            .cloned()
    }
}

impl SheetStore for MemoryStore {
    fn read(&self, worksheet: &str, columns: &[&str]) -> Result<Table> {
        let sheets = self.sheets.lock().unwrap_or_else(|e| e.into_inner());
        read_from(sheets.get(worksheet), worksheet, columns)
    }

    fn update(&self, worksheet: &str, table: &Table) -> Result<()> {
        table.check_widths(worksheet)?;
        self.sheets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(worksheet.to_string(), table.clone());
        Ok(())
    }
}

type Workbook = BTreeMap<String, Table>;

/// Workbook persisted as a gzip-compressed bincode file.
///
/// Every call goes to disk so several processes pointed at the same file see
/// each other's writes. Writes land in a sibling temp file and are renamed
/// over the workbook.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Use the workbook at `path`, creating its parent directory if needed.
    ///
    /// The file itself is created on the first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(FileStore {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Workbook> {
        if !self.path.exists() {
            return Ok(Workbook::new());
        }
        let file = File::open(&self.path)
            .map_err(|e| StoreError::Connection(format!("{}: {}", self.path.display(), e)))?;
        let mut reader = BufReader::new(GzDecoder::new(file));
        Ok(deserialize_from(&mut reader)?)
    }

    fn save(&self, workbook: &Workbook) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(GzEncoder::new(file, Compression::default()));
            serialize_into(&mut writer, workbook)?;
            let encoder = writer
                .into_inner()
                .map_err(|e| StoreError::Io(e.into_error()))?;
            encoder.finish()?.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SheetStore for FileStore {
    fn read(&self, worksheet: &str, columns: &[&str]) -> Result<Table> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let workbook = self.load()?;
        read_from(workbook.get(worksheet), worksheet, columns)
    }

    fn update(&self, worksheet: &str, table: &Table) -> Result<()> {
        table.check_widths(worksheet)?;
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut workbook = self.load()?;
        workbook.insert(worksheet.to_string(), table.clone());
        self.save(&workbook)?;
        debug!(
            "wrote {} rows to worksheet '{}' in {}",
            table.len(),
            worksheet,
            self.path.display()
        );
        Ok(())
    }
}
