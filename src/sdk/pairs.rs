// Normalises manual entries and uploaded tables into ordered OD pairs.
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx, XlsxError};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::borrow::Cow;
use std::io::{Cursor, Read};
use std::{fmt, fs, path::Path};
use thiserror::Error;

use super::geo::{Coordinate, ValidationError};

/// Upper bound on manually entered pairs.
pub const MAX_MANUAL_PAIRS: usize = 10;

pub const COL_ORIGIN: &str = "Origin";
pub const COL_ORIGIN_LAT: &str = "Origin_Lat";
pub const COL_ORIGIN_LON: &str = "Origin_Lon";
pub const COL_DESTINATION: &str = "Destination";
pub const COL_DESTINATION_LAT: &str = "Destination_Lat";
pub const COL_DESTINATION_LON: &str = "Destination_Lon";

pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_ORIGIN,
    COL_ORIGIN_LAT,
    COL_ORIGIN_LON,
    COL_DESTINATION,
    COL_DESTINATION_LAT,
    COL_DESTINATION_LON,
];

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Missing value for column '{0}'")]
    MissingCell(&'static str),

    #[error("Column '{column}' holds '{value}', which is not a number")]
    InvalidNumber { column: &'static str, value: String },

    #[error("Failed to read tabular input: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] XlsxError),

    #[error("Workbook has no worksheet")]
    NoWorksheet,

    #[error("Failed to open tabular input: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that stops a pair (or a whole load) from reaching the router.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Identity of a pair: its input position plus a human readable label.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PairId {
    pub index: usize,
    pub label: String,
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OdPair {
    pub id: PairId,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub origin_label: String,
    pub destination_label: String,
}

/// An input entry that was dropped before routing.
#[derive(Debug)]
pub struct RowRejection {
    /// 1-based position of the entry (data rows for tables, header excluded).
    pub row: usize,
    pub error: LoadError,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.error)
    }
}

#[derive(Debug, Default)]
pub struct PairLoad {
    pub pairs: Vec<OdPair>,
    pub rejected: Vec<RowRejection>,
}

pub trait PairSource {
    /// Produces the ordered pairs to route. Entry-level problems are reported
    /// in `rejected`; only problems affecting the whole input return `Err`.
    fn load(&self) -> Result<PairLoad, LoadError>;
}

/// Pairs typed in by hand as `((lat, lon), (lat, lon))` tuples.
#[derive(Debug, Clone, Default)]
pub struct ManualPairs {
    entries: Vec<((f64, f64), (f64, f64))>,
}

impl ManualPairs {
    pub fn new(entries: Vec<((f64, f64), (f64, f64))>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PairSource for ManualPairs {
    fn load(&self) -> Result<PairLoad, LoadError> {
        if self.entries.len() > MAX_MANUAL_PAIRS {
            return Err(ValidationError::TooManyPairs {
                given: self.entries.len(),
                max: MAX_MANUAL_PAIRS,
            }
            .into());
        }

        let mut load = PairLoad::default();
        for (index, &((o_lat, o_lon), (d_lat, d_lon))) in self.entries.iter().enumerate() {
            let endpoints = Coordinate::new(o_lat, o_lon)
                .and_then(|origin| Ok((origin, Coordinate::new(d_lat, d_lon)?)));
            match endpoints {
                Ok((origin, destination)) => load.pairs.push(OdPair {
                    id: PairId {
                        index,
                        label: format!("Pair {}", index + 1),
                    },
                    origin,
                    destination,
                    origin_label: origin.to_string(),
                    destination_label: destination.to_string(),
                }),
                Err(e) => {
                    log::warn!("Rejecting manual pair {}: {}", index + 1, e);
                    load.rejected.push(RowRejection {
                        row: index + 1,
                        error: e.into(),
                    });
                }
            }
        }
        Ok(load)
    }
}

/// Column positions resolved from the header row.
struct ColumnIndex {
    origin: usize,
    origin_lat: usize,
    origin_lon: usize,
    destination: usize,
    destination_lat: usize,
    destination_lon: usize,
}

impl ColumnIndex {
    fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<Self, ParseError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.as_ref().trim() == name)
                .ok_or(ParseError::MissingColumn(name))
        };
        Ok(Self {
            origin: find(COL_ORIGIN)?,
            origin_lat: find(COL_ORIGIN_LAT)?,
            origin_lon: find(COL_ORIGIN_LON)?,
            destination: find(COL_DESTINATION)?,
            destination_lat: find(COL_DESTINATION_LAT)?,
            destination_lon: find(COL_DESTINATION_LON)?,
        })
    }
}

fn parse_number(raw: &str, column: &'static str) -> Result<f64, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::MissingCell(column));
    }
    raw.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
        column,
        value: raw.to_string(),
    })
}

/// One data row, whatever the file format.
trait RowCells {
    /// Cell text, `None` when absent or blank.
    fn text(&self, idx: usize) -> Option<Cow<'_, str>>;

    fn number(&self, idx: usize, column: &'static str) -> Result<f64, ParseError>;
}

impl RowCells for StringRecord {
    fn text(&self, idx: usize) -> Option<Cow<'_, str>> {
        self.get(idx).filter(|s| !s.is_empty()).map(Cow::Borrowed)
    }

    fn number(&self, idx: usize, column: &'static str) -> Result<f64, ParseError> {
        parse_number(self.get(idx).unwrap_or_default(), column)
    }
}

// Workbook cells are typed: coordinates usually arrive as floats.
impl RowCells for [Data] {
    fn text(&self, idx: usize) -> Option<Cow<'_, str>> {
        match self.get(idx)? {
            Data::Empty => None,
            Data::String(s) => Some(Cow::Borrowed(s.trim())).filter(|s| !s.is_empty()),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    fn number(&self, idx: usize, column: &'static str) -> Result<f64, ParseError> {
        match self.get(idx) {
            None | Some(Data::Empty) => Err(ParseError::MissingCell(column)),
            Some(Data::Float(f)) => Ok(*f),
            Some(Data::Int(i)) => Ok(*i as f64),
            Some(Data::String(s)) => parse_number(s, column),
            Some(other) => Err(ParseError::InvalidNumber {
                column,
                value: other.to_string(),
            }),
        }
    }
}

fn parse_row<R: RowCells + ?Sized>(
    record: &R,
    columns: &ColumnIndex,
    index: usize,
) -> Result<OdPair, LoadError> {
    let origin = Coordinate::new(
        record.number(columns.origin_lat, COL_ORIGIN_LAT)?,
        record.number(columns.origin_lon, COL_ORIGIN_LON)?,
    )?;
    let destination = Coordinate::new(
        record.number(columns.destination_lat, COL_DESTINATION_LAT)?,
        record.number(columns.destination_lon, COL_DESTINATION_LON)?,
    )?;

    let label_or = |idx: usize, fallback: Coordinate| {
        record
            .text(idx)
            .map_or_else(|| fallback.to_string(), Cow::into_owned)
    };
    let origin_label = label_or(columns.origin, origin);
    let destination_label = label_or(columns.destination, destination);

    Ok(OdPair {
        id: PairId {
            index,
            label: format!("Row {}: {} -> {}", index + 1, origin_label, destination_label),
        },
        origin,
        destination,
        origin_label,
        destination_label,
    })
}

fn keep_or_reject(load: &mut PairLoad, row: usize, parsed: Result<OdPair, LoadError>) {
    match parsed {
        Ok(pair) => load.pairs.push(pair),
        Err(error) => {
            log::warn!("Rejecting table row {}: {}", row, error);
            load.rejected.push(RowRejection { row, error });
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    Csv,
    /// Excel workbook; the first worksheet is read.
    Xlsx,
}

impl TabularFormat {
    /// `.xlsx`/`.xlsm` files are workbooks, everything else is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("xlsx" | "xlsm") => Self::Xlsx,
            _ => Self::Csv,
        }
    }
}

/// Pairs read from a table (CSV or workbook) with the columns in
/// [`REQUIRED_COLUMNS`].
#[derive(Debug, Clone)]
pub struct TabularPairs {
    data: Vec<u8>,
    format: TabularFormat,
}

impl TabularPairs {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            format: TabularFormat::Csv,
        }
    }

    pub fn from_xlsx_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            format: TabularFormat::Xlsx,
        }
    }

    pub fn from_reader<R: Read>(mut reader: R, format: TabularFormat) -> Result<Self, ParseError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self { data, format })
    }

    /// Reads the whole file; the format follows the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let path = path.as_ref();
        Ok(Self {
            data: fs::read(path)?,
            format: TabularFormat::from_path(path),
        })
    }

    pub fn format(&self) -> TabularFormat {
        self.format
    }

    fn load_csv(&self) -> Result<PairLoad, LoadError> {
        let mut rdr = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(self.data.as_slice());

        let headers: Vec<String> = rdr
            .headers()
            .map_err(ParseError::from)?
            .iter()
            .map(str::to_string)
            .collect();
        let columns = ColumnIndex::resolve(&headers)?;

        let mut load = PairLoad::default();
        for (index, result) in rdr.records().enumerate() {
            let parsed = match result {
                Ok(record) => parse_row(&record, &columns, index),
                Err(e) if e.is_io_error() => return Err(ParseError::from(e).into()),
                Err(e) => Err(ParseError::from(e).into()),
            };
            keep_or_reject(&mut load, index + 1, parsed);
        }
        Ok(load)
    }

    fn load_xlsx(&self) -> Result<PairLoad, LoadError> {
        let mut workbook: Xlsx<_> =
            open_workbook_from_rs(Cursor::new(self.data.as_slice())).map_err(ParseError::from)?;
        let sheet = workbook
            .worksheet_range_at(0)
            .ok_or(ParseError::NoWorksheet)?
            .map_err(ParseError::from)?;

        let mut rows = sheet
            .rows()
            .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)));
        let headers: Vec<String> = rows
            .next()
            .map(|cells| cells.iter().map(ToString::to_string).collect())
            .unwrap_or_default();
        let columns = ColumnIndex::resolve(&headers)?;

        let mut load = PairLoad::default();
        for (index, cells) in rows.enumerate() {
            keep_or_reject(&mut load, index + 1, parse_row(cells, &columns, index));
        }
        Ok(load)
    }
}

impl PairSource for TabularPairs {
    fn load(&self) -> Result<PairLoad, LoadError> {
        let load = match self.format {
            TabularFormat::Csv => self.load_csv()?,
            TabularFormat::Xlsx => self.load_xlsx()?,
        };
        log::info!(
            "Loaded {} pairs from {:?} table ({} rows rejected)",
            load.pairs.len(),
            self.format,
            load.rejected.len()
        );
        Ok(load)
    }
}
