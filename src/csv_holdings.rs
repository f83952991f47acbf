use std::fs::File;
use std::num::ParseFloatError;
use std::{fmt, io, path::Path, path::PathBuf};

use csv::{ByteRecord, ReaderBuilder, StringRecord};

use crate::hashmap_portfolio::HashMapPortfolio;
use crate::portfolio::{Holding, Lot, Portfolio};

/// Positions of the fields of a cost basis export row. Only the account,
/// symbol and numeric columns are decoded, the rest are kept so the minimum
/// row length covers the whole layout.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Columns {
    pub account_name: usize,
    pub account_number: usize,
    pub symbol: usize,
    pub shares: usize,
    pub purchase_date: usize,
    pub market_value: usize,
    pub cost_basis: usize,
    pub unrealized_dollars: usize,
    pub unrealized_percent: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Columns {
            account_name: 0,
            account_number: 1,
            symbol: 2,
            shares: 3,
            purchase_date: 4,
            market_value: 5,
            cost_basis: 6,
            unrealized_dollars: 7,
            unrealized_percent: 8,
        }
    }
}

impl Columns {
    /// Number of fields a row needs for every column to be present.
    pub fn min_len(&self) -> usize {
        [
            self.account_name,
            self.account_number,
            self.symbol,
            self.shares,
            self.purchase_date,
            self.market_value,
            self.cost_basis,
            self.unrealized_dollars,
            self.unrealized_percent,
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
            + 1
    }
}

pub(crate) struct Reader<R> {
    records: csv::Reader<R>,
    columns: Columns,
}

impl Reader<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader<File>, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Reader::from_reader(file, Columns::default()))
    }
}

impl<R: io::Read> Reader<R> {
    pub fn from_reader(reader: R, columns: Columns) -> Reader<R> {
        // The header is skipped by the iterator rather than by the csv reader
        // so that it is never length checked.
        let records = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        Reader { records, columns }
    }

    pub fn iter(&mut self) -> CsvLotIterator<'_, R> {
        CsvLotIterator {
            records: &mut self.records,
            columns: &self.columns,
            header_skipped: false,
        }
    }
}

pub(crate) struct CsvLotIterator<'r, R> {
    records: &'r mut csv::Reader<R>,
    columns: &'r Columns,
    header_skipped: bool,
}

impl<'r, R: io::Read> CsvLotIterator<'r, R> {
    /// Reads the header as raw bytes so that it is discarded whatever it
    /// contains, invalid UTF-8 included.
    fn skip_header(&mut self) -> Result<bool, Error> {
        self.header_skipped = true;
        self.records
            .read_byte_record(&mut ByteRecord::new())
            .map_err(Error::Read)
    }
}

impl<'r, R: io::Read> Iterator for CsvLotIterator<'r, R> {
    type Item = Result<Lot, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.header_skipped {
            match self.skip_header() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(err) => return Some(Err(err)),
            }
        }

        let mut record = StringRecord::new();
        match self.records.read_record(&mut record) {
            Ok(true) => Some(decode_record(&record, self.columns)),
            Ok(false) => None,
            Err(err) => Some(Err(Error::Read(err))),
        }
    }
}

fn decode_record(record: &StringRecord, columns: &Columns) -> Result<Lot, Error> {
    let required_len = columns.min_len();
    if record.len() < required_len {
        return Err(Error::Format(FormatError {
            line: record.position().map(|p| p.line()).unwrap_or_default(),
            actual_len: record.len(),
            required_len,
        }));
    }

    log::debug!("The row values {:?}", record);

    let holding = decode_holding(record, columns).map_err(Error::Parse)?;

    Ok(Lot {
        account_name: field(record, columns.account_name).to_string(),
        account_number: field(record, columns.account_number).to_string(),
        holding,
    })
}

/// Decodes the symbol and numeric columns of a row. Numbers are checked in
/// the order shares, cost basis, market value and the first failure is
/// returned.
pub(crate) fn decode_holding(
    record: &StringRecord,
    columns: &Columns,
) -> Result<Holding, ParseError> {
    let shares = parse_number(record, columns.shares, HoldingField::Shares)?;
    let cost_basis = parse_number(record, columns.cost_basis, HoldingField::CostBasis)?;
    let market_value = parse_number(record, columns.market_value, HoldingField::MarketValue)?;

    Ok(Holding {
        symbol: field(record, columns.symbol).to_string(),
        shares,
        cost_basis,
        market_value,
    })
}

fn parse_number(
    record: &StringRecord,
    index: usize,
    field_kind: HoldingField,
) -> Result<f64, ParseError> {
    let raw = field(record, index);
    strip_thousands_separators(raw)
        .parse::<f64>()
        .map_err(|source| ParseError {
            field: field_kind,
            raw: raw.to_string(),
            source,
        })
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or_default()
}

pub(crate) fn strip_thousands_separators(number: &str) -> String {
    number.replace(',', "")
}

/// Reads every lot and folds it into a fresh portfolio. Any failure aborts
/// the read and nothing folded so far is returned.
pub(crate) fn read_all<R: io::Read>(reader: &mut Reader<R>) -> Result<HashMapPortfolio, Error> {
    let mut portfolio = HashMapPortfolio::new();

    for lot in reader.iter() {
        portfolio.fold(lot?);
    }

    Ok(portfolio)
}

/// Opens the export at `path` and aggregates it. The file is closed when this
/// returns, whichever way it returns.
pub(crate) fn process<P: AsRef<Path>>(path: P) -> Result<HashMapPortfolio, Error> {
    let mut reader = Reader::from_path(path)?;
    read_all(&mut reader)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HoldingField {
    Shares,
    CostBasis,
    MarketValue,
}

impl fmt::Display for HoldingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shares => write!(f, "number of shares"),
            Self::CostBasis => write!(f, "cost basis"),
            Self::MarketValue => write!(f, "market value"),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    Open { path: PathBuf, source: io::Error },
    Read(csv::Error),
    Format(FormatError),
    Parse(ParseError),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Read(err) => Some(err),
            Self::Format(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "failed to open holdings file {}: {}", path.display(), source)
            }
            Self::Read(err) => write!(f, "failed to read holdings record: {}", err),
            Self::Format(err) => write!(f, "invalid holdings record: {}", err),
            Self::Parse(err) => write!(f, "failed to decode holding: {}", err),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct FormatError {
    pub line: u64,
    pub actual_len: usize,
    pub required_len: usize,
}

impl std::error::Error for FormatError {}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row on line {} has {} fields, at least {} are required",
            self.line, self.actual_len, self.required_len
        )
    }
}

#[derive(Debug, PartialEq)]
pub struct ParseError {
    pub field: HoldingField,
    pub raw: String,
    pub source: ParseFloatError,
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to parse the {} into a float from \"{}\": {}",
            self.field, self.raw, self.source
        )
    }
}
