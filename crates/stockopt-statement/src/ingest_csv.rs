//! CSV ingestion for gain/loss statements.
//!
//! Converts a statement export (a file or in-memory CSV text) into
//! [`Entry`] values. Any malformed or out-of-range field fails the whole
//! statement: a silently skipped lot would change the sale the allocator
//! recommends.
//!
//! ## CSV column contract (case-insensitive, order-independent)
//!
//! | Column        | Type / example        | Notes                                  |
//! |---------------|-----------------------|----------------------------------------|
//! | `lot`         | `7`                   | Optional; defaults to the data row no. |
//! | `plan`        | `GSU Class C`         |                                        |
//! | `acquired`    | `2019-03-25`          | Also `03/25/2019`                      |
//! | `available`   | `1,200`               | Integer shares >= 0                    |
//! | `issue_price` | `$612.40`             | Per-share cost basis, >= 0             |
//! | `price`       | `$1,140.00`           | Per-share sale value, >= 0             |
//! | `gain`        | `$527.60` / `(12.00)` | Optional; defaults to price - issue    |

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use stockopt_solver::Micros;
use tracing::debug;

use crate::currency::{parse_usd, strip_thousands, CurrencyError};
use crate::entry::Entry;

const REQUIRED: [&str; 5] = ["plan", "acquired", "available", "issue_price", "price"];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced while reading a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    /// An I/O or CSV-library error.
    Io(String),
    /// The header row is missing a required column.
    MissingHeader(&'static str),
    /// A field could not be parsed into the expected type.
    ParseField {
        row: usize,
        field: &'static str,
        raw: String,
    },
    /// A currency field could not be parsed.
    Currency {
        row: usize,
        field: &'static str,
        source: CurrencyError,
    },
    /// A field that must be >= 0 was negative.
    Negative { row: usize, field: &'static str },
    /// Two rows carry the same lot number.
    DuplicateLot { row: usize, lot: usize },
    /// `price - issue_price` does not fit in micros.
    GainOverflow { row: usize },
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementError::Io(msg) => write!(f, "statement io error: {msg}"),
            StatementError::MissingHeader(col) => {
                write!(f, "statement missing required header column: '{col}'")
            }
            StatementError::ParseField { row, field, raw } => {
                write!(f, "row {row}: cannot parse field '{field}' from value '{raw}'")
            }
            StatementError::Currency { row, field, source } => {
                write!(f, "row {row}: field '{field}': {source}")
            }
            StatementError::Negative { row, field } => {
                write!(f, "row {row}: field '{field}' must be >= 0")
            }
            StatementError::DuplicateLot { row, lot } => {
                write!(f, "row {row}: lot {lot} appears more than once")
            }
            StatementError::GainOverflow { row } => {
                write!(f, "row {row}: gain (price - issue_price) out of range")
            }
        }
    }
}

impl std::error::Error for StatementError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StatementError::Currency { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read and parse the statement at `path`.
///
/// # Errors
///
/// See [`parse_statement_str`]; I/O failures map to [`StatementError::Io`].
pub fn parse_statement_file(path: &Path) -> Result<Vec<Entry>, StatementError> {
    let buf = std::fs::read_to_string(path)
        .map_err(|e| StatementError::Io(format!("read '{}': {e}", path.display())))?;
    parse_statement_str(&buf)
}

/// Parse statement CSV text. Entries come back in file order.
///
/// An empty input (no header) yields no entries.
///
/// # Errors
///
/// The first structural or field error encountered, with its 1-based row
/// number (the header is row 1).
pub fn parse_statement_str(src: &str) -> Result<Vec<Entry>, StatementError> {
    if src.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(src.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| StatementError::Io(e.to_string()))?
        .clone();
    let cols = build_col_index(&headers)?;

    let mut out = Vec::new();
    let mut seen: BTreeSet<usize> = BTreeSet::new();

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| StatementError::Io(e.to_string()))?;
        let row = record
            .position()
            .and_then(|p| usize::try_from(p.line()).ok())
            .unwrap_or(i + 2);

        let get = |name: &'static str| field(&record, &cols, name);

        let index = match get("lot") {
            "" => i + 1,
            raw => raw.parse::<usize>().map_err(|_| StatementError::ParseField {
                row,
                field: "lot",
                raw: raw.to_string(),
            })?,
        };
        if !seen.insert(index) {
            return Err(StatementError::DuplicateLot { row, lot: index });
        }

        let acquired = parse_date(get("acquired")).ok_or_else(|| StatementError::ParseField {
            row,
            field: "acquired",
            raw: get("acquired").to_string(),
        })?;

        let available_raw = get("available");
        let available: i64 = strip_thousands(available_raw)
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| StatementError::ParseField {
                row,
                field: "available",
                raw: available_raw.to_string(),
            })?;
        if available < 0 {
            return Err(StatementError::Negative {
                row,
                field: "available",
            });
        }

        let issue_price = non_negative_usd(row, "issue_price", get("issue_price"))?;
        let price = non_negative_usd(row, "price", get("price"))?;
        let gain = match get("gain") {
            "" => price
                .checked_sub(issue_price)
                .ok_or(StatementError::GainOverflow { row })?,
            raw => currency(row, "gain", raw)?,
        };

        out.push(Entry {
            index,
            plan: get("plan").to_string(),
            acquired,
            available,
            issue_price,
            price,
            gain,
        });
    }

    debug!(entries = out.len(), "statement parsed");
    Ok(out)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `YYYY-MM-DD` or `MM/DD/YYYY`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

fn currency(row: usize, field: &'static str, raw: &str) -> Result<Micros, StatementError> {
    parse_usd(raw).map_err(|source| StatementError::Currency { row, field, source })
}

fn non_negative_usd(row: usize, field: &'static str, raw: &str) -> Result<Micros, StatementError> {
    let v = currency(row, field, raw)?;
    if v.is_negative() {
        return Err(StatementError::Negative { row, field });
    }
    Ok(v)
}

/// Column value by name, or `""` when the column is absent.
fn field<'r>(record: &'r csv::StringRecord, cols: &HashMap<&'static str, usize>, name: &str) -> &'r str {
    cols.get(name)
        .and_then(|&idx| record.get(idx))
        .unwrap_or("")
}

/// Case-insensitive column name → index map, checked for required columns.
fn build_col_index(
    headers: &csv::StringRecord,
) -> Result<HashMap<&'static str, usize>, StatementError> {
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for (i, col) in headers.iter().enumerate() {
        by_name.insert(col.trim().to_ascii_lowercase(), i);
    }

    let mut idx = HashMap::new();
    for name in REQUIRED {
        let i = by_name
            .get(name)
            .copied()
            .ok_or(StatementError::MissingHeader(name))?;
        idx.insert(name, i);
    }
    for name in ["lot", "gain"] {
        if let Some(&i) = by_name.get(name) {
            idx.insert(name, i);
        }
    }
    Ok(idx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
