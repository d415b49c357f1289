use crate::{
    clock::Clock,
    db::DbPool,
    errors::ServiceError,
    services::{
        cars::{is_valid_vin, CarService, NewCar},
        movements::MovementService,
        sales::{SalesService, SellCar},
    },
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};

/// The three record types a delimited file can carry. One kind per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Arrivals,
    Movements,
    Sales,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arrivals => "arrivals",
            Self::Movements => "movements",
            Self::Sales => "sales",
        }
    }

    /// Headers a file must carry (order-independent, supersets allowed) to
    /// be detected as this kind.
    fn required_headers(&self) -> &'static [&'static str] {
        match self {
            Self::Arrivals => &["date", "model", "color", "vin", "purchase_price"],
            Self::Movements => &["date", "vin", "from_location", "to_location"],
            Self::Sales => &["date", "vin", "buyer_name", "sale_price"],
        }
    }
}

/// Validated arrivals row: `date;model;color;vin;purchase_price`
#[derive(Debug, Clone)]
pub struct ArrivalRow {
    pub date: NaiveDateTime,
    pub model: String,
    pub color: String,
    pub vin: String,
    pub purchase_price: Decimal,
}

/// Validated movements row: `date;vin;from_location;to_location`
#[derive(Debug, Clone)]
pub struct MovementRow {
    pub date: NaiveDateTime,
    pub vin: String,
    pub from_location: String,
    pub to_location: String,
}

/// Validated sales row: `date;vin;buyer_name;sale_price`
#[derive(Debug, Clone)]
pub struct SaleRow {
    pub date: NaiveDateTime,
    pub vin: String,
    pub buyer_name: String,
    pub sale_price: Decimal,
}

/// Outcome of the parse phase: valid rows plus one error string per
/// malformed row. A malformed row never aborts the file.
#[derive(Debug, Clone)]
pub struct ParsedFile<T> {
    pub rows: Vec<T>,
    pub errors: Vec<String>,
}

/// Outcome of the import phase over already-parsed rows.
#[derive(Debug, Clone, Default)]
pub struct ImportCounts {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Flat result of one import operation. Parse-phase and import-phase
/// errors are concatenated, in that order.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub kind: RecordKind,
    pub parsed: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    fn assemble(kind: RecordKind, parse_errors: Vec<String>, counts: ImportCounts, parsed: usize) -> Self {
        let mut errors = parse_errors;
        errors.extend(counts.errors);
        Self {
            kind,
            parsed,
            imported: counts.imported,
            skipped: counts.skipped,
            errors,
        }
    }

    /// File-level failure: the whole parse phase is aborted, leaving a
    /// single aggregate error and zero data rows.
    fn file_failure(kind: RecordKind, path: &Path, err: &ServiceError) -> Self {
        Self {
            kind,
            parsed: 0,
            imported: 0,
            skipped: 0,
            errors: vec![format!("failed to read {}: {}", path.display(), err)],
        }
    }
}

fn parse_row_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Decimal price; comma accepted as the decimal separator.
fn parse_row_price(raw: &str) -> Option<Decimal> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    Decimal::from_str(&normalized).ok()
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, ServiceError> {
    let file = File::open(path)?;
    Ok(ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file))
}

fn file_error(err: csv::Error) -> ServiceError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => ServiceError::Io(io),
        other => ServiceError::InvalidInput(format!("unreadable file: {:?}", other)),
    }
}

/// Field access by header name, so column order never matters.
struct Columns {
    headers: StringRecord,
}

impl Columns {
    fn field<'r>(&self, record: &'r StringRecord, name: &str) -> &'r str {
        self.headers
            .iter()
            .position(|h| h == name)
            .and_then(|i| record.get(i))
            .unwrap_or("")
    }
}

/// Parse an arrivals file. Row errors carry 1-based line numbers; the
/// header is line 1.
pub fn parse_arrivals_file(path: &Path) -> Result<ParsedFile<ArrivalRow>, ServiceError> {
    let mut reader = open_reader(path)?;
    let columns = Columns {
        headers: reader.headers().map_err(file_error)?.clone(),
    };

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                errors.push(format!("line {}: unreadable row: {}", line, e));
                continue;
            }
        };
        let raw_date = columns.field(&record, "date");
        let date = match parse_row_date(raw_date) {
            Some(date) => date,
            None => {
                errors.push(format!("line {}: invalid date '{}'", line, raw_date));
                continue;
            }
        };
        let vin = columns.field(&record, "vin");
        if !is_valid_vin(vin) {
            errors.push(format!(
                "line {}: invalid VIN '{}' (expected 17 letters/digits)",
                line, vin
            ));
            continue;
        }
        let raw_price = columns.field(&record, "purchase_price");
        let purchase_price = match parse_row_price(raw_price) {
            Some(price) => price,
            None => {
                errors.push(format!(
                    "line {}: invalid purchase price '{}'",
                    line, raw_price
                ));
                continue;
            }
        };
        let model = columns.field(&record, "model");
        let color = columns.field(&record, "color");
        if model.is_empty() || color.is_empty() {
            errors.push(format!("line {}: model and color are required", line));
            continue;
        }
        rows.push(ArrivalRow {
            date,
            model: model.to_string(),
            color: color.to_string(),
            vin: vin.to_string(),
            purchase_price,
        });
    }

    Ok(ParsedFile { rows, errors })
}

/// Parse a movements file.
pub fn parse_movements_file(path: &Path) -> Result<ParsedFile<MovementRow>, ServiceError> {
    let mut reader = open_reader(path)?;
    let columns = Columns {
        headers: reader.headers().map_err(file_error)?.clone(),
    };

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                errors.push(format!("line {}: unreadable row: {}", line, e));
                continue;
            }
        };
        let raw_date = columns.field(&record, "date");
        let date = match parse_row_date(raw_date) {
            Some(date) => date,
            None => {
                errors.push(format!("line {}: invalid date '{}'", line, raw_date));
                continue;
            }
        };
        let vin = columns.field(&record, "vin");
        if !is_valid_vin(vin) {
            errors.push(format!("line {}: invalid VIN '{}'", line, vin));
            continue;
        }
        let from_location = columns.field(&record, "from_location");
        let to_location = columns.field(&record, "to_location");
        if from_location.is_empty() || to_location.is_empty() {
            errors.push(format!(
                "line {}: from_location and to_location are required",
                line
            ));
            continue;
        }
        rows.push(MovementRow {
            date,
            vin: vin.to_string(),
            from_location: from_location.to_string(),
            to_location: to_location.to_string(),
        });
    }

    Ok(ParsedFile { rows, errors })
}

/// Parse a sales file.
pub fn parse_sales_file(path: &Path) -> Result<ParsedFile<SaleRow>, ServiceError> {
    let mut reader = open_reader(path)?;
    let columns = Columns {
        headers: reader.headers().map_err(file_error)?.clone(),
    };

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                errors.push(format!("line {}: unreadable row: {}", line, e));
                continue;
            }
        };
        let raw_date = columns.field(&record, "date");
        let date = match parse_row_date(raw_date) {
            Some(date) => date,
            None => {
                errors.push(format!("line {}: invalid date '{}'", line, raw_date));
                continue;
            }
        };
        let vin = columns.field(&record, "vin");
        if !is_valid_vin(vin) {
            errors.push(format!("line {}: invalid VIN '{}'", line, vin));
            continue;
        }
        let buyer_name = columns.field(&record, "buyer_name");
        if buyer_name.is_empty() {
            errors.push(format!("line {}: buyer_name is required", line));
            continue;
        }
        let raw_price = columns.field(&record, "sale_price");
        let sale_price = match parse_row_price(raw_price) {
            Some(price) => price,
            None => {
                errors.push(format!("line {}: invalid sale price '{}'", line, raw_price));
                continue;
            }
        };
        rows.push(SaleRow {
            date,
            vin: vin.to_string(),
            buyer_name: buyer_name.to_string(),
            sale_price,
        });
    }

    Ok(ParsedFile { rows, errors })
}

/// Determine a file's record kind from its header line alone. Tokens are
/// split on `;` and trimmed; matching is order-independent and tolerates
/// extra columns. `None` means no schema matched.
pub fn detect_record_kind(path: &Path) -> Result<Option<RecordKind>, ServiceError> {
    let file = File::open(path)?;
    let mut first_line = String::new();
    BufReader::new(file).read_line(&mut first_line)?;

    let headers: HashSet<&str> = first_line.trim_end().split(';').map(str::trim).collect();
    for kind in [RecordKind::Arrivals, RecordKind::Movements, RecordKind::Sales] {
        if kind.required_headers().iter().all(|h| headers.contains(h)) {
            return Ok(Some(kind));
        }
    }
    Ok(None)
}

/// Replays parsed rows through the ledger, tracker and sales processor,
/// strictly sequentially, isolating every row-level failure.
#[derive(Clone)]
pub struct ImportService {
    cars: CarService,
    movements: MovementService,
    sales: SalesService,
}

impl ImportService {
    pub fn new(db_pool: Arc<DbPool>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cars: CarService::new(db_pool.clone(), clock.clone()),
            movements: MovementService::new(db_pool.clone()),
            sales: SalesService::new(db_pool, clock),
        }
    }

    /// Creates one car per row. Rows whose VIN already exists are skipped
    /// silently (deduplication policy, not an error); anything else that
    /// fails is captured per row and never propagated.
    pub async fn import_arrivals(&self, rows: Vec<ArrivalRow>) -> ImportCounts {
        let mut counts = ImportCounts::default();
        for row in rows {
            match self.cars.get_car_by_vin(&row.vin).await {
                Ok(Some(_)) => {
                    counts.skipped += 1;
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    counts.errors.push(format!("VIN {}: {}", row.vin, e));
                    continue;
                }
            }
            let vin = row.vin.clone();
            let created = self
                .cars
                .create_car(NewCar {
                    vin: row.vin,
                    model: row.model,
                    color: row.color,
                    purchase_price: row.purchase_price,
                    arrival_date: row.date,
                })
                .await;
            match created {
                Ok(_) => counts.imported += 1,
                Err(e) => counts.errors.push(format!("VIN {}: {}", vin, e)),
            }
        }
        counts
    }

    /// Replays relocations. Rows that do not apply (unknown VIN, wrong
    /// current location, already sold) are skipped with a descriptive
    /// error, unlike the silent arrivals dedup.
    pub async fn import_movements(&self, rows: Vec<MovementRow>) -> ImportCounts {
        let mut counts = ImportCounts::default();
        for row in rows {
            let moved = self
                .movements
                .move_car(&row.vin, &row.from_location, &row.to_location, row.date)
                .await;
            match moved {
                Ok(_) => counts.imported += 1,
                Err(ServiceError::NotFound(_)) | Err(ServiceError::LocationMismatch(_)) => {
                    counts.skipped += 1;
                    counts.errors.push(format!(
                        "VIN {}: car not found or not at the expected location ({} -> {})",
                        row.vin, row.from_location, row.to_location
                    ));
                }
                Err(ServiceError::AlreadySold(_)) => {
                    counts.skipped += 1;
                    counts
                        .errors
                        .push(format!("VIN {}: car is already sold", row.vin));
                }
                Err(e) => counts.errors.push(format!("VIN {}: {}", row.vin, e)),
            }
        }
        counts
    }

    /// Replays sales. Unknown or already-sold VINs are skipped with a
    /// descriptive error.
    pub async fn import_sales(&self, rows: Vec<SaleRow>) -> ImportCounts {
        let mut counts = ImportCounts::default();
        for row in rows {
            let sold = self
                .sales
                .sell_car(SellCar {
                    vin: row.vin.clone(),
                    sale_price: row.sale_price,
                    buyer_name: row.buyer_name,
                    buyer_phone: None,
                    buyer_email: None,
                    sale_date: Some(row.date),
                })
                .await;
            match sold {
                Ok(_) => counts.imported += 1,
                Err(ServiceError::NotFound(_)) | Err(ServiceError::AlreadySold(_)) => {
                    counts.skipped += 1;
                    counts
                        .errors
                        .push(format!("VIN {}: car not found or already sold", row.vin));
                }
                Err(e) => counts.errors.push(format!("VIN {}: {}", row.vin, e)),
            }
        }
        counts
    }

    /// Parses and imports one file. When `kind` is not given it is
    /// auto-detected from the header line; an undetectable file is an
    /// `InvalidInput` failure, distinct from any parse error. File-level
    /// I/O failures surface inside the report as a single aggregate error.
    #[instrument(skip(self))]
    pub async fn process_file(
        &self,
        path: &Path,
        kind: Option<RecordKind>,
    ) -> Result<ImportReport, ServiceError> {
        let kind = match kind {
            Some(kind) => kind,
            None => detect_record_kind(path)?.ok_or_else(|| {
                ServiceError::InvalidInput(
                    "unable to detect record kind from headers; expected arrivals \
                     (date;model;color;vin;purchase_price), movements \
                     (date;vin;from_location;to_location) or sales \
                     (date;vin;buyer_name;sale_price)"
                        .to_string(),
                )
            })?,
        };

        let report = match kind {
            RecordKind::Arrivals => match parse_arrivals_file(path) {
                Ok(parsed) => {
                    let parsed_count = parsed.rows.len();
                    let counts = self.import_arrivals(parsed.rows).await;
                    ImportReport::assemble(kind, parsed.errors, counts, parsed_count)
                }
                Err(e) => ImportReport::file_failure(kind, path, &e),
            },
            RecordKind::Movements => match parse_movements_file(path) {
                Ok(parsed) => {
                    let parsed_count = parsed.rows.len();
                    let counts = self.import_movements(parsed.rows).await;
                    ImportReport::assemble(kind, parsed.errors, counts, parsed_count)
                }
                Err(e) => ImportReport::file_failure(kind, path, &e),
            },
            RecordKind::Sales => match parse_sales_file(path) {
                Ok(parsed) => {
                    let parsed_count = parsed.rows.len();
                    let counts = self.import_sales(parsed.rows).await;
                    ImportReport::assemble(kind, parsed.errors, counts, parsed_count)
                }
                Err(e) => ImportReport::file_failure(kind, path, &e),
            },
        };

        info!(
            kind = kind.as_str(),
            parsed = report.parsed,
            imported = report.imported,
            skipped = report.skipped,
            error_count = report.errors.len(),
            "file import finished"
        );
        Ok(report)
    }
}
