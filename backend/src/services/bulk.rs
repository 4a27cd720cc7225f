//! Bulk ingestion service
//!
//! Accepts batches of movement records and inserts them with partial
//! success semantics: valid rows land, invalid rows are reported with
//! their index and skipped. The authenticated user always owns the
//! inserted rows regardless of what the batch claims.
//!
//! Besides structured records, the service accepts raw SQL INSERT
//! statements as produced by the external document processor. Those are
//! parsed here and go through the exact same validation path; they are
//! never executed as SQL.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::ProductCatalog;
use sqlx::PgPool;
use uuid::Uuid;

use super::reception::{CreateReceptionInput, ReceptionService};
use super::sale::{CreateSaleInput, SaleService};
use crate::error::AppResult;

/// Bulk ingestion service
#[derive(Clone)]
pub struct BulkService {
    db: PgPool,
}

/// Structured batch of records to insert
#[derive(Debug, Default, Deserialize)]
pub struct BulkRecordsInput {
    #[serde(default)]
    pub receptions: Vec<CreateReceptionInput>,
    #[serde(default)]
    pub sales: Vec<CreateSaleInput>,
}

/// One rejected row
#[derive(Debug, Serialize)]
pub struct BulkRowError {
    pub entity: String,
    pub index: usize,
    pub message: String,
}

/// Outcome of a bulk insert: how many rows landed and which failed
#[derive(Debug, Serialize)]
pub struct BulkInsertOutcome {
    pub inserted_count: usize,
    pub errors: Vec<BulkRowError>,
}

/// Which table a parsed INSERT statement targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertTarget {
    Receptions,
    Sales,
}

impl BulkService {
    /// Create a new BulkService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Insert a structured batch of records
    pub async fn insert_records(
        &self,
        user_id: Uuid,
        catalog: &ProductCatalog,
        input: BulkRecordsInput,
    ) -> AppResult<BulkInsertOutcome> {
        let mut inserted_count = 0;
        let mut errors = Vec::new();

        let reception_service = ReceptionService::new(self.db.clone());
        for (index, record) in input.receptions.into_iter().enumerate() {
            match reception_service
                .create_reception(user_id, catalog, record)
                .await
            {
                Ok(_) => inserted_count += 1,
                Err(e) => errors.push(BulkRowError {
                    entity: "reception".to_string(),
                    index,
                    message: e.to_string(),
                }),
            }
        }

        let sale_service = SaleService::new(self.db.clone());
        for (index, record) in input.sales.into_iter().enumerate() {
            match sale_service.create_sale(user_id, catalog, record).await {
                Ok(_) => inserted_count += 1,
                Err(e) => errors.push(BulkRowError {
                    entity: "sale".to_string(),
                    index,
                    message: e.to_string(),
                }),
            }
        }

        tracing::info!(
            inserted = inserted_count,
            rejected = errors.len(),
            "bulk record insert finished"
        );

        Ok(BulkInsertOutcome {
            inserted_count,
            errors,
        })
    }

    /// Parse and insert raw INSERT statements from the document processor.
    /// Every reported error, including insert failures, carries the index
    /// of the statement it came from.
    pub async fn insert_statements(
        &self,
        user_id: Uuid,
        catalog: &ProductCatalog,
        statements: Vec<String>,
    ) -> AppResult<BulkInsertOutcome> {
        let (receptions, sales, mut errors) = records_from_statements(&statements);
        let mut inserted_count = 0;

        let reception_service = ReceptionService::new(self.db.clone());
        for (index, record) in receptions {
            match reception_service
                .create_reception(user_id, catalog, record)
                .await
            {
                Ok(_) => inserted_count += 1,
                Err(e) => errors.push(BulkRowError {
                    entity: "statement".to_string(),
                    index,
                    message: e.to_string(),
                }),
            }
        }

        let sale_service = SaleService::new(self.db.clone());
        for (index, record) in sales {
            match sale_service.create_sale(user_id, catalog, record).await {
                Ok(_) => inserted_count += 1,
                Err(e) => errors.push(BulkRowError {
                    entity: "statement".to_string(),
                    index,
                    message: e.to_string(),
                }),
            }
        }

        tracing::info!(
            inserted = inserted_count,
            rejected = errors.len(),
            "bulk statement insert finished"
        );

        Ok(BulkInsertOutcome {
            inserted_count,
            errors,
        })
    }
}

/// Convert raw statements into insertable records, each tagged with the
/// index of the statement it was parsed from
#[allow(clippy::type_complexity)]
fn records_from_statements(
    statements: &[String],
) -> (
    Vec<(usize, CreateReceptionInput)>,
    Vec<(usize, CreateSaleInput)>,
    Vec<BulkRowError>,
) {
    let mut receptions = Vec::new();
    let mut sales = Vec::new();
    let mut errors = Vec::new();

    for (index, statement) in statements.iter().enumerate() {
        match parse_insert_statement(statement) {
            Ok((InsertTarget::Receptions, rows)) => {
                for row in rows {
                    match reception_from_row(&row) {
                        Ok(record) => receptions.push((index, record)),
                        Err(message) => errors.push(BulkRowError {
                            entity: "statement".to_string(),
                            index,
                            message,
                        }),
                    }
                }
            }
            Ok((InsertTarget::Sales, rows)) => {
                for row in rows {
                    match sale_from_row(&row) {
                        Ok(record) => sales.push((index, record)),
                        Err(message) => errors.push(BulkRowError {
                            entity: "statement".to_string(),
                            index,
                            message,
                        }),
                    }
                }
            }
            Err(message) => errors.push(BulkRowError {
                entity: "statement".to_string(),
                index,
                message,
            }),
        }
    }

    (receptions, sales, errors)
}

/// Parse one INSERT statement into column/value rows.
///
/// Handles the `INSERT INTO <table> (cols...) VALUES (...), (...)` shape
/// the document processor emits. Legacy Spanish column names are mapped
/// to the current schema.
fn parse_insert_statement(
    statement: &str,
) -> Result<(InsertTarget, Vec<BTreeMap<String, String>>), String> {
    let trimmed = statement.trim();
    let lower = trimmed.to_lowercase();
    if !lower.starts_with("insert into") {
        return Err("statement is not an INSERT".to_string());
    }

    let after_insert = trimmed["insert into".len()..].trim_start();
    let table_end = after_insert
        .find(|c: char| c.is_whitespace() || c == '(')
        .ok_or("missing column list")?;
    let table = after_insert[..table_end].trim().to_lowercase();
    let target = match table.as_str() {
        "recepciones" | "receptions" => InsertTarget::Receptions,
        "ventas" | "sales" => InsertTarget::Sales,
        other => return Err(format!("unsupported target table: {other}")),
    };

    let rest = after_insert[table_end..].trim_start();
    let (columns_raw, rest) = read_parenthesized(rest)?;
    let columns: Vec<String> = columns_raw
        .split(',')
        .map(|c| canonical_column(c.trim().trim_matches('"')))
        .collect();

    let rest = rest.trim_start();
    let rest_lower = rest.to_lowercase();
    if !rest_lower.starts_with("values") {
        return Err("missing VALUES clause".to_string());
    }
    let mut rest = rest["values".len()..].trim_start();

    let mut rows = Vec::new();
    loop {
        let (tuple_raw, remaining) = read_parenthesized(rest)?;
        let values = split_values(&tuple_raw)?;
        if values.len() != columns.len() {
            return Err(format!(
                "column/value count mismatch: {} columns, {} values",
                columns.len(),
                values.len()
            ));
        }
        let mut row = BTreeMap::new();
        for (column, value) in columns.iter().zip(values) {
            if let Some(value) = value {
                row.insert(column.clone(), value);
            }
        }
        rows.push(row);

        rest = remaining.trim_start();
        if let Some(stripped) = rest.strip_prefix(',') {
            rest = stripped.trim_start();
        } else {
            break;
        }
    }

    Ok((target, rows))
}

/// Read one balanced parenthesized group, returning its interior and the
/// remainder after the closing parenthesis. Quoted strings may contain
/// parentheses.
fn read_parenthesized(input: &str) -> Result<(String, &str), String> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, '(')) => {}
        _ => return Err("expected opening parenthesis".to_string()),
    }

    let mut depth = 1;
    let mut in_quote = false;
    for (pos, c) in chars {
        if in_quote {
            if c == '\'' {
                in_quote = false;
            }
        } else {
            match c {
                '\'' => in_quote = true,
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok((input[1..pos].to_string(), &input[pos + 1..]));
                    }
                }
                _ => {}
            }
        }
    }
    Err("unbalanced parentheses".to_string())
}

/// Split a VALUES tuple interior into individual values.
/// Returns None for SQL NULL; strings are unquoted with '' unescaped.
fn split_values(tuple: &str) -> Result<Vec<Option<String>>, String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut depth = 0;
    let mut chars = tuple.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            if c == '\'' {
                // '' is an escaped quote inside the literal
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    current.push('\'');
                } else {
                    in_quote = false;
                    current.push('\'');
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '\'' => {
                    in_quote = true;
                    current.push('\'');
                }
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth -= 1;
                    current.push(c);
                }
                ',' if depth == 0 => {
                    values.push(finish_value(&current)?);
                    current.clear();
                }
                _ => current.push(c),
            }
        }
    }
    if in_quote {
        return Err("unterminated string literal".to_string());
    }
    values.push(finish_value(&current)?);
    Ok(values)
}

fn finish_value(raw: &str) -> Result<Option<String>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty value in tuple".to_string());
    }
    if trimmed.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    if trimmed.starts_with('\'') {
        if !trimmed.ends_with('\'') || trimmed.len() < 2 {
            return Err("malformed string literal".to_string());
        }
        return Ok(Some(trimmed[1..trimmed.len() - 1].to_string()));
    }
    Ok(Some(trimmed.to_string()))
}

/// Map legacy column names onto the current schema
fn canonical_column(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "fecha_recepcion" => "reception_date",
        "fecha_venta" => "sale_date",
        "producto_codigo" => "product_code",
        "proveedor" => "supplier",
        "cliente" => "customer",
        "num_guia" => "guide_number",
        "num_factura" => "invoice_number",
        "volumen_m3" => "volume_m3",
        "certificacion" => "certification",
        "precio_unitario" => "unit_price",
        "rol" => "landholding_rol",
        "origen" => "origin",
        "comuna" => "commune",
        other => other,
    }
    .to_string()
}

fn required<'a>(row: &'a BTreeMap<String, String>, column: &str) -> Result<&'a str, String> {
    row.get(column)
        .map(String::as_str)
        .ok_or_else(|| format!("missing column: {column}"))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| format!("invalid date: {value}"))
}

fn parse_decimal(value: &str) -> Result<Decimal, String> {
    value
        .parse::<Decimal>()
        .map_err(|_| format!("invalid number: {value}"))
}

fn reception_from_row(row: &BTreeMap<String, String>) -> Result<CreateReceptionInput, String> {
    Ok(CreateReceptionInput {
        reception_date: parse_date(required(row, "reception_date")?)?,
        product_code: required(row, "product_code")?.to_string(),
        supplier: required(row, "supplier")?.to_string(),
        guide_number: required(row, "guide_number")?.to_string(),
        volume_m3: parse_decimal(required(row, "volume_m3")?)?,
        certification: required(row, "certification")?.to_string(),
        landholding_rol: row.get("landholding_rol").cloned(),
        origin: row.get("origin").cloned(),
        commune: row.get("commune").cloned(),
    })
}

fn sale_from_row(row: &BTreeMap<String, String>) -> Result<CreateSaleInput, String> {
    let unit_price = match row.get("unit_price") {
        Some(value) => Some(parse_decimal(value)?),
        None => None,
    };
    Ok(CreateSaleInput {
        sale_date: parse_date(required(row, "sale_date")?)?,
        product_code: required(row, "product_code")?.to_string(),
        customer: required(row, "customer")?.to_string(),
        invoice_number: required(row, "invoice_number")?.to_string(),
        volume_m3: parse_decimal(required(row, "volume_m3")?)?,
        certification: required(row, "certification")?.to_string(),
        unit_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_single_reception_insert() {
        let statement = "INSERT INTO recepciones (fecha_recepcion, producto_codigo, proveedor, \
                         num_guia, volumen_m3, certificacion) \
                         VALUES ('2025-01-10', 'W1.1', 'Forestal Sur', 'G-100', 25.5, 'FSC 100%')";
        let (target, rows) = parse_insert_statement(statement).unwrap();
        assert_eq!(target, InsertTarget::Receptions);
        assert_eq!(rows.len(), 1);

        let record = reception_from_row(&rows[0]).unwrap();
        assert_eq!(
            record.reception_date,
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
        assert_eq!(record.product_code, "W1.1");
        assert_eq!(record.volume_m3, Decimal::from_str("25.5").unwrap());
        assert_eq!(record.certification, "FSC 100%");
    }

    #[test]
    fn test_parse_multi_row_insert() {
        let statement = "INSERT INTO ventas (fecha_venta, producto_codigo, cliente, num_factura, \
                         volumen_m3, certificacion, precio_unitario) VALUES \
                         ('2025-02-01', 'W3.1', 'Celulosa Norte', 'F-1', 12, 'FSC 100%', NULL), \
                         ('2025-02-02', 'W3.1', 'Celulosa Norte', 'F-2', 8.5, 'FSC Mixto', 45000)";
        let (target, rows) = parse_insert_statement(statement).unwrap();
        assert_eq!(target, InsertTarget::Sales);
        assert_eq!(rows.len(), 2);

        let first = sale_from_row(&rows[0]).unwrap();
        assert_eq!(first.unit_price, None);
        let second = sale_from_row(&rows[1]).unwrap();
        assert_eq!(second.unit_price, Some(Decimal::from(45000)));
    }

    #[test]
    fn test_parse_handles_escaped_quotes_and_commas() {
        let statement = "INSERT INTO recepciones (fecha_recepcion, producto_codigo, proveedor, \
                         num_guia, volumen_m3, certificacion) \
                         VALUES ('2025-03-05', 'W1.1', 'O''Higgins, Ltda.', 'G-7', 10, 'FSC Mixto')";
        let (_, rows) = parse_insert_statement(statement).unwrap();
        let record = reception_from_row(&rows[0]).unwrap();
        assert_eq!(record.supplier, "O'Higgins, Ltda.");
    }

    #[test]
    fn test_parse_rejects_other_tables() {
        let statement = "INSERT INTO users (email) VALUES ('a@b.c')";
        assert!(parse_insert_statement(statement).is_err());
    }

    #[test]
    fn test_parse_rejects_non_insert() {
        assert!(parse_insert_statement("DELETE FROM recepciones").is_err());
        assert!(parse_insert_statement("DROP TABLE recepciones").is_err());
    }

    #[test]
    fn test_records_keep_their_statement_index() {
        let statements = vec![
            "DROP TABLE recepciones".to_string(),
            "INSERT INTO recepciones (fecha_recepcion, producto_codigo, proveedor, num_guia, \
             volumen_m3, certificacion) \
             VALUES ('2025-01-10', 'W1.1', 'Forestal Sur', 'G-100', 25.5, 'FSC 100%')"
                .to_string(),
            "INSERT INTO ventas (fecha_venta, producto_codigo, cliente, num_factura, volumen_m3, \
             certificacion) VALUES ('2025-02-01', 'W3.1', 'Celulosa Norte', 'F-1', 12, 'FSC 100%')"
                .to_string(),
        ];
        let (receptions, sales, errors) = records_from_statements(&statements);

        // Each record points back at the statement it came from, not at
        // its position within a merged batch
        assert_eq!(receptions.len(), 1);
        assert_eq!(receptions[0].0, 1);
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].0, 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].index, 0);
    }

    #[test]
    fn test_parse_rejects_count_mismatch() {
        let statement =
            "INSERT INTO recepciones (fecha_recepcion, producto_codigo) VALUES ('2025-01-01')";
        assert!(parse_insert_statement(statement).is_err());
    }
}
