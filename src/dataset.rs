//! Batch conversion of a Spider dataset file.
//!
//! Each record is converted independently with its own value store, so
//! records are processed in parallel. Output order follows input order.

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ast::Sql;
use crate::config::EncoderConfig;
use crate::encoder::{self, Encoding, QueryContext};
use crate::error::{SemqlError, SemqlResult};
use crate::schema::Catalog;

/// Fields of a dataset record the encoder reads.
#[derive(Debug, Deserialize)]
pub struct Record {
    pub db_id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub query: String,
    pub sql: Sql,
}

impl Record {
    pub fn from_value(value: &Value) -> SemqlResult<Self> {
        Ok(Record::deserialize(value)?)
    }

    /// Encode this record against its database schema.
    pub fn encode(&self, catalog: &Catalog, config: &EncoderConfig) -> SemqlResult<Encoding> {
        let schema = catalog.get(&self.db_id)?;
        let ctx = QueryContext::new(schema, &self.question, &self.query);
        encoder::encode(&self.sql, ctx, config)
    }
}

/// What happened to one input record.
#[derive(Debug)]
pub enum Outcome {
    Converted(Value),
    /// Select list wider than the configured limit.
    TooWide(usize),
    Failed(SemqlError),
}

/// Result of a batch conversion.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Augmented records, in input order.
    pub records: Vec<Value>,
    pub converted: usize,
    pub skipped: usize,
}

/// Convert one raw record into its augmented form.
pub fn convert_record(raw: &Value, catalog: &Catalog, config: &EncoderConfig) -> Outcome {
    let record = match Record::from_value(raw) {
        Ok(record) => record,
        Err(e) => return Outcome::Failed(e),
    };

    let width = record.sql.select.items.len();
    if width > config.max_select_columns {
        return Outcome::TooWide(width);
    }

    match record.encode(catalog, config) {
        Ok(encoding) => match augment(raw, &encoding) {
            Ok(value) => Outcome::Converted(value),
            Err(e) => Outcome::Failed(e),
        },
        Err(e) => Outcome::Failed(e),
    }
}

/// Copy of `raw` with `rule_label` and `values` added.
pub fn augment(raw: &Value, encoding: &Encoding) -> SemqlResult<Value> {
    let mut object: Map<String, Value> = match raw {
        Value::Object(map) => map.clone(),
        _ => return Err(SemqlError::malformed("dataset record is not an object")),
    };
    object.insert("rule_label".into(), Value::String(encoding.rule_label()));
    object.insert("values".into(), serde_json::to_value(&encoding.values)?);
    Ok(Value::Object(object))
}

/// Convert every record. Unless `config.strict` is set, records that fail
/// to encode are logged and skipped.
pub fn convert_all(
    records: &[Value],
    catalog: &Catalog,
    config: &EncoderConfig,
) -> SemqlResult<BatchReport> {
    let outcomes: Vec<Outcome> = records
        .par_iter()
        .map(|raw| convert_record(raw, catalog, config))
        .collect();

    let mut report = BatchReport::default();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Outcome::Converted(value) => {
                report.records.push(value);
                report.converted += 1;
            }
            Outcome::TooWide(width) => {
                tracing::debug!("Skipping record {}: {} selected columns", index, width);
                report.skipped += 1;
            }
            Outcome::Failed(e) if config.strict => return Err(e),
            Outcome::Failed(e) => {
                tracing::warn!(
                    question = question_of(&records[index]),
                    unsupported = e.is_unsupported_input(),
                    "Skipping record {}: {}",
                    index,
                    e
                );
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}

fn question_of(raw: &Value) -> &str {
    raw.get("question").and_then(Value::as_str).unwrap_or("")
}

/// Load a dataset file (a JSON array of records).
pub fn load_records(path: impl AsRef<Path>) -> SemqlResult<Vec<Value>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let records: Vec<Value> = serde_json::from_str(&content)?;
    tracing::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn write_records(path: impl AsRef<Path>, records: &[Value]) -> SemqlResult<()> {
    let path = path.as_ref();
    let content = serde_json::to_string(records)?;
    fs::write(path, content)?;
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Load, convert and write in one go.
pub fn convert_file(
    data_path: impl AsRef<Path>,
    table_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &EncoderConfig,
) -> SemqlResult<BatchReport> {
    let catalog = Catalog::load_from_file(table_path)?;
    let records = load_records(data_path)?;
    let report = convert_all(&records, &catalog, config)?;
    write_records(output, &report.records)?;
    Ok(report)
}
