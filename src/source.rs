//! Order sources and the load-once dataset handed to the detector.

use crate::error::{AnomalyError, Result};
use crate::models::OrderRecord;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Anything that can produce a batch of orders.
pub trait OrderSource {
    fn load(&self) -> Result<Vec<OrderRecord>>;
}

#[derive(Debug, Deserialize)]
struct WrappedBatch {
    records: Vec<OrderRecord>,
}

/// JSON orders held in memory or read from a file.
#[derive(Debug, Clone)]
pub enum JsonSource {
    Text(String),
    File(PathBuf),
}

impl JsonSource {
    pub fn from_text(text: impl Into<String>) -> Self {
        JsonSource::Text(text.into())
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        JsonSource::File(path.into())
    }
}

impl OrderSource for JsonSource {
    fn load(&self) -> Result<Vec<OrderRecord>> {
        let text = match self {
            JsonSource::Text(text) => text.clone(),
            JsonSource::File(path) => fs::read_to_string(path)?,
        };
        // Accepted layouts: a bare array or `{"records": [...]}`.
        let records = if text.trim_start().starts_with('[') {
            serde_json::from_str::<Vec<OrderRecord>>(&text)?
        } else {
            serde_json::from_str::<WrappedBatch>(&text)?.records
        };
        Ok(records)
    }
}

impl OrderSource for Vec<OrderRecord> {
    fn load(&self) -> Result<Vec<OrderRecord>> {
        Ok(self.clone())
    }
}

/// Orders loaded once from a source; read-only afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<OrderRecord>,
}

impl Dataset {
    pub fn load(source: &dyn OrderSource) -> Result<Self> {
        let records = source.load()?;
        if records.is_empty() {
            return Err(AnomalyError::InvalidInput("dataset contains no orders".to_string()));
        }
        info!(records = records.len(), "dataset loaded");
        Ok(Self { records })
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ORDER: &str = r#"{"order_number": 1, "sales": 120.5, "quantity_ordered": 3,
        "order_date": "2024-02-01", "product_line": "Ships", "country": "UK",
        "status": "Shipped", "customer_name": "Harbor Ltd"}"#;

    #[test]
    fn test_loads_bare_array() {
        let source = JsonSource::from_text(format!("[{ORDER}, {ORDER}]"));
        let dataset = Dataset::load(&source).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].country, "UK");
    }

    #[test]
    fn test_loads_wrapped_records() {
        let source = JsonSource::from_text(format!(r#"{{"records": [{ORDER}]}}"#));
        let dataset = Dataset::load(&source).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{ORDER}]").unwrap();
        let dataset = Dataset::load(&JsonSource::from_path(file.path())).unwrap();
        assert_eq!(dataset.records()[0].order_number, 1);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let err = Dataset::load(&JsonSource::from_text("[]")).unwrap_err();
        assert!(matches!(err, AnomalyError::InvalidInput(_)));
    }

    #[test]
    fn test_bad_timestamp_is_invalid_input() {
        let bad = ORDER.replace("2024-02-01", "someday");
        let err = Dataset::load(&JsonSource::from_text(format!("[{bad}]"))).unwrap_err();
        match err {
            AnomalyError::InvalidInput(msg) => assert!(msg.contains("unparseable order date")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Dataset::load(&JsonSource::from_path("/nonexistent/orders.json")).unwrap_err();
        assert!(matches!(err, AnomalyError::Io(_)));
    }
}
