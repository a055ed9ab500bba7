use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Parse an order timestamp, keeping only the calendar date.
///
/// Accepts `YYYY-MM-DD` with an optional time or RFC 3339 suffix, and the
/// `M/D/YYYY H:MM` form used by the classic sales export.
pub fn parse_order_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Some(head) = s.get(..10) {
        if let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
            return Some(d);
        }
    }
    let date_part = s.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%m/%d/%Y").ok()
}

fn deserialize_order_date<'de, D>(d: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    parse_order_date(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("unparseable order date: {s:?}")))
}

/// One row of the sales dataset. Never mutated by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(alias = "ORDERNUMBER")]
    pub order_number: u64,
    #[serde(alias = "SALES")]
    pub sales: f64,
    #[serde(alias = "QUANTITYORDERED")]
    pub quantity_ordered: u32,
    #[serde(alias = "ORDERDATE", deserialize_with = "deserialize_order_date")]
    pub order_date: NaiveDate,
    #[serde(alias = "PRODUCTLINE")]
    pub product_line: String,
    #[serde(alias = "COUNTRY")]
    pub country: String,
    #[serde(alias = "STATUS")]
    pub status: String,
    #[serde(alias = "CUSTOMERNAME")]
    pub customer_name: String,
}

/// A scored order: the source record plus the detector's verdict.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyResult {
    #[serde(flatten)]
    pub record: OrderRecord,
    /// Lower is more anomalous; negative scores are flagged.
    pub anomaly_score: f64,
    pub is_anomaly: bool,
    pub anomaly_severity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopAnomaly {
    pub order_number: u64,
    pub sales: f64,
    pub anomaly_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnomalySummary {
    pub total_records: usize,
    pub total_anomalies: usize,
    /// Percentage of `total_records` flagged.
    pub anomaly_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_anomaly_score: Option<f64>,
    /// Most extreme (minimum) score among the anomalies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_anomaly_score: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub anomaly_by_product: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub anomaly_by_country: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub anomaly_by_status: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_anomalous_orders: Vec<TopAnomaly>,
}
