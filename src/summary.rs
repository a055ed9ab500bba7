//! Aggregate view over a scored batch.

use crate::models::{AnomalyResult, AnomalySummary, TopAnomaly};
use std::collections::BTreeMap;
use tracing::warn;

/// How many of the most anomalous orders the summary lists.
pub const TOP_ANOMALIES: usize = 5;

pub fn summarize(results: &[AnomalyResult]) -> AnomalySummary {
    let mut anomalies: Vec<&AnomalyResult> = results.iter().filter(|r| r.is_anomaly).collect();

    if anomalies.is_empty() {
        warn!(records = results.len(), "no anomalies detected");
        return AnomalySummary {
            total_records: results.len(),
            total_anomalies: 0,
            anomaly_rate: 0.0,
            message: Some("No anomalies detected".to_string()),
            avg_anomaly_score: None,
            max_anomaly_score: None,
            anomaly_by_product: BTreeMap::new(),
            anomaly_by_country: BTreeMap::new(),
            anomaly_by_status: BTreeMap::new(),
            top_anomalous_orders: Vec::new(),
        };
    }

    let n = anomalies.len();
    let avg = anomalies.iter().map(|r| r.anomaly_score).sum::<f64>() / n as f64;
    let min = anomalies
        .iter()
        .map(|r| r.anomaly_score)
        .fold(f64::INFINITY, f64::min);

    let anomaly_by_product = value_counts(anomalies.iter().map(|r| r.record.product_line.as_str()));
    let anomaly_by_country = value_counts(anomalies.iter().map(|r| r.record.country.as_str()));
    let anomaly_by_status = value_counts(anomalies.iter().map(|r| r.record.status.as_str()));

    // Stable sort: equal scores keep input order.
    anomalies.sort_by(|a, b| a.anomaly_score.total_cmp(&b.anomaly_score));
    let top_anomalous_orders = anomalies
        .iter()
        .take(TOP_ANOMALIES)
        .map(|r| TopAnomaly {
            order_number: r.record.order_number,
            sales: r.record.sales,
            anomaly_score: r.anomaly_score,
        })
        .collect();

    AnomalySummary {
        total_records: results.len(),
        total_anomalies: n,
        anomaly_rate: n as f64 / results.len() as f64 * 100.0,
        message: None,
        avg_anomaly_score: Some(avg),
        max_anomaly_score: Some(min),
        anomaly_by_product,
        anomaly_by_country,
        anomaly_by_status,
        top_anomalous_orders,
    }
}

fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for v in values {
        *counts.entry(v.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderRecord;
    use chrono::NaiveDate;

    fn make_result(id: u64, score: f64, product: &str) -> AnomalyResult {
        AnomalyResult {
            record: OrderRecord {
                order_number: id,
                sales: id as f64 * 10.0,
                quantity_ordered: 1,
                order_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                product_line: product.to_string(),
                country: "USA".to_string(),
                status: "Shipped".to_string(),
                customer_name: "A".to_string(),
            },
            anomaly_score: score,
            is_anomaly: score < 0.0,
            anomaly_severity: score.abs(),
        }
    }

    #[test]
    fn test_zero_case() {
        let results = vec![make_result(1, 0.1, "Ships"), make_result(2, 0.2, "Ships")];
        let summary = summarize(&results);
        assert_eq!(summary.total_anomalies, 0);
        assert_eq!(summary.anomaly_rate, 0.0);
        assert_eq!(summary.message.as_deref(), Some("No anomalies detected"));

        let empty = summarize(&[]);
        assert_eq!(empty.anomaly_rate, 0.0);
        assert!(!empty.anomaly_rate.is_nan());
    }

    #[test]
    fn test_counts_and_extremes() {
        let results = vec![
            make_result(1, 0.1, "Ships"),
            make_result(2, -0.2, "Ships"),
            make_result(3, -0.05, "Planes"),
            make_result(4, 0.3, "Planes"),
        ];
        let summary = summarize(&results);
        assert_eq!(summary.total_anomalies, 2);
        assert_eq!(summary.anomaly_rate, 50.0);
        assert_eq!(summary.max_anomaly_score, Some(-0.2));
        assert!((summary.avg_anomaly_score.unwrap() + 0.125).abs() < 1e-12);
        assert_eq!(summary.anomaly_by_product.get("Ships"), Some(&1));
        assert_eq!(summary.anomaly_by_product.get("Planes"), Some(&1));
        assert_eq!(summary.anomaly_by_country.get("USA"), Some(&2));
        assert!(summary.message.is_none());
    }

    #[test]
    fn test_top_five_ties_keep_input_order() {
        let results: Vec<AnomalyResult> = [-0.1, -0.3, -0.3, -0.2, -0.05, -0.4, -0.01]
            .iter()
            .enumerate()
            .map(|(i, &s)| make_result(i as u64, s, "Ships"))
            .collect();
        let summary = summarize(&results);
        let ids: Vec<u64> = summary.top_anomalous_orders.iter().map(|t| t.order_number).collect();
        assert_eq!(ids, vec![5, 1, 2, 3, 0]);
    }
}
