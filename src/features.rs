//! Feature construction from raw order records.
//!
//! Column order is fixed: the scaler and the forest bind features by
//! position, so [`FEATURE_COLUMNS`] is part of the fitted model's contract.

use crate::error::{AnomalyError, Result};
use crate::models::OrderRecord;
use chrono::Datelike;
use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const FEATURE_COLUMNS: [&str; 11] = [
    "sales",
    "quantity_ordered",
    "day_of_week",
    "month",
    "quarter",
    "is_weekend",
    "sales_per_quantity",
    "log_sales",
    "product_encoded",
    "country_encoded",
    "status_encoded",
];

pub const N_FEATURES: usize = FEATURE_COLUMNS.len();

/// Code assigned to a category value that was not seen at fit time.
pub const UNSEEN_CATEGORY: f64 = -1.0;

/// Categorical columns of an [`OrderRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    ProductLine,
    Country,
    Status,
}

impl Category {
    fn value(self, r: &OrderRecord) -> &str {
        match self {
            Category::ProductLine => &r.product_line,
            Category::Country => &r.country,
            Category::Status => &r.status,
        }
    }
}

/// Canonical category -> code mapping, fixed at fit time.
///
/// Codes follow sorted order of the distinct values, so the same batch
/// always yields the same codes regardless of row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryEncoder {
    product_line: BTreeMap<String, usize>,
    country: BTreeMap<String, usize>,
    status: BTreeMap<String, usize>,
}

impl CategoryEncoder {
    pub fn fit(records: &[OrderRecord]) -> Self {
        Self {
            product_line: build_codes(records, Category::ProductLine),
            country: build_codes(records, Category::Country),
            status: build_codes(records, Category::Status),
        }
    }

    fn mapping(&self, column: Category) -> &BTreeMap<String, usize> {
        match column {
            Category::ProductLine => &self.product_line,
            Category::Country => &self.country,
            Category::Status => &self.status,
        }
    }

    /// Number of distinct values known for `column`.
    #[cfg(test)]
    fn cardinality(&self, column: Category) -> usize {
        self.mapping(column).len()
    }

    /// Code for `value`, or [`UNSEEN_CATEGORY`] if it was not seen at fit time.
    pub fn encode(&self, column: Category, value: &str) -> f64 {
        match self.mapping(column).get(value) {
            Some(&code) => code as f64,
            None => {
                debug!(?column, value, "unseen category mapped to sentinel");
                UNSEEN_CATEGORY
            }
        }
    }
}

fn build_codes(records: &[OrderRecord], column: Category) -> BTreeMap<String, usize> {
    let distinct: BTreeSet<&str> = records.iter().map(|r| column.value(r)).collect();
    distinct
        .into_iter()
        .enumerate()
        .map(|(code, v)| (v.to_string(), code))
        .collect()
}

/// Build the `(records.len(), N_FEATURES)` feature matrix, rows in input order.
pub fn build_features(records: &[OrderRecord], encoder: &CategoryEncoder) -> Result<Array2<f64>> {
    if records.is_empty() {
        return Err(AnomalyError::InvalidInput(
            "cannot build features from an empty batch".to_string(),
        ));
    }

    let mut x = Array2::zeros((records.len(), N_FEATURES));
    for (i, record) in records.iter().enumerate() {
        let row = feature_row(record, encoder)?;
        for (j, v) in row.into_iter().enumerate() {
            x[[i, j]] = v;
        }
    }
    Ok(x)
}

fn feature_row(r: &OrderRecord, encoder: &CategoryEncoder) -> Result<[f64; N_FEATURES]> {
    if !r.sales.is_finite() || r.sales < 0.0 {
        return Err(AnomalyError::InvalidInput(format!(
            "order {}: sales must be a finite non-negative amount, got {}",
            r.order_number, r.sales
        )));
    }

    let day_of_week = r.order_date.weekday().num_days_from_monday();
    let month = r.order_date.month();
    let quarter = (month - 1) / 3 + 1;
    let is_weekend = if day_of_week >= 5 { 1.0 } else { 0.0 };

    // Zero quantity clamps to 0 instead of producing inf/NaN.
    let sales_per_quantity = if r.quantity_ordered == 0 {
        debug!(order = r.order_number, "zero quantity ordered, sales_per_quantity clamped to 0");
        0.0
    } else {
        r.sales / r.quantity_ordered as f64
    };

    let row = [
        r.sales,
        r.quantity_ordered as f64,
        day_of_week as f64,
        month as f64,
        quarter as f64,
        is_weekend,
        sales_per_quantity,
        r.sales.ln_1p(),
        encoder.encode(Category::ProductLine, &r.product_line),
        encoder.encode(Category::Country, &r.country),
        encoder.encode(Category::Status, &r.status),
    ];
    Ok(row.map(|v| if v.is_finite() { v } else { 0.0 }))
}
