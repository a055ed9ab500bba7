//! Sales anomaly core: isolation-forest scoring of order records.
//! Fit once on a batch, score any number of batches with the same encoding.

mod anomaly;
mod config;
mod error;
mod features;
mod forest;
mod models;
mod scaler;
mod source;
mod summary;

pub use anomaly::{detect_sales_anomalies, fit_and_score, SalesAnomalyDetector, MIN_FIT_RECORDS};
pub use config::DetectorConfig;
pub use error::{AnomalyError, Result};
pub use features::{build_features, Category, CategoryEncoder, FEATURE_COLUMNS, N_FEATURES, UNSEEN_CATEGORY};
pub use forest::IsolationForest;
pub use models::{parse_order_date, AnomalyResult, AnomalySummary, OrderRecord, TopAnomaly};
pub use scaler::StandardScaler;
pub use source::{Dataset, JsonSource, OrderSource};
pub use summary::{summarize, TOP_ANOMALIES};
