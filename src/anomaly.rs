//! Sales order anomaly detector: canonical encoding, standardization and an
//! isolation forest, fitted together and reused for scoring.

use crate::config::DetectorConfig;
use crate::error::{AnomalyError, Result};
use crate::features::{build_features, CategoryEncoder};
use crate::forest::IsolationForest;
use crate::models::{AnomalyResult, AnomalySummary, OrderRecord};
use crate::scaler::StandardScaler;
use crate::summary::summarize;
use tracing::info;

/// Smallest batch `fit` accepts.
pub const MIN_FIT_RECORDS: usize = 10;

/// Everything learned from one fitting batch.
#[derive(Debug, Clone)]
struct FittedModel {
    encoder: CategoryEncoder,
    scaler: StandardScaler,
    forest: IsolationForest,
}

/// Detector with an explicit ready / not-ready state.
///
/// `fit` takes `&mut self` and replaces the whole model; `predict` takes
/// `&self` and never mutates it. Sharing one detector across threads while
/// refitting requires external synchronization, e.g. `RwLock<SalesAnomalyDetector>`
/// with `fit` under the write guard and `predict` under read guards.
#[derive(Debug, Clone, Default)]
pub struct SalesAnomalyDetector {
    config: DetectorConfig,
    model: Option<FittedModel>,
}

impl SalesAnomalyDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config, model: None }
    }

    pub fn with_contamination(contamination: f64) -> Self {
        Self::new(DetectorConfig::default().with_contamination(contamination))
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Canonical encoding captured by the last `fit`, if any.
    pub fn encoder(&self) -> Option<&CategoryEncoder> {
        self.model.as_ref().map(|m| &m.encoder)
    }

    /// Fit on `records`, replacing any previous model. On error the
    /// previous state is left untouched.
    pub fn fit(&mut self, records: &[OrderRecord]) -> Result<()> {
        self.config.validate()?;
        if records.len() < MIN_FIT_RECORDS {
            return Err(AnomalyError::InvalidInput(format!(
                "need at least {MIN_FIT_RECORDS} records to fit, got {}",
                records.len()
            )));
        }

        let encoder = CategoryEncoder::fit(records);
        let features = build_features(records, &encoder)?;
        let scaler = StandardScaler::fit(&features);
        let scaled = scaler.transform(&features);
        let forest = IsolationForest::fit(
            &scaled,
            self.config.n_estimators,
            self.config.max_samples,
            self.config.contamination,
            self.config.random_seed,
        )?;

        info!(
            records = records.len(),
            trees = forest.n_trees(),
            contamination = self.config.contamination,
            offset = forest.offset(),
            "anomaly detector fitted"
        );

        self.model = Some(FittedModel {
            encoder,
            scaler,
            forest,
        });
        Ok(())
    }

    /// Score `records` with the fitted model. Output is in input order.
    pub fn predict(&self, records: &[OrderRecord]) -> Result<Vec<AnomalyResult>> {
        let model = self.model.as_ref().ok_or(AnomalyError::NotFitted)?;

        let features = build_features(records, &model.encoder)?;
        let scaled = model.scaler.transform(&features);
        let scores = model.forest.decision_function(&scaled);

        Ok(records
            .iter()
            .zip(scores.iter())
            .map(|(record, &score)| AnomalyResult {
                record: record.clone(),
                anomaly_score: score,
                is_anomaly: IsolationForest::is_outlier(score),
                anomaly_severity: score.abs(),
            })
            .collect())
    }
}

/// Fit, score and summarize one batch.
pub fn fit_and_score(
    records: &[OrderRecord],
    config: DetectorConfig,
) -> Result<(Vec<AnomalyResult>, AnomalySummary)> {
    let mut detector = SalesAnomalyDetector::new(config);
    detector.fit(records)?;
    let results = detector.predict(records)?;
    let summary = summarize(&results);
    Ok((results, summary))
}

/// [`fit_and_score`] with default settings and the given contamination.
pub fn detect_sales_anomalies(
    records: &[OrderRecord],
    contamination: f64,
) -> Result<(Vec<AnomalyResult>, AnomalySummary)> {
    fit_and_score(records, DetectorConfig::default().with_contamination(contamination))
}
