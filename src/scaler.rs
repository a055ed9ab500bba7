//! Per-feature standardization: (x - mean) / std.

use ndarray::{Array1, Array2, Axis};

#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Capture column means and population standard deviations.
    /// A zero std is stored as 1.0 so constant columns map to 0.
    pub fn fit(x: &Array2<f64>) -> Self {
        let mut mean = Array1::zeros(x.ncols());
        let mut scale = Array1::ones(x.ncols());
        for (j, column) in x.axis_iter(Axis(1)).enumerate() {
            let vals: Vec<f64> = column.iter().copied().collect();
            let (m, std) = mean_std(&vals);
            mean[j] = m;
            scale[j] = if std <= 0.0 || !std.is_finite() { 1.0 } else { std };
        }
        Self { mean, scale }
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.mean) / &self.scale
    }

    #[cfg(test)]
    fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    #[cfg(test)]
    fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

fn mean_std(vals: &[f64]) -> (f64, f64) {
    if vals.is_empty() {
        return (0.0, 0.0);
    }
    let n = vals.len() as f64;
    let sum: f64 = vals.iter().sum();
    let mean = sum / n;
    let sq_diff: f64 = vals.iter().map(|v| (v - mean).powi(2)).sum();
    let std = (sq_diff / n).sqrt();
    (mean, std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standardizes_columns() {
        let x = array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0]];
        let scaler = StandardScaler::fit(&x);
        let z = scaler.transform(&x);

        assert!((scaler.mean()[0] - 2.0).abs() < 1e-12);
        let col0_mean: f64 = z.column(0).sum() / 3.0;
        assert!(col0_mean.abs() < 1e-12);
        assert!((z[[2, 0]] - 1.224744871391589).abs() < 1e-9);
    }

    #[test]
    fn test_constant_column_scale_is_one() {
        let x = array![[5.0], [5.0], [5.0]];
        let scaler = StandardScaler::fit(&x);
        assert_eq!(scaler.scale()[0], 1.0);
        assert!(scaler.transform(&x).iter().all(|&v| v == 0.0));
    }
}
