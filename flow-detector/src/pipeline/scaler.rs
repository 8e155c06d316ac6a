use ndarray::{Array1, Array2, Axis};
use tracing::debug;

use crate::error::{DetectorError, Result};

/// Per-feature standardization: `(value - mean) / std`
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl StandardScaler {
    /// Learn column means and population standard deviations.
    /// Constant columns get a deviation of 1.0 so they scale to zero.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(DetectorError::Data(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| DetectorError::Data("cannot compute feature means".to_string()))?;
        let std = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });

        debug!(features = mean.len(), rows = x.nrows(), "Fitted standard scaler");
        Ok(Self { mean, std })
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    /// Apply the fitted statistics to a matrix with the same columns
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(DetectorError::Data(format!(
                "scaler fitted on {} features, got {}",
                self.mean.len(),
                x.ncols()
            )));
        }
        Ok((x - &self.mean) / &self.std)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_transform_unit_statistics() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let z = scaler.transform(&x).unwrap();

        for col in z.axis_iter(Axis(1)) {
            assert!(col.mean().unwrap().abs() < 1e-12);
            assert!((col.std(0.0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_test_rows_use_train_statistics() {
        let train = array![[0.0], [2.0]];
        let test = array![[4.0]];
        let scaler = StandardScaler::fit(&train).unwrap();
        assert_eq!(scaler.mean(), &array![1.0]);
        assert_eq!(scaler.std(), &array![1.0]);
        assert_eq!(scaler.transform(&test).unwrap(), array![[3.0]]);
    }

    #[test]
    fn test_constant_column() {
        let x = array![[5.0], [5.0], [5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        assert_eq!(scaler.transform(&x).unwrap(), array![[0.0], [0.0], [0.0]]);
    }

    #[test]
    fn test_column_mismatch() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0]]).unwrap();
        assert!(scaler.transform(&array![[1.0]]).is_err());
    }
}
