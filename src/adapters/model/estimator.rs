//! Estimators reconstructed from a JSON model export.

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureVector, FEATURE_COUNT};
use crate::ports::{ClassifierError, LabelPredictor, ProbabilityPredictor};

/// Standardized logistic regression.
///
/// `p1 = sigmoid(intercept + sum(c_i * (x_i - mean_i) / scale_i))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
}

impl LogisticModel {
    pub(super) fn validate(&self) -> Result<(), String> {
        for (name, values) in [
            ("coefficients", &self.coefficients),
            ("scaler_mean", &self.scaler_mean),
            ("scaler_scale", &self.scaler_scale),
        ] {
            if values.len() != FEATURE_COUNT {
                return Err(format!(
                    "{name} has {} entries, expected {FEATURE_COUNT}",
                    values.len()
                ));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(format!("{name} contains non-finite values"));
            }
        }
        if !self.intercept.is_finite() {
            return Err("intercept is not finite".into());
        }
        if self.scaler_scale.iter().any(|s| *s == 0.0) {
            return Err("scaler_scale contains zero".into());
        }
        Ok(())
    }

    fn positive_probability(&self, features: &FeatureVector) -> f64 {
        let z = features
            .as_slice()
            .iter()
            .zip(&self.coefficients)
            .zip(self.scaler_mean.iter().zip(&self.scaler_scale))
            .fold(self.intercept, |acc, ((x, c), (m, s))| acc + c * (x - m) / s);

        1.0 / (1.0 + (-z).exp())
    }
}

impl ProbabilityPredictor for LogisticModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ClassifierError> {
        let p1 = self.positive_probability(features);
        Ok([1.0 - p1, p1])
    }
}

impl LabelPredictor for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError> {
        Ok(u8::from(self.positive_probability(features) > 0.5))
    }
}

/// One decision tree in the sklearn array layout.
///
/// Leaves have `children_left[i] == children_right[i] == -1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class counts `[negative, positive]`.
    pub value: Vec<[f64; 2]>,
}

impl DecisionTree {
    fn validate(&self) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("tree arrays have inconsistent lengths".into());
        }

        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left == -1 && right == -1 {
                let total: f64 = self.value[i].iter().sum();
                if !(total.is_finite() && total > 0.0) || self.value[i].iter().any(|v| *v < 0.0) {
                    return Err(format!("leaf {i} has invalid class counts"));
                }
                continue;
            }
            for child in [left, right] {
                // Children always follow their parent in sklearn's layout.
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {i} has child index {child} out of range"));
                }
            }
            let feature = self.feature[i];
            if feature < 0 || feature >= FEATURE_COUNT as i64 {
                return Err(format!("node {i} splits on unknown feature {feature}"));
            }
            if self.threshold[i].is_nan() {
                return Err(format!("node {i} has NaN threshold"));
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf reached by `x`.
    fn leaf_distribution(&self, x: &[f64]) -> [f64; 2] {
        let mut node = 0usize;
        while self.children_left[node] != -1 {
            let feature = self.feature[node] as usize;
            node = if x[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let [neg, pos] = self.value[node];
        let total = neg + pos;
        [neg / total, pos / total]
    }
}

/// Averaged ensemble of decision trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    pub(super) fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }

    fn proba(&self, features: &FeatureVector) -> [f64; 2] {
        let x = features.as_slice();
        let (neg, pos) = self
            .trees
            .iter()
            .map(|tree| tree.leaf_distribution(x))
            .fold((0.0, 0.0), |(n, p), [tn, tp]| (n + tn, p + tp));

        let count = self.trees.len() as f64;
        [neg / count, pos / count]
    }
}

impl ProbabilityPredictor for ForestModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ClassifierError> {
        Ok(self.proba(features))
    }
}

impl LabelPredictor for ForestModel {
    fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError> {
        let [neg, pos] = self.proba(features);
        Ok(u8::from(pos > neg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single split on glucose at 127.5.
    fn stump(low: [f64; 2], high: [f64; 2]) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![127.5, -2.0, -2.0],
            value: vec![[0.0, 0.0], low, high],
        }
    }

    fn logistic() -> LogisticModel {
        LogisticModel {
            coefficients: vec![1.0, 0.0, 0.0, 0.0],
            intercept: 0.0,
            scaler_mean: vec![100.0, 0.0, 0.0, 0.0],
            scaler_scale: vec![10.0, 1.0, 1.0, 1.0],
        }
    }

    #[test]
    fn test_logistic_at_mean_is_even() {
        let model = logistic();
        model.validate().expect("valid");

        let proba = model
            .predict_proba(&FeatureVector::new(100.0, 70.0, 25.0, 30))
            .expect("proba");
        assert!((proba[1] - 0.5).abs() < 1e-12);
        assert_eq!(model.predict(&FeatureVector::new(100.0, 70.0, 25.0, 30)).unwrap(), 0);
        assert_eq!(model.predict(&FeatureVector::new(150.0, 70.0, 25.0, 30)).unwrap(), 1);
    }

    #[test]
    fn test_logistic_rejects_zero_scale() {
        let mut model = logistic();
        model.scaler_scale[2] = 0.0;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_forest_traversal_goes_left_on_equal() {
        let forest = ForestModel {
            trees: vec![stump([9.0, 1.0], [1.0, 3.0])],
        };
        forest.validate().expect("valid");

        let at_threshold = forest
            .predict_proba(&FeatureVector::new(127.5, 70.0, 25.0, 30))
            .unwrap();
        assert!((at_threshold[1] - 0.1).abs() < 1e-12);

        let above = forest
            .predict_proba(&FeatureVector::new(127.6, 70.0, 25.0, 30))
            .unwrap();
        assert!((above[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_forest_averages_trees_and_ties_go_negative() {
        let forest = ForestModel {
            trees: vec![stump([1.0, 0.0], [1.0, 0.0]), stump([0.0, 1.0], [0.0, 1.0])],
        };

        let features = FeatureVector::new(140.0, 70.0, 25.0, 30);
        let proba = forest.predict_proba(&features).unwrap();
        assert!((proba[0] - 0.5).abs() < 1e-12);
        assert_eq!(forest.predict(&features).unwrap(), 0);
    }

    #[test]
    fn test_forest_rejects_out_of_range_child() {
        let mut tree = stump([1.0, 0.0], [0.0, 1.0]);
        tree.children_right[0] = 7;
        let forest = ForestModel { trees: vec![tree] };
        assert!(forest.validate().is_err());
    }

    #[test]
    fn test_forest_rejects_unknown_feature() {
        let mut tree = stump([1.0, 0.0], [0.0, 1.0]);
        tree.feature[0] = 4;
        assert!(tree.validate().is_err());
    }
}
