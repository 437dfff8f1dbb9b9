//! Inference-only readers for exported model artifacts.
//!
//! Two shapes are understood, tagged by `kind`:
//!
//! - `linear`: a weight per feature plus an intercept.
//! - `tree_ensemble`: binary decision trees whose split nodes send a sample
//!   left when `x[feature] <= threshold`. Regression averages the leaves the
//!   sample lands in; classification takes a majority vote over the rounded
//!   leaf values, smallest code winning a tie.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tf_core::{CategoryCode, FeatureVector, ForecastError, FEATURE_COUNT};

use crate::{Classifier, InvalidArtifact, Regressor};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    pub fn from_json(raw: &str) -> Result<Self, InvalidArtifact> {
        let model: ModelArtifact =
            serde_json::from_str(raw).map_err(|e| InvalidArtifact(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), InvalidArtifact> {
        match self {
            ModelArtifact::Linear(model) => model.validate(),
            ModelArtifact::TreeEnsemble(model) => model.validate(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ModelArtifact::Linear(_) => "linear".to_string(),
            ModelArtifact::TreeEnsemble(model) => format!("tree_ensemble[{}]", model.trees.len()),
        }
    }

    fn score(&self, features: &FeatureVector) -> Result<f64, ForecastError> {
        match self {
            ModelArtifact::Linear(model) => Ok(model.score(features)),
            ModelArtifact::TreeEnsemble(model) => model.mean_leaf(features),
        }
    }
}

impl Regressor for ModelArtifact {
    fn predict_value(&self, features: &FeatureVector) -> Result<f64, ForecastError> {
        self.score(features)
    }
}

impl Classifier for ModelArtifact {
    fn predict_class(&self, features: &FeatureVector) -> Result<CategoryCode, ForecastError> {
        match self {
            ModelArtifact::Linear(model) => round_code(model.score(features)),
            ModelArtifact::TreeEnsemble(model) => model.vote(features),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LinearModel {
    fn validate(&self) -> Result<(), InvalidArtifact> {
        if self.weights.len() != FEATURE_COUNT {
            return Err(InvalidArtifact(format!(
                "linear model has {} weights, expected {FEATURE_COUNT}",
                self.weights.len()
            )));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(InvalidArtifact("linear model has non-finite coefficients".into()));
        }
        Ok(())
    }

    fn score(&self, features: &FeatureVector) -> f64 {
        self.weights
            .iter()
            .zip(features.as_slice())
            .fold(self.intercept, |acc, (w, x)| acc + w * x)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeEnsemble {
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    fn validate(&self) -> Result<(), InvalidArtifact> {
        if self.trees.is_empty() {
            return Err(InvalidArtifact("tree ensemble has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|InvalidArtifact(reason)| InvalidArtifact(format!("tree {i}: {reason}")))?;
        }
        Ok(())
    }

    fn mean_leaf(&self, features: &FeatureVector) -> Result<f64, ForecastError> {
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.evaluate(features)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn vote(&self, features: &FeatureVector) -> Result<CategoryCode, ForecastError> {
        let mut tally: BTreeMap<CategoryCode, usize> = BTreeMap::new();
        for tree in &self.trees {
            let code = round_code(tree.evaluate(features)?)?;
            *tally.entry(code).or_default() += 1;
        }
        let mut winner: Option<(CategoryCode, usize)> = None;
        for (code, votes) in tally {
            if winner.map_or(true, |(_, best)| votes > best) {
                winner = Some((code, votes));
            }
        }
        winner
            .map(|(code, _)| code)
            .ok_or_else(|| ForecastError::Inference("tree ensemble produced no votes".into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

impl DecisionTree {
    /// Children must point forward so every walk from the root terminates.
    fn validate(&self) -> Result<(), InvalidArtifact> {
        if self.nodes.is_empty() {
            return Err(InvalidArtifact("empty tree".into()));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= FEATURE_COUNT {
                        return Err(InvalidArtifact(format!(
                            "node {idx} splits on feature {feature}, only {FEATURE_COUNT} exist"
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(InvalidArtifact(format!("node {idx} has a NaN threshold")));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(InvalidArtifact(format!(
                                "node {idx} has out-of-order child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf(value) => {
                    if !value.is_finite() {
                        return Err(InvalidArtifact(format!("leaf {idx} is not finite")));
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, features: &FeatureVector) -> Result<f64, ForecastError> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf(value)) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).ok_or_else(|| {
                        ForecastError::Inference(format!("feature {feature} out of range"))
                    })?;
                    let next = if x <= *threshold { *left } else { *right };
                    if next <= idx {
                        return Err(ForecastError::Inference(format!(
                            "node {idx} points back to {next}"
                        )));
                    }
                    idx = next;
                }
                None => {
                    return Err(ForecastError::Inference(format!("missing tree node {idx}")));
                }
            }
        }
    }
}

fn round_code(score: f64) -> Result<CategoryCode, ForecastError> {
    if !score.is_finite() {
        return Err(ForecastError::Inference(format!("non-finite class score {score}")));
    }
    Ok(score.round() as CategoryCode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(past: f64, weekend: f64) -> FeatureVector {
        FeatureVector::new([past, 0.0, 1.0, 1.0, 0.0, weekend, 0.0, 0.0])
    }

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf(left),
                TreeNode::Leaf(right),
            ],
        }
    }

    #[test]
    fn linear_regression_scores() {
        let model = ModelArtifact::Linear(LinearModel {
            weights: vec![2.0, 0.0, 0.0, 0.0, 0.0, 100.0, 0.0, 0.0],
            intercept: 10.0,
        });
        model.validate().unwrap();
        assert_eq!(model.predict_value(&features(500.0, 1.0)).unwrap(), 1110.0);
        assert_eq!(model.predict_class(&features(0.4, 0.0)).unwrap(), 11);
    }

    #[test]
    fn ensemble_regression_averages_leaves() {
        let model = ModelArtifact::TreeEnsemble(TreeEnsemble {
            trees: vec![stump(0, 450.0, 100.0, 900.0), stump(5, 0.5, 200.0, 1000.0)],
        });
        model.validate().unwrap();
        assert_eq!(model.predict_value(&features(500.0, 0.0)).unwrap(), 550.0);
        assert_eq!(model.predict_value(&features(100.0, 1.0)).unwrap(), 550.0);
        assert_eq!(model.predict_value(&features(450.0, 0.0)).unwrap(), 150.0);
    }

    #[test]
    fn ensemble_vote_breaks_ties_low() {
        let model = ModelArtifact::TreeEnsemble(TreeEnsemble {
            trees: vec![
                stump(0, 450.0, 1.0, 0.0),
                stump(0, 450.0, 1.0, 2.0),
                stump(5, 0.5, 2.0, 0.0),
            ],
        });
        // past=500, weekday: votes 0, 2, 2
        assert_eq!(model.predict_class(&features(500.0, 0.0)).unwrap(), 2);
        // past=100, weekend: votes 1, 1, 0
        assert_eq!(model.predict_class(&features(100.0, 1.0)).unwrap(), 1);
        // past=500, weekend: votes 0, 2, 0
        assert_eq!(model.predict_class(&features(500.0, 1.0)).unwrap(), 0);

        let tie = ModelArtifact::TreeEnsemble(TreeEnsemble {
            trees: vec![stump(0, 450.0, 2.0, 2.0), stump(0, 450.0, 1.0, 1.0)],
        });
        assert_eq!(tie.predict_class(&features(0.0, 0.0)).unwrap(), 1);
    }

    #[test]
    fn json_round_trip_through_loader() {
        let raw = r#"{
            "kind": "tree_ensemble",
            "trees": [
                {"nodes": [
                    {"split": {"feature": 5, "threshold": 0.5, "left": 1, "right": 2}},
                    {"leaf": 300.0},
                    {"leaf": 1200.0}
                ]}
            ]
        }"#;
        let model = ModelArtifact::from_json(raw).unwrap();
        assert_eq!(model.describe(), "tree_ensemble[1]");
        assert_eq!(model.predict_value(&features(0.0, 1.0)).unwrap(), 1200.0);

        let linear = ModelArtifact::from_json(
            r#"{"kind": "linear", "weights": [1,0,0,0,0,0,0,0], "intercept": 5}"#,
        )
        .unwrap();
        assert_eq!(linear.predict_value(&features(7.0, 0.0)).unwrap(), 12.0);
    }

    #[test]
    fn malformed_models_are_rejected() {
        let bad = [
            r#"{"kind": "linear", "weights": [1, 2]}"#,
            r#"{"kind": "tree_ensemble", "trees": []}"#,
            r#"{"kind": "tree_ensemble", "trees": [{"nodes": []}]}"#,
            r#"{"kind": "tree_ensemble", "trees": [{"nodes": [
                {"split": {"feature": 8, "threshold": 0, "left": 1, "right": 2}},
                {"leaf": 1}, {"leaf": 2}]}]}"#,
            r#"{"kind": "tree_ensemble", "trees": [{"nodes": [
                {"split": {"feature": 0, "threshold": 0, "left": 0, "right": 1}},
                {"leaf": 1}]}]}"#,
            r#"{"kind": "tree_ensemble", "trees": [{"nodes": [
                {"split": {"feature": 0, "threshold": 0, "left": 1, "right": 5}},
                {"leaf": 1}]}]}"#,
            r#"{"kind": "gradient_magic"}"#,
            "not json",
        ];
        for raw in bad {
            assert!(ModelArtifact::from_json(raw).is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn non_finite_class_score_is_an_inference_error() {
        let model = ModelArtifact::Linear(LinearModel {
            weights: vec![1.0; FEATURE_COUNT],
            intercept: 0.0,
        });
        let v = FeatureVector::new([f64::INFINITY; FEATURE_COUNT]);
        assert!(matches!(model.predict_class(&v), Err(ForecastError::Inference(_))));
    }
}
