//! Gradient-boosted regression trees in `XGBoost`'s JSON model format.
//!
//! Only the parts needed for scoring are read: the global bias, the
//! optional feature names, and each tree's flat node arrays. Node `i` is a
//! leaf when `left_children[i] == -1`, in which case `split_conditions[i]`
//! holds the leaf value.

use std::path::Path;

use serde::Deserialize;

use crate::ModelError;
use crate::adapter::Predictor;
use crate::features::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};

/// Objectives whose raw margin is already the prediction.
const IDENTITY_OBJECTIVES: &[&str] = &[
    "reg:squarederror",
    "reg:linear",
    "reg:absoluteerror",
    "reg:pseudohubererror",
];

#[derive(Deserialize)]
struct ModelDocument {
    learner: Learner,
}

#[derive(Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    learner_model_param: LearnerModelParam,
    gradient_booster: GradientBooster,
    #[serde(default)]
    objective: Option<Objective>,
}

#[derive(Deserialize)]
struct LearnerModelParam {
    base_score: String,
}

#[derive(Deserialize)]
struct GradientBooster {
    #[serde(default)]
    name: Option<String>,
    model: BoosterModel,
}

#[derive(Deserialize)]
struct BoosterModel {
    trees: Vec<RawTree>,
}

#[derive(Deserialize)]
struct Objective {
    name: String,
}

#[derive(Deserialize)]
struct RawTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<u64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
}

/// `default_left` is written as `0`/`1` by some versions and as booleans
/// by others.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    const fn is_set(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Leaf(f32),
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_raw(raw: RawTree, index: usize) -> Result<Self, ModelError> {
        let len = raw.left_children.len();
        let invalid = |message: String| ModelError::InvalidArtifact {
            message: format!("tree {index}: {message}"),
        };

        if len == 0 {
            return Err(invalid("no nodes".to_string()));
        }
        if raw.right_children.len() != len
            || raw.split_indices.len() != len
            || raw.split_conditions.len() != len
            || raw.default_left.len() != len
        {
            return Err(invalid("node arrays differ in length".to_string()));
        }

        let child = |node: usize, value: i64| -> Result<usize, ModelError> {
            usize::try_from(value)
                .ok()
                .filter(|&c| c > node && c < len)
                .ok_or_else(|| invalid(format!("node {node} has invalid child {value}")))
        };

        let nodes = (0..len)
            .map(|i| {
                if raw.left_children[i] == -1 {
                    return Ok(Node::Leaf(raw.split_conditions[i]));
                }
                let feature = usize::try_from(raw.split_indices[i])
                    .ok()
                    .filter(|&f| f < FEATURE_COUNT)
                    .ok_or_else(|| {
                        invalid(format!(
                            "node {i} splits on feature {} of {FEATURE_COUNT}",
                            raw.split_indices[i]
                        ))
                    })?;
                Ok(Node::Split {
                    feature,
                    threshold: raw.split_conditions[i],
                    left: child(i, raw.left_children[i])?,
                    right: child(i, raw.right_children[i])?,
                    default_left: raw.default_left[i].is_set(),
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        Ok(Self { nodes })
    }

    /// Walks from the root to a leaf. Children always have larger indices
    /// than their parent, so this terminates.
    fn leaf_value(&self, features: &[f64; FEATURE_COUNT]) -> f32 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let value = features[feature];
                    index = if value.is_nan() {
                        if default_left { left } else { right }
                    } else {
                        // Thresholds are single precision.
                        #[allow(clippy::cast_possible_truncation)]
                        let value = value as f32;
                        if value < threshold { left } else { right }
                    };
                }
            }
        }
    }
}

/// A loaded gradient-boosted tree ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    base_score: f64,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// Parses a model from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Json`] for malformed JSON,
    /// [`ModelError::FeatureMismatch`] if the model's feature names differ
    /// from [`FEATURE_NAMES`], and [`ModelError::InvalidArtifact`] for any
    /// other structural problem.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let document: ModelDocument = serde_json::from_str(json)?;
        let learner = document.learner;

        check_feature_names(&learner.feature_names)?;

        if let Some(name) = learner.gradient_booster.name.as_deref()
            && name != "gbtree"
        {
            return Err(ModelError::InvalidArtifact {
                message: format!("unsupported booster '{name}'"),
            });
        }

        if let Some(objective) = &learner.objective
            && !IDENTITY_OBJECTIVES.contains(&objective.name.as_str())
        {
            return Err(ModelError::InvalidArtifact {
                message: format!("unsupported objective '{}'", objective.name),
            });
        }

        let base_score = parse_base_score(&learner.learner_model_param.base_score)?;

        let trees = learner
            .gradient_booster
            .model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, raw)| Tree::from_raw(raw, i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { base_score, trees })
    }

    /// Reads and parses a model file.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotFound`] if the file does not exist, or any
    /// error from [`Self::from_json`].
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ModelError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ModelError::Io(e)
            }
        })?;

        let ensemble = Self::from_json(&json)?;
        log::info!(
            "Loaded model from {} ({} trees)",
            path.display(),
            ensemble.trees.len()
        );
        Ok(ensemble)
    }

    /// Number of trees.
    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Global bias added to every prediction.
    #[must_use]
    pub const fn base_score(&self) -> f64 {
        self.base_score
    }
}

impl Predictor for TreeEnsemble {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let values = features.values();
        let value = self.base_score
            + self
                .trees
                .iter()
                .map(|tree| f64::from(tree.leaf_value(values)))
                .sum::<f64>();

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::NonFinite { value })
        }
    }
}

fn check_feature_names(names: &[String]) -> Result<(), ModelError> {
    if names.is_empty() {
        return Ok(());
    }

    for position in 0..names.len().max(FEATURE_COUNT) {
        let expected = names.get(position).map_or("<none>", String::as_str);
        let found = FEATURE_NAMES.get(position).copied().unwrap_or("<none>");
        if expected != found {
            return Err(ModelError::FeatureMismatch {
                position,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
    }

    Ok(())
}

/// Parses `base_score`, which is written as `"5E-1"` or `"[5E-1]"`.
fn parse_base_score(raw: &str) -> Result<f64, ModelError> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let first = trimmed.split(',').next().unwrap_or_default().trim();
    first
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ModelError::InvalidArtifact {
            message: format!("invalid base_score '{raw}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ScenarioParams;

    /// Two trees: the first splits on `T2M_std_change` at 1.5, the second
    /// is a single leaf.
    const MODEL: &str = r#"{
        "learner": {
            "feature_names": [
                "T2M_mean_change", "T2M_std_change", "T2M_max_change",
                "extreme_heat_days_change", "RH2M_mean_change",
                "ALLSKY_SFC_SW_DWN_mean_change", "NDVI_mean_change",
                "NDVI_std_change", "EVI_mean_change", "NDWI_mean_change",
                "early_yield_mean", "early_yield_cv", "crop_soybean"
            ],
            "learner_model_param": {"base_score": "[5E-1]", "num_feature": "13"},
            "objective": {"name": "reg:squarederror"},
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "trees": [
                        {
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [1, 0, 0],
                            "split_conditions": [1.5, 1.0, 3.0],
                            "default_left": [1, 0, 0]
                        },
                        {
                            "left_children": [-1],
                            "right_children": [-1],
                            "split_indices": [0],
                            "split_conditions": [0.5],
                            "default_left": [false]
                        }
                    ]
                }
            }
        }
    }"#;

    fn with_std(temp_std_change: f64) -> FeatureVector {
        FeatureVector::from_params(&ScenarioParams {
            temp_std_change,
            ..ScenarioParams::default()
        })
    }

    #[test]
    fn sums_base_score_and_leaves() {
        let model = TreeEnsemble::from_json(MODEL).unwrap();
        assert_eq!(model.tree_count(), 2);
        assert!((model.base_score() - 0.5).abs() < f64::EPSILON);

        assert!((model.predict(&with_std(2.0)).unwrap() - 4.0).abs() < 1e-9);
        assert!((model.predict(&with_std(1.0)).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn threshold_is_exclusive_on_the_left() {
        let model = TreeEnsemble::from_json(MODEL).unwrap();
        assert!((model.predict(&with_std(1.5)).unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn missing_value_follows_default_direction() {
        let model = TreeEnsemble::from_json(MODEL).unwrap();
        let mut values = *with_std(2.0).values();
        values[1] = f64::NAN;
        let prediction = model.predict(&FeatureVector::new(values)).unwrap();
        assert!((prediction - 2.0).abs() < 1e-9);
    }

    #[test]
    fn renamed_feature_is_rejected() {
        let json = MODEL.replace("\"crop_soybean\"", "\"crop_corn\"");
        match TreeEnsemble::from_json(&json) {
            Err(ModelError::FeatureMismatch {
                position, expected, ..
            }) => {
                assert_eq!(position, 12);
                assert_eq!(expected, "crop_corn");
            }
            other => panic!("expected feature mismatch, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_child_is_rejected() {
        let json = MODEL.replace("\"left_children\": [1, -1, -1]", "\"left_children\": [7, -1, -1]");
        assert!(matches!(
            TreeEnsemble::from_json(&json),
            Err(ModelError::InvalidArtifact { .. })
        ));
    }

    #[test]
    fn base_score_accepts_both_encodings() {
        assert!((parse_base_score("5E-1").unwrap() - 0.5).abs() < f64::EPSILON);
        assert!((parse_base_score("[1.25E1]").unwrap() - 12.5).abs() < f64::EPSILON);
        assert!(parse_base_score("[]").is_err());
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = TreeEnsemble::load(Path::new("/nonexistent/xgboost_model.json")).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }
}
