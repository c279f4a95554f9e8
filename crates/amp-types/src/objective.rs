//! Objective weights and per-objective predictions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{AmpError, AmpResult};
use crate::validation_error;

pub const ENGAGEMENT_RATE: &str = "engagement_rate";
pub const REACH: &str = "reach";
pub const CLICK_THROUGH_RATE: &str = "click_through_rate";
pub const CONVERSION_RATE: &str = "conversion_rate";

/// High-level campaign goal used to pick a default weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignGoal {
    Awareness,
    Engagement,
    Conversion,
    Balanced,
}

impl Default for CampaignGoal {
    fn default() -> Self {
        Self::Balanced
    }
}

/// Non-negative weight per objective.
///
/// Weights are not normalized and need not sum to 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct ObjectiveWeights {
    weights: BTreeMap<String, f64>,
}

impl ObjectiveWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K: Into<String>>(
        pairs: impl IntoIterator<Item = (K, f64)>,
    ) -> AmpResult<Self> {
        let mut weights = Self::new();
        for (name, weight) in pairs {
            weights.insert(name, weight)?;
        }
        Ok(weights)
    }

    /// Preset weighting for a campaign goal.
    pub fn for_goal(goal: CampaignGoal) -> Self {
        let pairs: &[(&str, f64)] = match goal {
            CampaignGoal::Awareness => &[(REACH, 1.0), (ENGAGEMENT_RATE, 0.25)],
            CampaignGoal::Engagement => &[
                (ENGAGEMENT_RATE, 1.0),
                (REACH, 0.25),
                (CLICK_THROUGH_RATE, 0.25),
            ],
            CampaignGoal::Conversion => &[(CONVERSION_RATE, 1.0), (CLICK_THROUGH_RATE, 0.5)],
            CampaignGoal::Balanced => &[
                (ENGAGEMENT_RATE, 0.25),
                (REACH, 0.25),
                (CLICK_THROUGH_RATE, 0.25),
                (CONVERSION_RATE, 0.25),
            ],
        };
        Self {
            weights: pairs
                .iter()
                .map(|(name, weight)| (name.to_string(), *weight))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, weight: f64) -> AmpResult<()> {
        let name = name.into();
        if !weight.is_finite() || weight < 0.0 {
            return Err(validation_error!(
                "weight for objective {name} must be a finite non-negative number, got {weight}"
            ));
        }
        self.weights.insert(name, weight);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.weights.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(name, weight)| (name.as_str(), *weight))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl TryFrom<BTreeMap<String, f64>> for ObjectiveWeights {
    type Error = AmpError;

    fn try_from(map: BTreeMap<String, f64>) -> AmpResult<Self> {
        Self::from_pairs(map)
    }
}

impl From<ObjectiveWeights> for BTreeMap<String, f64> {
    fn from(weights: ObjectiveWeights) -> Self {
        weights.weights
    }
}

/// Predicted value per objective; `None` when no model produced a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreResult {
    predictions: BTreeMap<String, Option<f64>>,
}

impl ScoreResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, objective: impl Into<String>, prediction: Option<f64>) {
        self.predictions.insert(objective.into(), prediction);
    }

    pub fn get(&self, objective: &str) -> Option<f64> {
        self.predictions.get(objective).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.predictions
            .iter()
            .map(|(name, prediction)| (name.as_str(), *prediction))
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Weighted sum over objectives that are both weighted and predicted.
    pub fn weighted_sum(&self, weights: &ObjectiveWeights) -> f64 {
        weights
            .iter()
            .filter_map(|(name, weight)| self.get(name).map(|p| weight * p))
            .sum()
    }
}
