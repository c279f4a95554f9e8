//! Recommendation runs: resolve a segment's models, optimize, and report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use amp_types::{
    AmpResult, CampaignGoal, Configuration, ObjectiveWeights, ParameterChange, ScoreResult,
    SegmentKey,
};

use crate::domain::ParameterDomain;
use crate::optimizer::ParameterOptimizer;
use crate::registry::ModelRegistry;

/// Unique recommendation identifier.
pub type RecommendationId = Uuid;

/// What the caller wants optimized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub segment: SegmentKey,
    pub base_configuration: Configuration,
    /// Dimensions to vary, in order. `None` means every domain dimension.
    #[serde(default)]
    pub dimensions: Option<Vec<String>>,
    /// Explicit weights take precedence over `goal`.
    #[serde(default)]
    pub weights: Option<ObjectiveWeights>,
    #[serde(default)]
    pub goal: Option<CampaignGoal>,
}

impl RecommendationRequest {
    pub fn new(segment: SegmentKey, base_configuration: Configuration) -> Self {
        Self {
            segment,
            base_configuration,
            dimensions: None,
            weights: None,
            goal: None,
        }
    }

    pub fn with_dimensions<I, D>(mut self, dimensions: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        self.dimensions = Some(dimensions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_goal(mut self, goal: CampaignGoal) -> Self {
        self.goal = Some(goal);
        self
    }

    pub fn resolved_weights(&self) -> ObjectiveWeights {
        match (&self.weights, self.goal) {
            (Some(weights), _) => weights.clone(),
            (None, Some(goal)) => ObjectiveWeights::for_goal(goal),
            (None, None) => ObjectiveWeights::for_goal(CampaignGoal::default()),
        }
    }
}

/// Per-objective prediction before and after optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveLift {
    pub objective: String,
    pub baseline: Option<f64>,
    pub recommended: Option<f64>,
    /// `recommended - baseline` when both are known.
    pub change: Option<f64>,
}

/// The recommended content configuration for a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: RecommendationId,
    pub created_at: DateTime<Utc>,
    pub segment: SegmentKey,
    pub weights: ObjectiveWeights,
    pub baseline_configuration: Configuration,
    pub recommended_configuration: Configuration,
    pub baseline_score: f64,
    pub recommended_score: f64,
    pub predicted: ScoreResult,
    pub lift: Vec<ObjectiveLift>,
    pub changes: Vec<ParameterChange>,
    pub skipped_dimensions: Vec<String>,
    pub evaluations: usize,
}

impl Recommendation {
    pub fn improvement(&self) -> f64 {
        self.recommended_score - self.baseline_score
    }
}

/// Produces recommendations from a shared model registry and a fixed domain.
#[derive(Debug, Clone)]
pub struct Recommender {
    registry: Arc<ModelRegistry>,
    domain: ParameterDomain,
}

impl Recommender {
    pub fn new(registry: Arc<ModelRegistry>, domain: ParameterDomain) -> Self {
        Self { registry, domain }
    }

    pub fn recommend(&self, request: &RecommendationRequest) -> AmpResult<Recommendation> {
        let models = self.registry.get(&request.segment)?;
        let weights = request.resolved_weights();
        let dimensions = request
            .dimensions
            .clone()
            .unwrap_or_else(|| self.domain.dimension_names());

        info!(
            "Optimizing {} dimensions for segment {}",
            dimensions.len(),
            request.segment
        );

        let optimizer = ParameterOptimizer::new(&*models);
        let outcome = optimizer.optimize(
            &request.base_configuration,
            &dimensions,
            &weights,
            &self.domain,
        )?;

        let lift = outcome
            .best_scores
            .iter()
            .map(|(objective, recommended)| {
                let baseline = outcome.baseline_scores.get(objective);
                ObjectiveLift {
                    objective: objective.to_string(),
                    baseline,
                    recommended,
                    change: baseline.zip(recommended).map(|(b, r)| r - b),
                }
            })
            .collect();
        let changes = request
            .base_configuration
            .changes_to(&outcome.best_configuration);

        info!(
            "Segment {}: score {:.4} -> {:.4} with {} parameter changes after {} evaluations",
            request.segment,
            outcome.baseline_score,
            outcome.best_score,
            changes.len(),
            outcome.evaluations
        );

        Ok(Recommendation {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            segment: request.segment.clone(),
            weights,
            baseline_configuration: request.base_configuration.clone(),
            recommended_configuration: outcome.best_configuration,
            baseline_score: outcome.baseline_score,
            recommended_score: outcome.best_score,
            predicted: outcome.best_scores,
            lift,
            changes,
            skipped_dimensions: outcome.skipped_dimensions,
            evaluations: outcome.evaluations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::{LinearModel, ModelSet};
    use amp_types::{AmpError, OptimizerError, ParameterValue, ScoringError};

    fn registry() -> Arc<ModelRegistry> {
        let models = ModelSet::new()
            .with_model(
                "engagement_rate",
                LinearModel::new(0.02)
                    .with_coefficient("num_hashtags", 0.004)
                    .with_category("post_type", "video", 0.03)
                    .with_category("cta_type", "follow", 0.01),
            )
            .with_model(
                "conversion_rate",
                LinearModel::new(0.01).with_category("cta_type", "shop_now", 0.02),
            )
            .with_unfitted("reach");
        Arc::new(
            ModelRegistry::builder()
                .insert(SegmentKey::new("instagram", "gen_z"), models)
                .build()
                .unwrap(),
        )
    }

    fn base() -> Configuration {
        Configuration::new()
            .with("post_type", "image")
            .with("cta_type", "learn_more")
            .with("num_hashtags", 2)
    }

    #[test]
    fn request_weight_resolution() {
        let request = RecommendationRequest::new(SegmentKey::new("a", "b"), base());
        assert_eq!(
            request.resolved_weights(),
            ObjectiveWeights::for_goal(CampaignGoal::Balanced)
        );

        let request = request.with_goal(CampaignGoal::Conversion);
        assert_eq!(
            request.resolved_weights(),
            ObjectiveWeights::for_goal(CampaignGoal::Conversion)
        );

        let explicit = ObjectiveWeights::from_pairs([("reach", 1.0)]).unwrap();
        let request = request.with_weights(explicit.clone());
        assert_eq!(request.resolved_weights(), explicit);
    }

    #[test]
    fn conversion_goal_prefers_shop_now() {
        let recommender = Recommender::new(registry(), ParameterDomain::content_defaults());
        let request = RecommendationRequest::new(SegmentKey::new("instagram", "gen_z"), base())
            .with_dimensions(["cta_type"])
            .with_weights(ObjectiveWeights::from_pairs([("conversion_rate", 1.0)]).unwrap());

        let rec = recommender.recommend(&request).unwrap();
        assert_eq!(
            rec.recommended_configuration.get("cta_type"),
            Some(&ParameterValue::from("shop_now"))
        );
        assert_eq!(rec.changes.len(), 1);
        assert!(rec.improvement() > 0.0);
        assert_eq!(rec.evaluations, 5);

        let conversion = rec.lift.iter().find(|l| l.objective == "conversion_rate").unwrap();
        assert!((conversion.change.unwrap() - 0.02).abs() < 1e-12);
        let reach = rec.lift.iter().find(|l| l.objective == "reach").unwrap();
        assert_eq!(reach.change, None);
    }

    #[test]
    fn default_request_sweeps_every_dimension() {
        let domain = ParameterDomain::content_defaults();
        let recommender = Recommender::new(registry(), domain.clone());
        let request = RecommendationRequest::new(SegmentKey::new("instagram", "gen_z"), base())
            .with_goal(CampaignGoal::Engagement);

        let rec = recommender.recommend(&request).unwrap();
        assert_eq!(rec.evaluations, domain.evaluation_budget(&domain.dimension_names()));
        assert_eq!(
            rec.recommended_configuration.get("post_type"),
            Some(&ParameterValue::from("video"))
        );
        assert_eq!(
            rec.recommended_configuration.get("num_hashtags"),
            Some(&ParameterValue::Int(6))
        );
        assert!(rec.recommended_score >= rec.baseline_score);
    }

    #[test]
    fn unknown_segment_is_a_scoring_error() {
        let recommender = Recommender::new(registry(), ParameterDomain::content_defaults());
        let request = RecommendationRequest::new(SegmentKey::new("tiktok", "boomers"), base());
        let err = recommender.recommend(&request).unwrap_err();
        assert!(matches!(
            err,
            AmpError::Scoring(ScoringError::ModelUnavailable { .. })
        ));
    }

    #[test]
    fn malformed_base_is_rejected() {
        let recommender = Recommender::new(registry(), ParameterDomain::content_defaults());
        // The conversion model needs cta_type, which this base lacks.
        let broken = Configuration::new().with("num_hashtags", "lots");
        let request = RecommendationRequest::new(SegmentKey::new("instagram", "gen_z"), broken)
            .with_goal(CampaignGoal::Conversion);

        let err = recommender.recommend(&request).unwrap_err();
        assert!(matches!(
            err,
            AmpError::Optimizer(OptimizerError::InvalidBaseConfiguration { .. })
        ));
    }

    #[test]
    fn request_deserializes_with_optional_fields() {
        let request: RecommendationRequest = serde_json::from_str(
            r#"{
                "segment": {"platform": "instagram", "audience": "gen_z"},
                "base_configuration": {"cta_type": "learn_more", "num_hashtags": 3},
                "goal": "awareness"
            }"#,
        )
        .unwrap();
        assert_eq!(request.goal, Some(CampaignGoal::Awareness));
        assert!(request.dimensions.is_none());
        assert!(request.weights.is_none());
    }
}
