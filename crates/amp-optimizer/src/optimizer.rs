//! Weighted multi-objective parameter optimizer.
//!
//! The search is greedy coordinate ascent: each requested dimension is swept
//! once, in order, and the best value found is frozen before the next
//! dimension starts. The result is a local optimum along single-dimension
//! moves from the baseline, not the best point of the joint grid.

use serde::{Deserialize, Serialize};
use tracing::debug;

use amp_types::{
    Configuration, ObjectiveWeights, OptimizerError, ParameterValue, ScoreResult, ScoringError,
};

use crate::domain::ParameterDomain;
use crate::scorer::ObjectiveScorer;

type Prediction = Result<Option<f64>, ScoringError>;

/// What happened while sweeping one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionStep {
    pub dimension: String,
    /// Value held by the running best before the sweep.
    pub before: Option<ParameterValue>,
    /// Value held after the sweep (equal to `before` if nothing beat it).
    pub chosen: Option<ParameterValue>,
    pub candidates_evaluated: usize,
    pub score_after: f64,
}

/// Result of [`ParameterOptimizer::optimize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub best_configuration: Configuration,
    pub best_scores: ScoreResult,
    pub best_score: f64,
    pub baseline_scores: ScoreResult,
    pub baseline_score: f64,
    /// Number of configurations scored, baseline included.
    pub evaluations: usize,
    pub steps: Vec<DimensionStep>,
    /// Requested dimensions the domain does not know about.
    pub skipped_dimensions: Vec<String>,
}

impl OptimizationOutcome {
    pub fn improvement(&self) -> f64 {
        self.best_score - self.baseline_score
    }
}

/// Searches a [`ParameterDomain`] for the configuration with the highest
/// weighted predicted score under a borrowed scorer.
pub struct ParameterOptimizer<'a, S: ObjectiveScorer + ?Sized> {
    scorer: &'a S,
}

impl<'a, S: ObjectiveScorer + ?Sized> ParameterOptimizer<'a, S> {
    pub fn new(scorer: &'a S) -> Self {
        Self { scorer }
    }

    /// Weighted sum of predictions over objectives that are both weighted and
    /// exposed by the scorer. Missing predictions and scorer failures
    /// contribute zero.
    pub fn score(&self, configuration: &Configuration, weights: &ObjectiveWeights) -> f64 {
        let mut predictions = ScoreResult::new();
        for objective in self.scorer.objectives() {
            if weights.get(&objective).is_none() {
                continue;
            }
            let prediction = match self.scorer.predict(configuration, &objective) {
                Ok(prediction) => prediction,
                Err(e) => {
                    debug!("Scoring {objective} for {configuration} failed: {e}");
                    None
                }
            };
            predictions.insert(objective, prediction);
        }
        predictions.weighted_sum(weights)
    }

    /// Predictions for every objective the scorer exposes.
    ///
    /// Fails only when every exposed objective returned an error.
    pub fn predict_all(&self, configuration: &Configuration) -> Result<ScoreResult, ScoringError> {
        let outcomes = self.predict_each(configuration);
        let failures = outcomes.iter().filter(|(_, r)| r.is_err()).count();
        let first_error = outcomes.iter().find_map(|(_, r)| r.as_ref().err().cloned());
        match first_error {
            Some(e) if failures == outcomes.len() => Err(e),
            _ => Ok(Self::collect_lenient(outcomes)),
        }
    }

    /// Greedy coordinate ascent from `base` over `dimensions`, in order.
    ///
    /// Unknown dimensions are skipped. A candidate replaces the running best
    /// only if it scores strictly higher, so ties keep the earlier value.
    pub fn optimize<D: AsRef<str>>(
        &self,
        base: &Configuration,
        dimensions: &[D],
        weights: &ObjectiveWeights,
        domain: &ParameterDomain,
    ) -> Result<OptimizationOutcome, OptimizerError> {
        let base_outcomes = self.predict_each(base);
        Self::ensure_scoreable(&base_outcomes, weights)
            .map_err(|reason| OptimizerError::InvalidBaseConfiguration { reason })?;

        let baseline_scores = Self::collect_lenient(base_outcomes);
        let baseline_score = baseline_scores.weighted_sum(weights);
        let mut best = base.clone();
        let mut best_score = baseline_score;
        let mut evaluations = 1;
        let mut steps = Vec::new();
        let mut skipped_dimensions = Vec::new();

        debug!("Baseline {base} scores {baseline_score}");

        for dimension in dimensions {
            let dimension = dimension.as_ref();
            let Some(candidates) = domain.candidates(dimension) else {
                debug!("Dimension {dimension} is not in the domain; skipping");
                skipped_dimensions.push(dimension.to_string());
                continue;
            };

            let before = best.get(dimension).cloned();
            for candidate in candidates {
                let variant = best.variant(dimension, candidate.clone());
                let variant_score = self.score(&variant, weights);
                evaluations += 1;
                if variant_score > best_score {
                    debug!(
                        "{dimension}={candidate} improves score {best_score} -> {variant_score}"
                    );
                    best = variant;
                    best_score = variant_score;
                }
            }

            steps.push(DimensionStep {
                dimension: dimension.to_string(),
                before,
                chosen: best.get(dimension).cloned(),
                candidates_evaluated: candidates.len(),
                score_after: best_score,
            });
        }

        let best_scores = if best == *base {
            baseline_scores.clone()
        } else {
            Self::collect_lenient(self.predict_each(&best))
        };

        Ok(OptimizationOutcome {
            best_configuration: best,
            best_scores,
            best_score,
            baseline_scores,
            baseline_score,
            evaluations,
            steps,
            skipped_dimensions,
        })
    }

    /// One prediction per exposed objective, failures kept.
    fn predict_each(&self, configuration: &Configuration) -> Vec<(String, Prediction)> {
        self.scorer
            .objectives()
            .into_iter()
            .map(|objective| {
                let outcome = self.scorer.predict(configuration, &objective);
                if let Err(e) = &outcome {
                    debug!("Prediction of {objective} for {configuration} failed: {e}");
                }
                (objective, outcome)
            })
            .collect()
    }

    fn collect_lenient(outcomes: Vec<(String, Prediction)>) -> ScoreResult {
        let mut result = ScoreResult::new();
        for (objective, outcome) in outcomes {
            result.insert(objective, outcome.ok().flatten());
        }
        result
    }

    /// The base is scoreable unless every objective that matters failed:
    /// weighted and exposed ones, or every exposed one if the weights name
    /// none of them. A missing model (`None`) is not a failure.
    fn ensure_scoreable(
        outcomes: &[(String, Prediction)],
        weights: &ObjectiveWeights,
    ) -> Result<(), ScoringError> {
        let weighted: Vec<_> = outcomes
            .iter()
            .filter(|(objective, _)| weights.get(objective).is_some())
            .collect();
        let relevant = if weighted.is_empty() {
            outcomes.iter().collect()
        } else {
            weighted
        };

        let mut first_error = None;
        for (_, outcome) in relevant {
            match outcome {
                Ok(_) => return Ok(()),
                Err(e) => {
                    first_error.get_or_insert_with(|| e.clone());
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// `base` followed by up to `count` copies that differ only in `dimension`,
/// using the domain's candidates other than the base's current value, in
/// domain order.
pub fn generate_variants(
    base: &Configuration,
    dimension: &str,
    domain: &ParameterDomain,
    count: usize,
) -> Vec<Configuration> {
    let mut variants = vec![base.clone()];
    if let Some(candidates) = domain.candidates(dimension) {
        let current = base.get(dimension);
        variants.extend(
            candidates
                .iter()
                .filter(|candidate| current != Some(*candidate))
                .take(count)
                .map(|candidate| base.variant(dimension, candidate.clone())),
        );
    }
    variants
}
