//! Scoring collaborators: the [`ObjectiveScorer`] seam and fitted linear models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use amp_types::{Configuration, ScoringError};

/// Predicts objective values for a content configuration.
///
/// `Ok(None)` means no fitted model exists for the objective; errors are
/// reserved for models that exist but could not produce a value.
pub trait ObjectiveScorer: Send + Sync {
    /// Objectives this scorer can be asked about.
    fn objectives(&self) -> Vec<String>;

    fn predict(
        &self,
        configuration: &Configuration,
        objective: &str,
    ) -> Result<Option<f64>, ScoringError>;
}

/// A fitted linear regression over content parameters.
///
/// Numeric parameters (booleans as 0/1) use `coefficients`; categorical
/// parameters are one-hot encoded through `categorical`, where unseen
/// categories contribute nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    #[serde(default)]
    pub coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
}

impl LinearModel {
    pub fn new(intercept: f64) -> Self {
        Self {
            intercept,
            ..Self::default()
        }
    }

    pub fn with_coefficient(mut self, parameter: impl Into<String>, weight: f64) -> Self {
        self.coefficients.insert(parameter.into(), weight);
        self
    }

    pub fn with_category(
        mut self,
        parameter: impl Into<String>,
        category: impl Into<String>,
        weight: f64,
    ) -> Self {
        self.categorical
            .entry(parameter.into())
            .or_default()
            .insert(category.into(), weight);
        self
    }

    pub fn predict(&self, configuration: &Configuration) -> Result<f64, ScoringError> {
        let mut total = self.intercept;

        for (parameter, weight) in &self.coefficients {
            let value = configuration
                .get(parameter)
                .ok_or_else(|| ScoringError::malformed(parameter, "missing from configuration"))?;
            let x = value.as_f64().ok_or_else(|| {
                ScoringError::malformed(parameter, format!("expected a numeric value, got {value}"))
            })?;
            total += weight * x;
        }

        for (parameter, categories) in &self.categorical {
            let value = configuration
                .get(parameter)
                .ok_or_else(|| ScoringError::malformed(parameter, "missing from configuration"))?;
            total += categories.get(&value.to_string()).copied().unwrap_or(0.0);
        }

        if total.is_finite() {
            Ok(total)
        } else {
            Err(ScoringError::transient("model produced a non-finite prediction"))
        }
    }
}

/// The fitted models for one segment, keyed by objective.
///
/// An objective may be declared without a model (training failed or was
/// skipped); it is reported but always predicts `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelSet {
    models: BTreeMap<String, Option<Arc<LinearModel>>>,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, objective: impl Into<String>, model: LinearModel) -> Self {
        self.models.insert(objective.into(), Some(Arc::new(model)));
        self
    }

    pub fn with_unfitted(mut self, objective: impl Into<String>) -> Self {
        self.models.insert(objective.into(), None);
        self
    }

    pub fn model(&self, objective: &str) -> Option<&Arc<LinearModel>> {
        self.models.get(objective).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl FromIterator<(String, Option<LinearModel>)> for ModelSet {
    fn from_iter<I: IntoIterator<Item = (String, Option<LinearModel>)>>(iter: I) -> Self {
        Self {
            models: iter
                .into_iter()
                .map(|(objective, model)| (objective, model.map(Arc::new)))
                .collect(),
        }
    }
}

impl ObjectiveScorer for ModelSet {
    fn objectives(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    fn predict(
        &self,
        configuration: &Configuration,
        objective: &str,
    ) -> Result<Option<f64>, ScoringError> {
        match self.model(objective) {
            Some(model) => model.predict(configuration).map(Some),
            None => Ok(None),
        }
    }
}

/// Adapts a closure (e.g. a call into an external inference service) into a
/// scorer.
pub struct FnScorer<F> {
    objectives: Vec<String>,
    predict: F,
}

impl<F> FnScorer<F>
where
    F: Fn(&Configuration, &str) -> Result<Option<f64>, ScoringError> + Send + Sync,
{
    pub fn new<I, O>(objectives: I, predict: F) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<String>,
    {
        Self {
            objectives: objectives.into_iter().map(Into::into).collect(),
            predict,
        }
    }
}

impl<F> ObjectiveScorer for FnScorer<F>
where
    F: Fn(&Configuration, &str) -> Result<Option<f64>, ScoringError> + Send + Sync,
{
    fn objectives(&self) -> Vec<String> {
        self.objectives.clone()
    }

    fn predict(
        &self,
        configuration: &Configuration,
        objective: &str,
    ) -> Result<Option<f64>, ScoringError> {
        (self.predict)(configuration, objective)
    }
}

impl<T: ObjectiveScorer + ?Sized> ObjectiveScorer for Arc<T> {
    fn objectives(&self) -> Vec<String> {
        (**self).objectives()
    }

    fn predict(
        &self,
        configuration: &Configuration,
        objective: &str,
    ) -> Result<Option<f64>, ScoringError> {
        (**self).predict(configuration, objective)
    }
}
