//! Immutable registry of fitted model sets per audience segment.
//!
//! The registry is assembled once (from code or a JSON [`ModelBundle`]) and
//! then shared by reference; nothing mutates it after [`ModelRegistryBuilder::build`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use amp_types::{config_error, AmpResult, ScoringError, SegmentKey};

use crate::scorer::{LinearModel, ModelSet};

/// Serialized form of a registry, as produced by the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub segments: Vec<SegmentModels>,
    /// Segment to use when a request names one without models (`platform/audience`).
    #[serde(default)]
    pub fallback: Option<String>,
}

impl ModelBundle {
    /// Reads a JSON model bundle from disk.
    pub fn load(path: impl AsRef<Path>) -> AmpResult<Self> {
        let path = path.as_ref();
        info!("Loading model bundle from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Models for one segment; `null` marks an objective with no fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentModels {
    pub platform: String,
    pub audience: String,
    pub models: BTreeMap<String, Option<LinearModel>>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelRegistryBuilder {
    segments: BTreeMap<SegmentKey, Arc<ModelSet>>,
    fallback: Option<SegmentKey>,
}

impl ModelRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, segment: SegmentKey, models: ModelSet) -> Self {
        self.segments.insert(segment, Arc::new(models));
        self
    }

    pub fn with_fallback(mut self, segment: SegmentKey) -> Self {
        self.fallback = Some(segment);
        self
    }

    pub fn build(self) -> AmpResult<ModelRegistry> {
        if let Some(fallback) = &self.fallback {
            if !self.segments.contains_key(fallback) {
                return Err(config_error!(
                    "fallback segment {fallback} has no registered models"
                ));
            }
        }
        info!(
            "Model registry built with {} segments (fallback: {})",
            self.segments.len(),
            self.fallback
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "none".to_string())
        );
        Ok(ModelRegistry {
            segments: self.segments,
            fallback: self.fallback,
        })
    }
}

/// Segment key → fitted model set.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    segments: BTreeMap<SegmentKey, Arc<ModelSet>>,
    fallback: Option<SegmentKey>,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::new()
    }

    pub fn from_bundle(bundle: ModelBundle) -> AmpResult<Self> {
        let mut builder = ModelRegistryBuilder::new();
        let mut seen = BTreeSet::new();
        for segment in bundle.segments {
            let key = SegmentKey::new(segment.platform, segment.audience);
            if !seen.insert(key.clone()) {
                return Err(config_error!(
                    "segment {key} appears more than once in the model bundle"
                ));
            }
            debug!("Registering {} objectives for {}", segment.models.len(), key);
            builder = builder.insert(key, segment.models.into_iter().collect());
        }
        if let Some(fallback) = bundle.fallback {
            builder = builder.with_fallback(fallback.parse()?);
        }
        builder.build()
    }

    pub fn from_json_str(json: &str) -> AmpResult<Self> {
        let bundle: ModelBundle = serde_json::from_str(json)?;
        Self::from_bundle(bundle)
    }

    /// Models for `segment`, falling back to the registry's fallback segment.
    pub fn get(&self, segment: &SegmentKey) -> Result<Arc<ModelSet>, ScoringError> {
        if let Some(models) = self.segments.get(segment) {
            return Ok(Arc::clone(models));
        }
        match self.fallback.as_ref().and_then(|f| self.segments.get(f).map(|m| (f, m))) {
            Some((fallback, models)) => {
                warn!("No models for segment {segment}; using fallback {fallback}");
                Ok(Arc::clone(models))
            }
            None => Err(ScoringError::unavailable(segment.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
