//! # amp-optimizer
//!
//! Content-parameter optimization for Amplify.
//!
//! Provides the enumerated parameter domain, the scoring seam over fitted
//! per-objective models, an immutable per-segment model registry, the greedy
//! coordinate-ascent optimizer and the recommendation layer built on it.

mod domain;
mod optimizer;
mod recommend;
mod registry;
mod scorer;

pub use domain::{DomainEntry, ParameterDomain};
pub use optimizer::{generate_variants, DimensionStep, OptimizationOutcome, ParameterOptimizer};
pub use recommend::{
    ObjectiveLift, Recommendation, RecommendationId, RecommendationRequest, Recommender,
};
pub use registry::{ModelBundle, ModelRegistry, ModelRegistryBuilder, SegmentModels};
pub use scorer::{FnScorer, LinearModel, ModelSet, ObjectiveScorer};
