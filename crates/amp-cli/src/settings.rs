//! Environment-driven settings for the recommendation runner.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use amp_types::{config_error, AmpResult, SegmentKey};

pub const MODELS_PATH_VAR: &str = "AMP_MODELS_PATH";
pub const FALLBACK_SEGMENT_VAR: &str = "AMP_FALLBACK_SEGMENT";
pub const PRETTY_VAR: &str = "AMP_PRETTY";
pub const LOG_VAR: &str = "AMP_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// JSON model bundle to load.
    pub models_path: PathBuf,
    /// Overrides the bundle's own fallback segment.
    pub fallback_segment: Option<SegmentKey>,
    pub pretty: bool,
    /// `tracing` filter directive.
    pub log_filter: String,
}

impl Settings {
    pub fn from_env() -> AmpResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup (the process environment in
    /// production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AmpResult<Self> {
        let models_path = lookup(MODELS_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| config_error!("{MODELS_PATH_VAR} must point at a model bundle"))?;

        let fallback_segment = lookup(FALLBACK_SEGMENT_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.parse::<SegmentKey>())
            .transpose()?;

        let pretty = match lookup(PRETTY_VAR).as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(config_error!(
                    "{PRETTY_VAR} must be 1/true or 0/false, got {other:?}"
                ))
            }
        };

        let log_filter = lookup(LOG_VAR).unwrap_or_else(|| "info".to_string());
        EnvFilter::try_new(&log_filter)
            .map_err(|e| config_error!("{LOG_VAR} is not a valid filter ({log_filter:?}): {e}"))?;

        Ok(Self {
            models_path,
            fallback_segment,
            pretty,
            log_filter,
        })
    }
}
