use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::AmpError;
use crate::validation_error;

/// Identifies the audience segment a set of fitted models was trained for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentKey {
    pub platform: String,
    pub audience: String,
}

impl SegmentKey {
    pub fn new(platform: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            audience: audience.into(),
        }
    }
}

impl std::fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.platform, self.audience)
    }
}

impl FromStr for SegmentKey {
    type Err = AmpError;

    /// Parses `platform/audience`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((platform, audience))
                if !platform.trim().is_empty()
                    && !audience.trim().is_empty()
                    && !audience.contains('/') =>
            {
                Ok(Self::new(platform.trim(), audience.trim()))
            }
            _ => Err(validation_error!(
                "segment must look like platform/audience, got {s:?}"
            )),
        }
    }
}
