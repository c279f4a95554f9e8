// Amplify recommendation runner

pub mod settings;

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use amp_optimizer::{
    ModelBundle, ModelRegistry, ParameterDomain, Recommendation, RecommendationRequest,
    Recommender,
};

pub use settings::Settings;

/// Builds the registry described by `settings`, honouring a fallback override.
pub fn load_registry(settings: &Settings) -> anyhow::Result<ModelRegistry> {
    let mut bundle = ModelBundle::load(&settings.models_path).with_context(|| {
        format!("loading model bundle {}", settings.models_path.display())
    })?;
    if let Some(fallback) = &settings.fallback_segment {
        bundle.fallback = Some(fallback.to_string());
    }
    Ok(ModelRegistry::from_bundle(bundle)?)
}

pub fn read_request(path: &Path) -> anyhow::Result<RecommendationRequest> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading request {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing request {}", path.display()))
}

/// Runs one recommendation against the stock content domain.
pub fn run(settings: &Settings, request_path: &Path) -> anyhow::Result<Recommendation> {
    let registry = Arc::new(load_registry(settings)?);
    info!("Loaded models for {} segments", registry.len());

    let request = read_request(request_path)?;
    let recommender = Recommender::new(registry, ParameterDomain::content_defaults());
    let recommendation = recommender
        .recommend(&request)
        .with_context(|| format!("recommending for segment {}", request.segment))?;
    Ok(recommendation)
}

pub fn render(recommendation: &Recommendation, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(recommendation)?
    } else {
        serde_json::to_string(recommendation)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use amp_types::{ParameterValue, SegmentKey};
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    const BUNDLE: &str = r#"{
        "segments": [
            {
                "platform": "facebook",
                "audience": "parents",
                "models": {
                    "conversion_rate": {
                        "intercept": 0.01,
                        "categorical": {"cta_type": {"sign_up": 0.015, "shop_now": 0.01}}
                    }
                }
            }
        ]
    }"#;

    fn settings(models_path: PathBuf, fallback: Option<SegmentKey>) -> Settings {
        Settings {
            models_path,
            fallback_segment: fallback,
            pretty: false,
            log_filter: "info".to_string(),
        }
    }

    #[test]
    fn run_produces_recommendation() {
        let dir = tempdir().unwrap();
        let models = write_file(&dir, "models.json", BUNDLE);
        let request = write_file(
            &dir,
            "request.json",
            r#"{
                "segment": {"platform": "facebook", "audience": "parents"},
                "base_configuration": {"cta_type": "learn_more", "num_hashtags": 1},
                "dimensions": ["cta_type"],
                "goal": "conversion"
            }"#,
        );

        let rec = run(&settings(models, None), &request).unwrap();
        assert_eq!(
            rec.recommended_configuration.get("cta_type"),
            Some(&ParameterValue::from("sign_up"))
        );

        let json = render(&rec, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["recommended_configuration"]["cta_type"], "sign_up");
        assert_eq!(value["segment"]["platform"], "facebook");
    }

    #[test]
    fn fallback_override_serves_unknown_segments() {
        let dir = tempdir().unwrap();
        let models = write_file(&dir, "models.json", BUNDLE);
        let request = write_file(
            &dir,
            "request.json",
            r#"{
                "segment": {"platform": "tiktok", "audience": "gen_z"},
                "base_configuration": {"cta_type": "learn_more"},
                "dimensions": ["cta_type"],
                "weights": {"conversion_rate": 1.0}
            }"#,
        );

        assert!(run(&settings(models.clone(), None), &request).is_err());

        let fallback = Some(SegmentKey::new("facebook", "parents"));
        let rec = run(&settings(models, fallback), &request).unwrap();
        assert_eq!(rec.segment, SegmentKey::new("tiktok", "gen_z"));
        assert!(rec.improvement() > 0.0);
    }

    #[test]
    fn missing_bundle_reports_path() {
        let missing = settings(PathBuf::from("/no/such/bundle.json"), None);
        let err = load_registry(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("/no/such/bundle.json"));
    }

    #[test]
    fn duplicate_segments_in_bundle_are_rejected() {
        let dir = tempdir().unwrap();
        let segment = r#"{"platform": "x", "audience": "y", "models": {}}"#;
        let bundle = format!(r#"{{"segments": [{segment}, {segment}]}}"#);
        let models = write_file(&dir, "models.json", &bundle);

        let err = load_registry(&settings(models, None)).unwrap_err();
        assert!(format!("{err:#}").contains("more than once"));
    }

    #[test]
    fn temp_files_are_removed_with_their_directory() {
        let dir = tempdir().unwrap();
        let models = write_file(&dir, "models.json", BUNDLE);
        assert!(load_registry(&settings(models.clone(), None)).is_ok());

        dir.close().unwrap();
        assert!(!models.exists());
    }
}
