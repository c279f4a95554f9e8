use anyhow::Context;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use amp_cli::settings::LOG_VAR;
use amp_cli::Settings;

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("loading settings")?;

    let filter = EnvFilter::try_new(&settings.log_filter)
        .with_context(|| format!("invalid {LOG_VAR} directive {:?}", settings.log_filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let request_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: amp-recommend <request.json>")?;

    info!("Amplify recommender reading {}", request_path.display());

    match amp_cli::run(&settings, &request_path) {
        Ok(recommendation) => {
            println!("{}", amp_cli::render(&recommendation, settings.pretty)?);
            Ok(())
        }
        Err(e) => {
            error!("Recommendation failed: {e:#}");
            Err(e)
        }
    }
}
