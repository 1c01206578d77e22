use std::process::ExitCode;

use tracing::error;

use crate::api_client::PubgClient;
use crate::config::Config;
use crate::pipeline::{Job, Pipeline, RunReport};
use crate::store::FileStore;

/// Scheduled entry point: load the credential, wire the HTTP client and the
/// file store, run `job`. Fails only when the run cannot start at all.
pub async fn run_scheduled(job: Job) -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(job = job.name(), error = %e, "configuration error, aborting run");
            return ExitCode::FAILURE;
        }
    };
    match run_with_config(job, &config).await {
        Some(_) => ExitCode::SUCCESS,
        None => ExitCode::FAILURE,
    }
}

pub async fn run_with_config(job: Job, config: &Config) -> Option<RunReport> {
    let api = match PubgClient::new(config) {
        Ok(api) => api,
        Err(e) => {
            error!(job = job.name(), error = %e, "could not build http client");
            return None;
        }
    };
    let store = FileStore::new(&config.store_root);
    Some(Pipeline::new(&api, &store, config).run(job).await)
}
