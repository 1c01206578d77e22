use std::process::ExitCode;

use match_sampler::jobs::run_scheduled;
use match_sampler::logging::init_logging;
use match_sampler::pipeline::Job;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    run_scheduled(Job::CollectMatchData).await
}
