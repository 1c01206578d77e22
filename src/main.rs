use std::process::ExitCode;

use match_sampler::jobs::run_scheduled;
use match_sampler::logging::init_logging;
use match_sampler::pipeline::Job;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    for job in [Job::CollectMatchData, Job::UpdateWeaponMeta] {
        if run_scheduled(job).await == ExitCode::FAILURE {
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
