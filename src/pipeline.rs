use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::api_client::StatsApi;
use crate::config::Config;
use crate::dedup::{Admission, DedupGate};
use crate::match_fetcher::{fetch_match, persist_match};
use crate::pacing::{Pacer, RunBudget};
use crate::records::SampleCursor;
use crate::sample_pool::{SampleStrategy, sample_candidates};
use crate::store::{DocPath, DocumentStore};
use crate::telemetry_reader::mine_weapon_pickups;
use crate::weapon_meta::WeaponTally;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Job {
    /// Frequent: random sample, skip known matches, persist new ones.
    CollectMatchData,
    /// Infrequent: leaderboard walk, mine telemetry, rank weapons.
    UpdateWeaponMeta,
}

impl Job {
    pub fn name(self) -> &'static str {
        match self {
            Job::CollectMatchData => "collect-match-data",
            Job::UpdateWeaponMeta => "update-weapon-meta",
        }
    }

    pub fn strategy(self) -> SampleStrategy {
        match self {
            Job::CollectMatchData => SampleStrategy::RandomSample,
            Job::UpdateWeaponMeta => SampleStrategy::LeaderboardWalk,
        }
    }

    fn mines_telemetry(self) -> bool {
        matches!(self, Job::UpdateWeaponMeta)
    }
}

/// Outcome counts of one run. Runs never fail past their boundary; this is
/// what gets reported instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub candidates: usize,
    pub failed_lookups: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub deferred: usize,
    pub participants_written: usize,
    pub participants_skipped: usize,
    pub participants_failed: usize,
    pub telemetry_failed: usize,
    pub weapon_observations: u64,
    pub weapons_ranked: usize,
    pub upstream_calls: usize,
}

enum MatchOutcome {
    Processed,
    Skipped,
    Failed,
}

pub struct Pipeline<'a, A: StatsApi + ?Sized, S: DocumentStore + ?Sized> {
    api: &'a A,
    store: &'a S,
    config: &'a Config,
    pacer: Pacer,
    tally: WeaponTally,
    report: RunReport,
}

impl<'a, A: StatsApi + ?Sized, S: DocumentStore + ?Sized> Pipeline<'a, A, S> {
    pub fn new(api: &'a A, store: &'a S, config: &'a Config) -> Self {
        Pipeline {
            api,
            store,
            config,
            pacer: Pacer::new(config.pacing),
            tally: WeaponTally::new(),
            report: RunReport::default(),
        }
    }

    pub async fn run(mut self, job: Job) -> RunReport {
        let budget = RunBudget::start(self.config.run_budget);
        info!(job = job.name(), "run started");

        let sample =
            sample_candidates(self.api, self.config, &mut self.pacer, job.strategy()).await;
        self.report.candidates = sample.match_ids.len();
        self.report.failed_lookups = sample.failed_lookups;
        self.write_sample_cursor(&sample.match_ids).await;

        for (i, match_id) in sample.match_ids.iter().enumerate() {
            if budget.exhausted() {
                self.report.deferred = sample.match_ids.len() - i;
                warn!(
                    elapsed_s = budget.elapsed().as_secs(),
                    deferred = self.report.deferred,
                    "run budget exhausted, deferring remaining matches"
                );
                break;
            }
            match self.process_match(job, match_id).await {
                MatchOutcome::Processed => self.report.processed += 1,
                MatchOutcome::Skipped => self.report.skipped += 1,
                MatchOutcome::Failed => self.report.failed += 1,
            }
        }

        if job.mines_telemetry() {
            self.write_weapon_meta().await;
        }

        self.report.upstream_calls = self.pacer.calls();
        info!(job = job.name(), report = ?self.report, "run finished");
        self.report
    }

    #[instrument(skip(self, job))]
    async fn process_match(&mut self, job: Job, match_id: &str) -> MatchOutcome {
        let admission = match DedupGate::new(self.store).check(match_id).await {
            Ok(admission) => admission,
            Err(e) => {
                warn!(error = %e, "dedup lookup failed");
                return MatchOutcome::Failed;
            }
        };

        let telemetry_url = match (admission, job.mines_telemetry()) {
            (Admission::Known(_), false) => return MatchOutcome::Skipped,
            // Reuse the stored asset URL rather than refetching match detail.
            (Admission::Known(Some(record)), true) => record.telemetry_url,
            (Admission::Known(None), true) => {
                warn!("stored match record is unreadable, skipping telemetry");
                return MatchOutcome::Skipped;
            }
            (Admission::New, _) => match self.fetch_and_persist(match_id).await {
                Some(url) => url,
                None => return MatchOutcome::Failed,
            },
        };

        if job.mines_telemetry() {
            match mine_weapon_pickups(
                self.api,
                &mut self.pacer,
                match_id,
                telemetry_url.as_deref(),
            )
            .await
            {
                Ok(pickups) => {
                    self.tally.extend(&pickups);
                    self.report.weapon_observations += pickups.len() as u64;
                }
                Err(e) => {
                    warn!(error = %e, "telemetry download failed");
                    self.report.telemetry_failed += 1;
                }
            }
        }
        MatchOutcome::Processed
    }

    /// Returns the match's telemetry URL slot, or `None` if the match could
    /// not be fetched or its record could not be written.
    async fn fetch_and_persist(&mut self, match_id: &str) -> Option<Option<String>> {
        let fetched = match fetch_match(self.api, &mut self.pacer, match_id).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(error = %e, rate_limited = e.is_rate_limited(), "match fetch failed");
                return None;
            }
        };
        self.report.participants_skipped += fetched.skipped_participants;

        match persist_match(self.store, &fetched).await {
            Ok(outcome) => {
                self.report.participants_written += outcome.participants_written;
                self.report.participants_failed += outcome.participants_failed;
                Some(fetched.record.telemetry_url)
            }
            Err(e) => {
                warn!(error = %e, "match write failed");
                None
            }
        }
    }

    async fn write_sample_cursor(&self, match_ids: &[String]) {
        if match_ids.is_empty() {
            return;
        }
        let cursor = SampleCursor {
            updated_at: Utc::now(),
            match_ids: match_ids.to_vec(),
        };
        let written = match serde_json::to_value(&cursor) {
            Ok(document) => self.store.set(&DocPath::sample_cursor(), document).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = written {
            warn!(error = %e, "sample cursor write failed");
        }
    }

    async fn write_weapon_meta(&mut self) {
        info!(
            observations = self.tally.observations(),
            distinct = self.tally.distinct_weapons(),
            "weapon tally complete"
        );
        let Some(aggregate) = self.tally.aggregate(self.config.top_weapons, Utc::now()) else {
            warn!("no weapon pickups observed, keeping previous weapon meta");
            return;
        };
        let ranked = aggregate.top_weapons.len();
        let written = match serde_json::to_value(&aggregate) {
            Ok(document) => self.store.set(&DocPath::weapon_meta(), document).await,
            Err(e) => Err(e.into()),
        };
        match written {
            Ok(()) => {
                self.report.weapons_ranked = ranked;
                info!(ranked, "weapon meta updated");
            }
            Err(e) => warn!(error = %e, "weapon meta write failed"),
        }
    }
}

pub async fn collect_match_data<A, S>(api: &A, store: &S, config: &Config) -> RunReport
where
    A: StatsApi + ?Sized,
    S: DocumentStore + ?Sized,
{
    Pipeline::new(api, store, config)
        .run(Job::CollectMatchData)
        .await
}

pub async fn update_weapon_meta<A, S>(api: &A, store: &S, config: &Config) -> RunReport
where
    A: StatsApi + ?Sized,
    S: DocumentStore + ?Sized,
{
    Pipeline::new(api, store, config)
        .run(Job::UpdateWeaponMeta)
        .await
}
