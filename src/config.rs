use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const API_KEY_ENV: &str = "PUBG_API_KEY";
pub const API_BASE_URL: &str = "https://api.pubg.com";
pub const PLATFORM: &str = "pc-kakao";
pub const SEASON_ID: &str = "division.bro.official.pc-2018-37";
pub const QUEUE: &str = "squad-fpp";

const LEADERBOARD_OFFSET: usize = 50;
const PLAYER_SAMPLE_COUNT: usize = 100;
const PLAYER_BATCH_SIZE: usize = 10;
const TARGET_UNIQUE_MATCHES: usize = 10;
const CANDIDATE_CAP: usize = 15;
const TOP_WEAPONS: usize = 10;

const LOOKUP_DELAY: Duration = Duration::from_millis(6100);
const MATCH_DELAY: Duration = Duration::from_millis(6100);
const TELEMETRY_DELAY: Duration = Duration::from_millis(1000);

// Scheduler kills the run at 540s; stop picking up new matches well before that.
const RUN_TIMEOUT: Duration = Duration::from_secs(540);
const RUN_SAFETY_MARGIN: Duration = Duration::from_secs(30);

const DEFAULT_STORE_ROOT: &str = "data";

/// Bearer credential for the stats API. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<ApiKey, ConfigError> {
        let key = key.into();
        match key.trim().is_empty() {
            true => Err(ConfigError::MissingCredential(API_KEY_ENV)),
            false => Ok(ApiKey(key.trim().to_string())),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Delay inserted after each upstream call, by call type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    pub lookup: Duration,
    pub match_detail: Duration,
    pub telemetry: Duration,
}

impl Pacing {
    pub const fn none() -> Pacing {
        Pacing {
            lookup: Duration::ZERO,
            match_detail: Duration::ZERO,
            telemetry: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            lookup: LOOKUP_DELAY,
            match_detail: MATCH_DELAY,
            telemetry: TELEMETRY_DELAY,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: ApiKey,
    pub api_base_url: String,
    pub platform: String,
    pub season_id: String,
    pub queue: String,
    pub leaderboard_offset: usize,
    pub player_sample_count: usize,
    pub player_batch_size: usize,
    pub target_unique_matches: usize,
    pub candidate_cap: usize,
    pub top_weapons: usize,
    pub pacing: Pacing,
    pub run_budget: Duration,
    pub store_root: PathBuf,
}

impl Config {
    pub fn with_api_key(api_key: ApiKey) -> Config {
        Config {
            api_key,
            api_base_url: API_BASE_URL.to_string(),
            platform: PLATFORM.to_string(),
            season_id: SEASON_ID.to_string(),
            queue: QUEUE.to_string(),
            leaderboard_offset: LEADERBOARD_OFFSET,
            player_sample_count: PLAYER_SAMPLE_COUNT,
            player_batch_size: PLAYER_BATCH_SIZE,
            target_unique_matches: TARGET_UNIQUE_MATCHES,
            candidate_cap: CANDIDATE_CAP,
            top_weapons: TOP_WEAPONS,
            pacing: Pacing::default(),
            run_budget: RUN_TIMEOUT - RUN_SAFETY_MARGIN,
            store_root: PathBuf::from(DEFAULT_STORE_ROOT),
        }
    }

    pub fn from_env() -> Result<Config, ConfigError> {
        parse_config(std::env::var(API_KEY_ENV).ok())
    }
}

pub fn parse_config(api_key: Option<String>) -> Result<Config, ConfigError> {
    let api_key = match api_key {
        Some(key) => ApiKey::new(key)?,
        None => return Err(ConfigError::MissingCredential(API_KEY_ENV)),
    };
    Ok(Config::with_api_key(api_key))
}
