use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed match, as persisted at `matches/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub match_id: String,
    pub map_name: String,
    pub game_mode: String,
    pub duration: u64,
    pub is_ranked: bool,
    pub created_at: DateTime<Utc>,
    pub total_teams: usize,
    pub winning_team: Vec<String>,
    #[serde(default)]
    pub telemetry_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementDistances {
    pub walk: f64,
    pub ride: f64,
    pub swim: f64,
}

/// Per-player results, as persisted at `matches/{id}/participants/{playerId}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    pub player_id: String,
    pub name: String,
    pub win_place: u64,
    pub kills: u64,
    pub damage_dealt: f64,
    pub assists: u64,
    pub knockdowns: u64,
    pub headshot_kills: u64,
    pub longest_kill: f64,
    pub time_survived: f64,
    pub revives: u64,
    pub heals: u64,
    pub boosts: u64,
    pub distances: MovementDistances,
    pub team_kills: u64,
    pub vehicle_destroys: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponRank {
    pub rank: usize,
    pub weapon_id: String,
    pub pick_count: u64,
}

/// Singleton at `global_stats/weapon_meta`; replaced wholesale each run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponMetaAggregate {
    pub updated_at: DateTime<Utc>,
    pub top_weapons: Vec<WeaponRank>,
}

/// Last sampled batch, kept for downstream readers only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleCursor {
    pub updated_at: DateTime<Utc>,
    pub match_ids: Vec<String>,
}
