use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api_client::StatsApi;
use crate::error::{StoreResult, UpstreamError, UpstreamResult};
use crate::pacing::{CallKind, Pacer};
use crate::payload::{
    UNKNOWN, attributes, f64_or_zero, flag, included_of_type, relationship_ids, resource_id,
    str_or, string_or_empty, u64_or_zero,
};
use crate::records::{MatchRecord, MovementDistances, ParticipantRecord};
use crate::store::{DocPath, DocumentStore};

#[derive(Debug, Clone)]
pub struct FetchedMatch {
    pub record: MatchRecord,
    pub participants: Vec<ParticipantRecord>,
    /// Participants dropped for lacking a player id.
    pub skipped_participants: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PersistOutcome {
    pub participants_written: usize,
    pub participants_failed: usize,
}

pub async fn fetch_match<A: StatsApi + ?Sized>(
    api: &A,
    pacer: &mut Pacer,
    match_id: &str,
) -> UpstreamResult<FetchedMatch> {
    let result = api.match_detail(match_id).await;
    pacer.after_call(CallKind::MatchDetail).await;
    let document = result?;
    if document.get("data").is_none() {
        return Err(UpstreamError::decode(
            format!("matches/{}", match_id),
            "missing data resource",
        ));
    }
    Ok(parse_match(match_id, &document))
}

/// Projects a match-detail document into records. Never fails on shape.
pub fn parse_match(match_id: &str, document: &Value) -> FetchedMatch {
    let data = document.get("data").unwrap_or(&Value::Null);
    let attrs = attributes(data);

    let mut names_by_participant: HashMap<&str, &str> = HashMap::new();
    let mut participants = Vec::new();
    let mut skipped_participants = 0;
    for participant in included_of_type(document, "participant") {
        let stats = attributes(participant)
            .get("stats")
            .unwrap_or(&Value::Null);
        if let (Some(id), Some(name)) = (
            resource_id(participant),
            stats.get("name").and_then(Value::as_str),
        ) {
            names_by_participant.insert(id, name);
        }

        let record = participant_record(stats);
        if record.player_id.is_empty() {
            debug!(match_id, participant = ?resource_id(participant), "participant has no player id");
            skipped_participants += 1;
            continue;
        }
        participants.push(record);
    }

    let rosters: Vec<&Value> = included_of_type(document, "roster").collect();
    let winning_team: Vec<String> = rosters
        .iter()
        .find(|roster| flag(attributes(roster), "won"))
        .map(|roster| {
            relationship_ids(roster, "participants")
                .into_iter()
                .filter_map(|id| names_by_participant.get(id))
                .map(|name| name.to_string())
                .collect()
        })
        .unwrap_or_default();

    let record = MatchRecord {
        match_id: match_id.to_string(),
        map_name: str_or(attrs, "mapName", UNKNOWN).to_string(),
        game_mode: str_or(attrs, "gameMode", UNKNOWN).to_string(),
        duration: u64_or_zero(attrs, "duration"),
        is_ranked: flag(attrs, "isRanked"),
        created_at: created_at(attrs),
        total_teams: rosters.len(),
        winning_team,
        telemetry_url: telemetry_url(document),
    };

    FetchedMatch {
        record,
        participants,
        skipped_participants,
    }
}

fn created_at(attrs: &Value) -> DateTime<Utc> {
    attrs
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn participant_record(stats: &Value) -> ParticipantRecord {
    ParticipantRecord {
        player_id: string_or_empty(stats, "playerId"),
        name: string_or_empty(stats, "name"),
        win_place: u64_or_zero(stats, "winPlace"),
        kills: u64_or_zero(stats, "kills"),
        damage_dealt: f64_or_zero(stats, "damageDealt"),
        assists: u64_or_zero(stats, "assists"),
        knockdowns: u64_or_zero(stats, "DBNOs"),
        headshot_kills: u64_or_zero(stats, "headshotKills"),
        longest_kill: f64_or_zero(stats, "longestKill"),
        time_survived: f64_or_zero(stats, "timeSurvived"),
        revives: u64_or_zero(stats, "revives"),
        heals: u64_or_zero(stats, "heals"),
        boosts: u64_or_zero(stats, "boosts"),
        distances: MovementDistances {
            walk: f64_or_zero(stats, "walkDistance"),
            ride: f64_or_zero(stats, "rideDistance"),
            swim: f64_or_zero(stats, "swimDistance"),
        },
        team_kills: u64_or_zero(stats, "teamKills"),
        vehicle_destroys: u64_or_zero(stats, "vehicleDestroys"),
    }
}

/// URL of the asset referenced by `data.relationships.assets`, if included.
pub fn telemetry_url(document: &Value) -> Option<String> {
    let data = document.get("data")?;
    let asset_ids = relationship_ids(data, "assets");
    included_of_type(document, "asset")
        .find(|asset| resource_id(asset).is_some_and(|id| asset_ids.contains(&id)))
        .and_then(|asset| attributes(asset).get("URL"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// Writes the match, then its participants. A failed match write returns
/// the error and writes no participants; a failed participant write is
/// logged and counted, and earlier writes stay in place.
pub async fn persist_match<S: DocumentStore + ?Sized>(
    store: &S,
    fetched: &FetchedMatch,
) -> StoreResult<PersistOutcome> {
    let match_id = &fetched.record.match_id;
    let path = DocPath::match_doc(match_id)?;
    store
        .set(&path, serde_json::to_value(&fetched.record)?)
        .await?;

    let mut outcome = PersistOutcome::default();
    for participant in &fetched.participants {
        let written = match DocPath::participant(match_id, &participant.player_id) {
            Ok(path) => match serde_json::to_value(participant) {
                Ok(document) => store.set(&path, document).await,
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => outcome.participants_written += 1,
            Err(e) => {
                warn!(match_id, player_id = %participant.player_id, error = %e, "participant write failed");
                outcome.participants_failed += 1;
            }
        }
    }
    Ok(outcome)
}
