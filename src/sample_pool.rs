use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api_client::StatsApi;
use crate::config::Config;
use crate::pacing::{CallKind, Pacer};
use crate::payload::{data_items, relationship_ids};

/// Insertion-ordered set of match ids that stops accepting at `capacity`.
#[derive(Debug, Clone)]
pub struct BoundedMatchSet {
    capacity: usize,
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl BoundedMatchSet {
    pub fn new(capacity: usize) -> BoundedMatchSet {
        BoundedMatchSet {
            capacity,
            seen: HashSet::new(),
            ordered: Vec::new(),
        }
    }

    /// Returns true only when `match_id` was new and there was room for it.
    pub fn insert(&mut self, match_id: &str) -> bool {
        if self.is_full() || match_id.is_empty() || self.seen.contains(match_id) {
            return false;
        }
        self.seen.insert(match_id.to_string());
        self.ordered.push(match_id.to_string());
        true
    }

    pub fn is_full(&self) -> bool {
        self.ordered.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleStrategy {
    /// One call to the samples endpoint.
    RandomSample,
    /// Leaderboard, then each sampled player's most recent match.
    LeaderboardWalk,
}

#[derive(Debug, Default)]
pub struct SampleOutcome {
    pub match_ids: Vec<String>,
    pub lookups: usize,
    pub failed_lookups: usize,
}

pub async fn sample_candidates<A: StatsApi + ?Sized>(
    api: &A,
    config: &Config,
    pacer: &mut Pacer,
    strategy: SampleStrategy,
) -> SampleOutcome {
    let outcome = match strategy {
        SampleStrategy::RandomSample => random_sample(api, config, pacer).await,
        SampleStrategy::LeaderboardWalk => leaderboard_walk(api, config, pacer).await,
    };
    info!(
        ?strategy,
        candidates = outcome.match_ids.len(),
        lookups = outcome.lookups,
        failed_lookups = outcome.failed_lookups,
        "sampled candidate matches"
    );
    outcome
}

async fn random_sample<A: StatsApi + ?Sized>(
    api: &A,
    config: &Config,
    pacer: &mut Pacer,
) -> SampleOutcome {
    let mut outcome = SampleOutcome::default();
    let result = api.samples().await;
    pacer.after_call(CallKind::Lookup).await;
    outcome.lookups += 1;

    let mut candidates = BoundedMatchSet::new(config.candidate_cap);
    match result {
        Ok(document) => {
            for item in data_items(&document) {
                for match_id in relationship_ids(item, "matches") {
                    candidates.insert(match_id);
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "sample lookup failed");
            outcome.failed_lookups += 1;
        }
    }
    outcome.match_ids = candidates.into_vec();
    outcome
}

pub fn leaderboard_player_ids(document: &Value) -> Vec<String> {
    data_items(document)
        .into_iter()
        .flat_map(|board| relationship_ids(board, "players"))
        .map(str::to_string)
        .collect()
}

/// Most recent match per player in a players response; upstream lists a
/// player's matches newest first.
pub fn most_recent_matches(document: &Value) -> Vec<&str> {
    data_items(document)
        .into_iter()
        .filter_map(|player| relationship_ids(player, "matches").first().copied())
        .collect()
}

async fn leaderboard_walk<A: StatsApi + ?Sized>(
    api: &A,
    config: &Config,
    pacer: &mut Pacer,
) -> SampleOutcome {
    let mut outcome = SampleOutcome::default();
    let result = api.leaderboard(&config.season_id, &config.queue).await;
    pacer.after_call(CallKind::Lookup).await;
    outcome.lookups += 1;

    let ranked_players = match result {
        Ok(document) => leaderboard_player_ids(&document),
        Err(e) => {
            warn!(error = %e, "leaderboard lookup failed");
            outcome.failed_lookups += 1;
            return outcome;
        }
    };
    let sample: Vec<String> = ranked_players
        .into_iter()
        .skip(config.leaderboard_offset)
        .take(config.player_sample_count)
        .collect();
    debug!(players = sample.len(), "sampled ranked players");

    let capacity = config.target_unique_matches.min(config.candidate_cap);
    let mut candidates = BoundedMatchSet::new(capacity);
    for batch in sample.chunks(config.player_batch_size.max(1)) {
        if candidates.is_full() {
            break;
        }
        let result = match batch {
            [single] => api.player(single).await,
            _ => api.players(batch).await,
        };
        pacer.after_call(CallKind::Lookup).await;
        outcome.lookups += 1;

        match result {
            Ok(document) => {
                for match_id in most_recent_matches(&document) {
                    candidates.insert(match_id);
                }
            }
            Err(e) => {
                warn!(error = %e, batch = batch.len(), "player lookup failed");
                outcome.failed_lookups += 1;
            }
        }
    }
    outcome.match_ids = candidates.into_vec();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bounded_set_collapses_duplicates_and_stops_when_full() {
        let mut set = BoundedMatchSet::new(2);
        assert!(set.insert("m1"));
        assert!(!set.insert("m1"));
        assert!(!set.insert(""));
        assert!(!set.is_full());
        assert!(set.insert("m2"));
        assert!(set.is_full());
        assert!(!set.insert("m3"));
        assert_eq!(set.into_vec(), vec!["m1", "m2"]);
    }

    #[test]
    fn leaderboard_ids_keep_rank_order() {
        let document = json!({
            "data": {
                "type": "leaderboard",
                "relationships": {"players": {"data": [
                    {"type": "player", "id": "account.a"},
                    {"type": "player", "id": "account.b"}
                ]}}
            }
        });
        assert_eq!(leaderboard_player_ids(&document), vec!["account.a", "account.b"]);
    }

    #[test]
    fn players_without_matches_contribute_nothing() {
        let document = json!({"data": [
            {"id": "a", "relationships": {"matches": {"data": [{"id": "m9"}, {"id": "m1"}]}}},
            {"id": "b", "relationships": {"matches": {"data": []}}},
            {"id": "c"}
        ]});
        assert_eq!(most_recent_matches(&document), vec!["m9"]);
    }
}
