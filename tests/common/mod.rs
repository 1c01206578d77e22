#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use match_sampler::api_client::StatsApi;
use match_sampler::config::{ApiKey, Config, Pacing};
use match_sampler::error::{UpstreamError, UpstreamResult};
use serde_json::{Value, json};

pub fn test_config() -> Config {
    let mut config = Config::with_api_key(ApiKey::new("test-key").unwrap());
    config.pacing = Pacing::none();
    config.run_budget = Duration::from_secs(60);
    config
}

/// Scripted stats API. Unscripted endpoints answer 404.
#[derive(Default)]
pub struct FakeApi {
    pub samples: Option<Value>,
    pub leaderboard: Option<Value>,
    /// player id -> most recent match id
    pub recent_match: HashMap<String, String>,
    pub matches: HashMap<String, Value>,
    pub telemetry: HashMap<String, Value>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn with_samples(mut self, match_ids: &[&str]) -> Self {
        let refs: Vec<Value> = match_ids
            .iter()
            .map(|id| json!({"type": "match", "id": id}))
            .collect();
        self.samples = Some(json!({
            "data": {"type": "sample", "id": "s1", "relationships": {"matches": {"data": refs}}}
        }));
        self
    }

    pub fn with_leaderboard(mut self, player_ids: &[String]) -> Self {
        let refs: Vec<Value> = player_ids
            .iter()
            .map(|id| json!({"type": "player", "id": id}))
            .collect();
        self.leaderboard = Some(json!({
            "data": {"type": "leaderboard", "id": "lb", "relationships": {"players": {"data": refs}}}
        }));
        self
    }

    pub fn with_match(mut self, match_id: &str, document: Value) -> Self {
        self.matches.insert(match_id.to_string(), document);
        self
    }

    pub fn with_telemetry(mut self, url: &str, events: Value) -> Self {
        self.telemetry.insert(url.to_string(), events);
        self
    }

    fn player_json(&self, player_id: &str) -> Value {
        let matches: Vec<Value> = self
            .recent_match
            .get(player_id)
            .map(|m| vec![json!({"type": "match", "id": m})])
            .unwrap_or_default();
        json!({"type": "player", "id": player_id, "relationships": {"matches": {"data": matches}}})
    }
}

fn found(url: String, value: Option<&Value>) -> UpstreamResult<Value> {
    value.cloned().ok_or_else(|| UpstreamError::status(url, 404))
}

#[async_trait]
impl StatsApi for FakeApi {
    async fn samples(&self) -> UpstreamResult<Value> {
        self.log("samples".to_string());
        found("samples".to_string(), self.samples.as_ref())
    }

    async fn leaderboard(&self, season_id: &str, queue: &str) -> UpstreamResult<Value> {
        self.log(format!("leaderboard {} {}", season_id, queue));
        found("leaderboard".to_string(), self.leaderboard.as_ref())
    }

    async fn players(&self, player_ids: &[String]) -> UpstreamResult<Value> {
        self.log(format!("players {}", player_ids.join(",")));
        let data: Vec<Value> = player_ids.iter().map(|id| self.player_json(id)).collect();
        Ok(json!({"data": data}))
    }

    async fn player(&self, player_id: &str) -> UpstreamResult<Value> {
        self.log(format!("player {}", player_id));
        Ok(json!({"data": self.player_json(player_id)}))
    }

    async fn match_detail(&self, match_id: &str) -> UpstreamResult<Value> {
        self.log(format!("match {}", match_id));
        found(format!("matches/{}", match_id), self.matches.get(match_id))
    }

    async fn telemetry(&self, url: &str) -> UpstreamResult<Value> {
        self.log(format!("telemetry {}", url));
        found(url.to_string(), self.telemetry.get(url))
    }
}

pub fn telemetry_url(match_id: &str) -> String {
    format!("https://telemetry.test/{}.json", match_id)
}

/// A two-roster match where roster r1 (p1, p2) won.
pub fn match_document(match_id: &str, with_telemetry: bool) -> Value {
    let assets = match with_telemetry {
        true => json!([{"type": "asset", "id": "asset-1"}]),
        false => json!([]),
    };
    let mut included = vec![
        json!({"type": "roster", "id": "r1", "attributes": {"won": "true"},
               "relationships": {"participants": {"data": [{"type": "participant", "id": "p1"}, {"type": "participant", "id": "p2"}]}}}),
        json!({"type": "roster", "id": "r2", "attributes": {"won": "false"},
               "relationships": {"participants": {"data": [{"type": "participant", "id": "p3"}]}}}),
        json!({"type": "participant", "id": "p1", "attributes": {"stats": {"name": "A", "playerId": "account.a", "kills": 4, "winPlace": 1}}}),
        json!({"type": "participant", "id": "p2", "attributes": {"stats": {"name": "B", "playerId": "account.b", "winPlace": 1}}}),
        json!({"type": "participant", "id": "p3", "attributes": {"stats": {"name": "C", "playerId": "account.c", "winPlace": 2}}}),
    ];
    if with_telemetry {
        included.push(json!({"type": "asset", "id": "asset-1", "attributes": {"URL": telemetry_url(match_id)}}));
    }
    json!({
        "data": {
            "type": "match",
            "id": match_id,
            "attributes": {
                "mapName": "Erangel_Main",
                "gameMode": "squad-fpp",
                "duration": 1834,
                "createdAt": "2024-03-02T10:15:00Z"
            },
            "relationships": {"assets": {"data": assets}}
        },
        "included": included
    })
}

pub fn pickups(weapons: &[&str]) -> Value {
    let mut events = vec![json!({"_T": "LogMatchStart"})];
    for weapon in weapons {
        events.push(json!({"_T": "LogItemPickup", "item": {"itemId": weapon, "category": "Weapon"}}));
        events.push(json!({"_T": "LogItemPickup", "item": {"itemId": "Item_Heal_FirstAid_C", "category": "Use"}}));
    }
    Value::Array(events)
}
