use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::config::{ApiKey, Config};
use crate::error::{UpstreamError, UpstreamResult};

const JSON_API: &str = "application/vnd.api+json";

/// Read side of the game-stats API. Payloads stay weakly typed; callers
/// project the fields they need through `payload` accessors.
#[async_trait]
pub trait StatsApi: Send + Sync {
    async fn samples(&self) -> UpstreamResult<Value>;

    async fn leaderboard(&self, season_id: &str, queue: &str) -> UpstreamResult<Value>;

    /// Batch lookup via `filter[playerIds]`.
    async fn players(&self, player_ids: &[String]) -> UpstreamResult<Value>;

    async fn player(&self, player_id: &str) -> UpstreamResult<Value>;

    async fn match_detail(&self, match_id: &str) -> UpstreamResult<Value>;

    /// Telemetry lives on the asset CDN, not under the API shard.
    async fn telemetry(&self, url: &str) -> UpstreamResult<Value>;
}

pub struct PubgClient {
    http: Client,
    api_key: ApiKey,
    shard_url: String,
}

impl PubgClient {
    pub fn new(config: &Config) -> UpstreamResult<PubgClient> {
        let http = Client::builder()
            .gzip(true)
            .build()
            .map_err(|source| UpstreamError::Transport {
                url: config.api_base_url.clone(),
                source,
            })?;
        Ok(PubgClient {
            http,
            api_key: config.api_key.clone(),
            shard_url: format!(
                "{}/shards/{}",
                config.api_base_url.trim_end_matches('/'),
                config.platform
            ),
        })
    }

    fn api_get(&self, url: &str) -> RequestBuilder {
        self.http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key.expose()))
            .header(ACCEPT, JSON_API)
    }

    async fn send(url: &str, request: RequestBuilder) -> UpstreamResult<Value> {
        let response = request.send().await.map_err(|source| UpstreamError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::status(url, status.as_u16()));
        }
        let body = response.bytes().await.map_err(|source| UpstreamError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::decode(url, e.to_string()))
    }

    async fn get_api(&self, url: String) -> UpstreamResult<Value> {
        Self::send(&url, self.api_get(&url)).await
    }
}

#[async_trait]
impl StatsApi for PubgClient {
    async fn samples(&self) -> UpstreamResult<Value> {
        self.get_api(format!("{}/samples", self.shard_url)).await
    }

    async fn leaderboard(&self, season_id: &str, queue: &str) -> UpstreamResult<Value> {
        self.get_api(format!("{}/leaderboards/{}/{}", self.shard_url, season_id, queue))
            .await
    }

    async fn players(&self, player_ids: &[String]) -> UpstreamResult<Value> {
        self.get_api(format!(
            "{}/players?filter[playerIds]={}",
            self.shard_url,
            player_ids.join(",")
        ))
        .await
    }

    async fn player(&self, player_id: &str) -> UpstreamResult<Value> {
        self.get_api(format!("{}/players/{}", self.shard_url, player_id))
            .await
    }

    async fn match_detail(&self, match_id: &str) -> UpstreamResult<Value> {
        self.get_api(format!("{}/matches/{}", self.shard_url, match_id))
            .await
    }

    async fn telemetry(&self, url: &str) -> UpstreamResult<Value> {
        Self::send(url, self.http.get(url).header(ACCEPT, "application/json")).await
    }
}
