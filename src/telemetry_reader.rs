use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::api_client::StatsApi;
use crate::error::UpstreamResult;
use crate::pacing::{CallKind, Pacer};

pub const WEAPON_CATEGORY: &str = "Weapon";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub category: String,
}

/// The slice of the telemetry format this crate reads. Every other
/// discriminator lands in `Other`.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "_T")]
pub enum TelemetryEvent {
    #[serde(rename = "LogItemPickup")]
    ItemPickup {
        #[serde(default)]
        item: Option<Item>,
    },
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeaponPickupEvent {
    pub match_id: String,
    pub weapon_id: String,
}

/// Filters a raw event array down to weapon pickups. Entries that are not
/// objects, lack `_T`, or lack `item` are skipped.
pub fn weapon_pickups(match_id: &str, events: &Value) -> Vec<WeaponPickupEvent> {
    let Some(events) = events.as_array() else {
        debug!(match_id, "telemetry payload is not an event array");
        return Vec::new();
    };
    events
        .iter()
        .filter_map(|raw| TelemetryEvent::deserialize(raw).ok())
        .filter_map(|event| match event {
            TelemetryEvent::ItemPickup { item: Some(item) }
                if item.category == WEAPON_CATEGORY && !item.item_id.is_empty() =>
            {
                Some(WeaponPickupEvent {
                    match_id: match_id.to_string(),
                    weapon_id: item.item_id,
                })
            }
            _ => None,
        })
        .collect()
}

/// Downloads and filters one match's telemetry. No URL means no events.
pub async fn mine_weapon_pickups<A: StatsApi + ?Sized>(
    api: &A,
    pacer: &mut Pacer,
    match_id: &str,
    telemetry_url: Option<&str>,
) -> UpstreamResult<Vec<WeaponPickupEvent>> {
    let Some(url) = telemetry_url else {
        debug!(match_id, "match has no telemetry asset");
        return Ok(Vec::new());
    };
    let result = api.telemetry(url).await;
    pacer.after_call(CallKind::Telemetry).await;
    let events = result?;
    let pickups = weapon_pickups(match_id, &events);
    debug!(match_id, pickups = pickups.len(), "mined telemetry");
    Ok(pickups)
}
