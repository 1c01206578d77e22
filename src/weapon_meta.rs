use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::records::{WeaponMetaAggregate, WeaponRank};
use crate::telemetry_reader::WeaponPickupEvent;

/// Pickup counts for one run, remembering the order weapons first appeared.
#[derive(Debug, Default)]
pub struct WeaponTally {
    index: HashMap<String, usize>,
    counts: Vec<(String, u64)>,
    observations: u64,
}

impl WeaponTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, weapon_id: &str) {
        self.observations += 1;
        match self.index.get(weapon_id) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.index.insert(weapon_id.to_string(), self.counts.len());
                self.counts.push((weapon_id.to_string(), 1));
            }
        }
    }

    pub fn extend<'a>(&mut self, events: impl IntoIterator<Item = &'a WeaponPickupEvent>) {
        for event in events {
            self.record(&event.weapon_id);
        }
    }

    pub fn observations(&self) -> u64 {
        self.observations
    }

    pub fn distinct_weapons(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, weapon_id: &str) -> u64 {
        self.index
            .get(weapon_id)
            .map(|&slot| self.counts[slot].1)
            .unwrap_or(0)
    }

    /// Highest counts first; equal counts keep first-seen order.
    pub fn top(&self, n: usize) -> Vec<WeaponRank> {
        let mut ranked: Vec<&(String, u64)> = self.counts.iter().collect();
        // sort_by is stable, so ties stay in insertion order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(n)
            .enumerate()
            .map(|(i, (weapon_id, pick_count))| WeaponRank {
                rank: i + 1,
                weapon_id: weapon_id.clone(),
                pick_count: *pick_count,
            })
            .collect()
    }

    /// `None` when nothing was observed; an empty run must not replace the
    /// stored aggregate.
    pub fn aggregate(&self, n: usize, updated_at: DateTime<Utc>) -> Option<WeaponMetaAggregate> {
        match self.observations {
            0 => None,
            _ => Some(WeaponMetaAggregate {
                updated_at,
                top_weapons: self.top(n),
            }),
        }
    }
}
