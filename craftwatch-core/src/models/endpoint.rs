// File: src/models/endpoint.rs

use serde::{Deserialize, Serialize};

/// How an endpoint's reported player count should be interpreted.
///
/// A proxy front-end (BungeeCord, Velocity, ...) reports the player count of
/// the whole federation behind it, so those counts are summed into a single
/// totals row instead of being mixed with per-server populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationSemantics {
    Aggregate,
    PerServer,
}

/// One monitored game-server endpoint. Defined at startup, never mutated.
/// Registry order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub population: PopulationSemantics,
}

impl EndpointSpec {
    pub fn is_aggregate(&self) -> bool {
        self.population == PopulationSemantics::Aggregate
    }
}
