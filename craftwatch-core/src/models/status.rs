// File: src/models/status.rs

use serde::{Deserialize, Serialize};

/// Outcome of probing a single endpoint. Built fresh each cycle and dropped
/// after rendering; no history is retained across cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub endpoint_name: String,
    pub online: bool,
    /// Round-trip latency in whole milliseconds; 0 when offline.
    pub latency_ms: u32,
    pub players_online: u32,
    pub players_max: u32,
}

impl ProbeResult {
    /// The shape every failed probe collapses to, whatever the failure was.
    pub fn offline(endpoint_name: impl Into<String>) -> Self {
        Self {
            endpoint_name: endpoint_name.into(),
            online: false,
            latency_ms: 0,
            players_online: 0,
            players_max: 0,
        }
    }
}

/// Synthesized totals row summed over the online aggregate-semantics
/// endpoints of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateTotals {
    pub players_online: u32,
    pub players_max: u32,
}

/// One cycle's merged view: per-endpoint results in registry order, the
/// optional totals row, and when the next refresh is due. Consumed by the
/// renderer immediately after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub entries: Vec<ProbeResult>,
    pub aggregate_totals: Option<AggregateTotals>,
    pub next_due_epoch: i64,
}

impl StatusSummary {
    pub fn all_online(&self) -> bool {
        self.entries.iter().all(|e| e.online)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorState {
    AllOnline,
    SomeOffline,
}

/// Platform-neutral rendering of a [`StatusSummary`]. The Discord layer
/// turns this into an embed; tests inspect it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPayload {
    pub title: String,
    pub description: String,
    pub color_state: ColorState,
    /// Ordered (label, body) pairs, one per summary entry plus the
    /// trailing next-update field.
    pub fields: Vec<(String, String)>,
    pub next_refresh_epoch: i64,
}
