// File: src/services/render.rs
//
// Pure mapping from a StatusSummary to a platform-neutral DisplayPayload.
// No I/O, no clock, no failure modes; the Discord layer turns the payload
// into an embed.

use crate::models::{ColorState, DisplayPayload, StatusSummary};

pub const STATUS_TITLE: &str = "🌐 Server Status";
pub const STATUS_DESCRIPTION: &str = "Current connection status per server";

const TOTALS_LABEL: &str = "All servers";
const NEXT_UPDATE_LABEL: &str = "Next update";

pub fn render(summary: &StatusSummary) -> DisplayPayload {
    let color_state = if summary.all_online() {
        ColorState::AllOnline
    } else {
        ColorState::SomeOffline
    };

    let mut fields: Vec<(String, String)> =
        Vec::with_capacity(summary.entries.len() + 2);

    for entry in &summary.entries {
        let status_text = if entry.online {
            "🟢 Online"
        } else {
            "🔴 Offline"
        };
        let ping_text = if entry.online {
            format!("{}ms", entry.latency_ms)
        } else {
            "N/A".to_string()
        };
        let players_text = if entry.online {
            format!("{}/{}", entry.players_online, entry.players_max)
        } else {
            "N/A".to_string()
        };

        fields.push((
            entry.endpoint_name.clone(),
            format!("Status: {status_text}\nPing: {ping_text}\nPlayers: {players_text}"),
        ));
    }

    if let Some(totals) = summary.aggregate_totals {
        fields.push((
            TOTALS_LABEL.to_string(),
            format!(
                "Total players: {}/{}",
                totals.players_online, totals.players_max
            ),
        ));
    }

    fields.push((
        NEXT_UPDATE_LABEL.to_string(),
        format!("<t:{}:R>", summary.next_due_epoch),
    ));

    DisplayPayload {
        title: STATUS_TITLE.to_string(),
        description: STATUS_DESCRIPTION.to_string(),
        color_state,
        fields,
        next_refresh_epoch: summary.next_due_epoch,
    }
}
