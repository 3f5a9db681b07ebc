//! Ground-station table rendering of ledger blocks.

use chrono::DateTime;
use epoh_02_ledger::SessionEvent;
use shared_types::{HashChainBlock, TelemetrySample};

use super::flight::LANDING_STATUS;

/// Column header matching [`format_row`].
pub const TABLE_HEADER: &str =
    "  Idx | Time (UTC)   | Event     | Path (X, Y)          | Alt (Z)  | Speed      | Auth";

/// What a block records, as shown in the `Event` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTag {
    /// Genesis block.
    Init,
    /// Session establishment audit record.
    Auth,
    /// In-flight telemetry.
    Path,
    /// Final landing sample.
    Landing,
    /// Anything else.
    Misc,
}

impl EventTag {
    pub fn classify(block: &HashChainBlock) -> Self {
        if block.index == 0 {
            return EventTag::Init;
        }
        if let Ok(event) = serde_json::from_slice::<SessionEvent>(&block.telemetry_payload) {
            if event.event == SessionEvent::ESTABLISHED {
                return EventTag::Auth;
            }
        }
        match TelemetrySample::from_payload(&block.telemetry_payload) {
            Some(sample) if sample.status.as_deref() == Some(LANDING_STATUS) => EventTag::Landing,
            Some(_) => EventTag::Path,
            None => EventTag::Misc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventTag::Init => "INIT",
            EventTag::Auth => "AUTH",
            EventTag::Path => "PATH",
            EventTag::Landing => "LANDING",
            EventTag::Misc => "MISC",
        }
    }
}

/// One table line for `block`.
pub fn format_row(block: &HashChainBlock) -> String {
    let tag = EventTag::classify(block);
    let time = i64::try_from(block.timestamp.wall_micros)
        .ok()
        .and_then(DateTime::from_timestamp_micros)
        .map(|t| t.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| "--:--:--.---".to_string());

    let flight = match TelemetrySample::from_payload(&block.telemetry_payload) {
        Some(s) => format!(
            "({:7.2}, {:7.2})     | {:6.2}m  | {:5.2} m/s",
            s.x_pos, s.y_pos, s.z_alt, s.vel_mag
        ),
        None => format!("{:<20} | {:<8} | {:<10}", "-", "-", "-"),
    };

    format!(
        "[{:>3}] | {} | {:<9} | {} | {} {}",
        block.index,
        time,
        tag.as_str(),
        flight,
        block.client_id,
        block.short_hash()
    )
}

/// Remembers the newest block printed so a followed tail shows each block once.
#[derive(Debug, Default)]
pub struct TailCursor {
    last_index: Option<u64>,
}

impl TailCursor {
    /// Blocks from `blocks` not shown before, in index order.
    pub fn fresh<'a>(&mut self, blocks: &'a [HashChainBlock]) -> Vec<&'a HashChainBlock> {
        let fresh: Vec<_> = blocks
            .iter()
            .filter(|b| self.last_index.map_or(true, |last| b.index > last))
            .collect();
        if let Some(newest) = fresh.last() {
            self.last_index = Some(newest.index);
        }
        fresh
    }
}
