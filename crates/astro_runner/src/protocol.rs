//! JSON-lines protocol between the runner and its host process.
//!
//! The runner drives the conversation: it writes one request per line and,
//! for every request except `log`, reads exactly one reply line back.
//!
//! **Output (stdout):** requests from the runner
//! **Input (stdin):** replies from the host
//!
//! # Example Session
//!
//! ```text
//! -> {"kind":"read_roster"}
//! <- {"ok":true,"roster":["alice","bob"]}
//! -> {"kind":"log","message":"game ready for 2 players"}
//! -> {"kind":"to_player","name":"alice","round":"round 0","state":{"map":{...},"player_id":0}}
//! <- {"ok":true}
//! -> {"kind":"read_player","name":"alice"}
//! <- {"ok":true,"payload":[{"type":0,"data":{"type":2}}]}
//! -> {"kind":"to_observer","state":{"map":{...}}}
//! <- {"ok":true}
//! -> {"kind":"scores","scores":{"alice":1260,"bob":0}}
//! <- {"ok":true}
//! ```
//!
//! A reply with `"ok": false`, an unparsable reply or a closed stream all
//! count as a failed status.

use std::collections::BTreeMap;

use astro_core::snapshot::{ObserverSnapshot, PlayerSnapshot};
use serde::{Deserialize, Serialize};

// ============================================================================
// Requests (Runner -> Host)
// ============================================================================

/// A request line written by the runner.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request<'a> {
    /// Ask for the player names, in join order.
    ReadRoster,

    /// Deliver the round state to one player.
    ToPlayer {
        name: &'a str,
        round: &'a str,
        state: &'a PlayerSnapshot,
    },

    /// Collect one player's command batch.
    ReadPlayer { name: &'a str },

    /// Deliver the round state to spectators.
    ToObserver { state: &'a ObserverSnapshot },

    /// Free-form diagnostic line. No reply is expected.
    Log { message: &'a str },

    /// Final standings.
    Scores { scores: BTreeMap<&'a str, i64> },
}

impl Request<'_> {
    /// Whether the host answers this request.
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Self::Log { .. })
    }

    /// Request name, for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadRoster => "read_roster",
            Self::ToPlayer { .. } => "to_player",
            Self::ReadPlayer { .. } => "read_player",
            Self::ToObserver { .. } => "to_observer",
            Self::Log { .. } => "log",
            Self::Scores { .. } => "scores",
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }
}

// ============================================================================
// Replies (Host -> Runner)
// ============================================================================

/// A reply line read back from the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Status of the request.
    pub ok: bool,
    /// Player names, for `read_roster`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roster: Vec<String>,
    /// Command batch, for `read_player`.
    ///
    /// Either the batch itself or a string holding the player's raw output.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Reply {
    /// Bare success reply.
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    /// Bare failure reply.
    pub fn failed() -> Self {
        Self::default()
    }

    /// Success reply carrying a roster.
    pub fn with_roster<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            ok: true,
            roster: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Success reply carrying the player's raw output.
    pub fn with_payload(raw: impl Into<String>) -> Self {
        Self {
            ok: true,
            payload: serde_json::Value::String(raw.into()),
            ..Self::default()
        }
    }

    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The payload as the text the core parses and replays record.
    ///
    /// A string payload is passed through untouched so that malformed
    /// player output stays malformed.
    pub fn payload_text(&self) -> String {
        match &self.payload {
            serde_json::Value::String(raw) => raw.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}
