//! Shared types for vercelscope
//!
//! This crate contains data structures used across multiple vercelscope crates.

use ratatui::style::Color;
use serde::Deserialize;

mod time_ago;

pub use time_ago::{time_ago, time_ago_short};

// ============================================================================
// Vercel Resource Types
// ============================================================================

/// A Vercel project
#[derive(Clone, Debug, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// Deployment lifecycle state
///
/// The API reports this as `readyState` (newer endpoints) or `state` (older
/// ones); both draw from the same vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ReadyState {
    Queued,
    Initializing,
    Building,
    Ready,
    Error,
    Canceled,
    Deleted,
    #[default]
    Unknown,
}

impl ReadyState {
    /// Parse a state from its wire representation (case-insensitive)
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "QUEUED" => Self::Queued,
            "INITIALIZING" => Self::Initializing,
            "BUILDING" => Self::Building,
            "READY" => Self::Ready,
            "ERROR" => Self::Error,
            "CANCELED" => Self::Canceled,
            "DELETED" => Self::Deleted,
            _ => Self::Unknown,
        }
    }

    /// Whether a deployment in this state is still producing build output
    pub fn is_building(&self) -> bool {
        matches!(self, Self::Building | Self::Initializing | Self::Queued)
    }

    /// Display label for the deployments table
    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Initializing => "Initializing",
            Self::Building => "Building",
            Self::Ready => "Ready",
            Self::Error => "Error",
            Self::Canceled => "Canceled",
            Self::Deleted => "Deleted",
            Self::Unknown => "Unknown",
        }
    }

    /// Display color for this state
    pub fn color(&self) -> Color {
        match self {
            Self::Queued => Color::DarkGray,
            Self::Initializing | Self::Building => Color::Yellow,
            Self::Ready => Color::Green,
            Self::Error => Color::Red,
            Self::Canceled | Self::Deleted => Color::Gray,
            Self::Unknown => Color::White,
        }
    }
}

/// Git metadata attached to a deployment
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeploymentMeta {
    #[serde(rename = "githubCommitRef")]
    pub commit_ref: Option<String>,
    #[serde(rename = "githubCommitSha")]
    pub commit_sha: Option<String>,
    #[serde(rename = "githubCommitMessage")]
    pub commit_message: Option<String>,
}

/// A single deployment as returned by the deployments listing endpoint
#[derive(Clone, Debug, Deserialize)]
pub struct Deployment {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Lifecycle state; `ready_state` takes precedence when both are present
    #[serde(rename = "readyState", default)]
    pub ready_state: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    /// Creation time in epoch milliseconds
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub meta: Option<DeploymentMeta>,
}

impl Deployment {
    /// Resolve the lifecycle state, preferring `readyState` over `state`
    pub fn status(&self) -> ReadyState {
        self.ready_state
            .as_deref()
            .or(self.state.as_deref())
            .map(ReadyState::parse)
            .unwrap_or_default()
    }

    /// Whether this deployment is still building (live tail is worthwhile)
    pub fn is_building(&self) -> bool {
        self.status().is_building()
    }

    /// Git branch this deployment was built from
    pub fn branch(&self) -> Option<&str> {
        self.meta.as_ref()?.commit_ref.as_deref()
    }

    /// Commit message for the deployed commit
    pub fn commit_message(&self) -> Option<&str> {
        self.meta.as_ref()?.commit_message.as_deref()
    }

    /// Abbreviated commit sha (7 chars)
    ///
    /// Cut on a char boundary; the field is untrusted input and may not be
    /// plain hex.
    pub fn short_sha(&self) -> Option<&str> {
        let sha = self.meta.as_ref()?.commit_sha.as_deref()?;
        match sha.char_indices().nth(7) {
            Some((end, _)) => Some(&sha[..end]),
            None => Some(sha),
        }
    }

    /// Creation time in epoch milliseconds (0 when unknown)
    pub fn created_at(&self) -> i64 {
        self.created.unwrap_or(0)
    }
}

// ============================================================================
// Log Event Types
// ============================================================================

/// Nested detail of a build log event
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LogPayload {
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub info: Option<LogPayloadInfo>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LogPayloadInfo {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// One structured build log event, parsed from a single JSON payload
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LogEvent {
    /// Event kind: "stdout", "stderr", "command", or an informational marker
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Epoch-millisecond timestamp at the top level
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub payload: Option<LogPayload>,
    /// Fallback line text when no payload is present
    #[serde(default)]
    pub text: Option<String>,
}

impl LogEvent {
    /// The authoritative timestamp: top-level `created`, else `payload.created`
    pub fn timestamp(&self) -> Option<i64> {
        self.created
            .or_else(|| self.payload.as_ref().and_then(|p| p.created))
    }

    /// The human-readable log line for this event
    pub fn text(&self) -> &str {
        self.payload
            .as_ref()
            .and_then(|p| p.text.as_deref())
            .or(self.text.as_deref())
            .unwrap_or("")
    }

    /// Whether this event came from the build's stderr
    pub fn is_stderr(&self) -> bool {
        self.kind == "stderr"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_parse() {
        assert_eq!(ReadyState::parse("BUILDING"), ReadyState::Building);
        assert_eq!(ReadyState::parse("building"), ReadyState::Building);
        assert_eq!(ReadyState::parse("READY"), ReadyState::Ready);
        assert_eq!(ReadyState::parse("nonsense"), ReadyState::Unknown);
    }

    #[test]
    fn test_is_building_vocabulary() {
        assert!(ReadyState::Queued.is_building());
        assert!(ReadyState::Initializing.is_building());
        assert!(ReadyState::Building.is_building());
        assert!(!ReadyState::Ready.is_building());
        assert!(!ReadyState::Error.is_building());
        assert!(!ReadyState::Canceled.is_building());
        assert!(!ReadyState::Unknown.is_building());
    }

    #[test]
    fn test_deployment_state_precedence() {
        let d: Deployment = serde_json::from_value(serde_json::json!({
            "uid": "dpl_1",
            "readyState": "READY",
            "state": "BUILDING",
        }))
        .unwrap();
        assert_eq!(d.status(), ReadyState::Ready);

        let d: Deployment = serde_json::from_value(serde_json::json!({
            "uid": "dpl_2",
            "state": "ERROR",
        }))
        .unwrap();
        assert_eq!(d.status(), ReadyState::Error);
    }

    #[test]
    fn test_log_event_timestamp_precedence() {
        let top: LogEvent = serde_json::from_str(
            r#"{"type":"stdout","created":100,"payload":{"created":50,"text":"x"}}"#,
        )
        .unwrap();
        assert_eq!(top.timestamp(), Some(100));

        let nested: LogEvent =
            serde_json::from_str(r#"{"type":"stdout","payload":{"created":50}}"#).unwrap();
        assert_eq!(nested.timestamp(), Some(50));

        let none: LogEvent = serde_json::from_str(r#"{"type":"stdout","text":"x"}"#).unwrap();
        assert_eq!(none.timestamp(), None);
    }

    #[test]
    fn test_log_event_text_fallback() {
        let payload: LogEvent = serde_json::from_str(
            r#"{"type":"stdout","payload":{"text":"from payload"},"text":"fallback"}"#,
        )
        .unwrap();
        assert_eq!(payload.text(), "from payload");

        let fallback: LogEvent =
            serde_json::from_str(r#"{"type":"stdout","text":"fallback"}"#).unwrap();
        assert_eq!(fallback.text(), "fallback");

        let empty: LogEvent = serde_json::from_str(r#"{"type":"command"}"#).unwrap();
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn test_deployment_git_helpers() {
        let d: Deployment = serde_json::from_value(serde_json::json!({
            "uid": "dpl_3",
            "meta": {
                "githubCommitRef": "main",
                "githubCommitSha": "0123456789abcdef",
            },
        }))
        .unwrap();
        assert_eq!(d.branch(), Some("main"));
        assert_eq!(d.short_sha(), Some("0123456"));
    }

    #[test]
    fn test_short_sha_handles_short_and_non_ascii_values() {
        let sha = |value: &str| -> Deployment {
            serde_json::from_value(serde_json::json!({
                "uid": "dpl_4",
                "meta": { "githubCommitSha": value },
            }))
            .unwrap()
        };

        assert_eq!(sha("abc").short_sha(), Some("abc"));
        // Multi-byte input must not panic or split a character
        assert_eq!(sha("é≠λ火水木金土日").short_sha(), Some("é≠λ火水木金"));
    }
}
