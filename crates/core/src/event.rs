//! Stream events — the incrementally delivered response protocol.
//!
//! One orchestration run produces an ordered sequence of events, closed by
//! exactly one terminal event (`Done` xor `Error`). The gateway serializes
//! each event as one line-delimited JSON chunk:
//!
//! - `text`         — a piece of the assistant's answer
//! - `tool_invoked` — a tool is being dispatched
//! - `tool_result`  — tool execution completed
//! - `error`        — the turn failed; stream is closed
//! - `done`         — the turn completed; stream is closed

use serde::{Deserialize, Serialize};

use crate::provider::MediaRef;

/// Events emitted during one conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A piece of the assistant's textual answer.
    Text { text: String },

    /// A tool is being dispatched.
    ToolInvoked {
        name: String,
        input: serde_json::Value,
    },

    /// A dispatched tool finished and produced output.
    ToolResult {
        name: String,
        output: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        media: Vec<MediaRef>,
    },

    /// The turn failed. Terminal.
    Error { message: String },

    /// The turn completed. Terminal.
    Done {},
}

impl StreamEvent {
    /// Wire tag for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolInvoked { .. } => "tool_invoked",
            Self::ToolResult { .. } => "tool_result",
            Self::Error { .. } => "error",
            Self::Done {} => "done",
        }
    }

    /// Whether this event closes the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done {} | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_text() {
        let event = StreamEvent::Text {
            text: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"text""#));
        assert!(json.contains(r#""text":"Hello""#));
    }

    #[test]
    fn event_serialization_tool_invoked() {
        let event = StreamEvent::ToolInvoked {
            name: "web_fetch".into(),
            input: serde_json::json!({"url": "https://example.com"}),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_invoked""#));
        assert!(json.contains(r#""name":"web_fetch""#));
    }

    #[test]
    fn event_serialization_done() {
        let json = serde_json::to_string(&StreamEvent::Done {}).unwrap();
        assert!(json.contains(r#""type":"done""#));
    }

    #[test]
    fn terminal_events() {
        assert!(StreamEvent::Done {}.is_terminal());
        assert!(
            StreamEvent::Error {
                message: "boom".into()
            }
            .is_terminal()
        );
        assert!(
            !StreamEvent::Text {
                text: "hi".into()
            }
            .is_terminal()
        );
    }

    #[test]
    fn event_type_names() {
        assert_eq!(
            StreamEvent::Text { text: "x".into() }.event_type(),
            "text"
        );
        assert_eq!(
            StreamEvent::ToolResult {
                name: "a".into(),
                output: "b".into(),
                media: vec![]
            }
            .event_type(),
            "tool_result"
        );
        assert_eq!(StreamEvent::Done {}.event_type(), "done");
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"type":"text","text":"hi"}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        match event {
            StreamEvent::Text { text } => assert_eq!(text, "hi"),
            _ => panic!("Wrong variant"),
        }
    }
}
