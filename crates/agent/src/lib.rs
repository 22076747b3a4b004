//! The conversational orchestrator.
//!
//! One call to [`Orchestrator::run`] processes one conversational turn:
//! repair and window the history, check the image shortcut, assemble the
//! system prompt (persona + recalled memory), then drive the model/tool loop
//! until the model answers in plain text, emitting
//! [`StreamEvent`](plume_core::event::StreamEvent)s as it goes. Exactly one
//! terminal event closes every run.
//!
//! The orchestrator is stateless between calls and shared behind an `Arc`
//! across concurrent sessions.

pub mod history;
pub mod orchestrator;
pub mod shortcut;

pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use shortcut::{ImageShortcut, ShortcutDetector};
