//! The external AI scheduling assistant: wire contract, action decoding,
//! and the background request.

pub mod actions;
pub mod client;

pub use actions::{apply_actions, decode_response, ScheduleAction};
pub use client::{AiClient, AiRequest};

/// Everything that can go wrong between "Process Schedule" and an applied
/// batch. Network failures split into unreachable vs HTTP-level so the
/// status line can say which; none of them are retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    #[error("schedule is empty; nothing to send")]
    EmptySchedule,
    #[error("AI service unreachable: {0}")]
    Unreachable(String),
    #[error("AI service returned HTTP {0}")]
    Http(u16),
    #[error("AI service error: {0}")]
    Service(String),
    #[error("malformed AI response: {0}")]
    MalformedResponse(String),
}
