//! The network half of the assistant: a blocking POST on a background
//! thread, reported back over a channel the UI polls once per frame. Only
//! the AI interaction flow waits on the result; dropping the [`AiRequest`]
//! abandons it, which is the one cancellation point in the app.

use std::sync::mpsc;
use std::thread;

use log::debug;

use super::actions::{decode_response, ScheduleAction};
use super::AiError;
use crate::model::Task;

pub const DEFAULT_ENDPOINT: &str = "https://agent-4-b73ivo2mua-uc.a.run.app/process_schedule";

pub struct AiClient {
    endpoint: String,
}

impl Default for AiClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl AiClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// POST `{ "schedule": <first root task>, "question": <text> }` and
    /// return a handle to poll. Only the first root of the forest is sent —
    /// that is the wire contract, not an optimization.
    pub fn process_schedule(&self, tasks: &[Task], question: &str) -> AiRequest {
        let (tx, rx) = mpsc::channel();
        let Some(root) = tasks.first().cloned() else {
            let _ = tx.send(Err(AiError::EmptySchedule));
            return AiRequest { rx };
        };
        let body = serde_json::json!({
            "schedule": root,
            "question": question,
        });
        let endpoint = self.endpoint.clone();
        thread::spawn(move || {
            debug!("posting schedule question to {endpoint}");
            // The receiver may be gone if the user closed the panel.
            let _ = tx.send(send_request(&endpoint, &body));
        });
        AiRequest { rx }
    }
}

/// An in-flight assistant call.
pub struct AiRequest {
    rx: mpsc::Receiver<Result<Vec<ScheduleAction>, AiError>>,
}

impl AiRequest {
    /// Non-blocking: `None` while the request is still running.
    pub fn try_result(&self) -> Option<Result<Vec<ScheduleAction>, AiError>> {
        self.rx.try_recv().ok()
    }
}

fn send_request(
    endpoint: &str,
    body: &serde_json::Value,
) -> Result<Vec<ScheduleAction>, AiError> {
    let response = ureq::post(endpoint).send_json(body).map_err(|err| match err {
        ureq::Error::Status(code, _) => AiError::Http(code),
        ureq::Error::Transport(transport) => AiError::Unreachable(transport.to_string()),
    })?;
    let value: serde_json::Value = response
        .into_json()
        .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
    decode_response(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_forest_fails_without_a_network_call() {
        let client = AiClient::default();
        let request = client.process_schedule(&[], "compress the schedule");
        assert_eq!(request.try_result(), Some(Err(AiError::EmptySchedule)));
    }
}
