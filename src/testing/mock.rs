//! Scripted transport for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::extract::StepError;
use super::request::{OutboundRequest, Response, Transport};

/// Replays canned replies in order and records every request sent
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Response, StepError>>>,
    sent: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<Response, StepError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Successful replies given as (status, body)
    pub fn replies(replies: Vec<(u16, &str)>) -> Self {
        Self::new(
            replies
                .into_iter()
                .map(|(status, text)| {
                    Ok(Response {
                        status,
                        text: text.to_string(),
                    })
                })
                .collect(),
        )
    }

    pub fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<Response, StepError> {
        self.sent.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StepError::Transport("no scripted reply left".to_string())))
    }
}
