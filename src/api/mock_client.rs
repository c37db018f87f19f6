use crate::api::client::{ByteStream, MockStreamProducer};
use crate::types::Content;
use anyhow::Result;
use bytes::Bytes;
use futures::stream;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted reply from the fake model endpoint.
#[derive(Clone, Debug)]
pub enum MockRound {
    /// SSE frames delivered in order, each followed by a blank line.
    Frames(Vec<String>),
    /// Frames delivered, then the stream never ends.
    Stall(Vec<String>),
    /// The request itself fails.
    Fail(String),
}

#[derive(Clone)]
pub struct MockApiClient {
    rounds: Arc<Mutex<VecDeque<MockRound>>>,
    token_count: Option<u64>,
    requests: Arc<Mutex<Vec<Vec<Content>>>>,
}

impl MockApiClient {
    pub fn new(responses: Vec<Vec<String>>) -> Self {
        Self::with_rounds(responses.into_iter().map(MockRound::Frames).collect())
    }

    pub fn with_rounds(rounds: Vec<MockRound>) -> Self {
        Self {
            rounds: Arc::new(Mutex::new(rounds.into())),
            token_count: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every count request answers `count`; without this, counting fails.
    pub fn with_token_count(mut self, count: u64) -> Self {
        self.token_count = Some(count);
        self
    }

    /// Conversation snapshots received by each streaming call, oldest first.
    pub fn recorded_requests(&self) -> Vec<Vec<Content>> {
        self.requests.lock().unwrap().clone()
    }
}

fn frame(raw: String) -> Result<Bytes> {
    let framed = if raw.ends_with("\n\n") {
        raw
    } else {
        format!("{raw}\n\n")
    };
    Ok(Bytes::from(framed))
}

impl MockStreamProducer for MockApiClient {
    fn create_mock_stream(&self, contents: &[Content]) -> Result<ByteStream> {
        self.requests.lock().unwrap().push(contents.to_vec());

        let next = self.rounds.lock().unwrap().pop_front();
        match next {
            None => Err(anyhow::anyhow!(
                "MockApiClient: No more responses configured"
            )),
            Some(MockRound::Fail(message)) => Err(anyhow::anyhow!(message)),
            Some(MockRound::Frames(frames)) => {
                let chunks: Vec<Result<Bytes>> = frames.into_iter().map(frame).collect();
                Ok(Box::pin(stream::iter(chunks)))
            }
            Some(MockRound::Stall(frames)) => {
                let chunks: Vec<Result<Bytes>> = frames.into_iter().map(frame).collect();
                Ok(Box::pin(stream::iter(chunks).chain(stream::pending())))
            }
        }
    }

    fn count_tokens(&self, _contents: &[Content]) -> Result<u64> {
        self.token_count
            .ok_or_else(|| anyhow::anyhow!("MockApiClient: token counting unavailable"))
    }
}

/// SSE frame holding one candidate with the given parts and optional finish reason.
pub fn sse_frame(parts: serde_json::Value, finish_reason: Option<&str>) -> String {
    let mut candidate = serde_json::json!({
        "content": { "role": "model", "parts": parts },
    });
    if let Some(reason) = finish_reason {
        candidate["finishReason"] = serde_json::Value::String(reason.to_string());
    }
    format!(
        "data: {}",
        serde_json::json!({ "candidates": [candidate] })
    )
}

pub fn text_frame(text: &str) -> String {
    sse_frame(serde_json::json!([{ "text": text }]), None)
}

pub fn thought_frame(text: &str) -> String {
    sse_frame(serde_json::json!([{ "text": text, "thought": true }]), None)
}

pub fn call_frame(name: &str, args: serde_json::Value) -> String {
    sse_frame(
        serde_json::json!([{ "functionCall": { "name": name, "args": args } }]),
        None,
    )
}

pub fn stop_frame(reason: &str) -> String {
    sse_frame(serde_json::json!([]), Some(reason))
}
