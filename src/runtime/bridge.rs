use super::event::{StreamEvent, ToolApprovalRequest, TurnEvent};
use crate::config::{GenerationOptions, TurnLimits};
use crate::state::{
    ConfirmationGate, ConversationEngine, EngineEvent, EventSink, TokenUsage, TurnError,
    TurnOptions,
};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const EVENT_QUEUE_CAPACITY: usize = 256;

struct ActiveTurn {
    id: u64,
    cancel: CancellationToken,
}

/// Runs engine turns on background tasks and funnels their output into one
/// bounded queue drained by the UI loop.
///
/// Engine work is serialized: every task spawned here first waits for the
/// previously spawned one, so a cancelled turn always delivers its terminal
/// event before anything from the next turn is queued.
pub struct StreamingBridge {
    engine: Arc<Mutex<ConversationEngine>>,
    events_tx: mpsc::Sender<TurnEvent>,
    limits: TurnLimits,
    next_turn_id: u64,
    active: Option<ActiveTurn>,
    tail: Option<JoinHandle<()>>,
}

impl StreamingBridge {
    pub fn new(
        engine: ConversationEngine,
        limits: TurnLimits,
    ) -> (Self, mpsc::Receiver<TurnEvent>) {
        Self::with_capacity(engine, limits, EVENT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        engine: ConversationEngine,
        limits: TurnLimits,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<TurnEvent>) {
        let (events_tx, events_rx) = mpsc::channel(capacity.max(1));
        let bridge = Self {
            engine: Arc::new(Mutex::new(engine)),
            events_tx,
            limits,
            next_turn_id: 0,
            active: None,
            tail: None,
        };
        (bridge, events_rx)
    }

    /// Starts a turn and returns its id. A still-running turn is cancelled
    /// first. Without `require_confirmation` tools run unprompted.
    pub fn start_turn(
        &mut self,
        input: String,
        generation: GenerationOptions,
        require_confirmation: bool,
    ) -> u64 {
        self.cancel();
        self.next_turn_id += 1;
        let turn_id = self.next_turn_id;
        let cancel = CancellationToken::new();
        self.active = Some(ActiveTurn {
            id: turn_id,
            cancel: cancel.clone(),
        });

        let job = TurnJob {
            turn_id,
            input,
            options: TurnOptions {
                generation,
                limits: self.limits,
            },
            require_confirmation,
            cancel,
            events: self.events_tx.clone(),
        };
        let engine = Arc::clone(&self.engine);
        let previous = self.tail.take();
        tracing::debug!(turn_id, "dispatching turn");
        self.tail = Some(tokio::spawn(async move {
            wait_for(previous).await;
            job.run(engine).await;
        }));
        turn_id
    }

    pub fn active_turn(&self) -> Option<u64> {
        self.active.as_ref().map(|turn| turn.id)
    }

    /// Signals the running turn, if any. Its terminal event still arrives.
    pub fn cancel(&mut self) {
        if let Some(turn) = self.active.take() {
            tracing::debug!(turn_id = turn.id, "cancelling turn");
            turn.cancel.cancel();
        }
    }

    pub fn set_model(&mut self, model: String) {
        self.enqueue(move |engine| engine.set_model(model));
    }

    /// Drops the conversation history. Token totals are kept.
    pub fn clear(&mut self) {
        self.enqueue(ConversationEngine::clear);
    }

    pub async fn usage(&self) -> TokenUsage {
        self.engine.lock().await.usage()
    }

    pub fn engine(&self) -> Arc<Mutex<ConversationEngine>> {
        Arc::clone(&self.engine)
    }

    /// Waits until every task spawned so far has finished.
    pub async fn settle(&mut self) {
        wait_for(self.tail.take()).await;
    }

    fn enqueue<F>(&mut self, apply: F)
    where
        F: FnOnce(&mut ConversationEngine) + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        let previous = self.tail.take();
        self.tail = Some(tokio::spawn(async move {
            wait_for(previous).await;
            apply(&mut *engine.lock().await);
        }));
    }
}

async fn wait_for(task: Option<JoinHandle<()>>) {
    if let Some(task) = task {
        if let Err(error) = task.await {
            tracing::warn!(error = %error, "background engine task ended abnormally");
        }
    }
}

struct TurnJob {
    turn_id: u64,
    input: String,
    options: TurnOptions,
    require_confirmation: bool,
    cancel: CancellationToken,
    events: mpsc::Sender<TurnEvent>,
}

impl TurnJob {
    async fn run(self, engine: Arc<Mutex<ConversationEngine>>) {
        let sink = ChannelSink {
            turn_id: self.turn_id,
            events: self.events.clone(),
        };
        let gate = ChannelGate {
            turn_id: self.turn_id,
            events: self.events.clone(),
            cancel: self.cancel.clone(),
            timeout: self.options.limits.confirm_timeout,
        };
        let gate: Option<&dyn ConfirmationGate> = if self.require_confirmation {
            Some(&gate)
        } else {
            None
        };

        // Held until the terminal event is queued.
        let mut engine = engine.lock().await;
        let terminal = if self.cancel.is_cancelled() {
            StreamEvent::Cancelled {
                usage: engine.usage(),
            }
        } else {
            let result = engine
                .process_turn(&self.input, &sink, gate, &self.options, &self.cancel)
                .await;
            match result {
                Ok(messages) => StreamEvent::Complete {
                    messages,
                    usage: engine.usage(),
                },
                Err(TurnError::Cancelled) => StreamEvent::Cancelled {
                    usage: engine.usage(),
                },
                Err(error) => StreamEvent::Error {
                    message: error.to_string(),
                    usage: engine.usage(),
                },
            }
        };

        let event = TurnEvent {
            turn_id: self.turn_id,
            event: terminal,
        };
        if self.events.send(event).await.is_err() {
            tracing::debug!(turn_id = self.turn_id, "event receiver closed before turn end");
        }
        drop(engine);
    }
}

/// Forwards engine output without ever waiting for queue space.
struct ChannelSink {
    turn_id: u64,
    events: mpsc::Sender<TurnEvent>,
}

impl EventSink for ChannelSink {
    fn emit(&self, event: EngineEvent) {
        let event = match event {
            EngineEvent::Text(text) => StreamEvent::TextChunk(text),
            EngineEvent::Tool(message) => StreamEvent::ToolMessage(message),
            EngineEvent::Thought(message) => StreamEvent::ThoughtMessage(message),
        };
        match self.events.try_send(TurnEvent {
            turn_id: self.turn_id,
            event,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(turn_id = self.turn_id, event = ?dropped.event, "event queue full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(turn_id = self.turn_id, "event receiver closed");
            }
        }
    }
}

/// Confirmation rendezvous: the request carries a one-shot reply slot and the
/// turn waits on that slot only.
struct ChannelGate {
    turn_id: u64,
    events: mpsc::Sender<TurnEvent>,
    cancel: CancellationToken,
    timeout: Duration,
}

#[async_trait]
impl ConfirmationGate for ChannelGate {
    async fn confirm(&self, tool_name: &str, arguments: &Value) -> Result<bool> {
        let (reply, reply_rx) = oneshot::channel();
        let request = TurnEvent {
            turn_id: self.turn_id,
            event: StreamEvent::ConfirmationRequest(ToolApprovalRequest::new(
                tool_name,
                arguments.clone(),
                reply,
            )),
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => bail!("turn cancelled while awaiting confirmation"),
            sent = self.events.send(request) => {
                sent.map_err(|_| anyhow!("confirmation channel closed"))?;
            }
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => bail!("turn cancelled while awaiting confirmation"),
            answer = tokio::time::timeout(self.timeout, reply_rx) => match answer {
                Ok(Ok(approved)) => Ok(approved),
                Ok(Err(_)) => Ok(false),
                Err(_) => {
                    tracing::debug!(tool = tool_name, "confirmation timed out");
                    bail!("no confirmation within {}", describe(self.timeout))
                }
            },
        }
    }
}

fn describe(timeout: Duration) -> String {
    if timeout.as_secs() > 0 && timeout.subsec_millis() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}
