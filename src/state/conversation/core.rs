use super::history::ConversationBlock;
use super::state::{ConfirmationGate, ConversationEngine, EngineEvent, EventSink, TurnError, TurnOptions};
use super::tools::{dedup_key, function_response_part, ToolPipeline};
use crate::api::stream::StreamParser;
use crate::api::GenerateRequest;
use crate::state::Message;
use crate::types::{FinishReason, GenerateContentResponse, Part};
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

impl ConversationEngine {
    /// Runs one user turn to completion: model rounds alternate with tool
    /// execution until the model answers without requesting tools.
    ///
    /// Text, tool and thought output is pushed to `sink` as it happens. The
    /// returned messages start with the user message, keep tool and thought
    /// messages in emission order, and close with a single Agent message
    /// holding all of the turn's text. Cancellation and the turn timeout drop the
    /// in-flight network call and signal any running tool.
    pub async fn process_turn(
        &mut self,
        input: &str,
        sink: &dyn EventSink,
        gate: Option<&dyn ConfirmationGate>,
        options: &TurnOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Message>, TurnError> {
        self.conversation.push(ConversationBlock::user(input));
        tracing::debug!(model = %self.model, blocks = self.conversation.len(), "turn started");

        let turn_cancel = cancel.child_token();
        let _cancel_on_exit = turn_cancel.clone().drop_guard();
        let turn_timeout = options.limits.turn_timeout;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TurnError::Cancelled),
            outcome = tokio::time::timeout(
                turn_timeout,
                self.run_rounds(input, sink, gate, options, &turn_cancel),
            ) => match outcome {
                Ok(result) => result,
                Err(_) => Err(TurnError::TimedOut(turn_timeout)),
            },
        };

        match &result {
            Ok(messages) => tracing::debug!(messages = messages.len(), "turn finished"),
            Err(TurnError::Cancelled) => tracing::debug!("turn cancelled"),
            Err(error) => tracing::error!(error = %error, "turn failed"),
        }
        result
    }

    async fn run_rounds(
        &mut self,
        input: &str,
        sink: &dyn EventSink,
        gate: Option<&dyn ConfirmationGate>,
        options: &TurnOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Message>, TurnError> {
        let max_rounds = options.limits.max_tool_rounds;
        let registry = Arc::clone(&self.registry);
        let declarations = registry.declarations();
        let pipeline = ToolPipeline::new(&registry, options.limits.tool_timeout);
        let context = RoundContext {
            pipeline: &pipeline,
            sink,
            gate,
            cancel,
        };

        let mut turn = TurnTranscript::new(input);
        let mut rounds = 0usize;

        loop {
            if rounds >= max_rounds {
                turn.notices.push(Message::agent_error(format!(
                    "[Stopped after {max_rounds} tool rounds]"
                )));
                return Ok(turn.finish());
            }
            rounds += 1;

            self.count_input_tokens().await;

            let contents = self.conversation.to_wire();
            let request = GenerateRequest {
                contents: &contents,
                tools: &declarations,
                options: &options.generation,
            };
            tracing::debug!(round = rounds, model = %self.model, "requesting model round");
            let mut stream = self
                .client
                .stream_generate_content(&self.model, &request)
                .await
                .map_err(TurnError::transport)?;

            let mut parser = StreamParser::new();
            let mut round = RoundState::default();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(TurnError::transport)?;
                for response in parser.process(&chunk) {
                    round.apply(response, &context).await;
                }
            }
            for response in parser.finish() {
                round.apply(response, &context).await;
            }

            if !round.saw_candidate {
                return Err(TurnError::EmptyResponse(round.block_reason));
            }

            turn.absorb(&mut round);

            if !round.model_parts.is_empty() {
                let block = ConversationBlock::model(std::mem::take(&mut round.model_parts));
                self.count_output_tokens(&block).await;
                self.conversation.push(block);
            }

            if round.tool_results.is_empty() {
                return Ok(turn.finish());
            }
            self.conversation
                .push(ConversationBlock::tool_results(round.tool_results));
        }
    }

    async fn count_input_tokens(&mut self) {
        let contents = self.conversation.to_wire();
        let counted = self.client.count_tokens(&self.model, &contents).await;
        match counted {
            Ok(tokens) => self.usage.record_input(tokens),
            Err(error) => tracing::warn!(error = %format!("{error:#}"), "input token count failed"),
        }
    }

    async fn count_output_tokens(&mut self, block: &ConversationBlock) {
        let contents = [block.to_content()];
        let counted = self.client.count_tokens(&self.model, &contents).await;
        match counted {
            Ok(tokens) => self.usage.record_output(tokens),
            Err(error) => tracing::warn!(error = %format!("{error:#}"), "output token count failed"),
        }
    }
}

/// Messages collected across every round of one turn. The answer text stays
/// a single fragment until the turn ends.
struct TurnTranscript {
    messages: Vec<Message>,
    answer: Message,
    notices: Vec<Message>,
}

impl TurnTranscript {
    fn new(input: &str) -> Self {
        Self {
            messages: vec![Message::user(input)],
            answer: Message::fragment(String::new()),
            notices: Vec::new(),
        }
    }

    fn absorb(&mut self, round: &mut RoundState) {
        self.messages.append(&mut round.messages);
        self.answer.content.push_str(&std::mem::take(&mut round.text));
        self.notices.extend(round.notice.take());
    }

    /// Tool and thought messages in arrival order, then the one Agent answer,
    /// then any stop notices.
    fn finish(mut self) -> Vec<Message> {
        if !self.answer.content.trim().is_empty() {
            self.messages.push(self.answer.into_agent());
        }
        self.messages.append(&mut self.notices);
        self.messages
    }
}

struct RoundContext<'a> {
    pipeline: &'a ToolPipeline<'a>,
    sink: &'a dyn EventSink,
    gate: Option<&'a dyn ConfirmationGate>,
    cancel: &'a CancellationToken,
}

/// Accumulated output of one model response.
#[derive(Default)]
struct RoundState {
    model_parts: Vec<Part>,
    tool_results: Vec<Part>,
    messages: Vec<Message>,
    text: String,
    seen_calls: HashSet<String>,
    saw_candidate: bool,
    block_reason: Option<String>,
    notice: Option<Message>,
}

impl RoundState {
    async fn apply(&mut self, response: GenerateContentResponse, context: &RoundContext<'_>) {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            self.block_reason = Some(reason);
        }
        let Some(candidate) = response.candidates.into_iter().next() else {
            return;
        };
        self.saw_candidate = true;

        let parts = candidate.content.map(|content| content.parts).unwrap_or_default();
        let (thoughts, rest): (Vec<Part>, Vec<Part>) = parts.into_iter().partition(|p| p.thought);
        let (calls, texts): (Vec<Part>, Vec<Part>) =
            rest.into_iter().partition(|p| p.function_call.is_some());

        for part in thoughts {
            self.apply_thought(part, context);
        }
        for part in calls {
            self.apply_call(part, context).await;
        }
        for part in texts {
            self.apply_text(part, context);
        }

        if let Some(reason) = candidate.finish_reason.filter(|reason| !reason.is_normal()) {
            tracing::debug!(reason = reason.as_str(), "abnormal finish reason");
            self.notice = Some(Message::agent_error(finish_reason_message(reason)));
        }
    }

    fn apply_thought(&mut self, part: Part, context: &RoundContext<'_>) {
        let Some(text) = part.text.filter(|text| !text.trim().is_empty()) else {
            return;
        };
        let message = Message::thought(format!("💭 Thinking: {text}"));
        context.sink.emit(EngineEvent::Thought(message.clone()));
        self.messages.push(message);
    }

    async fn apply_call(&mut self, part: Part, context: &RoundContext<'_>) {
        let Some(call) = part.function_call.clone() else {
            return;
        };
        if !self.seen_calls.insert(dedup_key(&call.name, &call.args)) {
            tracing::debug!(tool = %call.name, "skipping duplicate tool call");
            return;
        }

        self.model_parts.push(part);

        let outcome = context
            .pipeline
            .execute(&call.name, &call.args, context.gate, context.cancel)
            .await;
        tracing::debug!(tool = %call.name, is_error = outcome.is_error(), "tool call finished");

        let message = outcome.transcript_message(&call.name, &call.args);
        context.sink.emit(EngineEvent::Tool(message.clone()));
        self.messages.push(message);
        self.tool_results
            .push(function_response_part(&call.name, &outcome));
    }

    fn apply_text(&mut self, part: Part, context: &RoundContext<'_>) {
        let Some(text) = part.text.as_deref().filter(|text| !text.is_empty()) else {
            return;
        };
        let text = text.to_string();

        match self.model_parts.last_mut() {
            Some(Part {
                text: Some(existing),
                function_call: None,
                ..
            }) => existing.push_str(&text),
            _ => self.model_parts.push(Part {
                text: Some(text.clone()),
                thought_signature: part.thought_signature,
                ..Part::default()
            }),
        }

        self.text.push_str(&text);
        context.sink.emit(EngineEvent::Text(text));
    }
}

fn finish_reason_message(reason: FinishReason) -> String {
    match reason {
        FinishReason::MaxTokens => "[Response truncated due to length limit]".to_string(),
        FinishReason::Safety => "[Response blocked by safety filters]".to_string(),
        other => format!("[Response stopped: {}]", other.as_str()),
    }
}
