mod state;
mod transcript;

pub use state::{UiState, UiTransition};
pub use transcript::{EntryKind, Transcript, TranscriptEntry, WELCOME_TEXT};

use crate::config::{GenerationOptions, Preferences};
use crate::models::{model_index, supports_thinking, AVAILABLE_MODELS};
use crate::runtime::context::RuntimeContext;
use crate::runtime::event::{StreamEvent, ToolApprovalRequest, TurnEvent};
use crate::runtime::frontend::{ScrollAction, UserInputEvent};
use crate::runtime::mode::RuntimeMode;
use crate::state::TokenUsage;
use crate::util::env_override_u64;

const DEFAULT_MAX_HISTORY_LINES: u64 = 2000;
const MAX_HISTORY_LINES_ENV: &str = "AGENT_MAX_HISTORY_LINES";

/// Terminal UI state: one explicit `UiState`, the transcript, and the user's
/// toggles.
pub struct TuiMode {
    state: UiState,
    transcript: Transcript,
    active_turn: Option<u64>,
    pending_confirmation: Option<ToolApprovalRequest>,
    preferences: Preferences,
    model_cursor: usize,
    usage: TokenUsage,
    scroll_from_bottom: usize,
    cancel_requested: bool,
    pending_quit: bool,
    quit_requested: bool,
}

impl TuiMode {
    pub fn new(preferences: Preferences) -> Self {
        Self::with_history_cap(preferences, resolve_history_cap())
    }

    pub fn with_history_cap(preferences: Preferences, history_cap: usize) -> Self {
        Self {
            state: UiState::Idle,
            transcript: Transcript::new(history_cap),
            active_turn: None,
            pending_confirmation: None,
            model_cursor: model_index(&preferences.selected_model),
            preferences,
            usage: TokenUsage::default(),
            scroll_from_bottom: 0,
            cancel_requested: false,
            pending_quit: false,
            quit_requested: false,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        self.transcript.entries()
    }

    pub fn model(&self) -> &str {
        &self.preferences.selected_model
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn scroll_from_bottom(&self) -> usize {
        self.scroll_from_bottom
    }

    pub fn model_cursor(&self) -> Option<usize> {
        (self.state == UiState::ModelSelect).then_some(self.model_cursor)
    }

    /// Tool name and arguments awaiting a decision, if the confirm overlay is up.
    pub fn pending_confirmation(&self) -> Option<(&str, &serde_json::Value)> {
        self.pending_confirmation
            .as_ref()
            .map(|request| (request.tool_name.as_str(), &request.arguments))
    }

    pub fn status_line(&self) -> String {
        let state = if self.pending_quit {
            "press Ctrl+C again to quit"
        } else if self.cancel_requested {
            "cancelling"
        } else {
            self.state.label()
        };
        let view = if self.scroll_from_bottom > 0 {
            " | view:scrolled"
        } else {
            ""
        };
        format!(
            "{state} | model:{} | confirm:{} | thinking:{} | tokens in:{} out:{} total:{}{view}",
            self.preferences.selected_model,
            on_off(self.preferences.require_tool_confirmation),
            on_off(self.preferences.enable_thinking_mode),
            self.usage.input,
            self.usage.output,
            self.usage.total,
        )
    }

    fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            thinking: self.preferences.enable_thinking_mode
                && supports_thinking(&self.preferences.selected_model),
            ..GenerationOptions::default()
        }
    }

    fn apply(&mut self, transition: UiTransition) -> bool {
        match self.state.next(transition) {
            Some(next) => {
                tracing::debug!(from = ?self.state, to = ?next, ?transition, "ui transition");
                self.state = next;
                true
            }
            None => false,
        }
    }

    fn submit(&mut self, input: String, ctx: &mut RuntimeContext<'_>) {
        if !self.apply(UiTransition::Submit) {
            return;
        }
        self.cancel_requested = false;
        self.scroll_from_bottom = 0;
        self.transcript.begin_turn(&input);
        let turn_id = ctx.start_turn(
            input,
            self.generation_options(),
            self.preferences.require_tool_confirmation,
        );
        self.active_turn = Some(turn_id);
    }

    fn answer_confirmation(&mut self, approved: bool) {
        if !self.apply(UiTransition::ConfirmationAnswered) {
            return;
        }
        if let Some(request) = self.pending_confirmation.take() {
            request.respond(approved);
        }
    }

    fn interrupt(&mut self, ctx: &mut RuntimeContext<'_>) {
        if self.state.is_busy() {
            if !self.cancel_requested {
                self.cancel_requested = true;
                ctx.cancel_turn();
                if self.state == UiState::ToolConfirm {
                    self.answer_confirmation(false);
                }
            }
            return;
        }
        if self.state == UiState::Idle {
            if self.pending_quit {
                self.quit_requested = true;
            } else {
                self.pending_quit = true;
            }
        }
    }

    fn open_model_select(&mut self) {
        if self.apply(UiTransition::OpenModelSelect) {
            self.model_cursor = model_index(&self.preferences.selected_model);
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.state != UiState::ModelSelect {
            return;
        }
        let last = AVAILABLE_MODELS.len().saturating_sub(1);
        self.model_cursor = self.model_cursor.saturating_add_signed(delta).min(last);
    }

    fn accept_selection(&mut self, ctx: &mut RuntimeContext<'_>) {
        if !self.apply(UiTransition::CloseModelSelect) {
            return;
        }
        let Some(model) = AVAILABLE_MODELS.get(self.model_cursor) else {
            return;
        };
        if *model == self.preferences.selected_model {
            return;
        }
        self.preferences.selected_model = model.to_string();
        ctx.set_model(model);
        ctx.save_preferences(&self.preferences);
    }

    fn toggle_preference(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        flag: fn(&mut Preferences) -> &mut bool,
    ) {
        if self.state != UiState::Idle {
            return;
        }
        let value = flag(&mut self.preferences);
        *value = !*value;
        ctx.save_preferences(&self.preferences);
    }

    fn clear_conversation(&mut self, ctx: &mut RuntimeContext<'_>) {
        if self.state != UiState::Idle {
            return;
        }
        ctx.clear_conversation();
        self.transcript.reset();
        self.scroll_from_bottom = 0;
    }

    fn scroll(&mut self, action: ScrollAction) {
        self.scroll_from_bottom = match action {
            ScrollAction::PageUp(rows) => self.scroll_from_bottom.saturating_add(rows.max(1)),
            ScrollAction::PageDown(rows) => self.scroll_from_bottom.saturating_sub(rows.max(1)),
            ScrollAction::Home => usize::MAX,
            ScrollAction::End => 0,
        };
    }

    /// No overlay is covering the transcript.
    fn transcript_focused(&self) -> bool {
        matches!(self.state, UiState::Idle | UiState::AwaitingResponse)
    }

    fn end_turn(&mut self) {
        if let Some(request) = self.pending_confirmation.take() {
            request.respond(false);
        }
        self.apply(UiTransition::TurnEnded);
        self.active_turn = None;
        self.cancel_requested = false;
    }
}

impl RuntimeMode for TuiMode {
    fn on_user_input(&mut self, event: UserInputEvent, ctx: &mut RuntimeContext<'_>) {
        if event != UserInputEvent::Interrupt {
            self.pending_quit = false;
        }

        match event {
            UserInputEvent::Submit(input) => self.submit(input, ctx),
            UserInputEvent::Interrupt => self.interrupt(ctx),
            UserInputEvent::Escape => match self.state {
                UiState::Idle => self.quit_requested = true,
                UiState::ModelSelect => {
                    self.apply(UiTransition::CloseModelSelect);
                }
                UiState::ToolConfirm => self.answer_confirmation(false),
                UiState::AwaitingResponse => {}
            },
            UserInputEvent::Confirm(approved) => self.answer_confirmation(approved),
            UserInputEvent::OpenModelSelect => self.open_model_select(),
            UserInputEvent::MoveSelection(delta) => self.move_selection(delta),
            UserInputEvent::AcceptSelection => self.accept_selection(ctx),
            UserInputEvent::ToggleConfirmation => self.toggle_preference(ctx, confirmation_flag),
            UserInputEvent::ToggleThinking => self.toggle_preference(ctx, thinking_flag),
            UserInputEvent::ToggleCollapse => {
                if self.transcript_focused() {
                    self.transcript.toggle_all_collapsed();
                }
            }
            UserInputEvent::ToggleEntry(index) => {
                if self.transcript_focused() {
                    self.transcript.toggle_entry(index);
                }
            }
            UserInputEvent::ClearConversation => self.clear_conversation(ctx),
            UserInputEvent::Scroll(action) => self.scroll(action),
        }
    }

    fn on_turn_event(&mut self, event: TurnEvent, _ctx: &mut RuntimeContext<'_>) {
        let TurnEvent { turn_id, event } = event;
        if self.active_turn != Some(turn_id) {
            tracing::debug!(turn_id, "ignoring event from inactive turn");
            if let StreamEvent::ConfirmationRequest(request) = event {
                request.respond(false);
            }
            return;
        }

        match event {
            StreamEvent::TextChunk(text) => self.transcript.append_text(&text),
            StreamEvent::ToolMessage(message) | StreamEvent::ThoughtMessage(message) => {
                self.transcript
                    .insert_before_streaming(TranscriptEntry::from(message));
            }
            StreamEvent::ConfirmationRequest(request) => {
                if self.cancel_requested || !self.apply(UiTransition::ConfirmationRequested) {
                    request.respond(false);
                    return;
                }
                self.pending_confirmation = Some(request);
            }
            StreamEvent::Complete { messages, usage } => {
                self.transcript.finalize(&messages);
                self.usage = usage;
                self.end_turn();
            }
            StreamEvent::Error { message, usage } => {
                self.transcript.fail(&message);
                self.usage = usage;
                self.end_turn();
            }
            StreamEvent::Cancelled { usage } => {
                self.transcript.finalize(&[]);
                self.usage = usage;
                self.end_turn();
            }
        }
    }

    fn is_turn_in_progress(&self) -> bool {
        self.state.is_busy()
    }

    fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

fn confirmation_flag(preferences: &mut Preferences) -> &mut bool {
    &mut preferences.require_tool_confirmation
}

fn thinking_flag(preferences: &mut Preferences) -> &mut bool {
    &mut preferences.enable_thinking_mode
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn resolve_history_cap() -> usize {
    env_override_u64(MAX_HISTORY_LINES_ENV, DEFAULT_MAX_HISTORY_LINES, 1, 1_000_000) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_client::{call_frame, text_frame, MockApiClient};
    use crate::api::ApiClient;
    use crate::config::TurnLimits;
    use crate::runtime::bridge::StreamingBridge;
    use crate::state::{ConversationEngine, Message};
    use crate::tools::{ToolDefinition, ToolRegistry};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::{mpsc, oneshot};

    fn bridge(rounds: Vec<Vec<String>>) -> (StreamingBridge, mpsc::Receiver<TurnEvent>) {
        let tool = ToolDefinition::new("list_files", "lists", json!({"type": "object"}), |_, _| {
            Ok("a.txt\nb.txt".to_string())
        });
        let engine = ConversationEngine::new(
            ApiClient::new_mock(Arc::new(MockApiClient::new(rounds))),
            ToolRegistry::new(vec![tool]).unwrap(),
            "gemini-2.5-flash",
        );
        StreamingBridge::new(engine, TurnLimits::default())
    }

    fn mode() -> TuiMode {
        TuiMode::with_history_cap(Preferences::default(), 100)
    }

    fn event(turn_id: u64, event: StreamEvent) -> TurnEvent {
        TurnEvent { turn_id, event }
    }

    async fn pump(
        mode: &mut TuiMode,
        rx: &mut mpsc::Receiver<TurnEvent>,
        ctx: &mut RuntimeContext<'_>,
        until: impl Fn(&TuiMode) -> bool,
    ) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !until(mode) {
            assert!(tokio::time::Instant::now() < deadline, "timed out pumping events");
            match tokio::time::timeout(Duration::from_millis(50), rx.recv()).await {
                Ok(Some(turn_event)) => mode.on_turn_event(turn_event, ctx),
                Ok(None) => panic!("event channel closed"),
                Err(_) => {}
            }
        }
    }

    #[tokio::test]
    async fn confirmed_tool_turn_renders_user_tool_agent() {
        let (mut bridge, mut rx) = bridge(vec![
            vec![call_frame("list_files", json!({"path": "."}))],
            vec![text_frame("Found 2 files.")],
        ]);
        let mut ctx = RuntimeContext::new(&mut bridge, None);
        let mut mode = mode();

        mode.on_user_input(UserInputEvent::Submit("list files in .".into()), &mut ctx);
        assert_eq!(mode.state(), UiState::AwaitingResponse);

        pump(&mut mode, &mut rx, &mut ctx, |m| m.state() == UiState::ToolConfirm).await;
        assert_eq!(
            mode.pending_confirmation().map(|(name, _)| name),
            Some("list_files")
        );
        mode.on_user_input(UserInputEvent::Confirm(true), &mut ctx);
        assert_eq!(mode.state(), UiState::AwaitingResponse);

        pump(&mut mode, &mut rx, &mut ctx, |m| m.state() == UiState::Idle).await;
        let kinds: Vec<EntryKind> = mode.entries().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EntryKind::Welcome, EntryKind::User, EntryKind::Tool, EntryKind::Agent]
        );
        assert_eq!(mode.entries()[3].content, "Found 2 files.");
    }

    #[tokio::test]
    async fn denial_keeps_turn_flowing() {
        let (mut bridge, mut rx) = bridge(vec![
            vec![call_frame("list_files", json!({}))],
            vec![text_frame("Okay.")],
        ]);
        let mut ctx = RuntimeContext::new(&mut bridge, None);
        let mut mode = mode();

        mode.on_user_input(UserInputEvent::Submit("list".into()), &mut ctx);
        pump(&mut mode, &mut rx, &mut ctx, |m| m.state() == UiState::ToolConfirm).await;
        mode.on_user_input(UserInputEvent::Escape, &mut ctx);
        pump(&mut mode, &mut rx, &mut ctx, |m| m.state() == UiState::Idle).await;

        let tool = &mode.entries()[2];
        assert_eq!(tool.kind, EntryKind::Tool);
        assert!(tool.is_error);
        assert!(tool.content.contains("User denied execution"));
    }

    #[tokio::test]
    async fn events_from_other_turns_are_ignored() {
        let (mut bridge, _rx) = bridge(vec![vec![text_frame("hi")]]);
        let mut ctx = RuntimeContext::new(&mut bridge, None);
        let mut mode = mode();
        mode.on_user_input(UserInputEvent::Submit("hi".into()), &mut ctx);
        let active = mode.active_turn.expect("active turn");

        mode.on_turn_event(event(active + 7, StreamEvent::TextChunk("stale".into())), &mut ctx);
        let (reply, reply_rx) = oneshot::channel();
        mode.on_turn_event(
            event(
                active + 7,
                StreamEvent::ConfirmationRequest(ToolApprovalRequest::new("x", json!({}), reply)),
            ),
            &mut ctx,
        );

        assert_eq!(reply_rx.await, Ok(false));
        assert_eq!(mode.state(), UiState::AwaitingResponse);
        assert_eq!(mode.entries().last().map(|e| e.content.as_str()), Some(""));
    }

    #[tokio::test]
    async fn duplicate_completion_is_a_no_op() {
        let (mut bridge, _rx) = bridge(vec![]);
        let mut ctx = RuntimeContext::new(&mut bridge, None);
        let mut mode = mode();
        mode.on_user_input(UserInputEvent::Submit("essay".into()), &mut ctx);
        let turn = mode.active_turn.expect("active turn");

        mode.on_turn_event(event(turn, StreamEvent::TextChunk("partial".into())), &mut ctx);
        let complete = || StreamEvent::Complete {
            messages: vec![
                Message::user("essay"),
                Message::agent("partial"),
                Message::agent_error("[Response truncated due to length limit]"),
            ],
            usage: TokenUsage {
                input: 3,
                output: 2,
                total: 5,
            },
        };
        mode.on_turn_event(event(turn, complete()), &mut ctx);
        mode.on_turn_event(event(turn, complete()), &mut ctx);

        assert_eq!(mode.entries().len(), 4);
        assert_eq!(mode.state(), UiState::Idle);
        assert_eq!(mode.usage().total, 5);
        assert!(mode.status_line().contains("total:5"));
    }

    #[tokio::test]
    async fn terminal_event_during_confirmation_denies_pending_reply() {
        let (mut bridge, _rx) = bridge(vec![]);
        let mut ctx = RuntimeContext::new(&mut bridge, None);
        let mut mode = mode();
        mode.on_user_input(UserInputEvent::Submit("go".into()), &mut ctx);
        let turn = mode.active_turn.expect("active turn");

        let (reply, reply_rx) = oneshot::channel();
        mode.on_turn_event(
            event(
                turn,
                StreamEvent::ConfirmationRequest(ToolApprovalRequest::new(
                    "list_files",
                    json!({}),
                    reply,
                )),
            ),
            &mut ctx,
        );
        assert_eq!(mode.state(), UiState::ToolConfirm);

        let failed = StreamEvent::Error {
            message: "boom".into(),
            usage: TokenUsage {
                input: 7,
                output: 1,
                total: 8,
            },
        };
        mode.on_turn_event(event(turn, failed), &mut ctx);
        assert_eq!(reply_rx.await, Ok(false));
        assert_eq!(mode.state(), UiState::Idle);
        let last = mode.entries().last().expect("entry");
        assert!(last.is_error);
        assert_eq!(last.content, "Error: boom");
        assert_eq!(mode.usage().total, 8);
        assert!(mode.status_line().contains("total:8"));
    }

    #[tokio::test]
    async fn interrupt_cancels_busy_turn_and_arms_quit_when_idle() {
        let (mut bridge, mut rx) = bridge(vec![]);
        let mut ctx = RuntimeContext::new(&mut bridge, None);
        let mut mode = mode();

        mode.on_user_input(UserInputEvent::Submit("hang".into()), &mut ctx);
        mode.on_user_input(UserInputEvent::Interrupt, &mut ctx);
        assert_eq!(mode.state(), UiState::AwaitingResponse);
        assert!(mode.status_line().starts_with("cancelling"));

        pump(&mut mode, &mut rx, &mut ctx, |m| m.state() == UiState::Idle).await;
        assert!(!mode.entries().iter().any(|entry| entry.is_error));

        mode.on_user_input(UserInputEvent::Interrupt, &mut ctx);
        assert!(!mode.quit_requested());
        mode.on_user_input(UserInputEvent::Interrupt, &mut ctx);
        assert!(mode.quit_requested());
    }

    #[tokio::test]
    async fn model_select_only_from_idle_and_persists_choice() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        let (mut bridge, _rx) = bridge(vec![]);
        let mut mode = mode();
        {
            let mut ctx = RuntimeContext::new(&mut bridge, Some(&path));
            mode.on_user_input(UserInputEvent::OpenModelSelect, &mut ctx);
            assert_eq!(mode.state(), UiState::ModelSelect);
            assert_eq!(mode.model_cursor(), Some(1));

            mode.on_user_input(UserInputEvent::MoveSelection(-5), &mut ctx);
            assert_eq!(mode.model_cursor(), Some(0));
            mode.on_user_input(UserInputEvent::Submit("ignored".into()), &mut ctx);
            assert_eq!(mode.state(), UiState::ModelSelect);
            mode.on_user_input(UserInputEvent::AcceptSelection, &mut ctx);
            assert_eq!(mode.state(), UiState::Idle);
        }
        bridge.settle().await;

        assert_eq!(mode.model(), "gemini-2.5-pro");
        assert_eq!(bridge.engine().lock().await.model(), "gemini-2.5-pro");
        assert_eq!(
            Preferences::load_from(&path).unwrap().selected_model,
            "gemini-2.5-pro"
        );

        let mut ctx = RuntimeContext::new(&mut bridge, Some(&path));
        mode.on_user_input(UserInputEvent::Submit("hi".into()), &mut ctx);
        mode.on_user_input(UserInputEvent::OpenModelSelect, &mut ctx);
        assert_eq!(mode.state(), UiState::AwaitingResponse);
    }

    #[tokio::test]
    async fn toggles_apply_in_idle_and_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        let (mut bridge, _rx) = bridge(vec![]);
        let mut ctx = RuntimeContext::new(&mut bridge, Some(&path));
        let mut mode = mode();

        mode.on_user_input(UserInputEvent::ToggleConfirmation, &mut ctx);
        mode.on_user_input(UserInputEvent::ToggleThinking, &mut ctx);

        assert!(!mode.preferences().require_tool_confirmation);
        assert!(mode.preferences().enable_thinking_mode);
        assert!(mode.generation_options().thinking);
        let saved = Preferences::load_from(&path).unwrap();
        assert_eq!(&saved, mode.preferences());
        assert!(mode.status_line().contains("confirm:off | thinking:on"));
    }

    #[tokio::test]
    async fn entries_fold_one_at_a_time_or_all_together() {
        let (mut bridge, _rx) = bridge(vec![]);
        let mut ctx = RuntimeContext::new(&mut bridge, None);
        let mut mode = mode();
        mode.on_user_input(UserInputEvent::Submit("look".into()), &mut ctx);
        let turn = mode.active_turn.expect("active turn");
        let tool = Message::tool("🔧 Tool Call: glob\nResult: a.rs", false);
        let thought = Message::thought("💭 Thinking: hm");
        mode.on_turn_event(event(turn, StreamEvent::ToolMessage(tool)), &mut ctx);
        mode.on_turn_event(event(turn, StreamEvent::ThoughtMessage(thought)), &mut ctx);
        let folded = |mode: &TuiMode| -> Vec<bool> {
            mode.entries()[2..4].iter().map(TranscriptEntry::is_folded).collect()
        };
        assert_eq!(folded(&mode), vec![true, true]);

        mode.on_user_input(UserInputEvent::ToggleEntry(2), &mut ctx);
        assert_eq!(folded(&mode), vec![false, true]);

        mode.on_user_input(UserInputEvent::ToggleCollapse, &mut ctx);
        assert_eq!(folded(&mode), vec![true, true]);
        mode.on_user_input(UserInputEvent::ToggleCollapse, &mut ctx);
        assert_eq!(folded(&mode), vec![false, false]);

        mode.on_user_input(UserInputEvent::ToggleEntry(0), &mut ctx);
        assert!(!mode.entries()[0].collapsed);
    }

    #[tokio::test]
    async fn clear_resets_transcript_but_not_usage() {
        let (mut bridge, _rx) = bridge(vec![]);
        let mut ctx = RuntimeContext::new(&mut bridge, None);
        let mut mode = mode();
        mode.usage = TokenUsage {
            input: 4,
            output: 4,
            total: 8,
        };
        mode.transcript.push(TranscriptEntry::new(EntryKind::User, "old"));

        mode.on_user_input(UserInputEvent::ClearConversation, &mut ctx);

        assert_eq!(mode.entries().len(), 1);
        assert_eq!(mode.entries()[0].kind, EntryKind::Welcome);
        assert_eq!(mode.usage().total, 8);
    }

    #[test]
    fn history_cap_comes_from_environment() {
        let mut env = crate::test_support::ScopedEnv::new();
        env.set(MAX_HISTORY_LINES_ENV, "5");
        assert_eq!(resolve_history_cap(), 5);
        env.set(MAX_HISTORY_LINES_ENV, "nope");
        assert_eq!(resolve_history_cap(), DEFAULT_MAX_HISTORY_LINES as usize);
    }

    #[test]
    fn scrolling_moves_away_from_and_back_to_the_bottom() {
        let mut mode = mode();
        mode.scroll(ScrollAction::PageUp(10));
        mode.scroll(ScrollAction::PageUp(10));
        assert_eq!(mode.scroll_from_bottom(), 20);
        mode.scroll(ScrollAction::PageDown(5));
        assert_eq!(mode.scroll_from_bottom(), 15);
        mode.scroll(ScrollAction::Home);
        assert_eq!(mode.scroll_from_bottom(), usize::MAX);
        assert!(mode.status_line().ends_with("view:scrolled"));
        mode.scroll(ScrollAction::End);
        assert_eq!(mode.scroll_from_bottom(), 0);
    }
}
