use anyhow::Result;
use cli_agent::api::logging::init_file_logging;
use cli_agent::api::ApiClient;
use cli_agent::app::{TuiMode, UiState};
use cli_agent::config::{Config, Preferences};
use cli_agent::runtime::{
    FrontendAdapter, Runtime, RuntimeContext, RuntimeMode, ScrollAction, StreamingBridge,
    UserInputEvent,
};
use cli_agent::state::ConversationEngine;
use cli_agent::terminal::TerminalSession;
use cli_agent::tools::builtin_registry;
use cli_agent::ui::input::InputLine;
use cli_agent::ui::layout::split_screen;
use cli_agent::ui::render::{
    input_rows, render_input, render_model_select, render_status, render_tool_confirm,
    render_transcript, TranscriptView,
};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::widgets::Clear;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(16);
const WHEEL_ROWS: usize = 3;

/// Turns key presses into runtime intents. Prompt editing stays local; only
/// submissions and commands reach the mode.
#[derive(Default)]
struct Keymap {
    input: InputLine,
    max_scroll: usize,
    page_rows: usize,
    transcript: TranscriptView,
}

impl Keymap {
    fn map(
        &mut self,
        key: KeyEvent,
        state: UiState,
        scroll_from_bottom: usize,
    ) -> Option<UserInputEvent> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return Some(UserInputEvent::Interrupt);
        }

        match state {
            UiState::ToolConfirm => match key.code {
                KeyCode::Char('y' | 'Y') => Some(UserInputEvent::Confirm(true)),
                KeyCode::Char('n' | 'N') => Some(UserInputEvent::Confirm(false)),
                KeyCode::Esc => Some(UserInputEvent::Escape),
                _ => None,
            },
            UiState::ModelSelect => match key.code {
                KeyCode::Up => Some(UserInputEvent::MoveSelection(-1)),
                KeyCode::Down => Some(UserInputEvent::MoveSelection(1)),
                KeyCode::Enter => Some(UserInputEvent::AcceptSelection),
                KeyCode::Esc => Some(UserInputEvent::Escape),
                _ => None,
            },
            UiState::Idle | UiState::AwaitingResponse => {
                self.map_prompt_key(key, state, scroll_from_bottom)
            }
        }
    }

    fn map_prompt_key(
        &mut self,
        key: KeyEvent,
        state: UiState,
        scroll_from_bottom: usize,
    ) -> Option<UserInputEvent> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let page = self.page_rows.max(1);
        match key.code {
            KeyCode::F(2) => Some(UserInputEvent::OpenModelSelect),
            KeyCode::F(3) => Some(UserInputEvent::ToggleConfirmation),
            KeyCode::F(4) => Some(UserInputEvent::ToggleThinking),
            KeyCode::Char('t') if ctrl => Some(UserInputEvent::ToggleCollapse),
            KeyCode::Char('l') if ctrl => Some(UserInputEvent::ClearConversation),
            KeyCode::Esc => Some(UserInputEvent::Escape),
            KeyCode::PageUp => Some(UserInputEvent::Scroll(ScrollAction::PageUp(page))),
            KeyCode::PageDown => Some(self.scroll_down(page, scroll_from_bottom)),
            KeyCode::Home if ctrl => Some(UserInputEvent::Scroll(ScrollAction::Home)),
            KeyCode::End if ctrl => Some(UserInputEvent::Scroll(ScrollAction::End)),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.input.insert_str("\n");
                None
            }
            KeyCode::Char('j') if ctrl => {
                self.input.insert_str("\n");
                None
            }
            KeyCode::Enter if state == UiState::Idle => {
                self.input.submit().map(UserInputEvent::Submit)
            }
            KeyCode::Up => {
                self.input.history_up();
                None
            }
            KeyCode::Down => {
                self.input.history_down();
                None
            }
            KeyCode::Left => {
                self.input.move_left();
                None
            }
            KeyCode::Right => {
                self.input.move_right();
                None
            }
            KeyCode::Home => {
                self.input.move_home();
                None
            }
            KeyCode::End => {
                self.input.move_end();
                None
            }
            KeyCode::Backspace => {
                self.input.backspace();
                None
            }
            KeyCode::Delete => {
                self.input.delete();
                None
            }
            KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                let mut buf = [0u8; 4];
                self.input.insert_str(ch.encode_utf8(&mut buf));
                None
            }
            _ => None,
        }
    }

    /// The offset may sit past the top after Home; step down from what is shown.
    fn scroll_down(&self, rows: usize, scroll_from_bottom: usize) -> UserInputEvent {
        let overshoot = scroll_from_bottom.saturating_sub(self.max_scroll);
        UserInputEvent::Scroll(ScrollAction::PageDown(rows.saturating_add(overshoot)))
    }

    fn mouse(
        &self,
        mouse: MouseEvent,
        state: UiState,
        scroll_from_bottom: usize,
    ) -> Option<UserInputEvent> {
        if !matches!(state, UiState::Idle | UiState::AwaitingResponse) {
            return None;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self
                .transcript
                .entry_at(mouse.column, mouse.row)
                .map(UserInputEvent::ToggleEntry),
            MouseEventKind::ScrollUp => {
                Some(UserInputEvent::Scroll(ScrollAction::PageUp(WHEEL_ROWS)))
            }
            MouseEventKind::ScrollDown => Some(self.scroll_down(WHEEL_ROWS, scroll_from_bottom)),
            _ => None,
        }
    }

    fn paste(&mut self, text: &str, state: UiState) {
        if matches!(state, UiState::Idle | UiState::AwaitingResponse) {
            self.input.insert_str(&text.replace("\r\n", "\n"));
        }
    }
}

struct TuiFrontend {
    session: TerminalSession,
    keymap: Keymap,
    quit: bool,
}

impl TuiFrontend {
    fn new() -> Result<Self> {
        Ok(Self {
            session: TerminalSession::enter()?,
            keymap: Keymap::default(),
            quit: false,
        })
    }
}

impl FrontendAdapter<TuiMode> for TuiFrontend {
    fn poll_user_input(&mut self, mode: &TuiMode) -> Option<UserInputEvent> {
        let ready = match event::poll(POLL_INTERVAL) {
            Ok(ready) => ready,
            Err(err) => {
                tracing::error!("terminal poll failed: {err}");
                self.quit = true;
                return None;
            }
        };
        if !ready {
            return None;
        }
        let event = match event::read() {
            Ok(event) => event,
            Err(err) => {
                tracing::error!("terminal read failed: {err}");
                self.quit = true;
                return None;
            }
        };

        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                self.keymap
                    .map(key, mode.state(), mode.scroll_from_bottom())
            }
            Event::Mouse(mouse) => {
                self.keymap
                    .mouse(mouse, mode.state(), mode.scroll_from_bottom())
            }
            Event::Paste(text) => {
                self.keymap.paste(&text, mode.state());
                None
            }
            _ => None,
        }
    }

    fn render(&mut self, mode: &TuiMode) {
        let status = mode.status_line();
        let busy = mode.is_turn_in_progress();
        let input = &self.keymap.input;
        let mut view = TranscriptView::default();
        let mut page_rows = 0;

        let drawn = self.session.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Clear, area);
            let panes = split_screen(area, input_rows(input.buffer(), area.width));

            view = render_transcript(
                frame,
                panes.transcript,
                mode.entries(),
                mode.scroll_from_bottom(),
            );
            page_rows = panes.transcript.height.saturating_sub(1) as usize;
            render_status(frame, panes.status, &status, mode.state());
            render_input(frame, panes.input, input, busy);

            if let Some(cursor) = mode.model_cursor() {
                render_model_select(frame, cursor, mode.model());
            } else if let Some((name, arguments)) = mode.pending_confirmation() {
                render_tool_confirm(frame, name, arguments);
            }
        });
        if let Err(err) = drawn {
            tracing::error!("draw failed: {err}");
            self.quit = true;
        }
        self.keymap.max_scroll = view.max_scroll;
        self.keymap.page_rows = page_rows;
        self.keymap.transcript = view;
    }

    fn should_quit(&self) -> bool {
        self.quit
    }
}

fn load_preferences(path: Option<&std::path::Path>) -> Preferences {
    let Some(path) = path else {
        return Preferences::default();
    };
    Preferences::load_from(path).unwrap_or_else(|err| {
        tracing::warn!("using default preferences: {err:#}");
        Preferences::default()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;
    let log_path = init_file_logging();

    let prefs_path = Preferences::default_path()
        .map_err(|err| tracing::warn!("preferences will not be saved: {err:#}"))
        .ok();
    let mut preferences = load_preferences(prefs_path.as_deref());
    preferences.selected_model = config.initial_model(&preferences);
    tracing::info!(model = %preferences.selected_model, log = ?log_path, "starting agent");

    let registry = builtin_registry(config.working_dir.clone())?;
    let client = ApiClient::new(&config)?;
    let engine = ConversationEngine::new(client, registry, preferences.selected_model.clone());
    let (mut bridge, events_rx) = StreamingBridge::new(engine, config.limits);

    let mut runtime = Runtime::new(TuiMode::new(preferences), events_rx);
    let mut ctx = RuntimeContext::new(&mut bridge, prefs_path.as_deref());
    let mut frontend = TuiFrontend::new()?;
    runtime.run(&mut frontend, &mut ctx).await;
    Ok(())
}
