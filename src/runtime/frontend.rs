use super::mode::RuntimeMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAction {
    PageUp(usize),
    PageDown(usize),
    Home,
    End,
}

/// Keyboard intent after the frontend has decoded raw terminal input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserInputEvent {
    Submit(String),
    Interrupt,
    Escape,
    Confirm(bool),
    OpenModelSelect,
    MoveSelection(isize),
    AcceptSelection,
    ToggleConfirmation,
    ToggleThinking,
    ToggleCollapse,
    /// Fold or unfold the transcript entry at this index.
    ToggleEntry(usize),
    ClearConversation,
    Scroll(ScrollAction),
}

pub trait FrontendAdapter<M: RuntimeMode> {
    fn poll_user_input(&mut self, mode: &M) -> Option<UserInputEvent>;
    fn render(&mut self, mode: &M);
    fn should_quit(&self) -> bool;
}
