/// The single interaction mode the UI is in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UiState {
    #[default]
    Idle,
    AwaitingResponse,
    ModelSelect,
    ToolConfirm,
}

/// Inputs that move the UI between states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiTransition {
    Submit,
    OpenModelSelect,
    CloseModelSelect,
    ConfirmationRequested,
    ConfirmationAnswered,
    TurnEnded,
}

impl UiState {
    /// The transition table. `None` means the input is not accepted in this
    /// state and nothing changes.
    pub fn next(self, transition: UiTransition) -> Option<UiState> {
        use UiState::*;
        use UiTransition::*;

        match (self, transition) {
            (Idle, Submit) => Some(AwaitingResponse),
            (Idle, OpenModelSelect) => Some(ModelSelect),
            (ModelSelect, CloseModelSelect) => Some(Idle),
            (AwaitingResponse, ConfirmationRequested) => Some(ToolConfirm),
            (ToolConfirm, ConfirmationAnswered) => Some(AwaitingResponse),
            (AwaitingResponse | ToolConfirm, TurnEnded) => Some(Idle),
            _ => None,
        }
    }

    pub fn is_busy(self) -> bool {
        matches!(self, UiState::AwaitingResponse | UiState::ToolConfirm)
    }

    pub fn label(self) -> &'static str {
        match self {
            UiState::Idle => "ready",
            UiState::AwaitingResponse => "thinking",
            UiState::ModelSelect => "select-model",
            UiState::ToolConfirm => "confirm-tool",
        }
    }
}
