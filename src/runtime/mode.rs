use super::context::RuntimeContext;
use super::event::TurnEvent;
use super::frontend::UserInputEvent;

pub trait RuntimeMode {
    fn on_user_input(&mut self, event: UserInputEvent, ctx: &mut RuntimeContext<'_>);
    fn on_turn_event(&mut self, event: TurnEvent, ctx: &mut RuntimeContext<'_>);
    fn is_turn_in_progress(&self) -> bool;
    fn quit_requested(&self) -> bool {
        false
    }
}
