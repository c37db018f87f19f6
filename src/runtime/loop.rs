use super::context::RuntimeContext;
use super::event::TurnEvent;
use super::frontend::FrontendAdapter;
use super::mode::RuntimeMode;
use tokio::sync::mpsc;

/// The UI loop. It never waits on the engine: each tick polls input, drains
/// whatever turn events are queued, then redraws.
pub struct Runtime<M: RuntimeMode> {
    pub mode: M,
    events_rx: mpsc::Receiver<TurnEvent>,
}

impl<M: RuntimeMode> Runtime<M> {
    pub fn new(mode: M, events_rx: mpsc::Receiver<TurnEvent>) -> Self {
        Self { mode, events_rx }
    }

    pub async fn run<F: FrontendAdapter<M>>(
        &mut self,
        frontend: &mut F,
        ctx: &mut RuntimeContext<'_>,
    ) {
        frontend.render(&self.mode);
        while !frontend.should_quit() && !self.mode.quit_requested() {
            if let Some(event) = frontend.poll_user_input(&self.mode) {
                self.mode.on_user_input(event, ctx);
            }
            self.drain_events(ctx);
            frontend.render(&self.mode);
            tokio::task::yield_now().await;
        }
        ctx.cancel_turn();
    }

    /// Hands every queued turn event to the mode. Returns how many were seen.
    pub fn drain_events(&mut self, ctx: &mut RuntimeContext<'_>) -> usize {
        let mut drained = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.mode.on_turn_event(event, ctx);
            drained += 1;
        }
        drained
    }
}
