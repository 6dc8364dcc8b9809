use crate::{Event, EventCore};

/// What a handler reports back.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum HandlerStatus {
    Normal,
    Error,
    /// No handler is installed for the event's kind.
    NoHandler,
}

/// Reacts to one event.
///
/// `core` gives access to the clock and the calendar, so a handler may
/// schedule follow-up events for later ticks.  Implemented for closures of
/// the matching shape.
pub trait EventHandler<P>: Send + Sync + 'static {
    fn handle(&self, event: &Event<P>, core: &EventCore<P>) -> HandlerStatus;
}

impl<P, F> EventHandler<P> for F
where
    F: Fn(&Event<P>, &EventCore<P>) -> HandlerStatus + Send + Sync + 'static,
{
    fn handle(&self, event: &Event<P>, core: &EventCore<P>) -> HandlerStatus {
        self(event, core)
    }
}
