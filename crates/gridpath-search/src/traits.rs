use std::sync::mpsc::Sender;

use crate::event::SearchEvent;

/// Receiver of engine observations.
pub trait EventSink {
    fn emit(&mut self, event: SearchEvent);
}

/// Collects events in order; handy for synchronous callers and tests.
impl EventSink for Vec<SearchEvent> {
    fn emit(&mut self, event: SearchEvent) {
        self.push(event);
    }
}

/// Forwards events to another thread. A hung-up receiver is not an error:
/// nobody is rendering any more.
impl EventSink for Sender<SearchEvent> {
    fn emit(&mut self, event: SearchEvent) {
        self.send(event).ok();
    }
}

/// Discards every event.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: SearchEvent) {}
}
