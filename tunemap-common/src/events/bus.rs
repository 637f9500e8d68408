//! Synchronous event bus
//!
//! Single-threaded publish/subscribe: `publish` runs every handler registered
//! for the event's kind, in subscription order, before it returns. There is
//! no queue, no priority and no cancellation.
//!
//! Handlers may publish from inside a dispatch, but only event kinds that are
//! not already being dispatched. A publish that would re-enter an in-flight
//! kind is rejected with [`BusError::Cycle`] and reaches no handler, which
//! bounds dispatch depth by the number of event kinds.

use super::{DashEvent, EventKind};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};

type Handler = Rc<dyn Fn(&DashEvent)>;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A handler tried to publish a kind that is still being dispatched
    #[error("cyclic publish of {0:?} rejected while it is being dispatched")]
    Cycle(EventKind),
}

/// Central event distribution for the dashboard views
#[derive(Default)]
pub struct EventBus {
    handlers: RefCell<Vec<(SubscriptionId, EventKind, Handler)>>,
    next_id: Cell<u64>,
    in_flight: RefCell<Vec<EventKind>>,
}

/// Pops the in-flight kind even if a handler panics
struct DispatchGuard<'a> {
    in_flight: &'a RefCell<Vec<EventKind>>,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.borrow_mut().pop();
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind
    ///
    /// Subscribing from inside a handler takes effect from the next publish.
    pub fn subscribe(&self, kind: EventKind, handler: impl Fn(&DashEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.handlers.borrow_mut().push((id, kind, Rc::new(handler)));
        id
    }

    /// Remove a handler; returns false if it was not registered
    ///
    /// Unsubscribing from inside a handler takes effect from the next publish:
    /// a dispatch already under way still reaches the removed handler.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(sid, _, _)| *sid != id);
        handlers.len() != before
    }

    /// Deliver an event to every handler of its kind, in subscription order
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&self, event: DashEvent) -> Result<usize, BusError> {
        let kind = event.kind();
        if self.in_flight.borrow().contains(&kind) {
            warn!("Rejected cyclic publish of {} during its own dispatch", event.event_type());
            return Err(BusError::Cycle(kind));
        }

        // Snapshot so handlers can (un)subscribe without holding the borrow
        let targets: Vec<Handler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Rc::clone(h))
            .collect();

        self.in_flight.borrow_mut().push(kind);
        let _guard = DispatchGuard {
            in_flight: &self.in_flight,
        };

        debug!("Dispatching {} to {} handler(s)", event.event_type(), targets.len());
        for handler in &targets {
            handler(&event);
        }
        Ok(targets.len())
    }

    /// Number of handlers registered for a kind
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    /// Whether a publish is currently running
    pub fn is_dispatching(&self) -> bool {
        !self.in_flight.borrow().is_empty()
    }
}
