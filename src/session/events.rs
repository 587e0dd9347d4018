//! Synchronous session event bus
//!
//! `publish` runs every live handler in subscription order before it returns.
//! Nothing is buffered: a handler attached later must ask the session for a
//! fresh snapshot.

use std::cell::Cell;
use std::rc::Rc;

use super::details::GameDetails;

/// Session event
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    NewGame,
    ScoreUpdate(GameDetails),
    GameOver(GameDetails),
}

impl GameEvent {
    /// Snapshot carried by the event, if any
    pub fn details(&self) -> Option<&GameDetails> {
        match self {
            GameEvent::NewGame => None,
            GameEvent::ScoreUpdate(details) | GameEvent::GameOver(details) => Some(details),
        }
    }
}

/// Handle to a bus subscription. Clones refer to the same subscription.
#[derive(Debug, Clone)]
pub struct Subscription {
    active: Rc<Cell<bool>>,
}

impl Subscription {
    /// Stop delivery. Takes effect before the next handler call, even one
    /// later in the publish pass that is currently running.
    pub fn cancel(&self) {
        self.active.set(false);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

struct Subscriber {
    active: Rc<Cell<bool>>,
    handler: Box<dyn FnMut(&GameEvent)>,
}

/// Ordered, single-threaded fan-out of [`GameEvent`]s
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler; it sees every event published from now on
    pub fn subscribe<F>(&mut self, handler: F) -> Subscription
    where
        F: FnMut(&GameEvent) + 'static,
    {
        let active = Rc::new(Cell::new(true));
        self.subscribers.push(Subscriber {
            active: Rc::clone(&active),
            handler: Box::new(handler),
        });
        Subscription { active }
    }

    /// Deliver `event` to every live handler, in subscription order
    pub fn publish(&mut self, event: &GameEvent) {
        for subscriber in self.subscribers.iter_mut() {
            if subscriber.active.get() {
                (subscriber.handler)(event);
            }
        }
        self.subscribers.retain(|s| s.active.get());
    }

    /// Number of handlers still attached
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.iter().filter(|s| s.active.get()).count()
    }
}
