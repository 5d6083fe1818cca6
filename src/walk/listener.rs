use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::parser::ast::Node;
use crate::walk::context::VisitorCtx;
use crate::walk::event::Event;
use crate::walk::{VisitKey, WalkError};

/// The callback a listener runs when its event fires
pub type Handler<'a> =
    dyn Fn(Node<'_>, &VisitKey, &mut VisitorCtx<'_>) -> Result<(), WalkError> + 'a;

/// A named handler, the id is what [`ListenerRegistry::remove`] matches on
#[derive(Clone)]
pub struct Listener<'a> {
    pub id: String,
    pub handle: Rc<Handler<'a>>,
}

impl<'a> Listener<'a> {
    pub fn new<F>(id: impl Into<String>, handle: F) -> Self
    where
        F: Fn(Node<'_>, &VisitKey, &mut VisitorCtx<'_>) -> Result<(), WalkError> + 'a,
    {
        Self {
            id: id.into(),
            handle: Rc::new(handle),
        }
    }
}

impl fmt::Debug for Listener<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}

/// Maps each event to its listeners in subscription order.
///
/// Ids are unique per event. Adding a listener whose id is already subscribed
/// to that event replaces the old handler in place, so it keeps its position.
#[derive(Debug, Default, Clone)]
pub struct ListenerRegistry<'a> {
    listeners: HashMap<Event, Vec<Listener<'a>>>,
}

impl<'a> ListenerRegistry<'a> {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }

    pub fn add(&mut self, event: Event, listener: Listener<'a>) {
        let entries = self.listeners.entry(event).or_default();
        match entries.iter_mut().find(|l| l.id == listener.id) {
            Some(existing) => *existing = listener,
            None => entries.push(listener),
        }
    }

    /// Unsubscribes `id` from `event`, returns whether anything was removed
    pub fn remove(&mut self, event: Event, id: &str) -> bool {
        let Some(entries) = self.listeners.get_mut(&event) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|l| l.id != id);
        let removed = entries.len() != before;

        if entries.is_empty() {
            self.listeners.remove(&event);
        }
        removed
    }

    /// A snapshot of the listeners for `event`, in the order they will run
    pub fn listeners_for(&self, event: Event) -> Vec<Listener<'a>> {
        self.listeners.get(&event).cloned().unwrap_or_default()
    }

    /// total number of subscriptions across all events
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
