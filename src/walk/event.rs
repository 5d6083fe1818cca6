use std::fmt;

use crate::parser::ast::NodeKind;

/// When an event fires relative to the node's children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// before any child is visited
    Before,
    /// after every child subtree has been visited
    After,
}

/// A `(node kind, phase)` pair, the key listeners subscribe under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Event {
    pub kind: NodeKind,
    pub phase: Phase,
}

impl Event {
    pub const fn before(kind: NodeKind) -> Self {
        Self {
            kind,
            phase: Phase::Before,
        }
    }

    pub const fn after(kind: NodeKind) -> Self {
        Self {
            kind,
            phase: Phase::After,
        }
    }

    /// Every event the walker can fire
    pub fn all() -> impl Iterator<Item = Event> {
        NodeKind::ALL
            .into_iter()
            .flat_map(|kind| [Event::before(kind), Event::after(kind)])
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            Phase::Before => "BEFORE",
            Phase::After => "AFTER",
        };
        write!(f, "{}_{}", self.kind, phase)
    }
}
