use std::fmt;
use std::sync::Arc;

/// Event type tag.  Cheap to clone; hashed to find the handler.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKind(Arc<str>);

impl EventKind {
    pub fn new(kind: impl AsRef<str>) -> Self {
        Self(Arc::from(kind.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for EventKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

impl From<String> for EventKind {
    fn from(kind: String) -> Self {
        Self(Arc::from(kind))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKind({:?})", &*self.0)
    }
}

/// A typed unit of work: the kind selects the handler, the payload is opaque
/// to the manager.
#[derive(Clone, Debug, PartialEq)]
pub struct Event<P> {
    pub kind:    EventKind,
    pub payload: P,
}

impl<P> Event<P> {
    pub fn new(kind: impl Into<EventKind>, payload: P) -> Self {
        Self { kind: kind.into(), payload }
    }
}
