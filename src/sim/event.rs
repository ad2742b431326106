use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use serde_json::{json, Value};

use super::Universe;
use crate::error::Result;
use crate::math::JulianDate;

/// Type name of the built-in gimbal retargeting event.
pub const TRACK_OBJECT: &str = "trackObject";

/// Callback run when an event fires. Mutations are visible to every later
/// handler in the same drain.
pub type EventHandler = Box<dyn FnMut(&mut Universe, &Event) -> Result<()>>;

/// Identifier handed out by [`EventQueue::add`], monotonic per queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Scheduled events
// ---------------------------------------------------------------------------

/// A mutation of the scene due at a simulation time.
pub struct Event {
    pub time: JulianDate,
    pub kind: String,
    pub data: Value,
    /// Overrides the handler registered for `kind`.
    pub handler: Option<EventHandler>,
}

impl Event {
    pub fn new(time: JulianDate, kind: &str, data: Value) -> Self {
        Self { time, kind: kind.to_string(), data, handler: None }
    }

    pub fn with_handler(mut self, handler: EventHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Point `observer`'s gimbal at `target`; `None` stops tracking.
    pub fn track_object(time: JulianDate, observer: &str, target: Option<&str>) -> Self {
        Self::new(time, TRACK_OBJECT, json!({ "observer": observer, "target": target }))
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("time", &self.time)
            .field("kind", &self.kind)
            .field("data", &self.data)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

struct Queued {
    id: EventId,
    event: Event,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    /// Time first, insertion order on ties.
    fn cmp(&self, other: &Self) -> Ordering {
        self.event
            .time
            .total_cmp(&other.event.time)
            .then_with(|| self.id.cmp(&other.id))
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// Min-heap of pending events plus the per-type handler table.
#[derive(Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<Queued>>,
    handlers: HashMap<String, EventHandler>,
    next_id: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: Event) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Queued { id, event }));
        id
    }

    /// Earliest event due at or before `now`.
    pub fn pop_due(&mut self, now: &JulianDate) -> Option<(EventId, Event)> {
        let due = self
            .heap
            .peek()
            .is_some_and(|Reverse(q)| q.event.time.total_cmp(now) != Ordering::Greater);
        if !due {
            return None;
        }
        self.heap.pop().map(|Reverse(q)| (q.id, q.event))
    }

    pub fn next_time(&self) -> Option<JulianDate> {
        self.heap.peek().map(|Reverse(q)| q.event.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the handler previously registered for `kind`.
    pub fn register_handler(&mut self, kind: &str, handler: EventHandler) -> Option<EventHandler> {
        self.handlers.insert(kind.to_string(), handler)
    }

    pub fn has_handler(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    pub(crate) fn take_handler(&mut self, kind: &str) -> Option<EventHandler> {
        self.handlers.remove(kind)
    }

    /// Put a handler back after dispatch unless it was replaced meanwhile.
    pub(crate) fn restore_handler(&mut self, kind: &str, handler: EventHandler) {
        self.handlers.entry(kind.to_string()).or_insert(handler);
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&String> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("EventQueue")
            .field("pending", &self.heap.len())
            .field("handlers", &kinds)
            .finish()
    }
}
