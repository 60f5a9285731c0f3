//! Typed simulation events with per-kind ring buffers.
//!
//! The engine emits events while a tick runs and hands them to listeners in
//! one batch once the tick has finished. Each kind has its own
//! [`EventBuffer`]; when a buffer is full the oldest event is dropped.
//!
//! Listeners are read-only. A presentation layer keeps its own lookup of
//! rendered handles in step with the grid by listening for
//! [`Event::NodePlaced`] and [`Event::NodeRemoved`].
//!
//! Suppressed kinds are never buffered and cost nothing.

use crate::grid::GridPosition;
use crate::id::NodeId;
use crate::item::ItemId;
use crate::node::StallReason;
use crate::sim::Ticks;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Something that happened in the simulation, stamped with its tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A neighbour accepted part of a node's output.
    FlowDelivered {
        from: GridPosition,
        to: GridPosition,
        item: ItemId,
        amount: f64,
        tick: Ticks,
    },
    /// Output was routed into the global pool.
    FlowDispersed {
        from: GridPosition,
        item: ItemId,
        amount: f64,
        tick: Ticks,
    },
    NodePlaced {
        node: NodeId,
        position: GridPosition,
        tick: Ticks,
    },
    NodeRemoved {
        node: NodeId,
        position: GridPosition,
        tick: Ticks,
    },
    /// A node went from producing (or new) to stalled.
    NodeStalled {
        node: NodeId,
        position: GridPosition,
        reason: StallReason,
        tick: Ticks,
    },
    /// A stalled node produced again.
    NodeResumed {
        node: NodeId,
        position: GridPosition,
        tick: Ticks,
    },
}

/// Discriminant tag for events, used for suppression and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FlowDelivered,
    FlowDispersed,
    NodePlaced,
    NodeRemoved,
    NodeStalled,
    NodeResumed,
}

const EVENT_KIND_COUNT: usize = 6;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::FlowDelivered { .. } => EventKind::FlowDelivered,
            Event::FlowDispersed { .. } => EventKind::FlowDispersed,
            Event::NodePlaced { .. } => EventKind::NodePlaced,
            Event::NodeRemoved { .. } => EventKind::NodeRemoved,
            Event::NodeStalled { .. } => EventKind::NodeStalled,
            Event::NodeResumed { .. } => EventKind::NodeResumed,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            Event::FlowDelivered { tick, .. }
            | Event::FlowDispersed { tick, .. }
            | Event::NodePlaced { tick, .. }
            | Event::NodeRemoved { tick, .. }
            | Event::NodeStalled { tick, .. }
            | Event::NodeResumed { tick, .. } => *tick,
        }
    }
}

impl EventKind {
    pub const ALL: [EventKind; EVENT_KIND_COUNT] = [
        EventKind::FlowDelivered,
        EventKind::FlowDispersed,
        EventKind::NodePlaced,
        EventKind::NodeRemoved,
        EventKind::NodeStalled,
        EventKind::NodeResumed,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// Fixed-capacity ring of events. Overwrites the oldest entry when full.
#[derive(Debug)]
pub struct EventBuffer {
    slots: Vec<Option<Event>>,
    /// Next write position.
    head: usize,
    len: usize,
    /// Events ever pushed, dropped ones included.
    total_written: u64,
    /// Events overwritten before they were read.
    dropped: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        let capacity = self.capacity();
        if self.len == capacity {
            self.dropped += 1;
        }
        self.slots[self.head] = Some(event);
        self.head = (self.head + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events lost to overwriting.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Oldest to newest.
    pub fn iter(&self) -> EventBufferIter<'_> {
        let start = if self.len < self.capacity() { 0 } else { self.head };
        EventBufferIter {
            buffer: self,
            index: start,
            remaining: self.len,
        }
    }

    /// Empty the ring. `total_written` and `dropped_count` are kept.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

/// Iterator over an [`EventBuffer`], oldest first.
pub struct EventBufferIter<'a> {
    buffer: &'a EventBuffer,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventBufferIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.buffer.slots[self.index].as_ref();
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventBufferIter<'_> {}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Read-only event callback.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// Predicate deciding whether a listener sees an event.
pub type EventFilter = Box<dyn Fn(&Event) -> bool>;

/// Lower priorities are called first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubscriberPriority {
    Pre = 0,
    Normal = 1,
    Post = 2,
}

struct ListenerEntry {
    listener: PassiveListener,
    priority: SubscriberPriority,
    filter: Option<EventFilter>,
    insertion_order: u64,
}

impl std::fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("priority", &self.priority)
            .field("filtered", &self.filter.is_some())
            .field("insertion_order", &self.insertion_order)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Buffers, listeners and suppression flags for every event kind.
pub struct EventBus {
    /// Allocated on the first emit of each kind.
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<ListenerEntry>; EVENT_KIND_COUNT],
    capacity: usize,
    next_insertion_order: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("listeners", &self.listeners)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// `capacity` is the ring size for each kind.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: std::array::from_fn(|_| Vec::new()),
            capacity,
            next_insertion_order: 0,
        }
    }

    /// Stop recording `kind`. Anything already buffered for it is discarded.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Buffer an event for the next delivery. No-op for suppressed kinds.
    pub fn emit(&mut self, event: Event) {
        let index = event.kind().index();
        if self.suppressed[index] {
            return;
        }
        let capacity = self.capacity;
        self.buffers[index]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Listen to `kind` with normal priority and no filter.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.on_passive_filtered(kind, SubscriberPriority::Normal, None, listener);
    }

    /// Listen to `kind` with an explicit priority and an optional filter.
    /// Listeners of equal priority run in registration order.
    pub fn on_passive_filtered(
        &mut self,
        kind: EventKind,
        priority: SubscriberPriority,
        filter: Option<EventFilter>,
        listener: PassiveListener,
    ) {
        let insertion_order = self.next_insertion_order;
        self.next_insertion_order += 1;
        let entries = &mut self.listeners[kind.index()];
        entries.push(ListenerEntry {
            listener,
            priority,
            filter,
            insertion_order,
        });
        entries.sort_by_key(|e| (e.priority, e.insertion_order));
    }

    /// Hand every buffered event to its listeners, then empty the buffers.
    ///
    /// Kinds are delivered in [`EventKind::ALL`] order; within a kind each
    /// listener sees the events oldest first.
    pub fn deliver(&mut self) {
        for kind in EventKind::ALL {
            let index = kind.index();
            let Some(buffer) = self.buffers[index].as_mut() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }
            let events: Vec<Event> = buffer.iter().cloned().collect();
            buffer.clear();

            for entry in &mut self.listeners[index] {
                for event in &events {
                    if let Some(filter) = &entry.filter
                        && !filter(event)
                    {
                        continue;
                    }
                    (entry.listener)(event);
                }
            }
        }
    }

    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    /// Events waiting for delivery.
    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffer(kind).map(EventBuffer::len).unwrap_or(0)
    }

    /// Events emitted for `kind` since it was first recorded, including
    /// delivered and dropped ones. Suppressing the kind discards its count.
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffer(kind)
            .map(EventBuffer::total_written)
            .unwrap_or(0)
    }

    /// Discard everything buffered. Listeners and suppression stay.
    pub fn clear_all(&mut self) {
        self.buffers
            .iter_mut()
            .flatten()
            .for_each(EventBuffer::clear);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
