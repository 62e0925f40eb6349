//! Event types and the event queue
//!
//! The queue multiplexes every event source (display, keyboard, mouse and the
//! logic timer) into one FIFO drained by the application loop.

use std::collections::VecDeque;

use crate::input::{Key, MouseButton};

/// Events delivered to the application loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// The logic timer ticked
    Timer {
        /// Total ticks emitted by the timer so far
        count: u64,
    },

    /// A key was pressed
    KeyDown(Key),

    /// A key was released
    KeyUp(Key),

    /// The pointer moved
    MouseMoved {
        /// New X coordinate in window pixels
        x: f64,
        /// New Y coordinate in window pixels
        y: f64,
    },

    /// A mouse button was pressed
    MouseButtonDown(MouseButton),

    /// A mouse button was released
    MouseButtonUp(MouseButton),

    /// The mouse wheel scrolled
    MouseWheel {
        /// Horizontal scroll delta
        dx: f64,
        /// Vertical scroll delta
        dy: f64,
    },

    /// The display was resized
    DisplayResize {
        /// New client width
        width: u32,
        /// New client height
        height: u32,
    },

    /// The user asked to close the display
    DisplayClose,
}

/// FIFO of pending events
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Take the oldest event without blocking
    pub fn next_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Look at the oldest event without removing it
    pub fn peek(&self) -> Option<&Event> {
        self.events.front()
    }

    /// Whether no events are pending
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Drop all pending events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Extend<Event> for EventQueue {
    fn extend<T: IntoIterator<Item = Event>>(&mut self, iter: T) {
        self.events.extend(iter);
    }
}
