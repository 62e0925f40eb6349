//! Window-less display for tests and offscreen runs
//!
//! Events come from a script of batches, one batch per pump. Presented frames
//! are counted and optionally captured; a [`HeadlessProbe`] keeps access to
//! that record after the display has been handed to the engine.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{Display, DisplayError};
use crate::events::{Event, EventQueue};
use crate::render::Bitmap;

#[derive(Debug, Default)]
struct ProbeState {
    presented: usize,
    pumps: usize,
    resizes_acknowledged: usize,
    capture: bool,
    last_frame: Option<Bitmap>,
    released: bool,
}

/// Shared view of what a [`HeadlessDisplay`] has done
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    state: Rc<RefCell<ProbeState>>,
}

impl HeadlessProbe {
    /// Frames presented so far
    pub fn presented_frames(&self) -> usize {
        self.state.borrow().presented
    }

    /// Times events were pumped
    pub fn pumps(&self) -> usize {
        self.state.borrow().pumps
    }

    /// Resize acknowledgements received
    pub fn resizes_acknowledged(&self) -> usize {
        self.state.borrow().resizes_acknowledged
    }

    /// Copy of the most recent frame, when capture is enabled
    pub fn last_frame(&self) -> Option<Bitmap> {
        self.state.borrow().last_frame.clone()
    }

    /// Whether the display has been dropped
    pub fn is_released(&self) -> bool {
        self.state.borrow().released
    }
}

/// Scripted display with no window
pub struct HeadlessDisplay {
    title: String,
    size: (u32, u32),
    pending_size: Option<(u32, u32)>,
    script: VecDeque<Vec<Event>>,
    frame_limit: Option<usize>,
    close_sent: bool,
    state: Rc<RefCell<ProbeState>>,
}

impl HeadlessDisplay {
    /// Create a display of the given size with an empty script
    pub fn new(title: &str, width: u32, height: u32) -> Self {
        Self {
            title: title.to_string(),
            size: (width, height),
            pending_size: None,
            script: VecDeque::new(),
            frame_limit: None,
            close_sent: false,
            state: Rc::new(RefCell::new(ProbeState::default())),
        }
    }

    /// Queue a batch of events delivered by one pump
    #[must_use]
    pub fn with_batch(mut self, events: Vec<Event>) -> Self {
        self.script.push_back(events);
        self
    }

    /// Deliver nothing for `pumps` pumps
    #[must_use]
    pub fn with_idle_pumps(mut self, pumps: usize) -> Self {
        self.script.extend(std::iter::repeat_with(Vec::new).take(pumps));
        self
    }

    /// Emit `DisplayClose` once `frames` frames have been presented
    #[must_use]
    pub fn with_frame_limit(mut self, frames: usize) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Keep a copy of the last presented frame
    #[must_use]
    pub fn with_capture(self) -> Self {
        self.state.borrow_mut().capture = true;
        self
    }

    /// Handle for inspecting the display after it has been moved
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Rc::clone(&self.state),
        }
    }
}

impl Display for HeadlessDisplay {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn pump_events(&mut self, queue: &mut EventQueue) {
        self.state.borrow_mut().pumps += 1;

        if let Some(batch) = self.script.pop_front() {
            for event in batch {
                if let Event::DisplayResize { width, height } = event {
                    self.pending_size = Some((width, height));
                }
                queue.push(event);
            }
        }

        let presented = self.state.borrow().presented;
        if let Some(limit) = self.frame_limit {
            if presented >= limit && !self.close_sent {
                self.close_sent = true;
                queue.push(Event::DisplayClose);
            }
        }
    }

    fn acknowledge_resize(&mut self) {
        if let Some(size) = self.pending_size.take() {
            self.size = size;
        }
        self.state.borrow_mut().resizes_acknowledged += 1;
    }

    fn present(&mut self, frame: &Bitmap) -> Result<(), DisplayError> {
        let mut state = self.state.borrow_mut();
        state.presented += 1;
        if state.capture {
            state.last_frame = Some(frame.clone());
        }
        Ok(())
    }
}

impl Drop for HeadlessDisplay {
    fn drop(&mut self) {
        self.state.borrow_mut().released = true;
    }
}
