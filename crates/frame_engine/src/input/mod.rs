//! Input state tracking
//!
//! The loop feeds keyboard and mouse events into [`InputState`]; logic steps
//! read the resulting pressed-key table instead of raw events.

use std::collections::HashSet;

use crate::events::Event;

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// Top-row 0
    Num0,
    /// Top-row 1
    Num1,
    /// Top-row 2
    Num2,
    /// Top-row 3
    Num3,
    /// Top-row 4
    Num4,
    /// Top-row 5
    Num5,
    /// Top-row 6
    Num6,
    /// Top-row 7
    Num7,
    /// Top-row 8
    Num8,
    /// Top-row 9
    Num9,
    /// Space key
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Tab key
    Tab,
    /// Backspace key
    Backspace,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Either shift key
    Shift,
    /// Either control key
    Control,
    /// Either alt key
    Alt,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

/// Pressed-key table
#[derive(Debug, Default, Clone)]
pub struct KeyboardState {
    pressed: HashSet<Key>,
}

impl KeyboardState {
    /// Create a table with no keys held
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as held or released
    pub fn set(&mut self, key: Key, down: bool) {
        if down {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    /// Whether `key` is currently held
    pub fn is_down(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Number of keys currently held
    pub fn held_count(&self) -> usize {
        self.pressed.len()
    }

    /// Release every key
    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}

/// Pointer position, held buttons and accumulated wheel motion
#[derive(Debug, Default, Clone)]
pub struct MouseState {
    /// Last known pointer position
    pub position: (f64, f64),
    /// Accumulated wheel motion
    pub wheel: (f64, f64),
    buttons: HashSet<MouseButton>,
}

impl MouseState {
    /// Whether `button` is currently held
    pub fn is_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }
}

/// Everything a logic step may read about the user's input
#[derive(Debug, Default, Clone)]
pub struct InputState {
    /// Keyboard table
    pub keyboard: KeyboardState,
    /// Mouse state
    pub mouse: MouseState,
}

impl InputState {
    /// Create an empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from an input event
    ///
    /// Returns `true` if the event was an input event.
    pub fn apply(&mut self, event: &Event) -> bool {
        match *event {
            Event::KeyDown(key) => self.keyboard.set(key, true),
            Event::KeyUp(key) => self.keyboard.set(key, false),
            Event::MouseMoved { x, y } => self.mouse.position = (x, y),
            Event::MouseButtonDown(button) => {
                self.mouse.buttons.insert(button);
            }
            Event::MouseButtonUp(button) => {
                self.mouse.buttons.remove(&button);
            }
            Event::MouseWheel { dx, dy } => {
                self.mouse.wheel.0 += dx;
                self.mouse.wheel.1 += dy;
            }
            Event::Timer { .. } | Event::DisplayResize { .. } | Event::DisplayClose => return false,
        }
        true
    }

    /// Forget held keys and buttons
    pub fn reset(&mut self) {
        self.keyboard.clear();
        self.mouse = MouseState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_table_follows_events() {
        let mut input = InputState::new();
        assert!(input.apply(&Event::KeyDown(Key::Num2)));
        assert!(input.keyboard.is_down(Key::Num2));

        input.apply(&Event::KeyDown(Key::Escape));
        assert_eq!(input.keyboard.held_count(), 2);

        input.apply(&Event::KeyUp(Key::Num2));
        assert!(!input.keyboard.is_down(Key::Num2));
        assert!(input.keyboard.is_down(Key::Escape));
    }

    #[test]
    fn test_non_input_events_ignored() {
        let mut input = InputState::new();
        assert!(!input.apply(&Event::Timer { count: 1 }));
        assert!(!input.apply(&Event::DisplayClose));
        assert_eq!(input.keyboard.held_count(), 0);
    }

    #[test]
    fn test_mouse_tracking() {
        let mut input = InputState::new();
        input.apply(&Event::MouseMoved { x: 10.0, y: 20.0 });
        input.apply(&Event::MouseButtonDown(MouseButton::Left));
        input.apply(&Event::MouseWheel { dx: 0.0, dy: 1.0 });
        input.apply(&Event::MouseWheel { dx: 0.0, dy: 2.0 });

        assert_eq!(input.mouse.position, (10.0, 20.0));
        assert!(input.mouse.is_down(MouseButton::Left));
        assert_eq!(input.mouse.wheel, (0.0, 3.0));

        input.apply(&Event::MouseButtonUp(MouseButton::Left));
        assert!(!input.mouse.is_down(MouseButton::Left));

        input.reset();
        assert_eq!(input.mouse.position, (0.0, 0.0));
    }
}
