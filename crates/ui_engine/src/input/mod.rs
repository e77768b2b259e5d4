//! Input state snapshot
//!
//! The windowing backend writes one [`InputState`] per frame; everything in
//! the UI core only reads it. Positions are window pixels with the origin at
//! the top-left, exactly as cursor APIs report them. Widgets that need a
//! bottom-left origin flip `mouse_y` against the window height.

pub mod collision;

use bitflags::bitflags;

use crate::foundation::math::Vec2;

/// Number of key codes tracked (matches GLFW's `GLFW_KEY_LAST + 1`)
pub const KEY_COUNT: usize = 349;

bitflags! {
    /// Mouse buttons currently held down
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButtons: u8 {
        /// Left mouse button
        const LEFT = 1 << 0;
        /// Right mouse button
        const RIGHT = 1 << 1;
        /// Middle mouse button
        const MIDDLE = 1 << 2;
    }
}

/// Read-only per-frame view of window and input devices
#[derive(Debug, Clone)]
pub struct InputState {
    window_width: f32,
    window_height: f32,
    mouse_x: f32,
    mouse_y: f32,
    mouse_prev_x: f32,
    mouse_prev_y: f32,
    buttons: MouseButtons,
    keys: [bool; KEY_COUNT],
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            window_width: 800.0,
            window_height: 600.0,
            mouse_x: 0.0,
            mouse_y: 0.0,
            mouse_prev_x: 0.0,
            mouse_prev_y: 0.0,
            buttons: MouseButtons::empty(),
            keys: [false; KEY_COUNT],
        }
    }
}

impl InputState {
    /// Snapshot for a window of the given size
    pub fn new(window_width: f32, window_height: f32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    /// Update the window size (call from the resize callback)
    pub fn set_window_size(&mut self, width: f32, height: f32) {
        self.window_width = width;
        self.window_height = height;
    }

    /// Record a new cursor position, keeping the previous one for deltas
    pub fn update_mouse(&mut self, x: f32, y: f32) {
        self.mouse_prev_x = self.mouse_x;
        self.mouse_prev_y = self.mouse_y;
        self.mouse_x = x;
        self.mouse_y = y;
    }

    /// Update a mouse button state
    pub fn set_mouse_button(&mut self, button: MouseButtons, pressed: bool) {
        self.buttons.set(button, pressed);
    }

    /// Update a key state; out-of-range key codes are ignored
    pub fn set_key(&mut self, key: usize, pressed: bool) {
        if let Some(slot) = self.keys.get_mut(key) {
            *slot = pressed;
        }
    }

    /// Window width in pixels
    pub const fn window_width(&self) -> f32 {
        self.window_width
    }

    /// Window height in pixels
    pub const fn window_height(&self) -> f32 {
        self.window_height
    }

    /// Window size as a vector
    pub fn screen_size(&self) -> Vec2 {
        Vec2::new(self.window_width, self.window_height)
    }

    /// Cursor position (top-left origin)
    pub fn mouse_position(&self) -> Vec2 {
        Vec2::new(self.mouse_x, self.mouse_y)
    }

    /// Cursor position with the origin moved to the bottom-left
    pub fn mouse_position_bottom_left(&self) -> Vec2 {
        Vec2::new(self.mouse_x, self.window_height - self.mouse_y)
    }

    /// Cursor movement since the previous update
    pub fn mouse_delta(&self) -> Vec2 {
        Vec2::new(self.mouse_x - self.mouse_prev_x, self.mouse_y - self.mouse_prev_y)
    }

    /// Mouse buttons currently held
    pub const fn buttons(&self) -> MouseButtons {
        self.buttons
    }

    /// Whether a mouse button is held
    pub const fn is_mouse_pressed(&self, button: MouseButtons) -> bool {
        self.buttons.contains(button)
    }

    /// Whether a key is held; out-of-range key codes read as released
    pub fn is_key_pressed(&self, key: usize) -> bool {
        self.keys.get(key).copied().unwrap_or(false)
    }

    /// Key codes currently held, in ascending order
    pub fn pressed_keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.keys
            .iter()
            .enumerate()
            .filter_map(|(code, pressed)| pressed.then_some(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_delta_tracks_previous_position() {
        let mut input = InputState::default();
        input.update_mouse(10.0, 20.0);
        input.update_mouse(15.0, 12.0);
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, -8.0));
    }

    #[test]
    fn test_bottom_left_mouse_flips_y() {
        let mut input = InputState::new(800.0, 600.0);
        input.update_mouse(100.0, 150.0);
        assert_eq!(input.mouse_position_bottom_left(), Vec2::new(100.0, 450.0));
    }

    #[test]
    fn test_keys_out_of_range_are_ignored() {
        let mut input = InputState::default();
        input.set_key(65, true);
        input.set_key(KEY_COUNT + 10, true);
        assert!(input.is_key_pressed(65));
        assert!(!input.is_key_pressed(KEY_COUNT + 10));
        assert_eq!(input.pressed_keys().collect::<Vec<_>>(), vec![65]);
    }

    #[test]
    fn test_mouse_buttons_combine() {
        let mut input = InputState::default();
        input.set_mouse_button(MouseButtons::LEFT, true);
        input.set_mouse_button(MouseButtons::RIGHT, true);
        input.set_mouse_button(MouseButtons::RIGHT, false);
        assert!(input.is_mouse_pressed(MouseButtons::LEFT));
        assert!(!input.is_mouse_pressed(MouseButtons::RIGHT));
    }
}
