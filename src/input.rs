// input.rs - collects window events between frames into one poll result

use crate::orientation::{PixelPos, RotationKey};
use std::collections::HashSet;
use winit::event::{ElementState, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent};

/// Snapshot of the input state for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Held rotation keys, indexed by [`RotationKey::index`].
    pub keys: [bool; 6],
    pub mouse_down: bool,
    pub position: PixelPos,
    /// Pointer movement since the previous poll.
    pub delta: (i32, i32),
    pub quit: bool,
    pub toggle_hud: bool,
}

impl FrameInput {
    pub fn is_held(&self, key: RotationKey) -> bool {
        self.keys[key.index()]
    }
}

pub fn rotation_key(code: VirtualKeyCode) -> Option<RotationKey> {
    match code {
        VirtualKeyCode::A | VirtualKeyCode::Left => Some(RotationKey::YawLeft),
        VirtualKeyCode::D | VirtualKeyCode::Right => Some(RotationKey::YawRight),
        VirtualKeyCode::S | VirtualKeyCode::Down => Some(RotationKey::PitchDown),
        VirtualKeyCode::W | VirtualKeyCode::Up => Some(RotationKey::PitchUp),
        VirtualKeyCode::Q => Some(RotationKey::RollLeft),
        VirtualKeyCode::E => Some(RotationKey::RollRight),
        _ => None,
    }
}

/// Events that end or track an interaction already in progress. They still
/// reach [`InputState`] when the HUD consumes them, so a drag released over
/// the HUD does not stay held.
pub fn must_reach_input(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::CloseRequested
        | WindowEvent::CursorMoved { .. }
        | WindowEvent::Focused(_) => true,
        WindowEvent::MouseInput { state, .. } => *state == ElementState::Released,
        WindowEvent::KeyboardInput { input, .. } => input.state == ElementState::Released,
        _ => false,
    }
}

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<VirtualKeyCode>,
    mouse_down: bool,
    position: PixelPos,
    polled_position: PixelPos,
    quit: bool,
    toggle_hud: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one window event. Returns true when the event was relevant.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => {
                self.quit = true;
                true
            }
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state,
                        virtual_keycode: Some(code),
                        ..
                    },
                ..
            } => {
                self.key(*code, *state == ElementState::Pressed);
                true
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.set_mouse_down(*state == ElementState::Pressed);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x, position.y);
                true
            }
            WindowEvent::Focused(false) => {
                // key releases are lost while unfocused
                self.held.clear();
                self.mouse_down = false;
                true
            }
            _ => false,
        }
    }

    pub fn key(&mut self, code: VirtualKeyCode, pressed: bool) {
        if pressed {
            match code {
                VirtualKeyCode::Escape => self.quit = true,
                VirtualKeyCode::F1 if !self.held.contains(&code) => self.toggle_hud = true,
                _ => {}
            }
            self.held.insert(code);
        } else {
            self.held.remove(&code);
        }
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        self.position = PixelPos::new(x as i32, y as i32);
    }

    pub fn set_mouse_down(&mut self, down: bool) {
        self.mouse_down = down;
    }

    /// Takes the state for this frame and starts the next one.
    pub fn take_frame(&mut self) -> FrameInput {
        let mut keys = [false; 6];
        for code in &self.held {
            if let Some(key) = rotation_key(*code) {
                keys[key.index()] = true;
            }
        }
        let delta = (
            self.position.x - self.polled_position.x,
            self.position.y - self.polled_position.y,
        );
        self.polled_position = self.position;

        FrameInput {
            keys,
            mouse_down: self.mouse_down,
            position: self.position,
            delta,
            quit: self.quit,
            toggle_hud: std::mem::take(&mut self.toggle_hud),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_letters_map_to_the_same_keys() {
        assert_eq!(rotation_key(VirtualKeyCode::A), rotation_key(VirtualKeyCode::Left));
        assert_eq!(rotation_key(VirtualKeyCode::W), Some(RotationKey::PitchUp));
        assert_eq!(rotation_key(VirtualKeyCode::Q), Some(RotationKey::RollLeft));
        assert_eq!(rotation_key(VirtualKeyCode::Space), None);
    }

    #[test]
    fn held_keys_persist_across_frames() {
        let mut input = InputState::new();
        input.key(VirtualKeyCode::Left, true);
        input.key(VirtualKeyCode::E, true);
        for _ in 0..3 {
            let frame = input.take_frame();
            assert!(frame.is_held(RotationKey::YawLeft));
            assert!(frame.is_held(RotationKey::RollRight));
            assert!(!frame.is_held(RotationKey::YawRight));
        }
        input.key(VirtualKeyCode::Left, false);
        assert!(!input.take_frame().is_held(RotationKey::YawLeft));
    }

    #[test]
    fn delta_is_relative_to_previous_poll() {
        let mut input = InputState::new();
        input.cursor_moved(100.0, 50.0);
        input.take_frame();

        input.cursor_moved(110.7, 40.2);
        input.cursor_moved(130.0, 45.0);
        let frame = input.take_frame();
        assert_eq!(frame.position, PixelPos::new(130, 45));
        assert_eq!(frame.delta, (30, -5));

        assert_eq!(input.take_frame().delta, (0, 0));
    }

    #[test]
    fn escape_quits() {
        let mut input = InputState::new();
        assert!(!input.take_frame().quit);
        input.key(VirtualKeyCode::Escape, true);
        assert!(input.take_frame().quit);
    }

    #[test]
    fn hud_toggle_fires_once_per_press() {
        let mut input = InputState::new();
        input.key(VirtualKeyCode::F1, true);
        // key repeat
        input.key(VirtualKeyCode::F1, true);
        assert!(input.take_frame().toggle_hud);
        assert!(!input.take_frame().toggle_hud);
        input.key(VirtualKeyCode::F1, false);
        input.key(VirtualKeyCode::F1, true);
        assert!(input.take_frame().toggle_hud);
    }

    #[test]
    fn mouse_button_state() {
        let mut input = InputState::new();
        input.set_mouse_down(true);
        assert!(input.take_frame().mouse_down);
        input.set_mouse_down(false);
        assert!(!input.take_frame().mouse_down);
    }

    #[allow(deprecated)]
    fn left_button(state: ElementState) -> WindowEvent<'static> {
        WindowEvent::MouseInput {
            device_id: unsafe { winit::event::DeviceId::dummy() },
            state,
            button: MouseButton::Left,
            modifiers: Default::default(),
        }
    }

    #[allow(deprecated)]
    fn cursor_at(x: f64, y: f64) -> WindowEvent<'static> {
        WindowEvent::CursorMoved {
            device_id: unsafe { winit::event::DeviceId::dummy() },
            position: winit::dpi::PhysicalPosition::new(x, y),
            modifiers: Default::default(),
        }
    }

    #[test]
    fn release_after_press_ends_the_drag() {
        let mut input = InputState::new();
        assert!(input.handle_window_event(&left_button(ElementState::Pressed)));
        assert!(input.take_frame().mouse_down);

        input.handle_window_event(&cursor_at(40.0, 60.0));
        assert!(input.handle_window_event(&left_button(ElementState::Released)));
        let frame = input.take_frame();
        assert!(!frame.mouse_down);
        assert_eq!(frame.position, PixelPos::new(40, 60));
    }

    #[test]
    fn hud_cannot_swallow_drag_endings() {
        assert!(must_reach_input(&left_button(ElementState::Released)));
        assert!(must_reach_input(&cursor_at(1.0, 2.0)));
        assert!(must_reach_input(&WindowEvent::Focused(false)));
        assert!(must_reach_input(&WindowEvent::CloseRequested));
        assert!(!must_reach_input(&left_button(ElementState::Pressed)));
    }

    #[test]
    fn close_request_quits() {
        let mut input = InputState::new();
        assert!(input.handle_window_event(&WindowEvent::CloseRequested));
        assert!(input.take_frame().quit);
    }
}
