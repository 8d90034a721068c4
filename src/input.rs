//! Pointer handling.
//!
//! `Interaction` owns the formation flag and turns raw window events into
//! [`PointerAction`]s: a click toggles the formation, a left drag orbits the
//! camera and the wheel zooms. A press only counts as a click when the
//! pointer stays within [`DRAG_THRESHOLD`] pixels of where it went down.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

use crate::particle::Formation;

/// Pixels the pointer may travel before a press becomes a drag.
pub const DRAG_THRESHOLD: f32 = 4.0;

/// Pixels of a precise scroll that count as one wheel line.
const PIXELS_PER_LINE: f32 = 100.0;

/// What the app should do in response to pointer input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    /// The formation flipped; carries the new value.
    Toggle(Formation),
    /// Drag movement in pixels since the previous cursor event.
    Orbit(Vec2),
    /// Wheel lines; positive is toward the screen.
    Zoom(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    origin: Vec2,
    dragging: bool,
}

/// Formation flag plus left-button press tracking.
#[derive(Debug, Default)]
pub struct Interaction {
    formation: Formation,
    cursor: Vec2,
    press: Option<Press>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn formation(&self) -> Formation {
        self.formation
    }

    /// Flip the formation directly.
    pub fn toggle(&mut self) -> Formation {
        self.formation = self.formation.toggled();
        self.formation
    }

    /// Left button went down at the current cursor position.
    pub fn press(&mut self) {
        self.press = Some(Press {
            origin: self.cursor,
            dragging: false,
        });
    }

    /// Cursor moved to `position` (window pixels).
    pub fn moved(&mut self, position: Vec2) -> Option<PointerAction> {
        let delta = position - self.cursor;
        self.cursor = position;

        let press = self.press.as_mut()?;
        if !press.dragging && position.distance(press.origin) > DRAG_THRESHOLD {
            press.dragging = true;
        }
        press.dragging.then_some(PointerAction::Orbit(delta))
    }

    /// Left button released. Toggles unless the press turned into a drag.
    pub fn release(&mut self) -> Option<PointerAction> {
        match self.press.take() {
            Some(Press { dragging: false, .. }) => Some(PointerAction::Toggle(self.toggle())),
            _ => None,
        }
    }

    /// Wheel moved by `lines`.
    pub fn scroll(&mut self, lines: f32) -> Option<PointerAction> {
        (lines != 0.0).then_some(PointerAction::Zoom(lines))
    }

    /// Feed a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<PointerAction> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.moved(Vec2::new(position.x as f32, position.y as f32))
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.press();
                    None
                }
                ElementState::Released => self.release(),
            },
            WindowEvent::MouseWheel { delta, .. } => self.scroll(match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
            }),
            WindowEvent::CursorLeft { .. } => {
                self.press = None;
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_toggles() {
        let mut input = Interaction::new();
        assert_eq!(input.formation(), Formation::Assembled);

        input.moved(Vec2::new(100.0, 100.0));
        input.press();
        assert_eq!(input.release(), Some(PointerAction::Toggle(Formation::Scattered)));
        input.press();
        assert_eq!(input.release(), Some(PointerAction::Toggle(Formation::Assembled)));
    }

    #[test]
    fn test_jitter_still_clicks() {
        let mut input = Interaction::new();
        input.moved(Vec2::new(50.0, 50.0));
        input.press();
        assert_eq!(input.moved(Vec2::new(52.0, 51.0)), None);
        assert_eq!(input.release(), Some(PointerAction::Toggle(Formation::Scattered)));
    }

    #[test]
    fn test_drag_orbits_without_toggle() {
        let mut input = Interaction::new();
        input.moved(Vec2::new(0.0, 0.0));
        input.press();
        assert_eq!(input.moved(Vec2::new(3.0, 0.0)), None);
        assert_eq!(
            input.moved(Vec2::new(10.0, 2.0)),
            Some(PointerAction::Orbit(Vec2::new(7.0, 2.0)))
        );
        // Coming back near the origin is still a drag.
        assert_eq!(
            input.moved(Vec2::new(1.0, 0.0)),
            Some(PointerAction::Orbit(Vec2::new(-9.0, -2.0)))
        );
        assert_eq!(input.release(), None);
        assert_eq!(input.formation(), Formation::Assembled);
    }

    #[test]
    fn test_hover_does_nothing() {
        let mut input = Interaction::new();
        assert_eq!(input.moved(Vec2::new(300.0, 200.0)), None);
        assert_eq!(input.release(), None);
        assert_eq!(input.scroll(0.0), None);
        assert_eq!(input.scroll(-2.0), Some(PointerAction::Zoom(-2.0)));
    }
}
