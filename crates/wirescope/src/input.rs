//! Mouse and keyboard mapping onto the camera and settings.
//!
//! Left-drag orbits the camera (pixels × [`DRAG_SENSITIVITY`] radians), the
//! wheel zooms one step per notch, and a handful of keys stand in for the
//! control panel. The first drag turns auto-rotation off.

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

use crate::camera::{OrbitCamera, RotationAxis};
use crate::settings::{RenderMode, RenderSettings, SettingsUpdate};

/// Radians of orbit per pixel of drag.
pub const DRAG_SENSITIVITY: f32 = 0.005;
/// Exposure change per `+`/`-` key press.
pub const EXPOSURE_STEP: f32 = 0.1;

/// Drag state for the orbit controls.
#[derive(Debug, Default)]
pub struct OrbitInput {
    dragging: bool,
    cursor: Option<(f64, f64)>,
}

impl OrbitInput {
    /// Handle a button press. Returns `true` if a drag started, in which case
    /// auto-rotation has been switched off on `camera`.
    pub fn press(&mut self, button: MouseButton, camera: &mut OrbitCamera) -> bool {
        if button != MouseButton::Left {
            return false;
        }
        self.dragging = true;
        camera.auto_rotate = false;
        true
    }

    pub fn release(&mut self, button: MouseButton) {
        if button == MouseButton::Left {
            self.dragging = false;
        }
    }

    /// Track the cursor; orbits while dragging. Dragging right moves the
    /// camera left around the target, so the model follows the cursor.
    pub fn cursor_moved(&mut self, x: f64, y: f64, camera: &mut OrbitCamera) {
        if let Some((last_x, last_y)) = self.cursor.replace((x, y))
            && self.dragging
        {
            let dx = (x - last_x) as f32;
            let dy = (y - last_y) as f32;
            camera.orbit(-dx * DRAG_SENSITIVITY, dy * DRAG_SENSITIVITY);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
    }

    /// One zoom step per wheel event, by sign only. `scroll_up > 0` is the
    /// wheel rolled away from the user and zooms in.
    pub fn wheel(&self, scroll_up: f32, camera: &mut OrbitCamera) {
        if scroll_up > 0.0 {
            camera.zoom(1.0);
        } else if scroll_up < 0.0 {
            camera.zoom(-1.0);
        }
    }
}

/// Keyboard shortcuts standing in for the control panel.
///
/// | Key       | Effect                                  |
/// |-----------|-----------------------------------------|
/// | `1`-`7`   | render mode 0-6                         |
/// | `W`       | cycle Shaded / Wireframe / Vertex Normals |
/// | `Space`   | toggle auto-rotate                      |
/// | `X` `Y` `Z` | rotation axis                         |
/// | `+` `-`   | exposure                                |
/// | `C` / `B` | next wire / background preset           |
pub fn key_update(key: KeyCode, settings: &RenderSettings) -> Option<SettingsUpdate> {
    use crate::settings::{BACKGROUND_PRESETS, WIRE_PRESETS};

    let digit = match key {
        KeyCode::Digit1 => Some(0),
        KeyCode::Digit2 => Some(1),
        KeyCode::Digit3 => Some(2),
        KeyCode::Digit4 => Some(3),
        KeyCode::Digit5 => Some(4),
        KeyCode::Digit6 => Some(5),
        KeyCode::Digit7 => Some(6),
        _ => None,
    };
    if let Some(index) = digit {
        return Some(SettingsUpdate {
            render_mode: Some(RenderMode::ALL[index]),
            ..Default::default()
        });
    }

    let next_preset = |presets: &[(&str, &str)], current: &str| {
        let at = presets.iter().position(|(_, hex)| *hex == current);
        let (_, hex) = presets[at.map_or(0, |i| (i + 1) % presets.len())];
        hex.to_string()
    };

    let update = match key {
        KeyCode::KeyW => SettingsUpdate {
            geometry_mode: Some(settings.geometry_mode.next()),
            ..Default::default()
        },
        KeyCode::Space => SettingsUpdate {
            auto_rotate: Some(!settings.auto_rotate),
            ..Default::default()
        },
        KeyCode::KeyX | KeyCode::KeyY | KeyCode::KeyZ => SettingsUpdate {
            rotation_axis: Some(match key {
                KeyCode::KeyX => RotationAxis::X,
                KeyCode::KeyY => RotationAxis::Y,
                _ => RotationAxis::Z,
            }),
            ..Default::default()
        },
        KeyCode::Equal | KeyCode::NumpadAdd => SettingsUpdate {
            exposure: Some(settings.exposure + EXPOSURE_STEP),
            ..Default::default()
        },
        KeyCode::Minus | KeyCode::NumpadSubtract => SettingsUpdate {
            exposure: Some(settings.exposure - EXPOSURE_STEP),
            ..Default::default()
        },
        KeyCode::KeyC => SettingsUpdate {
            wire_color: Some(next_preset(WIRE_PRESETS, settings.wire_color.as_str())),
            ..Default::default()
        },
        KeyCode::KeyB => SettingsUpdate {
            background_color: Some(next_preset(
                BACKGROUND_PRESETS,
                settings.background_color.as_str(),
            )),
            ..Default::default()
        },
        _ => return None,
    };
    Some(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GeometryMode;

    #[test]
    fn drag_disables_auto_rotate_and_orbits() {
        let mut input = OrbitInput::default();
        let mut camera = OrbitCamera::new();
        input.cursor_moved(100.0, 100.0, &mut camera);
        assert_eq!(camera.azimuth, 0.0, "no orbit without a drag");

        assert!(input.press(MouseButton::Left, &mut camera));
        assert!(!camera.auto_rotate);

        input.cursor_moved(80.0, 110.0, &mut camera);
        assert!((camera.azimuth - 20.0 * DRAG_SENSITIVITY).abs() < 1e-6);
        assert!((camera.elevation - 10.0 * DRAG_SENSITIVITY).abs() < 1e-6);

        input.release(MouseButton::Left);
        input.cursor_moved(0.0, 0.0, &mut camera);
        assert!((camera.elevation - 10.0 * DRAG_SENSITIVITY).abs() < 1e-6);
    }

    #[test]
    fn right_button_does_not_drag() {
        let mut input = OrbitInput::default();
        let mut camera = OrbitCamera::new();
        assert!(!input.press(MouseButton::Right, &mut camera));
        assert!(camera.auto_rotate);
    }

    #[test]
    fn wheel_zooms_by_sign() {
        let input = OrbitInput::default();
        let mut camera = OrbitCamera::new();
        input.wheel(3.0, &mut camera);
        assert!((camera.distance - 4.5).abs() < 1e-5);
        input.wheel(-0.2, &mut camera);
        assert!((camera.distance - 4.95).abs() < 1e-5);
        input.wheel(0.0, &mut camera);
        assert!((camera.distance - 4.95).abs() < 1e-5);
    }

    #[test]
    fn keys_map_to_updates() {
        let settings = RenderSettings::default();
        let update = key_update(KeyCode::Digit3, &settings).unwrap();
        assert_eq!(update.render_mode, Some(RenderMode::Metalness));

        let update = key_update(KeyCode::KeyW, &settings).unwrap();
        assert_eq!(update.geometry_mode, Some(GeometryMode::Wireframe));

        let update = key_update(KeyCode::Space, &settings).unwrap();
        assert_eq!(update.auto_rotate, Some(false));

        let update = key_update(KeyCode::KeyC, &settings).unwrap();
        assert_eq!(update.wire_color.as_deref(), Some("#ffb000"));

        let update = key_update(KeyCode::KeyB, &settings).unwrap();
        assert_eq!(update.background_color.as_deref(), Some("#000000"), "wraps after last preset");

        assert!(key_update(KeyCode::KeyQ, &settings).is_none());
    }
}
