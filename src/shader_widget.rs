//! Custom shader widget for the cube viewport.
//!
//! Owns the camera and the in-flight gesture. Left-drag on a cubie twists a
//! slice, right-drag orbits the camera, and the wheel zooms.

use iced::widget::shader::{self, wgpu};
use iced::{Point, Rectangle, event, mouse};
use nalgebra::Point2;

use crate::camera::{Camera, CameraController, Projection};
use crate::cube::{CubeLayout, CubeModel};
use crate::gesture::GestureTracker;
use crate::ray_casting::{calculate_mouse_ray, hit_test};
use crate::renderer::{InstanceRaw, Renderer, generate_instances};
use crate::{Message, RenderMode};

const ZNEAR: f32 = 0.1;
const ZFAR: f32 = 100.0;

/// Everything the GPU needs to draw one frame of the cube
#[derive(Debug, Clone)]
pub(crate) struct CubePrimitive {
    instances: Vec<InstanceRaw>,
    camera: Camera,
    projection: Projection,
    render_mode: RenderMode,
}

impl shader::Primitive for CubePrimitive {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        storage: &mut shader::Storage,
        _bounds: &Rectangle,
        viewport: &shader::Viewport,
    ) {
        if !storage.has::<Renderer>() {
            let renderer = pollster::block_on(Renderer::new(
                device,
                format,
                viewport.physical_size(),
                &self.instances,
            ));
            storage.store(renderer);
        }
        let Some(renderer) = storage.get_mut::<Renderer>() else {
            return;
        };
        renderer.resize(device, viewport.physical_size());
        renderer.update_instances(device, queue, &self.instances);
        renderer.update_camera(queue, &self.camera, &self.projection, self.render_mode);
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        storage: &shader::Storage,
        target: &wgpu::TextureView,
        clip_bounds: &Rectangle<u32>,
    ) {
        let Some(renderer) = storage.get::<Renderer>() else {
            return;
        };
        renderer.render(encoder, target, clip_bounds);
    }
}

/// Internal state managed by the shader widget
pub(crate) struct CubeShaderState {
    camera: Camera,
    camera_controller: Option<CameraController>,
    gestures: GestureTracker,
    orbiting: bool,
    last_mouse_pos: Option<Point>,
}

impl Default for CubeShaderState {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            camera_controller: None,
            gestures: GestureTracker::new(),
            orbiting: false,
            last_mouse_pos: None,
        }
    }
}

impl CubeShaderState {
    /// Moves the camera to where the orbit controller puts it, creating the
    /// controller at `distance` on first use.
    fn sync_camera(&mut self, distance: f32) {
        controller(&mut self.camera_controller, distance).update_camera(&mut self.camera);
    }

    /// Camera to draw with. Before the first event the controller does not
    /// exist yet, so the default orbit at `distance` is used.
    fn camera(&self, distance: f32) -> Camera {
        let mut camera = self.camera.clone();
        if self.camera_controller.is_none() {
            CameraController::new(distance).update_camera(&mut camera);
        }
        camera
    }
}

/// The shader program that handles cube rendering and interaction
pub(crate) struct CubeShaderProgram {
    cube: CubeModel,
    layout: CubeLayout,
    drag_threshold: f32,
    camera_distance: f32,
    fovy: f32,
    render_mode: RenderMode,
}

impl CubeShaderProgram {
    pub(crate) fn new(
        cube: CubeModel,
        layout: CubeLayout,
        drag_threshold: f32,
        camera_distance: f32,
        fovy: f32,
        render_mode: RenderMode,
    ) -> Self {
        Self {
            cube,
            layout,
            drag_threshold,
            camera_distance,
            fovy,
            render_mode,
        }
    }

    fn projection(&self, bounds: Rectangle) -> Projection {
        let aspect = if bounds.width > 0.0 && bounds.height > 0.0 {
            bounds.width / bounds.height
        } else {
            1.0
        };
        Projection {
            aspect,
            fovy: self.fovy,
            znear: ZNEAR,
            zfar: ZFAR,
        }
    }
}

impl shader::Program<Message> for CubeShaderProgram {
    type State = CubeShaderState;
    type Primitive = CubePrimitive;

    fn update(
        &self,
        state: &mut Self::State,
        event: shader::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
        _shell: &mut iced::advanced::Shell<'_, Message>,
    ) -> (event::Status, Option<Message>) {
        // Hit tests need the camera the user is looking through.
        state.sync_camera(self.camera_distance);

        let result = match event {
            shader::Event::Mouse(mouse_event) => {
                self.handle_mouse_event(state, mouse_event, bounds, cursor)
            }
            shader::Event::Keyboard(keyboard_event) => {
                (self.handle_keyboard_event(state, keyboard_event), None)
            }
            _ => (event::Status::Ignored, None),
        };

        state.sync_camera(self.camera_distance);

        result
    }

    fn draw(
        &self,
        state: &Self::State,
        _cursor: mouse::Cursor,
        bounds: Rectangle,
    ) -> Self::Primitive {
        CubePrimitive {
            instances: generate_instances(&self.cube, &self.layout),
            camera: state.camera(self.camera_distance),
            projection: self.projection(bounds),
            render_mode: self.render_mode,
        }
    }
}

/// Cursor position relative to the top-left corner of `bounds`, even when
/// the cursor is outside them.
fn relative_position(cursor: mouse::Cursor, bounds: Rectangle) -> Option<Point> {
    cursor
        .position()
        .map(|p| Point::new(p.x - bounds.x, p.y - bounds.y))
}

/// Camera controller, created on first use at the configured distance.
fn controller(slot: &mut Option<CameraController>, distance: f32) -> &mut CameraController {
    slot.get_or_insert_with(|| CameraController::new(distance))
}

/// Where a drag ended. Falls back to the last position seen inside the
/// widget when the cursor is no longer available.
fn release_position(cursor: mouse::Cursor, bounds: Rectangle, last: Option<Point>) -> Option<Point> {
    relative_position(cursor, bounds).or(last)
}

fn to_point2(p: Point) -> Point2<f32> {
    Point2::new(p.x, p.y)
}

impl CubeShaderProgram {
    /// Handle mouse events for twisting and camera navigation
    fn handle_mouse_event(
        &self,
        state: &mut CubeShaderState,
        mouse_event: mouse::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (event::Status, Option<Message>) {
        match mouse_event {
            mouse::Event::CursorMoved { .. } => {
                let Some(position) = relative_position(cursor, bounds) else {
                    return (event::Status::Ignored, None);
                };
                if state.orbiting {
                    if let Some(last_pos) = state.last_mouse_pos {
                        controller(&mut state.camera_controller, self.camera_distance)
                            .process_mouse_motion(position.x - last_pos.x, position.y - last_pos.y);
                    }
                }
                state.last_mouse_pos = Some(position);
                if state.orbiting || state.gestures.armed().is_some() {
                    return (event::Status::Captured, None);
                }
            }
            mouse::Event::ButtonPressed(mouse::Button::Left) => {
                let Some(position) = cursor.position_in(bounds) else {
                    return (event::Status::Ignored, None);
                };
                if state.orbiting {
                    return (event::Status::Captured, None);
                }
                let projection = self.projection(bounds);
                let hit = calculate_mouse_ray(position, bounds, &state.camera, &projection)
                    .and_then(|ray| hit_test(&ray, &self.layout));
                state.gestures.pointer_down(hit, to_point2(position));
                return (event::Status::Captured, None);
            }
            mouse::Event::ButtonReleased(mouse::Button::Left) => {
                if state.gestures.armed().is_none() {
                    return (event::Status::Ignored, None);
                }
                let Some(position) = release_position(cursor, bounds, state.last_mouse_pos) else {
                    state.gestures.cancel();
                    return (event::Status::Captured, None);
                };
                let command = state
                    .gestures
                    .pointer_up(to_point2(position), self.drag_threshold);
                return (event::Status::Captured, command.map(Message::Rotate));
            }
            mouse::Event::ButtonPressed(mouse::Button::Right) => {
                if cursor.position_in(bounds).is_some() {
                    state.gestures.cancel();
                    state.orbiting = true;
                    state.last_mouse_pos = relative_position(cursor, bounds);
                    return (event::Status::Captured, None);
                }
            }
            mouse::Event::ButtonReleased(mouse::Button::Right) => {
                if state.orbiting {
                    state.orbiting = false;
                    return (event::Status::Captured, None);
                }
            }
            mouse::Event::WheelScrolled { delta } => {
                if cursor.position_in(bounds).is_some() {
                    let scroll_delta = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y,
                        mouse::ScrollDelta::Pixels { y, .. } => y * 0.01,
                    };
                    controller(&mut state.camera_controller, self.camera_distance)
                        .process_scroll(scroll_delta);
                    return (event::Status::Captured, None);
                }
            }
            _ => {}
        }

        (event::Status::Ignored, None)
    }

    /// Escape drops a gesture in flight
    fn handle_keyboard_event(
        &self,
        state: &mut CubeShaderState,
        keyboard_event: iced::keyboard::Event,
    ) -> event::Status {
        use iced::keyboard::Event;
        use iced::keyboard::{Key, key};

        match keyboard_event {
            Event::KeyPressed {
                key: Key::Named(key::Named::Escape),
                ..
            } if state.gestures.armed().is_some() => {
                state.gestures.cancel();
                event::Status::Captured
            }
            _ => event::Status::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Coords;
    use crate::prefs::Preferences;

    fn program() -> CubeShaderProgram {
        let prefs = Preferences::default();
        CubeShaderProgram::new(
            CubeModel::new(),
            CubeLayout {
                cubie_size: prefs.cubie_size,
                gap: prefs.cubie_gap,
            },
            prefs.drag_threshold,
            prefs.camera_distance,
            prefs.fovy_degrees,
            RenderMode::Standard,
        )
    }

    fn bounds() -> Rectangle {
        Rectangle::new(Point::new(100.0, 50.0), iced::Size::new(800.0, 800.0))
    }

    /// Cursor at a position relative to the widget.
    fn cursor_at(x: f32, y: f32) -> mouse::Cursor {
        let b = bounds();
        mouse::Cursor::Available(Point::new(b.x + x, b.y + y))
    }

    fn press_center(program: &CubeShaderProgram, state: &mut CubeShaderState) {
        state.sync_camera(program.camera_distance);
        let (status, message) = program.handle_mouse_event(
            state,
            mouse::Event::ButtonPressed(mouse::Button::Left),
            bounds(),
            cursor_at(400.0, 400.0),
        );
        assert_eq!(status, event::Status::Captured);
        assert!(message.is_none());
    }

    #[test]
    fn test_release_position_fallback() {
        let last = Some(Point::new(3.0, 4.0));
        assert_eq!(
            release_position(cursor_at(10.0, 20.0), bounds(), last),
            Some(Point::new(10.0, 20.0))
        );
        // Outside the widget still counts as a drag end.
        assert_eq!(
            release_position(cursor_at(-30.0, 900.0), bounds(), last),
            Some(Point::new(-30.0, 900.0))
        );
        assert_eq!(release_position(mouse::Cursor::Unavailable, bounds(), last), last);
        assert_eq!(release_position(mouse::Cursor::Unavailable, bounds(), None), None);
    }

    #[test]
    fn test_camera_follows_distance_before_first_event() {
        let state = CubeShaderState::default();
        let camera = state.camera(20.0);
        assert!((camera.eye.coords.norm() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_left_press_arms_gesture_on_corner() {
        let program = program();
        let mut state = CubeShaderState::default();
        press_center(&program, &mut state);
        let armed = state.gestures.armed().unwrap();
        assert_eq!(armed.cubie, Coords::new(1, 1, 1));
        assert_eq!(armed.start, Point2::new(400.0, 400.0));
    }

    #[test]
    fn test_left_press_outside_is_ignored() {
        let program = program();
        let mut state = CubeShaderState::default();
        state.sync_camera(program.camera_distance);
        let (status, _) = program.handle_mouse_event(
            &mut state,
            mouse::Event::ButtonPressed(mouse::Button::Left),
            bounds(),
            cursor_at(-10.0, 400.0),
        );
        assert_eq!(status, event::Status::Ignored);
        assert!(state.gestures.armed().is_none());
    }

    #[test]
    fn test_release_without_cursor_uses_last_position() {
        let program = program();
        let mut state = CubeShaderState::default();
        press_center(&program, &mut state);

        let moved = mouse::Event::CursorMoved {
            position: Point::ORIGIN,
        };
        let (status, _) = program.handle_mouse_event(&mut state, moved, bounds(), cursor_at(402.0, 401.0));
        assert_eq!(status, event::Status::Captured);
        assert_eq!(state.last_mouse_pos, Some(Point::new(402.0, 401.0)));

        // A drag under the threshold ends the gesture without a move.
        let (status, message) = program.handle_mouse_event(
            &mut state,
            mouse::Event::ButtonReleased(mouse::Button::Left),
            bounds(),
            mouse::Cursor::Unavailable,
        );
        assert_eq!(status, event::Status::Captured);
        assert!(message.is_none());
        assert!(state.gestures.armed().is_none());
    }

    #[test]
    fn test_release_with_no_position_cancels() {
        let program = program();
        let mut state = CubeShaderState::default();
        press_center(&program, &mut state);
        state.last_mouse_pos = None;

        let (status, message) = program.handle_mouse_event(
            &mut state,
            mouse::Event::ButtonReleased(mouse::Button::Left),
            bounds(),
            mouse::Cursor::Unavailable,
        );
        assert_eq!(status, event::Status::Captured);
        assert!(message.is_none());
        assert!(state.gestures.armed().is_none());
    }

    #[test]
    fn test_right_press_cancels_and_orbits() {
        let program = program();
        let mut state = CubeShaderState::default();
        press_center(&program, &mut state);

        let (status, _) = program.handle_mouse_event(
            &mut state,
            mouse::Event::ButtonPressed(mouse::Button::Right),
            bounds(),
            cursor_at(400.0, 400.0),
        );
        assert_eq!(status, event::Status::Captured);
        assert!(state.gestures.armed().is_none());
        assert!(state.orbiting);

        let eye = state.camera.eye;
        let moved = mouse::Event::CursorMoved {
            position: Point::ORIGIN,
        };
        let _ = program.handle_mouse_event(&mut state, moved, bounds(), cursor_at(450.0, 400.0));
        state.sync_camera(program.camera_distance);
        assert!((state.camera.eye - eye).norm() > 1e-3);

        let _ = program.handle_mouse_event(
            &mut state,
            mouse::Event::ButtonReleased(mouse::Button::Right),
            bounds(),
            cursor_at(450.0, 400.0),
        );
        assert!(!state.orbiting);
    }
}
