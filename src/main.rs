//! Interactive 3x3x3 cube visualizer with iced UI.
//!
//! Click a cubie face and drag to twist the slice under it. Right-drag orbits
//! the camera. Uses iced for UI and wgpu for GPU rendering.

use iced::widget::{Column, PickList, Row, Shader, Slider, button, text};
use iced::{Element, Length, Settings, Task};

mod camera;
mod cube;
mod error;
mod gesture;
mod math;
mod prefs;
mod ray_casting;
mod renderer;
mod shader_widget;

use cube::{CubeLayout, CubeModel};
use gesture::RotationCommand;
use prefs::{PREFS_FILE, Preferences};
use shader_widget::CubeShaderProgram;

/// Rendering modes for visualization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenderMode {
    Standard,
    Normals,
    Depth,
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderMode::Standard => write!(f, "Standard"),
            RenderMode::Normals => write!(f, "Normal Map"),
            RenderMode::Depth => write!(f, "Depth Map"),
        }
    }
}

impl RenderMode {
    const ALL: [RenderMode; 3] = [RenderMode::Standard, RenderMode::Normals, RenderMode::Depth];

    /// Value of `render_mode` in the shader's camera uniform.
    pub(crate) fn shader_index(self) -> u32 {
        match self {
            RenderMode::Standard => 0,
            RenderMode::Normals => 1,
            RenderMode::Depth => 2,
        }
    }
}

/// Main application state
#[derive(Debug)]
pub(crate) struct CubeApp {
    prefs: Preferences,
    cube: CubeModel,
    render_mode: RenderMode,
    drag_threshold: f32,
    cubie_gap: f32,
    /// Moves applied since the last reset, oldest first.
    history: Vec<RotationCommand>,
}

/// Messages that the application can receive
#[derive(Debug, Clone)]
pub(crate) enum Message {
    RenderMode(RenderMode),
    DragThreshold(f32),
    CubieGap(f32),
    Rotate(RotationCommand),
    Undo,
    Reset,
}

impl CubeApp {
    /// Create a new application instance with a solved cube
    pub(crate) fn new(prefs: Preferences) -> Self {
        Self {
            render_mode: RenderMode::Standard,
            drag_threshold: prefs.drag_threshold,
            cubie_gap: prefs.cubie_gap,
            cube: CubeModel::new(),
            history: Vec::new(),
            prefs,
        }
    }

    /// Get the title of the application
    pub(crate) fn title(&self) -> &'static str {
        "Cubie"
    }

    /// Update the application state
    pub(crate) fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::RenderMode(mode) => {
                self.render_mode = mode;
            }
            Message::DragThreshold(value) => {
                self.drag_threshold = value;
            }
            Message::CubieGap(value) => {
                self.cubie_gap = value;
            }
            Message::Rotate(command) => {
                self.cube.apply(command);
                self.history.push(command);
                if self.cube.is_solved() {
                    log::info!("solved in {} moves", self.history.len());
                }
            }
            Message::Undo => {
                if let Some(command) = self.history.pop() {
                    log::info!("undo {command}");
                    self.cube.apply(command.inverse());
                }
            }
            Message::Reset => {
                log::info!("reset cube");
                self.cube.reset();
                self.history.clear();
            }
        }

        Task::none()
    }

    fn layout(&self) -> CubeLayout {
        CubeLayout {
            cubie_size: self.prefs.cubie_size,
            gap: self.cubie_gap,
        }
    }

    fn status(&self) -> String {
        let last_move = self
            .history
            .last()
            .map_or_else(|| "-".to_owned(), |command| command.to_string());
        let solved = if self.cube.is_solved() { "Solved" } else { "Scrambled" };
        format!("Last move: {last_move}\nMoves: {}\n{solved}", self.history.len())
    }

    /// Create the view for the application
    pub(crate) fn view(&self) -> Element<'_, Message> {
        // Left pane with controls
        let controls = Column::new()
            .spacing(20)
            .push(
                Column::new()
                    .spacing(5)
                    .push(text("Render Mode"))
                    .push(
                        PickList::new(
                            &RenderMode::ALL[..],
                            Some(self.render_mode),
                            Message::RenderMode,
                        )
                        .width(250),
                    ),
            )
            .push(
                Column::new()
                    .spacing(5)
                    .push(text(format!("Drag Threshold ({:.0} px)", self.drag_threshold)))
                    .push(
                        Slider::new(10.0..=150.0, self.drag_threshold, Message::DragThreshold)
                            .step(1.0)
                            .width(250),
                    ),
            )
            .push(
                Column::new()
                    .spacing(5)
                    .push(text("Cubie Gap"))
                    .push(
                        Slider::new(0.0..=0.3, self.cubie_gap, Message::CubieGap)
                            .step(0.01)
                            .width(250),
                    ),
            )
            .push(text(self.status()))
            .push(
                Row::new()
                    .spacing(10)
                    .push(
                        button("Undo")
                            .on_press_maybe((!self.history.is_empty()).then_some(Message::Undo)),
                    )
                    .push(button("Reset").on_press(Message::Reset)),
            );

        // Right pane with 3D viewport
        let viewport = Shader::new(CubeShaderProgram::new(
            self.cube.clone(),
            self.layout(),
            self.drag_threshold,
            self.prefs.camera_distance,
            self.prefs.fovy_degrees,
            self.render_mode,
        ))
        .width(Length::Fill)
        .height(Length::Fill);

        // Main layout: left controls + right viewport
        Row::new()
            .spacing(10)
            .padding(10)
            .push(
                iced::widget::container(controls)
                    .width(Length::Shrink)
                    .height(Length::Fill),
            )
            .push(viewport)
            .into()
    }
}

/// Entry point for the cube visualization application
fn main() -> iced::Result {
    env_logger::builder()
        .format_timestamp(None)
        .filter_module("cubie", log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let prefs = Preferences::load_or_default(PREFS_FILE);
    let app = CubeApp::new(prefs);
    iced::application(app.title(), CubeApp::update, CubeApp::view)
        .settings(Settings {
            antialiasing: true,
            ..Settings::default()
        })
        .run_with(move || (app, Task::none()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::RotationDirection;
    use crate::math::Axis;

    #[test]
    fn test_rotate_and_reset() {
        let mut app = CubeApp::new(Preferences::default());
        let command = RotationCommand {
            axis: Axis::Y,
            layer: 1,
            direction: RotationDirection::Clockwise,
        };
        let _ = app.update(Message::Rotate(command));
        assert_eq!(app.history, vec![command]);
        assert!(!app.cube.is_solved());
        assert!(app.status().starts_with("Last move: U\n"));

        let _ = app.update(Message::Reset);
        assert!(app.history.is_empty());
        assert!(app.cube.is_solved());
    }

    #[test]
    fn test_undo_reverts_last_move() {
        let mut app = CubeApp::new(Preferences::default());
        let first = RotationCommand {
            axis: Axis::X,
            layer: 1,
            direction: RotationDirection::Clockwise,
        };
        let second = RotationCommand {
            axis: Axis::Z,
            layer: 0,
            direction: RotationDirection::CounterClockwise,
        };
        let _ = app.update(Message::Rotate(first));
        let after_first = app.cube.clone();
        let _ = app.update(Message::Rotate(second));

        let _ = app.update(Message::Undo);
        assert_eq!(app.history, vec![first]);
        assert_eq!(app.cube, after_first);
        assert!(app.status().starts_with("Last move: R\nMoves: 1\n"));

        let _ = app.update(Message::Undo);
        assert!(app.history.is_empty());
        assert!(app.cube.is_solved());

        // Nothing left to undo.
        let _ = app.update(Message::Undo);
        assert!(app.cube.is_solved());
        assert_eq!(app.status(), "Last move: -\nMoves: 0\nSolved");
    }

    #[test]
    fn test_sliders_update_layout() {
        let mut app = CubeApp::new(Preferences::default());
        let _ = app.update(Message::CubieGap(0.2));
        let _ = app.update(Message::DragThreshold(80.0));
        assert_eq!(app.layout().gap, 0.2);
        assert_eq!(app.drag_threshold, 80.0);
    }
}
