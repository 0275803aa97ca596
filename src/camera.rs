use nalgebra::{Matrix4, Point3, Vector3};

const MOUSE_SENSITIVITY: f32 = 0.5;
const ZOOM_SENSITIVITY: f32 = 1.0;
const MIN_DISTANCE: f32 = 5.0;
const MAX_DISTANCE: f32 = 50.0;

/// Initial yaw in degrees; with `DEFAULT_PITCH`, looks down the (1, 1, 1)
/// diagonal.
const DEFAULT_YAW: f32 = 45.0;
/// `asin(1 / sqrt(3))` in degrees.
const DEFAULT_PITCH: f32 = 35.264_39;

#[derive(Debug, Clone)]
pub(crate) struct Camera {
    pub(crate) eye: Point3<f32>,
    pub(crate) target: Point3<f32>,
    pub(crate) up: Vector3<f32>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Point3::new(5.0, 5.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
        }
    }
}

impl Camera {
    pub(crate) fn build_view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.eye, &self.target, &self.up)
    }
}

/// Orbits the camera around the origin.
#[derive(Debug, Clone)]
pub(crate) struct CameraController {
    pub(crate) distance: f32,
    pub(crate) yaw: f32,
    pub(crate) pitch: f32,
}

impl CameraController {
    pub(crate) fn new(distance: f32) -> Self {
        Self {
            distance: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
        }
    }

    pub(crate) fn update_camera(&self, camera: &mut Camera) {
        let yaw_rad = self.yaw.to_radians();
        let pitch_rad = self.pitch.to_radians();

        let x = self.distance * pitch_rad.cos() * yaw_rad.sin();
        let y = self.distance * pitch_rad.sin();
        let z = self.distance * pitch_rad.cos() * yaw_rad.cos();

        camera.eye = Point3::new(x, y, z);
        camera.target = Point3::origin();
        camera.up = Vector3::y();
    }

    pub(crate) fn process_mouse_motion(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw -= delta_x * MOUSE_SENSITIVITY;
        self.pitch += delta_y * MOUSE_SENSITIVITY;

        self.pitch = self.pitch.clamp(-89.0, 89.0);
    }

    pub(crate) fn process_scroll(&mut self, delta: f32) {
        self.distance -= delta * ZOOM_SENSITIVITY;
        self.distance = self.distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Projection {
    pub(crate) aspect: f32,
    /// Vertical field of view in degrees.
    pub(crate) fovy: f32,
    pub(crate) znear: f32,
    pub(crate) zfar: f32,
}

impl Projection {
    pub(crate) fn build_projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fovy.to_radians(), self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct CameraUniform {
    pub(crate) view_proj: [[f32; 4]; 4],
    /// Fragment shading mode; see `RenderMode::shader_index`.
    pub(crate) render_mode: u32,
    _padding: [u32; 3],
}

impl CameraUniform {
    pub(crate) fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            render_mode: 0,
            _padding: [0; 3],
        }
    }

    pub(crate) fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_proj = (projection.build_projection_matrix() * camera.build_view_matrix()).into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_orbit_matches_diagonal_view() {
        let mut camera = Camera::default();
        CameraController::new(75.0_f32.sqrt()).update_camera(&mut camera);
        assert!((camera.eye - Point3::new(5.0, 5.0, 5.0)).norm() < 1e-3);
    }

    #[test]
    fn test_zoom_and_pitch_are_clamped() {
        let mut controller = CameraController::new(10.0);
        controller.process_scroll(100.0);
        assert_eq!(controller.distance, MIN_DISTANCE);
        controller.process_scroll(-100.0);
        assert_eq!(controller.distance, MAX_DISTANCE);
        controller.process_mouse_motion(0.0, 1000.0);
        assert_eq!(controller.pitch, 89.0);
    }
}
