//! Ray casting for mouse-based cubie selection.
//!
//! Casts a ray from the cursor through the scene and tests it against the
//! axis-aligned box of every cubie slot. The nearest box struck gives the
//! clicked cubie, and the slab the ray entered through gives the face.

use iced::{Point, Rectangle};
use nalgebra::{Point3, Vector3, Vector4};

use crate::camera::{Camera, Projection};
use crate::cube::CubeLayout;
use crate::gesture::CubieHit;
use crate::math::{Axis, Coords, Sign};

/// 3D ray for intersection testing
#[derive(Debug, Clone)]
pub(crate) struct Ray {
    /// Ray origin point in 3D space
    pub(crate) origin: Point3<f32>,
    /// Ray direction vector (normalized)
    pub(crate) direction: Vector3<f32>,
}

/// Axis-aligned bounding box in 3D space
#[derive(Debug, Clone)]
pub(crate) struct Aabb {
    /// Minimum corner of the 3D bounding box
    pub(crate) min: Point3<f32>,
    /// Maximum corner of the 3D bounding box
    pub(crate) max: Point3<f32>,
}

impl Aabb {
    /// Create a 3D AABB centered at a point with given size
    pub(crate) fn from_center_size(center: Point3<f32>, size: f32) -> Self {
        let half = Vector3::repeat(size * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }
}

/// Where a ray struck a box.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RayHit {
    /// Distance along the ray to the entry point
    pub(crate) distance: f32,
    /// Outward normal of the box face the ray entered through
    pub(crate) normal: Vector3<f32>,
}

/// Calculate mouse ray from screen coordinates through the 3D scene.
///
/// `mouse_pos` is relative to the top-left corner of `bounds`. Returns `None`
/// if the camera matrices are degenerate.
pub(crate) fn calculate_mouse_ray(
    mouse_pos: Point,
    bounds: Rectangle,
    camera: &Camera,
    projection: &Projection,
) -> Option<Ray> {
    // Convert mouse position to normalized device coordinates (-1 to 1)
    let ndc_x = (2.0 * mouse_pos.x / bounds.width) - 1.0;
    let ndc_y = 1.0 - (2.0 * mouse_pos.y / bounds.height);

    let view_proj_matrix = projection.build_projection_matrix() * camera.build_view_matrix();
    let inv_view_proj = view_proj_matrix.try_inverse()?;

    let unproject = |ndc_z: f32| {
        let world = inv_view_proj * Vector4::new(ndc_x, ndc_y, ndc_z, 1.0);
        Point3::from(world.xyz() / world.w)
    };
    let ray_start = unproject(-1.0);
    let ray_end = unproject(1.0);

    let direction = (ray_end - ray_start).try_normalize(f32::EPSILON)?;
    if !direction.iter().all(|c| c.is_finite()) {
        return None;
    }
    Some(Ray {
        origin: ray_start,
        direction,
    })
}

/// Test ray intersection with 3D axis-aligned bounding box using the slab method.
///
/// Returns the entry distance and entry face normal if the ray intersects the
/// box in front of its origin, `None` otherwise. A ray starting inside the box
/// reports the exit face instead.
pub(crate) fn ray_aabb_intersection(ray: &Ray, aabb: &Aabb) -> Option<RayHit> {
    if !ray.origin.iter().chain(ray.direction.iter()).all(|c| c.is_finite()) {
        return None;
    }

    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut enter_normal = Vector3::zeros();
    let mut exit_normal = Vector3::zeros();

    for axis in Axis::ALL {
        let i = axis as usize;
        let inv_dir = 1.0 / ray.direction[i];
        let t_min = (aabb.min[i] - ray.origin[i]) * inv_dir;
        let t_max = (aabb.max[i] - ray.origin[i]) * inv_dir;

        // The near plane is the min plane when travelling in +axis.
        let (t_near, t_far, near_sign) = if t_min <= t_max {
            (t_min, t_max, Sign::Neg)
        } else {
            (t_max, t_min, Sign::Pos)
        };

        if t_near > t_enter {
            t_enter = t_near;
            enter_normal = axis.unit_vec3() * near_sign.float();
        }
        if t_far < t_exit {
            t_exit = t_far;
            exit_normal = axis.unit_vec3() * near_sign.flip().float();
        }
    }

    // Box entirely behind the ray, or the ray misses it.
    if t_exit < 0.0 || t_enter > t_exit || t_enter.is_nan() || t_exit.is_nan() {
        None
    } else if t_enter >= 0.0 {
        Some(RayHit {
            distance: t_enter,
            normal: enter_normal,
        })
    } else {
        Some(RayHit {
            distance: t_exit,
            normal: exit_normal,
        })
    }
}

/// Find the cubie that the ray strikes first, and the world-space normal of
/// the struck face.
pub(crate) fn hit_test(ray: &Ray, layout: &CubeLayout) -> Option<CubieHit> {
    Coords::slots()
        .filter_map(|coords| {
            let aabb = Aabb::from_center_size(layout.slot_center(coords), layout.cubie_size);
            ray_aabb_intersection(ray, &aabb).map(|hit| (coords, hit))
        })
        .min_by(|(_, a), (_, b)| a.distance.total_cmp(&b.distance))
        .map(|(cubie, hit)| CubieHit {
            cubie,
            face_normal: hit.normal,
        })
}
