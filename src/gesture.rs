//! Drag-to-twist gesture handling.
//!
//! A gesture starts when the pointer goes down on a cubie face and ends when
//! it comes back up. The drag vector between the two points, together with
//! the normal of the clicked face, picks the slice to turn and its direction.

use std::fmt;

use nalgebra::{Point2, Vector2, Vector3};

use crate::cube::Face;
use crate::error::AmbiguousGesture;
use crate::math::{Axis, Coords, Sign};

/// Sense of a quarter turn, as seen from the positive end of the slice axis
/// looking towards the origin.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum RotationDirection {
    /// -90 degrees about the positive axis (right-hand rule).
    Clockwise,
    /// +90 degrees about the positive axis (right-hand rule).
    CounterClockwise,
}

impl RotationDirection {
    fn from_sign(sign: Sign) -> Self {
        match sign {
            Sign::Pos => RotationDirection::Clockwise,
            Sign::Neg => RotationDirection::CounterClockwise,
        }
    }

    #[must_use]
    pub(crate) fn rev(self) -> Self {
        match self {
            RotationDirection::Clockwise => RotationDirection::CounterClockwise,
            RotationDirection::CounterClockwise => RotationDirection::Clockwise,
        }
    }
}

/// Quarter turn of one of the 9 slices of the cube.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RotationCommand {
    pub(crate) axis: Axis,
    /// Coordinate of the slice along `axis`: -1, 0, or 1.
    pub(crate) layer: i8,
    pub(crate) direction: RotationDirection,
}

impl RotationCommand {
    /// Returns whether the slot at `coords` is part of the turning slice.
    pub(crate) fn contains(self, coords: Coords) -> bool {
        coords[self.axis] == self.layer
    }

    /// Applies this turn to a lattice vector.
    pub(crate) fn turn(self, coords: Coords) -> Coords {
        match self.direction {
            RotationDirection::Clockwise => coords.turn_cw(self.axis),
            RotationDirection::CounterClockwise => coords.turn_ccw(self.axis),
        }
    }

    #[must_use]
    pub(crate) fn inverse(self) -> Self {
        Self {
            direction: self.direction.rev(),
            ..self
        }
    }
}

impl fmt::Display for RotationCommand {
    /// Formats the turn in standard cube notation. Middle slices follow the
    /// convention of M following L, E following D, and S following F.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Face whose clockwise sense names the move, and the letter.
        let (reference, symbol) = match (self.axis, self.layer) {
            (Axis::X, 1) => (Sign::Pos, "R"),
            (Axis::X, 0) => (Sign::Neg, "M"),
            (Axis::X, _) => (Sign::Neg, "L"),
            (Axis::Y, 1) => (Sign::Pos, "U"),
            (Axis::Y, 0) => (Sign::Neg, "E"),
            (Axis::Y, _) => (Sign::Neg, "D"),
            (Axis::Z, 1) => (Sign::Pos, "F"),
            (Axis::Z, 0) => (Sign::Pos, "S"),
            (Axis::Z, _) => (Sign::Neg, "B"),
        };
        let clockwise_from_reference = match reference {
            Sign::Pos => self.direction == RotationDirection::Clockwise,
            Sign::Neg => self.direction == RotationDirection::CounterClockwise,
        };
        let prime = if clockwise_from_reference { "" } else { "'" };
        write!(f, "{symbol}{prime}")
    }
}

/// Dominant screen direction of a drag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum DragAxis {
    Horizontal,
    Vertical,
}

impl DragAxis {
    /// Returns the screen axis with the larger drag component, or `None` if
    /// neither dominates.
    pub(crate) fn dominant(drag: Vector2<f32>) -> Option<Self> {
        let (dx, dy) = (drag.x.abs(), drag.y.abs());
        if dx > dy {
            Some(DragAxis::Horizontal)
        } else if dy > dx {
            Some(DragAxis::Vertical)
        } else {
            None
        }
    }

    fn component(self, drag: Vector2<f32>) -> f32 {
        match self {
            DragAxis::Horizontal => drag.x,
            DragAxis::Vertical => drag.y,
        }
    }
}

/// Slice selected by dragging along the active screen direction of a face.
struct TwistRule {
    slice_axis: Axis,
    /// Whether a positive drag on the positive face turns counterclockwise.
    reversed: bool,
}

/// Maps a clicked face axis and drag direction to the slice it turns.
///
/// Each face axis has one active drag direction. The other is inert, since a
/// drag parallel to the projected slice axis cannot pick a twist.
fn twist_rule(face_axis: Axis, drag_axis: DragAxis) -> Option<TwistRule> {
    use DragAxis::*;

    match (face_axis, drag_axis) {
        (Axis::Y, Horizontal) => Some(TwistRule {
            slice_axis: Axis::Y,
            reversed: false,
        }),
        (Axis::Z, Vertical) => Some(TwistRule {
            slice_axis: Axis::X,
            reversed: true,
        }),
        (Axis::X, Vertical) => Some(TwistRule {
            slice_axis: Axis::Z,
            reversed: false,
        }),
        (Axis::Y, Vertical) | (Axis::Z, Horizontal) | (Axis::X, Horizontal) => None,
    }
}

/// Gesture armed by a pointer-down on a cubie.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct ArmedGesture {
    /// Slot of the clicked cubie.
    pub(crate) cubie: Coords,
    /// World-space outward normal of the clicked face.
    pub(crate) face_normal: Vector3<f32>,
    /// Screen position of the pointer-down, in pixels.
    pub(crate) start: Point2<f32>,
}

/// Resolves a finished drag into the slice turn it asks for.
///
/// `drag` is in screen pixels with Y pointing down. Returns `Ok(None)` when
/// the drag is no longer than `threshold` in both directions, when neither
/// direction dominates, or when it runs along the inert direction for the
/// clicked face.
pub(crate) fn resolve_rotation(
    gesture: ArmedGesture,
    drag: Vector2<f32>,
    threshold: f32,
) -> Result<Option<RotationCommand>, AmbiguousGesture> {
    if !drag.x.is_finite() || !drag.y.is_finite() {
        return Err(AmbiguousGesture::NonFiniteDrag {
            x: drag.x,
            y: drag.y,
        });
    }
    let face = Face::from_normal(&gesture.face_normal)?;
    if drag == Vector2::zeros() {
        return Err(AmbiguousGesture::ZeroDrag);
    }

    if drag.x.abs().max(drag.y.abs()) <= threshold {
        return Ok(None);
    }
    let Some(drag_axis) = DragAxis::dominant(drag) else {
        return Ok(None);
    };
    let Some(rule) = twist_rule(face.axis(), drag_axis) else {
        return Ok(None);
    };

    let mut sign = Sign::of(drag_axis.component(drag)) * face.sign();
    if rule.reversed {
        sign = sign.flip();
    }

    Ok(Some(RotationCommand {
        axis: rule.slice_axis,
        layer: gesture.cubie[rule.slice_axis],
        direction: RotationDirection::from_sign(sign),
    }))
}

/// Cubie and face struck by a pointer-down.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct CubieHit {
    pub(crate) cubie: Coords,
    pub(crate) face_normal: Vector3<f32>,
}

/// Tracks the single gesture in flight between pointer-down and pointer-up.
#[derive(Debug, Default, Clone)]
pub(crate) struct GestureTracker {
    armed: Option<ArmedGesture>,
}

impl GestureTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn armed(&self) -> Option<&ArmedGesture> {
        self.armed.as_ref()
    }

    /// Arms a gesture on the struck cubie.
    ///
    /// Returns `false` if nothing was struck or if a gesture is already in
    /// flight; the in-flight gesture is left untouched.
    pub(crate) fn pointer_down(&mut self, hit: Option<CubieHit>, position: Point2<f32>) -> bool {
        if self.armed.is_some() {
            log::debug!("ignoring pointer-down during an active gesture");
            return false;
        }
        let Some(hit) = hit else {
            log::debug!("pointer-down missed the cube");
            return false;
        };

        match Face::from_normal(&hit.face_normal) {
            Ok(face) => log::info!("cubie clicked at {} on its {} face", hit.cubie, face.name()),
            Err(_) => log::info!("cubie clicked at {}", hit.cubie),
        }
        self.armed = Some(ArmedGesture {
            cubie: hit.cubie,
            face_normal: hit.face_normal,
            start: position,
        });
        true
    }

    /// Ends the gesture in flight and resolves it.
    ///
    /// The gesture is cleared whatever the outcome.
    pub(crate) fn pointer_up(
        &mut self,
        position: Point2<f32>,
        threshold: f32,
    ) -> Option<RotationCommand> {
        let gesture = self.armed.take()?;
        let drag = position - gesture.start;

        match resolve_rotation(gesture, drag, threshold) {
            Ok(Some(command)) => {
                log::info!(
                    "rotate {} (axis {}, layer {}, {:?})",
                    command,
                    command.axis,
                    command.layer,
                    command.direction,
                );
                Some(command)
            }
            Ok(None) => {
                log::debug!("drag ({}, {}) does not twist anything", drag.x, drag.y);
                None
            }
            Err(e @ AmbiguousGesture::ZeroDrag) => {
                log::debug!("ambiguous gesture: {e}");
                None
            }
            Err(e) => {
                log::warn!("ambiguous gesture: {e}");
                None
            }
        }
    }

    /// Drops the gesture in flight, if any.
    pub(crate) fn cancel(&mut self) {
        if self.armed.take().is_some() {
            log::debug!("gesture cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const THRESHOLD: f32 = 50.0;

    fn gesture(face: Face, cubie: Coords) -> ArmedGesture {
        ArmedGesture {
            cubie,
            face_normal: face.vector(),
            start: Point2::new(400.0, 300.0),
        }
    }

    fn resolve(face: Face, cubie: Coords, dx: f32, dy: f32) -> Option<RotationCommand> {
        resolve_rotation(gesture(face, cubie), Vector2::new(dx, dy), THRESHOLD).unwrap()
    }

    /// Some slot on `face`, so that the clicked cubie is consistent with the
    /// clicked face.
    fn cubie_on(face: Face, a: i8, b: i8) -> Coords {
        let mut c = face.unit();
        let [p, q] = face.axis().perpendiculars();
        c[p] = a;
        c[q] = b;
        c
    }

    #[test]
    fn test_top_face_horizontal_drag() {
        let command = resolve(Face::U, Coords::new(1, 1, -1), 80.0, 0.0);
        assert_eq!(
            command,
            Some(RotationCommand {
                axis: Axis::Y,
                layer: 1,
                direction: RotationDirection::Clockwise,
            }),
        );
        assert_eq!(command.unwrap().to_string(), "U");
    }

    #[test]
    fn test_front_face_vertical_drag() {
        // Dragging down on the front face turns the X slice counterclockwise.
        let command = resolve(Face::F, Coords::new(1, 0, 1), 0.0, 80.0).unwrap();
        assert_eq!(command.axis, Axis::X);
        assert_eq!(command.layer, 1);
        assert_eq!(command.direction, RotationDirection::CounterClockwise);
        assert_eq!(command.to_string(), "R'");
    }

    #[test]
    fn test_right_face_vertical_drag() {
        let command = resolve(Face::R, Coords::new(1, -1, 0), 0.0, 80.0).unwrap();
        assert_eq!(command.axis, Axis::Z);
        assert_eq!(command.layer, 0);
        assert_eq!(command.direction, RotationDirection::Clockwise);
    }

    #[test]
    fn test_full_table() {
        use RotationDirection::*;

        let cases = [
            (Face::U, (80.0, 0.0), Axis::Y, Clockwise),
            (Face::U, (-80.0, 0.0), Axis::Y, CounterClockwise),
            (Face::D, (80.0, 0.0), Axis::Y, CounterClockwise),
            (Face::D, (-80.0, 0.0), Axis::Y, Clockwise),
            (Face::F, (0.0, 80.0), Axis::X, CounterClockwise),
            (Face::F, (0.0, -80.0), Axis::X, Clockwise),
            (Face::B, (0.0, 80.0), Axis::X, Clockwise),
            (Face::B, (0.0, -80.0), Axis::X, CounterClockwise),
            (Face::R, (0.0, 80.0), Axis::Z, Clockwise),
            (Face::R, (0.0, -80.0), Axis::Z, CounterClockwise),
            (Face::L, (0.0, 80.0), Axis::Z, CounterClockwise),
            (Face::L, (0.0, -80.0), Axis::Z, Clockwise),
        ];
        for (face, (dx, dy), axis, direction) in cases {
            let cubie = cubie_on(face, 1, -1);
            let command = resolve(face, cubie, dx, dy).unwrap();
            assert_eq!(command.axis, axis, "{face} ({dx}, {dy})");
            assert_eq!(command.layer, cubie[axis], "{face} ({dx}, {dy})");
            assert_eq!(command.direction, direction, "{face} ({dx}, {dy})");
        }
    }

    #[test]
    fn test_inert_directions() {
        let cubie = Coords::new(0, 1, 1);
        assert_eq!(resolve(Face::U, cubie, 0.0, 80.0), None);
        assert_eq!(resolve(Face::F, cubie, 80.0, 0.0), None);
        assert_eq!(resolve(Face::R, Coords::new(1, 0, 0), 80.0, 0.0), None);
        // No dominant direction.
        assert_eq!(resolve(Face::U, cubie, 80.0, 80.0), None);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let cubie = Coords::new(1, 1, -1);
        assert_eq!(resolve(Face::U, cubie, 50.0, 0.0), None);
        assert_eq!(resolve(Face::U, cubie, -50.0, 0.0), None);
        assert!(resolve(Face::U, cubie, 51.0, 0.0).is_some());
    }

    #[test]
    fn test_malformed_input() {
        let cubie = Coords::new(1, 1, 1);
        let skewed = ArmedGesture {
            face_normal: Vector3::new(0.6, 0.8, 0.0),
            ..gesture(Face::U, cubie)
        };
        assert!(matches!(
            resolve_rotation(skewed, Vector2::new(80.0, 0.0), THRESHOLD),
            Err(AmbiguousGesture::NotAxisAligned { .. }),
        ));
        assert_eq!(
            resolve_rotation(gesture(Face::U, cubie), Vector2::zeros(), THRESHOLD),
            Err(AmbiguousGesture::ZeroDrag),
        );
        assert!(matches!(
            resolve_rotation(gesture(Face::U, cubie), Vector2::new(f32::INFINITY, 0.0), THRESHOLD),
            Err(AmbiguousGesture::NonFiniteDrag { .. }),
        ));
    }

    #[test]
    fn test_notation() {
        use RotationDirection::*;

        let name = |axis, layer, direction| {
            RotationCommand {
                axis,
                layer,
                direction,
            }
            .to_string()
        };
        assert_eq!(name(Axis::X, 1, Clockwise), "R");
        assert_eq!(name(Axis::X, -1, Clockwise), "L'");
        assert_eq!(name(Axis::X, 0, CounterClockwise), "M");
        assert_eq!(name(Axis::Y, -1, CounterClockwise), "D");
        assert_eq!(name(Axis::Y, 0, Clockwise), "E'");
        assert_eq!(name(Axis::Z, 1, CounterClockwise), "F'");
        assert_eq!(name(Axis::Z, 0, Clockwise), "S");
        assert_eq!(name(Axis::Z, -1, CounterClockwise), "B");
    }

    #[test]
    fn test_tracker_end_to_end() {
        let mut tracker = GestureTracker::new();
        let hit = CubieHit {
            cubie: Coords::new(0, 1, 1),
            face_normal: Vector3::y(),
        };
        assert!(tracker.pointer_down(Some(hit), Point2::new(200.0, 200.0)));
        let command = tracker.pointer_up(Point2::new(300.0, 205.0), THRESHOLD);
        assert_eq!(
            command,
            Some(RotationCommand {
                axis: Axis::Y,
                layer: 1,
                direction: RotationDirection::Clockwise,
            }),
        );
        assert!(tracker.armed().is_none());
    }

    #[test]
    fn test_tracker_miss_and_tap() {
        let mut tracker = GestureTracker::new();
        assert!(!tracker.pointer_down(None, Point2::new(10.0, 10.0)));
        assert_eq!(tracker.pointer_up(Point2::new(200.0, 10.0), THRESHOLD), None);

        let hit = CubieHit {
            cubie: Coords::new(1, 1, 1),
            face_normal: Vector3::y(),
        };
        assert!(tracker.pointer_down(Some(hit), Point2::new(10.0, 10.0)));
        assert_eq!(tracker.pointer_up(Point2::new(20.0, 10.0), THRESHOLD), None);
        assert!(tracker.armed().is_none());

        // Zero-length drag is ambiguous but still clears the gesture.
        assert!(tracker.pointer_down(Some(hit), Point2::new(10.0, 10.0)));
        assert_eq!(tracker.pointer_up(Point2::new(10.0, 10.0), THRESHOLD), None);
        assert!(tracker.armed().is_none());
    }

    #[test]
    fn test_tracker_ignores_second_pointer_down() {
        let mut tracker = GestureTracker::new();
        let first = CubieHit {
            cubie: Coords::new(1, 1, 1),
            face_normal: Vector3::y(),
        };
        let second = CubieHit {
            cubie: Coords::new(-1, -1, 1),
            face_normal: Vector3::z(),
        };
        assert!(tracker.pointer_down(Some(first), Point2::new(0.0, 0.0)));
        assert!(!tracker.pointer_down(Some(second), Point2::new(50.0, 50.0)));
        let armed = tracker.armed().unwrap();
        assert_eq!(armed.cubie, first.cubie);
        assert_eq!(armed.start, Point2::new(0.0, 0.0));

        tracker.cancel();
        assert!(tracker.armed().is_none());
        assert_eq!(tracker.pointer_up(Point2::new(100.0, 0.0), THRESHOLD), None);
    }

    fn any_face() -> impl Strategy<Value = Face> {
        prop::sample::select(Face::ALL.to_vec())
    }

    fn any_cubie_on_face() -> impl Strategy<Value = (Face, Coords)> {
        (any_face(), -1..=1_i8, -1..=1_i8).prop_map(|(face, a, b)| (face, cubie_on(face, a, b)))
    }

    /// Drag along the active direction for `face`.
    fn active_drag(face: Face, along: f32, across: f32) -> (f32, f32) {
        match face.axis() {
            Axis::Y => (along, across),
            Axis::X | Axis::Z => (across, along),
        }
    }

    proptest! {
        #[test]
        fn proptest_layer_is_cubie_coordinate(
            (face, cubie) in any_cubie_on_face(),
            along in 51.0..500.0_f32,
            across in -50.0..50.0_f32,
            negate in any::<bool>(),
        ) {
            let along = if negate { -along } else { along };
            let (dx, dy) = active_drag(face, along, across);
            let command = resolve(face, cubie, dx, dy).unwrap();
            prop_assert_eq!(command.layer, cubie[command.axis]);
            prop_assert!(command.contains(cubie));
        }

        #[test]
        fn proptest_opposite_drags_opposite_directions(
            (face, cubie) in any_cubie_on_face(),
            along in 51.0..500.0_f32,
        ) {
            let (dx, dy) = active_drag(face, along, 0.0);
            let forward = resolve(face, cubie, dx, dy).unwrap();
            let backward = resolve(face, cubie, -dx, -dy).unwrap();
            prop_assert_eq!(forward.axis, backward.axis);
            prop_assert_ne!(forward.direction, backward.direction);
        }

        #[test]
        fn proptest_opposite_faces_opposite_directions(
            face in any_face(),
            along in 51.0..500.0_f32,
        ) {
            let opposite = Face::new(face.axis(), face.sign().flip());
            let (dx, dy) = active_drag(face, along, 0.0);
            let here = resolve(face, face.unit(), dx, dy).unwrap();
            let there = resolve(opposite, opposite.unit(), dx, dy).unwrap();
            prop_assert_eq!(here.axis, there.axis);
            prop_assert_ne!(here.direction, there.direction);
        }

        #[test]
        fn proptest_top_face_vertical_drag_is_inert(
            dx in -1000.0..1000.0_f32,
            dy in -1000.0..1000.0_f32,
        ) {
            prop_assume!(dy.abs() >= dx.abs() && dy != 0.0);
            prop_assert_eq!(resolve(Face::U, Coords::new(1, 1, 0), dx, dy), None);
        }

        #[test]
        fn proptest_short_drags_do_nothing(
            face in any_face(),
            dx in -50.0..=50.0_f32,
            dy in -50.0..=50.0_f32,
        ) {
            prop_assume!(dx != 0.0 || dy != 0.0);
            prop_assert_eq!(resolve(face, face.unit(), dx, dy), None);
        }
    }
}
