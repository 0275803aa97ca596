//! 3x3x3 cube data structures and geometry.
//!
//! The cube is a fixed set of 26 slots on the integer lattice. Slots never
//! move; twisting a layer reassigns which piece each slot carries and which
//! way that piece's stickers face.

use std::fmt;

use nalgebra::{Point3, Vector3, Vector4};

use crate::error::AmbiguousGesture;
use crate::gesture::RotationCommand;
use crate::math::{Axis, Coords, Sign};

/// Minimum magnitude of the dominant component of an axis-aligned normal.
const AXIS_ALIGNED_MIN: f32 = 0.9;
/// Maximum magnitude of the other components of an axis-aligned normal.
const AXIS_ALIGNED_MAX_OFF: f32 = 0.1;

/// One of the six faces of the cube.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Face {
    R,
    L,
    U,
    D,
    F,
    B,
}

impl Face {
    #[cfg(test)]
    pub(crate) const ALL: [Face; 6] = [Face::R, Face::L, Face::U, Face::D, Face::F, Face::B];

    pub(crate) fn new(axis: Axis, sign: Sign) -> Self {
        match (axis, sign) {
            (Axis::X, Sign::Pos) => Face::R,
            (Axis::X, Sign::Neg) => Face::L,
            (Axis::Y, Sign::Pos) => Face::U,
            (Axis::Y, Sign::Neg) => Face::D,
            (Axis::Z, Sign::Pos) => Face::F,
            (Axis::Z, Sign::Neg) => Face::B,
        }
    }

    /// Returns the face whose outward normal is `normal`.
    ///
    /// The normal must be axis-aligned: one component close to ±1 and the
    /// others close to 0.
    pub(crate) fn from_normal(normal: &Vector3<f32>) -> Result<Self, AmbiguousGesture> {
        let not_aligned = || AmbiguousGesture::NotAxisAligned {
            x: normal.x,
            y: normal.y,
            z: normal.z,
        };

        if !normal.iter().all(|c| c.is_finite()) {
            return Err(not_aligned());
        }
        let i = normal.iamax();
        let axis = Axis::ALL[i];
        let dominant = normal[i];
        let off_axis_ok = (0..3)
            .filter(|&j| j != i)
            .all(|j| normal[j].abs() <= AXIS_ALIGNED_MAX_OFF);
        if dominant.abs() < AXIS_ALIGNED_MIN || !off_axis_ok {
            return Err(not_aligned());
        }

        Ok(Self::new(axis, Sign::of(dominant)))
    }

    pub(crate) fn axis(self) -> Axis {
        match self {
            Face::R | Face::L => Axis::X,
            Face::U | Face::D => Axis::Y,
            Face::F | Face::B => Axis::Z,
        }
    }

    pub(crate) fn sign(self) -> Sign {
        match self {
            Face::R | Face::U | Face::F => Sign::Pos,
            Face::L | Face::D | Face::B => Sign::Neg,
        }
    }

    /// Unit lattice vector pointing out of this face.
    pub(crate) fn unit(self) -> Coords {
        Coords::unit(self.axis(), self.sign())
    }

    #[cfg(test)]
    pub(crate) fn vector(self) -> Vector3<f32> {
        self.axis().unit_vec3() * self.sign().float()
    }

    /// Color of the stickers on this face when the cube is solved.
    pub(crate) fn home_color(self) -> Color {
        match self {
            Face::R => Color::Orange,
            Face::L => Color::Red,
            Face::U => Color::White,
            Face::D => Color::Yellow,
            Face::F => Color::Blue,
            Face::B => Color::Green,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Face::R => "Right",
            Face::L => "Left",
            Face::U => "Up",
            Face::D => "Down",
            Face::F => "Front",
            Face::B => "Back",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Sticker colors, one per face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Color {
    Orange,
    Red,
    White,
    Yellow,
    Blue,
    Green,
}

impl Color {
    /// The face this color belongs to on a solved cube.
    pub(crate) fn home_face(self) -> Face {
        match self {
            Color::Orange => Face::R,
            Color::Red => Face::L,
            Color::White => Face::U,
            Color::Yellow => Face::D,
            Color::Blue => Face::F,
            Color::Green => Face::B,
        }
    }
}

impl From<Color> for Vector4<f32> {
    fn from(color: Color) -> Self {
        match color {
            Color::Orange => Vector4::new(1.0, 0.533, 0.0, 1.0),
            Color::Red => Vector4::new(1.0, 0.0, 0.0, 1.0),
            Color::White => Vector4::new(1.0, 1.0, 1.0, 1.0),
            Color::Yellow => Vector4::new(1.0, 1.0, 0.0, 1.0),
            Color::Blue => Vector4::new(0.0, 0.0, 1.0, 1.0),
            Color::Green => Vector4::new(0.0, 0.667, 0.0, 1.0),
        }
    }
}

/// Colored square on the outside of a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Sticker {
    pub(crate) color: Color,
    /// Unit lattice vector the sticker currently faces.
    pub(crate) facing: Coords,
}

/// Physical piece of the puzzle: a corner, edge, or center.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Piece {
    /// Slot this piece occupies when the cube is solved.
    pub(crate) home: Coords,
    pub(crate) stickers: Vec<Sticker>,
}

impl Piece {
    /// Creates the piece that belongs in `home`, with one sticker for each
    /// outward face of that slot.
    fn solved(home: Coords) -> Self {
        let stickers = Axis::ALL
            .into_iter()
            .filter(|&axis| home[axis] != 0)
            .map(|axis| {
                let face = Face::new(axis, Sign::of(home[axis] as f32));
                Sticker {
                    color: face.home_color(),
                    facing: face.unit(),
                }
            })
            .collect();
        Self { home, stickers }
    }

    #[must_use]
    fn turned(mut self, command: RotationCommand) -> Self {
        for sticker in &mut self.stickers {
            sticker.facing = command.turn(sticker.facing);
        }
        self
    }
}

/// Fixed lattice position together with the piece currently in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) coords: Coords,
    pub(crate) piece: Piece,
}

/// The whole cube.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CubeModel {
    slots: Vec<Slot>,
}

impl Default for CubeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeModel {
    /// Creates a cube in the solved state.
    pub(crate) fn new() -> Self {
        let slots = Coords::slots()
            .map(|coords| Slot {
                coords,
                piece: Piece::solved(coords),
            })
            .collect();
        Self { slots }
    }

    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[cfg(test)]
    pub(crate) fn piece_at(&self, coords: Coords) -> Option<&Piece> {
        self.slots
            .iter()
            .find(|slot| slot.coords == coords)
            .map(|slot| &slot.piece)
    }

    /// Twists one layer by a quarter turn.
    ///
    /// Each of the 9 pieces in the layer moves to the turned slot and its
    /// stickers turn with it. Slot coordinates are unchanged.
    pub(crate) fn apply(&mut self, command: RotationCommand) {
        let moved: Vec<(Coords, Piece)> = self
            .slots
            .iter()
            .filter(|slot| command.contains(slot.coords))
            .map(|slot| (command.turn(slot.coords), slot.piece.clone().turned(command)))
            .collect();

        for (dest, piece) in moved {
            if let Some(slot) = self.slots.iter_mut().find(|slot| slot.coords == dest) {
                slot.piece = piece;
            }
        }
    }

    /// Returns whether every sticker faces the face of its own color.
    pub(crate) fn is_solved(&self) -> bool {
        self.slots.iter().all(|slot| {
            slot.piece
                .stickers
                .iter()
                .all(|sticker| sticker.facing == sticker.color.home_face().unit())
        })
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}

/// World-space placement of the cubies.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct CubeLayout {
    /// Edge length of one cubie.
    pub(crate) cubie_size: f32,
    /// Space between neighboring cubies.
    pub(crate) gap: f32,
}

impl CubeLayout {
    /// Distance between the centers of neighboring cubies.
    pub(crate) fn spacing(&self) -> f32 {
        self.cubie_size + self.gap
    }

    pub(crate) fn slot_center(&self, coords: Coords) -> Point3<f32> {
        Point3::from(coords.to_vector() * self.spacing())
    }
}

/// Vertex of the unit cube mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct Vertex {
    pub(crate) position: [f32; 3],
    pub(crate) normal: [f32; 3],
}

const fn vertex(position: [f32; 3], normal: [f32; 3]) -> Vertex {
    Vertex { position, normal }
}

/// 24 vertices of a cube spanning -1..1 on each axis, 4 per face so that
/// each face has its own flat normal. Faces are wound counterclockwise when
/// seen from outside.
#[rustfmt::skip]
pub(crate) const VERTICES: &[Vertex] = &[
    // +X
    vertex([ 1.0, -1.0, -1.0], [ 1.0,  0.0,  0.0]),
    vertex([ 1.0,  1.0, -1.0], [ 1.0,  0.0,  0.0]),
    vertex([ 1.0,  1.0,  1.0], [ 1.0,  0.0,  0.0]),
    vertex([ 1.0, -1.0,  1.0], [ 1.0,  0.0,  0.0]),
    // -X
    vertex([-1.0, -1.0,  1.0], [-1.0,  0.0,  0.0]),
    vertex([-1.0,  1.0,  1.0], [-1.0,  0.0,  0.0]),
    vertex([-1.0,  1.0, -1.0], [-1.0,  0.0,  0.0]),
    vertex([-1.0, -1.0, -1.0], [-1.0,  0.0,  0.0]),
    // +Y
    vertex([-1.0,  1.0, -1.0], [ 0.0,  1.0,  0.0]),
    vertex([-1.0,  1.0,  1.0], [ 0.0,  1.0,  0.0]),
    vertex([ 1.0,  1.0,  1.0], [ 0.0,  1.0,  0.0]),
    vertex([ 1.0,  1.0, -1.0], [ 0.0,  1.0,  0.0]),
    // -Y
    vertex([-1.0, -1.0,  1.0], [ 0.0, -1.0,  0.0]),
    vertex([-1.0, -1.0, -1.0], [ 0.0, -1.0,  0.0]),
    vertex([ 1.0, -1.0, -1.0], [ 0.0, -1.0,  0.0]),
    vertex([ 1.0, -1.0,  1.0], [ 0.0, -1.0,  0.0]),
    // +Z
    vertex([-1.0, -1.0,  1.0], [ 0.0,  0.0,  1.0]),
    vertex([ 1.0, -1.0,  1.0], [ 0.0,  0.0,  1.0]),
    vertex([ 1.0,  1.0,  1.0], [ 0.0,  0.0,  1.0]),
    vertex([-1.0,  1.0,  1.0], [ 0.0,  0.0,  1.0]),
    // -Z
    vertex([ 1.0, -1.0, -1.0], [ 0.0,  0.0, -1.0]),
    vertex([-1.0, -1.0, -1.0], [ 0.0,  0.0, -1.0]),
    vertex([-1.0,  1.0, -1.0], [ 0.0,  0.0, -1.0]),
    vertex([ 1.0,  1.0, -1.0], [ 0.0,  0.0, -1.0]),
];

#[rustfmt::skip]
pub(crate) const INDICES: &[u16] = &[
    0, 1, 2, 2, 3, 0,       // +X
    4, 5, 6, 6, 7, 4,       // -X
    8, 9, 10, 10, 11, 8,    // +Y
    12, 13, 14, 14, 15, 12, // -Y
    16, 17, 18, 18, 19, 16, // +Z
    20, 21, 22, 22, 23, 20, // -Z
];
