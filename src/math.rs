//! Integer lattice math for the 3x3x3 cube.
//!
//! Every cubie slot sits on a lattice point with coordinates in {-1, 0, 1}.
//! Sticker facings are unit lattice vectors. Slice turns are quarter turns of
//! these vectors about one of the three axes.

use std::fmt;
use std::ops::{Index, IndexMut};

use nalgebra::Vector3;

/// 3-dimensional axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Axis {
    /// X axis (right).
    X = 0,
    /// Y axis (up).
    Y = 1,
    /// Z axis (towards the default camera).
    Z = 2,
}

impl Axis {
    pub(crate) const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Returns the perpendicular axes from this one, using the left-hand rule.
    /// A clockwise quarter turn about the positive end of `self` carries the
    /// first axis onto the second.
    pub(crate) fn perpendiculars(self) -> [Axis; 2] {
        match self {
            Axis::X => [Axis::Z, Axis::Y],
            Axis::Y => [Axis::X, Axis::Z],
            Axis::Z => [Axis::Y, Axis::X],
        }
    }

    /// Returns the unit vector along this axis.
    pub(crate) fn unit_vec3(self) -> Vector3<f32> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
            Axis::Z => write!(f, "Z"),
        }
    }
}

/// Sign of a direction along an axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Sign {
    Pos,
    Neg,
}

impl Sign {
    /// Sign of a float. Zero counts as positive.
    pub(crate) fn of(value: f32) -> Self {
        if value < 0.0 { Sign::Neg } else { Sign::Pos }
    }

    pub(crate) fn int(self) -> i8 {
        match self {
            Sign::Pos => 1,
            Sign::Neg => -1,
        }
    }

    pub(crate) fn float(self) -> f32 {
        self.int() as f32
    }

    #[must_use]
    pub(crate) fn flip(self) -> Self {
        match self {
            Sign::Pos => Sign::Neg,
            Sign::Neg => Sign::Pos,
        }
    }
}

impl std::ops::Mul for Sign {
    type Output = Sign;

    fn mul(self, rhs: Sign) -> Sign {
        if self == rhs { Sign::Pos } else { Sign::Neg }
    }
}

/// Integer lattice coordinates, each component in {-1, 0, 1}.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Coords(pub(crate) [i8; 3]);

impl Coords {
    pub(crate) const fn new(x: i8, y: i8, z: i8) -> Self {
        Self([x, y, z])
    }

    /// Unit lattice vector pointing along `axis` with the given sign.
    pub(crate) fn unit(axis: Axis, sign: Sign) -> Self {
        let mut ret = Self::new(0, 0, 0);
        ret[axis] = sign.int();
        ret
    }

    /// All 26 slot coordinates of a 3x3x3 cube, excluding the hidden core.
    pub(crate) fn slots() -> impl Iterator<Item = Coords> {
        const POSITIONS: [i8; 3] = [-1, 0, 1];
        POSITIONS.into_iter().flat_map(|x| {
            POSITIONS.into_iter().flat_map(move |y| {
                POSITIONS
                    .into_iter()
                    .map(move |z| Coords::new(x, y, z))
                    .filter(|c| !c.is_origin())
            })
        })
    }

    pub(crate) fn is_origin(self) -> bool {
        self.0 == [0, 0, 0]
    }

    /// Quarter turn carrying the `from` axis onto the `to` axis.
    #[must_use]
    pub(crate) fn rotate(mut self, from: Axis, to: Axis) -> Self {
        let (a, b) = (self[from], self[to]);
        self[to] = a;
        self[from] = -b;
        self
    }

    /// Quarter turn about `axis`, clockwise as seen from its positive end.
    #[must_use]
    pub(crate) fn turn_cw(self, axis: Axis) -> Self {
        let [a, b] = axis.perpendiculars();
        self.rotate(a, b)
    }

    /// Quarter turn about `axis`, counterclockwise as seen from its positive
    /// end.
    #[must_use]
    pub(crate) fn turn_ccw(self, axis: Axis) -> Self {
        let [a, b] = axis.perpendiculars();
        self.rotate(b, a)
    }

    pub(crate) fn to_vector(self) -> Vector3<f32> {
        Vector3::new(self.0[0] as f32, self.0[1] as f32, self.0[2] as f32)
    }
}

impl Index<Axis> for Coords {
    type Output = i8;

    fn index(&self, axis: Axis) -> &Self::Output {
        &self.0[axis as usize]
    }
}

impl IndexMut<Axis> for Coords {
    fn index_mut(&mut self, axis: Axis) -> &mut Self::Output {
        &mut self.0[axis as usize]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.0;
        write!(f, "({x}, {y}, {z})")
    }
}
