//! Fixed side constraint model.
//!
//! A fixed side is one of the six faces of the joint cube where a timber
//! component continues into its solid body. One fixed side makes an end
//! joint (L-like), two opposite fixed sides a mid-span joint (T/X-like).
//!
//! Textual form, used by the design file: `axis,direction` per side, sides
//! of one component joined by `.`, components joined by `:`
//! (for example `2,0:2,1`).

use crate::error::{JointError, JointResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three cube axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Axis> {
        Self::ALL.get(index).copied()
    }

    /// The two remaining axes in ascending order.
    pub fn others(self) -> [Axis; 2] {
        match self {
            Axis::X => [Axis::Y, Axis::Z],
            Axis::Y => [Axis::X, Axis::Z],
            Axis::Z => [Axis::X, Axis::Y],
        }
    }

    /// Position of `other` within the plane perpendicular to `self`.
    pub fn plane_index(self, other: Axis) -> Option<usize> {
        self.others().iter().position(|a| *a == other)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// Side of the cube along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The face at the low end of the axis.
    Negative,
    /// The face at the high end of the axis.
    Positive,
}

impl Direction {
    pub fn index(self) -> usize {
        match self {
            Direction::Negative => 0,
            Direction::Positive => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Direction> {
        match index {
            0 => Some(Direction::Negative),
            1 => Some(Direction::Positive),
            _ => None,
        }
    }

    /// `-1.0` or `1.0`.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Negative => -1.0,
            Direction::Positive => 1.0,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Negative => Direction::Positive,
            Direction::Positive => Direction::Negative,
        }
    }
}

/// A cube face rigidly attached to a timber's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedSide {
    pub axis: Axis,
    pub direction: Direction,
}

impl FixedSide {
    pub fn new(axis: Axis, direction: Direction) -> Self {
        Self { axis, direction }
    }

    /// True when no side in `sides` names the same face.
    pub fn is_unique_among_sides(&self, sides: &[FixedSide]) -> bool {
        !sides.iter().any(|side| side == self)
    }

    /// True when no component in `groups` claims the same face.
    pub fn is_unique_among_grouped_sides(&self, groups: &[Vec<FixedSide>]) -> bool {
        groups.iter().all(|sides| self.is_unique_among_sides(sides))
    }

    /// All six faces in axis-major order.
    pub fn all() -> impl Iterator<Item = FixedSide> {
        Axis::ALL.into_iter().flat_map(|axis| {
            [Direction::Negative, Direction::Positive]
                .into_iter()
                .map(move |direction| FixedSide::new(axis, direction))
        })
    }
}

impl fmt::Display for FixedSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.axis.index(), self.direction.index())
    }
}

impl FromStr for FixedSide {
    type Err = JointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = |reason: &str| JointError::ParseFixedSides {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let (ax, dir) = s
            .trim()
            .split_once(',')
            .ok_or_else(|| parse_err("expected 'axis,direction'"))?;
        let ax = parse_index(ax).ok_or_else(|| parse_err("axis is not a number"))?;
        let dir = parse_index(dir).ok_or_else(|| parse_err("direction is not a number"))?;
        let axis = Axis::from_index(ax).ok_or_else(|| parse_err("axis must be 0, 1 or 2"))?;
        let direction =
            Direction::from_index(dir).ok_or_else(|| parse_err("direction must be 0 or 1"))?;
        Ok(FixedSide::new(axis, direction))
    }
}

// Older files write indices as floats ("2.0").
fn parse_index(s: &str) -> Option<usize> {
    let s = s.trim();
    if let Ok(v) = s.parse::<usize>() {
        return Some(v);
    }
    let v = s.parse::<f64>().ok()?;
    (v >= 0.0 && v.fract() == 0.0).then_some(v as usize)
}

/// Fixed sides of every component plus the derived face bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSides {
    sides: Vec<Vec<FixedSide>>,
    unblocked: Vec<FixedSide>,
    rotation_allowed: bool,
}

impl FixedSides {
    /// Build the model and derive unblocked faces for `sliding_axis`.
    pub fn new(sides: Vec<Vec<FixedSide>>, sliding_axis: Axis) -> Self {
        let mut fixed = Self {
            sides,
            unblocked: Vec::new(),
            rotation_allowed: true,
        };
        fixed.update_unblocked(sliding_axis);
        fixed
    }

    /// Recompute the unclaimed faces and whether the grid may be rotated.
    ///
    /// Rotation is disallowed as soon as any component has a fixed side on
    /// the sliding axis.
    pub fn update_unblocked(&mut self, sliding_axis: Axis) {
        self.unblocked = FixedSide::all()
            .filter(|side| side.is_unique_among_grouped_sides(&self.sides))
            .collect();
        self.rotation_allowed = !self
            .sides
            .iter()
            .flatten()
            .any(|side| side.axis == sliding_axis);
    }

    pub fn sides(&self) -> &[Vec<FixedSide>] {
        &self.sides
    }

    pub fn component(&self, n: usize) -> &[FixedSide] {
        &self.sides[n]
    }

    pub fn component_count(&self) -> usize {
        self.sides.len()
    }

    pub fn unblocked(&self) -> &[FixedSide] {
        &self.unblocked
    }

    pub fn rotation_allowed(&self) -> bool {
        self.rotation_allowed
    }

    /// First listed side of a component; it defines the component axis.
    pub fn primary(&self, n: usize) -> FixedSide {
        self.sides[n][0]
    }

    /// Check the structural invariants: every component has a side and no
    /// face is claimed twice.
    pub fn validate(&self) -> JointResult<()> {
        for (n, sides) in self.sides.iter().enumerate() {
            if sides.is_empty() {
                return Err(JointError::InvalidFixedSides(format!(
                    "component {} has no fixed side",
                    n
                )));
            }
            for (i, side) in sides.iter().enumerate() {
                if !side.is_unique_among_sides(&sides[i + 1..]) {
                    return Err(JointError::SideTaken(side.to_string()));
                }
                let others: Vec<Vec<FixedSide>> = self
                    .sides
                    .iter()
                    .enumerate()
                    .filter(|(m, _)| *m != n)
                    .map(|(_, s)| s.clone())
                    .collect();
                if !side.is_unique_among_grouped_sides(&others) {
                    return Err(JointError::SideTaken(side.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Whether a fixed side prevents sliding along `axis`.
    ///
    /// The first component may sit on the negative face and the last one on
    /// the positive face of the sliding axis; any other side on that axis
    /// blocks it.
    pub fn blocks_sliding_axis(&self, axis: Axis) -> bool {
        let last = self.sides.len().saturating_sub(1);
        self.sides.iter().enumerate().any(|(n, sides)| {
            sides.iter().any(|side| {
                side.axis == axis
                    && !(side.direction == Direction::Negative && n == 0)
                    && !(side.direction == Direction::Positive && n == last)
            })
        })
    }

    /// Preview check for moving or rotating component `n` onto `candidate`.
    ///
    /// The candidate is blocked when it claims a face that is neither one of
    /// the component's current faces nor free, or when it puts a face on the
    /// sliding axis out of stacking order. Re-selecting the current faces is
    /// never blocked.
    pub fn relocation_blocked(&self, n: usize, candidate: &[FixedSide], sliding_axis: Axis) -> bool {
        let current = &self.sides[n];
        let last = self.sides.len().saturating_sub(1);
        if candidate
            .iter()
            .all(|side| !side.is_unique_among_sides(current))
        {
            return false;
        }
        candidate.iter().any(|side| {
            let taken = side.is_unique_among_sides(current) && side.is_unique_among_sides(&self.unblocked);
            let out_of_order = side.axis == sliding_axis
                && ((side.direction == Direction::Negative && n != 0)
                    || (side.direction == Direction::Positive && n != last));
            taken || out_of_order
        })
    }

    pub(crate) fn set_component(&mut self, n: usize, sides: Vec<FixedSide>, sliding_axis: Axis) {
        self.sides[n] = sides;
        self.update_unblocked(sliding_axis);
    }

    pub(crate) fn insert_component(&mut self, n: usize, sides: Vec<FixedSide>, sliding_axis: Axis) {
        self.sides.insert(n, sides);
        self.update_unblocked(sliding_axis);
    }

    pub(crate) fn truncate(&mut self, count: usize, sliding_axis: Axis) {
        self.sides.truncate(count);
        self.update_unblocked(sliding_axis);
    }
}

impl Default for FixedSides {
    /// Two components stacked along Z.
    fn default() -> Self {
        Self::new(
            vec![
                vec![FixedSide::new(Axis::Z, Direction::Negative)],
                vec![FixedSide::new(Axis::Z, Direction::Positive)],
            ],
            Axis::Z,
        )
    }
}

impl fmt::Display for FixedSides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<String> = self
            .sides
            .iter()
            .map(|sides| {
                sides
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(".")
            })
            .collect();
        write!(f, "{}", groups.join(":"))
    }
}

/// Parse the `ax,dir.ax,dir:ax,dir` form into per-component side lists.
pub fn parse_side_groups(input: &str) -> JointResult<Vec<Vec<FixedSide>>> {
    input
        .trim()
        .split(':')
        .map(|group| group.split('.').map(str::parse).collect())
        .collect()
}
