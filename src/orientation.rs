//! Lookup tables for orientation-bearing block properties.
//!
//! Conventions: north is -z, east is +x, rotations are clockwise seen from
//! above. `left_right` mirrors across the x axis (z flips, north <-> south),
//! `front_back` across the z axis (x flips, east <-> west). These match how
//! [`crate::geometry`] moves positions, so a block keeps facing the same
//! neighbour after a transform.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::plan::PropertyValue;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Clockwise90),
            180 => Some(Rotation::Clockwise180),
            270 => Some(Rotation::Clockwise270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u16 {
        u16::from(self.quarter_turns()) * 90
    }

    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 1,
            Rotation::Clockwise180 => 2,
            Rotation::Clockwise270 => 3,
        }
    }

    fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Rotation::None,
            1 => Rotation::Clockwise90,
            2 => Rotation::Clockwise180,
            _ => Rotation::Clockwise270,
        }
    }

    /// `self` followed by `other`.
    pub fn then(self, other: Rotation) -> Rotation {
        Rotation::from_quarter_turns(self.quarter_turns() + other.quarter_turns())
    }

    /// The rotation that undoes `self`.
    pub fn inverse(self) -> Rotation {
        Rotation::from_quarter_turns(4 - self.quarter_turns())
    }

    /// Whether width and length trade places.
    pub fn swaps_horizontal(self) -> bool {
        self.quarter_turns() % 2 == 1
    }
}

impl FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u16>()
            .ok()
            .and_then(Rotation::from_degrees)
            .ok_or_else(|| format!("rotation must be one of 0, 90, 180, 270 (got '{}')", s))
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mirror {
    #[default]
    None,
    LeftRight,
    FrontBack,
}

impl Mirror {
    pub fn as_str(self) -> &'static str {
        match self {
            Mirror::None => "none",
            Mirror::LeftRight => "left_right",
            Mirror::FrontBack => "front_back",
        }
    }
}

impl FromStr for Mirror {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Mirror::None),
            "left_right" => Ok(Mirror::LeftRight),
            "front_back" => Ok(Mirror::FrontBack),
            _ => Err(format!(
                "mirror must be one of none, left_right, front_back (got '{}')",
                s
            )),
        }
    }
}

impl fmt::Display for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
    Up,
    Down,
}

/// Clockwise order.
const HORIZONTAL_RING: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "north" => Some(Direction::North),
            "east" => Some(Direction::East),
            "south" => Some(Direction::South),
            "west" => Some(Direction::West),
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub fn rotate(self, rotation: Rotation) -> Self {
        match HORIZONTAL_RING.iter().position(|d| *d == self) {
            Some(i) => HORIZONTAL_RING[(i + rotation.quarter_turns() as usize) % 4],
            None => self,
        }
    }

    pub fn mirror(self, mirror: Mirror) -> Self {
        match (mirror, self) {
            (Mirror::LeftRight, Direction::North) => Direction::South,
            (Mirror::LeftRight, Direction::South) => Direction::North,
            (Mirror::FrontBack, Direction::East) => Direction::West,
            (Mirror::FrontBack, Direction::West) => Direction::East,
            _ => self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    pub fn rotate(self, rotation: Rotation) -> Self {
        match (rotation.swaps_horizontal(), self) {
            (true, Axis::X) => Axis::Z,
            (true, Axis::Z) => Axis::X,
            _ => self,
        }
    }
}

/// 16-step `rotation` property: 0 is south, steps run clockwise.
pub const ROTATION_STEPS: u8 = 16;

pub fn rotate_rotation16(value: u8, rotation: Rotation) -> u8 {
    (value + 4 * rotation.quarter_turns()) % ROTATION_STEPS
}

pub fn mirror_rotation16(value: u8, mirror: Mirror) -> u8 {
    match mirror {
        Mirror::None => value,
        Mirror::LeftRight => (ROTATION_STEPS + ROTATION_STEPS / 2 - value) % ROTATION_STEPS,
        Mirror::FrontBack => (ROTATION_STEPS - value) % ROTATION_STEPS,
    }
}

/// The twelve `<front>_<top>` values of the jigsaw `orientation` property.
pub const JIGSAW_ORIENTATIONS: [&str; 12] = [
    "down_east",
    "down_north",
    "down_south",
    "down_west",
    "east_up",
    "north_up",
    "south_up",
    "up_east",
    "up_north",
    "up_south",
    "up_west",
    "west_up",
];

/// One step of a plan transform, as seen by the property tables.
#[derive(Debug, Clone, Copy)]
pub enum Transform {
    Rotate(Rotation),
    Mirror(Mirror),
}

impl Transform {
    pub fn direction(self, direction: Direction) -> Direction {
        match self {
            Transform::Rotate(r) => direction.rotate(r),
            Transform::Mirror(m) => direction.mirror(m),
        }
    }

    pub fn axis(self, axis: Axis) -> Axis {
        match self {
            Transform::Rotate(r) => axis.rotate(r),
            Transform::Mirror(_) => axis,
        }
    }

    pub fn rotation16(self, value: u8) -> u8 {
        match self {
            Transform::Rotate(r) => rotate_rotation16(value, r),
            Transform::Mirror(m) => mirror_rotation16(value, m),
        }
    }

    /// Maps a jigsaw orientation such as `north_up`; unknown values pass through.
    pub fn jigsaw_orientation(self, orientation: &str) -> String {
        match orientation.split_once('_') {
            Some((front, top)) => format!("{}_{}", self.direction_name(front), self.direction_name(top)),
            None => orientation.to_owned(),
        }
    }

    fn direction_name(self, name: &str) -> String {
        match Direction::parse(name) {
            Some(d) => self.direction(d).as_str().to_owned(),
            None => name.to_owned(),
        }
    }

    /// Remaps every orientation-bearing property of a block.
    ///
    /// Values the tables do not recognise are kept as they are; the caller
    /// re-validates the result against the allowlist.
    pub fn properties(
        self,
        properties: &BTreeMap<String, PropertyValue>,
    ) -> BTreeMap<String, PropertyValue> {
        properties
            .iter()
            .map(|(key, value)| match (key.as_str(), value) {
                ("facing" | "horizontal_facing", PropertyValue::String(s)) => {
                    (key.clone(), PropertyValue::String(self.direction_name(s)))
                }
                ("axis", PropertyValue::String(s)) => {
                    let mapped = Axis::parse(s).map(|a| self.axis(a).as_str().to_owned());
                    (key.clone(), PropertyValue::String(mapped.unwrap_or_else(|| s.clone())))
                }
                ("rotation", value) => (key.clone(), self.rotation_value(value)),
                ("orientation", PropertyValue::String(s)) => {
                    (key.clone(), PropertyValue::String(self.jigsaw_orientation(s)))
                }
                ("north" | "east" | "south" | "west", _) => {
                    (self.direction_name(key), value.clone())
                }
                _ => (key.clone(), value.clone()),
            })
            .collect()
    }

    fn rotation_value(self, value: &PropertyValue) -> PropertyValue {
        let in_range = |v: i64| u8::try_from(v).ok().filter(|v| *v < ROTATION_STEPS);
        match value {
            PropertyValue::Int(v) => match in_range(*v) {
                Some(step) => PropertyValue::Int(i64::from(self.rotation16(step))),
                None => value.clone(),
            },
            PropertyValue::String(s) => match s.parse::<i64>().ok().and_then(in_range) {
                Some(step) => PropertyValue::String(self.rotation16(step).to_string()),
                None => value.clone(),
            },
            PropertyValue::Bool(_) => value.clone(),
        }
    }
}
