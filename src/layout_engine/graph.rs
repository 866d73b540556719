use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Orientation {
    /// Children are laid out left to right.
    Horizontal,
    /// Children are laid out top to bottom.
    Vertical,
}

impl Orientation {
    pub fn perpendicular(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    /// Whether this direction points toward the first child of a split.
    pub fn is_toward_start(self) -> bool { matches!(self, Direction::Left | Direction::Up) }

    /// Index of the sibling next to `i` in this direction, if any.
    pub fn step(self, i: usize, len: usize) -> Option<usize> {
        if self.is_toward_start() {
            i.checked_sub(1)
        } else {
            (i + 1 < len).then_some(i + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    mod direction_operations {
        use super::*;

        #[test]
        fn direction_step() {
            assert_eq!(Direction::Right.step(0, 3), Some(1));
            assert_eq!(Direction::Right.step(2, 3), None);
            assert_eq!(Direction::Left.step(0, 3), None);
            assert_eq!(Direction::Up.step(2, 3), Some(1));
            assert_eq!(Direction::Down.step(1, 3), Some(2));
        }

        #[test]
        fn direction_orientation() {
            assert_eq!(Direction::Left.orientation(), Orientation::Horizontal);
            assert_eq!(Direction::Right.orientation(), Orientation::Horizontal);
            assert_eq!(Direction::Up.orientation(), Orientation::Vertical);
            assert_eq!(Direction::Down.orientation(), Orientation::Vertical);
        }

        #[test]
        fn direction_parses_from_command_names() {
            assert_eq!(Direction::from_str("up"), Ok(Direction::Up));
            assert_eq!(Direction::from_str("Left"), Ok(Direction::Left));
            assert!(Direction::from_str("sideways").is_err());
            assert_eq!(Direction::Down.to_string(), "down");
        }
    }

    mod orientation_operations {
        use super::*;

        #[test]
        fn perpendicular_flips() {
            assert_eq!(Orientation::Horizontal.perpendicular(), Orientation::Vertical);
            assert_eq!(Orientation::Vertical.perpendicular(), Orientation::Horizontal);
        }
    }
}
