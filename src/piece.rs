use serde::{Deserialize, Serialize};
use std::fmt;

/// Board size constant (the board is always square)
pub const BOARD_SIZE: usize = 5;

/// Piece strength, weakest to strongest.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Rooster = 1,
    Cat = 2,
    Dog = 3,
    Donkey = 4,
}

impl Rank {
    pub const ALL: [Rank; 4] = [Rank::Rooster, Rank::Cat, Rank::Dog, Rank::Donkey];

    pub fn from_u8(value: u8) -> Option<Rank> {
        match value {
            1 => Some(Rank::Rooster),
            2 => Some(Rank::Cat),
            3 => Some(Rank::Dog),
            4 => Some(Rank::Donkey),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    /// Zero-based index, usable for per-rank arrays
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn name(&self) -> &str {
        match self {
            Rank::Rooster => "Rooster",
            Rank::Cat => "Cat",
            Rank::Dog => "Dog",
            Rank::Donkey => "Donkey",
        }
    }

    /// The movement pattern is fixed per rank and identical for both sides
    pub fn pattern(self) -> MovementPattern {
        match self {
            Rank::Rooster => MovementPattern::Star,
            Rank::Cat => MovementPattern::LShape,
            Rank::Dog => MovementPattern::Diagonal,
            Rank::Donkey => MovementPattern::Cross,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementPattern {
    /// Any straight or diagonal line
    Star,
    /// Fixed 2-by-1 jump
    LShape,
    /// Horizontal or vertical line
    Cross,
    /// Diagonal line
    Diagonal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Blue,
    Orange,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Blue, Side::Orange];

    pub fn opponent(&self) -> Side {
        match self {
            Side::Blue => Side::Orange,
            Side::Orange => Side::Blue,
        }
    }

    /// Row where this side places its pieces and where retreats are detected
    pub fn home_row(&self) -> usize {
        match self {
            Side::Blue => 0,
            Side::Orange => BOARD_SIZE - 1,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Side::Blue => 0,
            Side::Orange => 1,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Side::Blue => "Blue",
            Side::Orange => "Orange",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Cell coordinates: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    pub fn in_bounds(&self) -> bool {
        self.x < BOARD_SIZE && self.y < BOARD_SIZE
    }

    /// All cells of the board, row by row
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|y| (0..BOARD_SIZE).map(move |x| Position::new(x, y)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A side's piece of a given rank. `position` is `None` until placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub side: Side,
    pub rank: Rank,
    pub position: Option<Position>,
}

impl Piece {
    pub fn new(side: Side, rank: Rank) -> Self {
        Piece {
            side,
            rank,
            position: None,
        }
    }

    pub fn pattern(&self) -> MovementPattern {
        self.rank.pattern()
    }

    pub fn is_placed(&self) -> bool {
        self.position.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_roundtrip_and_order() {
        for rank in Rank::ALL {
            assert_eq!(Rank::from_u8(rank.value()), Some(rank));
        }
        assert_eq!(Rank::from_u8(0), None);
        assert_eq!(Rank::from_u8(5), None);
        assert!(Rank::Rooster < Rank::Cat);
        assert!(Rank::Dog < Rank::Donkey);
    }

    #[test]
    fn test_pattern_mapping() {
        assert_eq!(Rank::Rooster.pattern(), MovementPattern::Star);
        assert_eq!(Rank::Cat.pattern(), MovementPattern::LShape);
        assert_eq!(Rank::Dog.pattern(), MovementPattern::Diagonal);
        assert_eq!(Rank::Donkey.pattern(), MovementPattern::Cross);
    }

    #[test]
    fn test_home_rows() {
        assert_eq!(Side::Blue.home_row(), 0);
        assert_eq!(Side::Orange.home_row(), 4);
        assert_eq!(Side::Blue.opponent(), Side::Orange);
    }

    #[test]
    fn test_bounds() {
        assert!(Position::new(4, 4).in_bounds());
        assert!(!Position::new(5, 0).in_bounds());
        assert!(!Position::new(0, 5).in_bounds());
        assert_eq!(Position::all().count(), 25);
    }
}
