use crate::board::Board;
use crate::piece::{MovementPattern, Piece, Position};

/// Movement legality for placed pieces. Stateless; never mutates the board.
pub struct MovementRules;

impl MovementRules {
    /// Whether `piece` may move from its current cell to `to`
    pub fn is_legal(piece: &Piece, to: Position, board: &Board) -> bool {
        let Some(from) = piece.position else {
            return false;
        };

        if !to.in_bounds() || from == to {
            return false;
        }

        if !Self::can_land(piece, to, board) {
            return false;
        }

        let dx = from.x.abs_diff(to.x);
        let dy = from.y.abs_diff(to.y);

        match piece.pattern() {
            MovementPattern::LShape => (dx == 2 && dy == 1) || (dx == 1 && dy == 2),
            MovementPattern::Cross => Self::is_straight(dx, dy) && Self::path_clear(from, to, board),
            MovementPattern::Diagonal => {
                Self::is_diagonal(dx, dy) && Self::path_clear(from, to, board)
            }
            MovementPattern::Star => {
                (Self::is_straight(dx, dy) || Self::is_diagonal(dx, dy))
                    && Self::path_clear(from, to, board)
            }
        }
    }

    /// The destination must be empty or topped by a stronger rank
    pub fn can_land(piece: &Piece, to: Position, board: &Board) -> bool {
        match board.top_rank(to) {
            None => true,
            Some(top) => top > piece.rank,
        }
    }

    fn is_straight(dx: usize, dy: usize) -> bool {
        (dx == 0) != (dy == 0)
    }

    fn is_diagonal(dx: usize, dy: usize) -> bool {
        dx == dy && dx > 0
    }

    /// Every cell strictly between `from` and `to` on a straight or diagonal line is empty
    fn path_clear(from: Position, to: Position, board: &Board) -> bool {
        let step_x = (to.x as i32 - from.x as i32).signum();
        let step_y = (to.y as i32 - from.y as i32).signum();

        let mut x = from.x as i32 + step_x;
        let mut y = from.y as i32 + step_y;

        while (x, y) != (to.x as i32, to.y as i32) {
            if !board.is_empty_cell(Position::new(x as usize, y as usize)) {
                return false;
            }
            x += step_x;
            y += step_y;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Stack;
    use crate::piece::{Rank, Side};

    fn placed(side: Side, rank: Rank, x: usize, y: usize, board: &mut Board) -> Piece {
        board.push(Position::new(x, y), rank);
        Piece {
            side,
            rank,
            position: Some(Position::new(x, y)),
        }
    }

    #[test]
    fn test_cross_open_file() {
        let mut board = Board::new();
        let donkey = placed(Side::Blue, Rank::Donkey, 0, 0, &mut board);
        assert!(MovementRules::is_legal(&donkey, Position::new(0, 4), &board));
        assert!(MovementRules::is_legal(&donkey, Position::new(4, 0), &board));
        assert!(!MovementRules::is_legal(&donkey, Position::new(1, 1), &board));
    }

    #[test]
    fn test_cross_blocked_path() {
        let mut board = Board::new();
        let donkey = placed(Side::Blue, Rank::Donkey, 0, 0, &mut board);
        board.push(Position::new(0, 2), Rank::Rooster);
        assert!(!MovementRules::is_legal(&donkey, Position::new(0, 4), &board));
        // Adjacent cell before the blocker is still reachable
        assert!(MovementRules::is_legal(&donkey, Position::new(0, 1), &board));
    }

    #[test]
    fn test_landing_requires_stronger_top() {
        let mut board = Board::new();
        let dog = placed(Side::Blue, Rank::Dog, 1, 1, &mut board);
        board.push(Position::new(2, 2), Rank::Donkey);
        assert!(MovementRules::is_legal(&dog, Position::new(2, 2), &board));

        board.set_stack(Position::new(3, 3), Stack::from_ranks(&[Rank::Dog]));
        let dog_far = Piece {
            position: Some(Position::new(4, 4)),
            ..dog
        };
        // Same rank on top: not allowed
        assert!(!MovementRules::is_legal(&dog_far, Position::new(3, 3), &board));
    }

    #[test]
    fn test_diagonal_rules() {
        let mut board = Board::new();
        let dog = placed(Side::Orange, Rank::Dog, 0, 4, &mut board);
        assert!(MovementRules::is_legal(&dog, Position::new(4, 0), &board));
        assert!(!MovementRules::is_legal(&dog, Position::new(0, 2), &board));
        assert!(!MovementRules::is_legal(&dog, Position::new(2, 1), &board));

        board.push(Position::new(2, 2), Rank::Donkey);
        assert!(!MovementRules::is_legal(&dog, Position::new(4, 0), &board));
        assert!(MovementRules::is_legal(&dog, Position::new(2, 2), &board));
    }

    #[test]
    fn test_star_moves_both_ways() {
        let mut board = Board::new();
        let rooster = placed(Side::Blue, Rank::Rooster, 2, 0, &mut board);
        assert!(MovementRules::is_legal(&rooster, Position::new(2, 4), &board));
        assert!(MovementRules::is_legal(&rooster, Position::new(4, 2), &board));
        assert!(MovementRules::is_legal(&rooster, Position::new(0, 2), &board));
        assert!(!MovementRules::is_legal(&rooster, Position::new(3, 2), &board));

        board.push(Position::new(3, 1), Rank::Cat);
        assert!(!MovementRules::is_legal(&rooster, Position::new(4, 2), &board));
    }

    #[test]
    fn test_lshape_jumps_over_pieces() {
        let mut board = Board::new();
        let cat = placed(Side::Blue, Rank::Cat, 1, 0, &mut board);
        board.push(Position::new(1, 1), Rank::Donkey);
        board.push(Position::new(2, 1), Rank::Donkey);
        assert!(MovementRules::is_legal(&cat, Position::new(2, 2), &board));
        assert!(MovementRules::is_legal(&cat, Position::new(3, 1), &board));
        assert!(MovementRules::is_legal(&cat, Position::new(0, 2), &board));
        assert!(!MovementRules::is_legal(&cat, Position::new(1, 2), &board));
    }

    #[test]
    fn test_rejects_degenerate_destinations() {
        let mut board = Board::new();
        let donkey = placed(Side::Blue, Rank::Donkey, 0, 0, &mut board);
        assert!(!MovementRules::is_legal(&donkey, Position::new(0, 0), &board));
        assert!(!MovementRules::is_legal(&donkey, Position::new(0, 5), &board));

        let unplaced = Piece::new(Side::Blue, Rank::Dog);
        assert!(!MovementRules::is_legal(&unplaced, Position::new(1, 1), &board));
    }
}
