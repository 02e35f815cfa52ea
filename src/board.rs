use crate::piece::{BOARD_SIZE, Position, Rank};
use serde::{Deserialize, Serialize};

/// A stack never holds more than one piece of each rank
pub const MAX_STACK: usize = 4;

/// Ranks piled on a single cell, bottom first.
///
/// The container does no legality checking: it only knows how to push,
/// split and merge. Keeping stacks strictly descending is the job of the
/// movement rules and the move executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stack {
    ranks: [Option<Rank>; MAX_STACK],
    len: usize,
}

impl Stack {
    pub fn new() -> Self {
        Stack::default()
    }

    /// Build a stack from bottom-to-top ranks. Extra ranks past capacity are dropped.
    pub fn from_ranks(ranks: &[Rank]) -> Self {
        let mut stack = Stack::new();
        for &rank in ranks {
            stack.push(rank);
        }
        stack
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == MAX_STACK
    }

    pub fn get(&self, index: usize) -> Option<Rank> {
        if index < self.len {
            self.ranks[index]
        } else {
            None
        }
    }

    pub fn top(&self) -> Option<Rank> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn bottom(&self) -> Option<Rank> {
        self.get(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Rank> + '_ {
        self.ranks[..self.len].iter().flatten().copied()
    }

    pub fn to_vec(&self) -> Vec<Rank> {
        self.iter().collect()
    }

    /// Rank values bottom to top, e.g. `[4, 3, 2]`
    pub fn values(&self) -> Vec<u8> {
        self.iter().map(Rank::value).collect()
    }

    pub fn contains(&self, rank: Rank) -> bool {
        self.iter().any(|r| r == rank)
    }

    pub fn index_of(&self, rank: Rank) -> Option<usize> {
        self.iter().position(|r| r == rank)
    }

    /// Returns `false` when the stack is already full
    pub fn push(&mut self, rank: Rank) -> bool {
        if self.is_full() {
            return false;
        }
        self.ranks[self.len] = Some(rank);
        self.len += 1;
        true
    }

    /// Split into the portion strictly below `index` and the portion at and above it
    pub fn split_at(&self, index: usize) -> (Stack, Stack) {
        let split = index.min(self.len);
        let remaining = Stack::from_ranks(&self.to_vec()[..split]);
        let removed = Stack::from_ranks(&self.to_vec()[split..]);
        (remaining, removed)
    }

    /// Append `incoming` on top. Returns `false` (leaving `self` untouched) on overflow.
    pub fn merge(&mut self, incoming: &Stack) -> bool {
        if self.len + incoming.len > MAX_STACK {
            return false;
        }
        for rank in incoming.iter() {
            self.push(rank);
        }
        true
    }

    /// Strictly decreasing from bottom to top
    pub fn is_descending(&self) -> bool {
        let ranks = self.to_vec();
        ranks.windows(2).all(|w| w[0] > w[1])
    }
}

/// 5x5 grid of stacks, indexed `[y][x]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [[Stack; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    pub fn size(&self) -> usize {
        BOARD_SIZE
    }

    /// Out-of-bounds cells read as empty
    pub fn stack(&self, pos: Position) -> Stack {
        if pos.in_bounds() {
            self.cells[pos.y][pos.x]
        } else {
            Stack::new()
        }
    }

    pub fn set_stack(&mut self, pos: Position, stack: Stack) {
        if pos.in_bounds() {
            self.cells[pos.y][pos.x] = stack;
        }
    }

    pub fn top_rank(&self, pos: Position) -> Option<Rank> {
        self.stack(pos).top()
    }

    pub fn is_empty_cell(&self, pos: Position) -> bool {
        self.stack(pos).is_empty()
    }

    pub fn push(&mut self, pos: Position, rank: Rank) -> bool {
        if !pos.in_bounds() {
            return false;
        }
        self.cells[pos.y][pos.x].push(rank)
    }

    /// Leave the lower part at `pos` and hand back `(remaining, removed)`
    pub fn split_at(&mut self, pos: Position, index: usize) -> (Stack, Stack) {
        let (remaining, removed) = self.stack(pos).split_at(index);
        self.set_stack(pos, remaining);
        (remaining, removed)
    }

    /// Remove and return the whole stack at `pos`
    pub fn take(&mut self, pos: Position) -> Stack {
        self.split_at(pos, 0).1
    }

    pub fn merge(&mut self, pos: Position, incoming: &Stack) -> bool {
        if !pos.in_bounds() {
            return false;
        }
        self.cells[pos.y][pos.x].merge(incoming)
    }

    /// Number of occurrences of each rank across the whole board, indexed by `Rank::index`
    pub fn rank_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for pos in Position::all() {
            for rank in self.stack(pos).iter() {
                counts[rank.index()] += 1;
            }
        }
        counts
    }

    /// Read-only snapshot of rank values per cell, `[y][x]`, for rendering
    pub fn snapshot(&self) -> Vec<Vec<Vec<u8>>> {
        (0..BOARD_SIZE)
            .map(|y| {
                (0..BOARD_SIZE)
                    .map(|x| self.stack(Position::new(x, y)).values())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Rank::*;

    #[test]
    fn test_push_and_top() {
        let mut board = Board::new();
        let pos = Position::new(1, 2);
        assert_eq!(board.top_rank(pos), None);
        assert!(board.push(pos, Donkey));
        assert!(board.push(pos, Cat));
        assert_eq!(board.top_rank(pos), Some(Cat));
        assert_eq!(board.stack(pos).bottom(), Some(Donkey));
        assert_eq!(board.stack(pos).values(), vec![4, 2]);
    }

    #[test]
    fn test_push_rejects_overflow() {
        let mut stack = Stack::from_ranks(&[Donkey, Dog, Cat, Rooster]);
        assert!(stack.is_full());
        assert!(!stack.push(Rooster));
        assert_eq!(stack.len(), 4);
    }

    #[test]
    fn test_split_keeps_base() {
        let mut board = Board::new();
        let pos = Position::new(0, 0);
        board.set_stack(pos, Stack::from_ranks(&[Donkey, Dog, Rooster]));

        let (remaining, removed) = board.split_at(pos, 1);
        assert_eq!(remaining.to_vec(), vec![Donkey]);
        assert_eq!(removed.to_vec(), vec![Dog, Rooster]);
        assert_eq!(board.stack(pos).to_vec(), vec![Donkey]);
    }

    #[test]
    fn test_take_empties_cell() {
        let mut board = Board::new();
        let pos = Position::new(3, 3);
        board.set_stack(pos, Stack::from_ranks(&[Dog, Cat]));
        let taken = board.take(pos);
        assert_eq!(taken.values(), vec![3, 2]);
        assert!(board.is_empty_cell(pos));
    }

    #[test]
    fn test_merge_appends_on_top() {
        let mut board = Board::new();
        let pos = Position::new(2, 2);
        board.push(pos, Donkey);
        assert!(board.merge(pos, &Stack::from_ranks(&[Dog, Cat])));
        assert_eq!(board.stack(pos).values(), vec![4, 3, 2]);

        // Overflow leaves the target untouched
        assert!(!board.merge(pos, &Stack::from_ranks(&[Cat, Rooster])));
        assert_eq!(board.stack(pos).values(), vec![4, 3, 2]);
    }

    #[test]
    fn test_descending_check() {
        assert!(Stack::from_ranks(&[Donkey, Cat, Rooster]).is_descending());
        assert!(Stack::new().is_descending());
        assert!(!Stack::from_ranks(&[Cat, Dog]).is_descending());
        assert!(!Stack::from_ranks(&[Cat, Cat]).is_descending());
    }

    #[test]
    fn test_rank_counts() {
        let mut board = Board::new();
        board.set_stack(Position::new(0, 0), Stack::from_ranks(&[Donkey, Rooster]));
        board.set_stack(Position::new(4, 4), Stack::from_ranks(&[Donkey]));
        assert_eq!(board.rank_counts(), [1, 0, 0, 2]);
    }

    #[test]
    fn test_out_of_bounds_reads_empty() {
        let board = Board::new();
        assert!(board.stack(Position::new(5, 5)).is_empty());
    }
}
