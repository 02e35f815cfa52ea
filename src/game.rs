use crate::board::{Board, Stack};
use crate::piece::{BOARD_SIZE, Piece, Position, Rank, Side};
use crate::rules::MovementRules;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// A stack of this height can only be 4-3-2-1 and ends the game
pub const WINNING_HEIGHT: usize = 4;

/// Each rank appears exactly this many times once placement is over
const COPIES_PER_RANK: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Sides are still putting pieces on their home rows
    Initializing,
    Active,
    Won(Side),
    /// The given side was to move and had no legal move
    Stalled(Side),
    /// The rank-count invariant was violated
    Broken,
}

impl Phase {
    pub fn is_over(&self) -> bool {
        matches!(self, Phase::Won(_) | Phase::Stalled(_) | Phase::Broken)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub side: Side,
    pub rank: Rank,
    pub x: usize,
    pub y: usize,
}

impl Move {
    pub fn new(side: Side, rank: Rank, x: usize, y: usize) -> Self {
        Move { side, rank, x, y }
    }

    pub fn to(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.side, self.rank, self.to())
    }
}

/// Result of a move request. A rejected request is `moved == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub moved: bool,
    pub won: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Game already over")]
    GameOver,
    #[error("Not your turn: {0} is to move")]
    NotYourTurn(Side),
    #[error("Destination {0} is outside the board")]
    OutOfBounds(Position),
    #[error("Piece is already on {0}")]
    SameCell(Position),
    #[error("{0} must move its {1} first")]
    RetreatRequired(Side, Rank),
    #[error("Illegal placement: {0}")]
    IllegalPlacement(String),
    #[error("Illegal movement: {0}")]
    IllegalMovement(String),
    #[error("Stack at {0} does not match the pieces on it")]
    InconsistentStack(Position),
}

/// One member of a stack with its owner, for post-game reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEntry {
    pub side: Side,
    pub rank: Rank,
}

/// How a move rearranges the origin and destination stacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Mover is not the bottom: it leaves with everything above it
    Partial { split_index: usize },
    /// Mover is the bottom of a tall stack landing on a stronger top
    WholeOntoStack,
    /// Mover is the bottom of a tall stack landing on an empty cell
    WholeToEmpty,
    /// Lone piece to an empty cell
    Single,
    /// Lone piece onto a stronger top
    SingleOntoStack,
}

/// Everything `unmake_move` needs to restore the previous state
#[derive(Debug, Clone)]
pub struct Undo {
    pub mv: Move,
    origin: Option<(Position, Stack)>,
    target: Stack,
    positions: [[Option<Position>; 4]; 2],
    phase: Phase,
    side_to_move: Side,
    turn: usize,
    retreat: [Option<Rank>; 2],
    retreat_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    board: Board,
    /// Indexed `[side.index()][rank.index()]`
    pieces: [[Piece; 4]; 2],
    phase: Phase,
    side_to_move: Side,
    turn: usize,
    /// Piece each side is forced to move next, if any
    retreat: [Option<Rank>; 2],
    retreat_count: usize,
    history: Vec<Move>,
}

impl GameState {
    /// Empty board, all pieces unplaced, Blue to place first
    pub fn new() -> Self {
        GameState {
            board: Board::new(),
            pieces: Side::ALL.map(|side| Rank::ALL.map(|rank| Piece::new(side, rank))),
            phase: Phase::Initializing,
            side_to_move: Side::Blue,
            turn: 0,
            retreat: [None; 2],
            retreat_count: 0,
            history: Vec::new(),
        }
    }

    /// Run the placement phase with random distinct home-row columns
    pub fn with_random_setup<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut state = GameState::new();
        while state.phase == Phase::Initializing {
            let moves = state.legal_moves(state.side_to_move);
            let Some(&mv) = moves.choose(rng) else {
                break;
            };
            if let Err(e) = state.try_move(mv) {
                warn!("random placement {} rejected: {}", mv, e);
                break;
            }
        }
        state
    }

    /// Manual placement: `blue[i]` / `orange[i]` is the home-row column of rank `i + 1`
    pub fn from_placements(blue: [usize; 4], orange: [usize; 4]) -> Result<Self, MoveError> {
        let mut state = GameState::new();
        for rank in Rank::ALL {
            state.try_move(Move::new(
                Side::Blue,
                rank,
                blue[rank.index()],
                Side::Blue.home_row(),
            ))?;
            state.try_move(Move::new(
                Side::Orange,
                rank,
                orange[rank.index()],
                Side::Orange.home_row(),
            ))?;
        }
        Ok(state)
    }

    /// Arbitrary active-phase position. All 8 pieces must be listed exactly once;
    /// pieces sharing a cell are stacked strongest first.
    pub fn from_layout(
        layout: &[(Side, Rank, Position)],
        side_to_move: Side,
    ) -> Result<Self, MoveError> {
        let mut state = GameState::new();
        let mut sorted = layout.to_vec();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));

        for &(side, rank, pos) in &sorted {
            if !pos.in_bounds() {
                return Err(MoveError::OutOfBounds(pos));
            }
            let piece = state.piece_mut(side, rank);
            if piece.is_placed() {
                return Err(MoveError::IllegalPlacement(format!(
                    "{} {} listed twice",
                    side, rank
                )));
            }
            piece.position = Some(pos);
            if state.board.top_rank(pos) == Some(rank) || !state.board.push(pos, rank) {
                return Err(MoveError::InconsistentStack(pos));
            }
        }

        if state.pieces().any(|p| !p.is_placed()) {
            return Err(MoveError::IllegalPlacement(
                "layout must place all 8 pieces".to_string(),
            ));
        }

        state.phase = Phase::Active;
        state.side_to_move = side_to_move;
        Ok(state)
    }

    /// Start over with an empty board in the placement phase
    pub fn reset(&mut self) {
        *self = GameState::new();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_initializing(&self) -> bool {
        self.phase == Phase::Initializing
    }

    pub fn is_game_over(&self) -> bool {
        self.phase.is_over()
    }

    pub fn winner(&self) -> Option<Side> {
        match self.phase {
            Phase::Won(side) => Some(side),
            _ => None,
        }
    }

    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    /// Number of successful moves (placements included)
    pub fn turn(&self) -> usize {
        self.turn
    }

    /// Number of moves that left an opponent under a retreat obligation
    pub fn retreat_count(&self) -> usize {
        self.retreat_count
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn piece(&self, side: Side, rank: Rank) -> &Piece {
        &self.pieces[side.index()][rank.index()]
    }

    fn piece_mut(&mut self, side: Side, rank: Rank) -> &mut Piece {
        &mut self.pieces[side.index()][rank.index()]
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().flatten()
    }

    pub fn side_pieces(&self, side: Side) -> impl Iterator<Item = &Piece> {
        self.pieces[side.index()].iter()
    }

    /// Owner of the piece of `rank` sitting on `pos`
    pub fn owner_at(&self, pos: Position, rank: Rank) -> Option<Side> {
        self.pieces()
            .find(|p| p.rank == rank && p.position == Some(pos))
            .map(|p| p.side)
    }

    /// Piece `side` is obliged to move next, if any
    pub fn retreat_pending(&self, side: Side) -> Option<&Piece> {
        self.retreat[side.index()].map(|rank| self.piece(side, rank))
    }

    /// Members of the stack at `(x, y)`, bottom to top, with their owners
    pub fn final_stack(&self, x: usize, y: usize) -> Vec<StackEntry> {
        let pos = Position::new(x, y);
        self.board
            .stack(pos)
            .iter()
            .filter_map(|rank| {
                self.owner_at(pos, rank)
                    .map(|side| StackEntry { side, rank })
            })
            .collect()
    }

    /// All legal moves for `side`
    pub fn legal_moves(&self, side: Side) -> Vec<Move> {
        match self.phase {
            Phase::Initializing => self.placement_moves(side),
            Phase::Active => self.movement_moves(side),
            _ => Vec::new(),
        }
    }

    fn placement_moves(&self, side: Side) -> Vec<Move> {
        let row = side.home_row();
        let mut moves = Vec::new();
        for piece in self.side_pieces(side).filter(|p| !p.is_placed()) {
            for x in 0..BOARD_SIZE {
                if self.board.is_empty_cell(Position::new(x, row)) {
                    moves.push(Move::new(side, piece.rank, x, row));
                }
            }
        }
        moves
    }

    /// Pieces `side` may move, honouring a retreat obligation
    fn movable_pieces(&self, side: Side) -> impl Iterator<Item = &Piece> {
        let forced = self.retreat[side.index()];
        self.side_pieces(side)
            .filter(move |p| forced.is_none_or(|rank| rank == p.rank))
    }

    fn movement_moves(&self, side: Side) -> Vec<Move> {
        let mut moves = Vec::new();

        for piece in self.movable_pieces(side) {
            for to in Position::all() {
                if piece.position != Some(to) && MovementRules::is_legal(piece, to, &self.board) {
                    moves.push(Move::new(side, piece.rank, to.x, to.y));
                }
            }
        }

        moves
    }

    /// Stops at the first legal movement instead of listing them all
    fn can_move(&self, side: Side) -> bool {
        self.movable_pieces(side).any(|piece| {
            Position::all().any(|to| {
                piece.position != Some(to) && MovementRules::is_legal(piece, to, &self.board)
            })
        })
    }

    /// Boundary form of a move request: never fails, rejections report `moved == false`
    pub fn apply_move(&mut self, side: Side, rank: Rank, x: usize, y: usize) -> MoveOutcome {
        match self.try_move(Move::new(side, rank, x, y)) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!("move rejected: {}", e);
                MoveOutcome::default()
            }
        }
    }

    /// Validate and play a move
    pub fn try_move(&mut self, mv: Move) -> Result<MoveOutcome, MoveError> {
        self.make_move(mv)?;
        Ok(MoveOutcome {
            moved: true,
            won: matches!(self.phase, Phase::Won(_)),
        })
    }

    /// Play a move and return the record needed to take it back
    pub fn make_move(&mut self, mv: Move) -> Result<Undo, MoveError> {
        if self.is_game_over() {
            return Err(MoveError::GameOver);
        }
        if mv.side != self.side_to_move {
            return Err(MoveError::NotYourTurn(self.side_to_move));
        }
        let to = mv.to();
        if !to.in_bounds() {
            return Err(MoveError::OutOfBounds(to));
        }

        let mut undo = Undo {
            mv,
            origin: None,
            target: self.board.stack(to),
            positions: self.pieces.map(|side| side.map(|p| p.position)),
            phase: self.phase,
            side_to_move: self.side_to_move,
            turn: self.turn,
            retreat: self.retreat,
            retreat_count: self.retreat_count,
        };

        if self.phase == Phase::Initializing {
            self.place(mv)?;
        } else {
            let from = self.validate_movement(mv)?;
            undo.origin = Some((from, self.board.stack(from)));
            if let Err(e) = self.transfer(mv, from) {
                self.restore(&undo);
                return Err(e);
            }
        }

        self.history.push(mv);
        self.turn += 1;
        self.side_to_move = self.side_to_move.opponent();

        if self.phase == Phase::Active {
            self.update_retreat(mv);
            self.settle_phase(to);
        }

        Ok(undo)
    }

    /// Restore the state from before the move recorded in `undo`
    pub fn unmake_move(&mut self, undo: Undo) {
        self.restore(&undo);
        self.history.pop();
    }

    fn restore(&mut self, undo: &Undo) {
        if let Some((from, stack)) = undo.origin {
            self.board.set_stack(from, stack);
        }
        self.board.set_stack(undo.mv.to(), undo.target);
        for side in Side::ALL {
            for rank in Rank::ALL {
                self.piece_mut(side, rank).position = undo.positions[side.index()][rank.index()];
            }
        }
        self.phase = undo.phase;
        self.side_to_move = undo.side_to_move;
        self.turn = undo.turn;
        self.retreat = undo.retreat;
        self.retreat_count = undo.retreat_count;
    }

    fn place(&mut self, mv: Move) -> Result<(), MoveError> {
        let to = mv.to();
        if self.piece(mv.side, mv.rank).is_placed() {
            return Err(MoveError::IllegalPlacement(format!(
                "{} {} is already placed",
                mv.side, mv.rank
            )));
        }
        if to.y != mv.side.home_row() {
            return Err(MoveError::IllegalPlacement(format!(
                "{} places on row {}",
                mv.side,
                mv.side.home_row()
            )));
        }
        if !self.board.is_empty_cell(to) {
            return Err(MoveError::IllegalPlacement(format!("{} is occupied", to)));
        }

        self.board.push(to, mv.rank);
        self.piece_mut(mv.side, mv.rank).position = Some(to);

        if self.pieces().all(Piece::is_placed) {
            debug!("placement complete after {} moves", self.turn + 1);
            self.phase = Phase::Active;
        }
        Ok(())
    }

    fn validate_movement(&self, mv: Move) -> Result<Position, MoveError> {
        if let Some(forced) = self.retreat[mv.side.index()] {
            if forced != mv.rank {
                return Err(MoveError::RetreatRequired(mv.side, forced));
            }
        }

        let piece = self.piece(mv.side, mv.rank);
        let from = piece.position.ok_or_else(|| {
            MoveError::IllegalMovement(format!("{} {} is not on the board", mv.side, mv.rank))
        })?;
        if from == mv.to() {
            return Err(MoveError::SameCell(from));
        }
        if !MovementRules::is_legal(piece, mv.to(), &self.board) {
            return Err(MoveError::IllegalMovement(mv.to_string()));
        }
        Ok(from)
    }

    /// Decide how the stacks rearrange for `rank` leaving `from` for `to`
    pub fn classify_transfer(&self, rank: Rank, from: Position, to: Position) -> Option<Transfer> {
        let origin = self.board.stack(from);
        let index = origin.index_of(rank)?;
        let target_top = self.board.top_rank(to);

        if origin.len() > 1 && index != 0 {
            Some(Transfer::Partial { split_index: index })
        } else if origin.len() > 1 && target_top.is_some_and(|top| top > rank) {
            Some(Transfer::WholeOntoStack)
        } else if origin.len() > 1 && target_top.is_none() {
            Some(Transfer::WholeToEmpty)
        } else if origin.len() == 1 && target_top.is_none() {
            Some(Transfer::Single)
        } else if origin.len() == 1 && target_top.is_some_and(|top| top > rank) {
            Some(Transfer::SingleOntoStack)
        } else {
            None
        }
    }

    fn transfer(&mut self, mv: Move, from: Position) -> Result<(), MoveError> {
        let to = mv.to();
        let transfer = self
            .classify_transfer(mv.rank, from, to)
            .ok_or(MoveError::InconsistentStack(from))?;

        let split_index = match transfer {
            Transfer::Partial { split_index } => split_index,
            _ => 0,
        };
        let (_, carried) = self.board.split_at(from, split_index);
        if !self.board.merge(to, &carried) {
            return Err(MoveError::InconsistentStack(to));
        }

        // Pieces that rode along take the new coordinates; the base keeps the old ones
        for piece in self.pieces.iter_mut().flatten() {
            if piece.position == Some(from) && carried.contains(piece.rank) {
                piece.position = Some(to);
            }
        }
        Ok(())
    }

    /// Recompute both obligations from the move just played
    fn update_retreat(&mut self, mv: Move) {
        self.retreat = [None; 2];

        let to = mv.to();
        if to.y != mv.side.home_row() {
            return;
        }

        let opponent = mv.side.opponent();
        let mut obligated = None;
        for piece in self.side_pieces(opponent) {
            if piece.position == Some(to) && piece.rank < mv.rank {
                obligated = Some(piece.rank);
            }
        }

        if let Some(rank) = obligated {
            debug!("{} {} must retreat from {}", opponent, rank, to);
            self.retreat[opponent.index()] = Some(rank);
            self.retreat_count += 1;
        }
    }

    fn settle_phase(&mut self, to: Position) {
        if !self.check_integrity() {
            warn!("board integrity broken at turn {}", self.turn);
            self.phase = Phase::Broken;
            return;
        }

        let stack = self.board.stack(to);
        if stack.len() == WINNING_HEIGHT {
            if let Some(owner) = stack.bottom().and_then(|rank| self.owner_at(to, rank)) {
                self.phase = Phase::Won(owner);
                return;
            }
        }

        if !self.can_move(self.side_to_move) {
            self.phase = Phase::Stalled(self.side_to_move);
        }
    }

    /// Each rank exactly twice on the board and every stack strictly descending
    pub fn check_integrity(&self) -> bool {
        self.board.rank_counts().iter().all(|&c| c == COPIES_PER_RANK)
            && Position::all().all(|pos| self.board.stack(pos).is_descending())
    }

    /// Plain-text board; each stack member is written as side initial plus rank
    pub fn display_board(&self) -> String {
        let mut result = String::new();
        result.push_str("   ");
        for x in 0..BOARD_SIZE {
            result.push_str(&format!("{:^9}", x));
        }
        result.push('\n');

        for y in 0..BOARD_SIZE {
            result.push_str(&format!("{:2} ", y));
            for x in 0..BOARD_SIZE {
                let cell: String = self
                    .final_stack(x, y)
                    .iter()
                    .map(|e| format!("{}{}", &e.side.name()[..1], e.rank.value()))
                    .collect();
                let cell = if cell.is_empty() { ".".to_string() } else { cell };
                result.push_str(&format!("{:^9}", cell));
            }
            result.push('\n');
        }

        result
    }
}

#[cfg(test)]
impl GameState {
    /// Direct board access for corrupting positions in tests
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
