//! Per-game records for later analysis: starting columns, every move with
//! its turn number, and how the game ended. One record serializes to one
//! JSON line.

use crate::eval::Evaluator;
use crate::game::{GameState, Move, Phase, StackEntry};
use crate::piece::{Position, Rank, Side};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluator: Option<Evaluator>,
}

impl BotInfo {
    pub fn random(name: &str) -> Self {
        BotInfo {
            name: name.to_string(),
            kind: "random".to_string(),
            depth: None,
            evaluator: None,
        }
    }

    pub fn minimax(name: &str, depth: usize, evaluator: Evaluator) -> Self {
        BotInfo {
            name: name.to_string(),
            kind: "minimax".to_string(),
            depth: Some(depth),
            evaluator: Some(evaluator),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub side: Side,
    pub rank: Rank,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 1-based, placements included
    pub turn: usize,
    pub side: Side,
    pub rank: Rank,
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Stalled,
    Broken,
    MaxMoves,
    IllegalMove,
    Forfeit,
    Unfinished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub blue: BotInfo,
    pub orange: BotInfo,
    pub initial_positions: Vec<Placement>,
    pub moves: Vec<MoveRecord>,
    pub outcome: Outcome,
    pub winner: Option<Side>,
    pub turns: usize,
    pub retreats: usize,
    /// Winning stack bottom to top; empty unless the game was won
    pub final_stack: Vec<StackEntry>,
}

impl GameRecord {
    pub fn new(blue: BotInfo, orange: BotInfo) -> Self {
        GameRecord {
            blue,
            orange,
            initial_positions: Vec::new(),
            moves: Vec::new(),
            outcome: Outcome::Unfinished,
            winner: None,
            turns: 0,
            retreats: 0,
            final_stack: Vec::new(),
        }
    }

    /// Log a move that `state` has just accepted
    pub fn push_move(&mut self, mv: Move, state: &GameState) {
        self.moves.push(MoveRecord {
            turn: state.turn(),
            side: mv.side,
            rank: mv.rank,
            x: mv.x,
            y: mv.y,
        });
    }

    /// Capture the home-row layout once placement is done
    pub fn capture_setup(&mut self, state: &GameState) {
        self.initial_positions = state
            .pieces()
            .filter_map(|p| {
                p.position.map(|position| Placement {
                    side: p.side,
                    rank: p.rank,
                    position,
                })
            })
            .collect();
    }

    /// Copy the end-of-game facts out of `state`. `outcome` overrides the
    /// phase-derived one for games stopped by the arena.
    pub fn finish(&mut self, state: &GameState, outcome: Option<Outcome>) {
        self.turns = state.turn();
        self.retreats = state.retreat_count();
        self.winner = state.winner();
        self.outcome = outcome.unwrap_or(match state.phase() {
            Phase::Won(_) => Outcome::Won,
            Phase::Stalled(_) => Outcome::Stalled,
            Phase::Broken => Outcome::Broken,
            Phase::Initializing | Phase::Active => Outcome::Unfinished,
        });
        self.final_stack = match (state.phase(), state.history().last()) {
            (Phase::Won(_), Some(last)) => state.final_stack(last.x, last.y),
            _ => Vec::new(),
        };
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Append this record as one line of `path`
    pub fn append_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let line = self.to_json().map_err(io::Error::other)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)
    }
}
