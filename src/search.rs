//! Depth-bounded minimax with alpha-beta pruning.
//!
//! The walk runs on one scratch copy of the position and explores each
//! branch with `make_move` / `unmake_move`, so sibling branches never see
//! each other's changes and the caller's state is left alone.

use crate::eval::Evaluator;
use crate::game::{GameState, Move};
use crate::piece::Side;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Plies searched from the root, identical for both sides
    pub max_depth: usize,
    pub evaluator: Evaluator,
    /// `false` runs plain minimax over the full tree
    pub pruning: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_depth: DEFAULT_DEPTH,
            evaluator: Evaluator::Classic,
            pruning: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// `None` when the side has nothing to play
    pub best_move: Option<Move>,
    /// Minimax value of `best_move`, if the tree was searched
    pub score: Option<i64>,
    /// Score of every root move, in generation order
    pub root_scores: Vec<(Move, i64)>,
    pub nodes: u64,
}

impl SearchResult {
    /// Root moves sharing the best score
    pub fn best_moves(&self) -> Vec<Move> {
        let Some(best) = self.score else {
            return Vec::new();
        };
        self.root_scores
            .iter()
            .filter(|(_, score)| *score == best)
            .map(|(mv, _)| *mv)
            .collect()
    }
}

pub struct Search {
    config: SearchConfig,
    nodes: u64,
}

impl Search {
    pub fn new(config: SearchConfig) -> Self {
        Search { config, nodes: 0 }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Score every root move for `side`. Ties are left unresolved: `best_move`
    /// is the first move reaching the best score.
    pub fn analyze(&mut self, state: &GameState, side: Side) -> SearchResult {
        self.nodes = 0;

        if state.is_game_over() || state.side_to_move() != side {
            return SearchResult::default();
        }

        let mut scratch = state.clone();
        let mut root_scores = Vec::new();
        self.minimax(
            &mut scratch,
            side,
            0,
            true,
            i64::MIN,
            i64::MAX,
            &mut root_scores,
        );

        let score = root_scores.iter().map(|(_, s)| *s).max();
        let best_move = score.and_then(|best| {
            root_scores
                .iter()
                .find(|(_, s)| *s == best)
                .map(|(mv, _)| *mv)
        });

        debug!(
            "searched {} nodes for {} at depth {}, best score {:?}",
            self.nodes, side, self.config.max_depth, score
        );

        SearchResult {
            best_move,
            score,
            root_scores,
            nodes: self.nodes,
        }
    }

    /// Pick a move for `side`, breaking ties uniformly at random. Falls back
    /// to a random legal move when nothing was scored.
    pub fn best_move<R: Rng + ?Sized>(
        &mut self,
        state: &GameState,
        side: Side,
        rng: &mut R,
    ) -> SearchResult {
        if state.is_game_over() || state.side_to_move() != side {
            return SearchResult::default();
        }
        let mut result = self.analyze(state, side);

        let chosen = match result.best_moves().choose(rng) {
            Some(&mv) => Some(mv),
            None => state.legal_moves(side).choose(rng).copied(),
        };
        result.best_move = chosen;
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn minimax(
        &mut self,
        state: &mut GameState,
        root: Side,
        depth: usize,
        maximizing: bool,
        mut alpha: i64,
        mut beta: i64,
        root_scores: &mut Vec<(Move, i64)>,
    ) -> i64 {
        self.nodes += 1;

        // Won, stalled and broken positions are leaves
        if depth >= self.config.max_depth || state.is_game_over() {
            return self.config.evaluator.evaluate(state, root);
        }

        let mover = if maximizing { root } else { root.opponent() };
        let moves = state.legal_moves(mover);
        if moves.is_empty() {
            return self.config.evaluator.evaluate(state, root);
        }

        let mut best = if maximizing { i64::MIN } else { i64::MAX };

        for mv in moves {
            let undo = match state.make_move(mv) {
                Ok(undo) => undo,
                Err(_) => continue,
            };

            // At the root, children may only fail low strictly below alpha so
            // that every recorded score tying the maximum is exact.
            let child_alpha = if depth == 0 {
                alpha.saturating_sub(1)
            } else {
                alpha
            };
            let score = self.minimax(
                state,
                root,
                depth + 1,
                !maximizing,
                child_alpha,
                beta,
                root_scores,
            );
            state.unmake_move(undo);

            if depth == 0 {
                root_scores.push((mv, score));
            }

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }

            if self.config.pruning && beta <= alpha {
                break;
            }
        }

        best
    }
}
