use crate::config::ConfigError;
use crate::game::GameState;
use crate::piece::{Position, Side};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Score for a finished 4-3-2-1 tower
pub const WINNING_STACK_BONUS: i64 = 100_000_000;

const COLOR_BONUS: i64 = 150;
const THREAT_PENALTY: i64 = 500;

const CLASSIC_MULTIPLIER: i64 = 2000;
const CENTER_MULTIPLIER: i64 = 100;
const RUSH_MULTIPLIER: i64 = 2000;

const BLOCK_ALLY: i64 = 5000;
const BLOCK_ENEMY: i64 = 15000;
const BLOCK_ENEMY_TOWER: i64 = 10000;

/// Position scoring families. One is chosen per search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluator {
    /// Stack-pattern table
    #[default]
    Classic,
    /// Pattern table with lighter weights, scaled up toward the centre
    Centrality,
    /// Only counts progress on our own 4-3-2-1 tower
    Rush,
    /// Rewards stacks that keep the opponent from completing a tower
    Block,
}

impl Evaluator {
    pub const ALL: [Evaluator; 4] = [
        Evaluator::Classic,
        Evaluator::Centrality,
        Evaluator::Rush,
        Evaluator::Block,
    ];

    pub fn name(&self) -> &str {
        match self {
            Evaluator::Classic => "classic",
            Evaluator::Centrality => "centrality",
            Evaluator::Rush => "rush",
            Evaluator::Block => "block",
        }
    }

    /// Higher is better for `side`. Pure in `(state, side)`.
    pub fn evaluate(&self, state: &GameState, side: Side) -> i64 {
        Position::all()
            .map(|pos| match self {
                Evaluator::Classic => classic_cell(state, pos, side, CLASSIC_MULTIPLIER),
                Evaluator::Centrality => {
                    classic_cell(state, pos, side, CENTER_MULTIPLIER) * centrality_weight(pos) / 10
                }
                Evaluator::Rush => rush_cell(state, pos, side),
                Evaluator::Block => block_cell(state, pos, side),
            })
            .sum()
    }
}

impl fmt::Display for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Evaluator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Evaluator::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownEvaluator(s.to_string()))
    }
}

/// Owners of the bottom three members of the stack at `pos`
struct Owners {
    base: Option<Side>,
    second: Option<Side>,
    third: Option<Side>,
}

fn owners(state: &GameState, pos: Position) -> Owners {
    let stack = state.board().stack(pos);
    let owner = |i: usize| stack.get(i).and_then(|rank| state.owner_at(pos, rank));
    Owners {
        base: owner(0),
        second: owner(1),
        third: owner(2),
    }
}

fn classic_cell(state: &GameState, pos: Position, side: Side, m: i64) -> i64 {
    let values = state.board().stack(pos).values();
    if values.len() < 2 {
        return 0;
    }

    let o = owners(state, pos);
    let mine = o.base == Some(side);
    let second_mine = o.second == Some(side);
    let third_mine = o.third == Some(side);

    let gain = |k: i64| k * m + COLOR_BONUS;
    let loss = |k: i64| -(k * m + THREAT_PENALTY);

    match values.as_slice() {
        [4, 3, 2, 1] if mine => WINNING_STACK_BONUS,
        [4, 3, 2, 1] => -WINNING_STACK_BONUS,
        [4, 3, 2] if mine => gain(10),
        [4, 3, 2] => loss(10),
        [4, 3, 1] if mine => gain(5),
        // Our rooster caps their donkey-dog
        [4, 3, 1] if !second_mine && third_mine => gain(5),
        [4, 3, 1] => loss(6),
        [4, 3] if mine => gain(2),
        [4, 3] => loss(3),
        [4, 2, 1] if mine => gain(1),
        [4, 2, 1] if second_mine => gain(5),
        [4, 2, 1] => loss(5),
        [4, 2] if mine => gain(2),
        [4, 2] if second_mine => gain(5),
        [4, 2] => loss(3),
        // A rooster straight on our donkey stalls our own tower
        [4, 1] if mine => -gain(1),
        [4, 1] if second_mine => gain(5),
        [4, 1] => loss(1),
        [3, 2, 1] if mine => gain(5),
        [3, 2, 1] => loss(5),
        [3, 2] if mine => gain(2),
        [3, 2] => loss(2),
        [3, 1] if mine => gain(1),
        [3, 1] if second_mine => gain(5),
        [3, 1] => loss(6),
        [2, 1] if mine => gain(1),
        [2, 1] => loss(1),
        _ => 0,
    }
}

/// Weight in tenths: centre 1.5, edge-adjacent to centre 1.2, diagonal to centre 1.1
fn centrality_weight(pos: Position) -> i64 {
    let dx = pos.x.abs_diff(2);
    let dy = pos.y.abs_diff(2);
    match (dx, dy) {
        (0, 0) => 15,
        (0, 1) | (1, 0) => 12,
        (1, 1) => 11,
        _ => 10,
    }
}

fn rush_cell(state: &GameState, pos: Position, side: Side) -> i64 {
    if owners(state, pos).base != Some(side) {
        return 0;
    }
    match state.board().stack(pos).values().as_slice() {
        [4] => RUSH_MULTIPLIER,
        [4, 3] => RUSH_MULTIPLIER * 2,
        [4, 3, 2] => RUSH_MULTIPLIER * 3,
        [4, 3, 2, 1] => WINNING_STACK_BONUS,
        _ => 0,
    }
}

fn block_cell(state: &GameState, pos: Position, side: Side) -> i64 {
    let values = state.board().stack(pos).values();
    if values.len() < 2 {
        return 0;
    }

    let base = owners(state, pos).base;
    let mine = base == Some(side);
    let theirs = base == Some(side.opponent());

    let mut score = 0;
    match (values[0], values[1]) {
        (4, 2) if mine => score += BLOCK_ALLY,
        (4, 1) if theirs => score += BLOCK_ENEMY,
        _ => {}
    }
    if values[0] == 4 && values[1] == 3 && values.last() == Some(&1) && theirs {
        score += BLOCK_ENEMY_TOWER;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Rank::*;
    use crate::piece::Side::*;

    fn pos(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    fn tower_game(at: Position) -> GameState {
        // Blue donkey-dog at `at`, the rest spread out
        let layout = [
            (Blue, Donkey, at),
            (Blue, Dog, at),
            (Blue, Cat, pos(0, 0)),
            (Blue, Rooster, pos(4, 0)),
            (Orange, Donkey, pos(0, 4)),
            (Orange, Dog, pos(4, 4)),
            (Orange, Cat, pos(1, 4)),
            (Orange, Rooster, pos(3, 4)),
        ];
        GameState::from_layout(&layout, Orange).unwrap()
    }

    #[test]
    fn test_classic_scores_own_tower() {
        let game = tower_game(pos(1, 2));
        let blue = Evaluator::Classic.evaluate(&game, Blue);
        let orange = Evaluator::Classic.evaluate(&game, Orange);
        assert_eq!(blue, 2 * CLASSIC_MULTIPLIER + COLOR_BONUS);
        assert_eq!(orange, -(3 * CLASSIC_MULTIPLIER + THREAT_PENALTY));
    }

    #[test]
    fn test_fresh_placement_scores_zero() {
        let game = GameState::from_placements([0, 1, 2, 3], [0, 1, 2, 3]).unwrap();
        for eval in Evaluator::ALL {
            if eval == Evaluator::Rush {
                continue;
            }
            assert_eq!(eval.evaluate(&game, Blue), 0, "{}", eval);
        }
        // A lone donkey counts as the first floor of a tower
        assert_eq!(Evaluator::Rush.evaluate(&game, Blue), RUSH_MULTIPLIER);
    }

    #[test]
    fn test_centrality_weights_centre() {
        let off = Evaluator::Centrality.evaluate(&tower_game(pos(0, 2)), Blue);
        let near = Evaluator::Centrality.evaluate(&tower_game(pos(1, 2)), Blue);
        let centre = Evaluator::Centrality.evaluate(&tower_game(pos(2, 2)), Blue);
        let base = 2 * CENTER_MULTIPLIER + COLOR_BONUS;
        assert_eq!(off, base);
        assert_eq!(near, base * 12 / 10);
        assert_eq!(centre, base * 15 / 10);
    }

    #[test]
    fn test_rush_ignores_opponent_stacks() {
        let game = tower_game(pos(2, 2));
        assert_eq!(Evaluator::Rush.evaluate(&game, Blue), 2 * RUSH_MULTIPLIER);
        // Orange donkey alone at (0, 4)
        assert_eq!(Evaluator::Rush.evaluate(&game, Orange), RUSH_MULTIPLIER);
    }

    #[test]
    fn test_rooster_capping_enemy_tower() {
        let layout = [
            (Orange, Donkey, pos(2, 2)),
            (Orange, Dog, pos(2, 2)),
            (Blue, Rooster, pos(2, 2)),
            (Blue, Donkey, pos(0, 0)),
            (Blue, Dog, pos(4, 0)),
            (Blue, Cat, pos(1, 0)),
            (Orange, Cat, pos(1, 4)),
            (Orange, Rooster, pos(3, 4)),
        ];
        let game = GameState::from_layout(&layout, Orange).unwrap();
        assert_eq!(
            Evaluator::Classic.evaluate(&game, Blue),
            5 * CLASSIC_MULTIPLIER + COLOR_BONUS
        );
        assert_eq!(Evaluator::Block.evaluate(&game, Blue), BLOCK_ENEMY_TOWER);
        assert_eq!(
            Evaluator::Classic.evaluate(&game, Orange),
            5 * CLASSIC_MULTIPLIER + COLOR_BONUS
        );
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let game = tower_game(pos(3, 1));
        for eval in Evaluator::ALL {
            assert_eq!(eval.evaluate(&game, Blue), eval.evaluate(&game, Blue));
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("rush".parse::<Evaluator>().unwrap(), Evaluator::Rush);
        assert_eq!("Classic".parse::<Evaluator>().unwrap(), Evaluator::Classic);
        assert!("greedy".parse::<Evaluator>().is_err());
    }
}
