use crate::game::{GameState, Move};
use crate::piece::Side;
use crate::record::BotInfo;
use crate::search::{Search, SearchConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

/// Trait that all bots must implement
pub trait Bot: Send {
    /// Get the name of the bot
    fn name(&self) -> &str;

    /// Pick a move for `side` in `state`, or `None` if there is nothing to play
    fn choose_move(&mut self, state: &GameState, side: Side) -> Option<Move>;

    /// What to write in the game record for this bot
    fn describe(&self) -> BotInfo;

    /// Notified when the game starts
    fn game_start(&mut self, _side: Side) {}

    /// Notified when a move is made (by either side)
    fn notify_move(&mut self, _mv: Move) {}

    /// Notified when the game ends
    fn game_end(&mut self) {}
}

/// Plays a uniformly random legal move
pub struct RandomBot {
    name: String,
    rng: StdRng,
}

impl RandomBot {
    pub fn new(name: String, seed: u64) -> Self {
        RandomBot {
            name,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Bot for RandomBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, state: &GameState, side: Side) -> Option<Move> {
        if state.side_to_move() != side {
            return None;
        }
        state.legal_moves(side).choose(&mut self.rng).copied()
    }

    fn describe(&self) -> BotInfo {
        BotInfo::random(&self.name)
    }
}

/// Alpha-beta searcher with random tie-breaking among equal root scores
pub struct MinimaxBot {
    name: String,
    search: Search,
    rng: StdRng,
    last_score: Option<i64>,
}

impl MinimaxBot {
    pub fn new(name: String, config: SearchConfig, seed: u64) -> Self {
        MinimaxBot {
            name,
            search: Search::new(config),
            rng: StdRng::seed_from_u64(seed),
            last_score: None,
        }
    }

    /// Root score behind the most recent choice
    pub fn last_score(&self) -> Option<i64> {
        self.last_score
    }
}

impl Bot for MinimaxBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, state: &GameState, side: Side) -> Option<Move> {
        let result = self.search.best_move(state, side, &mut self.rng);
        self.last_score = result.score;
        result.best_move
    }

    fn describe(&self) -> BotInfo {
        let config = self.search.config();
        BotInfo::minimax(&self.name, config.max_depth, config.evaluator)
    }

    fn game_start(&mut self, _side: Side) {
        self.last_score = None;
    }
}
