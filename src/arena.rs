use crate::bot::Bot;
use crate::config::{MatchConfig, Placements};
use crate::game::{GameState, MoveError, Phase};
use crate::piece::Side;
use crate::record::{GameRecord, Outcome};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Won {
        side: Side,
        winner_name: String,
        moves: usize,
    },
    Stalled {
        side: Side,
        moves: usize,
    },
    Broken {
        moves: usize,
    },
    MaxMovesReached {
        moves: usize,
    },
    IllegalMove {
        violator: String,
        side: Side,
        winner: String,
    },
    /// The bot returned no move while it still had legal moves
    Forfeit {
        violator: String,
        side: Side,
        winner: String,
    },
}

impl MatchResult {
    pub fn winner(&self) -> Option<&str> {
        match self {
            MatchResult::Won { winner_name, .. } => Some(winner_name),
            MatchResult::IllegalMove { winner, .. } | MatchResult::Forfeit { winner, .. } => {
                Some(winner)
            }
            MatchResult::Stalled { .. }
            | MatchResult::Broken { .. }
            | MatchResult::MaxMovesReached { .. } => None,
        }
    }

    pub fn winning_side(&self) -> Option<Side> {
        match self {
            MatchResult::Won { side, .. } => Some(*side),
            MatchResult::IllegalMove { side, .. } | MatchResult::Forfeit { side, .. } => {
                Some(side.opponent())
            }
            _ => None,
        }
    }
}

pub struct Match {
    config: MatchConfig,
    state: GameState,
    blue_bot: Box<dyn Bot>,
    orange_bot: Box<dyn Bot>,
    record: GameRecord,
}

impl Match {
    /// Set up the board from `config.placements`, or randomly from
    /// `config.seed` when no placements are given
    pub fn new(
        blue_bot: Box<dyn Bot>,
        orange_bot: Box<dyn Bot>,
        config: MatchConfig,
    ) -> Result<Self, MoveError> {
        let state = match config.placements {
            Some(Placements { blue, orange }) => GameState::from_placements(blue, orange)?,
            None => {
                let seed = config.seed.unwrap_or_else(rand::random);
                let mut rng = StdRng::seed_from_u64(seed);
                GameState::with_random_setup(&mut rng)
            }
        };

        let mut record = GameRecord::new(blue_bot.describe(), orange_bot.describe());
        record.capture_setup(&state);

        Ok(Match {
            config,
            state,
            blue_bot,
            orange_bot,
            record,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    pub fn into_record(self) -> GameRecord {
        self.record
    }

    fn bot_name(&self, side: Side) -> &str {
        match side {
            Side::Blue => self.blue_bot.name(),
            Side::Orange => self.orange_bot.name(),
        }
    }

    pub fn play(&mut self) -> MatchResult {
        self.blue_bot.game_start(Side::Blue);
        self.orange_bot.game_start(Side::Orange);

        info!(
            "match starting: {} (Blue) vs {} (Orange)",
            self.blue_bot.name(),
            self.orange_bot.name()
        );
        trace!("initial board:\n{}", self.state.display_board());

        let mut moves = 0;
        let result = loop {
            if self.state.is_game_over() {
                break self.result_from_phase(moves);
            }
            if moves >= self.config.max_moves {
                break MatchResult::MaxMovesReached { moves };
            }

            let side = self.state.side_to_move();
            if let Some(result) = self.play_move(side) {
                break result;
            }
            moves += 1;
        };

        self.blue_bot.game_end();
        self.orange_bot.game_end();

        let outcome = match result {
            MatchResult::Won { .. } => Outcome::Won,
            MatchResult::Stalled { .. } => Outcome::Stalled,
            MatchResult::Broken { .. } => Outcome::Broken,
            MatchResult::MaxMovesReached { .. } => Outcome::MaxMoves,
            MatchResult::IllegalMove { .. } => Outcome::IllegalMove,
            MatchResult::Forfeit { .. } => Outcome::Forfeit,
        };
        self.record.finish(&self.state, Some(outcome));

        info!("match over after {} moves: {:?}", moves, result);
        result
    }

    /// Ask the side's bot for a move and play it. Returns a result only when
    /// the match stops here.
    fn play_move(&mut self, side: Side) -> Option<MatchResult> {
        let bot = match side {
            Side::Blue => &mut self.blue_bot,
            Side::Orange => &mut self.orange_bot,
        };

        let Some(mv) = bot.choose_move(&self.state, side) else {
            // A side without moves is already Stalled, so this is the bot giving up
            let violator = bot.name().to_string();
            warn!("{} returned no move", violator);
            return Some(MatchResult::Forfeit {
                violator,
                side,
                winner: self.bot_name(side.opponent()).to_string(),
            });
        };

        if let Err(e) = self.state.try_move(mv) {
            let violator = bot.name().to_string();
            warn!("illegal move by {}: {} ({})", violator, mv, e);
            return Some(MatchResult::IllegalMove {
                violator,
                side,
                winner: self.bot_name(side.opponent()).to_string(),
            });
        }

        debug!("turn {}: {} plays {}", self.state.turn(), bot.name(), mv);
        self.record.push_move(mv, &self.state);
        self.blue_bot.notify_move(mv);
        self.orange_bot.notify_move(mv);
        trace!("\n{}", self.state.display_board());

        None
    }

    fn result_from_phase(&self, moves: usize) -> MatchResult {
        match self.state.phase() {
            Phase::Won(side) => MatchResult::Won {
                side,
                winner_name: self.bot_name(side).to_string(),
                moves,
            },
            Phase::Stalled(side) => MatchResult::Stalled { side, moves },
            Phase::Broken => MatchResult::Broken { moves },
            // Only reached through a finished game
            Phase::Initializing | Phase::Active => MatchResult::MaxMovesReached { moves },
        }
    }
}

/// Repeated games between the two configured bots
pub struct Series {
    config: MatchConfig,
    games: usize,
}

impl Series {
    pub fn new(config: MatchConfig, games: usize) -> Self {
        Series { config, games }
    }

    /// Game `i` is seeded with `seed + i`, so a seeded series replays exactly
    pub fn run(&self) -> Result<SeriesResults, MoveError> {
        let base_seed = self.config.seed.unwrap_or_else(rand::random);
        let mut results = SeriesResults::new();

        for game in 0..self.games {
            let seed = base_seed.wrapping_add(game as u64);
            let blue = self
                .config
                .blue
                .build(format!("Blue:{}", self.config.blue.label()), seed);
            let orange = self.config.orange.build(
                format!("Orange:{}", self.config.orange.label()),
                seed.wrapping_add(1 << 32),
            );
            let config = MatchConfig {
                seed: Some(seed),
                ..self.config.clone()
            };

            let mut game_match = Match::new(blue, orange, config)?;
            let result = game_match.play();
            info!("game {}/{} (seed {}): {:?}", game + 1, self.games, seed, result);
            results.add(&result, game_match.into_record());
        }

        Ok(results)
    }
}

#[derive(Debug, Default)]
pub struct SeriesResults {
    pub blue_wins: usize,
    pub orange_wins: usize,
    pub stalled: usize,
    pub broken: usize,
    pub unfinished: usize,
    pub records: Vec<GameRecord>,
}

impl SeriesResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: &MatchResult, record: GameRecord) {
        match result.winning_side() {
            Some(Side::Blue) => self.blue_wins += 1,
            Some(Side::Orange) => self.orange_wins += 1,
            None => match result {
                MatchResult::Stalled { .. } => self.stalled += 1,
                MatchResult::Broken { .. } => self.broken += 1,
                _ => self.unfinished += 1,
            },
        }
        self.records.push(record);
    }

    pub fn games(&self) -> usize {
        self.records.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "Series Results ({} games)\n==================\nBlue wins:   {}\nOrange wins: {}\nStalled:     {}\nBroken:      {}\nUnfinished:  {}",
            self.games(),
            self.blue_wins,
            self.orange_wins,
            self.stalled,
            self.broken,
            self.unfinished
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::RandomBot;
    use crate::config::BotSpec;
    use crate::game::Move;
    use crate::record::BotInfo;

    fn random_config(seed: u64) -> MatchConfig {
        MatchConfig {
            seed: Some(seed),
            blue: BotSpec::Random,
            orange: BotSpec::Random,
            ..MatchConfig::default()
        }
    }

    #[test]
    fn test_random_match_terminates_and_records() {
        let blue = Box::new(RandomBot::new("r1".to_string(), 1));
        let orange = Box::new(RandomBot::new("r2".to_string(), 2));
        let mut game = Match::new(blue, orange, random_config(3)).unwrap();
        let result = game.play();

        let record = game.record();
        assert_eq!(record.initial_positions.len(), 8);
        assert_eq!(record.turns, game.state().turn());
        match result {
            MatchResult::Won { side, moves, .. } => {
                assert_eq!(record.winner, Some(side));
                assert_eq!(record.final_stack.len(), 4);
                assert_eq!(moves, record.moves.len());
            }
            MatchResult::MaxMovesReached { moves } => assert_eq!(moves, 200),
            MatchResult::Stalled { .. } | MatchResult::Broken { .. } => {}
            MatchResult::IllegalMove { .. } | MatchResult::Forfeit { .. } => {
                panic!("random bot broke the rules")
            }
        }
        assert!(game.state().check_integrity());
    }

    #[test]
    fn test_fixed_placements_are_used() {
        let config = MatchConfig {
            placements: Some(Placements {
                blue: [4, 3, 2, 1],
                orange: [0, 1, 2, 3],
            }),
            max_moves: 0,
            ..random_config(1)
        };
        let blue = Box::new(RandomBot::new("r1".to_string(), 1));
        let orange = Box::new(RandomBot::new("r2".to_string(), 2));
        let mut game = Match::new(blue, orange, config).unwrap();
        assert_eq!(
            game.state().board().stack(crate::piece::Position::new(1, 0)).values(),
            vec![4]
        );
        assert_eq!(game.play(), MatchResult::MaxMovesReached { moves: 0 });
        assert_eq!(game.record().outcome, Outcome::MaxMoves);
    }

    #[test]
    fn test_series_is_reproducible() {
        let config = MatchConfig {
            max_moves: 60,
            ..random_config(17)
        };
        let a = Series::new(config.clone(), 3).run().unwrap();
        let b = Series::new(config, 3).run().unwrap();
        assert_eq!(a.games(), 3);
        assert_eq!(a.records, b.records);
        assert_eq!(
            a.blue_wins + a.orange_wins + a.stalled + a.broken + a.unfinished,
            3
        );
        assert!(a.summary().contains("3 games"));
    }

    /// Never plays anything
    struct QuitBot;

    impl Bot for QuitBot {
        fn name(&self) -> &str {
            "quit"
        }

        fn choose_move(&mut self, _state: &GameState, _side: Side) -> Option<Move> {
            None
        }

        fn describe(&self) -> BotInfo {
            BotInfo::random("quit")
        }
    }

    #[test]
    fn test_bot_without_move_forfeits() {
        let orange = Box::new(RandomBot::new("r2".to_string(), 2));
        let mut game = Match::new(Box::new(QuitBot), orange, random_config(1)).unwrap();
        let result = game.play();

        assert_eq!(
            result,
            MatchResult::Forfeit {
                violator: "quit".to_string(),
                side: Side::Blue,
                winner: "r2".to_string(),
            }
        );
        assert_eq!(result.winning_side(), Some(Side::Orange));
        assert_eq!(game.state().phase(), Phase::Active);
        assert_eq!(game.record().outcome, Outcome::Forfeit);

        let mut tally = SeriesResults::new();
        tally.add(&result, game.into_record());
        assert_eq!(tally.orange_wins, 1);
        assert_eq!(tally.stalled, 0);
    }
}
