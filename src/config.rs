use crate::bot::{Bot, MinimaxBot, RandomBot};
use crate::eval::Evaluator;
use crate::search::{DEFAULT_DEPTH, SearchConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown evaluator: {0}")]
    UnknownEvaluator(String),
    #[error("Unknown bot kind: {0} (expected 'random' or 'minimax')")]
    UnknownBot(String),
    #[error("Search depth must be at least 1")]
    ZeroDepth,
    #[error("Home-row columns for {0} must be distinct and below 5")]
    BadPlacement(String),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Which AI plays a side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BotSpec {
    Random,
    Minimax {
        #[serde(default = "default_depth")]
        depth: usize,
        #[serde(default)]
        evaluator: Evaluator,
    },
}

fn default_depth() -> usize {
    DEFAULT_DEPTH
}

impl Default for BotSpec {
    fn default() -> Self {
        BotSpec::Minimax {
            depth: DEFAULT_DEPTH,
            evaluator: Evaluator::Classic,
        }
    }
}

impl BotSpec {
    pub fn build(&self, name: String, seed: u64) -> Box<dyn Bot> {
        match *self {
            BotSpec::Random => Box::new(RandomBot::new(name, seed)),
            BotSpec::Minimax { depth, evaluator } => Box::new(MinimaxBot::new(
                name,
                SearchConfig {
                    max_depth: depth,
                    evaluator,
                    ..SearchConfig::default()
                },
                seed,
            )),
        }
    }

    /// Short human-readable name, e.g. `minimax-classic-d4`
    pub fn label(&self) -> String {
        match self {
            BotSpec::Random => "random".to_string(),
            BotSpec::Minimax { depth, evaluator } => format!("minimax-{}-d{}", evaluator, depth),
        }
    }

    /// Same spec with a different depth; random bots are unaffected
    pub fn with_depth(self, new_depth: usize) -> Self {
        match self {
            BotSpec::Minimax { evaluator, .. } => BotSpec::Minimax {
                depth: new_depth,
                evaluator,
            },
            BotSpec::Random => BotSpec::Random,
        }
    }

    pub fn with_evaluator(self, new_evaluator: Evaluator) -> Self {
        match self {
            BotSpec::Minimax { depth, .. } => BotSpec::Minimax {
                depth,
                evaluator: new_evaluator,
            },
            BotSpec::Random => BotSpec::Random,
        }
    }
}

impl FromStr for BotSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" | "r" => Ok(BotSpec::Random),
            "minimax" | "m" => Ok(BotSpec::default()),
            _ => Err(ConfigError::UnknownBot(s.to_string())),
        }
    }
}

/// Home-row columns indexed by rank (`[rooster, cat, dog, donkey]`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placements {
    pub blue: [usize; 4],
    pub orange: [usize; 4],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Movement moves (placements excluded) before the game is called unfinished
    pub max_moves: usize,
    /// Seed for placement and bot randomness; drawn from the OS when absent
    pub seed: Option<u64>,
    pub blue: BotSpec,
    pub orange: BotSpec,
    /// Fixed starting columns; random placement when absent
    pub placements: Option<Placements>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            max_moves: 200,
            seed: None,
            blue: BotSpec::default(),
            orange: BotSpec::default(),
            placements: None,
        }
    }
}

impl MatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for spec in [self.blue, self.orange] {
            if let BotSpec::Minimax { depth: 0, .. } = spec {
                return Err(ConfigError::ZeroDepth);
            }
        }
        if let Some(placements) = self.placements {
            for (name, columns) in [("Blue", placements.blue), ("Orange", placements.orange)] {
                let mut sorted = columns;
                sorted.sort();
                if sorted.windows(2).any(|w| w[0] == w[1]) || sorted[3] >= 5 {
                    return Err(ConfigError::BadPlacement(name.to_string()));
                }
            }
        }
        Ok(())
    }
}
