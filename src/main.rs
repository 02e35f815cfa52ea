use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tacticians_arena::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Bot-vs-bot games of Les Tacticiens de Brême
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON match config; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    games: usize,

    #[arg(long)]
    seed: Option<u64>,

    /// Blue bot: random or minimax
    #[arg(long)]
    blue: Option<BotSpec>,

    /// Orange bot: random or minimax
    #[arg(long)]
    orange: Option<BotSpec>,

    /// Search depth for minimax bots
    #[arg(long)]
    depth: Option<usize>,

    /// Evaluator for minimax bots: classic, centrality, rush or block
    #[arg(long)]
    evaluator: Option<Evaluator>,

    /// Movement moves before a game is called unfinished
    #[arg(long)]
    max_moves: Option<usize>,

    /// Append one JSON game record per line to this file
    #[arg(long)]
    records: Option<PathBuf>,
}

impl Args {
    fn match_config(&self) -> Result<MatchConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => MatchConfig::from_json_file(path)?,
            None => MatchConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(blue) = self.blue {
            config.blue = blue;
        }
        if let Some(orange) = self.orange {
            config.orange = orange;
        }
        if let Some(depth) = self.depth {
            config.blue = config.blue.with_depth(depth);
            config.orange = config.orange.with_depth(depth);
        }
        if let Some(evaluator) = self.evaluator {
            config.blue = config.blue.with_evaluator(evaluator);
            config.orange = config.orange.with_evaluator(evaluator);
        }
        if let Some(max_moves) = self.max_moves {
            config.max_moves = max_moves;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.match_config()?;

    info!(
        "Blue: {}, Orange: {}, {} game(s)",
        config.blue.label(),
        config.orange.label(),
        args.games
    );

    let results = Series::new(config, args.games).run()?;

    if let Some(path) = &args.records {
        for record in &results.records {
            record.append_to(path)?;
        }
        info!("wrote {} records to {}", results.games(), path.display());
    }

    if args.games == 1 {
        if let Some(record) = results.records.first() {
            println!("{}", describe_game(record));
        }
    }
    println!("{}", results.summary());
    Ok(())
}

/// One-line description of how a single game ended
fn describe_game(record: &GameRecord) -> String {
    let stack: Vec<String> = record
        .final_stack
        .iter()
        .map(|e| format!("{} {}", e.side, e.rank))
        .collect();
    match record.winner {
        Some(side) => format!(
            "{} wins on turn {} with [{}] ({} retreats)",
            side,
            record.turns,
            stack.join(", "),
            record.retreats
        ),
        None => format!("No winner after {} turns ({:?})", record.turns, record.outcome),
    }
}
