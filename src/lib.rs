pub mod arena;
pub mod board;
pub mod bot;
pub mod config;
pub mod eval;
pub mod game;
pub mod piece;
pub mod record;
pub mod rules;
pub mod search;

pub use arena::*;
pub use board::*;
pub use bot::*;
pub use config::*;
pub use eval::*;
pub use game::*;
pub use piece::*;
pub use record::*;
pub use rules::*;
pub use search::*;
