pub mod board;
pub mod engine;
pub mod eval;
pub mod perft;
pub mod search;
pub mod uci;
