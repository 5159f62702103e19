pub mod alphabeta;
pub mod ordering;
pub mod see;
pub mod time;
pub mod tt;

pub use alphabeta::{
    is_mate_score, mate_in, search, SearchParams, SearchResult, DRAW_SCORE, MATE_SCORE, MAX_DEPTH,
};
pub use time::{choose_think_time, TimeBudget};
pub use tt::{Bound, Entry, Tt};
