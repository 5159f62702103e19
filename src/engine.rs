//! Engine control surface: position state, search launch and interruption.
//!
//! `think` is non-blocking; the search runs on its own thread and the
//! returned handle delivers the result. A second `think` while one is in
//! flight is rejected rather than queued.

use crate::board::{Board, Color, FenError};
use crate::eval::nnue::QuantNnue;
use crate::search::{self, choose_think_time, SearchParams, SearchResult, TimeBudget, Tt};
use log::info;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] FenError),
    #[error("illegal move '{0}'")]
    IllegalMove(String),
    #[error("search already in progress")]
    SearchInProgress,
}

/// Per-move search limits; unset fields leave that dimension unlimited.
#[derive(Debug, Clone, Copy, Default)]
pub struct Limits {
    pub depth: Option<u32>,
    pub movetime: Option<Duration>,
    pub nodes: Option<u64>,
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub infinite: bool,
}

impl Limits {
    fn budget(&self, stm: Color) -> Option<TimeBudget> {
        if self.infinite {
            return None;
        }
        if let Some(mt) = self.movetime {
            return Some(TimeBudget::fixed(mt));
        }
        let (remaining, inc) = match stm {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        remaining.map(|r| choose_think_time(r, inc.unwrap_or(Duration::ZERO)))
    }
}

pub struct Engine {
    board: Board,
    tt: Arc<Tt>,
    net: Option<Arc<QuantNnue>>,
    threads: usize,
    report: bool,
    abort: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(16, 1)
    }
}

impl Engine {
    pub fn new(hash_mb: usize, threads: usize) -> Engine {
        // Pay for the attack tables at construction, not out of the first
        // move's clock.
        crate::board::attacks::init();
        Engine {
            board: Board::startpos(),
            tt: Arc::new(Tt::with_capacity_mb(hash_mb.max(1))),
            net: None,
            threads: threads.max(1),
            report: false,
            abort: Arc::new(AtomicBool::new(false)),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn load_network(&mut self, path: &Path) -> anyhow::Result<()> {
        let net = QuantNnue::load(path)?;
        info!("loaded network: hidden dim {}", net.meta.hidden_dim);
        self.net = Some(Arc::new(net));
        Ok(())
    }

    pub fn set_hash_mb(&mut self, mb: usize) -> Result<(), EngineError> {
        if self.busy.load(Ordering::Relaxed) {
            return Err(EngineError::SearchInProgress);
        }
        self.tt = Arc::new(Tt::with_capacity_mb(mb.max(1)));
        Ok(())
    }

    pub fn set_threads(&mut self, threads: usize) {
        self.threads = threads.max(1);
    }

    /// Emit UCI `info` lines while searching.
    pub fn set_reporting(&mut self, on: bool) {
        self.report = on;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_searching(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }

    /// Forget everything learned from the previous game.
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        if self.busy.load(Ordering::Relaxed) {
            return Err(EngineError::SearchInProgress);
        }
        self.tt.clear();
        self.board = Board::startpos();
        Ok(())
    }

    /// Set the root position: a FEN (or the start position) plus a move
    /// line. Every move is validated against the position it is played in.
    pub fn set_position(&mut self, fen: Option<&str>, moves: &[String]) -> Result<(), EngineError> {
        let mut board = match fen {
            Some(f) => Board::from_fen(f)?,
            None => Board::startpos(),
        };
        for uci in moves {
            let mv = board
                .parse_move(uci)
                .ok_or_else(|| EngineError::IllegalMove(uci.clone()))?;
            board.make_move(mv);
        }
        self.board = board;
        Ok(())
    }

    /// Launch a search under `limits`. Returns immediately; the handle
    /// blocks on `wait`.
    pub fn think(&mut self, limits: Limits) -> Result<ThinkHandle, EngineError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::SearchInProgress);
        }
        self.abort = Arc::new(AtomicBool::new(false));

        let params = SearchParams {
            depth: limits.depth,
            max_nodes: limits.nodes,
            budget: limits.budget(self.board.side_to_move()),
            threads: self.threads,
            report: self.report,
        };
        let board = self.board.clone();
        let tt = Arc::clone(&self.tt);
        let net = self.net.clone();
        let abort = Arc::clone(&self.abort);
        let busy = Arc::clone(&self.busy);

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = search::search(&board, &params, tt, net, abort);
            busy.store(false, Ordering::Release);
            // Receiver may have been dropped; the search itself is the point.
            let _ = tx.send(result);
        });

        Ok(ThinkHandle { rx })
    }

    /// Ask a running search to stop at the next limit check. No-op when
    /// idle.
    pub fn stop(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }
}

pub struct ThinkHandle {
    rx: mpsc::Receiver<SearchResult>,
}

impl ThinkHandle {
    /// Block until the search delivers its result.
    pub fn wait(self) -> SearchResult {
        self.rx.recv().unwrap_or_default()
    }

    pub fn try_result(&self) -> Option<SearchResult> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_illegal_move_in_position_line() {
        let mut engine = Engine::new(1, 1);
        let err = engine
            .set_position(None, &["e2e4".into(), "e7e6".into(), "e4e6".into()])
            .unwrap_err();
        assert!(matches!(err, EngineError::IllegalMove(m) if m == "e4e6"));
    }

    #[test]
    fn rejects_bad_fen() {
        let mut engine = Engine::new(1, 1);
        assert!(matches!(
            engine.set_position(Some("not a fen"), &[]),
            Err(EngineError::InvalidPosition(_))
        ));
    }

    #[test]
    fn think_then_stop_delivers_a_move() {
        let mut engine = Engine::new(1, 1);
        engine.set_position(None, &[]).unwrap();
        let handle = engine.think(Limits { depth: Some(3), ..Default::default() }).unwrap();
        let result = handle.wait();
        assert!(result.best_move.is_some());
        assert!(!engine.is_searching());
    }

    #[test]
    fn concurrent_think_is_rejected() {
        let mut engine = Engine::new(1, 1);
        engine.set_position(None, &[]).unwrap();
        let handle = engine
            .think(Limits { infinite: true, depth: Some(crate::search::MAX_DEPTH), ..Default::default() })
            .unwrap();
        let second = engine.think(Limits::default());
        assert!(matches!(second, Err(EngineError::SearchInProgress)));
        engine.stop();
        let _ = handle.wait();
    }
}
