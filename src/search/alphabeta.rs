//! Iterative-deepening negamax with quiescence, a shared transposition
//! table, and lazy-SMP helper threads.

use super::ordering::{HistoryTable, Killers, MovePicker, MAX_PLY};
use super::see::see;
use super::time::TimeBudget;
use super::tt::{Bound, Entry, Tt};
use crate::board::movegen;
use crate::board::moves::Move;
use crate::board::{Board, Piece};
use crate::eval::nnue::QuantNnue;
use crate::eval::EvalState;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub const MATE_SCORE: i32 = 30_000;
pub const DRAW_SCORE: i32 = 0;
pub const MAX_DEPTH: u32 = 64;

const ASPIRATION_WINDOW_CP: i32 = 30;
const QSEARCH_SEE_MARGIN: i32 = 50;
const NODE_CHECK_MASK: u64 = 0x7FF;

/// Scores at or beyond this magnitude encode a forced mate.
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_SCORE - MAX_PLY as i32
}

/// Full moves until mate, signed from the searching side's view.
pub fn mate_in(score: i32) -> Option<i32> {
    if !is_mate_score(score) {
        return None;
    }
    let plies = MATE_SCORE - score.abs();
    let moves = (plies + 1) / 2;
    Some(if score > 0 { moves } else { -moves })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchParams {
    pub depth: Option<u32>,
    pub max_nodes: Option<u64>,
    pub budget: Option<TimeBudget>,
    pub threads: usize,
    /// Print a UCI `info` line after each completed iteration.
    pub report: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score_cp: i32,
    pub depth: u32,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

pub struct Searcher {
    tt: Arc<Tt>,
    abort: Arc<AtomicBool>,
    eval: EvalState,
    killers: Killers,
    history: HistoryTable,
    nodes: u64,
    node_limit: u64,
    hard_deadline: Option<Instant>,
    // Cleared while the depth-1 iteration runs so it always completes and
    // the search can never come back empty-handed from a legal position.
    limits_enabled: bool,
    stopped: bool,
    root_best: Option<Move>,
}

/// Entry point: searches `board` under `params`. `abort` stops the search
/// from outside; helper threads share `tt` and the abort flag.
pub fn search(
    board: &Board,
    params: &SearchParams,
    tt: Arc<Tt>,
    net: Option<Arc<QuantNnue>>,
    abort: Arc<AtomicBool>,
) -> SearchResult {
    // Attack tables are built lazily; force them here so a cold start is
    // not charged against the move clock.
    crate::board::attacks::init();
    let start = Instant::now();
    let threads = params.threads.max(1);
    let max_depth = params.depth.unwrap_or(MAX_DEPTH).clamp(1, MAX_DEPTH);
    let (soft, hard) = match params.budget {
        Some(b) => {
            let (s, h) = b.deadlines(start);
            (Some(s), Some(h))
        }
        None => (None, None),
    };

    // Helpers skip depths other helpers are already crowding, desyncing the
    // trees so the shared table fills with different work.
    let depth_claims: Vec<AtomicUsize> =
        (0..=MAX_DEPTH as usize).map(|_| AtomicUsize::new(0)).collect();

    let make_searcher = |net: Option<Arc<QuantNnue>>| Searcher {
        tt: Arc::clone(&tt),
        abort: Arc::clone(&abort),
        eval: match net {
            Some(n) => EvalState::nnue(n),
            None => EvalState::material(),
        },
        killers: Killers::default(),
        history: HistoryTable::default(),
        nodes: 0,
        node_limit: params.max_nodes.unwrap_or(u64::MAX),
        hard_deadline: hard,
        limits_enabled: true,
        stopped: false,
        root_best: None,
    };

    let result = std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(threads - 1);
        for id in 1..threads {
            let mut helper = make_searcher(net.clone());
            let mut helper_board = board.clone();
            let claims = &depth_claims;
            let crowd = (threads + 1) / 2;
            handles.push(scope.spawn(move || {
                helper.iterate(&mut helper_board, max_depth, None, start, false, false, |d| {
                    // First helper never skips depth 1; beyond that, pass on
                    // depths that enough threads have claimed already.
                    d > 1 && claims[d as usize].fetch_add(1, Ordering::Relaxed) >= crowd + id % 2
                });
                helper.nodes
            }));
        }

        let mut main = make_searcher(net.clone());
        let mut main_board = board.clone();
        let mut res = main.iterate(
            &mut main_board,
            max_depth,
            soft,
            start,
            true,
            params.report,
            |_| false,
        );
        // Main thread done: bring the helpers down and fold in their nodes.
        abort.store(true, Ordering::Relaxed);
        let mut total = main.nodes;
        for handle in handles {
            total += handle.join().unwrap_or(0);
        }
        res.nodes = total;
        res
    });

    debug!(
        "search finished: depth {} score {} nodes {} in {:?}",
        result.depth,
        result.score_cp,
        result.nodes,
        start.elapsed()
    );
    result
}

impl Searcher {
    fn iterate(
        &mut self,
        board: &mut Board,
        max_depth: u32,
        soft_deadline: Option<Instant>,
        start: Instant,
        main: bool,
        report: bool,
        mut skip_depth: impl FnMut(u32) -> bool,
    ) -> SearchResult {
        self.eval.reset(board);
        let mut result = SearchResult::default();
        let mut last_score = 0i32;
        let mut stable_iters = 0u32;

        let mut depth = 1;
        while depth <= max_depth {
            if skip_depth(depth) {
                depth += 1;
                continue;
            }
            // Depth 1 runs to completion regardless of clock, node budget
            // or the abort flag; a spent clock degrades to a shallow move
            // instead of no move.
            self.limits_enabled = depth > 1;
            if main {
                self.tt.bump_generation();
            }

            let score = if depth >= 4 && !is_mate_score(last_score) {
                self.aspiration(board, depth, last_score)
            } else {
                self.root(board, depth, -MATE_SCORE, MATE_SCORE)
            };

            if self.stopped {
                // Partial iteration: keep the last completed depth.
                break;
            }
            last_score = score;
            // The adopted answer comes from the root move loop itself; the
            // table walk only extends the line behind it and cannot retract
            // the move if the root entry was evicted meanwhile.
            let best = self.root_best;
            let mut pv = Vec::new();
            if let Some(mv) = best {
                pv.push(mv);
                let mut scratch = board.clone();
                scratch.make_move(mv);
                pv.extend(self.extract_pv(&scratch, depth.saturating_sub(1)));
            }
            if best == result.best_move && best.is_some() {
                stable_iters += 1;
            } else {
                stable_iters = 0;
            }
            result = SearchResult {
                best_move: best,
                score_cp: score,
                depth,
                nodes: self.nodes,
                pv,
            };

            if report {
                print_info(&result, start);
            }
            if let Some(soft) = soft_deadline {
                // A best move that has held for several iterations rarely
                // flips; spend less of the soft budget confirming it.
                let pct: u32 = match stable_iters {
                    0..=2 => 100,
                    3..=5 => 80,
                    _ => 60,
                };
                let allowed = soft.duration_since(start) * pct / 100;
                if start.elapsed() >= allowed {
                    break;
                }
            }
            if is_mate_score(score) && MATE_SCORE - score.abs() <= depth as i32 {
                // Shortest mate already proven; deeper iterations cannot
                // improve it.
                break;
            }
            depth += 1;
        }
        self.history.age();
        result
    }

    fn aspiration(&mut self, board: &mut Board, depth: u32, guess: i32) -> i32 {
        let mut window = ASPIRATION_WINDOW_CP;
        let mut alpha = guess - window;
        let mut beta = guess + window;
        loop {
            let score = self.root(board, depth, alpha, beta);
            if self.stopped {
                return score;
            }
            if score <= alpha {
                alpha = (alpha - window * 2).max(-MATE_SCORE);
            } else if score >= beta {
                beta = (beta + window * 2).min(MATE_SCORE);
            } else {
                return score;
            }
            window *= 2;
            if window > 600 {
                return self.root(board, depth, -MATE_SCORE, MATE_SCORE);
            }
        }
    }

    fn root(&mut self, board: &mut Board, depth: u32, mut alpha: i32, beta: i32) -> i32 {
        let tt_move = self.tt.get(board.key()).and_then(|e| e.best);
        let mut picker = MovePicker::new(tt_move, [None, None]);
        let orig_alpha = alpha;
        let mut best = -MATE_SCORE;
        let mut best_move = None;
        let mut idx = 0usize;

        while let Some(mv) = picker.next(board, &self.history) {
            self.eval.push(board, mv);
            board.make_move(mv);
            let score = if idx == 0 {
                -self.negamax(board, depth - 1, -beta, -alpha, 1)
            } else {
                let mut s = -self.negamax(board, depth - 1, -alpha - 1, -alpha, 1);
                if s > alpha && s < beta {
                    s = -self.negamax(board, depth - 1, -beta, -alpha, 1);
                }
                s
            };
            board.unmake_move();
            self.eval.pop();
            if self.stopped {
                return best;
            }
            if score > best {
                best = score;
                best_move = Some(mv);
            }
            if best > alpha {
                alpha = best;
            }
            if alpha >= beta {
                break;
            }
            idx += 1;
        }

        if best_move.is_none() && idx == 0 {
            let us = board.side_to_move();
            self.root_best = None;
            return if board.in_check(us) { -MATE_SCORE } else { DRAW_SCORE };
        }
        self.root_best = best_move;

        let bound = if best <= orig_alpha {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.store(board.key(), depth, best, best_move, bound, 0);
        best
    }

    fn negamax(&mut self, board: &mut Board, depth: u32, mut alpha: i32, mut beta: i32, ply: usize) -> i32 {
        if self.check_limits() {
            return 0;
        }
        if ply >= MAX_PLY {
            return self.eval.evaluate(board);
        }
        if board.has_repetition() || board.is_fifty_move_draw() || board.is_insufficient_material() {
            return DRAW_SCORE;
        }

        // Mate distance pruning: a mate further away than one already found
        // cannot change the result.
        alpha = alpha.max(-(MATE_SCORE - ply as i32));
        beta = beta.min(MATE_SCORE - ply as i32 - 1);
        if alpha >= beta {
            return alpha;
        }

        let us = board.side_to_move();
        let in_check = board.in_check(us);
        let depth = if in_check { depth + 1 } else { depth };
        if depth == 0 {
            return self.qsearch(board, alpha, beta, ply);
        }
        self.nodes += 1;

        let key = board.key();
        let mut tt_move = None;
        if let Some(entry) = self.tt.get(key) {
            tt_move = entry.best;
            if entry.depth >= depth {
                let score = score_from_tt(entry.score, ply);
                let cutoff = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => score >= beta,
                    Bound::Upper => score <= alpha,
                };
                if cutoff {
                    return score;
                }
            }
        }

        // Null move: hand over the turn; a fail-high against the reduced
        // window means the position is good enough to skip real search.
        // Disabled in check and in pawn-only endings, where zugzwang makes
        // the assumption unsound.
        if depth >= 3 && !in_check && !is_mate_score(beta) && self.has_non_pawn_material(board, us) {
            let r = 2 + depth / 4;
            self.eval.push_null();
            board.make_null();
            let score = -self.negamax(board, depth.saturating_sub(1 + r), -beta, -beta + 1, ply + 1);
            board.unmake_null();
            self.eval.pop();
            if self.stopped {
                return 0;
            }
            if score >= beta {
                return beta;
            }
        }

        let orig_alpha = alpha;
        let mut best = -MATE_SCORE;
        let mut best_move = None;
        let mut picker = MovePicker::new(tt_move, self.killers.probe(ply));
        let mut idx = 0usize;

        while let Some(mv) = picker.next(board, &self.history) {
            let quiet = !mv.is_capture() && !mv.is_promotion();
            self.eval.push(board, mv);
            board.make_move(mv);

            let mut score;
            if idx == 0 {
                score = -self.negamax(board, depth - 1, -beta, -alpha, ply + 1);
            } else {
                // Late quiets get a reduced null-window probe first.
                let reduce = quiet && idx >= 3 && depth >= 3 && !in_check;
                let r = if reduce { 1 + (idx >= 6) as u32 } else { 0 };
                score = -self.negamax(board, depth - 1 - r.min(depth - 1), -alpha - 1, -alpha, ply + 1);
                if score > alpha && (r > 0 || score < beta) {
                    score = -self.negamax(board, depth - 1, -beta, -alpha, ply + 1);
                }
            }

            board.unmake_move();
            self.eval.pop();
            if self.stopped {
                return 0;
            }

            if score > best {
                best = score;
                best_move = Some(mv);
            }
            if best > alpha {
                alpha = best;
            }
            if alpha >= beta {
                if quiet {
                    self.killers.update(ply, mv);
                    self.history.record_cutoff(us, mv, depth);
                }
                break;
            }
            idx += 1;
        }

        if best_move.is_none() && idx == 0 {
            return if in_check { -(MATE_SCORE - ply as i32) } else { DRAW_SCORE };
        }

        let bound = if best <= orig_alpha {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.store(key, depth, best, best_move, bound, ply);
        best
    }

    fn qsearch(&mut self, board: &mut Board, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        if self.check_limits() {
            return 0;
        }
        self.nodes += 1;
        let us = board.side_to_move();
        let in_check = board.in_check(us);

        let stand = if in_check {
            // No stand pat while in check: every evasion must be searched.
            -MATE_SCORE + ply as i32
        } else {
            let s = self.eval.evaluate(board);
            if s >= beta {
                return s;
            }
            if s > alpha {
                alpha = s;
            }
            s
        };

        if ply >= MAX_PLY {
            return stand.max(alpha);
        }

        let mut picker = if in_check {
            MovePicker::new(None, [None, None])
        } else {
            MovePicker::captures()
        };
        let mut best = stand;
        let mut moved = false;

        while let Some(mv) = picker.next(board, &self.history) {
            if !in_check && mv.is_capture() {
                // Futile capture: even winning the exchange plus a margin
                // cannot reach alpha.
                if stand + see(board, mv) + QSEARCH_SEE_MARGIN < alpha {
                    continue;
                }
            }
            moved = true;
            self.eval.push(board, mv);
            board.make_move(mv);
            let score = -self.qsearch(board, -beta, -alpha, ply + 1);
            board.unmake_move();
            self.eval.pop();
            if self.stopped {
                return 0;
            }
            if score > best {
                best = score;
            }
            if best > alpha {
                alpha = best;
            }
            if alpha >= beta {
                break;
            }
        }

        if in_check && !moved {
            return -(MATE_SCORE - ply as i32);
        }
        best
    }

    fn store(&self, key: u64, depth: u32, score: i32, best: Option<Move>, bound: Bound, ply: usize) {
        if self.stopped {
            return;
        }
        self.tt.put(Entry {
            key,
            depth,
            score: score_to_tt(score, ply),
            best,
            bound,
            gen: 0,
        });
    }

    fn has_non_pawn_material(&self, board: &Board, us: crate::board::Color) -> bool {
        board.pieces(us, Piece::Knight)
            | board.pieces(us, Piece::Bishop)
            | board.pieces(us, Piece::Rook)
            | board.pieces(us, Piece::Queen)
            != 0
    }

    /// Cheap limit checks, amortized over a node-count mask.
    fn check_limits(&mut self) -> bool {
        if !self.limits_enabled {
            return false;
        }
        if self.stopped {
            return true;
        }
        if self.nodes & NODE_CHECK_MASK == 0 {
            if self.abort.load(Ordering::Relaxed) {
                self.stopped = true;
            } else if self.nodes >= self.node_limit {
                self.stopped = true;
            } else if let Some(dl) = self.hard_deadline {
                if Instant::now() >= dl {
                    self.stopped = true;
                }
            }
        }
        self.stopped
    }

    /// Walk the table from the root, following stored best moves while they
    /// stay legal. Cycles are bounded by the depth cap.
    fn extract_pv(&self, board: &Board, depth: u32) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut scratch = board.clone();
        for _ in 0..depth {
            let mv = match self.tt.get(scratch.key()).and_then(|e| e.best) {
                Some(m) => m,
                None => break,
            };
            if !movegen::is_legal(&scratch, mv) {
                break;
            }
            scratch.make_move(mv);
            pv.push(mv);
        }
        pv
    }
}

/// Mate scores are stored relative to the probing node so a line found at
/// one ply transfers correctly to another.
fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_SCORE - MAX_PLY as i32 {
        score + ply as i32
    } else if score <= -(MATE_SCORE - MAX_PLY as i32) {
        score - ply as i32
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_SCORE - MAX_PLY as i32 {
        score - ply as i32
    } else if score <= -(MATE_SCORE - MAX_PLY as i32) {
        score + ply as i32
    } else {
        score
    }
}

fn print_info(result: &SearchResult, start: Instant) {
    let elapsed = start.elapsed();
    let ms = elapsed.as_millis().max(1);
    let nps = result.nodes as u128 * 1000 / ms;
    let score = match mate_in(result.score_cp) {
        Some(m) => format!("mate {m}"),
        None => format!("cp {}", result.score_cp),
    };
    let pv: Vec<String> = result.pv.iter().map(|m| m.to_uci()).collect();
    println!(
        "info depth {} score {} nodes {} nps {} time {} pv {}",
        result.depth,
        score,
        result.nodes,
        nps,
        ms,
        pv.join(" ")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fen: &str, depth: u32) -> SearchResult {
        let board = Board::from_fen(fen).unwrap();
        let params = SearchParams { depth: Some(depth), threads: 1, ..Default::default() };
        search(
            &board,
            &params,
            Arc::new(Tt::with_capacity_entries(1 << 16)),
            None,
            Arc::new(AtomicBool::new(false)),
        )
    }

    #[test]
    fn finds_mate_in_one() {
        // Back-rank: Ra8#.
        let r = run("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 4);
        assert_eq!(r.best_move.map(|m| m.to_uci()), Some("a1a8".to_string()));
        assert_eq!(mate_in(r.score_cp), Some(1));
    }

    #[test]
    fn finds_mate_in_two() {
        // Classic two-rook ladder.
        let r = run("7k/8/8/8/8/8/R7/1R4K1 w - - 0 1", 6);
        assert_eq!(mate_in(r.score_cp), Some(2));
    }

    #[test]
    fn avoids_hanging_the_queen() {
        // Queen attacked by the h3 pawn; any non-losing move keeps the
        // score sane.
        let r = run("rnb1kbnr/pppp1ppp/8/4p3/4P1q1/5N1P/PPPP1PP1/RNBQKB1R b KQkq - 0 3", 4);
        assert!(r.score_cp > -400, "should not lose the queen, got {}", r.score_cp);
        assert!(r.best_move.is_some());
    }

    #[test]
    fn takes_free_material() {
        // White queen en prise to the rook.
        let r = run("4k3/8/8/3r4/3Q4/8/8/4K3 b - - 0 1", 4);
        assert_eq!(r.best_move.map(|m| m.to_uci()), Some("d5d4".to_string()));
    }

    #[test]
    fn stalemate_scores_draw() {
        // Black to move has no moves and is not in check.
        let r = run("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 3);
        assert_eq!(r.score_cp, DRAW_SCORE);
        assert!(r.best_move.is_none());
    }

    #[test]
    fn node_limit_stops_the_search() {
        let board = Board::startpos();
        let params = SearchParams {
            depth: Some(MAX_DEPTH),
            max_nodes: Some(20_000),
            threads: 1,
            ..Default::default()
        };
        let r = search(
            &board,
            &params,
            Arc::new(Tt::with_capacity_entries(1 << 14)),
            None,
            Arc::new(AtomicBool::new(false)),
        );
        assert!(r.best_move.is_some());
        assert!(r.nodes < 200_000, "node limit ignored: {}", r.nodes);
    }

    #[test]
    fn pre_set_abort_still_reports_a_depth_one_move() {
        let board = Board::startpos();
        let abort = Arc::new(AtomicBool::new(true));
        let params = SearchParams { depth: Some(30), threads: 1, ..Default::default() };
        let r = search(&board, &params, Arc::new(Tt::new()), None, abort);
        // Depth 1 ignores the flag so the caller always gets a move;
        // nothing deeper runs.
        assert_eq!(r.depth, 1);
        assert!(r.best_move.is_some());
    }

    #[test]
    fn expired_deadline_still_reports_a_depth_one_move() {
        use super::super::time::TimeBudget;
        let board = Board::startpos();
        let params = SearchParams {
            depth: Some(30),
            budget: Some(TimeBudget::fixed(std::time::Duration::ZERO)),
            threads: 1,
            ..Default::default()
        };
        let r = search(
            &board,
            &params,
            Arc::new(Tt::new()),
            None,
            Arc::new(AtomicBool::new(false)),
        );
        assert_eq!(r.depth, 1);
        assert!(r.best_move.is_some());
    }

    #[test]
    fn pv_starts_with_best_move() {
        let r = run(crate::board::position::START_FEN, 5);
        assert!(r.best_move.is_some());
        assert_eq!(r.pv.first().copied(), r.best_move);
        assert!(r.pv.len() >= 2);
    }

    #[test]
    fn repetition_is_scored_as_draw() {
        // Down a rook, white can force perpetual shuffling; the score from
        // white's side should be far better than the material deficit.
        let mut board =
            Board::from_fen("k7/8/8/8/8/8/r7/K7 w - - 0 1").unwrap();
        // Shuffle once so the repetition detector has history to see.
        for uci in ["a1b1", "a2b2", "b1a1", "b2a2"] {
            let mv = board.parse_move(uci).unwrap();
            board.make_move(mv);
        }
        let params = SearchParams { depth: Some(6), threads: 1, ..Default::default() };
        let r = search(
            &board,
            &params,
            Arc::new(Tt::with_capacity_entries(1 << 14)),
            None,
            Arc::new(AtomicBool::new(false)),
        );
        assert!(r.score_cp >= -200, "perpetual should hold the draw, got {}", r.score_cp);
    }
}
