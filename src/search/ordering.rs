//! Staged move ordering for the alpha-beta search.
//!
//! The picker emits the TT move first, then winning captures by SEE,
//! killer quiets, history-ordered quiets, and finally the losing captures
//! it deferred. Quiet generation and scoring are delayed until the capture
//! stages are exhausted, so an early beta cutoff never pays for them.

use super::see::see;
use crate::board::movegen::{self, generate, GenFilter};
use crate::board::moves::Move;
use crate::board::{Board, Color};

pub const MAX_PLY: usize = 128;

/// Butterfly history: (color, from, to) -> cutoff credit. Bumped by depth²
/// on quiet beta cutoffs, halved periodically so old credit decays.
pub struct HistoryTable {
    table: Vec<i32>,
}

const HISTORY_CAP: i32 = 1 << 20;

impl Default for HistoryTable {
    fn default() -> Self {
        HistoryTable { table: vec![0; 2 * 64 * 64] }
    }
}

impl HistoryTable {
    #[inline(always)]
    fn index(color: Color, mv: Move) -> usize {
        color.index() * 4096 + mv.from() as usize * 64 + mv.to() as usize
    }

    #[inline(always)]
    pub fn get(&self, color: Color, mv: Move) -> i32 {
        self.table[Self::index(color, mv)]
    }

    pub fn record_cutoff(&mut self, color: Color, mv: Move, depth: u32) {
        let slot = &mut self.table[Self::index(color, mv)];
        *slot = (*slot + (depth * depth) as i32).min(HISTORY_CAP);
    }

    /// Halve all credit; bounds growth across long searches.
    pub fn age(&mut self) {
        for v in &mut self.table {
            *v /= 2;
        }
    }

    pub fn clear(&mut self) {
        self.table.iter_mut().for_each(|v| *v = 0);
    }
}

/// Two killer slots per ply, most recent first.
pub struct Killers {
    slots: Vec<[Option<Move>; 2]>,
}

impl Default for Killers {
    fn default() -> Self {
        Killers { slots: vec![[None, None]; MAX_PLY] }
    }
}

impl Killers {
    pub fn probe(&self, ply: usize) -> [Option<Move>; 2] {
        if ply < self.slots.len() {
            self.slots[ply]
        } else {
            [None, None]
        }
    }

    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply >= self.slots.len() {
            return;
        }
        let slot = &mut self.slots[ply];
        if slot[0] != Some(mv) {
            slot[1] = slot[0];
            slot[0] = Some(mv);
        }
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = [None, None]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    TtMove,
    GenCaptures,
    GoodCaptures,
    Killers,
    GenQuiets,
    Quiets,
    BadCaptures,
    Done,
}

pub struct MovePicker {
    stage: Stage,
    tt_move: Option<Move>,
    killers: [Option<Move>; 2],
    killer_idx: usize,
    good_captures: Vec<(Move, i32)>,
    bad_captures: Vec<Move>,
    bad_idx: usize,
    quiets: Vec<(Move, i32)>,
    captures_only: bool,
}

impl MovePicker {
    pub fn new(tt_move: Option<Move>, killers: [Option<Move>; 2]) -> MovePicker {
        MovePicker {
            stage: Stage::TtMove,
            tt_move,
            killers,
            killer_idx: 0,
            good_captures: Vec::new(),
            bad_captures: Vec::new(),
            bad_idx: 0,
            quiets: Vec::new(),
            captures_only: false,
        }
    }

    /// Quiescence picker: captures and promotions only, no TT/killer stages.
    pub fn captures() -> MovePicker {
        let mut p = MovePicker::new(None, [None, None]);
        p.stage = Stage::GenCaptures;
        p.captures_only = true;
        p
    }

    pub fn next(&mut self, board: &Board, history: &HistoryTable) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TtMove => {
                    self.stage = Stage::GenCaptures;
                    if let Some(mv) = self.tt_move {
                        // Stored moves come from other search paths; verify
                        // against this position before trusting them.
                        if movegen::is_legal(board, mv) {
                            return Some(mv);
                        }
                        self.tt_move = None;
                    }
                }
                Stage::GenCaptures => {
                    for mv in generate(board, GenFilter::Captures) {
                        if Some(mv) == self.tt_move {
                            continue;
                        }
                        let gain = see(board, mv);
                        if gain >= 0 {
                            self.good_captures.push((mv, gain));
                        } else {
                            self.bad_captures.push(mv);
                        }
                    }
                    // Ascending so pop() yields the best remaining.
                    self.good_captures.sort_by_key(|&(_, s)| s);
                    self.stage = Stage::GoodCaptures;
                }
                Stage::GoodCaptures => {
                    if let Some((mv, _)) = self.good_captures.pop() {
                        return Some(mv);
                    }
                    self.stage = if self.captures_only {
                        Stage::BadCaptures
                    } else {
                        Stage::Killers
                    };
                }
                Stage::Killers => {
                    while self.killer_idx < 2 {
                        let k = self.killers[self.killer_idx];
                        self.killer_idx += 1;
                        if let Some(mv) = k {
                            if Some(mv) != self.tt_move
                                && !mv.is_capture()
                                && movegen::is_legal(board, mv)
                            {
                                return Some(mv);
                            }
                        }
                    }
                    self.stage = Stage::GenQuiets;
                }
                Stage::GenQuiets => {
                    let stm = board.side_to_move();
                    for mv in generate(board, GenFilter::All) {
                        if mv.is_capture() || mv.is_promotion() {
                            continue;
                        }
                        if Some(mv) == self.tt_move || self.killers.contains(&Some(mv)) {
                            continue;
                        }
                        self.quiets.push((mv, history.get(stm, mv)));
                    }
                    self.quiets.sort_by_key(|&(_, s)| s);
                    self.stage = Stage::Quiets;
                }
                Stage::Quiets => {
                    if let Some((mv, _)) = self.quiets.pop() {
                        return Some(mv);
                    }
                    self.stage = Stage::BadCaptures;
                }
                Stage::BadCaptures => {
                    if self.bad_idx < self.bad_captures.len() {
                        let mv = self.bad_captures[self.bad_idx];
                        self.bad_idx += 1;
                        return Some(mv);
                    }
                    self.stage = Stage::Done;
                }
                Stage::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn picker_emits_each_legal_move_exactly_once() {
        let b = Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
        let legal: HashSet<Move> = generate(&b, GenFilter::All).into_iter().collect();
        let history = HistoryTable::default();
        let tt_move = legal.iter().copied().next();
        let mut picker = MovePicker::new(tt_move, [None, None]);
        let mut seen = HashSet::new();
        while let Some(mv) = picker.next(&b, &history) {
            assert!(legal.contains(&mv), "{mv} not legal");
            assert!(seen.insert(mv), "{mv} emitted twice");
        }
        assert_eq!(seen.len(), legal.len());
    }

    #[test]
    fn winning_capture_comes_before_losing_one() {
        // Rook can take a defended pawn (losing) or an undefended one
        // (winning); the winning capture must be emitted first and the
        // losing one deferred to the end.
        let b = Board::from_fen("4k3/2p5/3p4/8/8/8/3R3p/4K3 w - - 0 1").unwrap();
        let history = HistoryTable::default();
        let mut picker = MovePicker::new(None, [None, None]);
        let mut order = Vec::new();
        while let Some(mv) = picker.next(&b, &history) {
            if mv.is_capture() {
                order.push(mv.to_uci());
            }
        }
        assert_eq!(order.first().map(String::as_str), Some("d2h2"));
        assert_eq!(order.last().map(String::as_str), Some("d2d6"));
    }

    #[test]
    fn stale_tt_move_is_skipped() {
        let b = Board::startpos();
        let history = HistoryTable::default();
        // A move that is never legal at the start position.
        let bogus = Move::new(0, 63, crate::board::MoveFlag::Quiet);
        let mut picker = MovePicker::new(Some(bogus), [None, None]);
        let mut count = 0;
        while let Some(mv) = picker.next(&b, &history) {
            assert_ne!(mv, bogus);
            count += 1;
        }
        assert_eq!(count, 20);
    }

    #[test]
    fn killer_precedes_plain_quiets() {
        let b = Board::startpos();
        let history = HistoryTable::default();
        let killer = b.parse_move("g1f3").unwrap();
        let mut picker = MovePicker::new(None, [Some(killer), None]);
        let first = picker.next(&b, &history).unwrap();
        assert_eq!(first, killer);
    }

    #[test]
    fn history_orders_quiets() {
        let b = Board::startpos();
        let mut history = HistoryTable::default();
        let preferred = b.parse_move("b1c3").unwrap();
        history.record_cutoff(Color::White, preferred, 10);
        let mut picker = MovePicker::new(None, [None, None]);
        assert_eq!(picker.next(&b, &history), Some(preferred));
    }
}
