//! Position evaluation: the incrementally updated NNUE when a weight file
//! is loaded, otherwise the material + piece-square fallback.

pub mod material;
pub mod nnue;

pub use material::eval_cp;

use crate::board::moves::Move;
use crate::board::Board;
use nnue::{Accumulator, MoveDelta, QuantNnue};
use std::sync::Arc;

/// Per-search evaluation state. The accumulator stack is pushed/popped in
/// lockstep with make/unmake so the hot path never recomputes from scratch.
pub struct EvalState {
    net: Option<Arc<QuantNnue>>,
    stack: Vec<Accumulator>,
}

impl EvalState {
    pub fn material() -> EvalState {
        EvalState { net: None, stack: Vec::new() }
    }

    pub fn nnue(net: Arc<QuantNnue>) -> EvalState {
        EvalState { net: Some(net), stack: Vec::new() }
    }

    pub fn is_nnue(&self) -> bool {
        self.net.is_some()
    }

    /// Rebuild the root accumulator for a new search position.
    pub fn reset(&mut self, board: &Board) {
        if let Some(net) = &self.net {
            let mut acc = Accumulator::new(net.meta.hidden_dim);
            acc.refresh(net, board);
            self.stack.clear();
            self.stack.push(acc);
        }
    }

    /// Call with the pre-move board, before `board.make_move(mv)`.
    pub fn push(&mut self, board: &Board, mv: Move) {
        if let Some(net) = &self.net {
            let delta = MoveDelta::from_move(board, mv);
            let mut acc = match self.stack.last() {
                Some(top) => top.clone(),
                None => {
                    let mut a = Accumulator::new(net.meta.hidden_dim);
                    a.refresh(net, board);
                    a
                }
            };
            acc.apply(net, &delta);
            self.stack.push(acc);
        }
    }

    /// Null move: position features are unchanged, only the perspective
    /// order flips, which `evaluate` reads off the board.
    pub fn push_null(&mut self) {
        if self.net.is_some() {
            if let Some(top) = self.stack.last() {
                let dup = top.clone();
                self.stack.push(dup);
            }
        }
    }

    pub fn pop(&mut self) {
        if self.net.is_some() {
            self.stack.pop();
        }
    }

    pub fn evaluate(&self, board: &Board) -> i32 {
        match (&self.net, self.stack.last()) {
            (Some(net), Some(acc)) => net.evaluate_acc(acc, board.side_to_move()),
            (Some(net), None) => net.evaluate(board),
            _ => material::eval_cp(board),
        }
    }
}
