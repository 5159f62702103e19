//! Incrementally updated neural evaluation (NNUE).
//!
//! `loader` reads the quantized weight blob, `features` maps piece
//! placements to input indices, `accumulator` keeps the first layer in sync
//! across make/unmake, and `quant` runs the integer output layer.

pub mod accumulator;
pub mod features;
pub mod loader;
pub mod quant;

pub use accumulator::{Accumulator, MoveDelta};
pub use loader::{Activation, NnueMeta, QuantNnue};

use crate::board::{Board, Color};

impl QuantNnue {
    /// One-shot evaluation via a fresh accumulator; parity reference for
    /// the incremental path and convenience for cold positions.
    pub fn evaluate(&self, board: &Board) -> i32 {
        let mut acc = Accumulator::new(self.meta.hidden_dim);
        acc.refresh(self, board);
        self.evaluate_acc(&acc, board.side_to_move())
    }

    #[inline]
    pub fn evaluate_acc(&self, acc: &Accumulator, stm: Color) -> i32 {
        quant::forward(self, acc, stm)
    }
}
