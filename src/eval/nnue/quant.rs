//! Quantized forward pass. Integer-only; the constants come from the
//! weight file and must match the training pipeline exactly or the output
//! is garbage.

use super::accumulator::Accumulator;
use super::loader::{Activation, QuantNnue};
use crate::board::Color;

#[inline(always)]
fn crelu(x: i16, qa: i32) -> i64 {
    (x as i32).clamp(0, qa) as i64
}

/// Output in centipawns from the side to move's perspective.
pub fn forward(net: &QuantNnue, acc: &Accumulator, stm: Color) -> i32 {
    let h = net.meta.hidden_dim;
    let qa = net.meta.qa;
    let qb = net.meta.qb as i64;
    let scale = net.meta.scale as i64;
    let (ours, theirs) = acc.perspectives(stm);

    let mut sum: i64 = 0;
    match net.meta.activation {
        Activation::ClippedRelu => {
            for j in 0..h {
                sum += crelu(ours[j], qa) * net.w2[j] as i64;
                sum += crelu(theirs[j], qa) * net.w2[h + j] as i64;
            }
            ((sum + net.b2 as i64) * scale / (qa as i64 * qb)) as i32
        }
        Activation::SquaredClippedRelu => {
            // Squaring adds one extra qa factor; divide it back out before
            // the bias so both variants share the final rescale.
            for j in 0..h {
                let o = crelu(ours[j], qa);
                let t = crelu(theirs[j], qa);
                sum += o * o * net.w2[j] as i64;
                sum += t * t * net.w2[h + j] as i64;
            }
            ((sum / qa as i64 + net.b2 as i64) * scale / (qa as i64 * qb)) as i32
        }
    }
}
