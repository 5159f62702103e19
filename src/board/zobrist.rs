//! Zobrist hashing keys, generated deterministically at first use.

use super::position::Board;
use super::{Color, Piece};
use std::sync::OnceLock;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

struct Keys {
    pieces: [u64; 12 * 64],
    side: u64,
    castling: [u64; 16],
    ep_file: [u64; 8],
}

static KEYS: OnceLock<Keys> = OnceLock::new();

fn keys() -> &'static Keys {
    KEYS.get_or_init(|| {
        let mut seed = 0xF00D_F00D_DEAD_BEEF;
        let mut next = || {
            seed = splitmix64(seed);
            seed
        };
        let mut pieces = [0u64; 12 * 64];
        for v in &mut pieces {
            *v = next();
        }
        let side = next();
        let mut castling = [0u64; 16];
        for v in &mut castling {
            *v = next();
        }
        let mut ep_file = [0u64; 8];
        for v in &mut ep_file {
            *v = next();
        }
        Keys { pieces, side, castling, ep_file }
    })
}

#[inline(always)]
pub fn piece_key(color: Color, piece: Piece, sq: u8) -> u64 {
    let idx = (color.index() * 6 + piece.index()) * 64 + sq as usize;
    keys().pieces[idx]
}

#[inline(always)]
pub fn side_key() -> u64 {
    keys().side
}

#[inline(always)]
pub fn castling_key(rights: u8) -> u64 {
    keys().castling[(rights & 0xF) as usize]
}

#[inline(always)]
pub fn ep_file_key(file: u8) -> u64 {
    keys().ep_file[(file & 7) as usize]
}

/// From-scratch key recomputation. The board maintains its key
/// incrementally; this is the reference the incremental value must match.
pub fn compute(board: &Board) -> u64 {
    let mut key = 0u64;
    for &color in &[Color::White, Color::Black] {
        for &piece in &Piece::ALL {
            for sq in crate::board::bitboard::squares_of(board.pieces(color, piece)) {
                key ^= piece_key(color, piece, sq);
            }
        }
    }
    if board.side_to_move() == Color::Black {
        key ^= side_key();
    }
    key ^= castling_key(board.castling_rights());
    if let Some(file) = board.ep_file() {
        key ^= ep_file_key(file);
    }
    key
}
