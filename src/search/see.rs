//! Static exchange evaluation: swap-off material outcome of a capture
//! sequence on one square, without searching.

use crate::board::attacks::{bishop_attacks, rook_attacks};
use crate::board::bitboard::*;
use crate::board::movegen::attackers_to;
use crate::board::moves::{Move, MoveFlag};
use crate::board::{Board, Color, Piece};
use crate::eval::material::piece_value;

/// Net material gain in centipawns, from the moving side's perspective,
/// assuming both sides capture with their least valuable attacker and stop
/// when continuing loses material.
pub fn see(board: &Board, mv: Move) -> i32 {
    let us = board.side_to_move();
    let to = mv.to();
    let from = mv.from();
    let moving = match board.piece_on(from) {
        Some((_, p)) => p,
        None => return 0,
    };

    let mut occ = board.all_occ();
    let mut gains = [0i32; 32];
    gains[0] = match mv.flag() {
        MoveFlag::EnPassant => {
            let cap_sq = match us {
                Color::White => to - 8,
                Color::Black => to + 8,
            };
            occ ^= bb(cap_sq);
            piece_value(Piece::Pawn)
        }
        _ => board.piece_on(to).map(|(_, p)| piece_value(p)).unwrap_or(0),
    };

    let diag_all = board.pieces(Color::White, Piece::Bishop)
        | board.pieces(Color::Black, Piece::Bishop)
        | board.pieces(Color::White, Piece::Queen)
        | board.pieces(Color::Black, Piece::Queen);
    let ortho_all = board.pieces(Color::White, Piece::Rook)
        | board.pieces(Color::Black, Piece::Rook)
        | board.pieces(Color::White, Piece::Queen)
        | board.pieces(Color::Black, Piece::Queen);

    let mut attackers = attackers_to(board, to, occ);
    let mut side = us;
    let mut from_set = bb(from);
    let mut attacker_val = piece_value(moving);
    let mut d = 0usize;

    loop {
        d += 1;
        if d >= gains.len() {
            break;
        }
        gains[d] = attacker_val - gains[d - 1];
        // Lift the capturer; sliders standing behind it now bear on the square.
        occ ^= from_set;
        attackers |= (bishop_attacks(to, occ) & diag_all) | (rook_attacks(to, occ) & ortho_all);
        attackers &= occ;
        side = side.opponent();

        match least_valuable(board, attackers & board.color_occ(side)) {
            Some((next_from, piece)) => {
                // A king may only recapture if nothing can take it back.
                if piece == Piece::King
                    && attackers & board.color_occ(side.opponent()) & occ != EMPTY
                {
                    break;
                }
                from_set = next_from;
                attacker_val = piece_value(piece);
            }
            None => break,
        }
    }

    // Negamax fold over the swap list: each side may stop the sequence.
    for i in (1..d).rev() {
        gains[i - 1] = -(-gains[i - 1]).max(gains[i]);
    }
    gains[0]
}

fn least_valuable(board: &Board, attackers: Bitboard) -> Option<(Bitboard, Piece)> {
    if attackers == EMPTY {
        return None;
    }
    for &piece in &Piece::ALL {
        for &color in &[Color::White, Color::Black] {
            let subset = attackers & board.pieces(color, piece);
            if subset != EMPTY {
                let sq = subset.trailing_zeros() as u8;
                return Some((bb(sq), piece));
            }
        }
    }
    None
}
