//! Legal move generation via checkmask/pinmask restriction.
//!
//! Pseudo-legal targets come straight from the attack tables; legality is
//! enforced in the same pass: single check restricts non-king moves to
//! blocking or capturing the checker, double check to king moves only, and
//! pinned pieces to the ray through king and pinner. En passant gets its own
//! occupancy simulation because removing two pawns at once can expose a rank
//! pin no other test sees.

use super::attacks::{
    between, bishop_attacks, king_attacks, knight_attacks, line, pawn_attacks, queen_attacks,
    rook_attacks,
};
use super::bitboard::*;
use super::moves::{Move, MoveFlag};
use super::position::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
use super::{Color, Piece};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenFilter {
    All,
    /// Captures, en passant, and promotions; the quiescence move set.
    Captures,
}

/// Is `sq` attacked by any piece of `by`, given an occupancy override?
/// The override lets callers probe king-flight squares with the king lifted.
pub fn attacked(board: &Board, sq: u8, by: Color, occ: Bitboard) -> bool {
    if pawn_attacks(by.opponent(), sq) & board.pieces(by, Piece::Pawn) != EMPTY {
        return true;
    }
    if knight_attacks(sq) & board.pieces(by, Piece::Knight) != EMPTY {
        return true;
    }
    if king_attacks(sq) & board.pieces(by, Piece::King) != EMPTY {
        return true;
    }
    let diag = board.pieces(by, Piece::Bishop) | board.pieces(by, Piece::Queen);
    if bishop_attacks(sq, occ) & diag != EMPTY {
        return true;
    }
    let ortho = board.pieces(by, Piece::Rook) | board.pieces(by, Piece::Queen);
    rook_attacks(sq, occ) & ortho != EMPTY
}

/// All attackers of both colors bearing on `sq` under `occ`; SEE input.
pub fn attackers_to(board: &Board, sq: u8, occ: Bitboard) -> Bitboard {
    let mut att = EMPTY;
    att |= pawn_attacks(Color::Black, sq) & board.pieces(Color::White, Piece::Pawn);
    att |= pawn_attacks(Color::White, sq) & board.pieces(Color::Black, Piece::Pawn);
    let knights =
        board.pieces(Color::White, Piece::Knight) | board.pieces(Color::Black, Piece::Knight);
    att |= knight_attacks(sq) & knights;
    let kings = board.pieces(Color::White, Piece::King) | board.pieces(Color::Black, Piece::King);
    att |= king_attacks(sq) & kings;
    let diag = board.pieces(Color::White, Piece::Bishop)
        | board.pieces(Color::Black, Piece::Bishop)
        | board.pieces(Color::White, Piece::Queen)
        | board.pieces(Color::Black, Piece::Queen);
    att |= bishop_attacks(sq, occ) & diag;
    let ortho = board.pieces(Color::White, Piece::Rook)
        | board.pieces(Color::Black, Piece::Rook)
        | board.pieces(Color::White, Piece::Queen)
        | board.pieces(Color::Black, Piece::Queen);
    att |= rook_attacks(sq, occ) & ortho;
    att
}

/// Whether `mv` is legal here. Vets moves from external sources such as
/// the transposition table before they are played.
pub fn is_legal(board: &Board, mv: Move) -> bool {
    generate(board, GenFilter::All).contains(&mv)
}

pub fn generate(board: &Board, filter: GenFilter) -> Vec<Move> {
    let mut moves = Vec::with_capacity(48);
    let us = board.side_to_move();
    let them = us.opponent();
    let occ = board.all_occ();
    let us_occ = board.color_occ(us);
    let them_occ = board.color_occ(them);
    let ksq = board.king_sq(us);

    let checkers = attackers_of(board, ksq, them, occ);

    // King moves are generated with the king lifted off the occupancy so a
    // slider's ray extends "through" the king square.
    let occ_no_king = occ ^ bb(ksq);
    let king_targets = match filter {
        GenFilter::All => king_attacks(ksq) & !us_occ,
        GenFilter::Captures => king_attacks(ksq) & them_occ,
    };
    for to in squares_of(king_targets) {
        if !attacked(board, to, them, occ_no_king) {
            let flag = if them_occ & bb(to) != EMPTY {
                MoveFlag::Capture
            } else {
                MoveFlag::Quiet
            };
            moves.push(Move::new(ksq, to, flag));
        }
    }

    if checkers.count_ones() >= 2 {
        return moves;
    }

    // Non-king moves must land inside the checkmask when in check.
    let check_mask = if checkers != EMPTY {
        let checker = checkers.trailing_zeros() as u8;
        between(ksq, checker) | checkers
    } else {
        FULL
    };

    let pinned = pinned_pieces(board, us, ksq);
    let base_targets = match filter {
        GenFilter::All => !us_occ,
        GenFilter::Captures => them_occ,
    };

    for from in squares_of(board.pieces(us, Piece::Knight) & !pinned) {
        // A pinned knight never has a legal move; skipping it outright.
        let targets = knight_attacks(from) & base_targets & check_mask;
        push_piece_moves(&mut moves, board, from, targets, them_occ);
    }
    for from in squares_of(board.pieces(us, Piece::Bishop)) {
        let mut targets = bishop_attacks(from, occ) & base_targets & check_mask;
        if pinned & bb(from) != EMPTY {
            targets &= line(ksq, from);
        }
        push_piece_moves(&mut moves, board, from, targets, them_occ);
    }
    for from in squares_of(board.pieces(us, Piece::Rook)) {
        let mut targets = rook_attacks(from, occ) & base_targets & check_mask;
        if pinned & bb(from) != EMPTY {
            targets &= line(ksq, from);
        }
        push_piece_moves(&mut moves, board, from, targets, them_occ);
    }
    for from in squares_of(board.pieces(us, Piece::Queen)) {
        let mut targets = queen_attacks(from, occ) & base_targets & check_mask;
        if pinned & bb(from) != EMPTY {
            targets &= line(ksq, from);
        }
        push_piece_moves(&mut moves, board, from, targets, them_occ);
    }

    gen_pawn_moves(&mut moves, board, filter, check_mask, pinned, ksq);
    gen_en_passant(&mut moves, board, checkers, ksq);

    if filter == GenFilter::All && checkers == EMPTY {
        gen_castling(&mut moves, board, ksq);
    }

    moves
}

fn attackers_of(board: &Board, sq: u8, by: Color, occ: Bitboard) -> Bitboard {
    let mut att = pawn_attacks(by.opponent(), sq) & board.pieces(by, Piece::Pawn);
    att |= knight_attacks(sq) & board.pieces(by, Piece::Knight);
    let diag = board.pieces(by, Piece::Bishop) | board.pieces(by, Piece::Queen);
    att |= bishop_attacks(sq, occ) & diag;
    let ortho = board.pieces(by, Piece::Rook) | board.pieces(by, Piece::Queen);
    att |= rook_attacks(sq, occ) & ortho;
    att
}

/// Friendly pieces standing alone between the king and an enemy slider.
fn pinned_pieces(board: &Board, us: Color, ksq: u8) -> Bitboard {
    let them = us.opponent();
    let occ = board.all_occ();
    let mut pinned = EMPTY;
    let diag_snipers = bishop_attacks(ksq, EMPTY)
        & (board.pieces(them, Piece::Bishop) | board.pieces(them, Piece::Queen));
    let ortho_snipers = rook_attacks(ksq, EMPTY)
        & (board.pieces(them, Piece::Rook) | board.pieces(them, Piece::Queen));
    for sniper in squares_of(diag_snipers | ortho_snipers) {
        let blockers = between(ksq, sniper) & occ;
        if blockers.count_ones() == 1 && blockers & board.color_occ(us) != EMPTY {
            pinned |= blockers;
        }
    }
    pinned
}

fn push_piece_moves(moves: &mut Vec<Move>, _board: &Board, from: u8, targets: Bitboard, them_occ: Bitboard) {
    for to in squares_of(targets) {
        let flag = if them_occ & bb(to) != EMPTY {
            MoveFlag::Capture
        } else {
            MoveFlag::Quiet
        };
        moves.push(Move::new(from, to, flag));
    }
}

fn gen_pawn_moves(
    moves: &mut Vec<Move>,
    board: &Board,
    filter: GenFilter,
    check_mask: Bitboard,
    pinned: Bitboard,
    ksq: u8,
) {
    let us = board.side_to_move();
    let them = us.opponent();
    let occ = board.all_occ();
    let them_occ = board.color_occ(them);
    let (push_dir, start_rank, promo_rank): (i8, Bitboard, Bitboard) = match us {
        Color::White => (8, RANK_2, RANK_8),
        Color::Black => (-8, RANK_7, RANK_1),
    };

    for from in squares_of(board.pieces(us, Piece::Pawn)) {
        let pin_line = if pinned & bb(from) != EMPTY {
            line(ksq, from)
        } else {
            FULL
        };

        // Captures (promoting and not).
        let caps = pawn_attacks(us, from) & them_occ & check_mask & pin_line;
        for to in squares_of(caps) {
            if bb(to) & promo_rank != EMPTY {
                moves.push(Move::new(from, to, MoveFlag::PromoCaptureQueen));
                moves.push(Move::new(from, to, MoveFlag::PromoCaptureRook));
                moves.push(Move::new(from, to, MoveFlag::PromoCaptureBishop));
                moves.push(Move::new(from, to, MoveFlag::PromoCaptureKnight));
            } else {
                moves.push(Move::new(from, to, MoveFlag::Capture));
            }
        }

        // Pushes.
        let one = from as i8 + push_dir;
        if !(0..64).contains(&one) || occ & bb(one as u8) != EMPTY {
            continue;
        }
        let one = one as u8;
        let one_ok = bb(one) & check_mask & pin_line != EMPTY;
        let promoting = bb(one) & promo_rank != EMPTY;
        if one_ok && (filter == GenFilter::All || promoting) {
            if promoting {
                moves.push(Move::new(from, one, MoveFlag::PromoQueen));
                moves.push(Move::new(from, one, MoveFlag::PromoRook));
                moves.push(Move::new(from, one, MoveFlag::PromoBishop));
                moves.push(Move::new(from, one, MoveFlag::PromoKnight));
            } else {
                moves.push(Move::new(from, one, MoveFlag::Quiet));
            }
        }
        if filter == GenFilter::All && bb(from) & start_rank != EMPTY {
            let two = (from as i8 + 2 * push_dir) as u8;
            if occ & bb(two) == EMPTY && bb(two) & check_mask & pin_line != EMPTY {
                moves.push(Move::new(from, two, MoveFlag::DoublePush));
            }
        }
    }
}

fn gen_en_passant(moves: &mut Vec<Move>, board: &Board, checkers: Bitboard, ksq: u8) {
    let to = match board.ep_square() {
        Some(sq) => sq,
        None => return,
    };
    let us = board.side_to_move();
    let them = us.opponent();
    let cap_sq = match us {
        Color::White => to - 8,
        Color::Black => to + 8,
    };

    // Capturing en passant while in check is only plausible when the checker
    // is the just-pushed pawn or the capture square blocks the ray.
    if checkers != EMPTY {
        let checker = checkers.trailing_zeros() as u8;
        if checker != cap_sq && between(ksq, checker) & bb(to) == EMPTY {
            return;
        }
    }

    for from in squares_of(pawn_attacks(them, to) & board.pieces(us, Piece::Pawn)) {
        // Both pawns leave the board at once; re-verify the king against
        // sliders on the resulting occupancy (catches the rank-5 pin).
        let occ_after = (board.all_occ() ^ bb(from) ^ bb(cap_sq)) | bb(to);
        let ortho = board.pieces(them, Piece::Rook) | board.pieces(them, Piece::Queen);
        let diag = board.pieces(them, Piece::Bishop) | board.pieces(them, Piece::Queen);
        if rook_attacks(ksq, occ_after) & ortho == EMPTY
            && bishop_attacks(ksq, occ_after) & diag == EMPTY
        {
            moves.push(Move::new(from, to, MoveFlag::EnPassant));
        }
    }
}

fn gen_castling(moves: &mut Vec<Move>, board: &Board, ksq: u8) {
    let us = board.side_to_move();
    let them = us.opponent();
    let occ = board.all_occ();
    let rights = board.castling_rights();

    let (k_right, q_right) = match us {
        Color::White => (CASTLE_WK, CASTLE_WQ),
        Color::Black => (CASTLE_BK, CASTLE_BQ),
    };
    let home = match us {
        Color::White => 0u8,
        Color::Black => 56,
    };

    if rights & k_right != 0 {
        let f = home + 5;
        let g = home + 6;
        if occ & (bb(f) | bb(g)) == EMPTY
            && !attacked(board, f, them, occ)
            && !attacked(board, g, them, occ)
        {
            moves.push(Move::new(ksq, g, MoveFlag::CastleKing));
        }
    }
    if rights & q_right != 0 {
        let b = home + 1;
        let c = home + 2;
        let d = home + 3;
        if occ & (bb(b) | bb(c) | bb(d)) == EMPTY
            && !attacked(board, d, them, occ)
            && !attacked(board, c, them, occ)
        {
            moves.push(Move::new(ksq, c, MoveFlag::CastleQueen));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_has_twenty_moves() {
        let b = Board::startpos();
        assert_eq!(generate(&b, GenFilter::All).len(), 20);
        assert_eq!(generate(&b, GenFilter::Captures).len(), 0);
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        // Knight on f6 and rook on e1 both give check.
        let b = Board::from_fen("4k3/8/5N2/8/8/8/8/4R1K1 b - - 0 1").unwrap();
        let moves = generate(&b, GenFilter::All);
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| m.from() == b.king_sq(Color::Black)));
    }

    #[test]
    fn pinned_piece_stays_on_ray() {
        // Rook e8 pins the bishop on e4 against the king on e1; the bishop
        // has no move along that file.
        let b = Board::from_fen("4r1k1/8/8/8/4B3/8/8/4K3 w - - 0 1").unwrap();
        let moves = generate(&b, GenFilter::All);
        assert!(moves.iter().filter(|m| m.from() == parse_square("e4").unwrap()).count() == 0);
    }

    #[test]
    fn en_passant_horizontal_pin_is_illegal() {
        // Classic: rook on the 5th rank pins through both pawns.
        let b = Board::from_fen("8/8/8/K1pP3r/8/8/8/4k3 w - c6 0 1").unwrap();
        let moves = generate(&b, GenFilter::All);
        assert!(moves.iter().all(|m| m.flag() != MoveFlag::EnPassant));
    }

    #[test]
    fn en_passant_capture_resolves_pawn_check() {
        // The just-pushed d4 pawn checks the king on c5; capturing it en
        // passant is the only en-passant move and must be generated.
        let b = Board::from_fen("8/8/8/2k5/3Pp3/8/8/4K3 b - d3 0 1").unwrap();
        let eps: Vec<_> = generate(&b, GenFilter::All)
            .into_iter()
            .filter(|m| m.flag() == MoveFlag::EnPassant)
            .collect();
        assert_eq!(eps.len(), 1);
        assert_eq!(eps[0].to_uci(), "e4d3");
    }

    #[test]
    fn castling_through_attack_is_illegal() {
        // Black rook on f8 covers f1; kingside castling must be absent,
        // queenside legal.
        let b = Board::from_fen("5r1k/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let moves = generate(&b, GenFilter::All);
        assert!(!moves.iter().any(|m| m.flag() == MoveFlag::CastleKing));
        assert!(moves.iter().any(|m| m.flag() == MoveFlag::CastleQueen));
    }

    #[test]
    fn captures_filter_is_subset_of_all() {
        let b = Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
        let all = generate(&b, GenFilter::All);
        let caps = generate(&b, GenFilter::Captures);
        for m in &caps {
            assert!(all.contains(m), "{} not in ALL", m);
            assert!(m.is_capture() || m.is_promotion());
        }
    }
}
