//! Board state: piece bitboards, incremental make/unmake, zobrist key, FEN.

use super::bitboard::*;
use super::moves::{Move, MoveFlag};
use super::{movegen, zobrist, Color, Piece};
use thiserror::Error;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub const CASTLE_WK: u8 = 1;
pub const CASTLE_WQ: u8 = 2;
pub const CASTLE_BK: u8 = 4;
pub const CASTLE_BQ: u8 = 8;

/// Rights cleared when a piece moves from or to a square: king/rook home
/// squares strip their side's bits, everything else keeps all rights.
static CASTLING_MASKS: [u8; 64] = {
    let mut masks = [0xFF; 64];
    masks[0] = !CASTLE_WQ;
    masks[4] = !(CASTLE_WK | CASTLE_WQ);
    masks[7] = !CASTLE_WK;
    masks[56] = !CASTLE_BQ;
    masks[60] = !(CASTLE_BK | CASTLE_BQ);
    masks[63] = !CASTLE_BK;
    masks
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("FEN is missing the {0} field")]
    MissingField(&'static str),
    #[error("invalid piece character '{0}' in FEN board field")]
    BadPiece(char),
    #[error("FEN rank {0} does not describe exactly 8 squares")]
    BadRank(usize),
    #[error("FEN board field must have 8 ranks")]
    BadRankCount,
    #[error("invalid side-to-move field '{0}'")]
    BadSideToMove(String),
    #[error("invalid castling field character '{0}'")]
    BadCastling(char),
    #[error("invalid en-passant field '{0}'")]
    BadEnPassant(String),
    #[error("invalid move clock field '{0}'")]
    BadClock(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinReason {
    Checkmate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    Repetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

/// Game outcome as a closed tagged variant; no trait objects on this path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Win(Color, WinReason),
    Draw(DrawReason),
}

/// Snapshot pushed on every make, popped on unmake. Restoring it (plus
/// reversing the piece movement) must reproduce the prior state bit-exactly.
#[derive(Debug, Clone, Copy)]
struct Undo {
    mv: Move,
    captured: Option<Piece>,
    castling: u8,
    ep_file: Option<u8>,
    halfmove: u16,
    fullmove: u16,
    key: u64,
}

#[derive(Clone)]
pub struct Board {
    bb: [Bitboard; 12],
    occ: [Bitboard; 2],
    mailbox: [Option<(Color, Piece)>; 64],
    stm: Color,
    castling: u8,
    ep_file: Option<u8>,
    halfmove: u16,
    fullmove: u16,
    key: u64,
    history: Vec<Undo>,
}

#[inline(always)]
fn bb_index(color: Color, piece: Piece) -> usize {
    color.index() * 6 + piece.index()
}

impl Board {
    fn empty() -> Board {
        Board {
            bb: [EMPTY; 12],
            occ: [EMPTY; 2],
            mailbox: [None; 64],
            stm: Color::White,
            castling: 0,
            ep_file: None,
            halfmove: 0,
            fullmove: 1,
            key: 0,
            history: Vec::with_capacity(128),
        }
    }

    pub fn startpos() -> Board {
        let mut b = Board::empty();
        let back = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for file in 0..8u8 {
            b.put(Color::White, back[file as usize], square(file, 0));
            b.put(Color::White, Piece::Pawn, square(file, 1));
            b.put(Color::Black, Piece::Pawn, square(file, 6));
            b.put(Color::Black, back[file as usize], square(file, 7));
        }
        b.castling = CASTLE_WK | CASTLE_WQ | CASTLE_BK | CASTLE_BQ;
        b.key ^= zobrist::castling_key(b.castling);
        b
    }

    // ---- accessors ----

    #[inline(always)]
    pub fn pieces(&self, color: Color, piece: Piece) -> Bitboard {
        self.bb[bb_index(color, piece)]
    }

    #[inline(always)]
    pub fn color_occ(&self, color: Color) -> Bitboard {
        self.occ[color.index()]
    }

    #[inline(always)]
    pub fn all_occ(&self) -> Bitboard {
        self.occ[0] | self.occ[1]
    }

    #[inline(always)]
    pub fn side_to_move(&self) -> Color {
        self.stm
    }

    #[inline(always)]
    pub fn castling_rights(&self) -> u8 {
        self.castling
    }

    #[inline(always)]
    pub fn ep_file(&self) -> Option<u8> {
        self.ep_file
    }

    /// En-passant target square for the side to move, derived from the file.
    #[inline(always)]
    pub fn ep_square(&self) -> Option<u8> {
        self.ep_file.map(|f| match self.stm {
            Color::White => square(f, 5),
            Color::Black => square(f, 2),
        })
    }

    #[inline(always)]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove
    }

    #[inline(always)]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove
    }

    #[inline(always)]
    pub fn key(&self) -> u64 {
        self.key
    }

    #[inline(always)]
    pub fn piece_on(&self, sq: u8) -> Option<(Color, Piece)> {
        self.mailbox[sq as usize]
    }

    #[inline(always)]
    pub fn king_sq(&self, color: Color) -> u8 {
        self.pieces(color, Piece::King).trailing_zeros() as u8
    }

    pub fn in_check(&self, color: Color) -> bool {
        movegen::attacked(self, self.king_sq(color), color.opponent(), self.all_occ())
    }

    pub fn ply(&self) -> usize {
        self.history.len()
    }

    // ---- incremental mutation ----

    #[inline(always)]
    fn put(&mut self, color: Color, piece: Piece, sq: u8) {
        self.bb[bb_index(color, piece)] |= bb(sq);
        self.occ[color.index()] |= bb(sq);
        self.mailbox[sq as usize] = Some((color, piece));
        self.key ^= zobrist::piece_key(color, piece, sq);
    }

    #[inline(always)]
    fn take(&mut self, color: Color, piece: Piece, sq: u8) {
        self.bb[bb_index(color, piece)] &= !bb(sq);
        self.occ[color.index()] &= !bb(sq);
        self.mailbox[sq as usize] = None;
        self.key ^= zobrist::piece_key(color, piece, sq);
    }

    /// Apply a pseudo-legal move already validated by the move generator.
    pub fn make_move(&mut self, mv: Move) {
        let us = self.stm;
        let them = us.opponent();
        let from = mv.from();
        let to = mv.to();
        let flag = mv.flag();
        let (_, piece) = self.mailbox[from as usize].unwrap_or((us, Piece::Pawn));

        let captured = match flag {
            MoveFlag::EnPassant => Some(Piece::Pawn),
            _ => self.mailbox[to as usize].map(|(_, p)| p),
        };
        self.history.push(Undo {
            mv,
            captured,
            castling: self.castling,
            ep_file: self.ep_file,
            halfmove: self.halfmove,
            fullmove: self.fullmove,
            key: self.key,
        });

        // Drop old castling/ep contributions; re-add the new ones at the end.
        self.key ^= zobrist::castling_key(self.castling);
        if let Some(f) = self.ep_file {
            self.key ^= zobrist::ep_file_key(f);
        }

        match flag {
            MoveFlag::EnPassant => {
                let cap_sq = match us {
                    Color::White => to - 8,
                    Color::Black => to + 8,
                };
                self.take(them, Piece::Pawn, cap_sq);
            }
            _ => {
                if let Some(p) = captured {
                    self.take(them, p, to);
                }
            }
        }

        self.take(us, piece, from);
        let placed = mv.promotion().unwrap_or(piece);
        self.put(us, placed, to);

        match flag {
            MoveFlag::CastleKing => {
                let (rf, rt) = match us {
                    Color::White => (7u8, 5u8),
                    Color::Black => (63, 61),
                };
                self.take(us, Piece::Rook, rf);
                self.put(us, Piece::Rook, rt);
            }
            MoveFlag::CastleQueen => {
                let (rf, rt) = match us {
                    Color::White => (0u8, 3u8),
                    Color::Black => (56, 59),
                };
                self.take(us, Piece::Rook, rf);
                self.put(us, Piece::Rook, rt);
            }
            _ => {}
        }

        self.castling &= CASTLING_MASKS[from as usize] & CASTLING_MASKS[to as usize];
        self.ep_file = match flag {
            MoveFlag::DoublePush => Some(file_of(from)),
            _ => None,
        };
        self.halfmove = if piece == Piece::Pawn || captured.is_some() {
            0
        } else {
            self.halfmove + 1
        };
        if us == Color::Black {
            self.fullmove += 1;
        }
        self.stm = them;

        self.key ^= zobrist::side_key();
        self.key ^= zobrist::castling_key(self.castling);
        if let Some(f) = self.ep_file {
            self.key ^= zobrist::ep_file_key(f);
        }
    }

    /// Pop the last snapshot and restore the prior position exactly.
    pub fn unmake_move(&mut self) {
        let undo = match self.history.pop() {
            Some(u) => u,
            None => return,
        };
        let mv = undo.mv;
        let them = self.stm;
        let us = them.opponent();
        let from = mv.from();
        let to = mv.to();
        let flag = mv.flag();

        if mv != Move::NONE {
            let placed = self.mailbox[to as usize].map(|(_, p)| p).unwrap_or(Piece::Pawn);
            self.take(us, placed, to);
            let piece = if mv.is_promotion() { Piece::Pawn } else { placed };
            self.put(us, piece, from);

            match flag {
                MoveFlag::EnPassant => {
                    let cap_sq = match us {
                        Color::White => to - 8,
                        Color::Black => to + 8,
                    };
                    self.put(them, Piece::Pawn, cap_sq);
                }
                MoveFlag::CastleKing => {
                    let (rf, rt) = match us {
                        Color::White => (7u8, 5u8),
                        Color::Black => (63, 61),
                    };
                    self.take(us, Piece::Rook, rt);
                    self.put(us, Piece::Rook, rf);
                }
                MoveFlag::CastleQueen => {
                    let (rf, rt) = match us {
                        Color::White => (0u8, 3u8),
                        Color::Black => (56, 59),
                    };
                    self.take(us, Piece::Rook, rt);
                    self.put(us, Piece::Rook, rf);
                }
                _ => {
                    if let Some(p) = undo.captured {
                        self.put(them, p, to);
                    }
                }
            }
        }

        self.stm = us;
        self.castling = undo.castling;
        self.ep_file = undo.ep_file;
        self.halfmove = undo.halfmove;
        self.fullmove = undo.fullmove;
        self.key = undo.key;
    }

    /// Pass the move without moving: used by null-move pruning.
    pub fn make_null(&mut self) {
        self.history.push(Undo {
            mv: Move::NONE,
            captured: None,
            castling: self.castling,
            ep_file: self.ep_file,
            halfmove: self.halfmove,
            fullmove: self.fullmove,
            key: self.key,
        });
        self.key ^= zobrist::side_key();
        if let Some(f) = self.ep_file {
            self.key ^= zobrist::ep_file_key(f);
            self.ep_file = None;
        }
        self.stm = self.stm.opponent();
        self.halfmove += 1;
    }

    pub fn unmake_null(&mut self) {
        self.unmake_move();
    }

    /// Find the legal move matching a UCI string, if any.
    pub fn parse_move(&self, uci: &str) -> Option<Move> {
        let (from, to, promo) = Move::parse_uci(uci)?;
        movegen::generate(self, movegen::GenFilter::All)
            .into_iter()
            .find(|m| m.matches_uci(from, to, promo))
    }

    // ---- draw and outcome machinery ----

    /// Position key already seen once before on the game/search path.
    /// A single revisit is enough for the search to score the node as a draw.
    pub fn has_repetition(&self) -> bool {
        self.count_repetitions() >= 1
    }

    /// Threefold repetition of the current position (reporting rule).
    pub fn is_threefold(&self) -> bool {
        self.count_repetitions() >= 2
    }

    fn count_repetitions(&self) -> u32 {
        // Only positions within the halfmove-clock window can repeat; a pawn
        // move or capture makes everything before it unreachable.
        let window = self.halfmove as usize;
        let mut count = 0;
        for (i, undo) in self.history.iter().rev().enumerate() {
            if i >= window {
                break;
            }
            if undo.key == self.key {
                count += 1;
            }
        }
        count
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove >= 100
    }

    /// Neither side can deliver mate by any sequence of legal moves:
    /// bare kings, a lone minor piece, or same-colored bishops only.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.bb[bb_index(Color::White, Piece::Pawn)]
            | self.bb[bb_index(Color::Black, Piece::Pawn)]
            | self.bb[bb_index(Color::White, Piece::Rook)]
            | self.bb[bb_index(Color::Black, Piece::Rook)]
            | self.bb[bb_index(Color::White, Piece::Queen)]
            | self.bb[bb_index(Color::Black, Piece::Queen)];
        if heavy != EMPTY {
            return false;
        }
        let knights = self.pieces(Color::White, Piece::Knight) | self.pieces(Color::Black, Piece::Knight);
        let bishops = self.pieces(Color::White, Piece::Bishop) | self.pieces(Color::Black, Piece::Bishop);
        let minors = (knights | bishops).count_ones();
        if minors <= 1 {
            return true;
        }
        if knights != EMPTY {
            return false;
        }
        // Bishops only: drawn when they all stand on one square color.
        const DARK: Bitboard = 0xAA55_AA55_AA55_AA55;
        bishops & DARK == EMPTY || bishops & !DARK == EMPTY
    }

    pub fn is_draw(&self) -> bool {
        self.is_fifty_move_draw() || self.is_insufficient_material() || self.has_repetition()
    }

    pub fn outcome(&self) -> Outcome {
        if movegen::generate(self, movegen::GenFilter::All).is_empty() {
            return if self.in_check(self.stm) {
                Outcome::Win(self.stm.opponent(), WinReason::Checkmate)
            } else {
                Outcome::Draw(DrawReason::Stalemate)
            };
        }
        if self.is_threefold() {
            return Outcome::Draw(DrawReason::Repetition);
        }
        if self.is_fifty_move_draw() {
            return Outcome::Draw(DrawReason::FiftyMoveRule);
        }
        if self.is_insufficient_material() {
            return Outcome::Draw(DrawReason::InsufficientMaterial);
        }
        Outcome::InProgress
    }

    // ---- FEN ----

    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(FenError::MissingField("board"))?;
        let side = fields.next().ok_or(FenError::MissingField("side to move"))?;
        let castling = fields.next().ok_or(FenError::MissingField("castling"))?;
        let ep = fields.next().ok_or(FenError::MissingField("en passant"))?;
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut board = Board::empty();

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BadRankCount);
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else {
                    let (piece, color) = Piece::from_char(c).ok_or(FenError::BadPiece(c))?;
                    if file > 7 {
                        return Err(FenError::BadRank(8 - rank as usize));
                    }
                    board.put(color, piece, square(file, rank));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::BadRank(8 - rank as usize));
            }
        }

        board.stm = match side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::BadSideToMove(other.to_string())),
        };
        if board.stm == Color::Black {
            board.key ^= zobrist::side_key();
        }

        if castling != "-" {
            for c in castling.chars() {
                board.castling |= match c {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(FenError::BadCastling(c)),
                };
            }
        }
        board.key ^= zobrist::castling_key(board.castling);

        if ep != "-" {
            let sq = parse_square(ep).ok_or_else(|| FenError::BadEnPassant(ep.to_string()))?;
            board.ep_file = Some(file_of(sq));
            board.key ^= zobrist::ep_file_key(file_of(sq));
        }

        board.halfmove = halfmove
            .parse()
            .map_err(|_| FenError::BadClock(halfmove.to_string()))?;
        board.fullmove = fullmove
            .parse()
            .map_err(|_| FenError::BadClock(fullmove.to_string()))?;

        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.mailbox[square(file, rank) as usize] {
                    None => empty += 1,
                    Some((color, piece)) => {
                        if empty > 0 {
                            out.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        out.push(piece.to_char(color));
                    }
                }
            }
            if empty > 0 {
                out.push((b'0' + empty) as char);
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out.push(' ');
        out.push(match self.stm {
            Color::White => 'w',
            Color::Black => 'b',
        });
        out.push(' ');
        if self.castling == 0 {
            out.push('-');
        } else {
            for (bit, c) in [(CASTLE_WK, 'K'), (CASTLE_WQ, 'Q'), (CASTLE_BK, 'k'), (CASTLE_BQ, 'q')] {
                if self.castling & bit != 0 {
                    out.push(c);
                }
            }
        }
        out.push(' ');
        match self.ep_square() {
            Some(sq) => out.push_str(&square_name(sq)),
            None => out.push('-'),
        }
        out.push_str(&format!(" {} {}", self.halfmove, self.fullmove));
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::startpos()
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.to_fen())?;
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                let c = match self.mailbox[square(file, rank) as usize] {
                    Some((color, piece)) => piece.to_char(color),
                    None => '.',
                };
                write!(f, "{} ", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
