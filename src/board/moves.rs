//! Packed move representation: 6 bits from, 6 bits to, 4 bits flag.

use super::bitboard::{parse_square, square_name};
use super::Piece;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MoveFlag {
    Quiet = 0,
    DoublePush = 1,
    CastleKing = 2,
    CastleQueen = 3,
    Capture = 4,
    EnPassant = 5,
    PromoKnight = 8,
    PromoBishop = 9,
    PromoRook = 10,
    PromoQueen = 11,
    PromoCaptureKnight = 12,
    PromoCaptureBishop = 13,
    PromoCaptureRook = 14,
    PromoCaptureQueen = 15,
}

impl MoveFlag {
    const fn from_bits(bits: u16) -> MoveFlag {
        match bits {
            0 => MoveFlag::Quiet,
            1 => MoveFlag::DoublePush,
            2 => MoveFlag::CastleKing,
            3 => MoveFlag::CastleQueen,
            4 => MoveFlag::Capture,
            5 => MoveFlag::EnPassant,
            8 => MoveFlag::PromoKnight,
            9 => MoveFlag::PromoBishop,
            10 => MoveFlag::PromoRook,
            11 => MoveFlag::PromoQueen,
            12 => MoveFlag::PromoCaptureKnight,
            13 => MoveFlag::PromoCaptureBishop,
            14 => MoveFlag::PromoCaptureRook,
            15 => MoveFlag::PromoCaptureQueen,
            // 6 and 7 are unused encodings; a corrupted word decodes to a
            // quiet move, which legality vetting rejects, rather than to a
            // plausible promotion.
            _ => MoveFlag::Quiet,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    pub const NONE: Move = Move(0);

    #[inline(always)]
    pub const fn new(from: u8, to: u8, flag: MoveFlag) -> Move {
        Move((from as u16) | ((to as u16) << 6) | ((flag as u16) << 12))
    }

    #[inline(always)]
    pub const fn from(self) -> u8 {
        (self.0 & 0x3F) as u8
    }

    #[inline(always)]
    pub const fn to(self) -> u8 {
        ((self.0 >> 6) & 0x3F) as u8
    }

    #[inline(always)]
    pub const fn flag(self) -> MoveFlag {
        MoveFlag::from_bits(self.0 >> 12)
    }

    #[inline(always)]
    pub const fn is_capture(self) -> bool {
        // Capture, EnPassant, and the four promo-captures
        matches!(
            self.flag(),
            MoveFlag::Capture
                | MoveFlag::EnPassant
                | MoveFlag::PromoCaptureKnight
                | MoveFlag::PromoCaptureBishop
                | MoveFlag::PromoCaptureRook
                | MoveFlag::PromoCaptureQueen
        )
    }

    #[inline(always)]
    pub const fn is_promotion(self) -> bool {
        (self.0 >> 12) & 8 != 0
    }

    pub const fn promotion(self) -> Option<Piece> {
        if !self.is_promotion() {
            return None;
        }
        match (self.0 >> 12) & 3 {
            0 => Some(Piece::Knight),
            1 => Some(Piece::Bishop),
            2 => Some(Piece::Rook),
            _ => Some(Piece::Queen),
        }
    }

    /// Raw 16-bit payload, used by the transposition table packing.
    #[inline(always)]
    pub const fn to_u16(self) -> u16 {
        self.0
    }

    #[inline(always)]
    pub const fn from_u16(v: u16) -> Move {
        Move(v)
    }

    /// Long-algebraic (UCI) rendering: `e2e4`, `e7e8q`.
    pub fn to_uci(self) -> String {
        let mut s = format!("{}{}", square_name(self.from()), square_name(self.to()));
        if let Some(p) = self.promotion() {
            s.push(match p {
                Piece::Knight => 'n',
                Piece::Bishop => 'b',
                Piece::Rook => 'r',
                _ => 'q',
            });
        }
        s
    }

    /// Parse the coordinate part of a UCI move. The flag cannot be recovered
    /// from notation alone, so this returns (from, to, promotion); callers
    /// match against generated legal moves to obtain the canonical `Move`.
    pub fn parse_uci(s: &str) -> Option<(u8, u8, Option<Piece>)> {
        if s.len() != 4 && s.len() != 5 {
            return None;
        }
        let from = parse_square(&s[0..2])?;
        let to = parse_square(&s[2..4])?;
        let promo = match s.as_bytes().get(4) {
            None => None,
            Some(b'n') => Some(Piece::Knight),
            Some(b'b') => Some(Piece::Bishop),
            Some(b'r') => Some(Piece::Rook),
            Some(b'q') => Some(Piece::Queen),
            Some(_) => return None,
        };
        Some((from, to, promo))
    }

    /// Structural match against a parsed UCI triple.
    pub fn matches_uci(self, from: u8, to: u8, promo: Option<Piece>) -> bool {
        self.from() == from && self.to() == to && self.promotion() == promo
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({} {:?})", self.to_uci(), self.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_round_trips() {
        let m = Move::new(12, 28, MoveFlag::DoublePush);
        assert_eq!(m.from(), 12);
        assert_eq!(m.to(), 28);
        assert_eq!(m.flag(), MoveFlag::DoublePush);
        assert!(!m.is_capture());
        assert_eq!(m.promotion(), None);
    }

    #[test]
    fn promotion_flags() {
        let m = Move::new(52, 61, MoveFlag::PromoCaptureQueen);
        assert!(m.is_capture());
        assert!(m.is_promotion());
        assert_eq!(m.promotion(), Some(Piece::Queen));
        assert_eq!(m.to_uci(), "e7f8q");
    }

    #[test]
    fn unused_flag_bits_decode_harmlessly() {
        // A table entry with a scrambled flag must not surface as a
        // promotion or capture.
        for bits in [6u16, 7] {
            let m = Move::from_u16(12 | (28 << 6) | (bits << 12));
            assert_eq!(m.flag(), MoveFlag::Quiet);
            assert!(!m.is_promotion());
            assert!(!m.is_capture());
        }
    }

    #[test]
    fn uci_parse_shapes() {
        assert_eq!(Move::parse_uci("e2e4"), Some((12, 28, None)));
        assert_eq!(Move::parse_uci("e7e8q"), Some((52, 60, Some(Piece::Queen))));
        assert_eq!(Move::parse_uci("e2"), None);
        assert_eq!(Move::parse_uci("e2e4x"), None);
    }
}
