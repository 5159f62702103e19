//! Bitboard primitives: squares are 0..64, a1 = 0, h8 = 63 (rank * 8 + file).

pub type Bitboard = u64;

pub const EMPTY: Bitboard = 0;
pub const FULL: Bitboard = !0;

pub const FILE_A: Bitboard = 0x0101_0101_0101_0101;
pub const FILE_B: Bitboard = FILE_A << 1;
pub const FILE_G: Bitboard = FILE_A << 6;
pub const FILE_H: Bitboard = FILE_A << 7;

pub const RANK_1: Bitboard = 0xFF;
pub const RANK_2: Bitboard = RANK_1 << 8;
pub const RANK_3: Bitboard = RANK_1 << 16;
pub const RANK_4: Bitboard = RANK_1 << 24;
pub const RANK_5: Bitboard = RANK_1 << 32;
pub const RANK_6: Bitboard = RANK_1 << 40;
pub const RANK_7: Bitboard = RANK_1 << 48;
pub const RANK_8: Bitboard = RANK_1 << 56;

#[inline(always)]
pub const fn bb(sq: u8) -> Bitboard {
    1u64 << sq
}

#[inline(always)]
pub const fn file_of(sq: u8) -> u8 {
    sq & 7
}

#[inline(always)]
pub const fn rank_of(sq: u8) -> u8 {
    sq >> 3
}

#[inline(always)]
pub const fn square(file: u8, rank: u8) -> u8 {
    rank * 8 + file
}

/// Vertical mirror (a1 <-> a8); used for black-perspective feature indexing.
#[inline(always)]
pub const fn flip(sq: u8) -> u8 {
    sq ^ 56
}

#[inline(always)]
pub const fn shift_north(b: Bitboard) -> Bitboard {
    b << 8
}

#[inline(always)]
pub const fn shift_south(b: Bitboard) -> Bitboard {
    b >> 8
}

#[inline(always)]
pub const fn shift_east(b: Bitboard) -> Bitboard {
    (b & !FILE_H) << 1
}

#[inline(always)]
pub const fn shift_west(b: Bitboard) -> Bitboard {
    (b & !FILE_A) >> 1
}

#[inline(always)]
pub const fn shift_ne(b: Bitboard) -> Bitboard {
    (b & !FILE_H) << 9
}

#[inline(always)]
pub const fn shift_nw(b: Bitboard) -> Bitboard {
    (b & !FILE_A) << 7
}

#[inline(always)]
pub const fn shift_se(b: Bitboard) -> Bitboard {
    (b & !FILE_H) >> 7
}

#[inline(always)]
pub const fn shift_sw(b: Bitboard) -> Bitboard {
    (b & !FILE_A) >> 9
}

/// Iterate the set bits of a bitboard, yielding square indices.
pub struct BitIter(pub Bitboard);

impl Iterator for BitIter {
    type Item = u8;

    #[inline(always)]
    fn next(&mut self) -> Option<u8> {
        if self.0 == 0 {
            return None;
        }
        let sq = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(sq)
    }
}

#[inline(always)]
pub fn squares_of(b: Bitboard) -> BitIter {
    BitIter(b)
}

/// Square name in coordinate notation ("e4").
pub fn square_name(sq: u8) -> String {
    let f = (b'a' + file_of(sq)) as char;
    let r = (b'1' + rank_of(sq)) as char;
    format!("{}{}", f, r)
}

/// Parse a coordinate square name; rejects anything outside a1..h8.
pub fn parse_square(s: &str) -> Option<u8> {
    let b = s.as_bytes();
    if b.len() != 2 {
        return None;
    }
    if !(b'a'..=b'h').contains(&b[0]) || !(b'1'..=b'8').contains(&b[1]) {
        return None;
    }
    Some(square(b[0] - b'a', b[1] - b'1'))
}
