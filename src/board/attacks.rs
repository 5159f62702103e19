//! Process-wide precomputed attack tables.
//!
//! Knight/king/pawn masks are direct per-square lookups. Rook and bishop
//! attacks use magic bitboards: `table[((occ & mask) * magic) >> shift]`.
//! The magic multipliers are found once at startup by trying sparse random
//! candidates from a fixed seed, so the tables are deterministic without
//! carrying 128 hard-coded constants.

use super::bitboard::*;
use super::Color;
use std::sync::OnceLock;

const ROOK_DIRS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[derive(Clone, Copy, Default)]
struct Magic {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl Magic {
    #[inline(always)]
    fn index(&self, occ: Bitboard) -> usize {
        self.offset + (((occ & self.mask).wrapping_mul(self.magic)) >> self.shift) as usize
    }
}

pub struct Attacks {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
    between: Vec<Bitboard>, // [64 * 64]
    line: Vec<Bitboard>,    // [64 * 64]
    rook_magics: [Magic; 64],
    bishop_magics: [Magic; 64],
    sliding: Vec<Bitboard>,
}

static TABLES: OnceLock<Attacks> = OnceLock::new();

/// Force table construction; otherwise it happens lazily on first query.
pub fn init() {
    let _ = tables();
}

fn tables() -> &'static Attacks {
    TABLES.get_or_init(Attacks::build)
}

#[inline(always)]
pub fn knight_attacks(sq: u8) -> Bitboard {
    tables().knight[sq as usize]
}

#[inline(always)]
pub fn king_attacks(sq: u8) -> Bitboard {
    tables().king[sq as usize]
}

#[inline(always)]
pub fn pawn_attacks(color: Color, sq: u8) -> Bitboard {
    tables().pawn[color.index()][sq as usize]
}

#[inline(always)]
pub fn rook_attacks(sq: u8, occ: Bitboard) -> Bitboard {
    let t = tables();
    t.sliding[t.rook_magics[sq as usize].index(occ)]
}

#[inline(always)]
pub fn bishop_attacks(sq: u8, occ: Bitboard) -> Bitboard {
    let t = tables();
    t.sliding[t.bishop_magics[sq as usize].index(occ)]
}

#[inline(always)]
pub fn queen_attacks(sq: u8, occ: Bitboard) -> Bitboard {
    rook_attacks(sq, occ) | bishop_attacks(sq, occ)
}

/// Squares strictly between two aligned squares; empty when not aligned.
#[inline(always)]
pub fn between(a: u8, b: u8) -> Bitboard {
    tables().between[a as usize * 64 + b as usize]
}

/// Full line (edge to edge) through two aligned squares; empty otherwise.
#[inline(always)]
pub fn line(a: u8, b: u8) -> Bitboard {
    tables().line[a as usize * 64 + b as usize]
}

fn splitmix64(x: &mut u64) -> u64 {
    *x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Ray-walk sliding attacks used only while building the tables.
fn sliding_attacks(sq: u8, occ: Bitboard, dirs: &[(i8, i8); 4]) -> Bitboard {
    let mut attacks = EMPTY;
    let rank = rank_of(sq) as i8;
    let file = file_of(sq) as i8;
    for &(df, dr) in dirs {
        let mut f = file + df;
        let mut r = rank + dr;
        while (0..8).contains(&f) && (0..8).contains(&r) {
            let s = square(f as u8, r as u8);
            attacks |= bb(s);
            if occ & bb(s) != 0 {
                break;
            }
            f += df;
            r += dr;
        }
    }
    attacks
}

/// Relevant-occupancy mask: the rays without their final edge squares.
fn movement_mask(sq: u8, dirs: &[(i8, i8); 4]) -> Bitboard {
    let mut mask = EMPTY;
    let rank = rank_of(sq) as i8;
    let file = file_of(sq) as i8;
    for &(df, dr) in dirs {
        let mut f = file + df;
        let mut r = rank + dr;
        while (0..8).contains(&(f + df)) && (0..8).contains(&(r + dr)) {
            mask |= bb(square(f as u8, r as u8));
            f += df;
            r += dr;
        }
    }
    mask
}

impl Attacks {
    fn build() -> Attacks {
        let mut knight = [EMPTY; 64];
        let mut king = [EMPTY; 64];
        let mut pawn = [[EMPTY; 64]; 2];
        for sq in 0..64u8 {
            let b = bb(sq);
            knight[sq as usize] = shift_north(shift_ne(b))
                | shift_north(shift_nw(b))
                | shift_south(shift_se(b))
                | shift_south(shift_sw(b))
                | shift_east(shift_ne(b))
                | shift_east(shift_se(b))
                | shift_west(shift_nw(b))
                | shift_west(shift_sw(b));
            king[sq as usize] = shift_north(b)
                | shift_south(b)
                | shift_east(b)
                | shift_west(b)
                | shift_ne(b)
                | shift_nw(b)
                | shift_se(b)
                | shift_sw(b);
            pawn[Color::White.index()][sq as usize] = shift_ne(b) | shift_nw(b);
            pawn[Color::Black.index()][sq as usize] = shift_se(b) | shift_sw(b);
        }

        let mut sliding = Vec::new();
        let mut seed = 0xD1CE_CAFE_0DDB_A11u64;
        let mut rook_magics = [Magic::default(); 64];
        let mut bishop_magics = [Magic::default(); 64];
        for sq in 0..64u8 {
            rook_magics[sq as usize] = find_magic(sq, &ROOK_DIRS, &mut sliding, &mut seed);
            bishop_magics[sq as usize] = find_magic(sq, &BISHOP_DIRS, &mut sliding, &mut seed);
        }

        let mut between = vec![EMPTY; 64 * 64];
        let mut line = vec![EMPTY; 64 * 64];
        for a in 0..64u8 {
            for b in 0..64u8 {
                if a == b {
                    continue;
                }
                let idx = a as usize * 64 + b as usize;
                for dirs in [&ROOK_DIRS, &BISHOP_DIRS] {
                    if sliding_attacks(a, EMPTY, dirs) & bb(b) != 0 {
                        between[idx] =
                            sliding_attacks(a, bb(b), dirs) & sliding_attacks(b, bb(a), dirs);
                        line[idx] = (sliding_attacks(a, EMPTY, dirs)
                            & sliding_attacks(b, EMPTY, dirs))
                            | bb(a)
                            | bb(b);
                    }
                }
            }
        }

        Attacks { knight, king, pawn, between, line, rook_magics, bishop_magics, sliding }
    }
}

fn find_magic(sq: u8, dirs: &[(i8, i8); 4], sliding: &mut Vec<Bitboard>, seed: &mut u64) -> Magic {
    let mask = movement_mask(sq, dirs);
    let bits = mask.count_ones();
    let size = 1usize << bits;
    let shift = 64 - bits;

    // Enumerate all blocker subsets of the mask (carry-rippler).
    let mut occs = Vec::with_capacity(size);
    let mut refs = Vec::with_capacity(size);
    let mut subset: Bitboard = 0;
    loop {
        occs.push(subset);
        refs.push(sliding_attacks(sq, subset, dirs));
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }

    let mut table = vec![EMPTY; size];
    loop {
        let magic = splitmix64(seed) & splitmix64(seed) & splitmix64(seed);
        // Cheap rejection: the top index byte must be dense enough.
        if (mask.wrapping_mul(magic) >> 56).count_ones() < 6 {
            continue;
        }
        table.iter_mut().for_each(|v| *v = EMPTY);
        let mut ok = true;
        for (i, &occ) in occs.iter().enumerate() {
            let idx = (occ.wrapping_mul(magic) >> shift) as usize;
            if table[idx] == EMPTY {
                table[idx] = refs[i];
            } else if table[idx] != refs[i] {
                ok = false;
                break;
            }
        }
        if ok {
            let offset = sliding.len();
            sliding.extend_from_slice(&table);
            return Magic { mask, magic, shift, offset };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_attacks_match_ray_walk() {
        let occ = bb(parse_square("e4").unwrap()) | bb(parse_square("b7").unwrap());
        for sq in 0..64u8 {
            assert_eq!(
                rook_attacks(sq, occ),
                sliding_attacks(sq, occ, &ROOK_DIRS),
                "rook mismatch on {}",
                square_name(sq)
            );
        }
    }

    #[test]
    fn bishop_attacks_match_ray_walk() {
        let occ = bb(parse_square("d4").unwrap()) | bb(parse_square("g7").unwrap());
        for sq in 0..64u8 {
            assert_eq!(
                bishop_attacks(sq, occ),
                sliding_attacks(sq, occ, &BISHOP_DIRS),
                "bishop mismatch on {}",
                square_name(sq)
            );
        }
    }

    #[test]
    fn knight_attack_counts() {
        // Corner knight reaches 2 squares, central knight 8.
        assert_eq!(knight_attacks(0).count_ones(), 2);
        assert_eq!(knight_attacks(parse_square("d4").unwrap()).count_ones(), 8);
    }

    #[test]
    fn between_is_symmetric_and_exclusive() {
        let a = parse_square("a1").unwrap();
        let b = parse_square("a8").unwrap();
        assert_eq!(between(a, b), between(b, a));
        assert_eq!(between(a, b).count_ones(), 6);
        assert_eq!(between(a, b) & (bb(a) | bb(b)), 0);
        // Unaligned squares share no ray.
        assert_eq!(between(a, parse_square("b3").unwrap()), 0);
    }

    #[test]
    fn pawn_attacks_respect_color() {
        let e4 = parse_square("e4").unwrap();
        assert_eq!(
            pawn_attacks(Color::White, e4),
            bb(parse_square("d5").unwrap()) | bb(parse_square("f5").unwrap())
        );
        assert_eq!(
            pawn_attacks(Color::Black, e4),
            bb(parse_square("d3").unwrap()) | bb(parse_square("f3").unwrap())
        );
    }
}
