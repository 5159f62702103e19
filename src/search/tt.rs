//! Shared transposition table.
//!
//! Lock-free: each slot is a (key ^ data, data) pair of relaxed atomics.
//! A torn read fails the XOR check and is reported as a miss, which the
//! search treats like any other cache miss. Slots are grouped into 4-way
//! buckets with depth-preferred, generation-aware replacement.

use crate::board::moves::Move;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub key: u64,
    pub depth: u32,
    pub score: i32,
    pub best: Option<Move>,
    pub bound: Bound,
    pub gen: u32,
}

const WAYS: usize = 4;

// Packed data word:
// [63:48] move   [47:32] score (i16 as u16)   [31:25] depth (0..128)
// [24:23] bound  [22:17] generation           [16] occupied
const DEPTH_MAX: u32 = 127;
const GEN_MASK: u32 = 0x3F;

fn pack(e: &Entry) -> u64 {
    let mv = e.best.map(Move::to_u16).unwrap_or(0) as u64;
    let score = e.score.clamp(i16::MIN as i32, i16::MAX as i32) as i16 as u16 as u64;
    let depth = e.depth.min(DEPTH_MAX) as u64;
    let bound = match e.bound {
        Bound::Exact => 0u64,
        Bound::Lower => 1,
        Bound::Upper => 2,
    };
    (mv << 48)
        | (score << 32)
        | (depth << 25)
        | (bound << 23)
        | (((e.gen & GEN_MASK) as u64) << 17)
        | (1 << 16)
}

fn unpack(key: u64, data: u64) -> Entry {
    let mv = (data >> 48) as u16;
    Entry {
        key,
        depth: ((data >> 25) & 0x7F) as u32,
        score: ((data >> 32) as u16 as i16) as i32,
        best: if mv == 0 { None } else { Some(Move::from_u16(mv)) },
        bound: match (data >> 23) & 3 {
            0 => Bound::Exact,
            1 => Bound::Lower,
            _ => Bound::Upper,
        },
        gen: ((data >> 17) & GEN_MASK as u64) as u32,
    }
}

#[derive(Default)]
struct Slot {
    check: AtomicU64, // key ^ data
    data: AtomicU64,
}

impl Slot {
    fn read(&self) -> Option<(u64, u64)> {
        let data = self.data.load(Ordering::Relaxed);
        if data & (1 << 16) == 0 {
            return None;
        }
        let check = self.check.load(Ordering::Relaxed);
        Some((check ^ data, data))
    }

    fn write(&self, key: u64, data: u64) {
        self.check.store(key ^ data, Ordering::Relaxed);
        self.data.store(data, Ordering::Relaxed);
    }
}

pub struct Tt {
    buckets: Vec<[Slot; WAYS]>,
    gen: AtomicU32,
}

impl Default for Tt {
    fn default() -> Self {
        Tt::new()
    }
}

impl Tt {
    pub fn new() -> Tt {
        Tt::with_capacity_entries(4096)
    }

    pub fn with_capacity_entries(cap: usize) -> Tt {
        let entries = cap.max(WAYS);
        let buckets = (entries + WAYS - 1) / WAYS;
        let mut v = Vec::with_capacity(buckets);
        v.resize_with(buckets, Default::default);
        Tt { buckets: v, gen: AtomicU32::new(0) }
    }

    pub fn with_capacity_mb(mb: usize) -> Tt {
        // 16 bytes per slot.
        let entries = (mb.saturating_mul(1024) * 1024 / 16).max(WAYS);
        Tt::with_capacity_entries(entries)
    }

    /// Wipe every slot; `&self` so a shared table can be reset between games.
    pub fn clear(&self) {
        for bucket in &self.buckets {
            for slot in bucket {
                slot.data.store(0, Ordering::Relaxed);
                slot.check.store(0, Ordering::Relaxed);
            }
        }
        self.gen.store(0, Ordering::Relaxed);
    }

    #[inline]
    fn bucket_index(&self, key: u64) -> usize {
        let mixed = key ^ (key >> 32);
        (mixed as usize) % self.buckets.len()
    }

    pub fn get(&self, key: u64) -> Option<Entry> {
        let bucket = &self.buckets[self.bucket_index(key)];
        for slot in bucket {
            if let Some((k, data)) = slot.read() {
                if k == key {
                    return Some(unpack(k, data));
                }
            }
        }
        None
    }

    pub fn put(&self, mut e: Entry) {
        e.gen = self.generation();
        let data = pack(&e);
        let bucket = &self.buckets[self.bucket_index(e.key)];

        // Same key: keep the deeper of the two unless the entry is stale.
        let mut victim = 0usize;
        let mut victim_rank = (u32::MAX, u32::MAX);
        for (i, slot) in bucket.iter().enumerate() {
            match slot.read() {
                Some((k, old)) => {
                    let cur = unpack(k, old);
                    if k == e.key {
                        if e.depth >= cur.depth || cur.gen != e.gen {
                            slot.write(e.key, data);
                        }
                        return;
                    }
                    // Evict shallowest, oldest-generation entries first.
                    let age = e.gen.wrapping_sub(cur.gen) & GEN_MASK;
                    let rank = (cur.depth, GEN_MASK - age);
                    if rank < victim_rank {
                        victim_rank = rank;
                        victim = i;
                    }
                }
                None => {
                    slot.write(e.key, data);
                    return;
                }
            }
        }
        bucket[victim].write(e.key, data);
    }

    pub fn bump_generation(&self) {
        self.gen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn generation(&self) -> u32 {
        self.gen.load(Ordering::Relaxed) & GEN_MASK
    }

    /// Occupied slot count; test and `hashfull` support.
    pub fn len(&self) -> usize {
        self.buckets
            .iter()
            .flat_map(|b| b.iter())
            .filter(|s| s.read().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
