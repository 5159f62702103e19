use marlin::board::moves::Move;
use marlin::search::{Bound, Entry, Tt};

#[test]
fn bounds_round_trip() {
    let tt = Tt::with_capacity_entries(64);
    for (i, bound) in [Bound::Exact, Bound::Lower, Bound::Upper].into_iter().enumerate() {
        let key = 1000 + i as u64;
        tt.put(Entry { key, depth: 4, score: 25 * i as i32 - 25, best: None, bound, gen: 0 });
        let e = tt.get(key).unwrap();
        assert_eq!(e.bound, bound);
        assert_eq!(e.score, 25 * i as i32 - 25);
    }
}

#[test]
fn best_move_round_trips() {
    let tt = Tt::with_capacity_entries(64);
    let mv = Move::from_u16(0x0F2A);
    tt.put(Entry { key: 9, depth: 7, score: 11, best: Some(mv), bound: Bound::Exact, gen: 0 });
    assert_eq!(tt.get(9).unwrap().best, Some(mv));
}

#[test]
fn clear_empties_the_table() {
    let tt = Tt::with_capacity_entries(64);
    for key in 0..32u64 {
        tt.put(Entry { key, depth: 1, score: 0, best: None, bound: Bound::Exact, gen: 0 });
    }
    assert!(!tt.is_empty());
    tt.clear();
    assert!(tt.is_empty());
}

#[test]
fn shallow_store_does_not_clobber_deep_entry() {
    let tt = Tt::with_capacity_entries(64);
    tt.put(Entry { key: 5, depth: 12, score: 90, best: None, bound: Bound::Exact, gen: 0 });
    tt.put(Entry { key: 5, depth: 2, score: -90, best: None, bound: Bound::Upper, gen: 0 });
    let e = tt.get(5).unwrap();
    assert_eq!(e.depth, 12);
    assert_eq!(e.score, 90);
}
