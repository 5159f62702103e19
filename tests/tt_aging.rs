use marlin::search::{Bound, Entry, Tt};

#[test]
fn aging_eviction_prefers_oldest_when_depth_equal() {
    // Single bucket of 4 ways.
    let tt = Tt::with_capacity_entries(4);
    tt.put(Entry { key: 1, depth: 5, score: 0, best: None, bound: Bound::Exact, gen: 0 });
    tt.bump_generation();
    tt.put(Entry { key: 2, depth: 5, score: 0, best: None, bound: Bound::Exact, gen: 0 });
    tt.bump_generation();
    tt.put(Entry { key: 3, depth: 5, score: 0, best: None, bound: Bound::Exact, gen: 0 });
    tt.bump_generation();
    tt.put(Entry { key: 4, depth: 5, score: 0, best: None, bound: Bound::Exact, gen: 0 });
    tt.bump_generation();
    tt.put(Entry { key: 99, depth: 5, score: 0, best: None, bound: Bound::Exact, gen: 0 });
    assert!(tt.get(1).is_none(), "oldest entry not evicted at equal depth");
    assert!(tt.get(99).is_some(), "new entry not inserted");
}

#[test]
fn stale_same_key_entry_is_replaced_by_shallower_write() {
    let tt = Tt::with_capacity_entries(16);
    tt.put(Entry { key: 7, depth: 10, score: 40, best: None, bound: Bound::Exact, gen: 0 });
    tt.bump_generation();
    // Fresh generation: the shallower entry wins because the old one aged out.
    tt.put(Entry { key: 7, depth: 3, score: -40, best: None, bound: Bound::Exact, gen: 0 });
    let e = tt.get(7).unwrap();
    assert_eq!(e.depth, 3);
    assert_eq!(e.score, -40);
}

#[test]
fn deep_entries_survive_bucket_pressure() {
    let tt = Tt::with_capacity_entries(4);
    tt.put(Entry { key: 100, depth: 20, score: 1, best: None, bound: Bound::Exact, gen: 0 });
    for key in 0..64u64 {
        tt.put(Entry { key, depth: 1, score: 0, best: None, bound: Bound::Exact, gen: 0 });
    }
    assert!(tt.get(100).is_some(), "deep entry evicted by shallow churn");
}
