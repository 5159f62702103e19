use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marlin::board::Board;
use marlin::search::{search, SearchParams, Tt};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn bench_search(c: &mut Criterion) {
    marlin::board::attacks::init();
    let board = Board::startpos();
    c.bench_function("search_depth_5_startpos", |ben| {
        ben.iter(|| {
            let params = SearchParams { depth: Some(5), threads: 1, ..Default::default() };
            let r = search(
                black_box(&board),
                &params,
                Arc::new(Tt::with_capacity_mb(16)),
                None,
                Arc::new(AtomicBool::new(false)),
            );
            black_box(r.nodes)
        })
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
