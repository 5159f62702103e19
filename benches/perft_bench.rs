use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marlin::board::Board;
use marlin::perft::perft;

fn bench_perft(c: &mut Criterion) {
    marlin::board::attacks::init();
    c.bench_function("perft_4_startpos", |ben| {
        let mut board = Board::startpos();
        ben.iter(|| black_box(perft(black_box(&mut board), 4)))
    });
    c.bench_function("perft_3_kiwipete", |ben| {
        let mut board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        ben.iter(|| black_box(perft(black_box(&mut board), 3)))
    });
}

criterion_group!(benches, bench_perft);
criterion_main!(benches);
