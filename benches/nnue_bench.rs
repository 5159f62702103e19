use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marlin::board::movegen::{generate, GenFilter};
use marlin::board::Board;
use marlin::eval::nnue::{loader, Accumulator, Activation, MoveDelta, NnueMeta, QuantNnue};

fn synthetic_net(hidden: usize) -> QuantNnue {
    QuantNnue {
        meta: NnueMeta {
            version: 1,
            activation: Activation::SquaredClippedRelu,
            input_dim: loader::INPUT_DIM,
            hidden_dim: hidden,
            qa: 255,
            qb: 64,
            scale: 400,
        },
        w1: (0..loader::INPUT_DIM * hidden).map(|i| ((i * 13 + 5) % 31) as i16 - 15).collect(),
        b1: (0..hidden).map(|i| (i % 9) as i16).collect(),
        w2: (0..2 * hidden).map(|i| ((i * 3 + 2) % 11) as i8 - 5).collect(),
        b2: 12,
    }
}

fn bench_nnue(c: &mut Criterion) {
    marlin::board::attacks::init();
    let net = synthetic_net(256);
    let board = Board::startpos();

    c.bench_function("nnue_refresh_256", |ben| {
        ben.iter(|| {
            let mut acc = Accumulator::new(net.meta.hidden_dim);
            acc.refresh(&net, black_box(&board));
            black_box(acc)
        })
    });

    let mut acc = Accumulator::new(net.meta.hidden_dim);
    acc.refresh(&net, &board);
    let mv = generate(&board, GenFilter::All)[0];
    c.bench_function("nnue_incremental_update_256", |ben| {
        ben.iter(|| {
            let mut a = acc.clone();
            let delta = MoveDelta::from_move(black_box(&board), mv);
            a.apply(&net, &delta);
            black_box(a)
        })
    });

    c.bench_function("nnue_forward_256", |ben| {
        ben.iter(|| black_box(net.evaluate_acc(black_box(&acc), board.side_to_move())))
    });
}

criterion_group!(benches, bench_nnue);
criterion_main!(benches);
