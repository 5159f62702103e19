use marlin::engine::{Engine, Limits};

#[test]
fn multithreaded_search_agrees_on_forced_tactics() {
    // Mate in two; every thread count must find it.
    let fen = "7k/8/8/8/8/8/R7/1R4K1 w - - 0 1";
    for threads in [1usize, 2, 4] {
        let mut engine = Engine::new(4, threads);
        engine.set_position(Some(fen), &[]).unwrap();
        let result = engine.think(Limits { depth: Some(6), ..Default::default() }).unwrap().wait();
        assert_eq!(
            marlin::search::mate_in(result.score_cp),
            Some(2),
            "threads={threads} missed the mate"
        );
    }
}

#[test]
fn tiny_table_never_loses_the_best_move() {
    use marlin::board::movegen::{generate, GenFilter};
    use marlin::board::Board;
    use marlin::search::{search, SearchParams, Tt};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    // With one bucket the helpers evict the root entry at will; the
    // adopted move must come from the root loop, not a table walk.
    let board = Board::startpos();
    let legal = generate(&board, GenFilter::All);
    for _ in 0..4 {
        let params = SearchParams { depth: Some(5), threads: 4, ..Default::default() };
        let result = search(
            &board,
            &params,
            Arc::new(Tt::with_capacity_entries(4)),
            None,
            Arc::new(AtomicBool::new(false)),
        );
        let mv = result.best_move.expect("lost the best move to table churn");
        assert!(legal.contains(&mv));
        assert_eq!(result.pv.first().copied(), result.best_move);
    }
}

#[test]
fn helper_threads_add_nodes() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let mut single = Engine::new(8, 1);
    single.set_position(Some(fen), &[]).unwrap();
    let one = single.think(Limits { depth: Some(6), ..Default::default() }).unwrap().wait();

    let mut multi = Engine::new(8, 4);
    multi.set_position(Some(fen), &[]).unwrap();
    let four = multi.think(Limits { depth: Some(6), ..Default::default() }).unwrap().wait();

    assert!(one.best_move.is_some());
    assert!(four.best_move.is_some());
    assert!(four.nodes > one.nodes, "helpers contributed no work");
}
