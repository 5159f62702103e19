use marlin::board::movegen::{generate, GenFilter};
use marlin::board::zobrist;
use marlin::board::Board;
use pretty_assertions::assert_eq;

/// Deterministic walk: at each step play the move whose index is derived
/// from the step counter, then unwind everything and compare against the
/// untouched board.
#[test]
fn deep_walk_unwinds_to_identical_state() {
    let mut board = Board::startpos();
    let reference = board.clone();
    let mut played = 0;
    for step in 0..120usize {
        let moves = generate(&board, GenFilter::All);
        if moves.is_empty() {
            break;
        }
        let mv = moves[(step * 7 + 3) % moves.len()];
        board.make_move(mv);
        played += 1;
        assert_eq!(board.key(), zobrist::compute(&board), "key drift after {mv}");
    }
    for _ in 0..played {
        board.unmake_move();
    }
    assert_eq!(board.to_fen(), reference.to_fen());
    assert_eq!(board.key(), reference.key());
}

#[test]
fn every_kiwipete_move_round_trips() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let mut board = Board::from_fen(fen).unwrap();
    let before = board.to_fen();
    let key = board.key();
    for mv in generate(&board, GenFilter::All) {
        board.make_move(mv);
        assert_eq!(board.key(), zobrist::compute(&board), "key drift after {mv}");
        board.unmake_move();
        assert_eq!(board.to_fen(), before, "state drift after {mv}");
        assert_eq!(board.key(), key, "key drift after unmaking {mv}");
    }
}

#[test]
fn null_move_round_trips() {
    let mut board =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let before = board.to_fen();
    let key = board.key();
    board.make_null();
    assert_ne!(board.key(), key, "null move must flip the key");
    board.unmake_null();
    assert_eq!(board.to_fen(), before);
    assert_eq!(board.key(), key);
}
