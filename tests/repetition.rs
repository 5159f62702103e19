use marlin::board::{Board, DrawReason, Outcome};

fn play(board: &mut Board, line: &[&str]) {
    for uci in line {
        let mv = board.parse_move(uci).expect(uci);
        board.make_move(mv);
    }
}

#[test]
fn threefold_by_knight_shuffle() {
    let mut board = Board::startpos();
    assert_eq!(board.outcome(), Outcome::InProgress);
    play(&mut board, &["g1f3", "g8f6", "f3g1", "f6g8"]);
    assert_eq!(board.outcome(), Outcome::InProgress, "twofold is not a draw");
    play(&mut board, &["g1f3", "g8f6", "f3g1", "f6g8"]);
    assert_eq!(board.outcome(), Outcome::Draw(DrawReason::Repetition));
}

#[test]
fn castling_rights_distinguish_repetitions() {
    let mut board =
        Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let original_key = board.key();
    // Rook shuffle forfeits white's queenside right; the recurring position
    // hashes differently from the original.
    play(&mut board, &["a1b1", "a8b8", "b1a1", "b8a8"]);
    assert_ne!(board.key(), original_key);
}

#[test]
fn fifty_move_rule_triggers_at_hundred_halfmoves() {
    let board =
        Board::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 100 80").unwrap();
    assert_eq!(board.outcome(), Outcome::Draw(DrawReason::FiftyMoveRule));
    let board =
        Board::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 99 80").unwrap();
    assert_eq!(board.outcome(), Outcome::InProgress);
}

#[test]
fn checkmate_outranks_the_fifty_move_clock() {
    use marlin::board::{Color, WinReason};
    // The mating move is also the hundredth quiet halfmove; mate wins.
    let board =
        Board::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 100 80").unwrap();
    assert_eq!(board.outcome(), Outcome::Win(Color::White, WinReason::Checkmate));
}

#[test]
fn bare_kings_are_a_dead_draw() {
    let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert_eq!(board.outcome(), Outcome::Draw(DrawReason::InsufficientMaterial));
}
