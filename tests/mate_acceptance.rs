use marlin::engine::{Engine, Limits};
use marlin::search::mate_in;

fn best_at(fen: &str, depth: u32) -> (Option<String>, i32) {
    let mut engine = Engine::new(4, 1);
    engine.set_position(Some(fen), &[]).unwrap();
    let r = engine.think(Limits { depth: Some(depth), ..Default::default() }).unwrap().wait();
    (r.best_move.map(|m| m.to_uci()), r.score_cp)
}

#[test]
fn back_rank_mate_in_one() {
    let (best, score) = best_at("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 4);
    assert_eq!(best.as_deref(), Some("a1a8"));
    assert_eq!(mate_in(score), Some(1));
}

#[test]
fn smothered_knight_mate_in_one() {
    let (best, score) = best_at("6rk/6pp/7N/8/8/8/8/6K1 w - - 0 1", 4);
    assert_eq!(best.as_deref(), Some("h6f7"));
    assert_eq!(mate_in(score), Some(1));
}

#[test]
fn sees_the_mate_threat_against_itself() {
    // Black is a rook down with a weak back rank; the score must reflect a
    // lost position.
    let (_, score) = best_at("6k1/5ppp/8/8/8/8/8/R5K1 b - - 0 1", 5);
    assert!(score < -300 || mate_in(score).map_or(false, |m| m < 0), "score {score}");
}

#[test]
fn promotion_delivers_mate() {
    // a8=Q is mate on the spot: the new queen covers the back rank and the
    // king covers the flight squares.
    let (_, score) = best_at("7k/P7/6K1/8/8/8/8/8 w - - 0 1", 6);
    assert!(mate_in(score).is_some(), "no mate found, score {score}");
    assert!(mate_in(score).unwrap() > 0);
}
