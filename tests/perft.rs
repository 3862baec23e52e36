use std::collections::HashMap;

use jamesfish::{perft, perft_divide, perft_full, PerftDepthResult, Position, MOVE_GEN};

use test_case::test_case;
use testresult::TestResult;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

#[test_case(Position::start(), 1, 20 ; "starting 1")]
#[test_case(Position::start(), 2, 400 ; "starting 2")]
#[test_case(Position::start(), 3, 8902 ; "starting 3")]
#[test_case(Position::start(), 4, 197_281 ; "starting 4")]
#[test_case(Position::from_fen(KIWIPETE).unwrap(), 1, 48 ; "kiwipete 1")]
#[test_case(Position::from_fen(KIWIPETE).unwrap(), 2, 2039 ; "kiwipete 2")]
#[test_case(Position::from_fen(KIWIPETE).unwrap(), 3, 97_862 ; "kiwipete 3")]
#[test_case(Position::from_fen(POSITION_3).unwrap(), 4, 43_238 ; "position3 4")]
#[test_case(Position::from_fen(POSITION_4).unwrap(), 3, 9467 ; "position4 3")]
#[test_case(Position::from_fen(POSITION_5).unwrap(), 3, 62_379 ; "position5 3")]
fn test_perft(position: Position, depth: usize, want: u64) {
    assert_eq!(perft(&position, depth, MOVE_GEN), want);
}

#[test_case(Position::start(), 5, 4_865_609 ; "starting 5")]
#[test_case(Position::from_fen(KIWIPETE).unwrap(), 4, 4_085_603 ; "kiwipete 4")]
#[test_case(Position::from_fen(POSITION_3).unwrap(), 5, 674_624 ; "position3 5")]
#[test_case(Position::from_fen(POSITION_4).unwrap(), 4, 422_333 ; "position4 4")]
#[test_case(Position::from_fen(POSITION_5).unwrap(), 4, 2_103_487 ; "position5 4")]
#[ignore]
fn test_perft_long(position: Position, depth: usize, want: u64) {
    assert_eq!(perft(&position, depth, MOVE_GEN), want);
}

#[test_case(Position::from_fen(KIWIPETE).unwrap(), 3, PerftDepthResult {
    tot: 97_862,
    captures: 17_102,
    en_passants: 45,
    castles: 3162,
    promotions: 0,
    checks: 993,
    discovery_checks: 0,
    double_checks: 0,
    checkmates: 1,
} ; "kiwipete 3")]
#[test_case(Position::from_fen(POSITION_3).unwrap(), 4, PerftDepthResult {
    tot: 43_238,
    captures: 3348,
    en_passants: 123,
    castles: 0,
    promotions: 0,
    checks: 1680,
    discovery_checks: 106,
    double_checks: 0,
    checkmates: 17,
} ; "position3 4")]
fn test_perft_full(position: Position, depth: usize, want: PerftDepthResult) {
    let res = perft_full(&position, depth, MOVE_GEN);
    println!("{}", res);

    assert_eq!(res.depth_results.len(), depth);
    assert_eq!(res.depth_results.last(), Some(&want));
}

#[test_case(Position::from_fen(KIWIPETE).unwrap(), 4, PerftDepthResult {
    tot: 4_085_603,
    captures: 757_163,
    en_passants: 1929,
    castles: 128_013,
    promotions: 15_172,
    checks: 25_523,
    discovery_checks: 42,
    double_checks: 6,
    checkmates: 43,
} ; "kiwipete 4")]
#[test_case(Position::from_fen(POSITION_4).unwrap(), 4, PerftDepthResult {
    tot: 422_333,
    captures: 131_393,
    en_passants: 0,
    castles: 7795,
    promotions: 60_032,
    checks: 15_492,
    discovery_checks: 19,
    double_checks: 0,
    checkmates: 5,
} ; "position4 4")]
#[ignore]
fn test_perft_full_long(position: Position, depth: usize, want: PerftDepthResult) {
    let res = perft_full(&position, depth, MOVE_GEN);
    assert_eq!(res.depth_results.last(), Some(&want));
}

#[test_case(Position::start(), 3, &[
    ("a2a3", 380), ("b2b3", 420), ("c2c3", 420), ("d2d3", 539), ("e2e3", 599),
    ("f2f3", 380), ("g2g3", 420), ("h2h3", 380), ("a2a4", 420), ("b2b4", 421),
    ("c2c4", 441), ("d2d4", 560), ("e2e4", 600), ("f2f4", 401), ("g2g4", 421),
    ("h2h4", 420), ("b1a3", 400), ("b1c3", 440), ("g1f3", 440), ("g1h3", 400),
] ; "starting position 3")]
#[test_case(Position::start(), 4, &[
    ("a2a3", 8457), ("b2b3", 9345), ("c2c3", 9272), ("d2d3", 11959), ("e2e3", 13134),
    ("f2f3", 8457), ("g2g3", 9345), ("h2h3", 8457), ("a2a4", 9329), ("b2b4", 9332),
    ("c2c4", 9744), ("d2d4", 12435), ("e2e4", 13160), ("f2f4", 8929), ("g2g4", 9328),
    ("h2h4", 9329), ("b1a3", 8885), ("b1c3", 9755), ("g1f3", 9748), ("g1h3", 8881),
] ; "starting position 4")]
fn test_perft_divide(position: Position, depth: usize, want: &[(&str, u64)]) -> TestResult {
    let got: HashMap<String, u64> = perft_divide(&position, depth, MOVE_GEN)
        .into_iter()
        .map(|(mve, count)| (mve.to_string(), count))
        .collect();
    let want: HashMap<String, u64> = want
        .iter()
        .map(|&(mve, count)| (mve.to_string(), count))
        .collect();

    assert_eq!(got, want);
    Ok(())
}
