use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gambit::{Move, PgnGame, Position};

const BOARDS: [(&str, &str); 6] = [
    (
        "initial",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ),
    (
        "sicilian",
        "r1b1k2r/2qnbppp/p2ppn2/1p4B1/3NPPP1/2N2Q2/PPP4P/2KR1B1R w kq - 0 11",
    ),
    (
        "middle",
        "1rq1r1k1/1p3ppp/pB3n2/3ppP2/Pbb1P3/1PN2B2/2P2QPP/R1R4K w - - 1 21",
    ),
    (
        "open_position",
        "4r1k1/3R1ppp/8/5P2/p7/6PP/4pK2/1rN1B3 w - - 4 43",
    ),
    ("queen", "6K1/8/8/1k3q2/3Q4/8/8/8 w - - 0 1"),
    ("pawn_attack", "4k3/8/8/pppppppp/PPPPPPPP/8/8/4K3 w - - 0 1"),
];

const PGN: &str = "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7 \
    6. Re1 b5 7. Bb3 d6 8. c3 O-O 9. h3 Nb8 10. d4 Nbd7";

fn bench_parse_fen(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_fen");
    for (name, fen) in BOARDS {
        group.bench_function(name, |b| {
            b.iter(|| black_box(Position::from_fen(fen).unwrap()))
        });
    }
    group.finish();
}

fn bench_apply_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_move");
    for (name, fen) in BOARDS {
        let pos = Position::from_fen(fen).unwrap();
        let moves: Vec<Move> = pos
            .allowed_moves()
            .iter()
            .flat_map(|(from, dests)| {
                dests
                    .iter()
                    .map(|to| Move::from_squares(&pos, *from, *to, None).unwrap())
                    .collect::<Vec<_>>()
            })
            .collect();
        group.bench_function(name, |b| {
            b.iter(|| {
                for mv in &moves {
                    black_box(pos.apply_move(mv));
                }
            })
        });
    }
    group.finish();
}

fn bench_parse_pgn(c: &mut Criterion) {
    c.bench_function("parse_pgn", |b| {
        b.iter(|| black_box(PgnGame::parse(PGN).unwrap()))
    });
}

criterion_group!(benches, bench_parse_fen, bench_apply_move, bench_parse_pgn);
criterion_main!(benches);
