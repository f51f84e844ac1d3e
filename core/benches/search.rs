use cozy_chess::Board;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use evaluation::MaterialEvaluator;
use search::{Engine, EngineConfig, ParallelSearch, SearchEngine, SearchRequest};

const DEPTH: i32 = 6;
const SAMPLE_SIZE: usize = 10;
const SLAVES: usize = 3;

/// Perft positions from https://github.com/AndyGrant/Ethereal/blob/master/src/perft/standard.epd
const POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "rnbqkb1r/ppppp1pp/7n/4Pp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
];

fn bench_engine(c: &mut Criterion, name: &str, engine: &mut dyn SearchEngine) {
    let mut group = c.benchmark_group(format!("{}/depth_{}", name, DEPTH));

    group.sample_size(SAMPLE_SIZE);
    group.sampling_mode(SamplingMode::Flat);

    for fen in POSITIONS {
        let board: Board = fen.parse().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(fen), &board, |b, board| {
            b.iter(|| {
                engine.clear_tables();
                black_box(engine.start(SearchRequest::new(board.clone()).depth(DEPTH), None))
            })
        });
    }

    group.finish();
}

fn bench_sequential(c: &mut Criterion) {
    let config = EngineConfig::default();
    let mut engine = Engine::new(&config, Box::new(MaterialEvaluator::default()));
    bench_engine(c, "sequential", &mut engine);
}

fn bench_parallel(c: &mut Criterion) {
    let config = EngineConfig::default();
    let mut engine = ParallelSearch::new(&config, Box::new(MaterialEvaluator::default()), SLAVES);
    bench_engine(c, "parallel", &mut engine);
}

criterion_group!(benches, bench_sequential, bench_parallel);
criterion_main!(benches);
