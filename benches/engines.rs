use criterion::{black_box, criterion_group, criterion_main, Bencher, BenchmarkId, Criterion};
use flexi_logger::Logger;
use rand::{Rng, SeedableRng};
use sliding_connectivity::{
    Edge, EngineKind, Timestamp, Vertex, WindowConfig, WindowConnectivity,
};
use std::{
    sync::{LazyLock, Mutex},
    time::Duration,
};

fn stream(seed: u64, len: usize, n: Vertex, slide: Timestamp) -> Vec<Edge> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut ts = 0;
    (0..len)
        .map(|_| {
            ts += rng.gen_range(0..slide);
            Edge::new(rng.gen_range(0..n), rng.gen_range(0..n), ts)
        })
        .collect()
}

fn whole_stream_impl(b: &mut Bencher, kind: EngineKind, config: WindowConfig, edges: &[Edge]) {
    let queries: Vec<(Vertex, Vertex)> = edges
        .iter()
        .step_by(edges.len() / 20 + 1)
        .map(|e| (e.source, e.target))
        .collect();
    b.iter(|| {
        let mut engine = kind.build();
        let mut outputs = vec![vec![]; queries.len()];
        black_box(config.run(
            engine.as_mut(),
            edges.iter().copied(),
            &queries,
            &mut outputs,
        ))
    });
}

fn whole_stream(c: &mut Criterion) {
    let _ = &*LOGGER;
    let mut g = c.benchmark_group("Whole stream");
    let mut rng = rand::rngs::StdRng::seed_from_u64(4815162342);
    let slide = 50;
    for range in [500, 5000] {
        let seed = rng.gen();
        log::debug!("Using seed {seed}");
        let edges = stream(seed, 20000, 1000, slide);
        let config = WindowConfig::new(range, slide).unwrap();
        g.throughput(criterion::Throughput::Elements(edges.len() as u64));
        let input_str = format!("range {range} slide {slide}");
        for kind in EngineKind::ALL {
            if kind == EngineKind::UnionFind && range > 500 {
                continue;
            }
            g.bench_with_input(BenchmarkId::new(kind.name(), &input_str), &kind, |b, &kind| {
                whole_stream_impl(b, kind, config, &edges)
            });
        }
    }
    g.finish();
}

fn single_insert_impl(b: &mut Bencher, kind: EngineKind, seed: u64) {
    const N: usize = 100000;
    let edges = stream(seed, N, 5000, 10);
    let mut engine = kind.build();
    let mut it = edges.iter().copied().cycle().enumerate();
    b.iter(|| {
        let Some((i, mut e)) = it.next() else {
            return;
        };
        // Keep timestamps increasing across laps of the stream.
        e.timestamp += (i / N) as Timestamp * 10 * N as Timestamp;
        engine.insert(e);
        engine.evict(e.timestamp - 2000);
        black_box(engine.query(e.source, e.target));
    });
}

fn single_insert(c: &mut Criterion) {
    let _ = &*LOGGER;
    let mut g = c.benchmark_group("Per edge");
    let mut rng = rand::rngs::StdRng::seed_from_u64(4815162342);
    g.throughput(criterion::Throughput::Elements(1));
    g.measurement_time(Duration::from_secs(10));
    let seed = rng.gen();
    log::debug!("Using seed {seed}");
    for kind in EngineKind::ALL {
        if kind == EngineKind::UnionFind {
            continue;
        }
        g.bench_with_input(BenchmarkId::new(kind.name(), "range 2000"), &kind, |b, &kind| {
            single_insert_impl(b, kind, seed)
        });
    }
    g.finish();
}

criterion_group!(benches, whole_stream, single_insert);
criterion_main!(benches);

pub static LOGGER: LazyLock<Mutex<flexi_logger::LoggerHandle>> = LazyLock::new(|| {
    Mutex::new(
        Logger::try_with_env_or_str("info")
            .unwrap()
            .write_mode(flexi_logger::WriteMode::SupportCapture)
            .log_to_stdout()
            .set_palette("196;208;3;7;8".to_owned())
            .format(|w, now, record| {
                let style = flexi_logger::style(record.level());
                write!(
                    w,
                    "{} {pref}[{}] {}{suf}",
                    now.format("%H:%M:%S"),
                    &record.level().as_str()[0..1],
                    record.args(),
                    pref = style.prefix(),
                    suf = style.suffix(),
                )
            })
            .start()
            .unwrap(),
    )
});
