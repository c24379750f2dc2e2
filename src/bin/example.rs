//! Runs engines over a synthetic stream, checks them against the recomputing engine and reports
//! their latency and memory.
//!
//! Usage: `example [engine|all] [range] [slide]`. The log level comes from `RUST_LOG`.

use std::time::Duration;

use flexi_logger::Logger;
use rand::{Rng, SeedableRng};
use sliding_connectivity::{
    Edge, EngineKind, LatencyRecorder, LayoutEstimate, MemoryRecorder, Timestamp, Vertex,
    WindowConfig,
};

const VERTICES: Vertex = 2000;
const EDGES: usize = 50000;
const QUERIES: usize = 50;

fn stream(rng: &mut impl Rng, slide: Timestamp) -> Vec<Edge> {
    let mut ts = 0;
    (0..EDGES)
        .map(|_| {
            ts += rng.gen_range(0..slide);
            Edge::new(rng.gen_range(0..VERTICES), rng.gen_range(0..VERTICES), ts)
        })
        .collect()
}

fn mean(samples: impl Iterator<Item = Duration>) -> Duration {
    let (sum, n) = samples.fold((Duration::ZERO, 0u32), |(s, n), d| (s + d, n + 1));
    sum.checked_div(n).unwrap_or_default()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _logger = Logger::try_with_env_or_str("info")?
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
        .start()?;

    let mut args = std::env::args().skip(1);
    let engines = match args.next().as_deref() {
        None | Some("all") => EngineKind::ALL.to_vec(),
        Some(name) => vec![name.parse()?],
    };
    let range: Timestamp = args.next().map_or(Ok(5000), |s| s.parse())?;
    let slide: Timestamp = args.next().map_or(Ok(500), |s| s.parse())?;
    let config = WindowConfig::new(range, slide)?.strict(true);

    let mut rng = rand::rngs::StdRng::seed_from_u64(4815162342);
    let edges = stream(&mut rng, slide);
    let queries: Vec<(Vertex, Vertex)> = (0..QUERIES)
        .map(|_| (rng.gen_range(0..VERTICES), rng.gen_range(0..VERTICES)))
        .collect();
    log::info!(
        "{} edges over {} vertices, range {range}, slide {slide}",
        edges.len(),
        VERTICES
    );

    let mut expected = vec![vec![]; queries.len()];
    let mut oracle = EngineKind::UnionFind.build();
    let windows = config.run(oracle.as_mut(), edges.iter().copied(), &queries, &mut expected)?;
    log::info!("{windows} windows evaluated");

    for kind in engines {
        let mut engine = kind.build();
        let mut outputs = vec![vec![]; queries.len()];
        let mut observer = (
            LatencyRecorder::default(),
            MemoryRecorder::new(LayoutEstimate),
        );
        config.run_observed(
            engine.as_mut(),
            edges.iter().copied(),
            &queries,
            &mut outputs,
            &mut observer,
        )?;
        let (latency, memory) = observer;
        if outputs != expected {
            log::error!("{kind} disagrees with {}", EngineKind::UnionFind);
        }
        log::info!(
            "{kind:>18}: query {:?} manage {:?} per slide, peak memory {} bytes",
            mean(latency.samples.iter().map(|l| l.query)),
            mean(latency.samples.iter().map(|l| l.manage)),
            memory.samples.iter().max().copied().unwrap_or(0),
        );
    }
    Ok(())
}
