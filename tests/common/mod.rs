use std::fmt::Debug;
use std::sync::{LazyLock, Mutex};

use flexi_logger::{Logger, LoggerHandle};
use rand::{Rng, SeedableRng};
use scopeguard::{OnUnwind, ScopeGuard};
use sliding_connectivity::{Edge, Timestamp, Vertex};

pub mod slow_forest;

#[allow(dead_code)]
pub static LOGGER: LazyLock<Mutex<LoggerHandle>> = LazyLock::new(|| {
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

#[allow(dead_code)]
pub fn init_logger() {
    let _ = &*LOGGER;
}

/// Logs the state of `t` if the test panics while holding it.
#[allow(dead_code)]
pub fn guard<T: Debug>(t: T) -> ScopeGuard<T, impl FnOnce(T), OnUnwind> {
    scopeguard::guard_on_unwind(t, |t| log::error!("Crash with {t:?}"))
}

/// Timestamp-ordered edges over `n` vertices, with gaps strictly smaller than `max_gap`. Some
/// edges are loops or repeat the previous pair.
#[allow(dead_code)]
pub fn random_stream(seed: u64, len: usize, n: Vertex, max_gap: Timestamp) -> Vec<Edge> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut ts = rng.gen_range(0..100);
    let mut edges: Vec<Edge> = Vec::with_capacity(len);
    for _ in 0..len {
        ts += rng.gen_range(0..max_gap);
        let (u, v) = match edges.last() {
            Some(e) if rng.gen_bool(0.05) => (e.target, e.source),
            _ => (rng.gen_range(0..n), rng.gen_range(0..n)),
        };
        edges.push(Edge::new(u, v, ts));
    }
    edges
}

#[allow(dead_code)]
pub fn random_queries(seed: u64, len: usize, n: Vertex) -> Vec<(Vertex, Vertex)> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    // A few vertices that never appear in any edge.
    (0..len)
        .map(|_| (rng.gen_range(0..n + 3), rng.gen_range(0..n + 3)))
        .collect()
}
