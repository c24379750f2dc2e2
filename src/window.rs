//! The sliding window driver: feeds a timestamp-ordered edge stream to an engine and evaluates a
//! fixed batch of queries once per slide.
//!
//! The loop is edge driven. The window only advances when an edge arrives past its end, and it
//! advances by a single slide at a time, so slides during which no edge arrives are never
//! evaluated.

use std::time::{Duration, Instant};

use crate::connectivity::WindowConnectivity;
use crate::edge::{Edge, Timestamp, Vertex};
use crate::error::{ConfigError, StreamError};
use crate::memory::MemoryProbe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    range: Timestamp,
    slide: Timestamp,
    strict: bool,
}

/// Time spent on one slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlideLatency {
    /// Evaluating the query batch of the window that the slide leaves.
    pub query: Duration,
    /// Evicting and maintenance.
    pub manage: Duration,
}

/// Hooks into the driver loop. The unit type observes nothing.
pub trait SlideObserver<E: ?Sized> {
    /// Called right after a window's query batch, before anything is evicted.
    fn window_evaluated(&mut self, _engine: &E) {}
    /// Called once the window has moved forward by a slide.
    fn slide_completed(&mut self, _latency: SlideLatency) {}
}

impl<E: ?Sized> SlideObserver<E> for () {}

impl<E: ?Sized, A: SlideObserver<E>, B: SlideObserver<E>> SlideObserver<E> for (A, B) {
    fn window_evaluated(&mut self, engine: &E) {
        self.0.window_evaluated(engine);
        self.1.window_evaluated(engine);
    }
    fn slide_completed(&mut self, latency: SlideLatency) {
        self.0.slide_completed(latency);
        self.1.slide_completed(latency);
    }
}

/// Records how long every slide took.
#[derive(Debug, Default)]
pub struct LatencyRecorder {
    pub samples: Vec<SlideLatency>,
}

impl<E: ?Sized> SlideObserver<E> for LatencyRecorder {
    fn slide_completed(&mut self, latency: SlideLatency) {
        self.samples.push(latency);
    }
}

/// Records the engine's memory consumption at every evaluated window.
#[derive(Debug, Default)]
pub struct MemoryRecorder<P> {
    probe: P,
    pub samples: Vec<u64>,
}

impl<P: MemoryProbe> MemoryRecorder<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            samples: Vec::new(),
        }
    }
}

impl<E: WindowConnectivity + ?Sized, P: MemoryProbe> SlideObserver<E> for MemoryRecorder<P> {
    fn window_evaluated(&mut self, engine: &E) {
        self.samples.push(engine.memory_consumption(&self.probe));
    }
}

impl WindowConfig {
    pub fn new(range: Timestamp, slide: Timestamp) -> Result<Self, ConfigError> {
        if range <= 0 {
            return Err(ConfigError::InvalidRange(range));
        }
        if slide <= 0 {
            return Err(ConfigError::InvalidSlide(slide));
        }
        Ok(Self {
            range,
            slide,
            strict: false,
        })
    }

    /// Rejects out of order edges and gaps of a slide or more instead of running on them.
    pub fn strict(self, strict: bool) -> Self {
        Self { strict, ..self }
    }

    pub fn range(&self) -> Timestamp {
        self.range
    }

    pub fn slide(&self) -> Timestamp {
        self.slide
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Runs the whole stream through the engine, appending one answer per evaluated window to the
    /// output of each query. Returns the number of evaluated windows.
    pub fn run<E: WindowConnectivity + ?Sized>(
        &self,
        engine: &mut E,
        stream: impl IntoIterator<Item = Edge>,
        queries: &[(Vertex, Vertex)],
        outputs: &mut [Vec<bool>],
    ) -> Result<usize, StreamError> {
        self.run_observed(engine, stream, queries, outputs, &mut ())
    }

    /// Like [`WindowConfig::run`], reporting to the observer as it goes.
    pub fn run_observed<E, O>(
        &self,
        engine: &mut E,
        stream: impl IntoIterator<Item = Edge>,
        queries: &[(Vertex, Vertex)],
        outputs: &mut [Vec<bool>],
        observer: &mut O,
    ) -> Result<usize, StreamError>
    where
        E: WindowConnectivity + ?Sized,
        O: SlideObserver<E> + ?Sized,
    {
        if queries.len() != outputs.len() {
            log::debug!(
                "{} queries but {} outputs, nothing to do",
                queries.len(),
                outputs.len()
            );
            return Ok(0);
        }
        let mut stream = stream.into_iter();
        let Some(first) = stream.next() else {
            log::debug!("Empty stream, nothing to do");
            return Ok(0);
        };
        let mut window_start = first.timestamp;
        let mut last = first.timestamp;
        engine.insert(first);
        let mut boundary = self.fill(engine, &mut stream, window_start, &mut last)?;
        let mut query = self.evaluate(engine, window_start, queries, outputs, observer);
        let mut evaluated = 1;
        while let Some(edge) = boundary {
            window_start += self.slide;
            let start = Instant::now();
            engine.evict(window_start);
            engine.manage(edge.timestamp);
            let manage = start.elapsed();
            observer.slide_completed(SlideLatency { query, manage });
            engine.insert(edge);
            boundary = self.fill(engine, &mut stream, window_start, &mut last)?;
            if boundary.is_some() {
                query = self.evaluate(engine, window_start, queries, outputs, observer);
                evaluated += 1;
            }
        }
        log::debug!("Stream ended after {evaluated} windows");
        Ok(evaluated)
    }

    /// Inserts edges until one falls past the end of the window. Returns that edge.
    fn fill<E: WindowConnectivity + ?Sized>(
        &self,
        engine: &mut E,
        stream: &mut impl Iterator<Item = Edge>,
        window_start: Timestamp,
        last: &mut Timestamp,
    ) -> Result<Option<Edge>, StreamError> {
        for edge in stream {
            self.check(*last, edge)?;
            *last = edge.timestamp;
            if edge.timestamp - window_start >= self.range {
                return Ok(Some(edge));
            }
            engine.insert(edge);
        }
        Ok(None)
    }

    fn check(&self, previous: Timestamp, next: Edge) -> Result<(), StreamError> {
        if !self.strict {
            return Ok(());
        }
        if next.timestamp < previous {
            return Err(StreamError::OutOfOrder { previous, next });
        }
        let gap = next.timestamp - previous;
        if gap >= self.slide {
            return Err(StreamError::GapTooLarge {
                previous,
                next,
                gap,
                slide: self.slide,
            });
        }
        Ok(())
    }

    fn evaluate<E, O>(
        &self,
        engine: &mut E,
        window_start: Timestamp,
        queries: &[(Vertex, Vertex)],
        outputs: &mut [Vec<bool>],
        observer: &mut O,
    ) -> Duration
    where
        E: WindowConnectivity + ?Sized,
        O: SlideObserver<E> + ?Sized,
    {
        let start = Instant::now();
        engine.query_batch(queries, outputs);
        let elapsed = start.elapsed();
        log::debug!(
            "Window [{window_start}, {}) evaluated in {elapsed:?}",
            window_start + self.range
        );
        observer.window_evaluated(engine);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_windows() {
        assert_eq!(WindowConfig::new(0, 1), Err(ConfigError::InvalidRange(0)));
        assert_eq!(WindowConfig::new(5, -1), Err(ConfigError::InvalidSlide(-1)));
        let config = WindowConfig::new(5, 2).unwrap().strict(true);
        assert_eq!((config.range(), config.slide()), (5, 2));
        assert!(config.is_strict());
    }
}
