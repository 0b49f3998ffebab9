//! Scripted producer for integration tests.
//!
//! Each call to `start` plays the next attempt's script (the last script is
//! repeated once the list runs out) and tracks how many instances are live,
//! so tests can assert that failed or abandoned producers are released.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::BoxStream;
use streamretry_core::retry::{ApiError, ProducerFactory};

#[derive(Debug, Clone)]
pub enum Step {
    Item(&'static str),
    Fail(ApiError),
    /// Never yields again.
    Hang,
}

#[derive(Debug, Clone, Default)]
pub struct Counters {
    calls: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
}

impl Counters {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Script {
    attempts: Vec<Vec<Step>>,
    counters: Counters,
}

impl Script {
    pub fn new(attempts: Vec<Vec<Step>>) -> Self {
        assert!(!attempts.is_empty(), "script needs at least one attempt");
        Self {
            attempts,
            counters: Counters::default(),
        }
    }

    pub fn counters(&self) -> Counters {
        self.counters.clone()
    }
}

impl ProducerFactory for Script {
    type Item = String;
    type Error = ApiError;
    type Producer = BoxStream<'static, Result<String, ApiError>>;

    fn start(&self) -> Self::Producer {
        let n = self.counters.calls.fetch_add(1, Ordering::SeqCst);
        let steps = self
            .attempts
            .get(n)
            .or_else(|| self.attempts.last())
            .cloned()
            .unwrap_or_default();

        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_live.fetch_max(live, Ordering::SeqCst);
        let guard = LiveGuard(Arc::clone(&self.counters.live));

        Box::pin(async_stream::stream! {
            let _guard = guard;
            for step in steps {
                match step {
                    Step::Item(text) => yield Ok(text.to_string()),
                    Step::Fail(err) => {
                        yield Err(err);
                        return;
                    }
                    Step::Hang => futures::future::pending::<()>().await,
                }
            }
        })
    }
}

pub fn rate_limited(message: &str) -> Step {
    Step::Fail(ApiError::http(429, message))
}

pub fn items(texts: &[&'static str]) -> Vec<Step> {
    texts.iter().map(|t| Step::Item(*t)).collect()
}
