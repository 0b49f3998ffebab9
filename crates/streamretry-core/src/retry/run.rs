//! Retry loop: relay a producer's stream until it completes or the policy
//! says stop, restarting the producer from scratch after each retryable
//! failure.
//!
//! Items already yielded are never replayed or retracted. A consumer that
//! accumulates streamed text sees the failed attempt's partial output
//! followed by a fresh stream from the beginning, and should reset on
//! [`RetryNotice`] (see [`RetryingFactory::on_retry`]).

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::stream::{BoxStream, Stream, StreamExt};

use super::classify::{classify, RetryableError};
use super::clock::{Clock, SystemClock};
use super::policy::{ErrorKind, RetryConfig, RetryDecision};

/// Starts a fresh instance of a lazy, fallible item stream on every call.
///
/// Any `Fn() -> impl Stream<Item = Result<T, E>>` is a factory.
pub trait ProducerFactory {
    type Item;
    type Error;
    type Producer: Stream<Item = Result<Self::Item, Self::Error>>;

    fn start(&self) -> Self::Producer;

    /// Config of the retry loop this factory already runs, if any.
    fn retry_config(&self) -> Option<&RetryConfig> {
        None
    }
}

impl<F, S, T, E> ProducerFactory for F
where
    F: Fn() -> S,
    S: Stream<Item = Result<T, E>>,
{
    type Item = T;
    type Error = E;
    type Producer = S;

    fn start(&self) -> S {
        self()
    }
}

/// Sent to the observer after a retryable failure, before the backoff sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryNotice {
    /// 0-based index of the attempt that failed.
    pub attempt: u32,
    /// 0-based index of the attempt about to start.
    pub next_attempt: u32,
    pub delay: Duration,
    pub kind: ErrorKind,
    pub status: Option<u16>,
}

pub type RetryObserver = Arc<dyn Fn(&RetryNotice) + Send + Sync>;

/// Wrap `factory` in the retry loop.
///
/// The returned stream has the same shape as the producer's. On a
/// non-retryable or exhausted failure it yields the producer's own error as
/// its final item.
///
/// A factory that already retries with an equal config is relayed as is, so
/// wrapping twice does not multiply attempts. A different config nests.
pub fn retry_stream<F, C>(
    factory: F,
    config: Arc<RetryConfig>,
    clock: C,
) -> impl Stream<Item = Result<F::Item, F::Error>>
where
    F: ProducerFactory,
    F::Error: RetryableError,
    C: Clock,
{
    drive(Arc::new(factory), config, clock, None)
}

fn drive<F, C>(
    factory: Arc<F>,
    config: Arc<RetryConfig>,
    clock: C,
    observer: Option<RetryObserver>,
) -> impl Stream<Item = Result<F::Item, F::Error>>
where
    F: ProducerFactory,
    F::Error: RetryableError,
    C: Clock,
{
    stream! {
        if factory.retry_config() == Some(&*config) {
            tracing::debug!("factory already retries with this config, relaying");
            let mut producer = Box::pin(factory.start());
            while let Some(item) = producer.next().await {
                yield item;
            }
            return;
        }

        let limit = config.attempt_limit();
        let mut attempt: u32 = 0;
        while attempt < limit {
            tracing::debug!("starting producer attempt {}/{}", attempt + 1, limit);
            let mut producer = Box::pin(factory.start());
            let failure = loop {
                match producer.next().await {
                    Some(Ok(item)) => yield Ok(item),
                    Some(Err(err)) => break Some(err),
                    None => break None,
                }
            };
            // Release the failed instance before waiting; at most one is ever live.
            drop(producer);

            let err = match failure {
                Some(err) => err,
                None => {
                    if attempt > 0 {
                        tracing::info!("stream completed after {} retries", attempt);
                    }
                    return;
                }
            };

            let classified = classify(&err, &config);
            let delay = match config.decide_classified(&classified, attempt, clock.now()) {
                RetryDecision::RetryAfter(delay) => delay,
                RetryDecision::NoRetry => {
                    tracing::warn!(
                        "giving up after attempt {}/{}: {}",
                        attempt + 1,
                        limit,
                        err
                    );
                    yield Err(err);
                    return;
                }
            };

            let notice = RetryNotice {
                attempt,
                next_attempt: attempt + 1,
                delay,
                kind: classified.kind,
                status: err.status(),
            };
            tracing::warn!(
                "attempt {}/{} failed ({:?}): {}; retrying in {:?}",
                attempt + 1,
                limit,
                classified.kind,
                err,
                delay
            );
            drop(err);
            if let Some(observer) = &observer {
                observer(&notice);
            }

            clock.sleep(delay).await;
            attempt += 1;
        }
    }
}

/// A producer factory with retry behavior attached. It is a
/// [`ProducerFactory`] itself, so callers cannot tell it apart from the
/// unwrapped one.
pub struct RetryingFactory<F, C = SystemClock> {
    inner: Arc<F>,
    config: Arc<RetryConfig>,
    clock: C,
    observer: Option<RetryObserver>,
}

impl<F> RetryingFactory<F, SystemClock> {
    pub fn new(inner: F, config: RetryConfig) -> Self {
        Self {
            inner: Arc::new(inner),
            config: Arc::new(config),
            clock: SystemClock,
            observer: None,
        }
    }
}

impl<F, C> RetryingFactory<F, C> {
    /// Replace the retry config. Wrapping an already-wrapped factory lands
    /// here rather than nesting a second loop, so attempts are counted once.
    pub fn retrying(mut self, config: RetryConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> RetryingFactory<F, C2> {
        RetryingFactory {
            inner: self.inner,
            config: self.config,
            clock,
            observer: self.observer,
        }
    }

    /// Called before every backoff sleep.
    pub fn on_retry<O>(mut self, observer: O) -> Self
    where
        O: Fn(&RetryNotice) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl<F, C> ProducerFactory for RetryingFactory<F, C>
where
    F: ProducerFactory + Send + Sync + 'static,
    F::Producer: Send + 'static,
    F::Item: Send + 'static,
    F::Error: RetryableError + Send + 'static,
    C: Clock + Clone + 'static,
{
    type Item = F::Item;
    type Error = F::Error;
    type Producer = BoxStream<'static, Result<F::Item, F::Error>>;

    fn start(&self) -> Self::Producer {
        drive(
            Arc::clone(&self.inner),
            Arc::clone(&self.config),
            self.clock.clone(),
            self.observer.clone(),
        )
        .boxed()
    }

    fn retry_config(&self) -> Option<&RetryConfig> {
        Some(&self.config)
    }
}

pub trait ProducerFactoryExt: ProducerFactory + Sized {
    /// Attach the retry loop using the system clock.
    fn retrying(self, config: RetryConfig) -> RetryingFactory<Self> {
        RetryingFactory::new(self, config)
    }
}

impl<F: ProducerFactory> ProducerFactoryExt for F {}
