//! `streamretry simulate` – drive a scripted producer through the retry loop.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use streamretry_core::config::StreamRetryConfig;
use streamretry_core::retry::{
    ApiError, ManualClock, ProducerFactory, ProducerFactoryExt, RetryNotice,
};

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub fail: u32,
    pub status: u16,
    pub fail_after: usize,
    pub retry_after: Option<String>,
    pub chunks: Vec<String>,
    pub instant: bool,
    pub json: bool,
}

type Chunks = stream::Iter<std::vec::IntoIter<Result<String, ApiError>>>;

/// Producer whose first `opts.fail` attempts emit `fail_after` chunks then fail.
fn scripted_producer(
    opts: &SimulateOptions,
    calls: Arc<AtomicU32>,
) -> impl Fn() -> Chunks + Send + Sync + 'static {
    let fail = opts.fail;
    let fail_after = opts.fail_after;
    let chunks = opts.chunks.clone();
    let mut error = ApiError::http(opts.status, "simulated failure");
    if let Some(value) = &opts.retry_after {
        error = error.with_header("retry-after", value.clone());
    }

    move || {
        let attempt = calls.fetch_add(1, Ordering::SeqCst);
        let mut items: Vec<Result<String, ApiError>> = Vec::new();
        if attempt < fail {
            items.extend(chunks.iter().take(fail_after).cloned().map(Ok));
            items.push(Err(error.clone()));
        } else {
            items.extend(chunks.iter().cloned().map(Ok));
        }
        stream::iter(items)
    }
}

fn print_notice(notice: &RetryNotice, as_json: bool) {
    if as_json {
        println!(
            "{}",
            json!({
                "event": "retry",
                "failed_attempt": notice.attempt,
                "next_attempt": notice.next_attempt,
                "delay_ms": u64::try_from(notice.delay.as_millis()).unwrap_or(u64::MAX),
                "kind": format!("{:?}", notice.kind),
                "status": notice.status,
            })
        );
    } else {
        println!(
            "-- attempt {} failed ({:?}, status {:?}); retrying in {} ms",
            notice.attempt + 1,
            notice.kind,
            notice.status,
            notice.delay.as_millis()
        );
    }
}

async fn drain<F>(factory: F, as_json: bool) -> Result<usize, ApiError>
where
    F: ProducerFactory<Item = String, Error = ApiError>,
{
    let mut stream = Box::pin(factory.start());
    let mut count = 0;
    while let Some(item) = stream.next().await {
        let chunk = item?;
        if as_json {
            println!("{}", json!({ "event": "chunk", "text": chunk }));
        } else {
            println!("chunk {:?}", chunk);
        }
        count += 1;
    }
    Ok(count)
}

pub async fn run_simulate(cfg: &StreamRetryConfig, opts: SimulateOptions) -> Result<()> {
    let policy = cfg.retry_config()?;
    let calls = Arc::new(AtomicU32::new(0));
    let factory = scripted_producer(&opts, Arc::clone(&calls));
    let as_json = opts.json;
    let on_retry = move |notice: &RetryNotice| print_notice(notice, as_json);
    tracing::info!(
        "simulate: fail={} status={} instant={}",
        opts.fail,
        opts.status,
        opts.instant
    );

    let started = Instant::now();
    let result = if opts.instant {
        let wrapped = factory
            .retrying(policy)
            .with_clock(ManualClock::default())
            .on_retry(on_retry);
        drain(wrapped, as_json).await
    } else {
        let wrapped = factory.retrying(policy).on_retry(on_retry);
        drain(wrapped, as_json).await
    };
    let attempts = calls.load(Ordering::SeqCst);

    match result {
        Ok(count) => {
            if as_json {
                println!(
                    "{}",
                    json!({ "event": "done", "chunks": count, "attempts": attempts })
                );
            } else {
                println!(
                    "done: {} chunks after {} attempt(s) in {:?}",
                    count,
                    attempts,
                    started.elapsed()
                );
            }
            Ok(())
        }
        Err(err) => {
            if as_json {
                println!(
                    "{}",
                    json!({ "event": "error", "message": err.to_string(), "attempts": attempts })
                );
            }
            Err(anyhow::Error::new(err).context(format!("gave up after {} attempt(s)", attempts)))
        }
    }
}
