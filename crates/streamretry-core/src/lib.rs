//! Retry-and-backoff orchestration for incrementally produced response
//! streams (e.g. chat completion streams).
//!
//! ```no_run
//! use futures::{stream, StreamExt};
//! use streamretry_core::retry::{ApiError, ProducerFactory, ProducerFactoryExt, RetryConfig};
//!
//! # async fn demo() {
//! let call = || stream::iter(vec![Ok::<_, ApiError>("hello"), Ok(" world")]);
//! let wrapped = call.retrying(RetryConfig::default());
//! let chunks: Vec<_> = wrapped.start().collect().await;
//! # }
//! ```

pub mod config;
pub mod logging;
pub mod retry;
