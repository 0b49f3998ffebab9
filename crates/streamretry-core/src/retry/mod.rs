//! Retry and backoff around streamed responses.
//!
//! This module encapsulates error classification (rate limits vs. everything
//! else), backoff delays (exponential or server-hinted) and the attempt loop
//! that restarts a producer stream, so any streaming call can share one
//! consistent policy.

mod backoff;
mod classify;
mod clock;
mod error;
mod hint;
mod policy;
mod run;

pub use backoff::{compute_delay, compute_delay_at, delay_from_hint, exponential_delay};
pub use classify::{classify, ClassifiedError, RetryableError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ApiError;
pub use hint::{retry_hint, HintKind, RetryHint, HINT_FIELDS};
pub use policy::{should_retry, ErrorKind, RetryConfig, RetryDecision};
pub use run::{
    retry_stream, ProducerFactory, ProducerFactoryExt, RetryNotice, RetryObserver,
    RetryingFactory,
};
