// crates/resilience/src/lib.rs
//! Bounded waiting for slow or abandoned work
//!
//! - Timeouts around futures and blocking closures
//! - Cooperative cancellation shared between a caller and its tasks
//!
//! # Example
//!
//! ```rust
//! use shelfsort_resilience::{CancelToken, Timeout};
//! use std::time::Duration;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let timeout = Timeout::new(Duration::from_secs(5));
//! let token = CancelToken::new();
//! let answer = timeout.run_cancellable(async { 42 }, &token).await;
//! assert_eq!(answer.ok(), Some(42));
//! # });
//! ```

mod cancel;
mod error;
mod timeout;

pub use cancel::CancelToken;
pub use error::{ResilienceError, ResilienceResult};
pub use timeout::{with_timeout, Timeout};
