pub mod backoff;

pub use backoff::{deadline, retry, RetryConfig, Transient, DEFAULT_DEADLINE};
