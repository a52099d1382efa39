//! Logging helpers
//!
//! - **rate_limited_logger**: collapses repeated warnings and errors into one
//!   line per interval with a suppressed count

pub mod rate_limited_logger;

pub use rate_limited_logger::{DEFAULT_LOG_INTERVAL, MAX_LINE_LOG_LENGTH, RateLimitedLogger};
