//! Error handling for the cloud client.
//!
//! - **Error Categories**: High-level classification for handling decisions
//! - **Domain-specific Errors**: Network, Stream, and Config errors
//! - **Unified Error Type**: `SparkError` consolidates all error types
//! - **Error Context**: Operation, device, and name attached to errors
//! - **Result Type Alias**: `SparkResult<T>`
//!
//! # Example
//!
//! ```ignore
//! use spark_cloud::error::{ErrorContext, ResultExt, SparkResult};
//!
//! match client.get_variable("53ff6c06", "temp").await {
//!     Ok(var) => println!("{}", var.result),
//!     Err(err) => {
//!         eprintln!("Error: {}", err.user_message());
//!         if err.is_retryable() {
//!             eprintln!("Hint: {}", err.recovery_hint());
//!         }
//!     }
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection, timeout, dropped stream | Yes |
//! | Auth | Rejected access token (401) | No |
//! | Server | Cloud errors (5xx, 429) | Yes |
//! | Client | Rejected request (4xx) | No |
//! | Protocol | Unreadable data from the cloud | No |
//! | Configuration | Missing token, bad URL or limits | No |

mod category;
mod config;
mod context;
mod network;
mod result;
mod spark_error;
mod stream;

pub use category::ErrorCategory;
pub use config::ConfigError;
pub use context::ErrorContext;
pub use network::{classify_http_error, http_status_error, NetworkError};
pub use result::{ResultExt, SparkResult};
pub use spark_error::SparkError;
pub use stream::StreamError;
