//! spark-cloud - client for the Spark/Particle IoT cloud
//!
//! REST wrappers for device management plus an incremental parser for the
//! cloud's server-sent device event stream.
//!
//! ```ignore
//! use futures::StreamExt;
//! use spark_cloud::{ClientConfig, EventFilter, SparkClient};
//!
//! let client = SparkClient::new(ClientConfig::from_env())?;
//! let mut events = client.get_event_stream(&EventFilter::mine()).await?;
//! while let Some(Ok(record)) = events.next().await {
//!     println!("{:?}: {:?}", record.name(), record.data());
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod error;
pub mod models;
pub mod sse;
pub mod traits;

pub use cloud::{EventFilter, EventScope, SparkClient};
pub use config::ClientConfig;
pub use error::{SparkError, SparkResult};
pub use sse::{EventRecord, EventStream, StreamEventProcessor};
