//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the relay.
//! Business crates depend only on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Records carry a UTC timestamp (`chrono::DateTime<Utc>`)
//! - On the wire every point is written with nanosecond precision

mod config;
mod error;
mod record;
mod transport;
mod wire;

pub use config::*;
pub use error::*;
pub use record::MetricRecord;
pub use transport::{LocalTransport, Transport};
pub use wire::*;
