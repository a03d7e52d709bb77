//! Security and resource management components

pub mod limits;

pub use limits::{
    ConnectionError, ConnectionGuard, ConnectionMetrics, ConnectionTracker, SizeError,
    SizeValidator,
};
