use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Connection slot tracking for the accept loop
///
/// Slots are taken without waiting: when every slot is in use the new
/// connection is refused, matching how the server treats overload.
#[derive(Debug)]
pub struct ConnectionTracker {
    counters: Arc<Counters>,
    connection_semaphore: Arc<Semaphore>,
    max_connections: usize,
}

#[derive(Debug, Default)]
struct Counters {
    active_connections: AtomicUsize,
    total_connections: AtomicU64,
}

impl ConnectionTracker {
    pub fn new(max_connections: usize) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            connection_semaphore: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        }
    }

    /// Attempt to take a connection slot
    pub fn try_acquire(&self) -> Result<ConnectionGuard, ConnectionError> {
        let permit = Arc::clone(&self.connection_semaphore)
            .try_acquire_owned()
            .map_err(|_| ConnectionError::LimitReached {
                max: self.max_connections,
            })?;

        let active = self.counters.active_connections.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.counters.total_connections.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::debug!(
            active_connections = active,
            total_connections = total,
            "Connection acquired"
        );

        Ok(ConnectionGuard {
            _permit: permit,
            counters: Arc::clone(&self.counters),
            start_time: Instant::now(),
        })
    }

    /// Get current metrics
    pub fn metrics(&self) -> ConnectionMetrics {
        ConnectionMetrics {
            active_connections: self.counters.active_connections.load(Ordering::SeqCst),
            total_connections: self.counters.total_connections.load(Ordering::SeqCst),
            available_slots: self.connection_semaphore.available_permits(),
            max_connections: self.max_connections,
        }
    }
}

/// RAII guard for connection tracking, movable into the connection task
#[derive(Debug)]
pub struct ConnectionGuard {
    _permit: OwnedSemaphorePermit,
    counters: Arc<Counters>,
    start_time: Instant,
}

impl ConnectionGuard {
    pub fn active_connections(&self) -> usize {
        self.counters.active_connections.load(Ordering::SeqCst)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let active = self
            .counters
            .active_connections
            .fetch_sub(1, Ordering::SeqCst)
            - 1;
        let duration = self.start_time.elapsed();

        tracing::debug!(
            active_connections = active,
            connection_duration_ms = duration.as_millis(),
            "Connection released"
        );
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Connection limit of {max} reached")]
    LimitReached { max: usize },
}

/// Connection metrics for monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMetrics {
    pub active_connections: usize,
    pub total_connections: u64,
    pub available_slots: usize,
    pub max_connections: usize,
}

/// Size validator for request bodies
#[derive(Debug, Clone, Copy)]
pub struct SizeValidator {
    max_size: usize,
}

impl SizeValidator {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn validate_size(&self, size: usize) -> Result<(), SizeError> {
        if size > self.max_size {
            Err(SizeError::TooLarge {
                actual: size,
                max: self.max_size,
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SizeError {
    #[error("Request too large: {actual} bytes, maximum allowed: {max} bytes")]
    TooLarge { actual: usize, max: usize },
}
