// ID Provider Port (for deterministic testing)

/// Request id generator (allows deterministic ids in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new id used to correlate log lines of one request
    fn next_request_id(&self) -> String;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn next_request_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Counter-based provider (`req-1`, `req-2`, ...)
#[derive(Default)]
pub struct SequentialIdProvider {
    next: std::sync::atomic::AtomicU64,
}

impl IdProvider for SequentialIdProvider {
    fn next_request_id(&self) -> String {
        let n = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            + 1;
        format!("req-{}", n)
    }
}
