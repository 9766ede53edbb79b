// ===============================
// src/ids.rs
// ===============================
use std::sync::atomic::{AtomicU64, Ordering};

/// Order / execution id counters. First value handed out is 1; never reset.
#[derive(Debug, Default)]
pub struct IdGenerator {
    order_id: AtomicU64,
    exec_id: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self { Self::default() }

    pub fn next_order_id(&self) -> u64 {
        self.order_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_exec_id(&self) -> u64 {
        self.exec_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}
