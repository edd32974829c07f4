//! Process-wide default chunk size.
//!
//! Readers pick their initial refill size from this value at construction;
//! individual tokenizers can override it afterwards.

use std::sync::atomic::{AtomicUsize, Ordering};

static DEFAULT_CHUNK_SIZE: AtomicUsize = AtomicUsize::new(16 * 1024);

/// Returns the chunk size new readers start with.
#[must_use]
pub fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE.load(Ordering::Relaxed)
}

/// Changes the chunk size used by readers constructed afterwards.
pub fn set_default_chunk_size(size: usize) {
    DEFAULT_CHUNK_SIZE.store(size, Ordering::Relaxed);
}
