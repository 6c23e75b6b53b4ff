//! Ordered-key cursors.
//!
//! A cursor owns a snapshot of the keys it will visit, in the order it was
//! opened with, plus a lease on the store's cursor count. Values are loaded
//! by the caller one key at a time, so the store can be written to while a
//! cursor is open. The lease is released when the cursor is dropped, which
//! covers early `break`, `?` returns and unwinding alike.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Traversal order of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Lowest key first.
    Ascending,
    /// Highest key first.
    Descending,
}

/// Counts the cursors a store currently has open.
#[derive(Debug, Default)]
pub struct CursorTracker {
    open: Arc<AtomicUsize>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a cursor over `keys`, which must already be sorted ascending.
    pub fn open<K>(&self, mut keys: Vec<K>, order: Order) -> Cursor<K> {
        if order == Order::Descending {
            keys.reverse();
        }
        self.open.fetch_add(1, Ordering::SeqCst);
        Cursor {
            keys: keys.into_iter(),
            _lease: Lease(Arc::clone(&self.open)),
        }
    }

    /// Number of cursors not yet dropped.
    pub fn open_count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

struct Lease(Arc<AtomicUsize>);

impl Drop for Lease {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A finite, ordered sequence of keys.
pub struct Cursor<K> {
    keys: std::vec::IntoIter<K>,
    _lease: Lease,
}

impl<K> Cursor<K> {
    /// Keys not yet visited.
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl<K> Iterator for Cursor<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.keys.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<K> std::fmt::Debug for Cursor<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("remaining", &self.keys.len())
            .finish()
    }
}
