//! Guest-resident handle table.
//!
//! Handles are opaque, monotonically increasing integers. An id is never
//! handed out twice by the same table, so a stale handle can only miss,
//! never alias a newer entry.

use std::collections::HashMap;

/// Opaque handle to an open file inside one instance. Zero is never issued.
pub type Handle = u32;

/// Map from handle to the resource backing it.
#[derive(Debug)]
pub struct HandleTable<T> {
    entries: HashMap<Handle, T>,
    next: Handle,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleTable<T> {
    /// Empty table; the first handle issued is 1.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next: 1,
        }
    }

    /// Store a resource and return its handle, or `None` once the id space
    /// is exhausted.
    pub fn insert(&mut self, value: T) -> Option<Handle> {
        let handle = self.next;
        if handle == 0 {
            return None;
        }
        self.next = handle.wrapping_add(1);
        self.entries.insert(handle, value);
        Some(handle)
    }

    /// Borrow the resource behind `handle`.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.entries.get(&handle)
    }

    /// Mutably borrow the resource behind `handle`.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.entries.get_mut(&handle)
    }

    /// Remove and return the resource. Removing an unknown handle is a no-op.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        self.entries.remove(&handle)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is open.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
