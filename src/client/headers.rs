//! The mutable header list shared by every request of a bridge.

use std::sync::{Arc, PoisonError, RwLock};

use crate::transport::Header;

/// Copy-on-write list of headers added to every request.
///
/// Readers take a snapshot once per request; writers replace the whole list.
/// A mutation racing with a request is seen either entirely or not at all
/// by that request.
#[derive(Debug, Default)]
pub struct HeaderList {
    inner: RwLock<Arc<Vec<Header>>>,
}

impl HeaderList {
    /// Creates a list holding `headers`.
    pub fn new(headers: Vec<Header>) -> Self {
        Self {
            inner: RwLock::new(Arc::new(headers)),
        }
    }

    /// Returns the current headers.
    pub fn snapshot(&self) -> Arc<Vec<Header>> {
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces every header.
    pub fn replace(&self, headers: Vec<Header>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(headers);
    }

    /// Appends a header.
    pub fn add(&self, header: Header) {
        self.update(|headers| headers.push(header));
    }

    /// Replaces every header sharing `header`'s name, ignoring case, with
    /// `header` appended at the end.
    pub fn set(&self, header: Header) {
        self.update(|headers| {
            headers.retain(|h| !h.is_named(&header.name));
            headers.push(header);
        });
    }

    /// Removes every header called `name`, ignoring case. Returns the number
    /// removed.
    pub fn remove(&self, name: &str) -> usize {
        let mut removed = 0;
        self.update(|headers| {
            let before = headers.len();
            headers.retain(|h| !h.is_named(name));
            removed = before - headers.len();
        });
        removed
    }

    /// Returns true if a header called `name` is present, ignoring case.
    pub fn contains(&self, name: &str) -> bool {
        self.snapshot().iter().any(|h| h.is_named(name))
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns true if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn update(&self, mutate: impl FnOnce(&mut Vec<Header>)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut headers = Vec::clone(&guard);
        mutate(&mut headers);
        *guard = Arc::new(headers);
    }
}
