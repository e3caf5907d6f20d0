// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Owning references to graphics objects.
//!
//! A [`ResourceHandle`] is the crate's equivalent of a reference-counted COM pointer.
//! Every live handle holds one reference on the underlying object:
//!
//! - [`ResourceHandle::acquire`] (or [`Clone::clone`]) adds a reference,
//! - [`ResourceHandle::release`] (or dropping the handle) removes it.
//!
//! Queries against a [`StatefulContext`](crate::pipeline::StatefulContext) hand back
//! acquired handles, so whoever receives one owns exactly one reference and gives it
//! back on every exit path simply by letting it go out of scope.

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// An owning reference to a graphics object of type `R`.
///
/// Equality and hashing are by object identity, never by contents.  Two handles are
/// equal exactly when they refer to the same object.
pub struct ResourceHandle<R> {
    inner: Arc<R>,
}

impl<R> ResourceHandle<R> {
    pub(crate) fn new(resource: R) -> Self {
        ResourceHandle {
            inner: Arc::new(resource),
        }
    }

    pub(crate) fn as_arc(&self) -> &Arc<R> {
        &self.inner
    }

    /// Adds a reference to the object and returns the new owner.
    pub fn acquire(&self) -> Self {
        ResourceHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Gives this reference back.
    ///
    /// Equivalent to dropping the handle; spelled out for call sites that want the
    /// release to be visible.
    pub fn release(self) {
        drop(self)
    }

    /// Number of live references to the object, including this one.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether both handles refer to the same object.
    pub fn same_object(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<R> Clone for ResourceHandle<R> {
    fn clone(&self) -> Self {
        self.acquire()
    }
}

impl<R> Deref for ResourceHandle<R> {
    type Target = R;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<R> PartialEq for ResourceHandle<R> {
    fn eq(&self, other: &Self) -> bool {
        self.same_object(other)
    }
}
impl<R> Eq for ResourceHandle<R> {}

impl<R> Hash for ResourceHandle<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl<R: Debug> Debug for ResourceHandle<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("refs", &self.ref_count())
            .field("object", &*self.inner)
            .finish()
    }
}

/// Acquires every handle in an optional slot list.
///
/// Used by contexts that store caller-provided slot arrays.
pub(crate) fn acquire_slots<R>(slots: &[Option<ResourceHandle<R>>]) -> Vec<Option<ResourceHandle<R>>> {
    slots.iter().map(|s| s.as_ref().map(ResourceHandle::acquire)).collect()
}
