use std::sync::Arc;

use parking_lot::Mutex;
use reify_store::{DescriptorStore, ObjectRef};
use reify_types::{ClassId, Descriptor, ReifyError, Result};

const INITIAL_CAPACITY: usize = 16;

/// Supertype witnesses collected while a constructor chain runs.
///
/// Superclass constructors add `(supertype, descriptor)` pairs; the most-derived constructor
/// flushes them into the store once the object is fully constructed. A collector is flushed
/// exactly once and accepts nothing afterwards.
///
/// Cloning yields another handle to the same buffer.
#[derive(Clone, Debug)]
pub struct DeferredConstructorArgs {
    inner: Arc<Mutex<Option<Vec<(ClassId, Descriptor)>>>>,
}

impl Default for DeferredConstructorArgs {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredConstructorArgs {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(Vec::with_capacity(INITIAL_CAPACITY)))),
        }
    }

    pub fn add(&self, supertype: ClassId, descriptor: Descriptor) -> Result<()> {
        match self.inner.lock().as_mut() {
            Some(pending) => {
                pending.push((supertype, descriptor));
                Ok(())
            }
            None => Err(ReifyError::AlreadyFlushed),
        }
    }

    /// Write every collected pair into `store` under `object`, consuming the buffer.
    pub fn flush(&self, store: &DescriptorStore, object: &ObjectRef) -> Result<()> {
        let pending = self.inner.lock().take().ok_or(ReifyError::AlreadyFlushed)?;
        for (supertype, descriptor) in pending {
            store.put(object, supertype, descriptor)?;
        }
        Ok(())
    }

    /// Pairs collected so far; zero once flushed.
    pub fn len(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_flushed(&self) -> bool {
        self.inner.lock().is_none()
    }

    /// Whether `self` and `other` are handles to the same collector.
    pub fn same_collector(&self, other: &DeferredConstructorArgs) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
