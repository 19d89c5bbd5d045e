use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use reify_types::ClassId;

/// Shared handle to a host object.
pub type ObjectRef = Arc<Object>;

/// Identity of an object: the address of its allocation.
///
/// Two live objects never share an identity. An address can only be reused after every `Arc`
/// and `Weak` pointing at the allocation is gone, so a store entry (which keeps a `Weak`) pins
/// the identity until the entry is purged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIdentity(usize);

impl ObjectIdentity {
    pub fn of(object: &Object) -> Self {
        Self(object as *const Object as usize)
    }

    pub fn to_raw(self) -> usize {
        self.0
    }
}

/// A host object: its runtime class, the enclosing instance for inner classes, and an opaque
/// payload.
pub struct Object {
    class: ClassId,
    outer: Option<ObjectRef>,
    payload: Box<dyn Any + Send + Sync>,
    watchers: Mutex<Vec<Weak<ReclamationQueue>>>,
}

impl Object {
    pub fn new(class: ClassId, payload: impl Any + Send + Sync) -> ObjectRef {
        Arc::new(Self {
            class,
            outer: None,
            payload: Box::new(payload),
            watchers: Mutex::new(Vec::new()),
        })
    }

    /// An instance of an inner (non-static nested) class bound to `outer`.
    pub fn new_inner(
        class: ClassId,
        outer: ObjectRef,
        payload: impl Any + Send + Sync,
    ) -> ObjectRef {
        Arc::new(Self {
            class,
            outer: Some(outer),
            payload: Box::new(payload),
            watchers: Mutex::new(Vec::new()),
        })
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn outer_instance(&self) -> Option<&ObjectRef> {
        self.outer.as_ref()
    }

    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }

    pub fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::of(self)
    }

    /// Register `queue` to be notified when this object dies. Idempotent per queue.
    pub(crate) fn watch(&self, queue: &Arc<ReclamationQueue>) {
        let mut watchers = self.watchers.lock();
        if watchers
            .iter()
            .any(|existing| std::ptr::eq(existing.as_ptr(), Arc::as_ptr(queue)))
        {
            return;
        }
        watchers.retain(|existing| existing.strong_count() > 0);
        watchers.push(Arc::downgrade(queue));
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        let identity = self.identity();
        for queue in self.watchers.get_mut().drain(..) {
            if let Some(queue) = queue.upgrade() {
                queue.push(identity);
            }
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("identity", &self.identity())
            .field("class", &self.class)
            .field("has_outer", &self.outer.is_some())
            .finish_non_exhaustive()
    }
}

/// Identities of dead objects that a store still has to purge.
#[derive(Debug, Default)]
pub struct ReclamationQueue {
    pending: Mutex<Vec<ObjectIdentity>>,
}

impl ReclamationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, identity: ObjectIdentity) {
        self.pending.lock().push(identity);
    }

    /// Take every pending identity.
    pub fn drain(&self) -> Vec<ObjectIdentity> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
