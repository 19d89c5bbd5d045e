use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use reify_types::{ClassId, Descriptor, ReifyError, Result};

use crate::{Object, ObjectIdentity, ObjectRef, ReclamationQueue};

const INITIAL_CAPACITY: usize = 256;
const MAX_CAPACITY: usize = 1 << 30;
const LOAD_FACTOR: f32 = 0.75;

const INITIAL_SUPERTYPES_PER_KEY: usize = 4;
/// Hard cap on the number of supertypes recorded for one object.
pub const MAX_SUPERTYPES_PER_KEY: usize = 127;

/// Weak map from object identity to `supertype -> descriptor`.
///
/// All table operations run under one lock, including lookups, because every access first
/// purges entries whose key has died. The lock is never held while a caller builds a descriptor.
pub struct DescriptorStore {
    ready: AtomicBool,
    queue: Arc<ReclamationQueue>,
    table: Mutex<Table>,
}

impl Default for DescriptorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DescriptorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.lock();
        f.debug_struct("DescriptorStore")
            .field("ready", &self.is_ready())
            .field("len", &table.len)
            .field("capacity", &table.buckets.len())
            .finish()
    }
}

impl DescriptorStore {
    pub fn new() -> Self {
        let store = Self::booting();
        store.mark_ready();
        store
    }

    /// A store that ignores `put` and answers every `get` with `None` until
    /// [`DescriptorStore::mark_ready`] is called.
    pub fn booting() -> Self {
        Self {
            ready: AtomicBool::new(false),
            queue: Arc::new(ReclamationQueue::new()),
            table: Mutex::new(Table::new()),
        }
    }

    /// The process-wide store used by instrumented code.
    pub fn global() -> &'static DescriptorStore {
        static GLOBAL: OnceLock<DescriptorStore> = OnceLock::new();
        GLOBAL.get_or_init(DescriptorStore::new)
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Record `descriptor` as the reified type of `object` viewed as `supertype`, replacing any
    /// previous descriptor for that supertype.
    pub fn put(
        &self,
        object: &ObjectRef,
        supertype: ClassId,
        descriptor: Descriptor,
    ) -> Result<()> {
        if !self.is_ready() {
            return Ok(());
        }
        object.watch(&self.queue);

        let mut table = self.table.lock();
        table.purge(&self.queue);
        table.insert(object, supertype, descriptor)
    }

    /// The descriptor recorded for `object` under `supertype`.
    ///
    /// `None` means "use the erased class", never an error.
    pub fn get(&self, object: &Object, supertype: ClassId) -> Option<Descriptor> {
        if !self.is_ready() {
            return None;
        }
        let mut table = self.table.lock();
        table.purge(&self.queue);
        table
            .find(object.identity())
            .and_then(|entry| entry.supertypes.get(supertype))
            .cloned()
    }

    /// Number of live objects with at least one recorded descriptor.
    pub fn len(&self) -> usize {
        let mut table = self.table.lock();
        table.purge(&self.queue);
        table.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current bucket count.
    pub fn capacity(&self) -> usize {
        self.table.lock().buckets.len()
    }
}

struct Table {
    buckets: Vec<Vec<Entry>>,
    len: usize,
    threshold: usize,
}

struct Entry {
    identity: ObjectIdentity,
    key: Weak<Object>,
    supertypes: SupertypeTable,
}

impl Table {
    fn new() -> Self {
        Self {
            buckets: empty_buckets(INITIAL_CAPACITY),
            len: 0,
            threshold: threshold(INITIAL_CAPACITY),
        }
    }

    fn purge(&mut self, queue: &ReclamationQueue) {
        for identity in queue.drain() {
            let index = bucket_index(identity, self.buckets.len());
            let bucket = &mut self.buckets[index];
            let before = bucket.len();
            bucket.retain(|entry| entry.identity != identity || entry.key.strong_count() > 0);
            self.len -= before - bucket.len();
        }
    }

    fn find(&self, identity: ObjectIdentity) -> Option<&Entry> {
        let index = bucket_index(identity, self.buckets.len());
        self.buckets[index]
            .iter()
            .find(|entry| entry.identity == identity && entry.key.strong_count() > 0)
    }

    fn insert(
        &mut self,
        object: &ObjectRef,
        supertype: ClassId,
        descriptor: Descriptor,
    ) -> Result<()> {
        let identity = object.identity();
        let index = bucket_index(identity, self.buckets.len());
        if let Some(entry) = self.buckets[index]
            .iter_mut()
            .find(|entry| entry.identity == identity)
        {
            return entry.supertypes.insert(supertype, descriptor);
        }

        let mut supertypes = SupertypeTable::new();
        supertypes.insert(supertype, descriptor)?;
        self.buckets[index].push(Entry {
            identity,
            key: Arc::downgrade(object),
            supertypes,
        });
        self.len += 1;

        if self.len > self.threshold {
            self.grow();
        }
        Ok(())
    }

    fn grow(&mut self) {
        let old_capacity = self.buckets.len();
        if old_capacity >= MAX_CAPACITY {
            self.threshold = usize::MAX;
            return;
        }
        let new_capacity = old_capacity * 2;
        let old = std::mem::replace(&mut self.buckets, empty_buckets(new_capacity));

        let mut live = 0;
        for entry in old.into_iter().flatten() {
            if entry.key.strong_count() == 0 {
                continue;
            }
            let index = bucket_index(entry.identity, new_capacity);
            self.buckets[index].push(entry);
            live += 1;
        }
        let dropped = self.len - live;
        self.len = live;
        self.threshold = threshold(new_capacity);

        tracing::debug!(
            target: "reify.store",
            old_capacity,
            new_capacity,
            live,
            dropped,
            "resized descriptor store"
        );
    }
}

fn empty_buckets(capacity: usize) -> Vec<Vec<Entry>> {
    std::iter::repeat_with(Vec::new).take(capacity).collect()
}

fn threshold(capacity: usize) -> usize {
    (capacity as f32 * LOAD_FACTOR) as usize
}

/// Spread the identity so that aligned addresses do not all land in a few buckets.
fn spread(hash: usize) -> usize {
    let mut h = hash ^ (hash >> 20) ^ (hash >> 12);
    h ^= (h >> 7) ^ (h >> 4);
    h
}

fn bucket_index(identity: ObjectIdentity, capacity: usize) -> usize {
    debug_assert!(capacity.is_power_of_two());
    spread(identity.to_raw()) & (capacity - 1)
}

/// Per-object `supertype -> descriptor` map. Objects rarely implement more than a handful of
/// reified supertypes, so a linear scan beats hashing here.
struct SupertypeTable {
    entries: Vec<(ClassId, Descriptor)>,
}

impl SupertypeTable {
    fn new() -> Self {
        Self {
            entries: Vec::with_capacity(INITIAL_SUPERTYPES_PER_KEY),
        }
    }

    fn get(&self, supertype: ClassId) -> Option<&Descriptor> {
        self.entries
            .iter()
            .find(|(class, _)| *class == supertype)
            .map(|(_, descriptor)| descriptor)
    }

    fn insert(&mut self, supertype: ClassId, descriptor: Descriptor) -> Result<()> {
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(class, _)| *class == supertype)
        {
            slot.1 = descriptor;
            return Ok(());
        }
        if self.entries.len() >= MAX_SUPERTYPES_PER_KEY {
            return Err(ReifyError::TooManySupertypes {
                max: MAX_SUPERTYPES_PER_KEY,
            });
        }
        if self.entries.len() == self.entries.capacity() {
            let target = (self.entries.capacity() * 2).min(MAX_SUPERTYPES_PER_KEY);
            self.entries.reserve_exact(target - self.entries.len());
        }
        self.entries.push((supertype, descriptor));
        Ok(())
    }
}
