use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::{Mutex, RwLock};
use reify_types::{ClassId, Descriptor, MethodTypeArgs};

use crate::DeferredConstructorArgs;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// One logical execution context, i.e. one call stack.
///
/// Each thread has its own context ([`ContextId::current`]); hosts that multiplex several call
/// stacks onto one thread allocate extra contexts with [`ContextId::fresh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub fn fresh() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn current() -> Self {
        CURRENT.with(|guard| guard.id)
    }

    pub fn to_raw(self) -> u64 {
        self.0
    }
}

/// Releases a thread's slots from every live channel when the thread exits.
struct ThreadContext {
    id: ContextId,
}

impl Drop for ThreadContext {
    fn drop(&mut self) {
        let mut live = LIVE_REGISTRIES.lock();
        live.retain(|registry| match registry.upgrade() {
            Some(registry) => {
                release_from(&registry, self.id);
                true
            }
            None => false,
        });
    }
}

thread_local! {
    static CURRENT: ThreadContext = ThreadContext { id: ContextId::fresh() };
}

static GLOBAL: OnceLock<WitnessChannel> = OnceLock::new();

/// Context registries of every channel that has handed out slots, so an exiting thread can drop
/// its slot sets from all of them.
static LIVE_REGISTRIES: Mutex<Vec<Weak<SlotMap>>> = parking_lot::const_mutex(Vec::new());

#[derive(Debug, Default)]
struct Slots {
    method: Option<(MethodTypeArgs, ClassId)>,
    constructor: Option<Descriptor>,
    deferred: Option<DeferredConstructorArgs>,
}

type SlotMap = RwLock<HashMap<ContextId, Arc<Mutex<Slots>>>>;

/// Per-context single-slot mailbox for call-site witnesses.
///
/// Slots are never shared between contexts, so the per-context mutex is uncontended; the
/// context registry lock is only written when a context first uses the channel or is released.
///
/// The channel is enabled while it has not been [disabled](WitnessChannel::disable) and no
/// [`SuppressGuard`] is alive.
#[derive(Debug)]
pub struct WitnessChannel {
    enabled: AtomicBool,
    suppressed: AtomicUsize,
    contexts: OnceLock<Arc<SlotMap>>,
}

impl Default for WitnessChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl WitnessChannel {
    /// A new, enabled channel.
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            suppressed: AtomicUsize::new(0),
            contexts: OnceLock::new(),
        }
    }

    /// The process-wide channel used by instrumented code.
    pub fn global() -> &'static WitnessChannel {
        GLOBAL.get_or_init(WitnessChannel::new)
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire) && self.suppressed.load(Ordering::Acquire) == 0
    }

    /// Disable the channel until the returned guard is dropped.
    ///
    /// Guards nest and may overlap across threads: the channel stays suppressed until the last
    /// outstanding guard is gone.
    #[must_use = "the channel is re-enabled as soon as the guard is dropped"]
    pub fn suppress(&self) -> SuppressGuard<'_> {
        self.suppressed.fetch_add(1, Ordering::AcqRel);
        SuppressGuard { channel: self }
    }

    pub fn push_method_witness(&self, args: MethodTypeArgs, caller: ClassId) {
        self.push_method_witness_in(ContextId::current(), args, caller)
    }

    pub fn push_method_witness_in(&self, ctx: ContextId, args: MethodTypeArgs, caller: ClassId) {
        if !self.is_enabled() {
            return;
        }
        self.slots(ctx).lock().method = Some((args, caller));
    }

    /// Take the pending method witness.
    ///
    /// With `expected_caller`, a witness pushed by a different class is discarded and `None` is
    /// returned. The slot is cleared either way.
    pub fn take_method_witness(&self, expected_caller: Option<ClassId>) -> Option<MethodTypeArgs> {
        self.take_method_witness_in(ContextId::current(), expected_caller)
    }

    pub fn take_method_witness_in(
        &self,
        ctx: ContextId,
        expected_caller: Option<ClassId>,
    ) -> Option<MethodTypeArgs> {
        if !self.is_enabled() {
            return None;
        }
        let (args, caller) = self.existing_slots(ctx)?.lock().method.take()?;
        match expected_caller {
            Some(expected) if expected != caller => {
                tracing::trace!(
                    target: "reify.witness",
                    expected = expected.to_raw(),
                    pushed_by = caller.to_raw(),
                    "discarding method witness pushed for another caller"
                );
                None
            }
            _ => Some(args),
        }
    }

    pub fn push_constructor_witness(&self, descriptor: Descriptor) {
        self.push_constructor_witness_in(ContextId::current(), descriptor)
    }

    pub fn push_constructor_witness_in(&self, ctx: ContextId, descriptor: Descriptor) {
        if !self.is_enabled() {
            return;
        }
        self.slots(ctx).lock().constructor = Some(descriptor);
    }

    pub fn take_constructor_witness(&self) -> Option<Descriptor> {
        self.take_constructor_witness_in(ContextId::current())
    }

    pub fn take_constructor_witness_in(&self, ctx: ContextId) -> Option<Descriptor> {
        if !self.is_enabled() {
            return None;
        }
        self.existing_slots(ctx)?.lock().constructor.take()
    }

    pub fn push_deferred_constructor_args(&self, collector: DeferredConstructorArgs) {
        self.push_deferred_constructor_args_in(ContextId::current(), collector)
    }

    pub fn push_deferred_constructor_args_in(
        &self,
        ctx: ContextId,
        collector: DeferredConstructorArgs,
    ) {
        if !self.is_enabled() {
            return;
        }
        self.slots(ctx).lock().deferred = Some(collector);
    }

    pub fn take_deferred_constructor_args(&self) -> Option<DeferredConstructorArgs> {
        self.take_deferred_constructor_args_in(ContextId::current())
    }

    pub fn take_deferred_constructor_args_in(
        &self,
        ctx: ContextId,
    ) -> Option<DeferredConstructorArgs> {
        if !self.is_enabled() {
            return None;
        }
        self.existing_slots(ctx)?.lock().deferred.take()
    }

    /// Push a constructor's own descriptor together with the collector its superclass
    /// constructors add to. Used before a `super(...)` call that forwards a collector.
    pub fn push_constructor(&self, descriptor: Descriptor, collector: DeferredConstructorArgs) {
        self.push_constructor_in(ContextId::current(), descriptor, collector)
    }

    pub fn push_constructor_in(
        &self,
        ctx: ContextId,
        descriptor: Descriptor,
        collector: DeferredConstructorArgs,
    ) {
        if !self.is_enabled() {
            return;
        }
        let slots = self.slots(ctx);
        let mut slots = slots.lock();
        slots.constructor = Some(descriptor);
        slots.deferred = Some(collector);
    }

    /// Drop every pending witness of `ctx` and forget the context.
    ///
    /// Threads release their own context from every channel when they exit; explicit contexts
    /// from [`ContextId::fresh`] must be released by their owner.
    pub fn release_context(&self, ctx: ContextId) {
        if let Some(contexts) = self.contexts.get() {
            release_from(contexts, ctx);
        }
    }

    /// Number of contexts that currently own a slot set.
    pub fn context_count(&self) -> usize {
        self.contexts.get().map_or(0, |contexts| contexts.read().len())
    }

    fn registry(&self) -> &SlotMap {
        self.contexts.get_or_init(|| {
            let contexts = Arc::new(RwLock::new(HashMap::new()));
            let mut live = LIVE_REGISTRIES.lock();
            live.retain(|registry| registry.strong_count() > 0);
            live.push(Arc::downgrade(&contexts));
            contexts
        })
    }

    fn existing_slots(&self, ctx: ContextId) -> Option<Arc<Mutex<Slots>>> {
        self.contexts.get()?.read().get(&ctx).cloned()
    }

    fn slots(&self, ctx: ContextId) -> Arc<Mutex<Slots>> {
        if let Some(slots) = self.existing_slots(ctx) {
            return slots;
        }
        Arc::clone(self.registry().write().entry(ctx).or_default())
    }
}

fn release_from(contexts: &SlotMap, ctx: ContextId) {
    if contexts.write().remove(&ctx).is_some() {
        tracing::trace!(
            target: "reify.witness",
            context = ctx.to_raw(),
            "released witness context"
        );
    }
}

/// Keeps its channel suppressed while alive. See [`WitnessChannel::suppress`].
#[derive(Debug)]
pub struct SuppressGuard<'a> {
    channel: &'a WitnessChannel,
}

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        self.channel.suppressed.fetch_sub(1, Ordering::AcqRel);
    }
}
