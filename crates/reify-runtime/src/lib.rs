//! The reification runtime: one place exposing every entry point instrumented code calls.
//!
//! A call site builds a descriptor, pushes it on the [`WitnessChannel`], and calls the
//! constructor or method. Constructors take the witness and flush it into the
//! [`DescriptorStore`]; casts later consult the store through the [`CastVerifier`].

use std::any::Any;
use std::sync::Arc;

use reify_check::{CastVerifier, CheckLocationKind, CheckTarget, DiagnosticSink, ModeSource};
use reify_config::{ConfigError, ReifyConfig};
use reify_store::{DescriptorStore, Object, ObjectRef};
use reify_types::{ClassEnv, ClassId, Descriptor, MethodTypeArgs, Result};
use reify_witness::{DeferredConstructorArgs, WitnessChannel};

pub use reify_check::Mode;

pub struct ReificationRuntime {
    env: Arc<dyn ClassEnv + Send + Sync>,
    store: Arc<DescriptorStore>,
    channel: WitnessChannel,
    verifier: CastVerifier,
}

impl std::fmt::Debug for ReificationRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReificationRuntime")
            .field("store", &self.store)
            .field("channel", &self.channel)
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl ReificationRuntime {
    /// A runtime configured explicitly; the verification mode is fixed to the configured one.
    pub fn new(env: Arc<dyn ClassEnv + Send + Sync>, config: &ReifyConfig) -> Self {
        Self::build(env, config, ModeSource::Fixed(config.verification.mode))
    }

    /// A runtime configured from `REIFY_CONFIG_PATH`, with logging installed.
    ///
    /// The verification mode is resolved on the first checked cast, honouring `REIFY_MODE`.
    pub fn from_environment(
        env: Arc<dyn ClassEnv + Send + Sync>,
    ) -> std::result::Result<Self, ConfigError> {
        let config = ReifyConfig::from_environment()?;
        reify_config::init_tracing(&config.logging);
        Ok(Self::build(env, &config, ModeSource::Environment))
    }

    fn build(
        env: Arc<dyn ClassEnv + Send + Sync>,
        config: &ReifyConfig,
        source: ModeSource,
    ) -> Self {
        let store = Arc::new(DescriptorStore::new());
        let channel = WitnessChannel::new();
        if !config.witness.enabled {
            channel.disable();
        }
        let verifier = CastVerifier::new(env.clone(), store.clone()).with_mode_source(source);
        Self {
            env,
            store,
            channel,
            verifier,
        }
    }

    /// Route cast diagnostics to `sink` instead of stdout.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.verifier = self.verifier.with_sink(sink);
        self
    }

    pub fn env(&self) -> &dyn ClassEnv {
        self.env.as_ref()
    }

    pub fn store(&self) -> &DescriptorStore {
        &self.store
    }

    pub fn channel(&self) -> &WitnessChannel {
        &self.channel
    }

    pub fn verifier(&self) -> &CastVerifier {
        &self.verifier
    }

    /// Instantiate `class` the way an instrumented constructor does.
    ///
    /// Takes the pending constructor witness and collector, creates the object, then flushes the
    /// collector together with the object's own descriptor (if any) into the store.
    pub fn construct(&self, class: ClassId, payload: impl Any + Send + Sync) -> Result<ObjectRef> {
        self.finish_construction(class, |class| Object::new(class, payload))
    }

    /// Like [`ReificationRuntime::construct`] for an inner class bound to `outer`.
    pub fn construct_inner(
        &self,
        class: ClassId,
        outer: ObjectRef,
        payload: impl Any + Send + Sync,
    ) -> Result<ObjectRef> {
        self.finish_construction(class, |class| Object::new_inner(class, outer, payload))
    }

    fn finish_construction(
        &self,
        class: ClassId,
        allocate: impl FnOnce(ClassId) -> ObjectRef,
    ) -> Result<ObjectRef> {
        let own = self.channel.take_constructor_witness();
        let collector = self
            .channel
            .take_deferred_constructor_args()
            .unwrap_or_default();

        let object = allocate(class);
        if let Some(descriptor) = own {
            collector.add(class, descriptor)?;
        }
        let recorded = collector.len();
        collector.flush(&self.store, &object)?;
        tracing::trace!(
            target: "reify.runtime",
            class = class.to_raw(),
            recorded,
            "constructed instrumented object"
        );
        Ok(object)
    }

    pub fn push_method_witness(&self, args: MethodTypeArgs, caller: ClassId) {
        self.channel.push_method_witness(args, caller);
    }

    pub fn take_method_witness(&self, expected_caller: Option<ClassId>) -> Option<MethodTypeArgs> {
        self.channel.take_method_witness(expected_caller)
    }

    pub fn push_constructor_witness(&self, descriptor: Descriptor) {
        self.channel.push_constructor_witness(descriptor);
    }

    pub fn take_constructor_witness(&self) -> Option<Descriptor> {
        self.channel.take_constructor_witness()
    }

    pub fn push_constructor(&self, descriptor: Descriptor, collector: DeferredConstructorArgs) {
        self.channel.push_constructor(descriptor, collector);
    }

    pub fn take_deferred_constructor_args(&self) -> Option<DeferredConstructorArgs> {
        self.channel.take_deferred_constructor_args()
    }

    pub fn put(
        &self,
        object: &ObjectRef,
        supertype: ClassId,
        descriptor: Descriptor,
    ) -> Result<()> {
        self.store.put(object, supertype, descriptor)
    }

    pub fn get(&self, object: &Object, supertype: ClassId) -> Option<Descriptor> {
        self.store.get(object, supertype)
    }

    pub fn check_cast<'a>(
        &self,
        object: Option<&'a ObjectRef>,
        expected: &Descriptor,
        site: &str,
        kind: CheckLocationKind,
        target: CheckTarget,
    ) -> Result<Option<&'a ObjectRef>> {
        self.verifier.check_cast(object, expected, site, kind, target)
    }
}
