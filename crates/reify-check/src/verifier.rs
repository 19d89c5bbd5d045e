use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use reify_config::Mode;
use reify_store::{DescriptorStore, Object, ObjectRef};
use reify_types::{render, ClassEnv, ClassId, Descriptor, Result};

use crate::{
    is_checked, is_instance, CastDiagnostic, CheckLocationKind, CheckTarget, DiagnosticSink,
    StdoutSink,
};

/// Where the verifier gets its mode from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSource {
    Fixed(Mode),
    /// Resolved from `REIFY_CONFIG_PATH`/`REIFY_MODE` on the first check, then frozen.
    Environment,
}

#[derive(Default)]
struct State {
    mode: Option<Mode>,
    reported: HashSet<String>,
}

/// Checks instrumented casts and reports each mismatching site once per verifier.
///
/// A single lock guards the lazily resolved mode and the set of reported sites. Diagnostics are
/// formatted and emitted after the lock is released.
pub struct CastVerifier {
    env: Arc<dyn ClassEnv + Send + Sync>,
    store: Arc<DescriptorStore>,
    source: ModeSource,
    sink: Arc<dyn DiagnosticSink>,
    state: Mutex<State>,
}

impl std::fmt::Debug for CastVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CastVerifier")
            .field("source", &self.source)
            .field("mode", &state.mode)
            .field("reported_sites", &state.reported.len())
            .finish_non_exhaustive()
    }
}

impl CastVerifier {
    /// A verifier that reads its mode from the environment and prints to stdout.
    pub fn new(env: Arc<dyn ClassEnv + Send + Sync>, store: Arc<DescriptorStore>) -> Self {
        Self {
            env,
            store,
            source: ModeSource::Environment,
            sink: Arc::new(StdoutSink),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.source = ModeSource::Fixed(mode);
        self
    }

    pub fn with_mode_source(mut self, source: ModeSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The effective mode, resolving it on first use.
    pub fn mode(&self) -> Mode {
        self.resolve_mode(&mut self.state.lock())
    }

    /// Number of distinct sites reported so far.
    pub fn reported_sites(&self) -> usize {
        self.state.lock().reported.len()
    }

    /// Verify a cast of `object` to `expected` at `site`, returning `object` unchanged.
    ///
    /// `site` is an opaque location id; the text after its first `!` is shown in diagnostics.
    /// A mismatch is reported at most once per site and never alters the result. The only error
    /// is an ill-formed `expected` descriptor.
    pub fn check_cast<'a>(
        &self,
        object: Option<&'a ObjectRef>,
        expected: &Descriptor,
        site: &str,
        kind: CheckLocationKind,
        target: CheckTarget,
    ) -> Result<Option<&'a ObjectRef>> {
        let mode = self.mode();
        let Some(obj) = object else {
            return Ok(None);
        };
        if !is_checked(mode, kind, target) {
            return Ok(object);
        }

        if is_instance(self.env.as_ref(), &self.store, obj, expected)? {
            return Ok(object);
        }

        let newly_seen = self.state.lock().reported.insert(site.to_owned());
        if newly_seen {
            let diagnostic = self.diagnostic(obj, expected, site, kind);
            tracing::warn!(
                target: "reify.check",
                site = %diagnostic.site,
                kind = %diagnostic.kind,
                actual = %diagnostic.actual,
                expected = %diagnostic.expected,
                "generic cast does not match the reified type"
            );
            self.sink.report(&diagnostic);
        }
        Ok(object)
    }

    fn resolve_mode(&self, state: &mut State) -> Mode {
        if let Some(mode) = state.mode {
            return mode;
        }
        let mode = match self.source {
            ModeSource::Fixed(mode) => mode,
            ModeSource::Environment => reify_config::resolve_mode(),
        };
        tracing::debug!(target: "reify.check", %mode, "resolved cast verification mode");
        state.mode = Some(mode);
        mode
    }

    fn diagnostic(
        &self,
        object: &Object,
        expected: &Descriptor,
        site: &str,
        kind: CheckLocationKind,
    ) -> CastDiagnostic {
        let env = self.env.as_ref();
        let class = reported_class(env, object.class());
        let actual = match self.store.get(object, class) {
            Some(stored) => render(env, &stored),
            None => env.class(class).map_or_else(
                || render(env, &Descriptor::class(class)),
                |def| def.name.clone(),
            ),
        };
        CastDiagnostic {
            site: site.split_once('!').map_or(site, |(_, rest)| rest).to_owned(),
            kind,
            actual,
            expected: render(env, expected),
        }
    }
}

/// Anonymous classes are reported as the interface (or class) they implement.
fn reported_class(env: &dyn ClassEnv, class: ClassId) -> ClassId {
    match env.class(class) {
        Some(def) if def.is_anonymous => def
            .interfaces
            .first()
            .copied()
            .or(def.super_class)
            .unwrap_or(class),
        _ => class,
    }
}
