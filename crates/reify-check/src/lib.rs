//! Runtime verification of generic casts.
//!
//! Erasure-based code trusts every generic cast. [`CastVerifier`] double-checks instrumented
//! casts against the descriptors recorded in the store and reports each mismatching site once.
//! It never rejects a cast.

mod instance;
mod location;
mod sink;
mod verifier;

pub use instance::is_instance;
pub use location::{is_checked, CheckLocationKind, CheckTarget, UnknownName};
pub use reify_config::Mode;
pub use sink::{CastDiagnostic, DiagnosticSink, MemorySink, StdoutSink};
pub use verifier::{CastVerifier, ModeSource};
