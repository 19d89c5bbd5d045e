//! Reified generic type descriptors.
//!
//! Generic type arguments are erased at runtime; this crate models what an object's generic type
//! actually is, as a closed set of [`Descriptor`] shapes, and decides whether one descriptor may
//! stand in for another under a given [`Variance`].
//!
//! The crate is pure: no global state, no locking. Class metadata is supplied by the host through
//! [`ClassEnv`].

mod assign;
mod class;
mod descriptor;
mod error;
mod format;
mod method;
mod projection;
mod signature;

pub use assign::is_assignable;
pub use class::{
    is_subclass, simple_name, ClassDef, ClassEnv, ClassId, ClassKind, ClassRegistry,
    WellKnownClasses,
};
pub use descriptor::{Descriptor, Variance, WildcardKind};
pub use error::{ReifyError, Result};
pub use format::{render, render_method_args, DescriptorDisplay};
pub use method::MethodTypeArgs;
pub use projection::{arg_at, generic_supertypes, to_super};
pub use signature::{parse_signature, SignatureParser};
