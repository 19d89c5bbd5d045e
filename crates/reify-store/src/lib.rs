//! Descriptor storage keyed by object identity.
//!
//! Objects are shared as [`ObjectRef`] handles. The store only ever holds weak references to
//! them: once the last strong handle is dropped, the object reports its identity to every store
//! that registered it, and the next store operation discards the stale entry.

mod object;
mod store;

pub use object::{Object, ObjectIdentity, ObjectRef, ReclamationQueue};
pub use store::{DescriptorStore, MAX_SUPERTYPES_PER_KEY};
