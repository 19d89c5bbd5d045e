//! Call-site witness channel.
//!
//! Instrumented call sites deposit a witness (method type arguments, a constructor descriptor,
//! or a deferred-constructor collector) right before the call; the entered frame takes it right
//! after. Every slot holds at most one value and every take clears it.

mod channel;
mod deferred;

pub use channel::{ContextId, SuppressGuard, WitnessChannel};
pub use deferred::DeferredConstructorArgs;
