use std::sync::Arc;

use crate::{Descriptor, ReifyError, Result};

/// The type arguments a call site passes to a generic method, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodTypeArgs {
    args: Arc<[Descriptor]>,
}

impl MethodTypeArgs {
    pub fn new(args: Vec<Descriptor>) -> Result<Self> {
        if args.is_empty() {
            return Err(ReifyError::EmptyMethodWitness);
        }
        Ok(Self { args: args.into() })
    }

    /// The argument for the method type parameter at `index`.
    pub fn arg(&self, index: usize) -> Result<&Descriptor> {
        self.args.get(index).ok_or(ReifyError::IndexOutOfRange {
            index,
            len: self.args.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.args.iter()
    }
}
