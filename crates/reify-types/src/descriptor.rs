use std::sync::Arc;

use crate::{ClassEnv, ClassId, ReifyError, Result};

/// Direction of a descriptor comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variance {
    Covariant,
    Contravariant,
    Invariant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    /// `? extends B`
    Upper,
    /// `? super B`
    Lower,
}

/// A reified generic type shape.
///
/// Descriptors are immutable values compared by content. Child nodes are reference counted, so
/// cloning is cheap and descriptors can be shared freely across threads.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Descriptor {
    /// A non-generic nominal type.
    Class(ClassId),
    /// A generic class applied to a non-empty argument list.
    Parameterized {
        raw: ClassId,
        args: Arc<[Descriptor]>,
    },
    /// A generic class used without type arguments.
    Raw(ClassId),
    Array(Arc<Descriptor>),
    /// A nested class type; `outer` is the (possibly parameterized) enclosing type.
    InnerClass {
        outer: Arc<Descriptor>,
        inner: Arc<Descriptor>,
    },
    /// Conjunction of at least two bounds.
    Intersection(Arc<[Descriptor]>),
    Wildcard {
        kind: WildcardKind,
        bounds: Arc<[Descriptor]>,
    },
}

impl Descriptor {
    pub fn class(class: ClassId) -> Self {
        Descriptor::Class(class)
    }

    pub fn raw(class: ClassId) -> Self {
        Descriptor::Raw(class)
    }

    pub fn parameterized(raw: ClassId, args: Vec<Descriptor>) -> Result<Self> {
        if args.is_empty() {
            return Err(ReifyError::EmptyArguments);
        }
        Ok(Descriptor::Parameterized {
            raw,
            args: args.into(),
        })
    }

    pub fn array(component: Descriptor) -> Self {
        Descriptor::Array(Arc::new(component))
    }

    pub fn inner_class(outer: Descriptor, inner: Descriptor) -> Self {
        Descriptor::InnerClass {
            outer: Arc::new(outer),
            inner: Arc::new(inner),
        }
    }

    pub fn intersection(bounds: Vec<Descriptor>) -> Result<Self> {
        if bounds.len() < 2 {
            return Err(ReifyError::IntersectionTooSmall(bounds.len()));
        }
        Ok(Descriptor::Intersection(bounds.into()))
    }

    pub fn wildcard_upper(bounds: Vec<Descriptor>) -> Result<Self> {
        Self::wildcard(WildcardKind::Upper, bounds)
    }

    pub fn wildcard_lower(bounds: Vec<Descriptor>) -> Result<Self> {
        Self::wildcard(WildcardKind::Lower, bounds)
    }

    /// `?`, i.e. `? extends Object`.
    pub fn unbounded_wildcard(env: &dyn ClassEnv) -> Self {
        Descriptor::Wildcard {
            kind: WildcardKind::Upper,
            bounds: Arc::from([Descriptor::Class(env.well_known().object)]),
        }
    }

    fn wildcard(kind: WildcardKind, bounds: Vec<Descriptor>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(ReifyError::EmptyWildcardBounds);
        }
        Ok(Descriptor::Wildcard {
            kind,
            bounds: bounds.into(),
        })
    }

    /// The erased class this descriptor denotes, if it denotes exactly one.
    ///
    /// Arrays erase to their component's class only when the host interns array classes, so they
    /// report `None` here like wildcards and intersections.
    pub fn erasure(&self) -> Option<ClassId> {
        match self {
            Descriptor::Class(class) | Descriptor::Raw(class) => Some(*class),
            Descriptor::Parameterized { raw, .. } => Some(*raw),
            Descriptor::InnerClass { inner, .. } => inner.erasure(),
            Descriptor::Array(_) | Descriptor::Intersection(_) | Descriptor::Wildcard { .. } => {
                None
            }
        }
    }

    /// Upper bounds of a wildcard (empty for `? super`).
    pub fn upper_bounds(&self) -> &[Descriptor] {
        match self {
            Descriptor::Wildcard {
                kind: WildcardKind::Upper,
                bounds,
            } => bounds,
            _ => &[],
        }
    }

    /// Lower bounds of a wildcard (empty for `? extends`).
    pub fn lower_bounds(&self) -> &[Descriptor] {
        match self {
            Descriptor::Wildcard {
                kind: WildcardKind::Lower,
                bounds,
            } => bounds,
            _ => &[],
        }
    }

    /// Reason this descriptor cannot take part in a comparison, if any.
    pub(crate) fn ill_formed_reason(&self) -> Option<&'static str> {
        match self {
            Descriptor::Class(_) | Descriptor::Raw(_) => None,
            Descriptor::Parameterized { args, .. } => {
                args.iter().find_map(Descriptor::ill_formed_reason)
            }
            Descriptor::Array(component) => match &**component {
                Descriptor::Wildcard { .. } => Some("array component cannot be a wildcard"),
                other => other.ill_formed_reason(),
            },
            Descriptor::InnerClass { outer, inner } => match &**outer {
                Descriptor::Array(_) | Descriptor::Wildcard { .. } | Descriptor::Intersection(_) => {
                    Some("inner class outer type must be a class type")
                }
                _ => outer.ill_formed_reason().or_else(|| inner.ill_formed_reason()),
            },
            Descriptor::Intersection(bounds) => {
                bounds.iter().find_map(Descriptor::ill_formed_reason)
            }
            Descriptor::Wildcard { bounds, .. } => bounds.iter().find_map(|bound| match bound {
                Descriptor::Wildcard { .. } => Some("wildcard bound cannot be a wildcard"),
                // Multiple bounds are listed on the wildcard itself.
                Descriptor::Intersection(_) => Some("wildcard bound cannot be an intersection"),
                other => other.ill_formed_reason(),
            }),
        }
    }
}
