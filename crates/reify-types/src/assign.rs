//! Variance-aware structural comparison of descriptors.
//!
//! The rules mirror erasure-based generics rather than full use-site variance:
//! - type arguments are always compared invariantly, whatever the outer variance;
//! - arrays are invariant in their component descriptor;
//! - raw usage of a generic class is invariant-compatible with any argument list.

use crate::{
    generic_supertypes, is_subclass, render, ClassEnv, ClassId, Descriptor, ReifyError, Result,
    Variance, WildcardKind,
};

/// Whether a value described by `actual` may be used where `expected` is required.
///
/// Returns [`ReifyError::InvalidComparison`] when either operand is ill-formed: an array of
/// wildcards, a wildcard bounded by another wildcard or by an intersection, or an inner class
/// nested in a non-class type.
/// Unrelated but well-formed shapes simply compare as not assignable.
pub fn is_assignable(
    env: &dyn ClassEnv,
    expected: &Descriptor,
    actual: &Descriptor,
    variance: Variance,
) -> Result<bool> {
    if let Some(reason) = expected
        .ill_formed_reason()
        .or_else(|| actual.ill_formed_reason())
    {
        return Err(ReifyError::InvalidComparison {
            expected: render(env, expected),
            actual: render(env, actual),
            variance,
            reason,
        });
    }
    Ok(assignable(env, expected, actual, variance))
}

pub(crate) fn assignable(
    env: &dyn ClassEnv,
    expected: &Descriptor,
    actual: &Descriptor,
    variance: Variance,
) -> bool {
    match expected {
        Descriptor::Class(class) => class_assignable(env, expected, *class, actual, variance),
        Descriptor::Parameterized { raw, args } => {
            parameterized_assignable(env, expected, *raw, args, actual, variance)
        }
        Descriptor::Raw(class) => raw_assignable(env, expected, *class, actual, variance),
        Descriptor::Array(component) => match actual {
            Descriptor::Array(actual_component) => {
                assignable(env, component, actual_component, Variance::Invariant)
            }
            // Only another array is comparable, even through a wildcard or intersection.
            _ => false,
        },
        Descriptor::InnerClass { outer, inner } => match actual {
            Descriptor::InnerClass {
                outer: actual_outer,
                inner: actual_inner,
            } => {
                assignable(env, outer, actual_outer, variance)
                    && assignable(env, inner, actual_inner, variance)
            }
            _ => false,
        },
        // Every bound is checked covariantly regardless of the requested variance. Against
        // another intersection, each bound must be met by one of the actual bounds.
        Descriptor::Intersection(bounds) => {
            let candidates: &[Descriptor] = match actual {
                Descriptor::Intersection(actual_bounds) => &actual_bounds[..],
                _ => std::slice::from_ref(actual),
            };
            bounds.iter().all(|bound| {
                candidates
                    .iter()
                    .any(|candidate| assignable(env, bound, candidate, Variance::Covariant))
            })
        }
        Descriptor::Wildcard { kind, bounds } => {
            let bound_variance = match kind {
                WildcardKind::Upper => Variance::Covariant,
                WildcardKind::Lower => Variance::Contravariant,
            };
            // A wildcard actual is compared bound to bound; the opposite kind never matches.
            let candidates: &[Descriptor] = match actual {
                Descriptor::Wildcard {
                    kind: actual_kind,
                    bounds: actual_bounds,
                } if actual_kind == kind => &actual_bounds[..],
                Descriptor::Wildcard { .. } => &[],
                _ => std::slice::from_ref(actual),
            };
            bounds.iter().any(|bound| {
                candidates
                    .iter()
                    .any(|candidate| assignable(env, bound, candidate, bound_variance))
            })
        }
    }
}

fn class_assignable(
    env: &dyn ClassEnv,
    expected: &Descriptor,
    class: ClassId,
    actual: &Descriptor,
    variance: Variance,
) -> bool {
    if variance == Variance::Invariant {
        return matches!(actual, Descriptor::Class(actual_class) if *actual_class == class);
    }
    if let Some(result) = unwrap_actual(env, expected, actual, variance) {
        return result;
    }
    match actual {
        Descriptor::Class(actual_class)
        | Descriptor::Raw(actual_class)
        | Descriptor::Parameterized {
            raw: actual_class, ..
        } => nominal(env, class, *actual_class, variance),
        _ => false,
    }
}

fn parameterized_assignable(
    env: &dyn ClassEnv,
    expected: &Descriptor,
    raw: ClassId,
    args: &[Descriptor],
    actual: &Descriptor,
    variance: Variance,
) -> bool {
    if variance == Variance::Invariant {
        return match actual {
            Descriptor::Raw(actual_class) => *actual_class == raw,
            Descriptor::Parameterized {
                raw: actual_raw,
                args: actual_args,
            } => *actual_raw == raw && arguments_match(env, args, actual_args),
            _ => false,
        };
    }
    if let Some(result) = unwrap_actual(env, expected, actual, variance) {
        return result;
    }
    match actual {
        Descriptor::Parameterized {
            raw: actual_raw,
            args: actual_args,
        } => nominal(env, raw, *actual_raw, variance) && arguments_match(env, args, actual_args),
        Descriptor::Raw(actual_class) => nominal(env, raw, *actual_class, variance),
        // A non-generic class stands for its statically declared generic supertypes.
        Descriptor::Class(actual_class) => {
            nominal(env, raw, *actual_class, variance)
                && generic_supertypes(env, *actual_class)
                    .iter()
                    .any(|supertype| assignable(env, expected, supertype, Variance::Invariant))
        }
        _ => false,
    }
}

fn raw_assignable(
    env: &dyn ClassEnv,
    expected: &Descriptor,
    class: ClassId,
    actual: &Descriptor,
    variance: Variance,
) -> bool {
    if variance == Variance::Invariant {
        return matches!(
            actual,
            Descriptor::Raw(actual_class) | Descriptor::Parameterized { raw: actual_class, .. }
                if *actual_class == class
        );
    }
    if let Some(result) = unwrap_actual(env, expected, actual, variance) {
        return result;
    }
    match actual {
        Descriptor::Class(actual_class)
        | Descriptor::Raw(actual_class)
        | Descriptor::Parameterized {
            raw: actual_class, ..
        } => nominal(env, class, *actual_class, variance),
        _ => false,
    }
}

/// Rules shared by the class-like expected sides when the actual side is a wildcard, an
/// intersection or an inner class. Returns `None` when `actual` is none of those.
fn unwrap_actual(
    env: &dyn ClassEnv,
    expected: &Descriptor,
    actual: &Descriptor,
    variance: Variance,
) -> Option<bool> {
    if variance == Variance::Invariant {
        return None;
    }
    match actual {
        Descriptor::Wildcard { .. } => {
            let bounds = match variance {
                Variance::Covariant => actual.upper_bounds(),
                Variance::Contravariant => actual.lower_bounds(),
                Variance::Invariant => return None,
            };
            Some(
                bounds
                    .iter()
                    .any(|bound| assignable(env, expected, bound, variance)),
            )
        }
        Descriptor::Intersection(bounds) => Some(
            bounds
                .iter()
                .any(|bound| assignable(env, expected, bound, variance)),
        ),
        Descriptor::InnerClass { inner, .. } => Some(assignable(env, expected, inner, variance)),
        _ => None,
    }
}

fn nominal(env: &dyn ClassEnv, expected: ClassId, actual: ClassId, variance: Variance) -> bool {
    match variance {
        Variance::Covariant => is_subclass(env, actual, expected),
        Variance::Contravariant => is_subclass(env, expected, actual),
        Variance::Invariant => expected == actual,
    }
}

fn arguments_match(env: &dyn ClassEnv, expected: &[Descriptor], actual: &[Descriptor]) -> bool {
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual)
            .all(|(e, a)| assignable(env, e, a, Variance::Invariant))
}
