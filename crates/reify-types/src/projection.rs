//! Helpers that derive one descriptor from another along the class hierarchy.

use std::collections::{HashSet, VecDeque};

use crate::{render, ClassEnv, ClassId, Descriptor, ReifyError, Result};

/// Every generic supertype statically declared by `class` or one of its ancestors.
///
/// The result is ordered breadth-first (nearest declarations first) and free of duplicates.
pub fn generic_supertypes(env: &dyn ClassEnv, class: ClassId) -> Vec<Descriptor> {
    let mut out: Vec<Descriptor> = Vec::new();
    let mut queue = VecDeque::from([class]);
    let mut seen = HashSet::new();
    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        let Some(def) = env.class(current) else {
            continue;
        };
        for supertype in &def.generic_supertypes {
            if !out.contains(supertype) {
                out.push(supertype.clone());
            }
        }
        queue.extend(def.super_class);
        queue.extend(def.interfaces.iter().copied());
    }
    out
}

/// View `concrete` as `supertype`, keeping the arguments selected by `indices`.
///
/// `indices[i]` names the argument of `concrete` that becomes argument `i` of the supertype, so
/// `HashMap<K, V>` viewed as `Map` uses `[0, 1]`, and a class `Swapped<A, B> implements Map<B, A>`
/// uses `[1, 0]`. Raw descriptors stay raw.
pub fn to_super(
    env: &dyn ClassEnv,
    concrete: &Descriptor,
    supertype: ClassId,
    indices: &[usize],
) -> Result<Descriptor> {
    if indices.is_empty() {
        return Err(ReifyError::IndexOutOfRange { index: 0, len: 0 });
    }
    match concrete {
        Descriptor::Raw(_) => Ok(Descriptor::raw(supertype)),
        Descriptor::Parameterized { args, .. } => {
            let projected = indices
                .iter()
                .map(|&index| {
                    args.get(index)
                        .cloned()
                        .ok_or(ReifyError::IndexOutOfRange {
                            index,
                            len: args.len(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            Descriptor::parameterized(supertype, projected)
        }
        _ => Err(ReifyError::UnsupportedProjection {
            descriptor: render(env, concrete),
            reason: "only raw and parameterized descriptors have supertype views",
        }),
    }
}

/// Follow `path` through nested type arguments of `concrete`.
///
/// Each step indexes into the arguments of a parameterized descriptor; arrays and inner classes
/// are traversed transparently. A raw descriptor is expanded to its class with every argument
/// erased to `Object`. An empty path returns `concrete` itself.
pub fn arg_at(env: &dyn ClassEnv, concrete: &Descriptor, path: &[usize]) -> Result<Descriptor> {
    let Some((&index, rest)) = path.split_first() else {
        return Ok(concrete.clone());
    };
    match concrete {
        Descriptor::Parameterized { args, .. } => {
            let arg = args.get(index).ok_or(ReifyError::IndexOutOfRange {
                index,
                len: args.len(),
            })?;
            arg_at(env, arg, rest)
        }
        Descriptor::Raw(class) => {
            let expanded = erased_arguments(env, *class)?;
            arg_at(env, &expanded, path)
        }
        Descriptor::Array(component) => arg_at(env, component, path),
        Descriptor::InnerClass { inner, .. } => arg_at(env, inner, path),
        Descriptor::Class(_) => Err(ReifyError::UnsupportedProjection {
            descriptor: render(env, concrete),
            reason: "class descriptors carry no type arguments",
        }),
        Descriptor::Wildcard { .. } | Descriptor::Intersection(_) => {
            Err(ReifyError::UnsupportedProjection {
                descriptor: render(env, concrete),
                reason: "wildcards and intersections never describe a concrete object",
            })
        }
    }
}

fn erased_arguments(env: &dyn ClassEnv, class: ClassId) -> Result<Descriptor> {
    let arity = env.class(class).map_or(0, |def| def.type_params.len());
    let object = Descriptor::class(env.well_known().object);
    Descriptor::parameterized(class, vec![object; arity]).map_err(|_| {
        ReifyError::UnsupportedProjection {
            descriptor: render(env, &Descriptor::raw(class)),
            reason: "raw class declares no type parameters",
        }
    })
}
