use reify_store::{DescriptorStore, Object};
use reify_types::{is_assignable, is_subclass, ClassEnv, ClassId, Descriptor, Result, Variance};

/// Whether `object` is an instance of `expected`, using reified descriptors where recorded.
///
/// Parts of `expected` with nothing recorded in `store` fall back to the nominal check against
/// the erased class. An inner-class expectation whose object has no known outer instance only
/// checks the inner part.
pub fn is_instance(
    env: &dyn ClassEnv,
    store: &DescriptorStore,
    object: &Object,
    expected: &Descriptor,
) -> Result<bool> {
    match expected {
        Descriptor::Class(class) => Ok(is_subclass(env, object.class(), *class)),
        Descriptor::Raw(class) | Descriptor::Parameterized { raw: class, .. } => {
            validate(env, store, object, expected, *class)
        }
        Descriptor::Array(_) => {
            let is_array = env
                .class(object.class())
                .is_some_and(|def| def.is_array());
            if !is_array {
                return Ok(false);
            }
            validate(env, store, object, expected, object.class())
        }
        Descriptor::InnerClass { outer, inner } => {
            if !is_instance(env, store, object, inner)? {
                return Ok(false);
            }
            match object.outer_instance() {
                Some(outer_object) => is_instance(env, store, outer_object, outer),
                None => Ok(true),
            }
        }
        Descriptor::Intersection(bounds) => {
            for bound in bounds.iter() {
                if !is_instance(env, store, object, bound)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Descriptor::Wildcard { .. } => match store.get(object, object.class()) {
            Some(actual) => is_assignable(env, expected, &actual, Variance::Covariant),
            None => Ok(true),
        },
    }
}

fn validate(
    env: &dyn ClassEnv,
    store: &DescriptorStore,
    object: &Object,
    expected: &Descriptor,
    supertype: ClassId,
) -> Result<bool> {
    match store.get(object, supertype) {
        Some(actual) => is_assignable(env, expected, &actual, Variance::Covariant),
        None => Ok(is_subclass(env, object.class(), supertype)),
    }
}
