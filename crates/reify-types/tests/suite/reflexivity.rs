use proptest::prelude::*;
use reify_types::{is_assignable, ClassId, ClassRegistry, Descriptor, Variance};

fn ids(env: &ClassRegistry, names: &[&str]) -> Vec<ClassId> {
    names.iter().map(|name| env.class_id(name).unwrap()).collect()
}

fn is_class_type(descriptor: &Descriptor) -> bool {
    matches!(
        descriptor,
        Descriptor::Class(_)
            | Descriptor::Raw(_)
            | Descriptor::Parameterized { .. }
            | Descriptor::InnerClass { .. }
    )
}

/// Well-formed descriptors over the minimal JDK.
fn arb_descriptor(env: &ClassRegistry) -> impl Strategy<Value = Descriptor> {
    let plain = ids(
        env,
        &[
            "java.lang.Object",
            "java.lang.String",
            "java.lang.Number",
            "java.lang.Integer",
            "java.lang.CharSequence",
        ],
    );
    let generic = ids(
        env,
        &[
            "java.util.List",
            "java.util.ArrayList",
            "java.util.Collection",
            "java.lang.Comparable",
        ],
    );

    let leaf = prop_oneof![
        prop::sample::select(plain).prop_map(Descriptor::class),
        prop::sample::select(generic.clone()).prop_map(Descriptor::raw),
    ];

    leaf.prop_recursive(3, 24, 3, move |inner| {
        let not_wildcard = inner
            .clone()
            .prop_filter("wildcards only appear as type arguments", |d| {
                !matches!(d, Descriptor::Wildcard { .. })
            });
        let bound = not_wildcard
            .clone()
            .prop_filter("wildcard bounds are listed directly", |d| {
                !matches!(d, Descriptor::Intersection(_))
            });
        let outer = inner
            .clone()
            .prop_filter("outer must be a class type", is_class_type);

        prop_oneof![
            (
                prop::sample::select(generic.clone()),
                prop::collection::vec(inner.clone(), 1..3)
            )
                .prop_map(|(raw, args)| Descriptor::parameterized(raw, args).unwrap()),
            not_wildcard.clone().prop_map(Descriptor::array),
            (outer, not_wildcard.clone())
                .prop_map(|(outer, inner)| Descriptor::inner_class(outer, inner)),
            prop::collection::vec(not_wildcard, 2..4)
                .prop_map(|bounds| Descriptor::intersection(bounds).unwrap()),
            (any::<bool>(), prop::collection::vec(bound, 1..3)).prop_map(|(upper, bounds)| {
                if upper {
                    Descriptor::wildcard_upper(bounds).unwrap()
                } else {
                    Descriptor::wildcard_lower(bounds).unwrap()
                }
            }),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn every_descriptor_is_invariantly_assignable_to_itself(
        descriptor in arb_descriptor(&ClassRegistry::with_minimal_jdk())
    ) {
        let env = ClassRegistry::with_minimal_jdk();
        prop_assert_eq!(
            is_assignable(&env, &descriptor, &descriptor, Variance::Invariant),
            Ok(true)
        );
    }

    #[test]
    fn raw_and_parameterized_are_invariantly_interchangeable(
        descriptor in arb_descriptor(&ClassRegistry::with_minimal_jdk())
    ) {
        let env = ClassRegistry::with_minimal_jdk();
        if let Descriptor::Parameterized { raw, .. } = &descriptor {
            let raw = Descriptor::raw(*raw);
            prop_assert_eq!(
                is_assignable(&env, &raw, &descriptor, Variance::Invariant),
                Ok(true)
            );
            prop_assert_eq!(
                is_assignable(&env, &descriptor, &raw, Variance::Invariant),
                Ok(true)
            );
        }
    }
}
