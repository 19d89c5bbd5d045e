use pretty_assertions::assert_eq;
use reify_store::{DescriptorStore, Object};
use reify_types::{ClassDef, ClassEnv, ClassKind, ClassRegistry, Descriptor, ReifyError};
use reify_witness::{DeferredConstructorArgs, WitnessChannel};

/// `class Base<T>` and `class Derived<T> extends Base<T>`, constructed as `new Derived<String>()`.
#[test]
fn superclass_witnesses_reach_the_store_only_after_the_chain_completes() {
    let mut env = ClassRegistry::with_minimal_jdk();
    let object = env.well_known().object;
    let base = env.add_class(ClassDef {
        type_params: vec!["T".into()],
        super_class: Some(object),
        ..ClassDef::new("com.example.Base", ClassKind::Class)
    });
    let derived = env.add_class(ClassDef {
        type_params: vec!["T".into()],
        super_class: Some(base),
        ..ClassDef::new("com.example.Derived", ClassKind::Class)
    });
    let string = Descriptor::class(env.class_id("java.lang.String").unwrap());
    let derived_string = Descriptor::parameterized(derived, vec![string.clone()]).unwrap();
    let base_string = Descriptor::parameterized(base, vec![string]).unwrap();

    let store = DescriptorStore::new();
    let channel = WitnessChannel::new();

    // Call site: `new Derived<String>()`.
    channel.push_constructor(derived_string.clone(), DeferredConstructorArgs::new());

    // Derived's constructor takes its witness and forwards the collector to `super(...)`.
    let own = channel.take_constructor_witness().unwrap();
    let collector = channel.take_deferred_constructor_args().unwrap();
    channel.push_constructor(base_string.clone(), collector.clone());

    // Base's constructor records its view but must not touch the store yet.
    let base_view = channel.take_constructor_witness().unwrap();
    let forwarded = channel.take_deferred_constructor_args().unwrap();
    assert!(forwarded.same_collector(&collector));
    forwarded.add(base, base_view).unwrap();

    let instance = Object::new(derived, ());
    assert_eq!(store.get(&instance, base), None);

    // Back in Derived, right after `super(...)` returns.
    collector.add(derived, own).unwrap();
    collector.flush(&store, &instance).unwrap();

    assert_eq!(store.get(&instance, base), Some(base_string));
    assert_eq!(store.get(&instance, derived), Some(derived_string));
    assert_eq!(
        collector.flush(&store, &instance),
        Err(ReifyError::AlreadyFlushed)
    );
}
