use std::sync::Arc;

use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use reify_check::{CheckLocationKind, CheckTarget, MemorySink};
use reify_config::{
    with_config_env_lock, ReifyConfig, VerificationConfig, REIFY_CONFIG_ENV_VAR,
    REIFY_MODE_ENV_VAR,
};
use reify_runtime::{Mode, ReificationRuntime};
use reify_types::{ClassDef, ClassEnv, ClassId, ClassKind, ClassRegistry, Descriptor};
use reify_witness::DeferredConstructorArgs;

/// The minimal JDK plus `class Box<T>`.
fn env() -> (Arc<ClassRegistry>, ClassId) {
    let mut env = ClassRegistry::with_minimal_jdk();
    let object = env.well_known().object;
    let boxed = env.add_class(ClassDef {
        type_params: vec!["T".into()],
        super_class: Some(object),
        ..ClassDef::new("com.example.Box", ClassKind::Class)
    });
    (Arc::new(env), boxed)
}

fn config(mode: Mode) -> ReifyConfig {
    ReifyConfig {
        verification: VerificationConfig { mode },
        ..ReifyConfig::default()
    }
}

fn class(env: &ClassRegistry, name: &str) -> Descriptor {
    Descriptor::class(env.class_id(name).unwrap())
}

#[test]
fn mismatched_box_cast_is_reported_once_and_passes_through() {
    let (env, boxed) = env();
    let sink = Arc::new(MemorySink::new(16));
    let runtime =
        ReificationRuntime::new(env.clone(), &config(Mode::Full)).with_sink(sink.clone());

    let box_string =
        Descriptor::parameterized(boxed, vec![class(&env, "java.lang.String")]).unwrap();
    let box_integer =
        Descriptor::parameterized(boxed, vec![class(&env, "java.lang.Integer")]).unwrap();

    // `new Box<String>("hello")`
    runtime.push_constructor_witness(box_string.clone());
    let object = runtime.construct(boxed, String::from("hello")).unwrap();
    assert_eq!(runtime.get(&object, boxed), Some(box_string));

    // `Box<Integer> b = (Box<Integer>) o;`
    for _ in 0..3 {
        let out = runtime
            .check_cast(
                Some(&object),
                &box_integer,
                "com/example/Main!Main.java:12",
                CheckLocationKind::Storage,
                CheckTarget::TypeParameter,
            )
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(out, &object));
        assert_eq!(out.payload::<String>().map(String::as_str), Some("hello"));
    }

    assert_snapshot!(
        sink.lines().join("\n"),
        @"Main.java:12: STORAGE Box<String> to Box<Integer>"
    );
}

#[test]
fn constructor_chain_records_every_supertype_view() {
    let mut registry = ClassRegistry::with_minimal_jdk();
    let object_class = registry.well_known().object;
    let base = registry.add_class(ClassDef {
        type_params: vec!["T".into()],
        super_class: Some(object_class),
        ..ClassDef::new("com.example.Base", ClassKind::Class)
    });
    let derived = registry.add_class(ClassDef {
        type_params: vec!["K".into(), "V".into()],
        super_class: Some(base),
        ..ClassDef::new("com.example.Derived", ClassKind::Class)
    });
    let env = Arc::new(registry);
    let runtime = ReificationRuntime::new(env.clone(), &config(Mode::Disabled));

    let string = class(&env, "java.lang.String");
    let integer = class(&env, "java.lang.Integer");
    let derived_view =
        Descriptor::parameterized(derived, vec![string.clone(), integer.clone()]).unwrap();
    let base_view = reify_types::to_super(env.as_ref(), &derived_view, base, &[1]).unwrap();

    // Derived's constructor forwards a collector to Base's, which adds its own view.
    let collector = DeferredConstructorArgs::new();
    collector.add(base, base_view.clone()).unwrap();
    runtime.push_constructor(derived_view.clone(), collector.clone());

    let object = runtime.construct(derived, ()).unwrap();
    assert!(collector.is_flushed());
    assert_eq!(runtime.get(&object, derived), Some(derived_view));
    assert_eq!(runtime.get(&object, base), Some(base_view));
    assert_eq!(
        runtime.get(&object, base).map(|d| reify_types::render(env.as_ref(), &d)),
        Some("Base<Integer>".to_owned())
    );
}

#[test]
fn uninstrumented_construction_records_nothing() {
    let (env, boxed) = env();
    let runtime = ReificationRuntime::new(env, &config(Mode::Full));

    let object = runtime.construct(boxed, ()).unwrap();
    assert_eq!(runtime.get(&object, boxed), None);
    assert!(runtime.store().is_empty());
}

#[test]
fn disabled_witness_channel_from_config() {
    let (env, boxed) = env();
    let config = ReifyConfig::load_from_str("[witness]\nenabled = false\n").unwrap();
    let runtime = ReificationRuntime::new(env.clone(), &config);

    runtime.push_constructor_witness(Descriptor::raw(boxed));
    let object = runtime.construct(boxed, ()).unwrap();
    assert_eq!(runtime.get(&object, boxed), None);
    assert!(!runtime.channel().is_enabled());
}

#[test]
fn environment_mode_is_resolved_on_first_check() {
    let (env, boxed) = env();
    let sink = Arc::new(MemorySink::new(4));

    let runtime = with_config_env_lock(|| {
        std::env::remove_var(REIFY_CONFIG_ENV_VAR);
        std::env::set_var(REIFY_MODE_ENV_VAR, "MINIMAL");
        let runtime = ReificationRuntime::from_environment(env.clone())
            .unwrap()
            .with_sink(sink.clone());
        assert_eq!(runtime.verifier().mode(), Mode::Minimal);
        std::env::remove_var(REIFY_MODE_ENV_VAR);
        runtime
    });

    // Frozen: clearing the variable does not change the resolved mode.
    assert_eq!(runtime.verifier().mode(), Mode::Minimal);

    runtime.push_constructor_witness(
        Descriptor::parameterized(boxed, vec![class(&env, "java.lang.String")]).unwrap(),
    );
    let object = runtime.construct(boxed, ()).unwrap();
    let box_integer =
        Descriptor::parameterized(boxed, vec![class(&env, "java.lang.Integer")]).unwrap();
    for (site, kind) in [
        ("Main!cast", CheckLocationKind::Cast),
        ("Main!store", CheckLocationKind::Storage),
    ] {
        runtime
            .check_cast(Some(&object), &box_integer, site, kind, CheckTarget::TypeParameter)
            .unwrap();
    }
    assert_eq!(sink.lines(), vec!["store: STORAGE Box<String> to Box<Integer>"]);
}

#[test]
fn inner_objects_are_checked_against_their_outer_instance() {
    let mut registry = ClassRegistry::with_minimal_jdk();
    let object_class = registry.well_known().object;
    let outer = registry.add_class(ClassDef {
        type_params: vec!["T".into()],
        super_class: Some(object_class),
        ..ClassDef::new("com.example.Outer", ClassKind::Class)
    });
    let inner = registry.add_class(ClassDef {
        super_class: Some(object_class),
        ..ClassDef::new("com.example.Outer$Inner", ClassKind::Class)
    });
    let env = Arc::new(registry);
    let sink = Arc::new(MemorySink::new(4));
    let runtime =
        ReificationRuntime::new(env.clone(), &config(Mode::Full)).with_sink(sink.clone());

    let outer_of = |arg: &str| Descriptor::parameterized(outer, vec![class(&env, arg)]).unwrap();
    runtime.push_constructor_witness(outer_of("java.lang.String"));
    let outer_object = runtime.construct(outer, ()).unwrap();
    let inner_object = runtime
        .construct_inner(inner, outer_object.clone(), ())
        .unwrap();
    assert!(inner_object
        .outer_instance()
        .is_some_and(|o| Arc::ptr_eq(o, &outer_object)));

    for (arg, line) in [("java.lang.String", 20), ("java.lang.Integer", 21)] {
        let expected = Descriptor::inner_class(outer_of(arg), Descriptor::class(inner));
        runtime
            .check_cast(
                Some(&inner_object),
                &expected,
                &format!("com/example/Outer!Outer.java:{line}"),
                CheckLocationKind::Cast,
                CheckTarget::ParameterizedType,
            )
            .unwrap();
    }
    assert_eq!(
        sink.lines(),
        vec!["Outer.java:21: CAST com.example.Outer$Inner to Outer<Integer>.Inner"]
    );
}
