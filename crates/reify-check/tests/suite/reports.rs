use insta::assert_snapshot;
use reify_check::{CheckLocationKind, CheckTarget, Mode};
use reify_store::Object;
use reify_types::{Descriptor, ReifyError};

use super::Fixture;

#[test]
fn distinct_sites_are_reported_separately() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Mode::Full);

    for site in ["Main!Main.java:3", "Main!Main.java:4", "Main!Main.java:3"] {
        verifier
            .check_cast(
                Some(&fixture.object),
                &fixture.list_integer,
                site,
                CheckLocationKind::Exit,
                CheckTarget::TypeParameter,
            )
            .unwrap();
    }
    assert_snapshot!(fixture.sink.lines().join("\n"), @r"
    Main.java:3: EXIT ArrayList<String> to List<Integer>
    Main.java:4: EXIT ArrayList<String> to List<Integer>
    ");
}

#[test]
fn unrecorded_objects_fall_back_to_the_erased_class() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Mode::Full);
    let map = fixture.env.class_id("java.util.Map").unwrap();
    let hash_map = fixture.env.class_id("java.util.HashMap").unwrap();
    let string = Descriptor::class(fixture.env.class_id("java.lang.String").unwrap());

    // Erasure says HashMap is a Map, so nothing is reported without a record.
    let untracked = Object::new(hash_map, ());
    let map_string =
        Descriptor::parameterized(map, vec![string.clone(), string.clone()]).unwrap();
    verifier
        .check_cast(
            Some(&untracked),
            &map_string,
            "Main!ok",
            CheckLocationKind::Cast,
            CheckTarget::ParameterizedType,
        )
        .unwrap();

    verifier
        .check_cast(
            Some(&untracked),
            &fixture.list_string,
            "Main!bad",
            CheckLocationKind::Cast,
            CheckTarget::ParameterizedType,
        )
        .unwrap();
    assert_snapshot!(fixture.sink.lines().join("\n"), @"bad: CAST java.util.HashMap to List<String>");
}

#[test]
fn ill_formed_expectations_are_contract_violations() {
    let fixture = Fixture::new();
    let verifier = fixture.verifier(Mode::Full);
    let any = Descriptor::unbounded_wildcard(fixture.env.as_ref());
    let bad = Descriptor::parameterized(fixture.list, vec![Descriptor::array(any)]).unwrap();

    let err = verifier
        .check_cast(
            Some(&fixture.object),
            &bad,
            "Main!bad",
            CheckLocationKind::Cast,
            CheckTarget::ParameterizedType,
        )
        .unwrap_err();
    assert!(matches!(err, ReifyError::InvalidComparison { .. }));
    assert_eq!(verifier.reported_sites(), 0);
}
