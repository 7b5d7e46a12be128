//! Multi-supertype inheritance: obligations, conflicts, and clashes that
//! only appear when two unrelated ancestors meet in one type.

use pretty_assertions::assert_eq;
use ridge_types::{ClassDef, MethodDef, Type, TypeEnv, TypeStore};
use ridge_verify::{verify, CompatibilityMode, DiagnosticKind, VerifyOutcome};

fn kinds(outcome: &VerifyOutcome) -> Vec<DiagnosticKind> {
    outcome.diagnostics.iter().map(|d| d.kind).collect()
}

#[test]
fn one_obligation_per_erased_signature() {
    // interface I { void m(); } ; interface J { void m(); }
    // class C implements I, J  -- one diagnostic, not one per interface
    let mut store = TypeStore::with_minimal_jdk();
    let i = store.add_class(ClassDef {
        methods: vec![MethodDef::new("m", vec![], Type::Void)],
        ..ClassDef::interface("com.example.I")
    });
    let j = store.add_class(ClassDef {
        methods: vec![MethodDef::new("m", vec![], Type::Void)],
        ..ClassDef::interface("com.example.J")
    });
    let c = store.add_class(ClassDef {
        interfaces: vec![Type::class(i, vec![]), Type::class(j, vec![])],
        ..ClassDef::class("com.example.C")
    });

    let outcome = verify(&store, &[i, j, c], CompatibilityMode::default());
    assert_eq!(kinds(&outcome), vec![DiagnosticKind::MustImplementAbstract]);
    // Attributed to the closest declaration, the first interface listed.
    assert_eq!(
        outcome.diagnostics[0].method.as_ref().unwrap().class_name,
        "com.example.I"
    );
}

#[test]
fn inherited_concrete_method_satisfies_interface() {
    // class Base { public void m() } ; class C extends Base implements I
    let mut store = TypeStore::with_minimal_jdk();
    let i = store.add_class(ClassDef {
        methods: vec![MethodDef::new("m", vec![], Type::Void)],
        ..ClassDef::interface("com.example.I")
    });
    let base = store.add_class(ClassDef {
        methods: vec![MethodDef::new("m", vec![], Type::Void)],
        ..ClassDef::class("com.example.Base")
    });
    let c = store.add_class(ClassDef {
        super_class: Some(Type::class(base, vec![])),
        interfaces: vec![Type::class(i, vec![])],
        ..ClassDef::class("com.example.C")
    });

    let outcome = verify(&store, &[i, base, c], CompatibilityMode::default());
    assert!(outcome.is_clean());
}

#[test]
fn superclass_already_implementing_the_interface_is_clean() {
    // class Base implements I { public void m() } ; class C extends Base
    let mut store = TypeStore::with_minimal_jdk();
    let i = store.add_class(ClassDef {
        methods: vec![MethodDef::new("m", vec![], Type::Void)],
        ..ClassDef::interface("com.example.I")
    });
    let base = store.add_class(ClassDef {
        methods: vec![MethodDef::new("m", vec![], Type::Void)],
        interfaces: vec![Type::class(i, vec![])],
        ..ClassDef::class("com.example.Base")
    });
    let c = store.add_class(ClassDef {
        super_class: Some(Type::class(base, vec![])),
        ..ClassDef::class("com.example.C")
    });

    let outcome = verify(&store, &[i, base, c], CompatibilityMode::default());
    assert!(outcome.is_clean());
}

#[test]
fn abstract_obligation_attributed_with_declared_overrider() {
    // class Base { void m(Box<String>) {} }
    // interface I { void m(Box<Integer>); }
    // class C extends Base implements I { void m(Box<String>) {} }
    // C overrides the class method but leaves the interface method
    // erasure-incompatible.
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let string = store.well_known().string;
    let integer = store.well_known().integer;

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    let boxed = store.add_class(ClassDef {
        type_params: vec![t],
        ..ClassDef::class("com.example.Box")
    });
    let base = store.add_class(ClassDef {
        methods: vec![MethodDef::new(
            "m",
            vec![Type::class(boxed, vec![Type::class(string, vec![])])],
            Type::Void,
        )],
        ..ClassDef::class("com.example.Base")
    });
    let i = store.add_class(ClassDef {
        methods: vec![MethodDef::new(
            "m",
            vec![Type::class(boxed, vec![Type::class(integer, vec![])])],
            Type::Void,
        )],
        ..ClassDef::interface("com.example.I")
    });
    let c = store.add_class(ClassDef {
        methods: vec![MethodDef::new(
            "m",
            vec![Type::class(boxed, vec![Type::class(string, vec![])])],
            Type::Void,
        )],
        super_class: Some(Type::class(base, vec![])),
        interfaces: vec![Type::class(i, vec![])],
        ..ClassDef::class("com.example.C")
    });

    let outcome = verify(&store, &[base, i, c], CompatibilityMode::default());
    // The declared method clashes with I.m and I.m stays unimplemented.
    assert_eq!(
        kinds(&outcome),
        vec![
            DiagnosticKind::NameClash,
            DiagnosticKind::MustImplementAbstract
        ]
    );
    let must = &outcome.diagnostics[1];
    assert_eq!(must.method.as_ref().unwrap().class_name, "com.example.I");
    // The dual attribution points at the would-be overrider.
    assert_eq!(must.related.len(), 1);
    assert_eq!(must.related[0].class_name, "com.example.C");
}

#[test]
fn inherited_generic_clash_between_unrelated_interfaces() {
    // interface I { void m(Box<String>); } ; interface J { void m(Box<Integer>); }
    // abstract class A implements I, J
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let string = store.well_known().string;
    let integer = store.well_known().integer;

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    let boxed = store.add_class(ClassDef {
        type_params: vec![t],
        ..ClassDef::class("com.example.Box")
    });
    let i = store.add_class(ClassDef {
        methods: vec![MethodDef::new(
            "m",
            vec![Type::class(boxed, vec![Type::class(string, vec![])])],
            Type::Void,
        )],
        ..ClassDef::interface("com.example.I")
    });
    let j = store.add_class(ClassDef {
        methods: vec![MethodDef::new(
            "m",
            vec![Type::class(boxed, vec![Type::class(integer, vec![])])],
            Type::Void,
        )],
        ..ClassDef::interface("com.example.J")
    });
    let a = store.add_class(ClassDef {
        is_abstract: true,
        interfaces: vec![Type::class(i, vec![]), Type::class(j, vec![])],
        ..ClassDef::class("com.example.A")
    });

    let outcome = verify(&store, &[i, j, a], CompatibilityMode::default());
    assert_eq!(kinds(&outcome), vec![DiagnosticKind::NameClash]);
    assert_eq!(outcome.diagnostics[0].class_name, "com.example.A");
}

#[test]
fn interface_declaration_order_does_not_change_the_diagnostic_set() {
    let build = |first_i: bool| {
        let mut store = TypeStore::with_minimal_jdk();
        let i = store.intern_class_id("com.example.I");
        store.define_class(
            i,
            ClassDef {
                methods: vec![MethodDef::new("foo", vec![], Type::class(i, vec![]))],
                ..ClassDef::interface("com.example.I")
            },
        );
        let j = store.intern_class_id("com.example.J");
        store.define_class(
            j,
            ClassDef {
                methods: vec![MethodDef::new("foo", vec![], Type::class(j, vec![]))],
                ..ClassDef::interface("com.example.J")
            },
        );
        let interfaces = if first_i {
            vec![Type::class(i, vec![]), Type::class(j, vec![])]
        } else {
            vec![Type::class(j, vec![]), Type::class(i, vec![])]
        };
        let a = store.add_class(ClassDef {
            is_abstract: true,
            interfaces,
            ..ClassDef::class("com.example.A")
        });
        let outcome = verify(&store, &[i, j, a], CompatibilityMode::default());
        let mut sorted = kinds(&outcome);
        sorted.sort();
        sorted
    };

    assert_eq!(build(true), build(false));
    assert_eq!(
        build(true),
        vec![DiagnosticKind::IncompatibleReturnTypesAcrossSupertypes]
    );
}

#[test]
fn unresolved_ancestor_poisons_only_that_type() {
    let mut store = TypeStore::with_minimal_jdk();
    let bad = store.add_class(ClassDef {
        super_class: Some(Type::Named("com.missing.Base".to_string())),
        ..ClassDef::class("com.example.Bad")
    });
    let good = store.add_class(ClassDef {
        methods: vec![MethodDef::new("run", vec![], Type::Void)],
        ..ClassDef::class("com.example.Good")
    });

    let outcome = verify(&store, &[bad, good], CompatibilityMode::default());
    assert_eq!(kinds(&outcome), vec![DiagnosticKind::UnresolvedAncestorType]);
    assert_eq!(outcome.diagnostics[0].class_name, "com.example.Bad");
}
