//! Bridge-method planning for accepted overrides.

use pretty_assertions::assert_eq;
use ridge_types::{ClassDef, MethodDef, Type, TypeEnv, TypeStore, Visibility};
use ridge_verify::{verify, CompatibilityMode};

#[test]
fn generic_substitution_produces_an_erased_bridge() {
    // class Sink<T> { void put(T) } ; class StringSink extends Sink<String> { void put(String) }
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let string = store.well_known().string;

    let t = store.add_type_param("T", vec![Type::class(object, vec![])]);
    let sink = store.add_class(ClassDef {
        type_params: vec![t],
        methods: vec![MethodDef::new("put", vec![Type::TypeVar(t)], Type::Void)],
        ..ClassDef::class("com.example.Sink")
    });
    let string_sink = store.add_class(ClassDef {
        methods: vec![MethodDef::new(
            "put",
            vec![Type::class(string, vec![])],
            Type::Void,
        )],
        super_class: Some(Type::class(sink, vec![Type::class(string, vec![])])),
        ..ClassDef::class("com.example.StringSink")
    });

    let outcome = verify(&store, &[sink, string_sink], CompatibilityMode::default());
    assert!(outcome.is_clean());
    assert_eq!(outcome.bridges.len(), 1);
    let plan = &outcome.bridges[0];
    assert_eq!(plan.name, "put");
    assert_eq!(plan.erased_params, vec![Type::class(object, vec![])]);
    assert_eq!(plan.erased_return, Type::Void);
    assert_eq!(plan.delegate.class_name, "com.example.StringSink");
    assert_eq!(plan.overridden.class_name, "com.example.Sink");
}

#[test]
fn two_distinct_ancestor_erasures_yield_two_bridges() {
    // interface I { Object id(); } ; interface J { Number id(); }
    // class C implements I, J { public Integer id() }
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let number = store.well_known().number;
    let integer = store.well_known().integer;

    let i = store.add_class(ClassDef {
        methods: vec![MethodDef::new("id", vec![], Type::class(object, vec![]))],
        ..ClassDef::interface("com.example.I")
    });
    let j = store.add_class(ClassDef {
        methods: vec![MethodDef::new("id", vec![], Type::class(number, vec![]))],
        ..ClassDef::interface("com.example.J")
    });
    let c = store.add_class(ClassDef {
        methods: vec![MethodDef::new("id", vec![], Type::class(integer, vec![]))],
        interfaces: vec![Type::class(i, vec![]), Type::class(j, vec![])],
        ..ClassDef::class("com.example.C")
    });

    let outcome = verify(&store, &[i, j, c], CompatibilityMode::default());
    assert!(outcome.is_clean());
    let mut returns: Vec<Type> = outcome
        .bridges
        .iter()
        .map(|p| p.erased_return.clone())
        .collect();
    returns.sort_by_key(|t| format!("{t:?}"));
    let mut expected = vec![Type::class(object, vec![]), Type::class(number, vec![])];
    expected.sort_by_key(|t| format!("{t:?}"));
    assert_eq!(returns, expected);
}

#[test]
fn duplicate_erased_signatures_collapse_to_one_plan() {
    // interface I { I foo(); } ; interface K extends I { }
    // class A implements I, K { public A foo() }  -- I is reachable twice
    let mut store = TypeStore::with_minimal_jdk();
    let i = store.intern_class_id("com.example.I");
    store.define_class(
        i,
        ClassDef {
            methods: vec![MethodDef::new("foo", vec![], Type::class(i, vec![]))],
            ..ClassDef::interface("com.example.I")
        },
    );
    let k = store.add_class(ClassDef {
        interfaces: vec![Type::class(i, vec![])],
        ..ClassDef::interface("com.example.K")
    });
    let a = store.intern_class_id("com.example.A");
    store.define_class(
        a,
        ClassDef {
            methods: vec![MethodDef::new("foo", vec![], Type::class(a, vec![]))],
            interfaces: vec![Type::class(i, vec![]), Type::class(k, vec![])],
            ..ClassDef::class("com.example.A")
        },
    );

    let outcome = verify(&store, &[i, k, a], CompatibilityMode::default());
    assert!(outcome.is_clean());
    assert_eq!(outcome.bridges.len(), 1);
}

#[test]
fn public_method_from_non_public_class_gets_a_visibility_bridge() {
    // package-private class Helper { public void run() } ; public class Facade extends Helper
    let mut store = TypeStore::with_minimal_jdk();
    let helper = store.add_class(ClassDef {
        is_public: false,
        methods: vec![MethodDef::new("run", vec![], Type::Void)],
        ..ClassDef::class("com.example.Helper")
    });
    let facade = store.add_class(ClassDef {
        super_class: Some(Type::class(helper, vec![])),
        ..ClassDef::class("com.example.Facade")
    });

    let outcome = verify(&store, &[helper, facade], CompatibilityMode::default());
    assert!(outcome.is_clean());
    assert_eq!(outcome.bridges.len(), 1);
    let plan = &outcome.bridges[0];
    assert_eq!(plan.class_name, "com.example.Facade");
    assert_eq!(plan.name, "run");
    assert_eq!(plan.visibility, Visibility::Public);
    assert_eq!(plan.delegate.class_name, "com.example.Helper");
}

#[test]
fn redeclared_method_needs_no_visibility_bridge() {
    let mut store = TypeStore::with_minimal_jdk();
    let helper = store.add_class(ClassDef {
        is_public: false,
        methods: vec![MethodDef::new("run", vec![], Type::Void)],
        ..ClassDef::class("com.example.Helper")
    });
    let facade = store.add_class(ClassDef {
        methods: vec![MethodDef::new("run", vec![], Type::Void)],
        super_class: Some(Type::class(helper, vec![])),
        ..ClassDef::class("com.example.Facade")
    });

    let outcome = verify(&store, &[helper, facade], CompatibilityMode::default());
    assert!(outcome.is_clean());
    assert!(outcome.bridges.is_empty());
}

#[test]
fn abstract_types_plan_no_bridges() {
    let mut store = TypeStore::with_minimal_jdk();
    let i = store.intern_class_id("com.example.I");
    store.define_class(
        i,
        ClassDef {
            methods: vec![MethodDef::new("foo", vec![], Type::class(i, vec![]))],
            ..ClassDef::interface("com.example.I")
        },
    );
    let a = store.intern_class_id("com.example.A");
    store.define_class(
        a,
        ClassDef {
            is_abstract: true,
            methods: vec![MethodDef::new("foo", vec![], Type::class(a, vec![]))],
            interfaces: vec![Type::class(i, vec![])],
            ..ClassDef::class("com.example.A")
        },
    );

    let outcome = verify(&store, &[i, a], CompatibilityMode::default());
    assert!(outcome.is_clean());
    assert!(outcome.bridges.is_empty());
}
