use std::collections::BTreeSet;

use nova_overload::{
    resolve, validate, ConsistencyError, DiagnosticKind, MethodId, OverloadConfig,
    ResolutionQuery, ResolutionResult, Severity,
};
use nova_types::{ClassDef, ClassId, HierarchyError, MethodDef, Type, TypeEnv, TypeStore};
use pretty_assertions::assert_eq;

use super::support::{object, string, tied_ids};

fn interface_with(store: &mut TypeStore, name: &str, method: MethodDef) -> ClassId {
    store.add_class(ClassDef {
        methods: vec![method],
        ..ClassDef::interface(name)
    })
}

fn implementing(
    store: &mut TypeStore,
    name: &str,
    interfaces: &[ClassId],
    methods: Vec<MethodDef>,
) -> ClassId {
    let object_ty = object(store);
    store.add_class(ClassDef {
        interfaces: interfaces.iter().map(|id| Type::class(*id, vec![])).collect(),
        methods,
        ..ClassDef::class(name, Some(object_ty))
    })
}

#[test]
fn diamond_defaults_conflict_unless_overridden() {
    let mut store = TypeStore::with_minimal_jdk();
    let i = interface_with(&mut store, "I", MethodDef::instance("m", vec![], Type::Void));
    let j = interface_with(&mut store, "J", MethodDef::instance("m", vec![], Type::Void));
    let x = implementing(&mut store, "X", &[i, j], vec![]);

    assert_eq!(
        validate(&store, x).unwrap().into_iter().collect::<Vec<_>>(),
        vec![ConsistencyError::DuplicateInheritedDefault {
            class: x,
            methods: vec![MethodId::method(i, 0), MethodId::method(j, 0)],
        }]
    );

    // Two concrete defaults stay ambiguous at the call site.
    let resolution =
        resolve(&store, &ResolutionQuery::method(Type::class(x, vec![]), "m", vec![])).unwrap();
    assert_eq!(
        tied_ids(&resolution),
        vec![MethodId::method(i, 0), MethodId::method(j, 0)]
    );

    let y = implementing(
        &mut store,
        "Y",
        &[i, j],
        vec![MethodDef::instance("m", vec![], Type::Void)],
    );
    assert_eq!(validate(&store, y).unwrap(), BTreeSet::new());
    let resolution =
        resolve(&store, &ResolutionQuery::method(Type::class(y, vec![]), "m", vec![])).unwrap();
    assert_eq!(
        resolution.result.binding().map(|b| b.id()),
        Some(MethodId::method(y, 0))
    );
}

#[test]
fn abstract_and_default_from_unrelated_interfaces_conflict() {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = object(&store);
    let string_ty = string(&store);
    let i = interface_with(
        &mut store,
        "I",
        MethodDef::abstract_method("name", vec![], object_ty),
    );
    let j = interface_with(&mut store, "J", MethodDef::instance("name", vec![], string_ty.clone()));
    let x = implementing(&mut store, "X", &[i, j], vec![]);

    assert_eq!(
        validate(&store, x).unwrap().into_iter().collect::<Vec<_>>(),
        vec![ConsistencyError::DuplicateInheritedDefault {
            class: x,
            methods: vec![MethodId::method(i, 0), MethodId::method(j, 0)],
        }]
    );

    // The call site still binds to the only body.
    let resolution =
        resolve(&store, &ResolutionQuery::method(Type::class(x, vec![]), "name", vec![]))
            .unwrap();
    let binding = resolution.result.binding().unwrap();
    assert_eq!(binding.id(), MethodId::method(j, 0));
    assert_eq!(binding.return_type, string_ty);
    assert_eq!(
        resolution.diagnostics(),
        vec![DiagnosticKind::DuplicateInheritedDefault]
    );
}

#[test]
fn superclass_method_wins_over_an_interface_default() {
    let mut store = TypeStore::with_minimal_jdk();
    let i = interface_with(&mut store, "I", MethodDef::instance("m", vec![], Type::Void));
    let b = implementing(
        &mut store,
        "B",
        &[],
        vec![MethodDef::instance("m", vec![], Type::Void)],
    );
    let c = store.add_class(ClassDef {
        interfaces: vec![Type::class(i, vec![])],
        ..ClassDef::class("C", Some(Type::class(b, vec![])))
    });

    assert_eq!(validate(&store, c).unwrap(), BTreeSet::new());
    let resolution =
        resolve(&store, &ResolutionQuery::method(Type::class(c, vec![]), "m", vec![])).unwrap();
    assert_eq!(
        resolution.result.binding().map(|b| b.id()),
        Some(MethodId::method(b, 0))
    );
    assert!(resolution.consistency.is_empty());
}

#[test]
fn same_erasure_from_independent_supertypes_is_a_name_clash() {
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").unwrap();
    let integer = Type::class(store.well_known().integer, vec![]);
    let strings = Type::class(list, vec![string(&store)]);
    let integers = Type::class(list, vec![integer]);
    let i = interface_with(
        &mut store,
        "I",
        MethodDef::abstract_method("f", vec![strings.clone()], Type::Void),
    );
    let j = interface_with(
        &mut store,
        "J",
        MethodDef::abstract_method("f", vec![integers], Type::Void),
    );
    let x = implementing(&mut store, "X", &[i, j], vec![]);

    let clash = ConsistencyError::NameClash {
        class: x,
        method: MethodId::method(i, 0),
        other: MethodId::method(j, 0),
    };
    assert_eq!(
        validate(&store, x).unwrap().into_iter().collect::<Vec<_>>(),
        vec![clash.clone()]
    );

    // A parameterized argument only fits one of them.
    let typed = resolve(
        &store,
        &ResolutionQuery::method(Type::class(x, vec![]), "f", vec![strings]),
    )
    .unwrap();
    assert_eq!(
        typed.result.binding().map(|b| b.id()),
        Some(MethodId::method(i, 0))
    );
    assert_eq!(typed.consistency, vec![clash]);

    // A raw argument fits both through unchecked conversion.
    let raw = resolve(
        &store,
        &ResolutionQuery::method(Type::class(x, vec![]), "f", vec![Type::class(list, vec![])]),
    )
    .unwrap();
    match &raw.result {
        ResolutionResult::NameClash(a, b) => {
            assert_eq!((a.id(), b.id()), (MethodId::method(i, 0), MethodId::method(j, 0)));
        }
        other => panic!("expected a name clash, got {other:?}"),
    }
}

#[test]
fn name_clash_is_only_a_warning_before_java_7() {
    let legacy = OverloadConfig::load_from_str("language_level = 6\n").unwrap();
    assert_eq!(legacy.severity_of(DiagnosticKind::NameClash), Severity::Warning);
    assert_eq!(
        legacy.severity_of(DiagnosticKind::DuplicateMethod),
        Severity::Error
    );

    let strict =
        OverloadConfig::load_from_str("language_level = 6\n[severity]\nname_clash = \"error\"\n")
            .unwrap();
    assert_eq!(strict.severity_of(DiagnosticKind::NameClash), Severity::Error);
}

#[test]
fn cyclic_hierarchy_aborts_validation_and_resolution() {
    let mut store = TypeStore::with_minimal_jdk();
    let a = store.intern_class_id("com.example.A");
    let b = store.intern_class_id("com.example.B");
    store.define_class(a, ClassDef::class("com.example.A", Some(Type::class(b, vec![]))));
    store.define_class(b, ClassDef::class("com.example.B", Some(Type::class(a, vec![]))));

    assert!(matches!(validate(&store, a), Err(HierarchyError::Cyclic { .. })));
    let err = resolve(
        &store,
        &ResolutionQuery::method(Type::class(a, vec![]), "toString", vec![]),
    )
    .unwrap_err();
    assert!(matches!(err, HierarchyError::Cyclic { .. }));
}

#[test]
fn overriding_with_an_incompatible_primitive_return_is_rejected() {
    let mut store = TypeStore::with_minimal_jdk();
    let runnable = store.class_id("java.lang.Runnable").unwrap();
    let task = implementing(
        &mut store,
        "Task",
        &[runnable],
        vec![MethodDef::instance("run", vec![], Type::int())],
    );

    let errors = validate(&store, task).unwrap();
    assert_eq!(
        errors.into_iter().collect::<Vec<_>>(),
        vec![ConsistencyError::IncompatibleReturnType {
            class: task,
            method: MethodId::method(task, 0),
            overridden: MethodId::method(runnable, 0),
        }]
    );
}
