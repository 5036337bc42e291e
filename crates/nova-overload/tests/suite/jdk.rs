use nova_overload::{
    resolve, MethodId, Phase, RejectReason, ResolutionQuery, ResolutionResult, TypeWarning,
    UncheckedReason,
};
use nova_types::{ClassDef, MethodDef, Type, TypeEnv, TypeStore};
use pretty_assertions::assert_eq;

use super::support::{named, object, string, unique};

#[test]
fn list_remove_distinguishes_index_from_element() {
    let store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").unwrap();
    let receiver = Type::class(list, vec![string(&store)]);
    let integer = Type::class(store.well_known().integer, vec![]);

    let by_index = resolve(
        &store,
        &ResolutionQuery::method(receiver.clone(), "remove", vec![Type::int()]),
    )
    .unwrap();
    let binding = unique(&by_index);
    assert_eq!(binding.id(), MethodId::method(list, 2));
    assert_eq!(binding.return_type, string(&store));

    // No unboxing in the strict phase, so `remove(Object)` wins for a boxed argument.
    let by_value =
        resolve(&store, &ResolutionQuery::method(receiver, "remove", vec![integer])).unwrap();
    let binding = unique(&by_value);
    assert_eq!(binding.id(), MethodId::method(list, 3));
    assert_eq!(binding.return_type, Type::boolean());
}

#[test]
fn math_max_widens_to_the_closest_primitive() {
    let store = TypeStore::with_minimal_jdk();
    let math = named(&store, "java.lang.Math");
    let resolution = resolve(
        &store,
        &ResolutionQuery::static_method(math, "max", vec![Type::int(), Type::long()]),
    )
    .unwrap();
    let binding = unique(&resolution);
    assert_eq!(binding.params, vec![Type::long(), Type::long()]);
    assert_eq!(binding.return_type, Type::long());
}

#[test]
fn null_argument_picks_the_most_specific_reference_overload() {
    let store = TypeStore::with_minimal_jdk();
    let wk = *store.well_known();
    let resolution = resolve(
        &store,
        &ResolutionQuery::static_method(string(&store), "valueOf", vec![Type::Null]),
    )
    .unwrap();
    let binding = unique(&resolution);
    assert_eq!(binding.id(), MethodId::method(wk.string, 4));
    assert_eq!(binding.params, vec![Type::array(Type::char())]);
}

#[test]
fn boxed_argument_for_primitive_overloads_needs_the_loose_phase() {
    let store = TypeStore::with_minimal_jdk();
    let integer = Type::class(store.well_known().integer, vec![]);
    let resolution = resolve(
        &store,
        &ResolutionQuery::static_method(
            named(&store, "java.lang.Math"),
            "max",
            vec![integer.clone(), integer],
        ),
    )
    .unwrap();
    let binding = unique(&resolution);
    assert_eq!(binding.phase, Phase::Loose);
    assert_eq!(binding.return_type, Type::int());
}

#[test]
fn constructors_are_resolved_on_the_instantiated_class() {
    let store = TypeStore::with_minimal_jdk();
    let array_list = store.class_id("java.util.ArrayList").unwrap();
    let instantiated = Type::class(array_list, vec![string(&store)]);

    let resolution = resolve(
        &store,
        &ResolutionQuery::constructor(instantiated.clone(), vec![Type::int()]),
    )
    .unwrap();
    let binding = unique(&resolution);
    assert_eq!(binding.id(), MethodId::constructor(array_list, 1));
    assert_eq!(binding.return_type, instantiated);

    let copy = resolve(
        &store,
        &ResolutionQuery::constructor(
            instantiated.clone(),
            vec![Type::class(array_list, vec![string(&store)])],
        ),
    )
    .unwrap();
    assert_eq!(unique(&copy).id(), MethodId::constructor(array_list, 2));
}

#[test]
fn classes_without_constructors_get_the_implicit_one() {
    let mut store = TypeStore::with_minimal_jdk();
    let plain = store.add_class(ClassDef::class("Plain", Some(object(&store))));
    let query = ResolutionQuery::constructor(Type::class(plain, vec![]), vec![]);
    assert!(query.is_constructor_call());

    let resolution = resolve(&store, &query).unwrap();
    assert_eq!(unique(&resolution).id(), MethodId::constructor(plain, 0));

    let wrong = resolve(
        &store,
        &ResolutionQuery::constructor(Type::class(plain, vec![]), vec![Type::int()]),
    )
    .unwrap();
    assert!(matches!(wrong.result, ResolutionResult::NotApplicable(_)));
}

#[test]
fn as_list_collects_trailing_arguments() {
    let store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").unwrap();
    let string = string(&store);
    let resolution = resolve(
        &store,
        &ResolutionQuery::static_method(
            named(&store, "java.util.Arrays"),
            "asList",
            vec![string.clone(), string.clone()],
        ),
    )
    .unwrap();
    let binding = unique(&resolution);
    assert_eq!(binding.phase, Phase::VarArgs);
    assert!(binding.used_varargs);
    assert_eq!(binding.inferred_type_args, vec![string.clone()]);
    assert_eq!(binding.return_type, Type::class(list, vec![string]));
    assert!(binding.warnings.is_empty());
}

#[test]
fn generic_varargs_of_a_parameterized_type_is_unchecked() {
    let store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").unwrap();
    let list_of_string = Type::class(list, vec![string(&store)]);
    let resolution = resolve(
        &store,
        &ResolutionQuery::static_method(
            named(&store, "java.util.Arrays"),
            "asList",
            vec![list_of_string.clone(), list_of_string.clone()],
        ),
    )
    .unwrap();
    let binding = unique(&resolution);
    assert_eq!(
        binding.warnings,
        vec![TypeWarning::Unchecked(UncheckedReason::UncheckedVarargs)]
    );
    assert_eq!(binding.return_type, Type::class(list, vec![list_of_string]));
}

#[test]
fn raw_argument_makes_the_call_unchecked_and_erases_the_result() {
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").unwrap();
    let list_of_string = Type::class(list, vec![string(&store)]);
    let util = store.add_class(ClassDef {
        methods: vec![MethodDef::static_method(
            "copy",
            vec![list_of_string.clone()],
            list_of_string,
        )],
        ..ClassDef::class("Util", Some(object(&store)))
    });

    let resolution = resolve(
        &store,
        &ResolutionQuery::static_method(
            Type::class(util, vec![]),
            "copy",
            vec![Type::class(list, vec![])],
        ),
    )
    .unwrap();
    let binding = unique(&resolution);
    assert_eq!(binding.phase, Phase::Strict);
    assert_eq!(
        binding.warnings,
        vec![TypeWarning::Unchecked(UncheckedReason::UncheckedConversion)]
    );
    assert_eq!(binding.return_type, Type::class(list, vec![]));
}

#[test]
fn not_applicable_reports_every_phase() {
    let store = TypeStore::with_minimal_jdk();
    let wk = *store.well_known();
    let resolution = resolve(
        &store,
        &ResolutionQuery::method(string(&store), "charAt", vec![string(&store)]),
    )
    .unwrap();
    let ResolutionResult::NotApplicable(attempts) = &resolution.result else {
        panic!("expected NotApplicable, got {:?}", resolution.result);
    };
    let phases: Vec<Phase> = attempts.iter().map(|a| a.phase).collect();
    assert_eq!(phases, Phase::ALL.to_vec());
    let strict = &attempts[0].rejected;
    assert_eq!(strict.len(), 1);
    assert_eq!(strict[0].candidate, MethodId::method(wk.string, 1));
    assert_eq!(strict[0].reason, RejectReason::ArgumentMismatch { position: 0 });
    assert_eq!(attempts[2].rejected[0].reason, RejectReason::NotVariableArity);
}

#[test]
fn unknown_name_is_not_applicable_in_every_phase() {
    let store = TypeStore::with_minimal_jdk();
    let resolution = resolve(
        &store,
        &ResolutionQuery::method(string(&store), "frobnicate", vec![]),
    )
    .unwrap();
    let ResolutionResult::NotApplicable(attempts) = resolution.result else {
        panic!("expected NotApplicable");
    };
    assert_eq!(attempts.len(), 3);
    assert!(attempts.iter().all(|a| a.rejected.is_empty()));
}
