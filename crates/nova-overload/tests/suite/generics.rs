use nova_overload::{
    resolve, InferenceFailure, MethodId, Phase, RejectReason, ResolutionQuery, ResolutionResult,
};
use nova_types::{ClassDef, ClassId, MethodDef, Type, TypeEnv, TypeStore, WildcardBound};
use pretty_assertions::assert_eq;

use super::support::{named, object, string, unique};

/// `Util` with `<T> T id(T)`, `<T extends Comparable<T>> T max(T, T)`,
/// `<T> boolean addAll(Collection<? super T>, T[])` and `<T> void same(List<T>, List<T>)`.
fn util(store: &mut TypeStore) -> ClassId {
    let object_ty = object(store);
    let comparable = store.class_id("java.lang.Comparable").unwrap();
    let collection = store.class_id("java.util.Collection").unwrap();
    let list = store.class_id("java.util.List").unwrap();

    let id_t = store.add_type_param("T", vec![object_ty.clone()]);
    let max_t = store.add_type_param("T", vec![]);
    store.define_type_param(
        max_t,
        nova_types::TypeParamDef {
            name: "T".to_string(),
            upper_bounds: vec![Type::class(comparable, vec![Type::TypeVar(max_t)])],
        },
    );
    let add_t = store.add_type_param("T", vec![object_ty.clone()]);
    let same_t = store.add_type_param("T", vec![object_ty.clone()]);

    let generic = |tp, method: MethodDef| MethodDef {
        type_params: vec![tp],
        ..method
    };
    store.add_class(ClassDef {
        methods: vec![
            generic(
                id_t,
                MethodDef::static_method("id", vec![Type::TypeVar(id_t)], Type::TypeVar(id_t)),
            ),
            generic(
                max_t,
                MethodDef::static_method(
                    "max",
                    vec![Type::TypeVar(max_t), Type::TypeVar(max_t)],
                    Type::TypeVar(max_t),
                ),
            ),
            generic(
                add_t,
                MethodDef::static_method(
                    "addAll",
                    vec![
                        Type::class(
                            collection,
                            vec![Type::Wildcard(WildcardBound::Super(Box::new(Type::TypeVar(
                                add_t,
                            ))))],
                        ),
                        Type::array(Type::TypeVar(add_t)),
                    ],
                    Type::boolean(),
                ),
            ),
            generic(
                same_t,
                MethodDef::static_method(
                    "same",
                    vec![
                        Type::class(list, vec![Type::TypeVar(same_t)]),
                        Type::class(list, vec![Type::TypeVar(same_t)]),
                    ],
                    Type::Void,
                ),
            ),
        ],
        ..ClassDef::class("Util", Some(object_ty))
    })
}

fn call(store: &TypeStore, util: ClassId, name: &str, args: Vec<Type>) -> ResolutionResult {
    resolve(
        store,
        &ResolutionQuery::static_method(Type::class(util, vec![]), name, args),
    )
    .unwrap()
    .result
}

#[test]
fn identity_infers_the_argument_type() {
    let mut store = TypeStore::with_minimal_jdk();
    let util = util(&mut store);
    let integer = Type::class(store.well_known().integer, vec![]);

    let result = call(&store, util, "id", vec![string(&store)]);
    let binding = result.binding().unwrap();
    assert_eq!(binding.return_type, string(&store));
    assert_eq!(binding.phase, Phase::Strict);

    // A primitive argument only fits a type variable after boxing.
    let result = call(&store, util, "id", vec![Type::int()]);
    let binding = result.binding().unwrap();
    assert_eq!(binding.phase, Phase::Loose);
    assert_eq!(binding.inferred_type_args, vec![integer]);
}

#[test]
fn self_referential_bound_is_checked_against_the_solution() {
    let mut store = TypeStore::with_minimal_jdk();
    let util = util(&mut store);
    let integer = Type::class(store.well_known().integer, vec![]);

    let result = call(&store, util, "max", vec![integer.clone(), integer.clone()]);
    assert_eq!(result.binding().unwrap().return_type, integer.clone());

    let result = call(&store, util, "max", vec![string(&store), integer]);
    let ResolutionResult::NotApplicable(attempts) = result else {
        panic!("mixed arguments have no Comparable<T> solution");
    };
    assert!(matches!(
        attempts[0].rejected[0].reason,
        RejectReason::Inference(InferenceFailure::BoundViolation { .. })
    ));
}

#[test]
fn wildcard_and_array_constraints_combine() {
    let mut store = TypeStore::with_minimal_jdk();
    let util = util(&mut store);
    let list = store.class_id("java.util.List").unwrap();

    let result = call(
        &store,
        util,
        "addAll",
        vec![
            Type::class(list, vec![object(&store)]),
            Type::array(string(&store)),
        ],
    );
    let binding = result.binding().unwrap();
    assert_eq!(binding.inferred_type_args, vec![string(&store)]);
    assert!(!binding.used_varargs);
}

#[test]
fn conflicting_type_arguments_reject_the_candidate() {
    let mut store = TypeStore::with_minimal_jdk();
    let util = util(&mut store);
    let list = store.class_id("java.util.List").unwrap();
    let integer = Type::class(store.well_known().integer, vec![]);

    let result = call(
        &store,
        util,
        "same",
        vec![
            Type::class(list, vec![string(&store)]),
            Type::class(list, vec![integer]),
        ],
    );
    let ResolutionResult::NotApplicable(attempts) = result else {
        panic!("List<String> and List<Integer> share no T");
    };
    assert!(matches!(
        attempts[0].rejected[0].reason,
        RejectReason::Inference(InferenceFailure::ConflictingEquality { .. })
    ));
}

#[test]
fn explicit_type_arguments_replace_inference() {
    let store = TypeStore::with_minimal_jdk();
    let arrays = named(&store, "java.util.Arrays");
    let string = string(&store);

    let query = ResolutionQuery::static_method(arrays.clone(), "asList", vec![string.clone()])
        .with_type_args(vec![string.clone()]);
    let resolution = resolve(&store, &query).unwrap();
    let binding = unique(&resolution);
    assert_eq!(binding.inferred_type_args, vec![string.clone()]);
    assert_eq!(binding.phase, Phase::VarArgs);

    let query = ResolutionQuery::static_method(arrays, "asList", vec![string.clone()])
        .with_type_args(vec![string.clone(), string]);
    let ResolutionResult::NotApplicable(attempts) = resolve(&store, &query).unwrap().result else {
        panic!("wrong type argument count");
    };
    for attempt in &attempts {
        assert_eq!(
            attempt.rejected[0].reason,
            RejectReason::ExplicitTypeArgumentCount {
                expected: 1,
                found: 2
            }
        );
    }
}

#[test]
fn explicit_type_arguments_are_ignored_for_non_generic_members() {
    let store = TypeStore::with_minimal_jdk();
    let query = ResolutionQuery::method(string(&store), "charAt", vec![Type::int()])
        .with_type_args(vec![object(&store)]);
    let resolution = resolve(&store, &query).unwrap();
    assert_eq!(
        unique(&resolution).id(),
        MethodId::method(store.well_known().string, 1)
    );
}

#[test]
fn class_type_arguments_constrain_inherited_members() {
    let store = TypeStore::with_minimal_jdk();
    let array_list = store.class_id("java.util.ArrayList").unwrap();
    let receiver = Type::class(array_list, vec![string(&store)]);
    let integer = Type::class(store.well_known().integer, vec![]);

    let accepted = resolve(
        &store,
        &ResolutionQuery::method(receiver.clone(), "add", vec![string(&store)]),
    )
    .unwrap();
    assert_eq!(unique(&accepted).params, vec![string(&store)]);

    let rejected =
        resolve(&store, &ResolutionQuery::method(receiver, "add", vec![integer])).unwrap();
    assert!(matches!(rejected.result, ResolutionResult::NotApplicable(_)));
}

#[test]
fn type_variable_receivers_resolve_through_their_bounds() {
    let mut store = TypeStore::with_minimal_jdk();
    let runnable = named(&store, "java.lang.Runnable");
    let r = store.add_type_param("R", vec![runnable.clone()]);
    let runnable_id = runnable.as_class().unwrap().def;

    let resolution = resolve(
        &store,
        &ResolutionQuery::method(Type::TypeVar(r), "run", vec![]),
    )
    .unwrap();
    assert_eq!(unique(&resolution).id(), MethodId::method(runnable_id, 0));
    assert!(resolution.consistency.is_empty());
}

#[test]
fn intersection_receivers_see_every_component() {
    let store = TypeStore::with_minimal_jdk();
    let wk = *store.well_known();
    let char_sequence = named(&store, "java.lang.CharSequence");
    let comparable = store.class_id("java.lang.Comparable").unwrap();
    let receiver = Type::Intersection(vec![
        char_sequence.clone(),
        Type::class(comparable, vec![string(&store)]),
    ]);

    let length = resolve(
        &store,
        &ResolutionQuery::method(receiver.clone(), "length", vec![]),
    )
    .unwrap();
    assert_eq!(
        unique(&length).id(),
        MethodId::method(char_sequence.as_class().unwrap().def, 0)
    );

    let compare = resolve(
        &store,
        &ResolutionQuery::method(receiver.clone(), "compareTo", vec![string(&store)]),
    )
    .unwrap();
    assert_eq!(unique(&compare).id(), MethodId::method(comparable, 0));

    let to_string =
        resolve(&store, &ResolutionQuery::method(receiver, "toString", vec![])).unwrap();
    assert_eq!(unique(&to_string).id(), MethodId::method(wk.object, 2));
}
