use nova_types::{
    is_same_type, is_subtype, lub, ClassDef, Type, TypeEnv, TypeStore, WildcardBound,
};

use pretty_assertions::assert_eq;

fn extends(ty: Type) -> Type {
    Type::Wildcard(WildcardBound::Extends(Box::new(ty)))
}

fn super_of(ty: Type) -> Type {
    Type::Wildcard(WildcardBound::Super(Box::new(ty)))
}

#[test]
fn inheritance_type_arg_substitution() {
    let env = TypeStore::with_minimal_jdk();

    let array_list = env.class_id("java.util.ArrayList").unwrap();
    let list = env.class_id("java.util.List").unwrap();
    let string = Type::class(env.well_known().string, vec![]);
    let object = Type::class(env.well_known().object, vec![]);

    let array_list_string = Type::class(array_list, vec![string.clone()]);
    assert!(is_subtype(
        &env,
        &array_list_string,
        &Type::class(list, vec![string])
    ));
    assert!(!is_subtype(
        &env,
        &array_list_string,
        &Type::class(list, vec![object])
    ));
}

#[test]
fn wildcard_containment() {
    let env = TypeStore::with_minimal_jdk();
    let list = env.class_id("java.util.List").unwrap();
    let wk = *env.well_known();
    let integer = Type::class(wk.integer, vec![]);
    let number = Type::class(wk.number, vec![]);
    let object = Type::class(wk.object, vec![]);

    let list_integer = Type::class(list, vec![integer.clone()]);
    let list_number = Type::class(list, vec![number.clone()]);

    assert!(is_subtype(
        &env,
        &list_integer,
        &Type::class(list, vec![extends(number.clone())])
    ));
    assert!(is_subtype(
        &env,
        &list_number,
        &Type::class(list, vec![super_of(integer.clone())])
    ));
    assert!(!is_subtype(
        &env,
        &list_integer,
        &Type::class(list, vec![super_of(number.clone())])
    ));
    assert!(is_subtype(
        &env,
        &Type::class(list, vec![extends(integer)]),
        &Type::class(list, vec![extends(object)])
    ));
    assert!(is_subtype(
        &env,
        &list_number,
        &Type::class(list, vec![Type::Wildcard(WildcardBound::Unbounded)])
    ));
}

#[test]
fn array_subtyping() {
    let env = TypeStore::with_minimal_jdk();
    let wk = *env.well_known();
    let string = Type::class(wk.string, vec![]);
    let object = Type::class(wk.object, vec![]);

    assert!(is_subtype(
        &env,
        &Type::array(string),
        &Type::array(object.clone())
    ));
    assert!(!is_subtype(
        &env,
        &Type::array(Type::int()),
        &Type::array(Type::long())
    ));
    for sup in [wk.object, wk.cloneable, wk.serializable] {
        assert!(is_subtype(
            &env,
            &Type::array(Type::int()),
            &Type::class(sup, vec![])
        ));
    }
    assert!(!is_subtype(
        &env,
        &Type::array(Type::int()),
        &Type::array(object)
    ));
}

#[test]
fn type_variables_are_bounded_by_their_declared_bounds() {
    let mut env = TypeStore::with_minimal_jdk();
    let wk = *env.well_known();
    let number = Type::class(wk.number, vec![]);
    let integer = Type::class(wk.integer, vec![]);

    let t = env.add_type_param("T", vec![number.clone()]);
    let t_ty = Type::TypeVar(t);

    assert!(is_subtype(&env, &t_ty, &number));
    assert!(is_subtype(&env, &t_ty, &Type::class(wk.object, vec![])));
    assert!(!is_subtype(&env, &t_ty, &integer));
    assert!(!is_subtype(&env, &integer, &t_ty));
    assert!(is_subtype(&env, &t_ty, &t_ty));
}

#[test]
fn intersections_on_either_side() {
    let env = TypeStore::with_minimal_jdk();
    let wk = *env.well_known();
    let comparable = env.class_id("java.lang.Comparable").unwrap();
    let integer = Type::class(wk.integer, vec![]);
    let number = Type::class(wk.number, vec![]);

    let bound = Type::Intersection(vec![
        number.clone(),
        Type::class(comparable, vec![integer.clone()]),
    ]);
    assert!(is_subtype(&env, &integer, &bound));
    assert!(is_subtype(&env, &bound, &number));
    assert!(!is_subtype(&env, &number, &bound));
}

#[test]
fn same_type_ignores_intersection_order() {
    let env = TypeStore::with_minimal_jdk();
    let wk = *env.well_known();
    let a = Type::class(wk.number, vec![]);
    let b = Type::class(wk.serializable, vec![]);

    assert!(is_same_type(
        &Type::Intersection(vec![a.clone(), b.clone()]),
        &Type::Intersection(vec![b, a])
    ));
}

#[test]
fn lub_of_unrelated_classes_keeps_shared_interfaces() {
    let env = TypeStore::with_minimal_jdk();
    let wk = *env.well_known();
    let comparable = env.class_id("java.lang.Comparable").unwrap();
    let string = Type::class(wk.string, vec![]);
    let integer = Type::class(wk.integer, vec![]);

    assert_eq!(
        lub(&env, &[string, integer]),
        Type::Intersection(vec![
            Type::class(wk.serializable, vec![]),
            Type::class(comparable, vec![]),
        ])
    );
}

#[test]
fn user_defined_subclass_is_subtype_of_its_superclass_only() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = Type::class(env.well_known().object, vec![]);
    let animal = env.add_class(ClassDef::class("com.example.Animal", Some(object)));
    let dog = env.add_class(ClassDef::class(
        "com.example.Dog",
        Some(Type::class(animal, vec![])),
    ));

    let animal = Type::class(animal, vec![]);
    let dog = Type::class(dog, vec![]);
    assert!(is_subtype(&env, &dog, &animal));
    assert!(!is_subtype(&env, &animal, &dog));
}
