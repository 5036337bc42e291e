use nova_types::{is_subtype, Type, TypeEnv, TypeStore};

#[test]
fn well_known_boxes_extend_number() {
    let env = TypeStore::with_minimal_jdk();
    let wk = *env.well_known();
    let number = Type::class(wk.number, vec![]);

    for id in [wk.byte, wk.short, wk.integer, wk.long, wk.float, wk.double] {
        assert!(is_subtype(&env, &Type::class(id, vec![]), &number));
    }
    for id in [wk.boolean, wk.character] {
        assert!(!is_subtype(&env, &Type::class(id, vec![]), &number));
    }
}

#[test]
fn string_is_comparable_to_itself() {
    let env = TypeStore::with_minimal_jdk();
    let comparable = env.class_id("java.lang.Comparable").unwrap();
    let string = Type::class(env.well_known().string, vec![]);

    assert!(is_subtype(
        &env,
        &string,
        &Type::class(comparable, vec![string.clone()])
    ));
    assert!(is_subtype(
        &env,
        &string,
        &Type::class(env.class_id("java.lang.CharSequence").unwrap(), vec![])
    ));
}

#[test]
fn arrays_as_list_is_a_generic_varargs_method() {
    let env = TypeStore::with_minimal_jdk();
    let arrays = env.class_id("java.util.Arrays").unwrap();
    let def = env.class(arrays).unwrap();

    let as_list = def.methods.iter().find(|m| m.name == "asList").unwrap();
    assert!(as_list.is_static);
    assert!(as_list.is_varargs);
    assert_eq!(as_list.type_params.len(), 1);
    assert_eq!(
        as_list.params,
        vec![Type::array(Type::TypeVar(as_list.type_params[0]))]
    );
}
