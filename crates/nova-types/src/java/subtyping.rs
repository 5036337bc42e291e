//! Subtyping and the conversions method invocation relies on (JLS 4.10, 5.1).

use std::collections::HashSet;

use crate::{ClassId, ClassType, PrimitiveType, Type, TypeEnv, TypeVarId, WildcardBound};

/// `sub <: sup` (JLS 4.10), including primitive subtyping via widening.
///
/// Raw types are supertypes of every parameterization, but a raw type is not a subtype of a
/// parameterized one; that direction is an unchecked conversion, see
/// [`is_unchecked_convertible`].
pub fn is_subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> bool {
    let mut seen = HashSet::new();
    subtype_inner(env, sub, sup, &mut seen)
}

fn subtype_inner(
    env: &dyn TypeEnv,
    sub: &Type,
    sup: &Type,
    seen: &mut HashSet<TypeVarId>,
) -> bool {
    if is_same_type(sub, sup) {
        return true;
    }

    match (sub, sup) {
        (Type::Void, _) | (_, Type::Void) => false,
        (Type::Primitive(a), Type::Primitive(b)) => a.widens_to(*b),
        (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
        (Type::Wildcard(_), _) | (_, Type::Wildcard(_)) => false,
        (Type::Null, _) => sup.is_reference(),
        (_, Type::Null) => false,
        (_, Type::Intersection(parts)) => parts.iter().all(|p| subtype_inner(env, sub, p, seen)),
        (Type::Intersection(parts), _) => parts.iter().any(|p| subtype_inner(env, p, sup, seen)),
        (Type::TypeVar(id), _) => {
            if !seen.insert(*id) {
                return false;
            }
            let result = upper_bounds(env, *id)
                .iter()
                .any(|bound| subtype_inner(env, bound, sup, seen));
            seen.remove(id);
            result
        }
        (_, Type::TypeVar(_)) => false,
        (Type::Array(a), Type::Array(b)) => match (a.as_ref(), b.as_ref()) {
            (Type::Primitive(x), Type::Primitive(y)) => x == y,
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
            (a, b) => subtype_inner(env, a, b, seen),
        },
        (Type::Array(_), Type::Class(ct)) => {
            let wk = env.well_known();
            ct.args.is_empty()
                && (ct.def == wk.object || ct.def == wk.cloneable || ct.def == wk.serializable)
        }
        (Type::Class(_), Type::Class(target)) => class_subtype(env, sub, target, seen),
        _ => false,
    }
}

fn class_subtype(
    env: &dyn TypeEnv,
    sub: &Type,
    target: &ClassType,
    seen: &mut HashSet<TypeVarId>,
) -> bool {
    let Some(Type::Class(viewed)) = crate::instantiate_as_supertype(env, sub, target.def) else {
        return false;
    };
    if target.args.is_empty() {
        return true;
    }
    if viewed.args.len() != target.args.len() {
        return false;
    }
    viewed
        .args
        .iter()
        .zip(&target.args)
        .all(|(s, t)| contained_by(env, s, t, seen))
}

/// Type argument containment `s <= t` (JLS 4.5.1).
fn contained_by(env: &dyn TypeEnv, s: &Type, t: &Type, seen: &mut HashSet<TypeVarId>) -> bool {
    let object = Type::class(env.well_known().object, vec![]);
    match t {
        Type::Wildcard(WildcardBound::Unbounded) => true,
        Type::Wildcard(WildcardBound::Extends(upper)) => match s {
            Type::Wildcard(WildcardBound::Extends(s_upper)) => {
                subtype_inner(env, s_upper, upper, seen)
            }
            Type::Wildcard(_) => is_same_type(upper, &object),
            _ => subtype_inner(env, s, upper, seen),
        },
        Type::Wildcard(WildcardBound::Super(lower)) => match s {
            Type::Wildcard(WildcardBound::Super(s_lower)) => {
                subtype_inner(env, lower, s_lower, seen)
            }
            Type::Wildcard(_) => false,
            _ => subtype_inner(env, lower, s, seen),
        },
        _ => is_same_type(s, t),
    }
}

pub(crate) fn upper_bounds(env: &dyn TypeEnv, id: TypeVarId) -> Vec<Type> {
    match env.type_param(id) {
        Some(tp) if !tp.upper_bounds.is_empty() => tp.upper_bounds.clone(),
        _ => vec![Type::class(env.well_known().object, vec![])],
    }
}

/// Structural type identity where intersection components are compared as sets.
pub fn is_same_type(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Class(x), Type::Class(y)) => {
            x.def == y.def
                && x.args.len() == y.args.len()
                && x.args.iter().zip(&y.args).all(|(a, b)| is_same_type(a, b))
        }
        (Type::Array(x), Type::Array(y)) => is_same_type(x, y),
        (Type::Wildcard(x), Type::Wildcard(y)) => match (x, y) {
            (WildcardBound::Unbounded, WildcardBound::Unbounded) => true,
            (WildcardBound::Extends(x), WildcardBound::Extends(y))
            | (WildcardBound::Super(x), WildcardBound::Super(y)) => is_same_type(x, y),
            _ => false,
        },
        (Type::Intersection(xs), Type::Intersection(ys)) => {
            xs.iter().all(|x| ys.iter().any(|y| is_same_type(x, y)))
                && ys.iter().all(|y| xs.iter().any(|x| is_same_type(x, y)))
        }
        _ => a == b,
    }
}

/// Whether `sub` names a proper subclass or subinterface of `sup` (ignoring type arguments).
pub fn is_subclass(env: &dyn TypeEnv, sub: ClassId, sup: ClassId) -> bool {
    sub != sup && crate::instantiate_as_supertype(env, &Type::class(sub, vec![]), sup).is_some()
}

/// Unchecked conversion (JLS 5.1.9): a raw `arg` whose class is a subclass of the generic class
/// named by a parameterized `formal`.
pub fn is_unchecked_convertible(env: &dyn TypeEnv, arg: &Type, formal: &Type) -> bool {
    let Type::Class(target) = formal else {
        return false;
    };
    if target.args.is_empty() {
        return false;
    }
    matches!(
        crate::instantiate_as_supertype(env, arg, target.def),
        Some(Type::Class(viewed)) if viewed.args.is_empty()
    )
}

pub fn boxed_class(env: &dyn TypeEnv, prim: PrimitiveType) -> ClassId {
    let wk = env.well_known();
    match prim {
        PrimitiveType::Boolean => wk.boolean,
        PrimitiveType::Byte => wk.byte,
        PrimitiveType::Short => wk.short,
        PrimitiveType::Char => wk.character,
        PrimitiveType::Int => wk.integer,
        PrimitiveType::Long => wk.long,
        PrimitiveType::Float => wk.float,
        PrimitiveType::Double => wk.double,
    }
}

pub fn unboxed_primitive(env: &dyn TypeEnv, ty: &Type) -> Option<PrimitiveType> {
    let Type::Class(ct) = ty else {
        return None;
    };
    let wk = env.well_known();
    let prim = match ct.def {
        id if id == wk.boolean => PrimitiveType::Boolean,
        id if id == wk.byte => PrimitiveType::Byte,
        id if id == wk.short => PrimitiveType::Short,
        id if id == wk.character => PrimitiveType::Char,
        id if id == wk.integer => PrimitiveType::Int,
        id if id == wk.long => PrimitiveType::Long,
        id if id == wk.float => PrimitiveType::Float,
        id if id == wk.double => PrimitiveType::Double,
        _ => return None,
    };
    Some(prim)
}
