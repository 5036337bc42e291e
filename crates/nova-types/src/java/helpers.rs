use std::collections::{HashMap, HashSet, VecDeque};

use crate::{ClassId, ClassKind, ClassType, Type, TypeEnv, TypeVarId, WildcardBound};

/// Type-variable to type mapping used for instantiating generic declarations.
pub type Substitution = HashMap<TypeVarId, Type>;

/// Return `ty` viewed as `target` by walking the supertype graph and applying type argument
/// substitution along the way.
///
/// Missing class metadata simply returns `None`. Raw types stay raw while walking, so viewing a
/// raw `ArrayList` as `List` yields the raw `List`.
///
/// Example: `ArrayList<String>` instantiated as `List` returns `List<String>`.
pub fn instantiate_as_supertype(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Option<Type> {
    fn inner(
        env: &dyn TypeEnv,
        ty: &Type,
        target: ClassId,
        seen_type_vars: &mut HashSet<TypeVarId>,
    ) -> Option<Type> {
        match ty {
            Type::Array(_) => {
                let wk = env.well_known();
                if target == wk.object || target == wk.cloneable || target == wk.serializable {
                    return Some(Type::class(target, vec![]));
                }
                return None;
            }
            Type::Intersection(parts) => {
                // Deterministically iterate intersection components.
                let mut sorted: Vec<&Type> = parts.iter().collect();
                sorted.sort_by_cached_key(|ty| crate::type_sort_key(env, ty));

                // If the components provide incompatible instantiations, the view is ambiguous.
                let mut out: Option<Type> = None;
                for part in sorted {
                    let Some(found) = inner(env, part, target, seen_type_vars) else {
                        continue;
                    };
                    out = match out {
                        None => Some(found),
                        Some(existing) => Some(merge_instantiated_supertypes(env, existing, found)?),
                    };
                }
                return out;
            }
            Type::TypeVar(id) => {
                if !seen_type_vars.insert(*id) {
                    return None;
                }

                let mut bounds = crate::java::subtyping::upper_bounds(env, *id);
                bounds.sort_by_cached_key(|ty| crate::type_sort_key(env, ty));

                let mut out: Option<Type> = None;
                for bound in &bounds {
                    let Some(found) = inner(env, bound, target, seen_type_vars) else {
                        continue;
                    };
                    out = match out {
                        None => Some(found),
                        Some(existing) => match merge_instantiated_supertypes(env, existing, found)
                        {
                            Some(merged) => Some(merged),
                            None => {
                                seen_type_vars.remove(id);
                                return None;
                            }
                        },
                    };
                }

                seen_type_vars.remove(id);
                return out;
            }
            _ => {}
        }

        let Type::Class(ClassType { def, args }) = ty else {
            return None;
        };

        let mut queue: VecDeque<ClassType> = VecDeque::new();
        let mut seen: HashSet<(ClassId, Vec<Type>)> = HashSet::new();
        queue.push_back(ClassType::new(*def, args.clone()));

        while let Some(current) = queue.pop_front() {
            if !seen.insert((current.def, current.args.clone())) {
                continue;
            }
            if current.def == target {
                return Some(Type::Class(current));
            }
            queue.extend(direct_supertypes(env, current.def, &current.args));
        }

        None
    }

    let mut seen_type_vars = HashSet::new();
    inner(env, ty, target, &mut seen_type_vars)
}

/// Direct supertypes of `def` instantiated with `args`: the superclass first, then the declared
/// interfaces in source order.
///
/// Classes without an explicit superclass extend `Object`, and interfaces have `Object` as their
/// only implicit supertype (JLS 4.10.2). A raw instantiation yields raw supertypes.
pub(crate) fn direct_supertypes(env: &dyn TypeEnv, def: ClassId, args: &[Type]) -> Vec<ClassType> {
    let Some(class_def) = env.class(def) else {
        return Vec::new();
    };
    let object = env.well_known().object;
    let raw = args.is_empty() && !class_def.type_params.is_empty();

    let mut subst: Substitution = HashMap::with_capacity(class_def.type_params.len());
    if !raw {
        for (idx, formal) in class_def.type_params.iter().copied().enumerate() {
            if let Some(arg) = args.get(idx) {
                subst.insert(formal, arg.clone());
            }
        }
    }
    let view = |ty: &Type| -> Option<ClassType> {
        match ty {
            Type::Class(ct) if raw => Some(ClassType::new(ct.def, vec![])),
            Type::Class(_) => match substitute(ty, &subst) {
                Type::Class(ct) => Some(ct),
                _ => None,
            },
            _ => None,
        }
    };

    let mut out = Vec::with_capacity(class_def.interfaces.len() + 1);
    match (&class_def.super_class, class_def.kind) {
        (Some(sc), _) => out.extend(view(sc)),
        (None, ClassKind::Class) if def != object => out.push(ClassType::new(object, vec![])),
        _ => {}
    }
    out.extend(class_def.interfaces.iter().filter_map(view));
    if class_def.kind == ClassKind::Interface && !out.iter().any(|ct| ct.def == object) {
        out.push(ClassType::new(object, vec![]));
    }
    out
}

fn merge_instantiated_supertypes(env: &dyn TypeEnv, a: Type, b: Type) -> Option<Type> {
    if crate::is_same_type(&a, &b) {
        return Some(a);
    }

    let a_sub_b = crate::is_subtype(env, &a, &b);
    let b_sub_a = crate::is_subtype(env, &b, &a);

    match (a_sub_b, b_sub_a) {
        (true, _) => Some(a),
        (false, true) => Some(b),
        (false, false) => None,
    }
}

/// Replace type variables according to `subst`. Unmapped variables are left untouched.
pub fn substitute(ty: &Type, subst: &Substitution) -> Type {
    if subst.is_empty() {
        return ty.clone();
    }
    match ty {
        Type::TypeVar(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Class(ct) => Type::class(ct.def, ct.args.iter().map(|a| substitute(a, subst)).collect()),
        Type::Array(elem) => Type::array(substitute(elem, subst)),
        Type::Wildcard(WildcardBound::Unbounded) => ty.clone(),
        Type::Wildcard(WildcardBound::Extends(b)) => {
            Type::Wildcard(WildcardBound::Extends(Box::new(substitute(b, subst))))
        }
        Type::Wildcard(WildcardBound::Super(b)) => {
            Type::Wildcard(WildcardBound::Super(Box::new(substitute(b, subst))))
        }
        Type::Intersection(parts) => {
            Type::Intersection(parts.iter().map(|p| substitute(p, subst)).collect())
        }
        Type::Void | Type::Primitive(_) | Type::Null => ty.clone(),
    }
}

/// Type erasure (JLS 4.6).
pub fn erasure(env: &dyn TypeEnv, ty: &Type) -> Type {
    fn inner(env: &dyn TypeEnv, ty: &Type, seen: &mut HashSet<TypeVarId>) -> Type {
        let object = || Type::class(env.well_known().object, vec![]);
        match ty {
            Type::Class(ct) => Type::class(ct.def, vec![]),
            Type::Array(elem) => Type::array(inner(env, elem, seen)),
            Type::TypeVar(id) => {
                if !seen.insert(*id) {
                    return object();
                }
                let erased = match env.type_param(*id).and_then(|tp| tp.upper_bounds.first()) {
                    Some(first) => inner(env, first, seen),
                    None => object(),
                };
                seen.remove(id);
                erased
            }
            Type::Intersection(parts) => match parts.first() {
                Some(first) => inner(env, first, seen),
                None => object(),
            },
            Type::Wildcard(WildcardBound::Extends(bound)) => inner(env, bound, seen),
            Type::Wildcard(_) => object(),
            Type::Void | Type::Primitive(_) | Type::Null => ty.clone(),
        }
    }

    inner(env, ty, &mut HashSet::new())
}

/// Whether the runtime representation of `ty` carries its full type (JLS 4.7).
pub fn is_reifiable(ty: &Type) -> bool {
    match ty {
        Type::Void | Type::Primitive(_) | Type::Null => true,
        Type::Class(ct) => ct
            .args
            .iter()
            .all(|arg| matches!(arg, Type::Wildcard(WildcardBound::Unbounded))),
        Type::Array(elem) => is_reifiable(elem),
        Type::TypeVar(_) | Type::Wildcard(_) | Type::Intersection(_) => false,
    }
}

/// Whether `ty` mentions any type variable accepted by `is_var`.
pub fn contains_type_vars(ty: &Type, is_var: &dyn Fn(TypeVarId) -> bool) -> bool {
    match ty {
        Type::TypeVar(id) => is_var(*id),
        Type::Class(ct) => ct.args.iter().any(|a| contains_type_vars(a, is_var)),
        Type::Array(elem) => contains_type_vars(elem, is_var),
        Type::Wildcard(WildcardBound::Extends(b)) | Type::Wildcard(WildcardBound::Super(b)) => {
            contains_type_vars(b, is_var)
        }
        Type::Intersection(parts) => parts.iter().any(|p| contains_type_vars(p, is_var)),
        Type::Wildcard(WildcardBound::Unbounded) | Type::Void | Type::Primitive(_) | Type::Null => {
            false
        }
    }
}

/// Build a normalized intersection: nested intersections are flattened, duplicates removed and
/// components ordered deterministically (classes before interfaces). A single component is
/// returned as-is.
pub fn make_intersection(env: &dyn TypeEnv, parts: Vec<Type>) -> Type {
    let mut flat: Vec<Type> = Vec::with_capacity(parts.len());
    let mut stack = parts;
    stack.reverse();
    while let Some(part) = stack.pop() {
        match part {
            Type::Intersection(inner) => stack.extend(inner.into_iter().rev()),
            other => {
                if !flat.iter().any(|existing| crate::is_same_type(existing, &other)) {
                    flat.push(other);
                }
            }
        }
    }

    flat.sort_by_cached_key(|ty| {
        (
            intersection_component_rank(env, ty),
            crate::type_sort_key(env, ty),
        )
    });
    if flat.len() == 1 {
        return flat.remove(0);
    }
    Type::Intersection(flat)
}

fn intersection_component_rank(env: &dyn TypeEnv, ty: &Type) -> u8 {
    match ty {
        Type::Class(ct) => match env.class(ct.def).map(|d| d.kind) {
            Some(ClassKind::Interface) => 2,
            _ => 0,
        },
        Type::Array(_) => 0,
        Type::TypeVar(_) => 1,
        _ => 3,
    }
}

fn is_class_like(env: &dyn TypeEnv, ty: &Type) -> bool {
    match ty {
        Type::Class(ct) => {
            ct.def != env.well_known().object
                && env.class(ct.def).map(|d| d.kind) != Some(ClassKind::Interface)
        }
        Type::Array(_) => true,
        _ => false,
    }
}

/// Greatest lower bound of a set of upper bounds (JLS 5.1.10).
///
/// Redundant supertypes are dropped. Returns `None` when two unrelated classes would have to be
/// intersected, which no type can satisfy.
pub fn glb(env: &dyn TypeEnv, types: &[Type]) -> Option<Type> {
    let mut minimal: Vec<Type> = Vec::new();
    let mut flat: Vec<Type> = Vec::new();
    for ty in types {
        match ty {
            Type::Intersection(parts) => flat.extend(parts.iter().cloned()),
            other => flat.push(other.clone()),
        }
    }

    for ty in flat {
        if minimal.iter().any(|m| crate::is_subtype(env, m, &ty)) {
            continue;
        }
        minimal.retain(|m| !crate::is_subtype(env, &ty, m));
        minimal.push(ty);
    }

    if minimal.is_empty() {
        return Some(Type::class(env.well_known().object, vec![]));
    }
    if minimal.iter().filter(|ty| is_class_like(env, ty)).count() > 1 {
        return None;
    }
    Some(make_intersection(env, minimal))
}

/// Least upper bound of a set of reference types (JLS 4.10.4), simplified.
///
/// Candidate supertypes are the erased classes shared by every input. Only the minimal ones are
/// kept; each is parameterized when all inputs agree on its type arguments and left raw otherwise.
pub fn lub(env: &dyn TypeEnv, types: &[Type]) -> Type {
    let object = Type::class(env.well_known().object, vec![]);

    let mut distinct: Vec<Type> = Vec::new();
    for ty in types {
        if matches!(ty, Type::Null) {
            continue;
        }
        if !distinct.iter().any(|d| crate::is_same_type(d, ty)) {
            distinct.push(ty.clone());
        }
    }
    match distinct.len() {
        0 => return if types.is_empty() { object } else { Type::Null },
        1 => return distinct.pop().unwrap_or(object),
        _ => {}
    }

    if let Some(top) = distinct
        .iter()
        .find(|candidate| distinct.iter().all(|ty| crate::is_subtype(env, ty, candidate)))
    {
        return top.clone();
    }

    let shared: Vec<ClassId> = reachable_class_ids(env, &distinct[0])
        .into_iter()
        .filter(|id| {
            distinct[1..]
                .iter()
                .all(|ty| instantiate_as_supertype(env, ty, *id).is_some())
        })
        .collect();
    let minimal: Vec<ClassId> = shared
        .iter()
        .copied()
        .filter(|id| {
            !shared
                .iter()
                .any(|other| crate::is_subclass(env, *other, *id))
        })
        .collect();
    if minimal.is_empty() {
        return object;
    }

    let parts: Vec<Type> = minimal
        .into_iter()
        .map(|id| {
            let views: Vec<Option<Type>> = distinct
                .iter()
                .map(|ty| instantiate_as_supertype(env, ty, id))
                .collect();
            match views.first() {
                Some(Some(first))
                    if views
                        .iter()
                        .all(|v| v.as_ref().is_some_and(|v| crate::is_same_type(v, first))) =>
                {
                    first.clone()
                }
                _ => Type::class(id, vec![]),
            }
        })
        .collect();
    make_intersection(env, parts)
}

fn reachable_class_ids(env: &dyn TypeEnv, ty: &Type) -> Vec<ClassId> {
    let wk = env.well_known();
    let mut roots: Vec<ClassId> = Vec::new();
    let mut pending = vec![ty.clone()];
    let mut seen_vars = HashSet::new();
    while let Some(ty) = pending.pop() {
        match ty {
            Type::Class(ct) => roots.push(ct.def),
            Type::Array(_) => roots.extend([wk.object, wk.cloneable, wk.serializable]),
            Type::TypeVar(id) => {
                if seen_vars.insert(id) {
                    pending.extend(crate::java::subtyping::upper_bounds(env, id));
                }
            }
            Type::Intersection(parts) => pending.extend(parts),
            _ => {}
        }
    }

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut queue: VecDeque<ClassId> = roots.into_iter().collect();
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        out.push(id);
        queue.extend(direct_supertypes(env, id, &[]).into_iter().map(|ct| ct.def));
    }
    out
}
