//! Gathering the members a call site can see.
//!
//! A [`Candidate`] is a declared member viewed through one parameterization of its declaring
//! class. Viewing `AA<T>.test(T)` from `BB extends AA<CC>` yields a candidate whose parameter
//! list is `(CC)`; viewing any member of a raw type yields its erasure.

use std::collections::HashSet;
use std::sync::Arc;

use nova_types::{
    all_ancestors, erasure, is_same_type, is_subclass, substitute, ClassId, ClassType,
    HierarchyError, Substitution, Type, TypeEnv, TypeVarId,
};

use crate::signature::{CallKind, MethodId, MethodSignature};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub signature: Arc<MethodSignature>,
    /// The declaring class as seen from the query receiver.
    pub viewed_as: ClassType,
    /// Class type parameter bindings implied by `viewed_as`. Empty when `raw`.
    pub substitution: Substitution,
    /// Whether the member is seen through a raw type.
    pub raw: bool,
    /// Method type parameters still to be inferred. Dropped for members of raw types.
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub throws: Vec<Type>,
}

impl Candidate {
    pub fn new(env: &dyn TypeEnv, signature: MethodSignature, viewed_as: ClassType) -> Self {
        let class_params = env
            .class(viewed_as.def)
            .map(|def| def.type_params.clone())
            .unwrap_or_default();
        let raw = viewed_as.args.is_empty() && !class_params.is_empty();

        let substitution: Substitution = if raw {
            Substitution::new()
        } else {
            class_params
                .iter()
                .copied()
                .zip(viewed_as.args.iter().cloned())
                .collect()
        };

        // Static members keep their declared types even when accessed through a raw type.
        let erase = raw && !signature.is_static();
        let view = |ty: &Type| {
            if erase {
                erasure(env, ty)
            } else {
                substitute(ty, &substitution)
            }
        };
        let params = signature.params.iter().map(view).collect();
        let return_type = view(&signature.return_type);
        let throws = signature.throws.iter().map(view).collect();
        let type_params = if erase {
            Vec::new()
        } else {
            signature.type_params.clone()
        };

        Self {
            signature: Arc::new(signature),
            viewed_as,
            substitution,
            raw: erase,
            type_params,
            params,
            return_type,
            throws,
        }
    }

    pub fn id(&self) -> MethodId {
        self.signature.id
    }

    pub fn owner(&self) -> ClassId {
        self.signature.id.owner
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn is_varargs(&self) -> bool {
        self.signature.is_varargs
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Parameter types as seen from the receiver, after erasure.
    pub fn erased_params(&self, env: &dyn TypeEnv) -> Vec<Type> {
        self.params.iter().map(|p| erasure(env, p)).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PruneMode {
    /// Only remove members overridden or hidden by a subsignature member of a proper subtype.
    SubtypeOnly,
    /// Additionally remove abstract members implemented by an inherited concrete class method.
    Full,
}

/// Every member named `name` that a `call_kind` call on `receiver` can select, with overridden
/// members removed.
///
/// Same-erasure members from unrelated supertypes are kept side by side.
pub fn collect_candidates(
    env: &dyn TypeEnv,
    receiver: &Type,
    name: &str,
    call_kind: CallKind,
) -> Result<Vec<Candidate>, HierarchyError> {
    if call_kind == CallKind::Constructor {
        return collect_constructors(env, receiver);
    }

    let mut roots = Vec::new();
    receiver_roots(env, receiver, &mut HashSet::new(), &mut roots);

    let mut seen: HashSet<MethodId> = HashSet::new();
    let mut out = Vec::new();
    for root in roots {
        let mut views = vec![root.clone()];
        views.extend(all_ancestors(env, &root)?);

        for view in views {
            let Some(class_def) = env.class(view.def) else {
                continue;
            };
            for (index, method) in class_def.methods.iter().enumerate() {
                if method.name != name {
                    continue;
                }
                let visible = match call_kind {
                    // Static interface methods are not inherited (JLS 8.4.8).
                    CallKind::Static => {
                        method.is_static && (!class_def.is_interface() || view.def == root.def)
                    }
                    CallKind::Instance => !method.is_static,
                    CallKind::Constructor => false,
                };
                if !visible || !seen.insert(MethodId::method(view.def, index)) {
                    continue;
                }
                if let Some(signature) = MethodSignature::from_method(env, view.def, index) {
                    out.push(Candidate::new(env, signature, view.clone()));
                }
            }
        }
    }

    let collected = out.len();
    let out = prune_overridden(env, out, PruneMode::Full);
    tracing::trace!(
        target: "nova.overload",
        name,
        collected,
        kept = out.len(),
        "collected candidates"
    );
    Ok(out)
}

fn collect_constructors(env: &dyn TypeEnv, receiver: &Type) -> Result<Vec<Candidate>, HierarchyError> {
    let Type::Class(class_type) = receiver else {
        return Ok(Vec::new());
    };
    let Some(class_def) = env.class(class_type.def) else {
        return Err(HierarchyError::MissingClass {
            class: class_type.def,
        });
    };
    let count = class_def.constructors.len().max(1);
    Ok((0..count)
        .filter_map(|index| MethodSignature::from_constructor(env, class_type.def, index))
        .map(|signature| Candidate::new(env, signature, class_type.clone()))
        .collect())
}

fn receiver_roots(
    env: &dyn TypeEnv,
    ty: &Type,
    seen: &mut HashSet<TypeVarId>,
    out: &mut Vec<ClassType>,
) {
    match ty {
        Type::Class(class_type) => {
            if !out.contains(class_type) {
                out.push(class_type.clone());
            }
        }
        Type::TypeVar(id) => {
            if !seen.insert(*id) {
                return;
            }
            let bounds = env
                .type_param(*id)
                .map(|tp| tp.upper_bounds.clone())
                .unwrap_or_default();
            if bounds.is_empty() {
                receiver_roots(env, &object_type(env), seen, out);
            }
            for bound in &bounds {
                receiver_roots(env, bound, seen, out);
            }
        }
        Type::Intersection(parts) => {
            for part in parts {
                receiver_roots(env, part, seen, out);
            }
        }
        Type::Array(_) => receiver_roots(env, &object_type(env), seen, out),
        Type::Void | Type::Primitive(_) | Type::Wildcard(_) | Type::Null => {}
    }
}

fn object_type(env: &dyn TypeEnv) -> Type {
    Type::class(env.well_known().object, vec![])
}

/// Drop every candidate that another candidate in the set overrides or hides (JLS 8.4.8).
pub fn prune_overridden(
    env: &dyn TypeEnv,
    candidates: Vec<Candidate>,
    mode: PruneMode,
) -> Vec<Candidate> {
    let overridden: Vec<bool> = candidates
        .iter()
        .map(|sup| {
            candidates
                .iter()
                .any(|sub| overrides(env, sub, sup, mode))
        })
        .collect();
    candidates
        .into_iter()
        .zip(overridden)
        .filter_map(|(candidate, overridden)| (!overridden).then_some(candidate))
        .collect()
}

fn overrides(env: &dyn TypeEnv, sub: &Candidate, sup: &Candidate, mode: PruneMode) -> bool {
    if sub.owner() == sup.owner() || sub.name() != sup.name() {
        return false;
    }
    if is_subclass(env, sub.owner(), sup.owner()) {
        return is_subsignature(env, sub, sup);
    }
    if mode == PruneMode::SubtypeOnly || is_subclass(env, sup.owner(), sub.owner()) {
        return false;
    }

    class_method_wins(env, sub, sup)
}

/// A concrete class method inherited from a superclass implements an abstract member, or
/// overrides an interface default, of an unrelated supertype (JLS 8.4.8).
pub(crate) fn class_method_wins(env: &dyn TypeEnv, sub: &Candidate, sup: &Candidate) -> bool {
    let sub_in_class = env
        .class(sub.owner())
        .is_some_and(|def| !def.is_interface());
    sub_in_class
        && sub.owner() != sup.owner()
        && !sub.signature.is_abstract()
        && !sub.signature.is_static()
        && (sup.signature.is_abstract() || sup.signature.is_default())
        && is_subsignature(env, sub, sup)
}

/// `m1` is a subsignature of `m2` (JLS 8.4.2): the same signature after renaming type
/// parameters, or `m1` matches the erasure of `m2`.
pub fn is_subsignature(env: &dyn TypeEnv, m1: &Candidate, m2: &Candidate) -> bool {
    if m1.name() != m2.name() || m1.params.len() != m2.params.len() {
        return false;
    }

    if m1.type_params.len() == m2.type_params.len() {
        let rename: Substitution = m2
            .type_params
            .iter()
            .copied()
            .zip(m1.type_params.iter().copied().map(Type::TypeVar))
            .collect();
        let same_bounds = m1
            .type_params
            .iter()
            .zip(&m2.type_params)
            .all(|(tp1, tp2)| {
                let b1 = declared_bounds(env, m1, *tp1, &Substitution::new());
                let b2 = declared_bounds(env, m2, *tp2, &rename);
                same_type_set(&b1, &b2)
            });
        if same_bounds
            && m1
                .params
                .iter()
                .zip(&m2.params)
                .all(|(p1, p2)| is_same_type(p1, &substitute(p2, &rename)))
        {
            return true;
        }
    }

    m1.type_params.is_empty()
        && m1
            .params
            .iter()
            .zip(&m2.params)
            .all(|(p1, p2)| is_same_type(p1, &erasure(env, p2)))
}

/// `m1` and `m2` are override-equivalent: either is a subsignature of the other.
pub fn is_override_equivalent(env: &dyn TypeEnv, m1: &Candidate, m2: &Candidate) -> bool {
    is_subsignature(env, m1, m2) || is_subsignature(env, m2, m1)
}

fn declared_bounds(
    env: &dyn TypeEnv,
    candidate: &Candidate,
    tp: TypeVarId,
    rename: &Substitution,
) -> Vec<Type> {
    let bounds = env
        .type_param(tp)
        .map(|def| def.upper_bounds.clone())
        .unwrap_or_default();
    if bounds.is_empty() {
        return vec![object_type(env)];
    }
    bounds
        .iter()
        .map(|b| substitute(&substitute(b, &candidate.substitution), rename))
        .collect()
}

fn same_type_set(a: &[Type], b: &[Type]) -> bool {
    a.iter().all(|x| b.iter().any(|y| is_same_type(x, y)))
        && b.iter().all(|y| a.iter().any(|x| is_same_type(x, y)))
}
