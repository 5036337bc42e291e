//! Per-type validation of a class's own and inherited members, independent of any call site.

use std::collections::{BTreeMap, BTreeSet};

use nova_types::{
    all_ancestors, is_same_type, is_subclass, ClassId, ClassType, HierarchyError, Type, TypeEnv,
};

use crate::collect::{
    class_method_wins, is_override_equivalent, is_subsignature, prune_overridden, Candidate,
    PruneMode,
};
use crate::config::DiagnosticKind;
use crate::signature::{return_type_substitutable, MethodId, MethodSignature};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConsistencyError {
    /// Two members declared in `class` share an erased signature.
    DuplicateMethod {
        class: ClassId,
        first: MethodId,
        duplicate: MethodId,
    },
    /// Same erasure without an override relation.
    NameClash {
        class: ClassId,
        method: MethodId,
        other: MethodId,
    },
    IncompatibleInheritedReturnTypes {
        class: ClassId,
        methods: Vec<MethodId>,
    },
    DuplicateInheritedDefault {
        class: ClassId,
        methods: Vec<MethodId>,
    },
    /// `method` overrides `overridden` with a return type that cannot substitute for it.
    IncompatibleReturnType {
        class: ClassId,
        method: MethodId,
        overridden: MethodId,
    },
}

impl ConsistencyError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            ConsistencyError::DuplicateMethod { .. } => DiagnosticKind::DuplicateMethod,
            ConsistencyError::NameClash { .. } => DiagnosticKind::NameClash,
            ConsistencyError::IncompatibleInheritedReturnTypes { .. } => {
                DiagnosticKind::IncompatibleInheritedReturnTypes
            }
            ConsistencyError::DuplicateInheritedDefault { .. } => {
                DiagnosticKind::DuplicateInheritedDefault
            }
            ConsistencyError::IncompatibleReturnType { .. } => {
                DiagnosticKind::IncompatibleReturnType
            }
        }
    }

    pub fn class(&self) -> ClassId {
        match self {
            ConsistencyError::DuplicateMethod { class, .. }
            | ConsistencyError::NameClash { class, .. }
            | ConsistencyError::IncompatibleInheritedReturnTypes { class, .. }
            | ConsistencyError::DuplicateInheritedDefault { class, .. }
            | ConsistencyError::IncompatibleReturnType { class, .. } => *class,
        }
    }

    /// Every member the finding refers to.
    pub fn methods(&self) -> Vec<MethodId> {
        match self {
            ConsistencyError::DuplicateMethod {
                first, duplicate, ..
            } => vec![*first, *duplicate],
            ConsistencyError::NameClash { method, other, .. } => vec![*method, *other],
            ConsistencyError::IncompatibleInheritedReturnTypes { methods, .. }
            | ConsistencyError::DuplicateInheritedDefault { methods, .. } => methods.clone(),
            ConsistencyError::IncompatibleReturnType {
                method, overridden, ..
            } => vec![*method, *overridden],
        }
    }
}

/// Validate `class` against the consistency rules for declared and inherited members.
///
/// The result is a set, so repeated validation of an unchanged class is identical. Only a
/// malformed hierarchy is an `Err`.
pub fn validate(env: &dyn TypeEnv, class: ClassId) -> Result<BTreeSet<ConsistencyError>, HierarchyError> {
    let class_def = env
        .class(class)
        .ok_or(HierarchyError::MissingClass { class })?;
    let self_type = ClassType::new(
        class,
        class_def.type_params.iter().copied().map(Type::TypeVar).collect(),
    );
    let ancestors = all_ancestors(env, &self_type)?;

    let mut errors = BTreeSet::new();
    check_duplicates(env, class, &mut errors);

    let declared: Vec<Candidate> = (0..class_def.methods.len())
        .filter_map(|index| MethodSignature::from_method(env, class, index))
        .filter(|sig| !sig.is_static())
        .map(|sig| Candidate::new(env, sig, self_type.clone()))
        .collect();

    let mut inherited = Vec::new();
    for view in &ancestors {
        let Some(def) = env.class(view.def) else {
            continue;
        };
        inherited.extend(
            (0..def.methods.len())
                .filter_map(|index| MethodSignature::from_method(env, view.def, index))
                .filter(|sig| !sig.is_static())
                .map(|sig| Candidate::new(env, sig, view.clone())),
        );
    }
    let inherited = prune_overridden(env, inherited, PruneMode::SubtypeOnly);

    check_declared_against_inherited(env, class, &declared, &inherited, &mut errors);
    check_inherited_pairs(env, class, &declared, &inherited, &mut errors);

    for error in &errors {
        tracing::debug!(target: "nova.overload", class = class.to_raw(), error = ?error, "consistency error");
    }
    Ok(errors)
}

fn check_duplicates(env: &dyn TypeEnv, class: ClassId, errors: &mut BTreeSet<ConsistencyError>) {
    let Some(class_def) = env.class(class) else {
        return;
    };

    let methods: Vec<MethodSignature> = (0..class_def.methods.len())
        .filter_map(|index| MethodSignature::from_method(env, class, index))
        .collect();
    let constructors: Vec<MethodSignature> = (0..class_def.constructors.len())
        .filter_map(|index| MethodSignature::from_constructor(env, class, index))
        .collect();

    for members in [methods, constructors] {
        let erased: Vec<Vec<Type>> = members.iter().map(|m| m.erased_params(env)).collect();
        for (j, duplicate) in members.iter().enumerate() {
            let first = members[..j].iter().enumerate().find(|(i, m)| {
                m.name == duplicate.name && same_types(&erased[*i], &erased[j])
            });
            if let Some((_, first)) = first {
                errors.insert(ConsistencyError::DuplicateMethod {
                    class,
                    first: first.id,
                    duplicate: duplicate.id,
                });
            }
        }
    }
}

fn check_declared_against_inherited(
    env: &dyn TypeEnv,
    class: ClassId,
    declared: &[Candidate],
    inherited: &[Candidate],
    errors: &mut BTreeSet<ConsistencyError>,
) {
    for method in declared {
        for other in inherited.iter().filter(|o| o.name() == method.name()) {
            if is_subsignature(env, method, other) {
                if !return_type_substitutable(env, &method.return_type, &other.return_type) {
                    errors.insert(ConsistencyError::IncompatibleReturnType {
                        class,
                        method: method.id(),
                        overridden: other.id(),
                    });
                }
            } else if same_declared_erasure(env, method, other) {
                errors.insert(ConsistencyError::NameClash {
                    class,
                    method: method.id(),
                    other: other.id(),
                });
            }
        }
    }
}

fn check_inherited_pairs(
    env: &dyn TypeEnv,
    class: ClassId,
    declared: &[Candidate],
    inherited: &[Candidate],
    errors: &mut BTreeSet<ConsistencyError>,
) {
    // Members overridden in `class` itself cannot conflict with each other, and neither can
    // members a concrete superclass method implements with a compatible return type.
    let live: Vec<&Candidate> = inherited
        .iter()
        .filter(|m| !declared.iter().any(|d| is_subsignature(env, d, m)))
        .filter(|m| {
            !inherited.iter().any(|c| {
                class_method_wins(env, c, m)
                    && return_type_substitutable(env, &c.return_type, &m.return_type)
            })
        })
        .collect();

    // Groups keyed by (name, erased parameters) so each conflict is reported once.
    let mut incompatible: BTreeMap<String, BTreeSet<MethodId>> = BTreeMap::new();
    let mut defaults: BTreeMap<String, BTreeSet<MethodId>> = BTreeMap::new();

    for (i, a) in live.iter().enumerate() {
        for b in &live[i + 1..] {
            if a.name() != b.name() || !independent(env, a.owner(), b.owner()) {
                continue;
            }
            if is_override_equivalent(env, a, b) {
                let key = group_key(env, a);
                let substitutable = return_type_substitutable(env, &a.return_type, &b.return_type)
                    || return_type_substitutable(env, &b.return_type, &a.return_type);
                if !substitutable {
                    incompatible
                        .entry(key)
                        .or_default()
                        .extend([a.id(), b.id()]);
                } else if conflicting_defaults(env, a, b) {
                    defaults.entry(key).or_default().extend([a.id(), b.id()]);
                }
            } else if same_declared_erasure(env, a, b) {
                let (method, other) = if a.id() <= b.id() {
                    (a.id(), b.id())
                } else {
                    (b.id(), a.id())
                };
                errors.insert(ConsistencyError::NameClash {
                    class,
                    method,
                    other,
                });
            }
        }
    }

    errors.extend(incompatible.into_values().map(|methods| {
        ConsistencyError::IncompatibleInheritedReturnTypes {
            class,
            methods: methods.into_iter().collect(),
        }
    }));
    errors.extend(
        defaults
            .into_values()
            .map(|methods| ConsistencyError::DuplicateInheritedDefault {
                class,
                methods: methods.into_iter().collect(),
            }),
    );
}

/// Two interface members where at least one is a default: the class inherits both bodies, or
/// a body alongside an abstract declaration it does not implement.
fn conflicting_defaults(env: &dyn TypeEnv, a: &Candidate, b: &Candidate) -> bool {
    let in_interface = |m: &Candidate| env.class(m.owner()).is_some_and(|def| def.is_interface());
    in_interface(a)
        && in_interface(b)
        && (a.signature.is_default() || b.signature.is_default())
}

fn independent(env: &dyn TypeEnv, a: ClassId, b: ClassId) -> bool {
    a != b && !is_subclass(env, a, b) && !is_subclass(env, b, a)
}

/// Erasure of the declarations themselves, not of their inherited views.
fn same_declared_erasure(env: &dyn TypeEnv, a: &Candidate, b: &Candidate) -> bool {
    a.name() == b.name()
        && same_types(&a.signature.erased_params(env), &b.signature.erased_params(env))
}

fn group_key(env: &dyn TypeEnv, m: &Candidate) -> String {
    let params: Vec<String> = m
        .erased_params(env)
        .iter()
        .map(|p| nova_types::type_sort_key(env, p))
        .collect();
    format!("{}({})", m.name(), params.join(","))
}

fn same_types(a: &[Type], b: &[Type]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| is_same_type(x, y))
}
