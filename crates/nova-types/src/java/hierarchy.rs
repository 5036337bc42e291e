//! Read-only traversal of the class/interface supertype graph.
//!
//! The graph is a DAG keyed by [`ClassId`]; every walk carries an explicit visited set, so diamond
//! shaped hierarchies visit each type once and malformed cyclic input terminates with
//! [`HierarchyError::Cyclic`].

use std::collections::{HashMap, HashSet, VecDeque};

use crate::java::helpers::direct_supertypes;
use crate::{ClassId, ClassType, Type, TypeEnv};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("cyclic inheritance involving `{name}`")]
    Cyclic { class: ClassId, name: String },
    #[error("unknown class #{}", class.to_raw())]
    MissingClass { class: ClassId },
}

/// Direct superclass (if any) followed by the direct superinterfaces of `ty`, each substituted
/// with `ty`'s type arguments.
pub fn supertypes_of(env: &dyn TypeEnv, ty: &ClassType) -> Vec<Type> {
    direct_supertypes(env, ty.def, &ty.args)
        .into_iter()
        .map(Type::Class)
        .collect()
}

/// Every proper ancestor of `ty`, each visited once.
///
/// Order: the superclass chain nearest-first, then interfaces breadth-first in declaration order
/// (interfaces of `ty` itself before those of its superclasses). `Object` is reported where the
/// superclass chain reaches it, or last when `ty` is an interface.
pub fn all_ancestors(env: &dyn TypeEnv, ty: &ClassType) -> Result<Vec<ClassType>, HierarchyError> {
    check_acyclic(env, ty.def)?;

    let object = env.well_known().object;
    let mut visited: HashSet<ClassId> = HashSet::new();
    visited.insert(ty.def);

    let mut chain = vec![ty.clone()];
    let mut out = Vec::new();
    let mut current = ty.clone();
    loop {
        let is_interface = env
            .class(current.def)
            .is_some_and(|def| def.is_interface());
        if is_interface {
            break;
        }
        let Some(superclass) = direct_supertypes(env, current.def, &current.args)
            .into_iter()
            .next()
            .filter(|sc| !env.class(sc.def).is_some_and(|def| def.is_interface()))
        else {
            break;
        };
        if !visited.insert(superclass.def) {
            break;
        }
        out.push(superclass.clone());
        chain.push(superclass.clone());
        current = superclass;
    }

    let mut queue: VecDeque<ClassType> = VecDeque::new();
    for link in &chain {
        queue.extend(
            direct_supertypes(env, link.def, &link.args)
                .into_iter()
                .filter(|sup| env.class(sup.def).is_some_and(|def| def.is_interface())),
        );
    }
    while let Some(iface) = queue.pop_front() {
        if !visited.insert(iface.def) {
            continue;
        }
        queue.extend(
            direct_supertypes(env, iface.def, &iface.args)
                .into_iter()
                .filter(|sup| sup.def != object),
        );
        out.push(iface);
    }

    if visited.insert(object) {
        out.push(ClassType::new(object, vec![]));
    }

    tracing::trace!(
        target: "nova.types",
        root = %crate::format_type(env, &Type::Class(ty.clone())),
        ancestors = out.len(),
        "computed ancestors"
    );
    Ok(out)
}

/// Reject hierarchies where a type transitively extends itself.
pub fn check_acyclic(env: &dyn TypeEnv, root: ClassId) -> Result<(), HierarchyError> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        InProgress,
        Done,
    }

    fn declared_supertypes(env: &dyn TypeEnv, id: ClassId) -> Vec<ClassId> {
        let Some(def) = env.class(id) else {
            return Vec::new();
        };
        def.super_class
            .iter()
            .chain(def.interfaces.iter())
            .filter_map(|ty| ty.as_class().map(|ct| ct.def))
            .collect()
    }

    let mut marks: HashMap<ClassId, Mark> = HashMap::new();
    // Explicit stack of (class, next supertype index) to avoid recursion on deep hierarchies.
    let mut stack: Vec<(ClassId, Vec<ClassId>, usize)> = Vec::new();

    if env.class(root).is_none() {
        return Err(HierarchyError::MissingClass { class: root });
    }
    marks.insert(root, Mark::InProgress);
    stack.push((root, declared_supertypes(env, root), 0));

    while let Some((id, supers, next)) = stack.last_mut() {
        let Some(sup) = supers.get(*next).copied() else {
            marks.insert(*id, Mark::Done);
            stack.pop();
            continue;
        };
        *next += 1;

        match marks.get(&sup).copied() {
            Some(Mark::Done) => {}
            Some(Mark::InProgress) => {
                let name = env
                    .class(sup)
                    .map(|def| def.name.clone())
                    .unwrap_or_default();
                tracing::debug!(target: "nova.types", class = %name, "cyclic hierarchy");
                return Err(HierarchyError::Cyclic { class: sup, name });
            }
            None => {
                if env.class(sup).is_none() {
                    return Err(HierarchyError::MissingClass { class: sup });
                }
                marks.insert(sup, Mark::InProgress);
                let supers = declared_supertypes(env, sup);
                stack.push((sup, supers, 0));
            }
        }
    }

    Ok(())
}
