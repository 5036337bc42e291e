//! Method and constructor signatures as the resolver sees them.

use nova_types::{
    erasure, is_subtype, is_unchecked_convertible, ClassId, Type, TypeEnv, TypeVarId,
};

/// Name used for constructor signatures.
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberKind {
    Method,
    Constructor,
}

/// Stable identity of a declared member: the declaring class plus the member's index in that
/// class's method or constructor list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId {
    pub owner: ClassId,
    pub kind: MemberKind,
    pub index: usize,
}

impl MethodId {
    pub fn method(owner: ClassId, index: usize) -> Self {
        Self {
            owner,
            kind: MemberKind::Method,
            index,
        }
    }

    pub fn constructor(owner: ClassId, index: usize) -> Self {
        Self {
            owner,
            kind: MemberKind::Constructor,
            index,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Static,
    Instance { is_abstract: bool, is_default: bool },
    Constructor,
}

/// How a call site names its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CallKind {
    /// `Type.m(..)`.
    Static,
    /// `expr.m(..)` or an unqualified call inside an instance context.
    Instance,
    /// `new Type(..)`.
    Constructor,
}

/// A declared member, unsubstituted. Type variables refer to the declaring class's own type
/// parameters and the member's own type parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSignature {
    pub id: MethodId,
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub is_varargs: bool,
    pub return_type: Type,
    pub throws: Vec<Type>,
    pub kind: MethodKind,
}

impl MethodSignature {
    pub fn from_method(env: &dyn TypeEnv, owner: ClassId, index: usize) -> Option<Self> {
        let class_def = env.class(owner)?;
        let method = class_def.methods.get(index)?;
        let kind = if method.is_static {
            MethodKind::Static
        } else {
            MethodKind::Instance {
                is_abstract: method.is_abstract,
                is_default: class_def.is_interface() && !method.is_abstract,
            }
        };
        Some(Self {
            id: MethodId::method(owner, index),
            name: method.name.clone(),
            type_params: method.type_params.clone(),
            params: method.params.clone(),
            is_varargs: method.is_varargs,
            return_type: method.return_type.clone(),
            throws: method.throws.clone(),
            kind,
        })
    }

    /// Constructor `index` of `owner`. A class that declares no constructors gets the implicit
    /// nullary one at index 0.
    pub fn from_constructor(env: &dyn TypeEnv, owner: ClassId, index: usize) -> Option<Self> {
        let class_def = env.class(owner)?;
        if class_def.is_interface() {
            return None;
        }
        let self_type = Type::class(
            owner,
            class_def.type_params.iter().copied().map(Type::TypeVar).collect(),
        );
        let (type_params, params, throws, is_varargs) = match class_def.constructors.get(index) {
            Some(ctor) => (
                ctor.type_params.clone(),
                ctor.params.clone(),
                ctor.throws.clone(),
                ctor.is_varargs,
            ),
            None if class_def.constructors.is_empty() && index == 0 => {
                (Vec::new(), Vec::new(), Vec::new(), false)
            }
            None => return None,
        };
        Some(Self {
            id: MethodId::constructor(owner, index),
            name: CONSTRUCTOR_NAME.to_string(),
            type_params,
            params,
            is_varargs,
            return_type: self_type,
            throws,
            kind: MethodKind::Constructor,
        })
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn is_static(&self) -> bool {
        self.kind == MethodKind::Static
    }

    pub fn is_abstract(&self) -> bool {
        matches!(
            self.kind,
            MethodKind::Instance {
                is_abstract: true,
                ..
            }
        )
    }

    pub fn is_default(&self) -> bool {
        matches!(
            self.kind,
            MethodKind::Instance {
                is_default: true,
                ..
            }
        )
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Declared parameter types after erasure.
    pub fn erased_params(&self, env: &dyn TypeEnv) -> Vec<Type> {
        self.params.iter().map(|p| erasure(env, p)).collect()
    }
}

/// Return-type-substitutability (JLS 8.4.5): can a method returning `r1` stand in for one
/// returning `r2`?
pub fn return_type_substitutable(env: &dyn TypeEnv, r1: &Type, r2: &Type) -> bool {
    match (r1, r2) {
        (Type::Void, Type::Void) => true,
        (Type::Void, _) | (_, Type::Void) => false,
        (Type::Primitive(a), Type::Primitive(b)) => a == b,
        (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
        _ => {
            is_subtype(env, r1, r2)
                || is_unchecked_convertible(env, r1, r2)
                || *r1 == erasure(env, r2)
        }
    }
}
