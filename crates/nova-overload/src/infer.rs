//! Type argument inference for generic candidates (a simplified JLS 18).
//!
//! Constraints `arg -> formal` are reduced to per-variable bound sets, each variable is then
//! resolved to its `equal` bound, else the lub of its lower bounds, else the glb of its upper
//! bounds. Self-referential bounds such as `T extends Comparable<T>` are not solved iteratively:
//! the full solution is substituted back into every bound and checked once.

use std::collections::BTreeMap;

use nova_types::{
    boxed_class, contains_type_vars, glb, instantiate_as_supertype, is_same_type, is_subtype,
    lub, substitute, Substitution, Type, TypeEnv, TypeVarId, WildcardBound,
};

use crate::applicability::{conversion, Phase};
use crate::collect::Candidate;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundSet {
    pub upper: Vec<Type>,
    pub lower: Vec<Type>,
    pub equal: Option<Type>,
}

/// Why a generic candidate could not be instantiated for one argument list.
///
/// Failures are local to the attempt: the candidate is dropped from the phase and nothing else
/// is affected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferenceFailure {
    /// The argument at `position` cannot be converted to its formal parameter type.
    Incompatible { position: usize },
    ConflictingEquality {
        var: TypeVarId,
        first: Type,
        second: Type,
    },
    /// No type satisfies all upper bounds of `var`.
    UnsatisfiableBounds { var: TypeVarId },
    BoundViolation {
        var: TypeVarId,
        solution: Type,
        bound: Type,
    },
}

/// Bound sets and the solved instantiation for one (candidate, argument list) attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InferenceContext {
    vars: Vec<TypeVarId>,
    bounds: BTreeMap<TypeVarId, BoundSet>,
    solution: BTreeMap<TypeVarId, Type>,
}

impl InferenceContext {
    fn new(vars: &[TypeVarId]) -> Self {
        Self {
            vars: vars.to_vec(),
            bounds: vars.iter().map(|v| (*v, BoundSet::default())).collect(),
            solution: BTreeMap::new(),
        }
    }

    /// Instantiate `candidate` with explicitly supplied type arguments (`recv.<A, B>m(..)`).
    ///
    /// The caller is responsible for checking the argument count.
    pub fn from_explicit(
        env: &dyn TypeEnv,
        candidate: &Candidate,
        type_args: &[Type],
    ) -> Result<Self, InferenceFailure> {
        let mut ctx = Self::new(&candidate.type_params);
        for (var, arg) in candidate.type_params.iter().zip(type_args) {
            if let Some(bounds) = ctx.bounds.get_mut(var) {
                bounds.equal = Some(arg.clone());
            }
            ctx.solution.insert(*var, arg.clone());
        }

        let full = ctx.instantiation();
        for (var, solution) in &ctx.solution {
            for bound in declared_bounds(env, candidate, *var) {
                let bound = substitute(&bound, &full);
                if !is_subtype(env, solution, &bound) {
                    return Err(InferenceFailure::BoundViolation {
                        var: *var,
                        solution: solution.clone(),
                        bound,
                    });
                }
            }
        }
        Ok(ctx)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn vars(&self) -> &[TypeVarId] {
        &self.vars
    }

    pub fn bounds(&self, var: TypeVarId) -> Option<&BoundSet> {
        self.bounds.get(&var)
    }

    pub fn solution(&self) -> &BTreeMap<TypeVarId, Type> {
        &self.solution
    }

    pub fn solved(&self, var: TypeVarId) -> Option<&Type> {
        self.solution.get(&var)
    }

    /// The solved variables as a substitution.
    pub fn instantiation(&self) -> Substitution {
        self.solution
            .iter()
            .map(|(var, ty)| (*var, ty.clone()))
            .collect()
    }
}

/// Infer `candidate`'s type arguments from `args` passed to `formals` (the candidate's
/// parameter types, expanded for variable-arity invocation).
pub fn infer(
    env: &dyn TypeEnv,
    candidate: &Candidate,
    formals: &[Type],
    args: &[Type],
    phase: Phase,
) -> Result<InferenceContext, InferenceFailure> {
    let mode = match phase {
        Phase::Strict => Mode::Strict,
        Phase::Loose | Phase::VarArgs => Mode::Loose,
    };
    let mut inference = Inference::new(env, candidate, mode);
    for (position, (arg, formal)) in args.iter().zip(formals).enumerate() {
        inference.position = position;
        inference.reduce_compatible(arg, formal)?;
    }
    inference.resolve()
}

/// Infer `candidate`'s type arguments such that each `subs[i] <: sups[i]` by subtyping alone.
/// Used to compare a method's formals against a generic candidate's.
pub(crate) fn infer_subtypes(
    env: &dyn TypeEnv,
    candidate: &Candidate,
    subs: &[Type],
    sups: &[Type],
) -> Result<InferenceContext, InferenceFailure> {
    let mut inference = Inference::new(env, candidate, Mode::Subtype);
    for (position, (sub, sup)) in subs.iter().zip(sups).enumerate() {
        inference.position = position;
        inference.reduce_subtype(sub, sup)?;
    }
    inference.resolve()
}

fn declared_bounds(env: &dyn TypeEnv, candidate: &Candidate, var: TypeVarId) -> Vec<Type> {
    env.type_param(var)
        .map(|tp| {
            tp.upper_bounds
                .iter()
                .map(|b| substitute(b, &candidate.substitution))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Strict,
    Loose,
    Subtype,
}

struct Inference<'a> {
    env: &'a dyn TypeEnv,
    ctx: InferenceContext,
    mode: Mode,
    position: usize,
}

impl<'a> Inference<'a> {
    fn new(env: &'a dyn TypeEnv, candidate: &Candidate, mode: Mode) -> Self {
        let mut ctx = InferenceContext::new(&candidate.type_params);
        for var in &candidate.type_params {
            let declared = declared_bounds(env, candidate, *var);
            if let Some(bounds) = ctx.bounds.get_mut(var) {
                bounds.upper.extend(declared);
            }
        }
        Self {
            env,
            ctx,
            mode,
            position: 0,
        }
    }

    fn is_var(&self, id: TypeVarId) -> bool {
        self.ctx.bounds.contains_key(&id)
    }

    fn as_var(&self, ty: &Type) -> Option<TypeVarId> {
        match ty {
            Type::TypeVar(id) if self.is_var(*id) => Some(*id),
            _ => None,
        }
    }

    fn mentions_vars(&self, ty: &Type) -> bool {
        contains_type_vars(ty, &|id| self.is_var(id))
    }

    fn mismatch(&self) -> InferenceFailure {
        InferenceFailure::Incompatible {
            position: self.position,
        }
    }

    fn add_lower(&mut self, var: TypeVarId, ty: &Type) {
        if let Some(bounds) = self.ctx.bounds.get_mut(&var) {
            if !bounds.lower.iter().any(|b| is_same_type(b, ty)) {
                bounds.lower.push(ty.clone());
            }
        }
    }

    fn add_upper(&mut self, var: TypeVarId, ty: &Type) {
        if let Some(bounds) = self.ctx.bounds.get_mut(&var) {
            if !bounds.upper.iter().any(|b| is_same_type(b, ty)) {
                bounds.upper.push(ty.clone());
            }
        }
    }

    fn add_equal(&mut self, var: TypeVarId, ty: &Type) -> Result<(), InferenceFailure> {
        let Some(bounds) = self.ctx.bounds.get_mut(&var) else {
            return Ok(());
        };
        match bounds.equal.clone() {
            Some(first) if !is_same_type(&first, ty) => Err(InferenceFailure::ConflictingEquality {
                var,
                first,
                second: ty.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                bounds.equal = Some(ty.clone());
                Ok(())
            }
        }
    }

    /// `arg -> formal` in a strict or loose invocation context.
    fn reduce_compatible(&mut self, arg: &Type, formal: &Type) -> Result<(), InferenceFailure> {
        if !self.mentions_vars(formal) {
            let phase = match self.mode {
                Mode::Strict => Phase::Strict,
                Mode::Loose => Phase::Loose,
                Mode::Subtype => return self.reduce_subtype(arg, formal),
            };
            return match conversion(self.env, arg, formal, phase) {
                Some(_) => Ok(()),
                None => Err(self.mismatch()),
            };
        }

        if let Type::Primitive(prim) = arg {
            if self.mode != Mode::Loose {
                return Err(self.mismatch());
            }
            let boxed = Type::class(boxed_class(self.env, *prim), vec![]);
            return self.reduce_subtype(&boxed, formal);
        }

        // A raw argument for a parameterized formal is an unchecked conversion; it places no
        // bounds on the formal's type arguments.
        if let Type::Class(target) = formal {
            let raw_view = matches!(
                instantiate_as_supertype(self.env, arg, target.def),
                Some(Type::Class(view)) if view.args.is_empty()
            );
            if !target.args.is_empty() && raw_view {
                return Ok(());
            }
        }

        self.reduce_subtype(arg, formal)
    }

    /// `sub <: sup`.
    fn reduce_subtype(&mut self, sub: &Type, sup: &Type) -> Result<(), InferenceFailure> {
        if !self.mentions_vars(sub) && !self.mentions_vars(sup) {
            return if is_subtype(self.env, sub, sup) {
                Ok(())
            } else {
                Err(self.mismatch())
            };
        }

        if let Some(var) = self.as_var(sup) {
            match sub {
                Type::Null => {}
                Type::Primitive(_) | Type::Void => return Err(self.mismatch()),
                _ => {
                    self.add_lower(var, sub);
                    if let Some(sub_var) = self.as_var(sub) {
                        self.add_upper(sub_var, sup);
                    }
                }
            }
            return Ok(());
        }
        if let Some(var) = self.as_var(sub) {
            self.add_upper(var, sup);
            return Ok(());
        }

        match sup {
            Type::Class(target) => {
                if matches!(sub, Type::Null) {
                    return Ok(());
                }
                let Some(Type::Class(view)) = instantiate_as_supertype(self.env, sub, target.def)
                else {
                    return Err(self.mismatch());
                };
                if target.args.is_empty() {
                    return Ok(());
                }
                if view.args.len() != target.args.len() {
                    return Err(self.mismatch());
                }
                for (s, t) in view.args.iter().zip(&target.args) {
                    self.reduce_contained(s, t)?;
                }
                Ok(())
            }
            Type::Array(sup_elem) => match sub {
                Type::Null => Ok(()),
                Type::Array(sub_elem) => {
                    if sup_elem.is_primitive() || sub_elem.is_primitive() {
                        if sub_elem == sup_elem {
                            Ok(())
                        } else {
                            Err(self.mismatch())
                        }
                    } else {
                        self.reduce_subtype(sub_elem, sup_elem)
                    }
                }
                _ => Err(self.mismatch()),
            },
            Type::Intersection(parts) => {
                for part in parts {
                    self.reduce_subtype(sub, part)?;
                }
                Ok(())
            }
            _ => Err(self.mismatch()),
        }
    }

    /// Type argument containment `s <= t`.
    fn reduce_contained(&mut self, s: &Type, t: &Type) -> Result<(), InferenceFailure> {
        let object = Type::class(self.env.well_known().object, vec![]);
        match t {
            Type::Wildcard(WildcardBound::Unbounded) => Ok(()),
            Type::Wildcard(WildcardBound::Extends(t_bound)) => match s {
                Type::Wildcard(WildcardBound::Extends(s_bound)) => {
                    self.reduce_subtype(s_bound, t_bound)
                }
                Type::Wildcard(_) => self.reduce_subtype(&object, t_bound),
                _ => self.reduce_subtype(s, t_bound),
            },
            Type::Wildcard(WildcardBound::Super(t_bound)) => match s {
                Type::Wildcard(WildcardBound::Super(s_bound)) => {
                    self.reduce_subtype(t_bound, s_bound)
                }
                Type::Wildcard(_) => Err(self.mismatch()),
                _ => self.reduce_subtype(t_bound, s),
            },
            _ => match s {
                Type::Wildcard(_) => Err(self.mismatch()),
                _ => self.reduce_equal(s, t),
            },
        }
    }

    fn reduce_equal(&mut self, s: &Type, t: &Type) -> Result<(), InferenceFailure> {
        if !self.mentions_vars(s) && !self.mentions_vars(t) {
            return if is_same_type(s, t) {
                Ok(())
            } else {
                Err(self.mismatch())
            };
        }
        if let Some(var) = self.as_var(t) {
            return self.add_equal(var, s);
        }
        if let Some(var) = self.as_var(s) {
            return self.add_equal(var, t);
        }

        match (s, t) {
            (Type::Class(sc), Type::Class(tc))
                if sc.def == tc.def && sc.args.len() == tc.args.len() =>
            {
                for (sa, ta) in sc.args.iter().zip(&tc.args) {
                    self.reduce_equal_arg(sa, ta)?;
                }
                Ok(())
            }
            (Type::Array(se), Type::Array(te)) => self.reduce_equal(se, te),
            _ => Err(self.mismatch()),
        }
    }

    fn reduce_equal_arg(&mut self, s: &Type, t: &Type) -> Result<(), InferenceFailure> {
        match (s, t) {
            (
                Type::Wildcard(WildcardBound::Unbounded),
                Type::Wildcard(WildcardBound::Unbounded),
            ) => Ok(()),
            (
                Type::Wildcard(WildcardBound::Extends(a)),
                Type::Wildcard(WildcardBound::Extends(b)),
            )
            | (Type::Wildcard(WildcardBound::Super(a)), Type::Wildcard(WildcardBound::Super(b))) => {
                self.reduce_equal(a, b)
            }
            (Type::Wildcard(_), _) | (_, Type::Wildcard(_)) => Err(self.mismatch()),
            _ => self.reduce_equal(s, t),
        }
    }

    fn mentions_unresolved(&self, ty: &Type) -> bool {
        contains_type_vars(ty, &|id| {
            self.is_var(id) && !self.ctx.solution.contains_key(&id)
        })
    }

    fn resolve(mut self) -> Result<InferenceContext, InferenceFailure> {
        let mut pending = self.ctx.vars.clone();
        while !pending.is_empty() {
            // Prefer a variable whose bounds only mention solved variables (or itself).
            let next = pending
                .iter()
                .position(|var| self.dependencies_resolved(*var))
                .unwrap_or(0);
            let var = pending.remove(next);
            let solution = self.resolve_var(var)?;
            self.ctx.solution.insert(var, solution);
        }
        self.verify()?;
        Ok(self.ctx)
    }

    fn dependencies_resolved(&self, var: TypeVarId) -> bool {
        let Some(bounds) = self.ctx.bounds.get(&var) else {
            return true;
        };
        !bounds
            .equal
            .iter()
            .chain(&bounds.lower)
            .chain(&bounds.upper)
            .any(|ty| {
                contains_type_vars(ty, &|id| {
                    id != var && self.is_var(id) && !self.ctx.solution.contains_key(&id)
                })
            })
    }

    fn resolve_var(&self, var: TypeVarId) -> Result<Type, InferenceFailure> {
        let partial = self.ctx.instantiation();
        let bounds = self.ctx.bounds.get(&var).cloned().unwrap_or_default();

        if let Some(equal) = &bounds.equal {
            return Ok(substitute(equal, &partial));
        }

        let lower: Vec<Type> = bounds
            .lower
            .iter()
            .map(|ty| substitute(ty, &partial))
            .filter(|ty| !self.mentions_unresolved(ty))
            .collect();
        if !lower.is_empty() {
            return Ok(lub(self.env, &lower));
        }

        let upper: Vec<Type> = bounds
            .upper
            .iter()
            .map(|ty| substitute(ty, &partial))
            .filter(|ty| !self.mentions_unresolved(ty))
            .collect();
        glb(self.env, &upper).ok_or(InferenceFailure::UnsatisfiableBounds { var })
    }

    fn verify(&self) -> Result<(), InferenceFailure> {
        let full = self.ctx.instantiation();
        for var in &self.ctx.vars {
            let (Some(solution), Some(bounds)) = (self.ctx.solution.get(var), self.ctx.bounds.get(var))
            else {
                continue;
            };
            for upper in &bounds.upper {
                let bound = substitute(upper, &full);
                if !is_subtype(self.env, solution, &bound) {
                    return Err(InferenceFailure::BoundViolation {
                        var: *var,
                        solution: solution.clone(),
                        bound,
                    });
                }
            }
            for lower in &bounds.lower {
                if !is_subtype(self.env, &substitute(lower, &full), solution) {
                    return Err(InferenceFailure::UnsatisfiableBounds { var: *var });
                }
            }
        }
        Ok(())
    }
}
