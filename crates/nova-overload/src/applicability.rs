//! Applicability by strict, loose and variable-arity invocation (JLS 15.12.2.2 - 15.12.2.4).

use nova_types::{
    boxed_class, is_reifiable, is_subtype, is_unchecked_convertible, substitute,
    unboxed_primitive, Type, TypeEnv,
};

use crate::collect::Candidate;
use crate::config::DiagnosticKind;
use crate::infer::{infer, InferenceContext, InferenceFailure};
use crate::signature::MethodId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Strict,
    Loose,
    VarArgs,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Strict, Phase::Loose, Phase::VarArgs];

    pub fn allows_boxing(self) -> bool {
        self != Phase::Strict
    }

    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Strict => Some(Phase::Loose),
            Phase::Loose => Some(Phase::VarArgs),
            Phase::VarArgs => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UncheckedReason {
    /// A raw argument was passed where a parameterized type is expected.
    UncheckedConversion,
    /// A variable-arity call created an array of a non-reifiable element type.
    UncheckedVarargs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeWarning {
    Unchecked(UncheckedReason),
}

impl TypeWarning {
    pub fn kind(self) -> DiagnosticKind {
        match self {
            TypeWarning::Unchecked(UncheckedReason::UncheckedConversion) => {
                DiagnosticKind::UncheckedConversion
            }
            TypeWarning::Unchecked(UncheckedReason::UncheckedVarargs) => {
                DiagnosticKind::UncheckedVarargs
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Conversion {
    Subtype,
    Boxing,
    Unchecked,
}

/// The conversion that makes `arg` acceptable for `formal` in `phase`, if any.
pub(crate) fn conversion(
    env: &dyn TypeEnv,
    arg: &Type,
    formal: &Type,
    phase: Phase,
) -> Option<Conversion> {
    if is_subtype(env, arg, formal) {
        return Some(Conversion::Subtype);
    }
    if phase.allows_boxing() {
        match arg {
            Type::Primitive(prim) => {
                let boxed = Type::class(boxed_class(env, *prim), vec![]);
                if is_subtype(env, &boxed, formal) {
                    return Some(Conversion::Boxing);
                }
            }
            _ => {
                if let (Some(prim), Type::Primitive(target)) = (unboxed_primitive(env, arg), formal) {
                    if prim.widens_to(*target) {
                        return Some(Conversion::Boxing);
                    }
                }
            }
        }
    }
    if is_unchecked_convertible(env, arg, formal) {
        return Some(Conversion::Unchecked);
    }
    None
}

/// A candidate that passed one phase, together with the instantiation it passed with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applicable {
    pub candidate: Candidate,
    pub phase: Phase,
    pub inference: InferenceContext,
    /// Declared parameter types with inferred type arguments substituted.
    pub params: Vec<Type>,
    /// One formal per argument; the trailing array parameter is expanded when `used_varargs`.
    pub formals: Vec<Type>,
    pub used_varargs: bool,
    pub warnings: Vec<TypeWarning>,
}

impl Applicable {
    pub fn unchecked(&self) -> bool {
        self.warnings
            .contains(&TypeWarning::Unchecked(UncheckedReason::UncheckedConversion))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    ArityMismatch { expected: usize, found: usize },
    /// Variable-arity invocation of a fixed-arity member.
    NotVariableArity,
    ArgumentMismatch { position: usize },
    ExplicitTypeArgumentCount { expected: usize, found: usize },
    Inference(InferenceFailure),
}

impl RejectReason {
    /// First failing argument position, when the rejection is tied to one.
    pub fn position(&self) -> Option<usize> {
        match self {
            RejectReason::ArgumentMismatch { position }
            | RejectReason::Inference(InferenceFailure::Incompatible { position }) => {
                Some(*position)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub candidate: MethodId,
    pub reason: RejectReason,
}

/// Test `candidate` against `args` in `phase`.
///
/// Explicit type arguments only apply to generic candidates; a non-generic candidate ignores
/// them (JLS 15.12.2.1).
pub fn check_applicable(
    env: &dyn TypeEnv,
    candidate: &Candidate,
    args: &[Type],
    explicit_type_args: Option<&[Type]>,
    phase: Phase,
) -> Result<Applicable, RejectReason> {
    let arity = candidate.arity();
    match phase {
        Phase::Strict | Phase::Loose => {
            if arity != args.len() {
                return Err(RejectReason::ArityMismatch {
                    expected: arity,
                    found: args.len(),
                });
            }
            check_form(env, candidate, args, explicit_type_args, phase, false)
        }
        Phase::VarArgs => {
            if !candidate.is_varargs() || arity == 0 {
                return Err(RejectReason::NotVariableArity);
            }
            if args.len() + 1 < arity {
                return Err(RejectReason::ArityMismatch {
                    expected: arity - 1,
                    found: args.len(),
                });
            }
            match check_form(env, candidate, args, explicit_type_args, phase, true) {
                // A single trailing argument may still match the array parameter itself.
                Err(reason) if args.len() == arity => {
                    check_form(env, candidate, args, explicit_type_args, phase, false)
                        .map_err(|_| reason)
                }
                result => result,
            }
        }
    }
}

/// `Ok(true)` when applicable, `Ok(false)` when rejected for a shape or conversion mismatch, and
/// the inference failure when inference rejected the candidate.
pub fn is_applicable(
    env: &dyn TypeEnv,
    candidate: &Candidate,
    args: &[Type],
    phase: Phase,
) -> Result<bool, InferenceFailure> {
    match check_applicable(env, candidate, args, None, phase) {
        Ok(_) => Ok(true),
        Err(RejectReason::Inference(failure)) => Err(failure),
        Err(_) => Ok(false),
    }
}

/// Parameter types for `count` arguments with the trailing array parameter spread into its
/// element type.
pub(crate) fn expand_varargs(params: &[Type], count: usize) -> Vec<Type> {
    let Some((last, fixed)) = params.split_last() else {
        return Vec::new();
    };
    let elem = last.array_element().unwrap_or(last);
    (0..count)
        .map(|i| fixed.get(i).unwrap_or(elem).clone())
        .collect()
}

fn check_form(
    env: &dyn TypeEnv,
    candidate: &Candidate,
    args: &[Type],
    explicit_type_args: Option<&[Type]>,
    phase: Phase,
    expand: bool,
) -> Result<Applicable, RejectReason> {
    let declared_formals = if expand {
        expand_varargs(&candidate.params, args.len())
    } else {
        candidate.params.clone()
    };

    let inference = if candidate.is_generic() {
        match explicit_type_args {
            Some(type_args) => {
                if type_args.len() != candidate.type_params.len() {
                    return Err(RejectReason::ExplicitTypeArgumentCount {
                        expected: candidate.type_params.len(),
                        found: type_args.len(),
                    });
                }
                InferenceContext::from_explicit(env, candidate, type_args)
                    .map_err(RejectReason::Inference)?
            }
            None => infer(env, candidate, &declared_formals, args, phase).map_err(
                |failure| match failure {
                    InferenceFailure::Incompatible { position } => {
                        RejectReason::ArgumentMismatch { position }
                    }
                    other => RejectReason::Inference(other),
                },
            )?,
        }
    } else {
        InferenceContext::default()
    };

    let instantiation = inference.instantiation();
    let formals: Vec<Type> = declared_formals
        .iter()
        .map(|f| substitute(f, &instantiation))
        .collect();

    let mut warnings = Vec::new();
    for (position, (arg, formal)) in args.iter().zip(&formals).enumerate() {
        match conversion(env, arg, formal, phase) {
            None => return Err(RejectReason::ArgumentMismatch { position }),
            Some(Conversion::Unchecked) => {
                let warning = TypeWarning::Unchecked(UncheckedReason::UncheckedConversion);
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
            Some(Conversion::Subtype | Conversion::Boxing) => {}
        }
    }

    let params: Vec<Type> = candidate
        .params
        .iter()
        .map(|p| substitute(p, &instantiation))
        .collect();
    if expand {
        if let Some(Type::Array(elem)) = params.last() {
            if !is_reifiable(elem) {
                warnings.push(TypeWarning::Unchecked(UncheckedReason::UncheckedVarargs));
            }
        }
    }

    tracing::trace!(
        target: "nova.overload",
        name = candidate.name(),
        phase = ?phase,
        used_varargs = expand,
        "candidate applicable"
    );
    Ok(Applicable {
        candidate: candidate.clone(),
        phase,
        inference,
        params,
        formals,
        used_varargs: expand,
        warnings,
    })
}
