//! The resolution driver.
//!
//! `Collecting -> Phase(Strict) -> Phase(Loose) -> Phase(VarArgs) -> Reducing -> Done`. A phase
//! hands over to the next one only when no candidate is applicable in it; the first non-empty
//! phase goes to `Reducing`, and no phase is ever retried.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use nova_types::{erasure, format_type, substitute, ClassId, HierarchyError, Type, TypeEnv};

use crate::applicability::{check_applicable, Applicable, Phase, Rejection, TypeWarning};
use crate::cache::OnceMap;
use crate::collect::{collect_candidates, Candidate};
use crate::config::{DiagnosticKind, OverloadConfig, Severity};
use crate::consistency::{self, ConsistencyError};
use crate::infer::InferenceContext;
use crate::signature::{CallKind, MemberKind, MethodId, CONSTRUCTOR_NAME};
use crate::specificity::{maximal, pick_among_equivalent};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionQuery {
    pub name: String,
    /// Static type of the receiver; the enclosing class for unqualified calls.
    pub receiver: Type,
    pub call_kind: CallKind,
    pub explicit_type_args: Option<Vec<Type>>,
    pub args: Vec<Type>,
}

impl ResolutionQuery {
    pub fn method(receiver: Type, name: impl Into<String>, args: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            receiver,
            call_kind: CallKind::Instance,
            explicit_type_args: None,
            args,
        }
    }

    pub fn static_method(receiver: Type, name: impl Into<String>, args: Vec<Type>) -> Self {
        Self {
            call_kind: CallKind::Static,
            ..Self::method(receiver, name, args)
        }
    }

    pub fn constructor(class: Type, args: Vec<Type>) -> Self {
        Self {
            call_kind: CallKind::Constructor,
            ..Self::method(class, CONSTRUCTOR_NAME, args)
        }
    }

    #[must_use]
    pub fn with_type_args(mut self, type_args: Vec<Type>) -> Self {
        self.explicit_type_args = Some(type_args);
        self
    }

    pub fn is_constructor_call(&self) -> bool {
        self.call_kind == CallKind::Constructor
    }
}

/// The selected member and how it was instantiated for the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodBinding {
    pub candidate: Candidate,
    /// Empty for non-generic candidates.
    pub inference: InferenceContext,
    /// Inferred or explicit type arguments, in declaration order.
    pub inferred_type_args: Vec<Type>,
    pub params: Vec<Type>,
    /// Erased when the call needed an unchecked conversion.
    pub return_type: Type,
    pub throws: Vec<Type>,
    pub phase: Phase,
    pub used_varargs: bool,
    pub warnings: Vec<TypeWarning>,
}

impl MethodBinding {
    fn new(env: &dyn TypeEnv, applicable: Applicable) -> Self {
        let instantiation = applicable.inference.instantiation();
        let unchecked = applicable.unchecked();
        let view = |ty: &Type| {
            if unchecked {
                erasure(env, ty)
            } else {
                substitute(ty, &instantiation)
            }
        };
        let candidate = applicable.candidate;
        let return_type = view(&candidate.return_type);
        let throws = candidate.throws.iter().map(view).collect();
        let inferred_type_args = candidate
            .type_params
            .iter()
            .filter_map(|var| applicable.inference.solved(*var).cloned())
            .collect();
        Self {
            inference: applicable.inference,
            inferred_type_args,
            params: applicable.params,
            return_type,
            throws,
            phase: applicable.phase,
            used_varargs: applicable.used_varargs,
            warnings: applicable.warnings,
            candidate,
        }
    }

    pub fn id(&self) -> MethodId {
        self.candidate.id()
    }
}

/// Candidates rejected in one phase, with the reason for each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseAttempt {
    pub phase: Phase,
    pub rejected: Vec<Rejection>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionResult {
    Unique(Box<MethodBinding>),
    /// Every maximally specific candidate, in collection order.
    Ambiguous(Vec<Candidate>),
    /// One attempt per phase tried.
    NotApplicable(Vec<PhaseAttempt>),
    NameClash(Candidate, Candidate),
    IncompatibleInheritedReturnTypes(Vec<Candidate>),
}

impl ResolutionResult {
    pub fn binding(&self) -> Option<&MethodBinding> {
        match self {
            ResolutionResult::Unique(binding) => Some(&**binding),
            _ => None,
        }
    }

    /// `None` for a successful resolution.
    pub fn kind(&self) -> Option<DiagnosticKind> {
        match self {
            ResolutionResult::Unique(_) => None,
            ResolutionResult::Ambiguous(_) => Some(DiagnosticKind::Ambiguous),
            ResolutionResult::NotApplicable(_) => Some(DiagnosticKind::NotApplicable),
            ResolutionResult::NameClash(..) => Some(DiagnosticKind::NameClash),
            ResolutionResult::IncompatibleInheritedReturnTypes(_) => {
                Some(DiagnosticKind::IncompatibleInheritedReturnTypes)
            }
        }
    }
}

/// A call-site result plus the receiver's consistency errors that involve the called name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub result: ResolutionResult,
    pub consistency: Vec<ConsistencyError>,
}

impl Resolution {
    /// Every diagnostic kind this resolution reports, call-site first.
    pub fn diagnostics(&self) -> Vec<DiagnosticKind> {
        let mut kinds = Vec::new();
        match &self.result {
            ResolutionResult::Unique(binding) => {
                kinds.extend(binding.warnings.iter().map(|w| w.kind()));
            }
            other => kinds.extend(other.kind()),
        }
        kinds.extend(self.consistency.iter().map(ConsistencyError::kind));
        kinds
    }

    pub fn is_fatal(&self, config: &OverloadConfig) -> bool {
        self.diagnostics()
            .into_iter()
            .any(|kind| config.severity_of(kind) == Severity::Error)
    }
}

type CandidateKey = (Type, String, CallKind);

/// Resolves calls against one [`TypeEnv`] snapshot, caching candidate sets and consistency
/// results per receiver.
///
/// The environment must not change while the resolver is alive. A resolver can be shared by
/// reference across threads.
pub struct OverloadResolver<'env> {
    env: &'env dyn TypeEnv,
    candidates: OnceMap<CandidateKey, Arc<[Candidate]>>,
    consistency: OnceMap<ClassId, Arc<BTreeSet<ConsistencyError>>>,
}

impl std::fmt::Debug for OverloadResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverloadResolver")
            .field("cached_candidate_sets", &self.candidates.len())
            .field("cached_classes", &self.consistency.len())
            .finish()
    }
}

enum State {
    Collecting,
    Phase(Phase),
    Reducing(Vec<Applicable>),
    Done(ResolutionResult),
}

impl<'env> OverloadResolver<'env> {
    pub fn new(env: &'env dyn TypeEnv) -> Self {
        Self {
            env,
            candidates: OnceMap::default(),
            consistency: OnceMap::default(),
        }
    }

    pub fn env(&self) -> &'env dyn TypeEnv {
        self.env
    }

    pub fn candidates(
        &self,
        receiver: &Type,
        name: &str,
        call_kind: CallKind,
    ) -> Result<Arc<[Candidate]>, HierarchyError> {
        let key = (receiver.clone(), name.to_string(), call_kind);
        self.candidates.get_or_try_compute(key, || {
            collect_candidates(self.env, receiver, name, call_kind).map(Arc::from)
        })
    }

    pub fn validate(&self, class: ClassId) -> Result<Arc<BTreeSet<ConsistencyError>>, HierarchyError> {
        self.consistency.get_or_try_compute(class, || {
            consistency::validate(self.env, class).map(Arc::new)
        })
    }

    pub fn resolve(&self, query: &ResolutionQuery) -> Result<Resolution, HierarchyError> {
        let env = self.env;
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut consistency = Vec::new();
        let mut attempts = Vec::new();

        let mut state = State::Collecting;
        let result = loop {
            state = match state {
                State::Collecting => {
                    tracing::debug!(
                        target: "nova.overload",
                        name = %query.name,
                        receiver = %format_type(env, &query.receiver),
                        args = query.args.len(),
                        "collecting candidates"
                    );
                    candidates = self
                        .candidates(&query.receiver, &query.name, query.call_kind)?
                        .to_vec();

                    if let Type::Class(class_type) = &query.receiver {
                        let errors = self.validate(class_type.def)?;
                        consistency = errors
                            .iter()
                            .filter(|e| {
                                e.methods()
                                    .iter()
                                    .any(|id| member_name(env, *id) == Some(query.name.as_str()))
                            })
                            .cloned()
                            .collect();
                        let duplicates: HashSet<MethodId> = consistency
                            .iter()
                            .filter_map(|e| match e {
                                ConsistencyError::DuplicateMethod { duplicate, .. } => {
                                    Some(*duplicate)
                                }
                                _ => None,
                            })
                            .collect();
                        candidates.retain(|c| !duplicates.contains(&c.id()));
                    }
                    State::Phase(Phase::Strict)
                }
                State::Phase(phase) => {
                    tracing::debug!(
                        target: "nova.overload",
                        name = %query.name,
                        phase = ?phase,
                        candidates = candidates.len(),
                        "trying phase"
                    );
                    let mut applicable = Vec::new();
                    let mut rejected = Vec::new();
                    for candidate in &candidates {
                        match check_applicable(
                            env,
                            candidate,
                            &query.args,
                            query.explicit_type_args.as_deref(),
                            phase,
                        ) {
                            Ok(found) => applicable.push(found),
                            Err(reason) => {
                                tracing::trace!(
                                    target: "nova.overload",
                                    candidate = ?candidate.id(),
                                    phase = ?phase,
                                    reason = ?reason,
                                    "candidate rejected"
                                );
                                rejected.push(Rejection {
                                    candidate: candidate.id(),
                                    reason,
                                });
                            }
                        }
                    }
                    if !applicable.is_empty() {
                        State::Reducing(applicable)
                    } else {
                        attempts.push(PhaseAttempt { phase, rejected });
                        match phase.next() {
                            Some(next) => State::Phase(next),
                            None => State::Done(ResolutionResult::NotApplicable(std::mem::take(
                                &mut attempts,
                            ))),
                        }
                    }
                }
                State::Reducing(applicable) => {
                    tracing::debug!(
                        target: "nova.overload",
                        name = %query.name,
                        applicable = applicable.len(),
                        "reducing to the most specific candidate"
                    );
                    State::Done(self.reduce(query, applicable, &consistency))
                }
                State::Done(result) => break result,
            };
        };

        tracing::debug!(
            target: "nova.overload",
            name = %query.name,
            outcome = ?result.kind(),
            consistency_errors = consistency.len(),
            "resolution done"
        );
        Ok(Resolution {
            result,
            consistency,
        })
    }

    fn reduce(
        &self,
        query: &ResolutionQuery,
        applicable: Vec<Applicable>,
        consistency: &[ConsistencyError],
    ) -> ResolutionResult {
        let env = self.env;
        let mut best = maximal(env, applicable, query.args.len());
        if best.len() > 1 {
            if let Some(result) = conflicting_inheritance(query, &best, consistency) {
                return result;
            }
        }
        match pick_among_equivalent(env, &best) {
            Some(index) => {
                let winner = best.swap_remove(index);
                ResolutionResult::Unique(Box::new(MethodBinding::new(env, winner)))
            }
            None => ResolutionResult::Ambiguous(best.into_iter().map(|m| m.candidate).collect()),
        }
    }
}

/// A tie that is exactly a clash already reported for the receiver's inherited members.
fn conflicting_inheritance(
    query: &ResolutionQuery,
    best: &[Applicable],
    consistency: &[ConsistencyError],
) -> Option<ResolutionResult> {
    let ids: BTreeSet<MethodId> = best.iter().map(|m| m.candidate.id()).collect();
    let receiver = query.receiver.as_class().map(|c| c.def);
    let tied = || best.iter().map(|m| m.candidate.clone());
    consistency.iter().find_map(|error| match error {
        ConsistencyError::NameClash { method, other, .. }
            if ids == BTreeSet::from([*method, *other])
                && receiver != Some(method.owner)
                && receiver != Some(other.owner) =>
        {
            let mut pair = tied();
            Some(ResolutionResult::NameClash(pair.next()?, pair.next()?))
        }
        ConsistencyError::IncompatibleInheritedReturnTypes { methods, .. }
            if ids == methods.iter().copied().collect::<BTreeSet<_>>() =>
        {
            Some(ResolutionResult::IncompatibleInheritedReturnTypes(tied().collect()))
        }
        _ => None,
    })
}

fn member_name(env: &dyn TypeEnv, id: MethodId) -> Option<&str> {
    match id.kind {
        MemberKind::Constructor => Some(CONSTRUCTOR_NAME),
        MemberKind::Method => env
            .class(id.owner)
            .and_then(|def| def.methods.get(id.index))
            .map(|m| m.name.as_str()),
    }
}

/// Resolve one call with a throwaway resolver.
pub fn resolve(env: &dyn TypeEnv, query: &ResolutionQuery) -> Result<Resolution, HierarchyError> {
    OverloadResolver::new(env).resolve(query)
}

/// Validate one class; see [`consistency::validate`].
pub fn validate(env: &dyn TypeEnv, class: ClassId) -> Result<BTreeSet<ConsistencyError>, HierarchyError> {
    consistency::validate(env, class)
}
