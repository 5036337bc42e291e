//! Java method and constructor overload resolution.
//!
//! Given a receiver type, a member name and the static types of the actual arguments,
//! [`OverloadResolver::resolve`] selects the member a call binds to, following JLS 15.12.2:
//!
//! 1. collect every visible member with that name across the receiver's ancestors, viewed
//!    through the receiver's parameterization ([`collect`]);
//! 2. test applicability by strict, then loose, then variable-arity invocation, inferring type
//!    arguments for generic members ([`applicability`], [`infer`]);
//! 3. reduce the first non-empty phase to its most specific member ([`specificity`]).
//!
//! Independently of call sites, [`validate`] checks a class's declared and inherited members
//! for duplicate signatures, erasure clashes and incompatible inherited return types.
//!
//! Results are structured values; which ones are errors is decided by [`OverloadConfig`].

pub mod applicability;
mod cache;
pub mod collect;
pub mod config;
pub mod consistency;
pub mod infer;
pub mod resolve;
pub mod signature;
pub mod specificity;

pub use applicability::{
    check_applicable, is_applicable, Applicable, Phase, RejectReason, Rejection, TypeWarning,
    UncheckedReason,
};
pub use collect::{collect_candidates, Candidate};
pub use config::{json_schema, ConfigError, DiagnosticKind, OverloadConfig, Severity, SeverityOverrides};
pub use consistency::ConsistencyError;
pub use infer::{BoundSet, InferenceContext, InferenceFailure};
pub use resolve::{
    resolve, validate, MethodBinding, OverloadResolver, PhaseAttempt, Resolution,
    ResolutionQuery, ResolutionResult,
};
pub use signature::{CallKind, MemberKind, MethodId, MethodKind, MethodSignature, CONSTRUCTOR_NAME};
pub use specificity::{maximal, more_specific};
