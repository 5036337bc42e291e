//! Choosing the most specific method (JLS 15.12.2.5).

use nova_types::{erasure, is_same_type, is_subtype, Type, TypeEnv};

use crate::applicability::{expand_varargs, Applicable};
use crate::infer::infer_subtypes;
use crate::signature::return_type_substitutable;

/// `m1` is at least as specific as `m2` for a call with `arg_count` arguments.
///
/// Both are compared on their declared (uninstantiated) formals. When `m2` is generic its type
/// parameters are inferred so that every formal of `m1` is a subtype of the matching formal of
/// `m2`; `m1`'s own type parameters stay opaque and are only known through their bounds.
pub fn at_least_as_specific(
    env: &dyn TypeEnv,
    m1: &Applicable,
    m2: &Applicable,
    arg_count: usize,
) -> bool {
    let len = if m1.used_varargs || m2.used_varargs {
        arg_count.max(m1.candidate.arity()).max(m2.candidate.arity())
    } else {
        arg_count
    };
    let f1 = specificity_formals(m1, len);
    let f2 = specificity_formals(m2, len);
    if f1.len() != f2.len() {
        return false;
    }

    if m2.candidate.is_generic() {
        infer_subtypes(env, &m2.candidate, &f1, &f2).is_ok()
    } else {
        f1.iter().zip(&f2).all(|(s, t)| is_subtype(env, s, t))
    }
}

fn specificity_formals(m: &Applicable, len: usize) -> Vec<Type> {
    if m.used_varargs {
        expand_varargs(&m.candidate.params, len)
    } else {
        m.candidate.params.clone()
    }
}

/// Strictly more specific: `m1` is at least as specific as `m2` but not the other way round.
///
/// A generic method never beats a non-generic one whose formals already fit the generic
/// method's erased formals.
pub fn more_specific(env: &dyn TypeEnv, m1: &Applicable, m2: &Applicable, arg_count: usize) -> bool {
    if !at_least_as_specific(env, m1, m2, arg_count)
        || at_least_as_specific(env, m2, m1, arg_count)
    {
        return false;
    }
    if m1.candidate.is_generic() && !m2.candidate.is_generic() {
        let generic = specificity_formals(m1, arg_count.max(m1.candidate.arity()));
        let plain = specificity_formals(m2, arg_count.max(m2.candidate.arity()));
        let covariant = generic.len() == plain.len()
            && plain
                .iter()
                .zip(&generic)
                .all(|(p, g)| is_subtype(env, p, &erasure(env, g)));
        if covariant {
            return false;
        }
    }
    true
}

/// The applicable candidates that no other candidate is strictly more specific than.
pub fn maximal(env: &dyn TypeEnv, applicable: Vec<Applicable>, arg_count: usize) -> Vec<Applicable> {
    let dominated: Vec<bool> = applicable
        .iter()
        .map(|m| {
            applicable
                .iter()
                .any(|other| more_specific(env, other, m, arg_count))
        })
        .collect();
    applicable
        .into_iter()
        .zip(dominated)
        .filter_map(|(m, dominated)| (!dominated).then_some(m))
        .collect()
}

/// Tie-break between maximally specific candidates that share an erased parameter list.
///
/// Exactly one concrete candidate wins. When all are abstract, the first whose return type is
/// substitutable for every other's wins. Returns the index of the winner.
pub fn pick_among_equivalent(env: &dyn TypeEnv, maximal: &[Applicable]) -> Option<usize> {
    let (first, rest) = maximal.split_first()?;
    if rest.is_empty() {
        return Some(0);
    }
    let erased = first.candidate.erased_params(env);
    let equivalent = rest.iter().all(|m| {
        let other = m.candidate.erased_params(env);
        other.len() == erased.len() && other.iter().zip(&erased).all(|(a, b)| is_same_type(a, b))
    });
    if !equivalent {
        return None;
    }

    let concrete: Vec<usize> = maximal
        .iter()
        .enumerate()
        .filter_map(|(idx, m)| (!m.candidate.signature.is_abstract()).then_some(idx))
        .collect();
    match concrete.as_slice() {
        [only] => Some(*only),
        [] => maximal.iter().position(|m| {
            maximal.iter().all(|other| {
                return_type_substitutable(
                    env,
                    &m.candidate.return_type,
                    &other.candidate.return_type,
                )
            })
        }),
        _ => None,
    }
}
