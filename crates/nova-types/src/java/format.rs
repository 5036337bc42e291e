use std::fmt::Write;

use crate::{Type, TypeEnv, WildcardBound};

/// Render `ty` the way Java source would spell it, using simple class names.
pub fn format_type(env: &dyn TypeEnv, ty: &Type) -> String {
    let mut out = String::new();
    write_type(env, ty, false, &mut out);
    out
}

/// Deterministic ordering key that uses binary names, so two distinct classes with the same simple
/// name never collide.
pub fn type_sort_key(env: &dyn TypeEnv, ty: &Type) -> String {
    let mut out = String::new();
    write_type(env, ty, true, &mut out);
    out
}

fn write_type(env: &dyn TypeEnv, ty: &Type, qualified: bool, out: &mut String) {
    match ty {
        Type::Void => out.push_str("void"),
        Type::Null => out.push_str("null"),
        Type::Primitive(p) => out.push_str(p.keyword()),
        Type::Class(ct) => {
            match env.class(ct.def) {
                Some(def) if qualified => out.push_str(&def.name),
                Some(def) => out.push_str(def.simple_name()),
                None => {
                    let _ = write!(out, "<class#{}>", ct.def.to_raw());
                }
            }
            if !ct.args.is_empty() {
                out.push('<');
                for (idx, arg) in ct.args.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    write_type(env, arg, qualified, out);
                }
                out.push('>');
            }
        }
        Type::Array(elem) => {
            write_type(env, elem, qualified, out);
            out.push_str("[]");
        }
        Type::TypeVar(id) => match env.type_param(*id) {
            Some(tp) => {
                out.push_str(&tp.name);
                if qualified {
                    let _ = write!(out, "#{}", id.to_raw());
                }
            }
            None => {
                let _ = write!(out, "<tv#{}>", id.to_raw());
            }
        },
        Type::Wildcard(WildcardBound::Unbounded) => out.push('?'),
        Type::Wildcard(WildcardBound::Extends(bound)) => {
            out.push_str("? extends ");
            write_type(env, bound, qualified, out);
        }
        Type::Wildcard(WildcardBound::Super(bound)) => {
            out.push_str("? super ");
            write_type(env, bound, qualified, out);
        }
        Type::Intersection(parts) => {
            for (idx, part) in parts.iter().enumerate() {
                if idx > 0 {
                    out.push_str(" & ");
                }
                write_type(env, part, qualified, out);
            }
        }
    }
}
