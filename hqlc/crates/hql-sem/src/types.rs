//! Colon-annotation splitting (spec.md section 4.4).
//!
//! HQL forwards type annotations to the target without checking them: an
//! identifier written `name:Type` in parameter or return position is split
//! at the first colon into a plain binding name and an opaque type string
//! that rides along for codegen's TypeScript mode to emit verbatim. There is
//! no unification, no inference beyond this split — full type checking is
//! explicitly out of scope.

use hql_util::Symbol;

/// Splits `name:Type` into `(name, Some(Type), true)`. With no colon,
/// returns `(name, None, true)`. A colon with an empty name or empty type
/// on either side returns `ok = false`; the caller reports that as a
/// semantic error rather than silently dropping the annotation.
pub fn split_type_annotation(raw: Symbol) -> (Symbol, Option<Symbol>, bool) {
    let s = raw.as_str();
    match s.find(':') {
        None => (raw, None, true),
        Some(idx) => {
            let (name, rest) = s.split_at(idx);
            let ty = &rest[1..];
            if name.is_empty() || ty.is_empty() {
                (Symbol::intern(name), None, false)
            } else {
                (Symbol::intern(name), Some(Symbol::intern(ty)), true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_name_and_type() {
        let (name, ty, ok) = split_type_annotation(Symbol::intern("x:Number"));
        assert_eq!(name.as_str(), "x");
        assert_eq!(ty.unwrap().as_str(), "Number");
        assert!(ok);
    }

    #[test]
    fn no_colon_is_unannotated() {
        let (name, ty, ok) = split_type_annotation(Symbol::intern("x"));
        assert_eq!(name.as_str(), "x");
        assert!(ty.is_none());
        assert!(ok);
    }

    #[test]
    fn empty_type_is_invalid() {
        let (_, ty, ok) = split_type_annotation(Symbol::intern("x:"));
        assert!(ty.is_none());
        assert!(!ok);
    }

    #[test]
    fn empty_name_is_invalid() {
        let (_, ty, ok) = split_type_annotation(Symbol::intern(":Number"));
        assert!(ty.is_none());
        assert!(!ok);
    }
}
