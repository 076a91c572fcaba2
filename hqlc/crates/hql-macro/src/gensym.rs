//! Fresh-name generation for hygienic macro expansion (spec.md section 4.3,
//! step 4).

use std::sync::atomic::{AtomicU32, Ordering};

use hql_util::Symbol;

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Returns a symbol derived from `base` that is unique across the lifetime
/// of the process: `base` suffixed with `__g<N>`. Each call advances the
/// counter, so two calls with the same `base` never collide.
pub fn gensym(base: Symbol) -> Symbol {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    Symbol::intern(&format!("{}__g{}", base.as_str(), n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successive_gensyms_are_distinct() {
        let base = Symbol::intern("tmp");
        let a = gensym(base);
        let b = gensym(base);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("tmp__g"));
    }
}
