//! The fixed JS source text of each of the sixteen runtime helpers named
//! in spec.md section 4.5/Glossary. One `const` string per helper, plus a
//! small static spec table (arity and a one-line summary) used by
//! `hql-sem` for "did you mean?" suggestions and by `hql-ir` for
//! call-shape sanity checks at lowering time.
//!
//! The helper bodies are fixed across builds — `hql-gen` prepends them
//! verbatim, never regenerates or reformats them, so that emitted output
//! stays byte-deterministic independent of this crate's own formatting.

/// Minimum/maximum accepted argument count for a helper. `max = None`
/// means variadic.
#[derive(Debug, Clone, Copy)]
pub struct HelperSpec {
    pub name: &'static str,
    pub min_arity: usize,
    pub max_arity: Option<usize>,
    pub summary: &'static str,
}

pub const HELPER_SPECS: &[HelperSpec] = &[
    HelperSpec {
        name: "__hql_get",
        min_arity: 2,
        max_arity: Some(3),
        summary: "obj[key], falling back to obj(key) if callable, else default",
    },
    HelperSpec {
        name: "__hql_getNumeric",
        min_arity: 2,
        max_arity: Some(2),
        summary: "materializes `0..n` from a sequence-producing function and a count",
    },
    HelperSpec {
        name: "__hql_range",
        min_arity: 0,
        max_arity: Some(3),
        summary: "variadic lazy integer sequence: ()/n/(s,e)/(s,e,k)",
    },
    HelperSpec {
        name: "__hql_toSequence",
        min_arity: 1,
        max_arity: Some(1),
        summary: "coerces null/array/number/string/iterable to an array",
    },
    HelperSpec {
        name: "__hql_toIterable",
        min_arity: 1,
        max_arity: Some(1),
        summary: "coerces a value to a JS iterable without eager materialization",
    },
    HelperSpec {
        name: "__hql_for_each",
        min_arity: 2,
        max_arity: Some(2),
        summary: "iterates seq calling fn(item, index); returns nil",
    },
    HelperSpec {
        name: "__hql_hash_map",
        min_arity: 0,
        max_arity: None,
        summary: "builds a plain object from interleaved key/value pairs",
    },
    HelperSpec {
        name: "__hql_throw",
        min_arity: 1,
        max_arity: Some(1),
        summary: "throws its argument as an expression (JS `throw` is a statement)",
    },
    HelperSpec {
        name: "__hql_deepFreeze",
        min_arity: 1,
        max_arity: Some(1),
        summary: "recursively freezes x, skipping LazySeq cells and generators",
    },
    HelperSpec {
        name: "__hql_match_obj",
        min_arity: 2,
        max_arity: Some(2),
        summary: "structural pattern match of a shape descriptor against a value",
    },
    HelperSpec {
        name: "__hql_trampoline",
        min_arity: 1,
        max_arity: Some(1),
        summary: "invokes thunk repeatedly while callable; returns first non-callable result",
    },
    HelperSpec {
        name: "__hql_trampoline_gen",
        min_arity: 1,
        max_arity: Some(1),
        summary: "generator-driven trampoline for mutually tail-recursive functions",
    },
    HelperSpec {
        name: "__hql_consume_async_iter",
        min_arity: 1,
        max_arity: Some(2),
        summary: "drains an async iterable into an array, optionally capped at a limit",
    },
    HelperSpec {
        name: "__hql_lazy_seq",
        min_arity: 1,
        max_arity: Some(1),
        summary: "wraps a zero-arg thunk producing a cons cell or nil into a memoized LazySeq",
    },
    HelperSpec {
        name: "__hql_delay",
        min_arity: 1,
        max_arity: Some(1),
        summary: "wraps a zero-arg thunk in a memoized, single-evaluation Delay cell",
    },
    HelperSpec {
        name: "__hql_get_op",
        min_arity: 1,
        max_arity: Some(1),
        summary: "returns the function implementing the named operator",
    },
];

pub fn helper_spec(name: &str) -> Option<&'static HelperSpec> {
    HELPER_SPECS.iter().find(|h| h.name == name)
}

/// Returns the fixed JS source text defining `name`, or `None` if `name`
/// is not one of the sixteen recognized helpers.
pub fn helper_source(name: &str) -> Option<&'static str> {
    Some(match name {
        "__hql_get" => HQL_GET,
        "__hql_getNumeric" => HQL_GET_NUMERIC,
        "__hql_range" => HQL_RANGE,
        "__hql_toSequence" => HQL_TO_SEQUENCE,
        "__hql_toIterable" => HQL_TO_ITERABLE,
        "__hql_for_each" => HQL_FOR_EACH,
        "__hql_hash_map" => HQL_HASH_MAP,
        "__hql_throw" => HQL_THROW,
        "__hql_deepFreeze" => HQL_DEEP_FREEZE,
        "__hql_match_obj" => HQL_MATCH_OBJ,
        "__hql_trampoline" => HQL_TRAMPOLINE,
        "__hql_trampoline_gen" => HQL_TRAMPOLINE_GEN,
        "__hql_consume_async_iter" => HQL_CONSUME_ASYNC_ITER,
        "__hql_lazy_seq" => HQL_LAZY_SEQ,
        "__hql_delay" => HQL_DELAY,
        "__hql_get_op" => HQL_GET_OP,
        _ => return None,
    })
}

const HQL_GET: &str = r#"function __hql_get(obj, key, fallback) {
  if (obj === null || obj === undefined) return fallback;
  const direct = obj[key];
  if (direct !== undefined) return direct;
  if (typeof obj === "function") {
    const called = obj(key);
    if (called !== undefined) return called;
  }
  return fallback;
}"#;

const HQL_GET_NUMERIC: &str = r#"function __hql_getNumeric(toSequenceFn, n) {
  const out = new Array(n);
  for (let i = 0; i < n; i++) out[i] = i;
  return toSequenceFn(out);
}"#;

const HQL_RANGE: &str = r#"function __hql_range(...args) {
  let start = 0, end = Infinity, step = 1;
  if (args.length === 1) {
    end = args[0];
  } else if (args.length === 2) {
    start = args[0];
    end = args[1];
  } else if (args.length >= 3) {
    start = args[0];
    end = args[1];
    step = args[2];
  }
  return {
    [Symbol.iterator]() {
      let i = start;
      return {
        next() {
          const done = step >= 0 ? i >= end : i <= end;
          if (done) return { done: true, value: undefined };
          const value = i;
          i += step;
          return { done: false, value };
        },
      };
    },
  };
}"#;

const HQL_TO_SEQUENCE: &str = r#"function __hql_toSequence(v) {
  if (v === null || v === undefined) return [];
  if (Array.isArray(v)) return v;
  if (typeof v === "number") {
    const out = new Array(v);
    for (let i = 0; i < v; i++) out[i] = i;
    return out;
  }
  if (typeof v === "string") return Array.from(v);
  if (typeof v[Symbol.iterator] === "function") return Array.from(v);
  return [v];
}"#;

const HQL_TO_ITERABLE: &str = r#"function __hql_toIterable(v) {
  if (v === null || v === undefined) return [];
  if (typeof v[Symbol.iterator] === "function") return v;
  return [v];
}"#;

const HQL_FOR_EACH: &str = r#"function __hql_for_each(seq, fn) {
  if (Array.isArray(seq)) {
    for (let i = 0; i < seq.length; i++) fn(seq[i], i);
    return null;
  }
  let i = 0;
  for (const item of __hql_toIterable(seq)) {
    fn(item, i);
    i++;
  }
  return null;
}"#;

const HQL_HASH_MAP: &str = r#"function __hql_hash_map(...pairs) {
  const out = {};
  for (let i = 0; i + 1 < pairs.length; i += 2) {
    out[pairs[i]] = pairs[i + 1];
  }
  return out;
}"#;

const HQL_THROW: &str = r#"function __hql_throw(value) {
  throw value;
}"#;

const HQL_DEEP_FREEZE: &str = r#"function __hql_deepFreeze(x) {
  if (x === null || typeof x !== "object") return x;
  if (x.__hqlLazySeq === true || x[Symbol.toStringTag] === "Generator") return x;
  if (Object.isFrozen(x)) return x;
  Object.freeze(x);
  for (const key of Object.getOwnPropertyNames(x)) {
    __hql_deepFreeze(x[key]);
  }
  return x;
}"#;

const HQL_MATCH_OBJ: &str = r#"function __hql_match_obj(shape, value) {
  if (shape === null || typeof shape !== "object") return shape === value;
  if (value === null || typeof value !== "object") return false;
  for (const key of Object.keys(shape)) {
    if (!__hql_match_obj(shape[key], value[key])) return false;
  }
  return true;
}"#;

const HQL_TRAMPOLINE: &str = r#"function __hql_trampoline(thunk) {
  let result = thunk;
  while (typeof result === "function") {
    result = result();
  }
  return result;
}"#;

const HQL_TRAMPOLINE_GEN: &str = r#"function __hql_trampoline_gen(gen) {
  let step = gen.next();
  while (!step.done) {
    step = gen.next(typeof step.value === "function" ? step.value() : step.value);
  }
  return step.value;
}"#;

const HQL_CONSUME_ASYNC_ITER: &str = r#"async function __hql_consume_async_iter(iter, limit) {
  const out = [];
  for await (const item of iter) {
    out.push(item);
    if (limit !== undefined && out.length >= limit) break;
  }
  return out;
}"#;

const HQL_LAZY_SEQ: &str = r#"function __hql_lazy_seq(thunk) {
  let realized = false;
  let value = null;
  return {
    __hqlLazySeq: true,
    deref() {
      if (!realized) {
        value = thunk();
        realized = true;
      }
      return value;
    },
  };
}"#;

const HQL_DELAY: &str = r#"function __hql_delay(thunk) {
  let realized = false;
  let value;
  return {
    __hqlDelay: true,
    deref() {
      if (!realized) {
        value = thunk();
        realized = true;
      }
      return value;
    },
  };
}"#;

const HQL_GET_OP: &str = r#"const __hql_op_table = {
  "+": (a, b) => a + b,
  "-": (a, b) => (b === undefined ? -a : a - b),
  "*": (a, b) => a * b,
  "/": (a, b) => a / b,
  "%": (a, b) => a % b,
  "**": (a, b) => a ** b,
  "==": (a, b) => a == b,
  "===": (a, b) => a === b,
  "!=": (a, b) => a != b,
  "!==": (a, b) => a !== b,
  "<": (a, b) => a < b,
  ">": (a, b) => a > b,
  "<=": (a, b) => a <= b,
  ">=": (a, b) => a >= b,
  "&&": (a, b) => a && b,
  "||": (a, b) => a || b,
  "!": (a) => !a,
  "~": (a) => ~a,
  "&": (a, b) => a & b,
  "|": (a, b) => a | b,
  "^": (a, b) => a ^ b,
  "<<": (a, b) => a << b,
  ">>": (a, b) => a >> b,
  ">>>": (a, b) => a >>> b,
};
function __hql_get_op(name) {
  const fn = __hql_op_table[name];
  if (fn === undefined) __hql_throw(new Error(`unknown operator: ${name}`));
  return fn;
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_fixed_helper_has_source_text() {
        for spec in HELPER_SPECS {
            assert!(helper_source(spec.name).is_some(), "{} missing source", spec.name);
        }
    }

    #[test]
    fn unknown_helper_name_returns_none() {
        assert!(helper_source("__hql_made_up").is_none());
    }

    #[test]
    fn helper_spec_lookup_matches_fixed_arity() {
        let spec = helper_spec("__hql_for_each").unwrap();
        assert_eq!(spec.min_arity, 2);
        assert_eq!(spec.max_arity, Some(2));
    }

    #[test]
    fn exactly_sixteen_helpers_defined() {
        assert_eq!(HELPER_SPECS.len(), 16);
    }
}
