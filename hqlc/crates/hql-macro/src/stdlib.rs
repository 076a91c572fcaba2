//! Embedded standard macro source (spec.md section 4.3, "Macro environment").
//!
//! This is HQL source text, parsed once per [`crate::env::MacroEnv`] and
//! loaded as the immutable shared prefix every compilation unit starts from.
//! Kept as a literal string rather than hand-built AST nodes so the macros
//! read the way any other HQL macro would — the expander has no privileged
//! path for these.

pub const SOURCE: &str = r#"
(defmacro when [cond & body]
  `(if ,cond (do ,@body) nil))

(defmacro unless [cond & body]
  `(if ,cond nil (do ,@body)))

(defmacro and2 [a b]
  `(if ,a ,b false))

(defmacro or2 [a b]
  `(if ,a ,a ,b))

(defmacro while-not [cond & body]
  `(while (not ,cond) ,@body))

(defmacro doto [x & forms]
  `(let it ,x (do ,@forms) it))

(defmacro if-let [binding then else]
  `(let it ,binding (if it ,then ,else)))

(defmacro when-let [binding & body]
  `(let it ,binding (if it (do ,@body) nil)))

(defmacro dotimes [binding & body]
  `(for ,binding (do ,@body)))
"#;
