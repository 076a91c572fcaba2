//! "Did you mean?" candidate suggestion for unbound symbols (spec.md
//! section 4.4): offers up to three names with the smallest edit distance
//! from the union of kernel primitives, loaded macros, standard-library
//! exports, and the operator table.

use hql_util::Symbol;

/// Classic Levenshtein edit distance, iterative DP with a rolling
/// two-row buffer.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        cur[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Returns up to `limit` candidates from `pool` closest to `name` by edit
/// distance, nearest first, ties broken by the pool's own order (which the
/// caller should make nearest-scope-first so shadowing reads naturally).
/// Candidates farther than half the query's own length are dropped — a
/// distance-12 "suggestion" for a 3-character typo is noise, not help.
pub fn suggest_similar(name: &str, pool: impl IntoIterator<Item = Symbol>, limit: usize) -> Vec<Symbol> {
    let max_distance = (name.chars().count() / 2).max(2);
    let mut scored: Vec<(usize, Symbol)> = pool
        .into_iter()
        .filter(|s| s.as_str() != name)
        .map(|s| (edit_distance(name, s.as_str()), s))
        .filter(|(d, _)| *d <= max_distance)
        .collect();
    scored.sort_by_key(|(d, _)| *d);
    scored.truncate(limit);
    scored.into_iter().map(|(_, s)| s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_typo_is_suggested() {
        let pool = ["print", "println", "reduce"].map(Symbol::intern);
        let got = suggest_similar("pritn", pool, 3);
        assert_eq!(got[0].as_str(), "print");
    }

    #[test]
    fn unrelated_names_are_not_suggested() {
        let pool = ["println", "reduce", "filter"].map(Symbol::intern);
        let got = suggest_similar("xyz", pool, 3);
        assert!(got.is_empty());
    }

    #[test]
    fn limit_is_respected() {
        let pool = ["foo1", "foo2", "foo3", "foo4"].map(Symbol::intern);
        let got = suggest_similar("foo", pool, 2);
        assert_eq!(got.len(), 2);
    }
}
