//! Cycle breaking (spec.md section 4.8 "Circular-import handling"): a
//! per-build in-flight set plus an import-mapping table, both guarded by
//! the teacher's mutex crate of choice rather than `std::sync`.

use std::path::{Path, PathBuf};

use hql_util::{FxHashMap, FxHashSet};
use parking_lot::{RwLock, RwLockReadGuard};

use std::collections::HashMap;

/// Tracks which resolved source paths are currently mid-transpile, which
/// ones already have a cached output path a re-entrant import can be
/// rewritten to point at, and which (importer, specifier) pairs this build
/// has already resolved to a source path (spec.md section 4.8 resolution
/// step 1).
pub struct BundleGraph {
    in_flight: RwLock<FxHashSet<PathBuf>>,
    import_mapping: RwLock<HashMap<PathBuf, PathBuf>>,
    resolved: RwLock<FxHashMap<String, PathBuf>>,
}

impl BundleGraph {
    pub fn new() -> Self {
        BundleGraph {
            in_flight: RwLock::new(FxHashSet::default()),
            import_mapping: RwLock::new(HashMap::new()),
            resolved: RwLock::new(FxHashMap::default()),
        }
    }

    /// Marks `path` as currently being processed. Returns `false` if it
    /// was already in flight (a cycle), in which case the caller must not
    /// recurse into it again.
    pub fn enter(&self, path: &Path) -> bool {
        self.in_flight.write().insert(path.to_path_buf())
    }

    pub fn leave(&self, path: &Path) {
        self.in_flight.write().remove(path);
    }

    pub fn is_in_flight(&self, path: &Path) -> bool {
        self.in_flight.read().contains(path)
    }

    pub fn register(&self, source: &Path, cached_path: PathBuf) {
        self.import_mapping.write().insert(source.to_path_buf(), cached_path);
    }

    pub fn cached_path_for(&self, source: &Path) -> Option<PathBuf> {
        self.import_mapping.read().get(source).cloned()
    }

    /// Remembers that `key` (an importer-relative specifier, joined and
    /// stringified) already resolved to `source` in this build, so a later
    /// import of the same specifier from the same directory hits step 1
    /// instead of re-walking the filesystem.
    pub fn record_resolution(&self, key: String, source: PathBuf) {
        self.resolved.write().insert(key, source);
    }

    /// A read guard over the pre-registered resolutions accumulated so
    /// far, suitable for handing to [`crate::resolve::ResolveContext`].
    pub fn pre_registered(&self) -> RwLockReadGuard<'_, FxHashMap<String, PathBuf>> {
        self.resolved.read()
    }
}

impl Default for BundleGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_is_detected_on_second_entry() {
        let graph = BundleGraph::new();
        let path = PathBuf::from("/src/a.hql");
        assert!(graph.enter(&path));
        assert!(!graph.enter(&path));
        assert!(graph.is_in_flight(&path));
        graph.leave(&path);
        assert!(!graph.is_in_flight(&path));
    }

    #[test]
    fn registered_cached_path_survives_after_leaving() {
        let graph = BundleGraph::new();
        let source = PathBuf::from("/src/a.hql");
        let cached = PathBuf::from("/cache/a.ts");
        graph.register(&source, cached.clone());
        assert_eq!(graph.cached_path_for(&source), Some(cached));
    }

    #[test]
    fn recorded_resolution_is_visible_through_the_pre_registered_guard() {
        let graph = BundleGraph::new();
        let key = "/src/./util".to_string();
        let source = PathBuf::from("/src/util.hql");
        graph.record_resolution(key.clone(), source.clone());
        assert_eq!(graph.pre_registered().get(&key), Some(&source));
    }
}
