//! Import resolution (spec.md section 4.8 "Resolution order" and section 5
//! "Import scheme recognition"): given a specifier and the directory of the
//! file that imports it, decides whether the import stays external
//! (untouched in the emitted code) or points at a source file this build
//! should transpile.

use std::path::{Path, PathBuf};

use hql_util::FxHashMap;

/// The outcome of resolving one import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A remote or otherwise external specifier; left untouched in the
    /// emitted import.
    External,
    /// A filesystem path to an `.hql` (or already-transpiled `.ts`/`.js`)
    /// source this build should process.
    Internal(PathBuf),
    /// None of the seven steps matched; kept external as a last resort,
    /// with a diagnostic the caller should surface.
    Unresolved,
}

/// Directories consulted by resolution steps 4-7, plus any paths already
/// pinned by an earlier part of the build (step 1 and the cycle-breaker).
pub struct ResolveContext<'a> {
    pub project_root: &'a Path,
    pub source_dir: &'a Path,
    pub pre_registered: &'a FxHashMap<String, PathBuf>,
}

const REMOTE_SCHEMES: &[&str] = &["npm:", "jsr:", "node:", "http://", "https://"];

fn is_remote(specifier: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|scheme| specifier.starts_with(scheme))
}

/// Resolves `specifier`, imported from a file living in directory
/// `importer_dir`, per the seven-step order.
pub fn resolve(ctx: &ResolveContext<'_>, specifier: &str, importer_dir: &Path) -> Resolved {
    // Step 1: a pre-registered mapping, keyed either by the raw specifier
    // or by its would-be resolution relative to the importer.
    if let Some(path) = ctx.pre_registered.get(specifier) {
        return Resolved::Internal(path.clone());
    }
    let joined = importer_dir.join(specifier);
    if let Some(path) = ctx.pre_registered.get(&joined.to_string_lossy().into_owned()) {
        return Resolved::Internal(path.clone());
    }

    // Step 2: remote schemes are always external.
    if is_remote(specifier) {
        return Resolved::External;
    }

    // Step 3: file:// URLs are internal once the prefix is stripped.
    let (bare, came_from_file_url) = match specifier.strip_prefix("file://") {
        Some(rest) => (rest, true),
        None => (specifier, false),
    };
    if came_from_file_url {
        let path = PathBuf::from(bare);
        if path.is_file() {
            return Resolved::Internal(path);
        }
    }

    // Steps 4-7: relative to the importer, the configured source_dir, the
    // project root, and `<project root>/lib/`, in that order. A leading
    // `./` is redundant once joined onto a base, and dropping it keeps
    // the resulting path directly comparable (no stray `CurDir` component).
    let bare = bare.strip_prefix("./").unwrap_or(bare);
    let bases = [importer_dir, ctx.source_dir, ctx.project_root, &ctx.project_root.join("lib")];
    for base in bases {
        if let Some(found) = first_existing(base, bare) {
            return Resolved::Internal(found);
        }
    }

    Resolved::Unresolved
}

/// Tries `base/specifier` verbatim, then with a `.hql` extension appended
/// when `specifier` doesn't already name one of the extensions this
/// pipeline understands.
fn first_existing(base: &Path, specifier: &str) -> Option<PathBuf> {
    let direct = base.join(specifier);
    if direct.is_file() {
        return Some(direct);
    }
    let has_known_extension = matches!(
        Path::new(specifier).extension().and_then(|e| e.to_str()),
        Some("hql") | Some("ts") | Some("js")
    );
    if !has_known_extension {
        let with_ext = base.join(format!("{specifier}.hql"));
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn ctx<'a>(root: &'a Path, map: &'a FxHashMap<String, PathBuf>) -> ResolveContext<'a> {
        ResolveContext { project_root: root, source_dir: root, pre_registered: map }
    }

    #[test]
    fn remote_schemes_are_external() {
        let tmp = tempfile::tempdir().unwrap();
        let map = FxHashMap::default();
        let c = ctx(tmp.path(), &map);
        for specifier in ["npm:lodash", "jsr:@std/path", "node:fs", "https://example.com/x.js"] {
            assert_eq!(resolve(&c, specifier, tmp.path()), Resolved::External);
        }
    }

    #[test]
    fn relative_import_resolves_against_importer_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let importer_dir = tmp.path().join("src");
        fs::create_dir_all(&importer_dir).unwrap();
        fs::write(importer_dir.join("util.hql"), "(defn id [x] x)").unwrap();
        let map = FxHashMap::default();
        let c = ctx(tmp.path(), &map);
        let resolved = resolve(&c, "./util", &importer_dir);
        assert_eq!(resolved, Resolved::Internal(importer_dir.join("util.hql")));
    }

    #[test]
    fn unresolved_specifier_falls_back_external() {
        let tmp = tempfile::tempdir().unwrap();
        let map = FxHashMap::default();
        let c = ctx(tmp.path(), &map);
        assert_eq!(resolve(&c, "./does-not-exist", tmp.path()), Resolved::Unresolved);
    }

    #[test]
    fn pre_registered_mapping_wins_first() {
        let tmp = tempfile::tempdir().unwrap();
        let cached = tmp.path().join("cache/util.ts");
        let mut map = FxHashMap::default();
        map.insert("./util".to_string(), cached.clone());
        let c = ctx(tmp.path(), &map);
        assert_eq!(resolve(&c, "./util", tmp.path()), Resolved::Internal(cached));
    }
}
