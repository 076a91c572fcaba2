//! Content-addressed cache (spec.md section 4.8 "Content-addressed cache"
//! and section 5 "Content Hash & Cache Entry"): one cache entry per source
//! file, storing the transpiled output, its source-map sibling, and the
//! content hash that proved it fresh.
//!
//! Cache writes go through a `.tmp` file and an atomic rename so a build
//! killed mid-write never leaves a half-written entry behind for the next
//! build to trust.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Hashes `(source content, normalized compiler options)` the way spec.md
/// section 5 describes a cache key.
pub fn content_hash(source: &str, normalized_options: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(source.as_bytes());
    hasher.update(b"\0");
    hasher.update(normalized_options.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// The on-disk paths one cache entry occupies.
pub struct CacheEntry {
    pub code_path: PathBuf,
    pub map_path: PathBuf,
    hash_path: PathBuf,
}

/// A content-addressed cache rooted at a single directory.
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Cache { dir })
    }

    /// The cache entry a given source path and output extension (`"ts"` or
    /// `"js"`) would occupy. The entry's base filename is derived from the
    /// source path's own hash so unrelated files never collide even when
    /// their basenames match.
    pub fn entry(&self, source_path: &Path, extension: &str) -> CacheEntry {
        let id = blake3::hash(source_path.to_string_lossy().as_bytes()).to_hex().to_string();
        CacheEntry {
            code_path: self.dir.join(format!("{id}.{extension}")),
            map_path: self.dir.join(format!("{id}.{extension}.map")),
            hash_path: self.dir.join(format!("{id}.hash")),
        }
    }

    /// True when `source_path` has no cache entry yet, the stored content
    /// hash no longer matches `current_hash`, or `force` was passed.
    pub fn needs_regeneration(
        &self,
        source_path: &Path,
        extension: &str,
        current_hash: &str,
        force: bool,
    ) -> bool {
        if force {
            return true;
        }
        let entry = self.entry(source_path, extension);
        match fs::read_to_string(&entry.hash_path) {
            Ok(stored) => stored.trim() != current_hash,
            Err(_) => true,
        }
    }

    /// Writes a fresh cache entry. Non-fatal by contract (spec.md section
    /// 4.8 "Cache write failures are non-fatal"): callers log the error at
    /// `debug` and fall back to the in-memory transpile result rather than
    /// aborting the build.
    pub fn write(
        &self,
        source_path: &Path,
        extension: &str,
        code: &str,
        map_json: Option<&str>,
        hash: &str,
    ) -> io::Result<CacheEntry> {
        let entry = self.entry(source_path, extension);
        write_atomic(&entry.code_path, code.as_bytes())?;
        if let Some(map) = map_json {
            write_atomic(&entry.map_path, map.as_bytes())?;
        }
        write_atomic(&entry.hash_path, hash.as_bytes())?;
        Ok(entry)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_file_name(format!(
        "{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("entry")
    ));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_regeneration_is_true_for_a_fresh_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::new(tmp.path().join("cache")).unwrap();
        let source_path = tmp.path().join("a.hql");
        assert!(cache.needs_regeneration(&source_path, "ts", "deadbeef", false));
    }

    #[test]
    fn write_then_matching_hash_skips_regeneration() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::new(tmp.path().join("cache")).unwrap();
        let source_path = tmp.path().join("a.hql");
        let hash = content_hash("(defn id [x] x)", "js");
        cache.write(&source_path, "ts", "export const id = x => x;", None, &hash).unwrap();
        assert!(!cache.needs_regeneration(&source_path, "ts", &hash, false));
        assert!(cache.needs_regeneration(&source_path, "ts", "different-hash", false));
        assert!(cache.needs_regeneration(&source_path, "ts", &hash, true));
    }

    #[test]
    fn write_creates_map_sibling_when_requested() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::new(tmp.path().join("cache")).unwrap();
        let source_path = tmp.path().join("a.hql");
        let entry = cache.write(&source_path, "ts", "code", Some("{}"), "h").unwrap();
        assert!(entry.code_path.is_file());
        assert!(entry.map_path.is_file());
    }
}
