//! End-to-end tests for the `hqlc compile` subcommand. Each test writes
//! its own `.hql` fixtures into a fresh `tempfile::tempdir()` rather than
//! reading from a checked-in fixtures directory, since the pipeline's
//! output location (the cache directory) is itself a tempdir per test.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn hqlc() -> Command {
    Command::cargo_bin("hqlc").expect("hqlc binary should build")
}

#[test]
fn compiles_a_single_file_to_js() {
    let tmp = tempfile::tempdir().unwrap();
    let entry = tmp.path().join("main.hql");
    fs::write(&entry, "(defn add [a b] (+ a b))\n(export [add])").unwrap();
    let cache_dir = tmp.path().join("cache");

    hqlc()
        .arg("compile")
        .arg(&entry)
        .arg("--cache-dir")
        .arg(&cache_dir)
        .assert()
        .success();
}

#[test]
fn writes_output_to_the_requested_path() {
    let tmp = tempfile::tempdir().unwrap();
    let entry = tmp.path().join("main.hql");
    fs::write(&entry, "(defn double [x] (* x 2))\n(export [double])").unwrap();
    let cache_dir = tmp.path().join("cache");
    let output = tmp.path().join("out").join("main.js");

    hqlc()
        .arg("compile")
        .arg(&entry)
        .arg("--cache-dir")
        .arg(&cache_dir)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let code = fs::read_to_string(&output).unwrap();
    assert!(code.contains("double"));
}

#[test]
fn follows_a_relative_import_and_writes_both_files_into_the_cache() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("util.hql"), "(defn inc [x] (+ x 1))\n(export [inc])").unwrap();
    let entry = tmp.path().join("main.hql");
    fs::write(&entry, "(import [inc] from \"./util\")\n(inc 1)").unwrap();
    let cache_dir = tmp.path().join("cache");

    hqlc()
        .arg("compile")
        .arg(&entry)
        .arg("--cache-dir")
        .arg(&cache_dir)
        .assert()
        .success();

    let entries: Vec<_> = fs::read_dir(&cache_dir).unwrap().filter_map(|e| e.ok()).collect();
    let js_files = entries
        .iter()
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("js"))
        .count();
    assert_eq!(js_files, 2);
}

#[test]
fn reports_unsupported_native_targets_without_panicking() {
    let tmp = tempfile::tempdir().unwrap();
    let entry = tmp.path().join("main.hql");
    fs::write(&entry, "(defn main [] 1)").unwrap();
    let cache_dir = tmp.path().join("cache");

    hqlc()
        .arg("compile")
        .arg(&entry)
        .arg("--target")
        .arg("wasm32-unknown-unknown")
        .arg("--cache-dir")
        .arg(&cache_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn exits_nonzero_on_a_malformed_source_file() {
    let tmp = tempfile::tempdir().unwrap();
    let entry = tmp.path().join("broken.hql");
    fs::write(&entry, "(defn broken [x (+ x 1)").unwrap();
    let cache_dir = tmp.path().join("cache");

    hqlc()
        .arg("compile")
        .arg(&entry)
        .arg("--cache-dir")
        .arg(&cache_dir)
        .assert()
        .failure();
}

#[test]
fn time_flag_prints_phase_timings() {
    let tmp = tempfile::tempdir().unwrap();
    let entry = tmp.path().join("main.hql");
    fs::write(&entry, "(defn id [x] x)\n(export [id])").unwrap();
    let cache_dir = tmp.path().join("cache");

    hqlc()
        .arg("compile")
        .arg(&entry)
        .arg("--cache-dir")
        .arg(&cache_dir)
        .arg("--time")
        .assert()
        .success()
        .stderr(predicate::str::contains("parse"));
}
