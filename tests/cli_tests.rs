//! Command-line tests against snapshots written by the library.

use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;
use tempfile::TempDir;

use ref_threader::core::{GenomeGraph, Side};

fn two_level_graph() -> GenomeGraph {
    let mut graph = GenomeGraph::new();
    let root = graph.add_root_flower();
    let group = graph.add_tangle_group(root);
    let mut names = Vec::new();
    for side in [Side::FivePrime, Side::ThreePrime, Side::FivePrime, Side::ThreePrime] {
        let end = graph.add_stub_end(root, true, side);
        graph.set_end_group(end, group).unwrap();
        names.push(graph.end(end).name);
    }

    let child = graph.add_nested_flower(group).unwrap();
    let child_group = graph.add_tangle_group(child);
    for name in names {
        let end = graph.add_stub_end_named(child, name, true, Side::FivePrime);
        graph.set_end_group(end, child_group).unwrap();
    }
    graph
}

fn write_snapshot(dir: &Path, graph: &GenomeGraph) -> std::path::PathBuf {
    let path = dir.join("graph.json");
    graph.save(&path).unwrap();
    path
}

fn ref_threader() -> Command {
    Command::cargo_bin("ref-threader").unwrap()
}

/// Threading a consistent snapshot succeeds and reports both flowers
#[test]
fn test_thread_text_output() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(dir.path(), &two_level_graph());

    ref_threader()
        .arg("thread")
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("Threaded reference 'reference' through 2 flowers"));
}

/// JSON output carries the configuration and a signature per flower
#[test]
fn test_thread_json_output() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(dir.path(), &two_level_graph());

    let output = ref_threader()
        .args(["--format", "json", "thread", "--solver", "exact"])
        .arg(&snapshot)
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["config"]["solver"], "exact");
    let flowers = summary["flowers"].as_array().unwrap();
    assert_eq!(flowers.len(), 2);
    assert_eq!(flowers[0]["signature"], flowers[1]["signature"]);
    assert_eq!(flowers[1]["stub_edges"], 2);
}

/// The threaded graph written with -o cannot be threaded a second time
#[test]
fn test_thread_writes_output_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(dir.path(), &two_level_graph());
    let threaded = dir.path().join("threaded.json");

    ref_threader()
        .arg("thread")
        .arg(&snapshot)
        .arg("-o")
        .arg(&threaded)
        .assert()
        .success();

    let graph = GenomeGraph::load(&threaded).unwrap();
    let root = graph.flower_ids().next().unwrap();
    let tree = graph.flower(root).event_tree;
    assert!(graph.event_by_header(tree, "reference").is_some());

    ref_threader()
        .arg("thread")
        .arg(&threaded)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate"));
}

/// Gzip-compressed snapshots are read transparently
#[test]
fn test_thread_gzip_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json.gz");
    let json = two_level_graph().to_json().unwrap();

    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(json.as_bytes()).unwrap();
    encoder.finish().unwrap();

    ref_threader()
        .args(["--format", "tsv", "thread"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("flower\tparent\tnodes"));
}

/// An odd number of attached stubs aborts with a precondition error
#[test]
fn test_thread_inconsistent_snapshot_fails() {
    let mut graph = GenomeGraph::new();
    let root = graph.add_root_flower();
    let group = graph.add_tangle_group(root);
    for _ in 0..3 {
        let end = graph.add_stub_end(root, true, Side::FivePrime);
        graph.set_end_group(end, group).unwrap();
    }
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(dir.path(), &graph);

    ref_threader()
        .arg("thread")
        .arg(&snapshot)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Precondition violated"));
}

/// Reserved or empty reference headers are rejected before loading
#[test]
fn test_thread_rejects_bad_header() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(dir.path(), &two_level_graph());

    ref_threader()
        .args(["thread", "--reference-header", "ROOT"])
        .arg(&snapshot)
        .assert()
        .failure();
}

/// Missing snapshot files are reported with their path
#[test]
fn test_thread_missing_snapshot() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");

    ref_threader()
        .arg("thread")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.json"));
}

/// Inspect lists every flower with its shape
#[test]
fn test_inspect_json() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(dir.path(), &two_level_graph());

    let output = ref_threader()
        .args(["--format", "json", "inspect"])
        .arg(&snapshot)
        .output()
        .unwrap();
    assert!(output.status.success());

    let flowers: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let flowers = flowers.as_array().unwrap();
    assert_eq!(flowers.len(), 2);
    assert_eq!(flowers[0]["depth"], 0);
    assert_eq!(flowers[0]["attached_stubs"], 4);
    assert_eq!(flowers[1]["depth"], 1);
    assert_eq!(flowers[1]["nested_flowers"], 0);
}

/// Text inspect warns about odd stub counts
#[test]
fn test_inspect_warns_on_odd_stubs() {
    let mut graph = GenomeGraph::new();
    let root = graph.add_root_flower();
    graph.add_stub_end(root, true, Side::FivePrime);
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(dir.path(), &graph);

    ref_threader()
        .arg("inspect")
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("odd number of attached stub ends"))
        .stdout(predicate::str::contains("1 ends have no group"));
}

/// A snapshot with an out-of-range handle fails with a diagnostic
#[test]
fn test_inspect_dangling_snapshot_fails() {
    let mut snapshot: serde_json::Value =
        serde_json::from_str(&two_level_graph().to_json().unwrap()).unwrap();
    snapshot["graph"]["ends"][0]["flower"] = serde_json::json!(7);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json");
    std::fs::write(&path, snapshot.to_string()).unwrap();

    ref_threader()
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Snapshot refers to flower #7"));
}
