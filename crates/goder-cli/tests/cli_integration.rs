//! Integration tests for the goder binary.
//!
//! Each test writes a Go file (and, where needed, a fake module cache) into a
//! temporary directory and runs the built binary against it.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn goder(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_goder"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("GODER_LOG")
        .output()
        .expect("failed to run goder")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const GENERIC: &str = "package main

func minimum[T int | float64](a, b T) T {
	if a < b {
		return a
	}
	return b
}

func main() {
	println(minimum(3, 5))
}
";

const USES_LO: &str = "package main

import \"github.com/samber/lo\"

func main() {
	println(len(lo.Reverse([]int{1, 2})))
}
";

fn write_lo(cache: &Path) {
    let dir = cache.join("github.com/samber/lo@v1.38.1");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("slice.go"),
        "package lo

func Reverse[T any](collection []T) []T {
	length := len(collection)
	half := length / 2

	for i := 0; i < half; i = i + 1 {
		j := length - 1 - i
		collection[i], collection[j] = collection[j], collection[i]
	}

	return collection
}
",
    )
    .unwrap();
}

// ────────────────────────────────────────────────────────────────────────────
// Output targets
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_prints_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.go"), GENERIC).unwrap();

    let output = goder(&["--mode", "generics", "main.go"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("package main\n"));
    assert!(!out.contains("[T"));
    assert_eq!(fs::read_to_string(dir.path().join("main.go")).unwrap(), GENERIC);
}

#[test]
fn test_write_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.go");
    fs::write(&path, GENERIC).unwrap();

    let output = goder(&["--mode", "generics", "-w", "main.go"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).is_empty());
    assert!(!fs::read_to_string(&path).unwrap().contains("[T"));
}

#[test]
fn test_output_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.go"), GENERIC).unwrap();

    let output = goder(&["--mode", "generics", "-o", "out.go", "main.go"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let written = fs::read_to_string(dir.path().join("out.go")).unwrap();
    assert!(written.contains("func minimum"));
}

// ────────────────────────────────────────────────────────────────────────────
// Module cache and configuration
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_mod_cache_flag() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("cache");
    write_lo(&cache);
    fs::write(dir.path().join("main.go"), USES_LO).unwrap();

    let output = goder(
        &["--mod-cache", cache.to_str().unwrap(), "main.go"],
        dir.path(),
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(!out.contains("samber"));
    assert!(out.contains("println(len(Reverse"));
}

#[test]
fn test_config_file_discovered_above_input() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("cache");
    write_lo(&cache);
    fs::write(
        dir.path().join("goder.toml"),
        format!("[inline]\nmod_cache = {:?}\n", cache.to_str().unwrap()),
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("abc")).unwrap();
    fs::write(dir.path().join("abc/main.go"), USES_LO).unwrap();

    let output = goder(&["--mode", "inline", "abc/main.go"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("func Reverse[T any](collection []T) []T {"));
}

// ────────────────────────────────────────────────────────────────────────────
// Failures
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_module_fails_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("empty-cache");
    fs::create_dir_all(&cache).unwrap();
    let path = dir.path().join("main.go");
    fs::write(&path, USES_LO).unwrap();

    let output = goder(
        &["--mod-cache", cache.to_str().unwrap(), "-w", "main.go"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("error[ModuleNotFound]"), "{err}");
    assert!(err.contains("go get \"github.com/samber/lo\""));
    assert_eq!(fs::read_to_string(&path).unwrap(), USES_LO);
}

#[test]
fn test_parse_error_snippet() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.go"), "package main\n\nfunc main( {\n}\n").unwrap();

    let output = goder(&["--mode", "generics", "main.go"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("error[ParseError]"), "{err}");
    assert!(err.contains("main.go:3:"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_json_warning_for_incomplete_binding() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.go"),
        "package main

func Keys[K comparable, V any](m map[K]V) []K {
	var out []K
	for k := range m {
		out = append(out, k)
	}
	return out
}

func main() {
	println(len(Keys(map[string]int{})))
}
",
    )
    .unwrap();

    let output = goder(
        &["--mode", "generics", "--message-format", "json", "main.go"],
        dir.path(),
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let err = stderr(&output);
    let line = err
        .lines()
        .find(|l| l.contains("\"BindingIncomplete\""))
        .expect("no warning printed");
    assert!(line.contains("\"severity\":\"warning\""));
    assert!(line.contains("cannot infer K, V in call to Keys"));
}

#[test]
fn test_unknown_mode_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.go"), GENERIC).unwrap();
    let output = goder(&["--mode", "all", "main.go"], dir.path());
    assert!(!output.status.success());
}
