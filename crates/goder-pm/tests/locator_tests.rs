//! Tests for locating packages in a synthetic module cache

use goder_pm::{source_files, GoMod, LocateError, ModuleLocator};
use std::fs;
use std::path::Path;

fn mkdir(root: &Path, rel: &str) {
    fs::create_dir_all(root.join(rel)).unwrap();
}

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "package x\n").unwrap();
}

// ============================================================================
// Versioned directories
// ============================================================================

#[test]
fn test_locate_module_root_package() {
    let temp = tempfile::tempdir().unwrap();
    mkdir(temp.path(), "github.com/samber/lo@v1.33.0");

    let locator = ModuleLocator::new(temp.path());
    let dir = locator.locate("github.com/samber/lo").unwrap();
    assert_eq!(dir, temp.path().join("github.com/samber/lo@v1.33.0"));
}

#[test]
fn test_locate_package_inside_module() {
    let temp = tempfile::tempdir().unwrap();
    mkdir(
        temp.path(),
        "golang.org/x/exp@v0.0.0-20221031165847-c99f073a8326/maps",
    );

    let locator = ModuleLocator::new(temp.path());
    let loc = locator.resolve("golang.org/x/exp/maps").unwrap();
    assert_eq!(loc.module, "golang.org/x/exp");
    assert_eq!(loc.version, "v0.0.0-20221031165847-c99f073a8326");
    assert!(loc.dir.ends_with("maps"));
    assert_eq!(loc.dir.parent().unwrap(), loc.module_dir);
}

#[test]
fn test_locate_escapes_uppercase() {
    let temp = tempfile::tempdir().unwrap();
    mkdir(temp.path(), "github.com/!burnt!sushi/toml@v1.3.2");

    let locator = ModuleLocator::new(temp.path());
    assert!(locator.locate("github.com/BurntSushi/toml").is_ok());
}

#[test]
fn test_sibling_with_common_prefix_is_not_a_match() {
    let temp = tempfile::tempdir().unwrap();
    mkdir(temp.path(), "github.com/samber/lo@v1.33.0");
    mkdir(temp.path(), "github.com/samber/lop@v0.1.0");

    let locator = ModuleLocator::new(temp.path());
    let dir = locator.locate("github.com/samber/lo").unwrap();
    assert!(dir.ends_with("lo@v1.33.0"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_missing_package_reports_go_get() {
    let temp = tempfile::tempdir().unwrap();
    mkdir(temp.path(), "github.com/samber");

    let locator = ModuleLocator::new(temp.path());
    match locator.locate("github.com/samber/lo") {
        Err(LocateError::NotFound { path, hint, .. }) => {
            assert_eq!(path, "github.com/samber/lo");
            assert_eq!(hint, "go get \"github.com/samber/lo\"");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_unversioned_directory_is_not_a_module() {
    let temp = tempfile::tempdir().unwrap();
    mkdir(temp.path(), "github.com/samber/lo");

    let locator = ModuleLocator::new(temp.path());
    assert!(matches!(
        locator.locate("github.com/samber/lo"),
        Err(LocateError::NotFound { .. })
    ));
}

#[test]
fn test_missing_subpackage() {
    let temp = tempfile::tempdir().unwrap();
    mkdir(temp.path(), "golang.org/x/exp@v0.1.0");

    let locator = ModuleLocator::new(temp.path());
    assert!(matches!(
        locator.locate("golang.org/x/exp/maps"),
        Err(LocateError::NotFound { .. })
    ));
}

#[test]
fn test_several_versions_are_ambiguous() {
    let temp = tempfile::tempdir().unwrap();
    mkdir(temp.path(), "github.com/samber/lo@v1.33.0");
    mkdir(temp.path(), "github.com/samber/lo@v1.38.1");

    let locator = ModuleLocator::new(temp.path());
    match locator.locate("github.com/samber/lo") {
        Err(LocateError::Ambiguous { candidates, .. }) => assert_eq!(candidates.len(), 2),
        other => panic!("Expected Ambiguous, got {:?}", other),
    }
}

#[test]
fn test_go_mod_pin_resolves_ambiguity() {
    let temp = tempfile::tempdir().unwrap();
    mkdir(temp.path(), "github.com/samber/lo@v1.33.0");
    mkdir(temp.path(), "github.com/samber/lo@v1.38.1");

    let gomod = GoMod::parse("module m\n\nrequire github.com/samber/lo v1.38.1\n").unwrap();
    let locator = ModuleLocator::new(temp.path()).with_pins(&gomod);
    let loc = locator.resolve("github.com/samber/lo").unwrap();
    assert_eq!(loc.version, "v1.38.1");
}

// ============================================================================
// Source files
// ============================================================================

#[test]
fn test_source_files_skip_tests_and_other_files() {
    let temp = tempfile::tempdir().unwrap();
    touch(temp.path(), "slice.go");
    touch(temp.path(), "map.go");
    touch(temp.path(), "map_test.go");
    touch(temp.path(), "README.md");
    mkdir(temp.path(), "internal");

    let files = source_files(temp.path()).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["map.go", "slice.go"]);
}
