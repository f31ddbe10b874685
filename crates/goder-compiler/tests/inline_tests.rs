//! External Package Inlining Tests
//!
//! End-to-end tests of `Mode::Inline` and `Mode::Both` against fake module
//! caches laid out the way `go mod download` leaves them.
//!
//! Run with: cargo test -p goder-compiler --test inline_tests

use goder_compiler::{
    ClosurePolicy, CollisionPolicy, Config, InlineConfig, Mode, TransformError, TransformOutput,
    Transformer,
};
use goder_pm::ModuleLocator;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// =============================================================================
// FIXTURES
// =============================================================================

fn write_package(cache: &Path, dir: &str, files: &[(&str, &str)]) {
    let dir = cache.join(dir);
    fs::create_dir_all(&dir).unwrap();
    for (name, source) in files {
        fs::write(dir.join(name), source).unwrap();
    }
}

const LO_SLICE: &str = r#"package lo

// Map manipulates a slice and transforms it to a slice of another type.
func Map[T any, R any](collection []T, iteratee func(T, int) R) []R {
	result := make([]R, len(collection))

	for i, item := range collection {
		result[i] = iteratee(item, i)
	}

	return result
}

func Filter[V any](collection []V, predicate func(V, int) bool) []V {
	result := make([]V, 0, len(collection))

	for i, item := range collection {
		if predicate(item, i) {
			result = append(result, item)
		}
	}

	return result
}
"#;

const LO_MAP: &str = r#"package lo

func Keys[K comparable, V any](in map[K]V) []K {
	result := make([]K, 0, len(in))

	for k := range in {
		result = append(result, k)
	}

	return result
}
"#;

const SEGTREE: &str = r#"package segtree

type Segtree[S any] struct {
	n    int
	size int
	op   func(S, S) S
	e    func() S
	d    []S
}

func NewBySlice[S any](op func(S, S) S, e func() S, v []S) *Segtree[S] {
	n := len(v)
	size := 1
	for size < n {
		size <<= 1
	}
	d := make([]S, 2*size)
	for i := range d {
		d[i] = e()
	}
	for i := 0; i < n; i++ {
		d[size+i] = v[i]
	}
	st := &Segtree[S]{n: n, size: size, op: op, e: e, d: d}
	for i := size - 1; i >= 1; i-- {
		st.update(i)
	}
	return st
}

func (st *Segtree[S]) update(k int) {
	st.d[k] = st.op(st.d[2*k], st.d[2*k+1])
}

func (st *Segtree[S]) Set(p int, x S) {
	p += st.size
	st.d[p] = x
	for p > 1 {
		p >>= 1
		st.update(p)
	}
}

func (st *Segtree[S]) Prod(l, r int) S {
	sml, smr := st.e(), st.e()
	l += st.size
	r += st.size
	for l < r {
		if l&1 == 1 {
			sml = st.op(sml, st.d[l])
			l++
		}
		if r&1 == 1 {
			r--
			smr = st.op(st.d[r], smr)
		}
		l >>= 1
		r >>= 1
	}
	return st.op(sml, smr)
}
"#;

fn module_cache() -> TempDir {
    let cache = tempfile::tempdir().unwrap();
    write_package(
        cache.path(),
        "github.com/samber/lo@v1.38.1",
        &[
            ("slice.go", LO_SLICE),
            ("map.go", LO_MAP),
            ("slice_test.go", "package lo\n\nfunc broken( {\n"),
        ],
    );
    write_package(
        cache.path(),
        "github.com/earlgray283/ac-library-go@v0.0.0-20230101000000-abcdef012345/segtree",
        &[("segtree.go", SEGTREE)],
    );
    write_package(
        cache.path(),
        "github.com/acme/ring@v1.0.0/ping",
        &[(
            "ping.go",
            "package ping

import \"github.com/acme/ring/pong\"

func Ping(n int) int {
	if n == 0 {
		return 0
	}
	return pong.Pong(n - 1)
}
",
        )],
    );
    write_package(
        cache.path(),
        "github.com/acme/ring@v1.0.0/pong",
        &[(
            "pong.go",
            "package pong

import \"github.com/acme/ring/ping\"

func Pong(n int) int {
	if n == 0 {
		return 1
	}
	return ping.Ping(n - 1)
}
",
        )],
    );
    for (dir, source) in [
        (
            "github.com/acme/dia@v0.3.0/left",
            "package left\n\nimport \"github.com/acme/dia/base\"\n\nfunc Left() int {\n\treturn base.Helper() + 1\n}\n",
        ),
        (
            "github.com/acme/dia@v0.3.0/right",
            "package right\n\nimport \"github.com/acme/dia/base\"\n\nfunc Right() int {\n\treturn base.Helper() + 2\n}\n",
        ),
        (
            "github.com/acme/dia@v0.3.0/base",
            "package base\n\nfunc Helper() int {\n\treturn 40\n}\n",
        ),
    ] {
        write_package(cache.path(), dir, &[("pkg.go", source)]);
    }
    cache
}

fn transform_in(cache: &Path, config: Config, source: &str, mode: Mode) -> Result<TransformOutput, TransformError> {
    Transformer::new(config)
        .with_locator(ModuleLocator::new(cache))
        .transform(source, mode)
}

fn run(cache: &Path, source: &str, mode: Mode) -> TransformOutput {
    transform_in(cache, Config::default(), source, mode).unwrap()
}

fn count_funcs(source: &str, name: &str) -> usize {
    goder_parser::parse(source)
        .unwrap()
        .funcs()
        .filter(|f| f.name.name == name)
        .count()
}

const SAMBER: &str = r#"package main

import (
	"fmt"
	"strconv"

	"github.com/samber/lo"
)

func main() {
	a := []int{1, 2, 3, 4, 5}
	b := lo.Map(a, func(t int, _ int) string {
		return strconv.Itoa(t)
	})
	fmt.Println(b)
}
"#;

const SEGTREE_MAIN: &str = r#"package main

import (
	"fmt"

	"github.com/earlgray283/ac-library-go/segtree"
)

func main() {
	a := []int{5, 3, 7, 9, 6}
	segt := segtree.NewBySlice(func(a, b int) int {
		if a < b {
			return a
		}
		return b
	}, func() int { return 1<<31 - 1 }, a)
	segt.Set(1, 8)
	fmt.Println(segt.Prod(0, 3))
}
"#;

// =============================================================================
// INLINE MODE
// =============================================================================

mod inline_mode_tests {
    use super::*;

    #[test]
    fn test_referenced_generic_is_copied_verbatim() {
        let cache = module_cache();
        let output = run(cache.path(), SAMBER, Mode::Inline);
        let out = &output.source;

        assert!(!out.contains("github.com/samber/lo"));
        assert!(!out.contains("lo."));
        assert!(out.contains("b := Map(a, func(t int, _ int) string {"));
        assert!(out.contains("func Map[T any, R any](collection []T, iteratee func(T, int) R) []R {"));
        assert!(!out.contains("func Filter"));
        assert!(!out.contains("func Keys"));

        let result = output.inline.unwrap();
        assert_eq!(result.packages_inlined, 1);
        assert_eq!(result.decls_inlined, 1);
        assert!(output.generics.is_none());
    }

    #[test]
    fn test_whole_module_policy_copies_every_file() {
        let cache = module_cache();
        let config = Config {
            inline: InlineConfig {
                policy: ClosurePolicy::WholeModule,
                ..Default::default()
            },
            ..Default::default()
        };
        let out = transform_in(cache.path(), config, SAMBER, Mode::Inline)
            .unwrap()
            .source;
        assert!(out.contains("func Filter[V any]"));
        assert!(out.contains("func Keys[K comparable, V any](in map[K]V) []K {"));
    }

    #[test]
    fn test_import_cycle_inlined_once() {
        let cache = module_cache();
        let output = run(
            cache.path(),
            "package main

import \"github.com/acme/ring/ping\"

func main() {
	println(ping.Ping(3))
}
",
            Mode::Inline,
        );
        let out = &output.source;
        assert_eq!(count_funcs(out, "Ping"), 1);
        assert_eq!(count_funcs(out, "Pong"), 1);
        assert!(out.contains("return Pong(n - 1)"));
        assert!(out.contains("return Ping(n - 1)"));
        assert!(!out.contains("github.com/acme/ring"));
        assert_eq!(output.inline.unwrap().packages_inlined, 2);
    }

    #[test]
    fn test_diamond_dependency_shared() {
        let cache = module_cache();
        let output = run(
            cache.path(),
            "package main

import (
	\"github.com/acme/dia/left\"
	\"github.com/acme/dia/right\"
)

func main() {
	println(left.Left() + right.Right())
}
",
            Mode::Inline,
        );
        let out = &output.source;
        assert_eq!(count_funcs(out, "Helper"), 1);
        assert!(out.contains("println(Left() + Right())"));
        let result = output.inline.unwrap();
        assert_eq!(result.packages_inlined, 3);
        assert_eq!(result.decls_inlined, 3);
    }

    #[test]
    fn test_package_name_differs_from_import_path() {
        let cache = module_cache();
        write_package(
            cache.path(),
            "github.com/acme/go-b@v1.0.0",
            &[("b.go", "package b\n\nfunc F() int {\n\treturn 7\n}\n")],
        );
        write_package(
            cache.path(),
            "github.com/acme/a@v1.0.0",
            &[(
                "a.go",
                "package a\n\nimport \"github.com/acme/go-b\"\n\nfunc G() int {\n\treturn b.F()\n}\n",
            )],
        );
        let output = run(
            cache.path(),
            "package main

import \"github.com/acme/a\"

func main() {
	println(a.G())
}
",
            Mode::Inline,
        );
        let out = &output.source;
        assert!(out.contains("return F()"), "{out}");
        assert!(!out.contains("b.F"));
        assert!(!out.contains("github.com/acme"));
        assert_eq!(count_funcs(out, "F"), 1);
        assert_eq!(output.inline.unwrap().packages_inlined, 2);
    }

    #[test]
    fn test_configured_module_cache() {
        let cache = module_cache();
        let config = Config {
            inline: InlineConfig {
                mod_cache: Some(cache.path().to_path_buf()),
                ..Default::default()
            },
            ..Default::default()
        };
        let out = goder_compiler::transform(SAMBER, Mode::Inline, &config)
            .unwrap()
            .source;
        assert!(out.contains("func Map[T any, R any]"));
    }

    #[test]
    fn test_non_allow_listed_host_kept() {
        let cache = module_cache();
        let source = "package main

import \"gitlab.com/acme/util\"

func main() {
	util.Run()
}
";
        let out = run(cache.path(), source, Mode::Inline).source;
        assert_eq!(out, source);
    }
}

// =============================================================================
// BOTH MODES
// =============================================================================

mod combined_tests {
    use super::*;

    #[test]
    fn test_samber_map_inlined_then_specialized() {
        let cache = module_cache();
        let output = run(cache.path(), SAMBER, Mode::Both);
        let out = &output.source;

        let file = goder_parser::parse(out).unwrap();
        let specialized: Vec<_> = file
            .funcs()
            .filter(|f| f.name.name.starts_with("Map") && f.name.name != "Map")
            .collect();
        assert_eq!(specialized.len(), 1);
        assert!(specialized[0].type_params.is_empty());
        let name = &specialized[0].name.name;

        assert!(out.contains(&format!(
            "func {}(collection []int, iteratee func(int, int) string) []string {{",
            name
        )));
        assert!(out.contains(&format!("b := {}(a, func(t int, _ int) string {{", name)));
        assert!(out.contains("import (\n\t\"fmt\"\n\t\"strconv\"\n)\n"));
        assert!(!out.contains("[T"));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_segtree_library_specialized() {
        let cache = module_cache();
        let output = run(cache.path(), SEGTREE_MAIN, Mode::Both);
        let out = &output.source;

        assert!(!out.contains("segtree."));
        assert!(!out.contains("[S"));
        assert!(!out.contains("S any"));

        let file = goder_parser::parse(out).unwrap();
        let types: Vec<String> = file.types().map(|t| t.name.name.clone()).collect();
        assert_eq!(types.len(), 1);
        assert!(types[0].starts_with("Segtree"));
        assert!(out.contains("op   func(int, int) int"));

        let constructors: Vec<String> = file
            .funcs()
            .filter(|f| f.recv.is_none() && f.name.name.starts_with("NewBySlice"))
            .map(|f| f.name.name.clone())
            .collect();
        assert_eq!(constructors.len(), 1);
        assert!(out.contains(&format!("segt := {}(func(a, b int) int {{", constructors[0])));
        assert!(out.contains(&format!("st := &{}{{n: n, size: size, op: op, e: e, d: d}}", types[0])));

        for method in ["update", "Set", "Prod"] {
            assert_eq!(count_funcs(out, method), 1, "{method}");
        }
        assert!(out.contains(&format!("func (st *{}) Prod(l, r int) int {{", types[0])));

        let generics = output.generics.unwrap();
        assert_eq!(generics.functions_specialized, 1);
        assert_eq!(generics.types_specialized, 1);
    }

    #[test]
    fn test_renamed_library_symbol_then_specialized() {
        let cache = module_cache();
        let config = Config {
            inline: InlineConfig {
                collisions: CollisionPolicy::Rename,
                ..Default::default()
            },
            ..Default::default()
        };
        let source = SAMBER.replace(
            "func main() {",
            "func Map(xs []int) int {\n\treturn len(xs)\n}\n\nfunc main() {",
        );
        let output = transform_in(cache.path(), config, &source, Mode::Both).unwrap();
        assert_eq!(output.inline.unwrap().renamed, 1);
        assert!(output.source.contains("func Map(xs []int) int {"));
        assert!(!output.source.contains("b := Map("));
    }

    #[test]
    fn test_collision_is_fatal() {
        let cache = module_cache();
        let source = SAMBER.replace(
            "func main() {",
            "func Map(xs []int) int {\n\treturn len(xs)\n}\n\nfunc main() {",
        );
        let err = transform_in(cache.path(), Config::default(), &source, Mode::Both).unwrap_err();
        match err {
            TransformError::NameCollision { name, first, second } => {
                assert_eq!(name, "Map");
                assert_eq!(first, "main");
                assert_eq!(second, "github.com/samber/lo");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_output_is_a_fixed_point() {
        let cache = module_cache();
        let once = run(cache.path(), SEGTREE_MAIN, Mode::Both).source;
        let twice = run(cache.path(), &once, Mode::Both).source;
        assert_eq!(once, twice);
    }
}

// =============================================================================
// ERRORS
// =============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_missing_module_suggests_go_get() {
        let cache = tempfile::tempdir().unwrap();
        let err = transform_in(cache.path(), Config::default(), SAMBER, Mode::Inline).unwrap_err();
        assert_eq!(err.kind(), "ModuleNotFound");
        assert!(err.to_string().contains("$ go get \"github.com/samber/lo\""));
    }

    #[test]
    fn test_unparsable_external_file() {
        let cache = tempfile::tempdir().unwrap();
        write_package(
            cache.path(),
            "github.com/samber/lo@v1.38.1",
            &[("slice.go", "package lo\n\nfunc Map[T any](xs []T {\n")],
        );
        let err = transform_in(cache.path(), Config::default(), SAMBER, Mode::Inline).unwrap_err();
        match err {
            TransformError::ExternalParseError { package, file, .. } => {
                assert_eq!(package, "github.com/samber/lo");
                assert!(file.ends_with("slice.go"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ill_typed_input_rejected_before_inlining() {
        let cache = module_cache();
        let source = SAMBER.replace("fmt.Println(b)", "fmt.Println(b, missing)");
        let err = transform_in(cache.path(), Config::default(), &source, Mode::Both).unwrap_err();
        assert_eq!(err.kind(), "CheckError");
    }
}
