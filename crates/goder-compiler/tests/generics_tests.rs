//! Generic Specialization Tests
//!
//! End-to-end tests of `Mode::Generics` on whole Go files.
//!
//! Run with: cargo test -p goder-compiler --test generics_tests

use goder_compiler::{
    Config, GenericsConfig, Mode, NamingStrategy, TransformOutput, Transformer, TypeMatching,
};

// =============================================================================
// HELPERS
// =============================================================================

fn specialize(source: &str) -> TransformOutput {
    Transformer::new(Config::default())
        .transform(source, Mode::Generics)
        .unwrap()
}

/// Names of the top-level functions of a rendered file.
fn func_names(source: &str) -> Vec<String> {
    goder_parser::parse(source)
        .unwrap()
        .funcs()
        .filter(|f| f.recv.is_none())
        .map(|f| f.name.name.clone())
        .collect()
}

/// Functions named `base` plus a generated suffix.
fn specializations(source: &str, base: &str) -> Vec<String> {
    func_names(source)
        .into_iter()
        .filter(|name| is_specialization_of(name, base))
        .collect()
}

fn is_specialization_of(name: &str, base: &str) -> bool {
    let Some(suffix) = name.strip_prefix(base) else {
        return false;
    };
    let mut chars = suffix.chars();
    suffix.len() == 8
        && chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_lowercase())
}

const IS_PRIME: &str = r#"package main

import (
	"fmt"
	"math"
)

type Integer interface {
	~int | ~int8 | ~uint | ~uint8
}

func abs[T Integer](x T) T {
	if x < 0 {
		return -x
	}
	return x
}

func IsPrime[T Integer](x T) bool {
	x = abs(x)
	if x < 2 {
		return false
	}
	if x == 2 {
		return true
	}
	for i := T(2); i <= T(math.Sqrt(float64(x))); i++ {
		if x%i == 0 {
			return false
		}
	}
	return true
}

func main() {
	n := int8(57)
	isPrime := IsPrime(n)
	if isPrime {
		fmt.Printf("%v is prime\n", n)
	} else {
		fmt.Printf("%v is not prime\n", n)
	}
}
"#;

const MINIMUM: &str = r#"package main

func minimum[T int | float64](a, b T) T {
	if a < b {
		return a
	}
	return b
}

func main() {
	println(minimum(3, 5))
	println(minimum(3.0, 5.0))
}
"#;

// =============================================================================
// SCENARIOS
// =============================================================================

mod scenario_tests {
    use super::*;

    #[test]
    fn test_is_prime_transitive_specialization() {
        let output = specialize(IS_PRIME);
        let out = &output.source;

        let abs = specializations(out, "abs");
        let is_prime = specializations(out, "IsPrime");
        assert_eq!(abs.len(), 1);
        assert_eq!(is_prime.len(), 1);

        assert!(out.contains(&format!("func {}(x int8) int8 {{", abs[0])));
        assert!(out.contains(&format!("func {}(x int8) bool {{", is_prime[0])));
        assert!(out.contains(&format!("x = {}(x)", abs[0])));
        assert!(out.contains(&format!("isPrime := {}(n)", is_prime[0])));
        assert!(out.contains("for i := int8(2); i <= int8(math.Sqrt(float64(x))); i++ {"));
        assert!(!out.contains("Integer"));
        assert!(!out.contains("[T"));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_minimum_gets_one_specialization_per_type() {
        let out = specialize(MINIMUM).source;
        let names = specializations(&out, "minimum");
        assert_eq!(names.len(), 2);

        let file = goder_parser::parse(&out).unwrap();
        let bodies: Vec<String> = file
            .funcs()
            .filter(|f| names.contains(&f.name.name))
            .map(|f| {
                let mut unit = goder_parser::parse("package main\n").unwrap();
                let mut f = f.clone();
                f.name.name = "minimum".to_string();
                unit.decls.push(goder_parser::ast::Decl::Func(f));
                goder_fmt::render(&unit)
            })
            .collect();
        let as_float = bodies.iter().find(|b| b.contains("float64")).unwrap();
        let as_int = bodies.iter().find(|b| !b.contains("float64")).unwrap();
        assert_eq!(as_float.replace("float64", "int"), *as_int);

        for name in &names {
            assert_eq!(out.matches(&format!("{}(", name)).count(), 2);
        }
    }

    #[test]
    fn test_map_lambda_binding() {
        let out = specialize(
            r#"package main

import (
	"fmt"
	"strconv"
)

func Map[T any, R any](collection []T, iteratee func(T, int) R) []R {
	result := make([]R, len(collection))

	for i, item := range collection {
		result[i] = iteratee(item, i)
	}

	return result
}

func main() {
	a := []int{1, 2, 3, 4, 5}
	b := Map(a, func(t int, _ int) string {
		return strconv.Itoa(t)
	})
	fmt.Println(b)
}
"#,
        )
        .source;
        let names = specializations(&out, "Map");
        assert_eq!(names.len(), 1);
        assert!(out.contains(&format!(
            "func {}(collection []int, iteratee func(int, int) string) []string {{",
            names[0]
        )));
        assert!(out.contains("result := make([]string, len(collection))"));
        assert!(out.contains(&format!("b := {}(a, func(t int, _ int) string {{", names[0])));
    }

    #[test]
    fn test_unused_generic_is_dropped() {
        let out = specialize(
            "package main

type Number interface {
	~int | ~float64
}

func Sum[T Number](xs []T) T {
	var total T
	for _, x := range xs {
		total += x
	}
	return total
}

func main() {
	println(1)
}
",
        )
        .source;
        assert_eq!(out, "package main\n\nfunc main() {\n\tprintln(1)\n}\n");
    }

    #[test]
    fn test_untyped_constants_use_default_types() {
        let out = specialize(
            "package main

import \"fmt\"

type Num interface {
	~int | ~int8 | ~int16 | ~int32 | ~int64 |
		~uint | ~uint8 | ~uint16 | ~uint32 | ~uint64 |
		~float32 | ~float64
}

func add[T Num](a, b T) T {
	return a + b
}

func main() {
	fmt.Println(add(33, 4))
}
",
        )
        .source;
        let names = specializations(&out, "add");
        assert_eq!(names.len(), 1);
        assert!(out.contains(&format!("func {}(a, b int) int {{", names[0])));
        assert!(!out.contains("Num"));
    }

    #[test]
    fn test_explicit_instantiation() {
        let out = specialize(
            "package main

func Zero[T any]() T {
	var z T
	return z
}

func main() {
	s := Zero[string]()
	println(s)
}
",
        )
        .source;
        let names = specializations(&out, "Zero");
        assert_eq!(names.len(), 1);
        assert!(out.contains(&format!("func {}() string {{", names[0])));
        assert!(out.contains(&format!("s := {}()", names[0])));
    }

    #[test]
    fn test_generic_type_instances() {
        let out = specialize(
            "package main

type Pair[K comparable, V any] struct {
	Key   K
	Value V
}

func (p Pair[K, V]) Swap() Pair[V, K] {
	return Pair[V, K]{Key: p.Value, Value: p.Key}
}

func main() {
	p := Pair[string, int]{Key: \"a\", Value: 1}
	q := p.Swap()
	println(q.Key)
}
",
        )
        .source;
        let file = goder_parser::parse(&out).unwrap();
        let types: Vec<String> = file.types().map(|t| t.name.name.clone()).collect();
        assert_eq!(types.len(), 2);
        assert!(!out.contains("Pair["));
        assert!(out.contains("Key   string"));
        assert!(out.contains("Key   int"));
        assert_eq!(file.funcs().filter(|f| f.name.name == "Swap").count(), 2);
    }
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

mod diagnostic_tests {
    use super::*;

    #[test]
    fn test_map_parameter_reports_incomplete_binding() {
        let output = specialize(
            "package main

func Keys[K comparable, V any](m map[K]V) []K {
	var out []K
	for k := range m {
		out = append(out, k)
	}
	return out
}

func main() {
	ages := map[string]int{\"a\": 1}
	println(len(Keys(ages)))
}
",
        );
        assert_eq!(output.diagnostics.len(), 1);
        let diagnostic = &output.diagnostics[0];
        assert_eq!(diagnostic.callee, "Keys");
        assert_eq!(diagnostic.missing, vec!["K", "V"]);
        assert_eq!(diagnostic.span.map(|s| s.line), Some(13));

        // The specialization is emitted with the parameters left in place.
        assert!(output
            .source
            .contains(&format!("func {}(m map[K]V) []K {{", diagnostic.specialized)));
    }

    const APPLY: &str = "package main

func Apply[T any](f func(T) bool) bool {
	var zero T
	return f(zero)
}

func main() {
	p := func(x int) bool { return x > 0 }
	println(Apply(p))
}
";

    #[test]
    fn test_function_variable_reports_incomplete_binding() {
        let output = specialize(APPLY);
        assert_eq!(output.diagnostics.len(), 1);
        let diagnostic = &output.diagnostics[0];
        assert_eq!(diagnostic.callee, "Apply");
        assert_eq!(diagnostic.missing, vec!["T"]);
        assert!(output
            .source
            .contains(&format!("func {}(f func(T) bool) bool {{", diagnostic.specialized)));
    }

    #[test]
    fn test_refined_matching_binds_function_variable() {
        let config = Config {
            generics: GenericsConfig {
                matching: TypeMatching::Refined,
                ..Default::default()
            },
            ..Default::default()
        };
        let output = Transformer::new(config)
            .transform(APPLY, Mode::Generics)
            .unwrap();
        assert!(output.diagnostics.is_empty());
        let names = specializations(&output.source, "Apply");
        assert_eq!(names.len(), 1);
        assert!(output
            .source
            .contains(&format!("func {}(f func(int) bool) bool {{", names[0])));
    }
}

// =============================================================================
// NAMING
// =============================================================================

mod naming_tests {
    use super::*;

    #[test]
    fn test_content_hash_names_are_reproducible() {
        let first = specialize(MINIMUM).source;
        let second = specialize(MINIMUM).source;
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_names_one_per_call_site() {
        let config = Config {
            generics: GenericsConfig {
                naming: NamingStrategy::Random,
                ..Default::default()
            },
            ..Default::default()
        };
        let source = "package main

func id[T any](x T) T {
	return x
}

func main() {
	println(id(1), id(2))
}
";
        let out = Transformer::new(config)
            .with_seed(42)
            .transform(source, Mode::Generics)
            .unwrap()
            .source;
        assert_eq!(specializations(&out, "id").len(), 2);
    }

    #[test]
    fn test_suffix_length_is_configurable() {
        let config = Config {
            generics: GenericsConfig {
                suffix_len: 4,
                ..Default::default()
            },
            ..Default::default()
        };
        let out = Transformer::new(config)
            .transform(MINIMUM, Mode::Generics)
            .unwrap()
            .source;
        let lengths: Vec<usize> = func_names(&out)
            .iter()
            .filter(|n| n.starts_with("minimum"))
            .map(|n| n.len() - "minimum".len())
            .collect();
        assert_eq!(lengths, vec![4, 4]);
    }
}

// =============================================================================
// PROPERTIES
// =============================================================================

mod property_tests {
    use super::*;

    #[test]
    fn test_specialization_is_idempotent() {
        let once = specialize(IS_PRIME).source;
        let twice = specialize(&once).source;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_round_trip_without_generics() {
        let source = "package main

import \"fmt\"

type Point struct {
	X, Y int
}

func (p Point) Add(q Point) Point {
	return Point{X: p.X + q.X, Y: p.Y + q.Y}
}

func main() {
	fmt.Println(Point{1, 2}.Add(Point{3, 4}))
}
";
        let out = specialize(source).source;
        assert_eq!(out, goder_fmt::format_source(source).unwrap());
        assert_eq!(out, source);
    }
}
