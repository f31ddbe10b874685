//! Round-trip and idempotence tests for the printer

use goder_fmt::{format_source, render};
use goder_parser::parse;

fn render_str(source: &str) -> String {
    render(&parse(source).unwrap())
}

/// `render(parse(render(t))) == render(t)`
fn assert_idempotent(source: &str) {
    let once = render_str(source);
    let twice = render_str(&once);
    assert_eq!(once, twice);
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

const SAMBER_LO: &str = r#"package main

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
	expect := []string{"1", "2", "3", "4", "5"}
	for i := 0; i < len(a); i++ {
		if b[i] != expect[i] {
			panic(nil)
		}
	}
	fmt.Println(b, expect)
}
"#;

const SEGTREE: &str = r#"package main

import (
	"github.com/earlgray283/ac-library-go/segtree"
)

func main() {
	a := []int{3, 5, 2, 11, 9, 6, 20, 8}
	segt := segtree.NewBySlice(
		func(a, b int) int {
			if a < b {
				return a
			}
			return b
		},
		func() int { return 1<<31 - 1 },
		a,
	)
	// [0, 2)
	if got := segt.Prod(0, 2); got != 3 {
		panic("")
	}

	segt.Set(0, 1)
}
"#;

// ============================================================================
// Gofmt-formatted input prints unchanged
// ============================================================================

#[test]
fn test_gofmt_input_is_a_fixed_point() {
    assert_eq!(render_str(IS_PRIME), IS_PRIME);
    assert_eq!(render_str(SAMBER_LO), SAMBER_LO);
}

#[test]
fn test_multiline_call_arguments() {
    let out = render_str(SEGTREE);
    assert!(out.contains("\tsegt := segtree.NewBySlice(\n\t\tfunc(a, b int) int {\n"));
    assert!(out.contains("\t\tfunc() int {\n\t\t\treturn 1<<31 - 1\n\t\t},\n\t\ta,\n\t)\n"));
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_idempotent_on_examples() {
    assert_idempotent(IS_PRIME);
    assert_idempotent(SAMBER_LO);
    assert_idempotent(SEGTREE);
}

#[test]
fn test_idempotent_on_unusual_layout() {
    let source = r#"package main
import "fmt"
type Num interface {
	~int | ~int8 |
		~float32 | ~float64
}
type Tree[T any] struct { Left, Right *Tree[T]; Value T }
func (t *Tree[T]) Walk(visit func(T)) { if t == nil { return }; t.Left.Walk(visit); visit(t.Value); t.Right.Walk(visit) }
func main() {
	m := map[string][]int{"a": {1, 2}, "b": nil}
	for k, v := range m { fmt.Println(k, v[len(v)-1:]) }
	ch := make(chan int, 1)
	select { case ch <- 1: default: }
	var x interface{} = m
	switch y := x.(type) { case map[string][]int: _ = y; case nil: }
	func() { defer func() { recover() }() }()
}
"#;
    assert_idempotent(source);
}

// ============================================================================
// Formatting with import normalization
// ============================================================================

#[test]
fn test_format_source_prunes_and_groups_imports() {
    let source = r#"package main

import (
	"github.com/samber/lo"
	"fmt"
	"os"
)

func main() {
	fmt.Println(strings.ToUpper("x"))
}
"#;
    let out = format_source(source).unwrap();
    assert!(out.starts_with("package main\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n)\n"));
}

#[test]
fn test_format_source_reports_parse_errors() {
    assert!(format_source("package main\n\nfunc main() {\n").is_err());
}
