//! Tests for parsing complete Go files

use goder_parser::ast::*;
use goder_parser::parser::Parser;
use goder_parser::{parse, ParseErrorKind};

// ============================================================================
// Whole files
// ============================================================================

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
	for i := T(2); i <= T(math.Sqrt(float64(x))); i++ {
		if x%i == 0 {
			return false
		}
	}
	return true
}

func main() {
	n := int8(57)
	if IsPrime(n) {
		fmt.Printf("%v is prime\n", n)
	}
}
"#;

#[test]
fn test_parse_generic_program() {
    let parser = Parser::new(IS_PRIME).unwrap();
    let file = parser.parse().unwrap();

    assert_eq!(file.package.name, "main");
    assert_eq!(file.imports.len(), 2);
    assert_eq!(file.imports[1].path, "math");
    assert_eq!(file.decls.len(), 4);

    match &file.decls[0] {
        Decl::Type(spec) => {
            assert_eq!(spec.name.name, "Integer");
            assert!(matches!(&spec.ty, TypeExpr::Interface(elems) if elems.len() == 1));
        }
        other => panic!("Expected type declaration, got {:?}", other),
    }

    let generic: Vec<&str> = file
        .funcs()
        .filter(|f| !f.type_params.is_empty())
        .map(|f| f.name.name.as_str())
        .collect();
    assert_eq!(generic, vec!["abs", "IsPrime"]);
}

#[test]
fn test_parse_generic_type_with_methods() {
    let source = r#"package main

type Pair[K comparable, V any] struct {
	Key   K
	Value V
}

func (p Pair[K, V]) Swap() Pair[V, K] {
	return Pair[V, K]{Key: p.Value, Value: p.Key}
}

func (p *Pair[K, V]) SetValue(v V) { p.Value = v }
"#;
    let file = parse(source).unwrap();
    let methods: Vec<String> = file.funcs().map(|f| f.key()).collect();
    assert_eq!(methods, vec!["Pair.Swap", "Pair.SetValue"]);

    let swap = file.funcs().next().unwrap();
    let recv = swap.recv.as_ref().unwrap();
    assert_eq!(recv.type_param_names(), vec!["K", "V"]);
    assert!(!recv.is_pointer());
    assert_eq!(swap.sig.results[0].ty.to_string(), "Pair[V, K]");

    let set = file.funcs().nth(1).unwrap();
    assert!(set.recv.as_ref().unwrap().is_pointer());
}

#[test]
fn test_parse_value_groups_and_iota() {
    let source = r#"package main

const (
	A = iota
	B
	C
)

var (
	x, y = 1, 2
	z    []string
)

var single = "s"
"#;
    let file = parse(source).unwrap();
    assert_eq!(file.decls.len(), 3);
    match &file.decls[0] {
        Decl::Const(group) => {
            assert!(group.grouped);
            assert_eq!(group.specs.len(), 3);
            assert!(group.specs[1].values.is_empty());
        }
        other => panic!("Expected const group, got {:?}", other),
    }
    match &file.decls[2] {
        Decl::Var(group) => assert!(!group.grouped),
        other => panic!("Expected var, got {:?}", other),
    }
    assert_eq!(file.decls[1].names(), vec!["x", "y", "z"]);
}

#[test]
fn test_parse_import_forms() {
    let source = r#"package main

import (
	"fmt"
	str "strings"
	_ "embed"
	. "math"
	"github.com/samber/lo"
	"gopkg.in/yaml.v3"
)
"#;
    let file = parse(source).unwrap();
    let locals: Vec<String> = file.imports.iter().map(|i| i.local_name()).collect();
    assert_eq!(locals, vec!["fmt", "str", "_", ".", "lo", "yaml"]);
    assert!(file.import_named("lo").is_some());
}

// ============================================================================
// Expressions that need disambiguation
// ============================================================================

#[test]
fn test_composite_literal_in_if_header() {
    let source = r#"package main

type P struct{ X int }

func main() {
	p := P{X: 1}
	if p == (P{X: 1}) {
	}
	for _, q := range []P{{X: 2}} {
		_ = q
	}
}
"#;
    assert!(parse(source).is_ok());
}

#[test]
fn test_explicit_instantiation_and_conversions() {
    let source = r#"package main

func main() {
	f := Map[int, string]
	g := (*Node)(nil)
	h := []byte("abc")
	_, _, _ = f, g, h
}
"#;
    let file = parse(source).unwrap();
    let body = &file.funcs().next().unwrap().body.as_ref().unwrap().stmts;
    match &body[0] {
        Stmt::Assign(assign) => match &assign.rhs[0].kind {
            ExprKind::Index { indices, .. } => assert_eq!(indices.len(), 2),
            other => panic!("Expected index expression, got {:?}", other),
        },
        other => panic!("Expected assignment, got {:?}", other),
    }
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_package_clause() {
    let errors = parse("func main() {}\n").unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].suggestion.is_some());
}

#[test]
fn test_errors_in_several_declarations_are_collected() {
    let source = "package main\n\nfunc a() { x := }\n\nfunc b() { y := }\n\nfunc c() {}\n";
    let errors = parse(source).unwrap_err();
    assert!(errors.len() >= 2);
}

#[test]
fn test_lexical_errors_surface_as_parse_errors() {
    let errors = parse("package main\n\nvar s = \"unterminated\n").unwrap_err();
    assert!(matches!(errors[0].kind, ParseErrorKind::Lexical(_)));
}
