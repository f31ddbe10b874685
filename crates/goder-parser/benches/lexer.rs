use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use goder_parser::Lexer;

fn bench_keywords(c: &mut Criterion) {
    let source = "break case chan const continue default defer else fallthrough for func go goto if import interface map package range return select struct switch type var";

    c.bench_function("lex_keywords", |b| {
        b.iter(|| {
            let lexer = Lexer::new(black_box(source));
            lexer.tokenize().unwrap()
        });
    });
}

fn bench_numbers(c: &mut Criterion) {
    let mut group = c.benchmark_group("numbers");

    let integers = "42 123 0 999 1_000_000 0o755 0b1010";
    group.bench_with_input(
        BenchmarkId::new("integers", "simple"),
        &integers,
        |b, source| {
            b.iter(|| {
                let lexer = Lexer::new(black_box(source));
                lexer.tokenize().unwrap()
            });
        },
    );

    let floats = "3.14 2.718 1.414 0.5 123.456e10 1.23e-5";
    group.bench_with_input(
        BenchmarkId::new("floats", "various"),
        &floats,
        |b, source| {
            b.iter(|| {
                let lexer = Lexer::new(black_box(source));
                lexer.tokenize().unwrap()
            });
        },
    );

    group.finish();
}

fn bench_semicolon_insertion(c: &mut Criterion) {
    let source = "x := 1\ny := x + 2\nreturn\nz++\nf()\n// comment\ns[i]\n";

    c.bench_function("lex_semicolons", |b| {
        b.iter(|| {
            let lexer = Lexer::new(black_box(source));
            lexer.tokenize().unwrap()
        });
    });
}

fn bench_real_code(c: &mut Criterion) {
    let mut group = c.benchmark_group("real_code");

    let generic = r#"
package main

import (
	"fmt"
	"strconv"
)

// Map applies f to every element.
func Map[T, R any](items []T, f func(T) R) []R {
	out := make([]R, 0, len(items))
	for _, item := range items {
		out = append(out, f(item))
	}
	return out
}

func main() {
	nums := []int{1, 2, 3}
	strs := Map(nums, func(n int) string { return strconv.Itoa(n) })
	fmt.Println(strs)
}
"#;

    group.throughput(Throughput::Bytes(generic.len() as u64));
    group.bench_with_input(
        BenchmarkId::new("generic_file", "map"),
        &generic,
        |b, source| {
            b.iter(|| {
                let lexer = Lexer::new(black_box(source));
                lexer.tokenize().unwrap()
            });
        },
    );

    let methods = r#"
type Stack[T any] struct {
	items []T
}

func (s *Stack[T]) Push(v T) {
	s.items = append(s.items, v)
}

func (s *Stack[T]) Pop() (T, bool) {
	var zero T
	if len(s.items) == 0 {
		return zero, false
	}
	v := s.items[len(s.items)-1]
	s.items = s.items[:len(s.items)-1]
	return v, true
}
"#;

    group.throughput(Throughput::Bytes(methods.len() as u64));
    group.bench_with_input(
        BenchmarkId::new("generic_type", "stack"),
        &methods,
        |b, source| {
            b.iter(|| {
                let lexer = Lexer::new(black_box(source));
                lexer.tokenize().unwrap()
            });
        },
    );

    group.finish();
}

criterion_group!(
    benches,
    bench_keywords,
    bench_numbers,
    bench_semicolon_insertion,
    bench_real_code
);
criterion_main!(benches);
