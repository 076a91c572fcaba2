//! Lexer throughput benchmarks.
//!
//! Run with `cargo bench --package hql-lex`.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use hql_util::{FileId, Handler};

fn token_count(source: &str) -> usize {
    let handler = Handler::new();
    hql_lex::lex(source, FileId::DUMMY, &handler).len()
}

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");

    let small = "(+ (* 2 3) (- 10 5))";
    group.throughput(Throughput::Bytes(small.len() as u64));
    group.bench_function("small_expr", |b| b.iter(|| token_count(black_box(small))));

    let nested = r#"
        (defn fib [n]
          (if (< n 2)
            n
            (+ (fib (- n 1)) (fib (- n 2)))))

        (for [i 0 10]
          (print `value: ${i}`))

        (let [{:keys [a b]} {:a 1 :b 2}]
          (+ a b))
    "#;
    group.throughput(Throughput::Bytes(nested.len() as u64));
    group.bench_function("nested_forms", |b| b.iter(|| token_count(black_box(nested))));

    group.finish();
}

criterion_group!(benches, bench_lexer);
criterion_main!(benches);
