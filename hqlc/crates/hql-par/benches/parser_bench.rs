//! Parser throughput benchmarks.
//!
//! Run with `cargo bench --package hql-par`.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use hql_util::{FileId, Handler};

fn parse_form_count(source: &str) -> usize {
    let handler = Handler::new();
    hql_par::parse(source, FileId::DUMMY, &handler).len()
}

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    let small = "(+ (* 2 3) (- 10 5))";
    group.throughput(Throughput::Bytes(small.len() as u64));
    group.bench_function("small_expr", |b| b.iter(|| parse_form_count(black_box(small))));

    let nested = r#"
        (defn fib [n]
          (if (< n 2)
            n
            (+ (fib (- n 1)) (fib (- n 2)))))

        (let [{:keys [a b]} {:a 1 :b 2} & rest] [a b])

        (for [i 0 10]
          (print `value: ${i}`))
    "#;
    group.throughput(Throughput::Bytes(nested.len() as u64));
    group.bench_function("nested_forms", |b| b.iter(|| parse_form_count(black_box(nested))));

    group.finish();
}

criterion_group!(benches, bench_parser);
criterion_main!(benches);
