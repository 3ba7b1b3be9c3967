use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgchain::{ExpressionChain, Param, args, escape_args};

/// A chain with `n` columns, `n` predicates and one join:
/// SELECT col0, ... FROM t JOIN u ON u.t_id = t.id AND u.k = ? WHERE col0 = ? AND ...
fn build_select_chain(n: usize) -> ExpressionChain {
    let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let mut chain = ExpressionChain::new()
        .select(columns)
        .table("t")
        .join("u ON u.t_id = t.id AND u.k = ?", args!["k"])
        .order_by("col0")
        .limit(100);
    for i in 0..n {
        chain = chain.and_where(format!("col{i} = ?"), args![i as i64]);
    }
    chain
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain/render");

    for n in [1, 5, 10, 50, 100] {
        let chain = build_select_chain(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &chain, |b, chain| {
            b.iter(|| black_box(chain.render()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select_chain(n).render()));
        });
    }

    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain/insert");

    for n in [5, 20, 100] {
        let values: Vec<(String, Param)> = (0..n)
            .map(|i| (format!("col{i}"), Param::new(i as i64)))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let chain = ExpressionChain::new()
                    .insert(values.iter().cloned())
                    .table("t");
                black_box(chain.render())
            });
        });
    }

    group.finish();
}

fn bench_escape_args(c: &mut Criterion) {
    let mut group = c.benchmark_group("placeholder/escape_args");

    for n in [1, 10, 100] {
        let statement = format!(
            "SELECT * FROM t WHERE id IN ({})",
            vec!["?"; n].join(", ")
        );
        group.bench_with_input(BenchmarkId::from_parameter(n), &statement, |b, statement| {
            b.iter(|| {
                let params: Vec<Param> = (0..n).map(|i| Param::new(i as i64)).collect();
                black_box(escape_args(statement, params))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render,
    bench_build_and_render,
    bench_insert,
    bench_escape_args
);
criterion_main!(benches);
