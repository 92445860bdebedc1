use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use predicate_filter::lexer::Lexer;
use predicate_filter::{lower, ConstantRef, Record, Translator};
use uuid::Uuid;

const CASES: [(&str, &str); 3] = [
    ("simple", r#"|p| p.Name == "Some name""#),
    ("captured", r#"|p| p.Name == user.Name && p.Age == user.Age || p.Id == first_user.Id"#),
    (
        "complex",
        r#"|p| p.Name == "Some name" && (p.Description == "dsafsdfsdfs" || p.Age == 6 || p.Id == Uuid::nil())"#,
    ),
];

fn closure_env() -> ConstantRef {
    let user = Record::new("User").with("Name", "Namee").with("Age", 33);
    let first_user = Record::new("User").with("Id", Uuid::new_v4());
    ConstantRef::new(
        Record::new("closure")
            .with("user", user)
            .with("first_user", first_user),
    )
}

// 基准测试：词法分析性能
fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_performance");

    for (name, source) in CASES {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &source, |b, &source| {
            b.iter(|| {
                let tokens: Vec<_> = Lexer::new(black_box(source)).collect();
                black_box(tokens)
            })
        });
    }

    group.finish();
}

// 基准测试：闭包降低为谓词树
fn benchmark_lowering(c: &mut Criterion) {
    let env = closure_env();
    let mut group = c.benchmark_group("lowering_performance");

    for (name, source) in CASES {
        group.bench_with_input(BenchmarkId::new("lower", name), &source, |b, &source| {
            b.iter(|| black_box(lower(black_box(source), &env).expect("解析应该成功")))
        });
    }

    group.finish();
}

// 基准测试：翻译性能
fn benchmark_translator(c: &mut Criterion) {
    let env = closure_env();
    let translator = Translator::new();
    let mut group = c.benchmark_group("translator_performance");

    for (name, source) in CASES {
        let filter = lower(source, &env).expect("解析应该成功");
        group.bench_with_input(BenchmarkId::new("translate", name), &filter, |b, filter| {
            b.iter(|| black_box(translator.translate(black_box(filter)).expect("翻译应该成功")))
        });
    }

    group.finish();
}

// 基准测试：完整的端到端处理
fn benchmark_end_to_end(c: &mut Criterion) {
    let env = closure_env();
    let translator = Translator::new();
    let mut group = c.benchmark_group("end_to_end_performance");

    for (name, source) in CASES {
        group.bench_with_input(BenchmarkId::new("full_pipeline", name), &source, |b, &source| {
            b.iter(|| {
                let filter = lower(black_box(source), &env).expect("解析应该成功");
                black_box(translator.translate(&filter).expect("翻译应该成功"))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lexer,
    benchmark_lowering,
    benchmark_translator,
    benchmark_end_to_end
);
criterion_main!(benches);
