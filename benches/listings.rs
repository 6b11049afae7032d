use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graphite::assembler;

fn countdown_source() -> String {
    let mut source = String::from("top: loadimm 255 ax;\n");
    for _ in 0..64 {
        source.push_str("sub ax 1;\npush ax;\nmov ax [9];\ncjmp top 2;\n");
    }
    source.push_str("hlt;\n");
    source
}

fn bench_assemble(c: &mut Criterion) {
    let source = countdown_source();
    assert!(assembler::assemble(&source).is_ok());

    c.bench_function("assemble_countdown", |b| {
        b.iter(|| assembler::assemble(black_box(&source)).unwrap())
    });
}

criterion_group!(benches, bench_assemble);
criterion_main!(benches);
