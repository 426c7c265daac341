use algoviz::compression::{
    build_frequency_table, build_huffman_tree_with_steps, huffman_encode, lzw_decode, lzw_encode,
    samples,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};

fn random_text(len: usize, alphabet: &[u8]) -> String {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    (0..len)
        .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
        .collect()
}

fn bench_huffman(c: &mut Criterion) {
    let mut group = c.benchmark_group("huffman");
    for &size in &[64, 1024, 8192] {
        let text = random_text(size, b"abcdefghijklmnopqrstuvwxyz ");
        group.bench_with_input(BenchmarkId::new("encode", size), &text, |b, text| {
            b.iter(|| huffman_encode(black_box(text)))
        });
    }
    let freq = build_frequency_table(samples::HTML_MARKUP);
    group.bench_function("trace_html", |b| {
        b.iter(|| build_huffman_tree_with_steps(black_box(&freq)))
    });
    group.finish();
}

fn bench_lzw(c: &mut Criterion) {
    let mut group = c.benchmark_group("lzw");
    for &size in &[64, 1024, 8192] {
        let text = random_text(size, b"abcd");
        group.bench_with_input(BenchmarkId::new("encode", size), &text, |b, text| {
            b.iter(|| lzw_encode(black_box(text)))
        });
        if let Ok(codes) = lzw_encode(&text) {
            group.bench_with_input(BenchmarkId::new("decode", size), &codes, |b, codes| {
                b.iter(|| lzw_decode(black_box(codes)))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_huffman, bench_lzw);
criterion_main!(benches);
