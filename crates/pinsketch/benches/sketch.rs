//! Sketch micro-benchmarks: insertion, serialization, decoding.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pinsketch::{implementation_supported, Sketch, IMPL_CLMUL, IMPL_GENERIC};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn available_impls(bits: u32) -> Vec<(u32, &'static str)> {
  let mut impls = vec![(IMPL_GENERIC, "generic")];
  if implementation_supported(bits, IMPL_CLMUL) {
    impls.push((IMPL_CLMUL, "clmul"));
  }
  impls
}

fn filled_sketch(bits: u32, implementation: u32, capacity: usize, rng: &mut StdRng) -> Sketch {
  let max = if bits == 64 { u64::MAX } else { (1 << bits) - 1 };
  let mut s = Sketch::with_seed(bits, implementation, capacity, 0xbeef).unwrap();
  for _ in 0..capacity {
    s.add(rng.gen_range(1..=max));
  }
  s
}

fn bench_add(c: &mut Criterion) {
  let mut group = c.benchmark_group("add");
  for bits in [32u32, 64] {
    for (implementation, name) in available_impls(bits) {
      group.bench_with_input(BenchmarkId::new(name, bits), &bits, |b, &bits| {
        let mut s = Sketch::with_seed(bits, implementation, 64, 1).unwrap();
        let mut x = 1u64;
        b.iter(|| {
          x = x.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1;
          s.add(x);
        });
      });
    }
  }
  group.finish();
}

fn bench_decode(c: &mut Criterion) {
  let mut group = c.benchmark_group("decode");
  group.sample_size(20);
  for (bits, capacity) in [(32u32, 8usize), (32, 32), (64, 16)] {
    for (implementation, name) in available_impls(bits) {
      let mut rng = StdRng::seed_from_u64(7);
      let s = filled_sketch(bits, implementation, capacity, &mut rng);
      let id = BenchmarkId::new(name, format!("{bits}b/{capacity}"));
      group.bench_function(id, |b| {
        b.iter(|| s.decode(capacity).unwrap());
      });
    }
  }
  group.finish();
}

fn bench_serialize(c: &mut Criterion) {
  let mut group = c.benchmark_group("serialize");
  let mut rng = StdRng::seed_from_u64(3);
  let s = filled_sketch(64, IMPL_GENERIC, 128, &mut rng);
  group.bench_function("64b/128", |b| b.iter(|| s.serialize()));
  group.finish();
}

criterion_group!(benches, bench_add, bench_decode, bench_serialize);
criterion_main!(benches);
