use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use relir_search::fusion::{FusionParams, RankedId, fuse_from_ranks};

const DEPTHS: [usize; 4] = [10, 100, 1_000, 10_000];

/// Two lists of `depth` ids overlapping on every other id.
fn rank_lists(depth: usize) -> (Vec<RankedId>, Vec<RankedId>) {
    let sparse = RankedId::sequence((0..depth).map(|i| format!("doc-{i}")));
    let dense = RankedId::sequence((0..depth).map(|i| format!("doc-{}", i * 2)));
    (sparse, dense)
}

fn bench_fuse_from_ranks(c: &mut Criterion) {
    let mut group = c.benchmark_group("fusion.fuse_from_ranks");

    for depth in DEPTHS {
        let (sparse, dense) = rank_lists(depth);
        let params = FusionParams {
            top_n: depth,
            ..FusionParams::default()
        };

        group.throughput(Throughput::Elements((sparse.len() + dense.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let fused = fuse_from_ranks(black_box(&sparse), black_box(&dense), &params)
                    .expect("valid params");
                black_box(fused.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fuse_from_ranks);
criterion_main!(benches);
