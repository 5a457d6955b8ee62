use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rayon::ThreadPoolBuilder;
use sensor_bench::{
    candidate,
    config::VALUE_COLUMN,
    generator,
    processor::ColumnarProcessor,
    runner::in_process,
};
use std::hint::black_box;
use tempfile::NamedTempFile;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

const ROWS: u64 = 200_000;
const THRESHOLD: f64 = 50.0;

fn dataset() -> NamedTempFile {
    let tmp = NamedTempFile::new().unwrap();
    generator::generate(tmp.path(), ROWS, 42).unwrap();
    tmp
}

fn bench_engine(c: &mut Criterion) {
    let data = dataset();
    let path = data.path();

    let mut group = c.benchmark_group("columnar_engine");
    group.sample_size(20);
    group.throughput(Throughput::Elements(ROWS));

    group.bench_function("load_csv", |b| {
        b.iter(|| {
            let mut processor = ColumnarProcessor::new();
            processor.load_csv(path).unwrap();
            black_box(processor.row_count())
        })
    });

    let mut processor = ColumnarProcessor::new();
    processor.load_csv(path).unwrap();

    group.bench_function("filter_only", |b| {
        b.iter(|| {
            processor
                .filter_greater_than(VALUE_COLUMN, black_box(THRESHOLD))
                .unwrap()
        })
    });

    let rows = processor
        .filter_greater_than(VALUE_COLUMN, THRESHOLD)
        .unwrap();
    group.bench_function("average_selection", |b| {
        b.iter(|| {
            processor
                .average_rows(VALUE_COLUMN, black_box(&rows))
                .unwrap()
        })
    });

    group.bench_function("full_workload", |b| {
        b.iter(|| in_process::run(path, black_box(THRESHOLD)).unwrap())
    });
    group.finish();
}

fn bench_candidate(c: &mut Criterion) {
    let data = dataset();

    let mut group = c.benchmark_group("candidate");
    group.sample_size(10);
    group.throughput(Throughput::Elements(ROWS));
    group.bench_function("read_and_process", |b| {
        b.iter(|| {
            let records = candidate::read_records(data.path()).unwrap();
            candidate::process(&records, black_box(THRESHOLD), false)
        })
    });
    group.finish();
}

fn bench_thread_scaling(c: &mut Criterion) {
    let data = dataset();
    let path = data.path();

    let mut group = c.benchmark_group("thread_scaling");
    group.sample_size(10);
    for threads in [1, 2, 4, 8] {
        let pool = ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, _| {
            pool.install(|| b.iter(|| in_process::run(path, THRESHOLD).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_engine, bench_candidate, bench_thread_scaling);
criterion_main!(benches);
