use std::hint::black_box;

use bencher::{TestCase, TestFile};
use bytes::BytesMut;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use micro_http_token::codec::RequestDecoder;
use micro_http_token::protocol::{Eager, Ranged, Repr};
use tokio_util::codec::Decoder;

static SMALL_HEADER: TestFile = TestFile::new("get_small.txt", include_str!("../resources/request/get_small.txt"));
static LARGE_HEADER: TestFile = TestFile::new("get_large.txt", include_str!("../resources/request/get_large.txt"));
static JSON_BODY: TestFile = TestFile::new("post_json.txt", include_str!("../resources/request/post_json.txt"));

fn create_test_cases() -> Vec<TestCase> {
    vec![
        TestCase::whole("small_header", SMALL_HEADER),
        TestCase::whole("large_header", LARGE_HEADER),
        TestCase::pieces("large_header_64b_reads", 64, LARGE_HEADER),
        TestCase::whole("json_body", JSON_BODY),
        TestCase::pieces("json_body_16b_reads", 16, JSON_BODY),
    ]
}

fn bench_repr<R: Repr>(criterion: &mut Criterion, group_name: &str) {
    let mut group = criterion.benchmark_group(group_name);

    for case in create_test_cases() {
        group.throughput(Throughput::Bytes(case.file().bytes().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            let mut request_decoder = RequestDecoder::<R>::new();
            let reads = case.reads();
            b.iter_batched_ref(
                || BytesMut::with_capacity(case.file().bytes().len()),
                |buf| {
                    for read in &reads {
                        buf.extend_from_slice(read);
                        if let Some(request) = request_decoder.decode(buf).expect("fixture should be a valid request") {
                            black_box(request);
                        }
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_eager(criterion: &mut Criterion) {
    bench_repr::<Eager>(criterion, "request_decoder_eager");
}

fn benchmark_ranged(criterion: &mut Criterion) {
    bench_repr::<Ranged>(criterion, "request_decoder_ranged");
}

criterion_group!(decoder, benchmark_eager, benchmark_ranged);
criterion_main!(decoder);
