use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use micro_http_token::buffer::ScanBuf;
use micro_http_token::cache::TokenCaches;
use micro_http_token::codec::{HeaderValueDecoder, MethodDecoder, QueryDecoder, TokenDecoder};
use micro_http_token::config::LineScan;
use micro_http_token::range::DataRange;

const USER_AGENT: &[u8] =
    b" Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36\r\n";

fn bench_method(c: &mut Criterion) {
    let decoder = MethodDecoder::new(Arc::new(TokenCaches::new()));
    let mut group = c.benchmark_group("method");
    for input in [&b"GET / "[..], b"DELETE / ", b"PROPFIND / "] {
        let name = String::from_utf8_lossy(&input[..input.len() - 3]).into_owned();
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, input| {
            let mut range = DataRange::default();
            b.iter(|| black_box(decoder.decode(&mut ScanBuf::new(input), &mut range).unwrap()));
        });
    }
    group.finish();
}

fn bench_header_value(c: &mut Criterion) {
    let caches = Arc::new(TokenCaches::new());
    let mut group = c.benchmark_group("header_value");
    group.throughput(Throughput::Bytes(USER_AGENT.len() as u64));
    for line_scan in [LineScan::Bytewise, LineScan::Block] {
        let decoder = HeaderValueDecoder::new(Arc::clone(&caches), line_scan);
        group.bench_function(format!("{line_scan:?}"), |b| {
            let mut range = DataRange::default();
            b.iter(|| black_box(decoder.decode(&mut ScanBuf::new(USER_AGENT), &mut range).unwrap()));
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let decoder = QueryDecoder::new(Arc::new(TokenCaches::new()));
    let input = b"?q=rust+http+parser&page=3&sort=relevance&lang=en%2DUS ";
    c.bench_function("query", |b| {
        let mut range = DataRange::default();
        b.iter(|| black_box(decoder.decode(&mut ScanBuf::new(input), &mut range).unwrap()));
    });
}

criterion_group!(tokens, bench_method, bench_header_value, bench_query);
criterion_main!(tokens);
