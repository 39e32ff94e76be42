use std::hint::black_box;

use bencher::Fixture;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use futures::executor::block_on;
use http::StatusCode;
use wire_http::codec::RequestDecoder;
use wire_http::connection::{RequestReader, ResponseWriter, default_headers};

static GET_SMALL: Fixture = Fixture::new("get_small", include_bytes!("../resources/request/get_small.txt"));
static POST_LARGE: Fixture = Fixture::new("post_large", include_bytes!("../resources/request/post_large.txt"));

fn benchmark_request_decoder(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("request_decoder");

    for fixture in [GET_SMALL, POST_LARGE] {
        group.throughput(Throughput::Bytes(fixture.content().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fixture.name()), &fixture, |b, fixture| {
            b.iter(|| {
                let mut decoder = RequestDecoder::new();
                decoder.decode(fixture.content()).expect("fixture should be a valid request");
                black_box(decoder.finish().expect("fixture should be a complete request"));
            });
        });
    }

    group.finish();
}

fn benchmark_request_reader(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("request_reader");

    for fixture in [GET_SMALL, POST_LARGE] {
        group.throughput(Throughput::Bytes(fixture.content().len() as u64));
        for per_read in [16, 512, fixture.content().len()] {
            let id = BenchmarkId::new(fixture.name(), per_read);
            group.bench_with_input(id, &fixture, |b, fixture| {
                b.iter(|| {
                    let mut reader = RequestReader::new(fixture.source(per_read));
                    black_box(block_on(reader.read_request()).expect("fixture should be a valid request"));
                });
            });
        }
    }

    group.finish();
}

fn benchmark_response_writer(criterion: &mut Criterion) {
    let body = POST_LARGE.content();

    criterion.bench_function("response_writer/chunked", |b| {
        b.iter(|| {
            block_on(async {
                let mut writer = ResponseWriter::new(tokio::io::sink());
                let mut headers = default_headers(0);
                headers.remove("content-length");
                headers.insert("transfer-encoding", "chunked");
                writer.write_status_line(StatusCode::OK).await?;
                writer.write_headers(&headers).await?;
                for chunk in body.chunks(256) {
                    writer.write_chunked_body(chunk).await?;
                }
                writer.write_chunked_body_done().await?;
                writer.close().await
            })
            .expect("writing to a sink should not fail");
        });
    });
}

criterion_group!(request, benchmark_request_decoder, benchmark_request_reader, benchmark_response_writer);
criterion_main!(request);
