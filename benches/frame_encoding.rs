//! Benchmarks for frame encoding and the flow-controlled write path

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use http_transport::http::channel::Channel;
use http_transport::http::h2::codec;
use http_transport::http::h2::frames::{DataFrame, HeadersFrame};
use http_transport::http::h2::Http2Encoder;
use http_transport::http::Headers;
use std::io;

/// Channel that discards everything
struct NullChannel;

impl Channel for NullChannel {
    fn write(&mut self, _buf: &[u8]) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) {}

    fn is_open(&self) -> bool {
        true
    }
}

fn bench_encode_data_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_data_frame");
    for size in [64usize, 1024, 16_384] {
        let frame = DataFrame::new(1, Bytes::from(vec![0u8; size]), false);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("{}b", size), |b| {
            b.iter(|| codec::encode_data_frame(black_box(&frame)))
        });
    }
    group.finish();
}

fn bench_encode_headers_frame(c: &mut Criterion) {
    let frame = HeadersFrame::new(1, Bytes::from(vec![0x82u8; 128]), false);
    c.bench_function("encode_headers_frame", |b| {
        b.iter(|| codec::encode_headers_frame(black_box(&frame)).unwrap())
    });
}

fn bench_hpack_header_write(c: &mut Criterion) {
    let mut headers = Headers::new();
    headers.insert(":status", "200");
    headers.insert("content-type", "text/html; charset=utf-8");
    headers.insert("content-length", "4096");
    headers.insert("cache-control", "no-cache");
    headers.insert("server", "http-transport");

    let encoder = Http2Encoder::new(NullChannel);
    c.bench_function("write_headers_hpack", |b| {
        b.iter(|| encoder.write_headers(black_box(1), black_box(&headers), false).unwrap())
    });
}

fn bench_flow_controlled_data_write(c: &mut Criterion) {
    let payload = Bytes::from(vec![0u8; 4096]);
    c.bench_function("write_data_4k", |b| {
        b.iter_batched(
            || Http2Encoder::new(NullChannel),
            |encoder| {
                encoder
                    .write_data(DataFrame::new(1, payload.clone(), true))
                    .unwrap()
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_encode_data_frame,
    bench_encode_headers_frame,
    bench_hpack_header_write,
    bench_flow_controlled_data_write
);
criterion_main!(benches);
