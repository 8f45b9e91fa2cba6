//! Benchmarks for block decoding.
//!
//! Run with: `cargo bench`
//! Compare with baseline: `cargo bench -- --save-baseline main`
//! Compare against baseline: `cargo bench -- --baseline main`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rar_blocks::formats::RAR15_SIGNATURE;
use rar_blocks::{ArchiveDecoder, BlockDispatcher, DecodeOptions, SliceCursor};

/// Stored file entry with `packed` bytes of data.
fn file_block(name: &str, packed: usize) -> Vec<u8> {
    let mut block = vec![0x00, 0x00, 0x74, 0x00, 0x00];
    block.extend_from_slice(&((32 + name.len()) as u16).to_le_bytes());
    block.extend_from_slice(&(packed as u32).to_le_bytes());
    block.extend_from_slice(&(packed as u32).to_le_bytes());
    block.push(2);
    block.extend_from_slice(&[0u8; 8]);
    block.push(29);
    block.push(0x30);
    block.extend_from_slice(&(name.len() as u16).to_le_bytes());
    block.extend_from_slice(&0x20u32.to_le_bytes());
    block.extend_from_slice(name.as_bytes());
    block.resize(block.len() + packed, 0xA5);
    block
}

/// Marker, archive header, `files` entries and an end block.
fn synthetic_archive(files: usize, packed: usize) -> Vec<u8> {
    let mut data = RAR15_SIGNATURE.to_vec();
    data.extend_from_slice(&[0x00, 0x00, 0x73, 0x00, 0x00, 0x0D, 0x00, 0, 0, 0, 0, 0, 0]);
    for i in 0..files {
        data.extend(file_block(&format!("dir/file-{:05}.bin", i), packed));
    }
    data.extend_from_slice(&[0x00, 0x00, 0x7B, 0x00, 0x40, 0x07, 0x00]);
    data
}

fn bench_decode_archive(c: &mut Criterion) {
    let data = synthetic_archive(1000, 256);

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("keep_payloads", |b| {
        let decoder = ArchiveDecoder::new();
        b.iter(|| {
            let archive = decoder.decode_bytes(black_box(&data)).unwrap();
            black_box(archive.blocks().len())
        });
    });

    group.bench_function("skip_payloads", |b| {
        let decoder = ArchiveDecoder::with_options(DecodeOptions::default().keep_payloads(false));
        b.iter(|| {
            let archive = decoder.decode_bytes(black_box(&data)).unwrap();
            black_box(archive.blocks().len())
        });
    });

    group.finish();
}

fn bench_single_block(c: &mut Criterion) {
    let block = file_block("single.txt", 0);
    let dispatcher = BlockDispatcher::default();

    c.bench_function("decode_file_block", |b| {
        b.iter(|| {
            let mut cursor = SliceCursor::new(black_box(&block));
            black_box(dispatcher.decode(&mut cursor).unwrap())
        });
    });
}

criterion_group!(benches, bench_decode_archive, bench_single_block);
criterion_main!(benches);
