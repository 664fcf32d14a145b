//! Benchmarks for manifest parsing operations.
//!
//! These benchmarks measure the performance of parsing spec files in both
//! supported formats, plus the dual-dispatch path a config-format file
//! takes (legacy attempt, then config fallback).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use source_fetch::manifest;

/// Minimal legacy spec with a single component.
const MINIMAL_LEGACY: &str = "tarball zlib https://example/zlib-1.3.tar.gz\n";

/// Legacy spec exercising every record shape.
const FULL_LEGACY: &str = "\
# Core components
tarball zlib https://example/zlib-1.3.tar.gz
tarball bash https://example/bash-5.2.tar.gz https://example/bash/series
git kernel https://example/kernel.git version v6.6
git tools https://example/tools.git branch work dev
svn vendor svn://example/vendor version 4242
bldroot base channel stable filter ok,tested
";

/// Config spec mirroring FULL_LEGACY.
const FULL_CONFIG: &str = "\
[zlib]
type=tarball
url=https://example/zlib-1.3.tar.gz

[bash]
type=tarball
url=https://example/bash-5.2.tar.gz
series=https://example/bash/series

[kernel]
type=git
url=https://example/kernel.git
version=v6.6

[tools]
type=git
url=https://example/tools.git
branch=work
remote-branch=dev

[vendor]
type=subversion
url=svn://example/vendor
revision=4242

[base]
type=bldroot
channel=stable
status-filter=ok,tested
";

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest_parse");
    for (name, text) in [
        ("minimal_legacy", MINIMAL_LEGACY),
        ("full_legacy", FULL_LEGACY),
        ("full_config", FULL_CONFIG),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, text| {
            b.iter(|| manifest::parse(black_box(text)).unwrap())
        });
    }
    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let manifest = manifest::parse(FULL_LEGACY).unwrap();
    let mut group = c.benchmark_group("manifest_write");
    group.bench_function("legacy", |b| {
        b.iter(|| manifest::write_legacy(black_box(&manifest)))
    });
    group.bench_function("config", |b| {
        b.iter(|| manifest::write_config(black_box(&manifest)))
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_round_trip);
criterion_main!(benches);
