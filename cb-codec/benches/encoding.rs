use bytes::Bytes;
use cb_codec::{from_json, CbWriter};
use cb_format::CbFieldType;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

fn create_test_records(count: usize) -> Value {
    let records: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "id": i,
                "user": format!("user{}", i % 100),
                "timestamp": 1600000000 + i,
                "value": i as f64 * 0.5,
                "level": if i % 3 == 0 { "info" } else if i % 3 == 1 { "warn" } else { "error" },
                "tags": ["a", "b", "c"]
            })
        })
        .collect();
    Value::Array(records)
}

fn write_records(writer: &mut CbWriter, count: usize) {
    writer.begin_array().unwrap();
    for i in 0..count {
        writer.begin_object().unwrap();
        writer.name("id").write_u64(i as u64).unwrap();
        writer.name("user").write_str("user").unwrap();
        writer.name("timestamp").write_u64(1600000000 + i as u64).unwrap();
        writer.name("value").write_f64(i as f64 * 0.5).unwrap();
        writer.name("tags").begin_uniform_array(CbFieldType::String).unwrap();
        for tag in ["a", "b", "c"] {
            writer.write_str(tag).unwrap();
        }
        writer.end_array().unwrap();
        writer.end_object().unwrap();
    }
    writer.end_array().unwrap();
}

fn bench_writer(c: &mut Criterion) {
    let mut group = c.benchmark_group("writer");

    for record_count in [100, 10_000] {
        group.throughput(Throughput::Elements(record_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}rec", record_count)),
            &record_count,
            |b, &count| {
                let mut writer = CbWriter::new();
                b.iter(|| {
                    writer.clear();
                    write_records(&mut writer, count);
                    black_box(writer.to_vec().unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_shared_binary(c: &mut Criterion) {
    let blob = Bytes::from(vec![0x5au8; 1 << 20]);
    c.bench_function("shared_binary_1mib", |b| {
        b.iter(|| {
            let mut writer = CbWriter::new();
            writer.write_binary_shared(blob.clone()).unwrap();
            black_box(writer.hash().unwrap());
        });
    });
}

fn bench_json_conversion(c: &mut Criterion) {
    let records = create_test_records(1_000);
    c.bench_function("from_json_1000rec", |b| {
        b.iter(|| black_box(from_json(black_box(&records)).unwrap()));
    });

    let field = from_json(&records).unwrap();
    c.bench_function("to_json_1000rec", |b| {
        b.iter(|| black_box(field.to_json().unwrap()));
    });
}

fn bench_lookup(c: &mut Criterion) {
    let mut writer = CbWriter::new();
    writer.begin_object().unwrap();
    for i in 0..64 {
        writer.name(&format!("field{}", i)).write_u64(i).unwrap();
    }
    writer.end_object().unwrap();
    let object = writer.save_object().unwrap();

    c.bench_function("object_find_last_of_64", |b| {
        b.iter(|| black_box(object.find(black_box("field63")).as_u64()));
    });
}

criterion_group!(
    benches,
    bench_writer,
    bench_shared_binary,
    bench_json_conversion,
    bench_lookup
);
criterion_main!(benches);
