use criterion::{Criterion, black_box, criterion_group, criterion_main};

use row_ingest::{CancelToken, ImportOptions, parser_for};

fn csv_input(rows: usize) -> String {
    let mut out = String::from("id,name,score,active\n");
    for i in 0..rows {
        out.push_str(&format!("{i},row{i},{}.5,true\n", i % 100));
    }
    out
}

fn json_lines_input(rows: usize) -> String {
    let mut out = String::new();
    for i in 0..rows {
        out.push_str(&format!(
            "{{\"id\":{i},\"name\":\"row{i}\",\"score\":{}.5}}\n",
            i % 100
        ));
    }
    out
}

fn json_document_input(rows: usize) -> String {
    let items: Vec<String> = (0..rows)
        .map(|i| format!("{{\"id\":{i},\"name\":\"row{i}\"}}"))
        .collect();
    format!("{{\"data\":{{\"items\":[{}]}}}}", items.join(","))
}

fn bench_csv(c: &mut Criterion) {
    let input = csv_input(10_000);
    let parser = parser_for("csv").unwrap();
    let options = ImportOptions::default();

    c.bench_function("csv_10k_rows", |b| {
        b.iter(|| {
            let mut bytes = input.as_bytes();
            let rows = parser
                .parse(&mut bytes, &options, CancelToken::new())
                .filter(|r| r.is_ok())
                .count();
            black_box(rows)
        })
    });
}

fn bench_json_lines(c: &mut Criterion) {
    let input = json_lines_input(10_000);
    let parser = parser_for("jsonl").unwrap();
    let options = ImportOptions {
        json_lines: true,
        ..Default::default()
    };

    c.bench_function("jsonl_10k_rows", |b| {
        b.iter(|| {
            let mut bytes = input.as_bytes();
            let rows = parser
                .parse(&mut bytes, &options, CancelToken::new())
                .filter(|r| r.is_ok())
                .count();
            black_box(rows)
        })
    });
}

fn bench_json_document(c: &mut Criterion) {
    let input = json_document_input(10_000);
    let parser = parser_for("json").unwrap();
    let options = ImportOptions {
        data_root_path: Some("data.items".to_string()),
        ..Default::default()
    };

    c.bench_function("json_document_10k_rows", |b| {
        b.iter(|| {
            let mut bytes = input.as_bytes();
            let rows = parser
                .parse(&mut bytes, &options, CancelToken::new())
                .filter(|r| r.is_ok())
                .count();
            black_box(rows)
        })
    });
}

criterion_group!(benches, bench_csv, bench_json_lines, bench_json_document);
criterion_main!(benches);
