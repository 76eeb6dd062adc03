use calver::prelude::*;
use chrono::{DateTime, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn layout_inputs() -> Vec<&'static str> {
    vec![
        "YYYY.0M.0D",
        "YY.0M.MICRO",
        "0Y.0W.MICRO-MODIFIER",
        "vMAJOR.MINOR.MICRO+YYYY0M0D",
        "YYYMMMAJORMINORMICROX",
    ]
}

fn compile_layouts(inputs: &[&str]) {
    for input in inputs {
        let res = Layout::parse(input);
        assert!(res.is_ok());
    }
}

fn parse_inputs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("YYYY.0M.0D", "2023.05.20"),
        ("YY.0M.MICRO", "23.05.12"),
        ("0Y.0W.MICRO-MODIFIER", "23.20.1-rc1"),
        ("vMAJOR.MINOR.MICRO+YYYY0M0D", "v1.20.300+20230520"),
    ]
}

fn templates(inputs: &[(&'static str, &'static str)]) -> Vec<(Version, &'static str)> {
    let now = Utc.with_ymd_and_hms(2023, 5, 20, 0, 0, 0).unwrap();
    inputs
        .iter()
        .map(|(layout_str, value)| (Version::new(layout_str, &now).unwrap(), *value))
        .collect()
}

fn parse_versions(templates: &[(Version, &str)]) {
    for (template, value) in templates {
        let res = template.parse(value);
        assert!(res.is_ok());
    }
}

fn next_versions(versions: &[Version], now: &DateTime<Utc>) {
    for version in versions {
        let res = version.next(now);
        assert!(res.is_ok());
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let layouts = layout_inputs();
    c.bench_function("compile_layouts", |b| b.iter(|| compile_layouts(black_box(&layouts))));

    let templates = templates(&parse_inputs());
    c.bench_function("parse_versions", |b| b.iter(|| parse_versions(black_box(&templates))));

    let versions: Vec<Version> = templates
        .iter()
        .map(|(template, value)| template.parse(value).unwrap())
        .collect();
    let later = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
    c.bench_function("next_versions", |b| {
        b.iter(|| next_versions(black_box(&versions), black_box(&later)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
