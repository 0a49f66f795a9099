//! Prompt assembly benchmarks
//!
//! Measures the per-request, non-I/O work done before the upstream call:
//! rendering the knowledge block, building the prompt and parsing config.
//!
//! ## Expected Performance Characteristics
//!
//! - Knowledge rendering: tens of microseconds for a few hundred listings,
//!   linear in listing count until the character cap is reached
//! - Prompt build: a single allocation plus copy, sub-microsecond for short blocks
//! - Config parsing: single-digit microseconds (one-time startup cost)
//!
//! Run with: `cargo bench`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use reqwest::StatusCode;
use safari_concierge::{
    catalog::{ContactBlock, HotelSummary, ListingSummary, PackageSummary},
    config::Config,
    context::{DEFAULT_MAX_LISTING_CHARS, KnowledgeSnapshot},
    models::client::classify_status,
    prompt::Prompt,
};
use std::hint::black_box;

fn contact() -> ContactBlock {
    ContactBlock {
        emails: vec!["info@example.com".to_string()],
        phones: vec!["+254 700 000 000".to_string()],
        address: "Kenyatta Avenue, Nairobi".to_string(),
    }
}

fn snapshot(count: usize) -> KnowledgeSnapshot {
    let hotels = (0..count).map(|i| {
        ListingSummary::Hotel(HotelSummary {
            name: format!("Lodge {}", i),
            location: "Maasai Mara".to_string(),
            price: 80.0 + i as f64,
        })
    });
    let packages = (0..count).map(|i| {
        ListingSummary::Package(PackageSummary {
            title: format!("Safari {}", i),
            description: "Three days of game drives with full board".to_string(),
            price: 450.0 + i as f64,
        })
    });
    KnowledgeSnapshot::new(hotels.chain(packages).collect(), contact())
}

/// Benchmark knowledge block rendering at several catalog sizes
///
/// The largest size exceeds the default cap, so it also covers truncation.
fn bench_knowledge_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("knowledge_render");

    for count in [10usize, 100, 1000] {
        let snapshot = snapshot(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &snapshot, |b, s| {
            b.iter(|| s.render(black_box(DEFAULT_MAX_LISTING_CHARS)));
        });
    }

    group.finish();
}

fn bench_prompt_build(c: &mut Criterion) {
    let queries = vec![
        ("short", "Hotels in Nairobi?"),
        (
            "medium",
            "Can you plan a five day itinerary covering Amboseli and Tsavo for two adults in August?",
        ),
    ];
    let knowledge = snapshot(100).render(DEFAULT_MAX_LISTING_CHARS);

    let mut group = c.benchmark_group("prompt_build");

    for (name, query) in queries {
        group.bench_with_input(BenchmarkId::from_parameter(name), &query, |b, q| {
            b.iter(|| Prompt::build(black_box(&knowledge), q));
        });
    }

    group.finish();
}

/// Benchmark upstream status classification on the retry path
fn bench_status_classification(c: &mut Criterion) {
    let body = r#"{"error":{"code":400,"message":"models/gemini-9 is not supported for generateContent"}}"#;

    c.bench_function("classify_status", |b| {
        b.iter(|| classify_status(black_box("gemini-9"), StatusCode::BAD_REQUEST, body));
    });
}

fn bench_config_parsing(c: &mut Criterion) {
    let toml_str = r#"
[server]
host = "127.0.0.1"
port = 3000

[[upstream.models]]
name = "gemini-2.5-flash"

[[upstream.models]]
name = "gemini-2.0-flash"

[catalog]
hotels_path = "data/hotels.json"
packages_path = "data/packages.json"

[contact]
emails = ["info@example.com"]
phones = ["+254 700 000 000"]
address = "Nairobi"
"#;

    c.bench_function("config_parsing", |b| {
        b.iter(|| {
            let config: Config = toml::from_str(toml_str).unwrap();
            config
        });
    });
}

criterion_group!(
    benches,
    bench_knowledge_render,
    bench_prompt_build,
    bench_status_classification,
    bench_config_parsing,
);
criterion_main!(benches);
