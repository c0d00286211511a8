// Criterion benchmarks for Kindred Match

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kindred_match::core::{cosine_similarity, haversine_distance, Matcher, MatcherConfig};
use kindred_match::models::{Embedding, GenderPreference, Preferences, Profile};

const DIMENSIONS: usize = 1536;

fn embedding(seed: usize) -> Embedding {
    Embedding::new(
        (0..DIMENSIONS)
            .map(|i| (((i * 31 + seed * 17) % 97) as f32 / 97.0) - 0.5)
            .collect(),
    )
}

fn create_candidate(id: usize) -> Profile {
    Profile {
        user_id: format!("user-{:06}", id),
        bio: String::new(),
        age: 25 + (id % 10) as u8,
        gender: if id % 2 == 0 { "female" } else { "male" }.to_string(),
        location: "New York".to_string(),
        latitude: Some(40.7128 + (id % 100) as f64 * 0.001),
        longitude: Some(-74.0060 + (id % 50) as f64 * 0.001),
        preferences: Preferences {
            age_min: 21,
            age_max: 40,
            max_distance: 50.0,
            gender_preference: GenderPreference::Any,
            dealbreakers: vec![],
        },
        analysis: None,
        embedding: Some(embedding(id)),
        photo_urls: vec![],
        is_complete: true,
        is_active: true,
        updated_at: Utc::now(),
    }
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(40.7128),
                black_box(-74.0060),
                black_box(40.72),
                black_box(-74.01),
            )
        })
    });
}

fn bench_cosine_similarity(c: &mut Criterion) {
    let a = embedding(1);
    let b = embedding(2);

    c.bench_function("cosine_similarity_1536", |bench| {
        bench.iter(|| cosine_similarity(black_box(a.values()), black_box(b.values())))
    });
}

fn bench_rank(c: &mut Criterion) {
    let matcher = Matcher::new(MatcherConfig::default());
    let requester = create_candidate(0);
    let mut group = c.benchmark_group("rank");

    for size in [100usize, 1_000, 10_000] {
        let candidates: Vec<Profile> = (1..=size).map(create_candidate).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &candidates, |b, candidates| {
            b.iter(|| matcher.rank(black_box(&requester), candidates.clone(), None))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_haversine_distance, bench_cosine_similarity, bench_rank);
criterion_main!(benches);
