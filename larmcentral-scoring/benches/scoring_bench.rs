use criterion::{black_box, criterion_group, criterion_main, Criterion};

use std::collections::{BTreeMap, BTreeSet};

use larmcentral_config::ScoringConfig;
use larmcentral_core::geo::GeoPoint;
use larmcentral_core::model::{Condition, Hospital, HospitalId, Specialty};
use larmcentral_scoring::{HospitalScorer, Requirements};

fn candidate(id: u32) -> Hospital {
    Hospital {
        id: HospitalId::new(format!("H{id:03}")),
        name: format!("Hospital {id}"),
        location: GeoPoint::new(28.6 + f64::from(id) * 0.01, 77.2),
        specialties: [Specialty::Cardiac, Specialty::General]
            .into_iter()
            .collect::<BTreeSet<_>>(),
        total_beds: 30,
        reported_beds: 5 + id % 10,
        reserved_beds: id % 3,
        er_load: f64::from(id % 10) / 10.0,
        equipment: BTreeMap::new(),
        on_call_doctors: 2 + id % 6,
        trauma_center_level: None,
        stroke_center: false,
        last_update_ms: 0,
    }
}

fn bench_rank(c: &mut Criterion) {
    let scorer = HospitalScorer::new(ScoringConfig::default());
    let hospitals: Vec<Hospital> = (0..50).map(candidate).collect();
    let candidates: Vec<(&Hospital, f64)> = hospitals
        .iter()
        .enumerate()
        .map(|(i, h)| (h, 5.0 + i as f64))
        .collect();
    let req = Requirements::for_condition(Condition::Cardiac);

    c.bench_function("rank_50_hospitals", |b| {
        b.iter(|| scorer.rank(black_box(&candidates), black_box(&req)))
    });
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
