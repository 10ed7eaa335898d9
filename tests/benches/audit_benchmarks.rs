//! # Provenance-Chain Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Outlier gate, 5..10k priors | linear in sort cost |
//! | Commitment over a shipment record | < 50µs for 100 assets |
//! | Audit round trip on the in-memory ledger | < 1ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pc_01_ledger_store::commitment_of;
use pc_03_emissions_audit::{judge, AuditRequest, OutlierParams, QuartileMethod};
use pc_tests::fixtures::{Network, MINE};
use rand::Rng;
use shared_types::{OrgId, ShippingPrivate};
use std::time::Duration;

// ============================================================================
// OUTLIER GATE
// ============================================================================

fn bench_outlier_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-03-outlier-gate");
    group.measurement_time(Duration::from_secs(5));

    let mut rng = rand::thread_rng();
    for size in [4usize, 5, 100, 1_000, 10_000] {
        let priors: Vec<i64> = (0..size).map(|_| rng.gen_range(800..1_200)).collect();
        group.throughput(Throughput::Elements(size as u64));
        for method in [QuartileMethod::Linear, QuartileMethod::ShiftedRank] {
            let params = OutlierParams {
                quartile_method: method,
                ..OutlierParams::default()
            };
            group.bench_with_input(
                BenchmarkId::new(format!("{method:?}"), size),
                &priors,
                |b, priors| b.iter(|| black_box(judge(1_000, priors, &params))),
            );
        }
    }
    group.finish();
}

// ============================================================================
// COMMITMENTS
// ============================================================================

fn bench_shipment_commitment(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-01-commitment");
    for assets in [1usize, 10, 100] {
        let record = ShippingPrivate {
            id: "S1".into(),
            quantity: assets as u32,
            asset_ids: (0..assets).map(|i| format!("A{i}")).collect(),
            name: "ore".into(),
            date: "01-03-2024".into(),
            emissions_ids: (0..assets)
                .map(|i| vec![format!("E{i}"), "E-rail".into()])
                .collect(),
        };
        group.bench_with_input(BenchmarkId::new("shipping_private", assets), &record, |b, r| {
            b.iter(|| black_box(commitment_of(r)))
        });
    }
    group.finish();
}

// ============================================================================
// AUDIT ROUND TRIP
// ============================================================================

fn bench_audit_round_trip(c: &mut Criterion) {
    let network = Network::new();
    let priors: Vec<String> = (0..8)
        .map(|i| {
            let id = format!("P{i}");
            network
                .report(MINE, "kiln-a", &id, &[], 1_000 + i)
                .expect("seed prior");
            id
        })
        .collect();

    c.bench_function("pc-03-audit-uncommitted", |b| {
        b.iter(|| {
            let tx = network
                .ledger
                .begin(OrgId::new(MINE))
                .timestamp(Network::now())
                .transient("ownerID", b"kiln-a".to_vec())
                .build();
            let request = AuditRequest::new("NEXT", priors.clone(), 1_003);
            black_box(network.audit.audit_and_record_emissions(&tx, &request))
        })
    });
}

criterion_group!(
    benches,
    bench_outlier_gate,
    bench_shipment_commitment,
    bench_audit_round_trip
);
criterion_main!(benches);
