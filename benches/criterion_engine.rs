#![cfg(feature = "criterion-bench")]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rs_rbac::{Engine, Permission, Role, Snapshot, User, UserId};
use std::hint::black_box;
use std::time::Duration;

fn setup_flat_snapshot() -> (Snapshot, UserId) {
    let user = User::new("bench_user", "bench_user");
    let role = Role::new("reader");
    let permission = Permission::new("GET", "/jobs").unwrap();
    let snapshot = Snapshot::builder()
        .assign_role(&user.id, &role.id)
        .grant(&role.id, &permission.id)
        .user(user.clone())
        .role(role)
        .permission(permission)
        .build()
        .unwrap();
    (snapshot, user.id)
}

fn setup_wide_snapshot(grant_count: usize) -> (Snapshot, UserId) {
    let user = User::new("wide_user", "wide_user");
    let role = Role::new("wide");
    let mut builder = Snapshot::builder().assign_role(&user.id, &role.id);

    for i in 0..grant_count {
        let permission = Permission::new("GET", format!("/resource/{i}")).unwrap();
        builder = builder.grant(&role.id, &permission.id).permission(permission);
    }

    let snapshot = builder.user(user.clone()).role(role).build().unwrap();
    (snapshot, user.id)
}

fn bench_flat(c: &mut Criterion) {
    let (snapshot, subject) = setup_flat_snapshot();
    let engine = Engine::new(snapshot);

    let mut group = c.benchmark_group("engine_flat");
    group.throughput(Throughput::Elements(1));
    group.bench_function("has_permission_allow", |b| {
        b.iter(|| black_box(engine.has_permission(&subject, "GET", "/jobs")))
    });
    group.bench_function("has_permission_deny", |b| {
        b.iter(|| black_box(engine.has_permission(&subject, "DELETE", "/jobs")))
    });
    group.finish();
}

fn bench_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_wide");
    group.measurement_time(Duration::from_secs(5));

    for grant_count in [16_usize, 256, 4096] {
        let (snapshot, subject) = setup_wide_snapshot(grant_count);
        let engine = Engine::new(snapshot);
        let last = format!("/resource/{}", grant_count - 1);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("has_permission_last_grant", grant_count),
            &grant_count,
            |b, _| b.iter(|| black_box(engine.has_permission(&subject, "GET", &last))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_flat, bench_wide);
criterion_main!(benches);
