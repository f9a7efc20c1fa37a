use criterion::{criterion_group, criterion_main, Criterion, black_box};

use umbra::core::types::{Mat4, Vec3};
use umbra::math::Frustum;
use umbra::{intersect_ray_objects, GameObject, IntersectMode, ObjectId, ObjectKind, VisibilitySolver, World};

/// Grid of rocks and creatures around the default world's center
fn populated_world(side: usize) -> (World, Vec<ObjectId>) {
    let mut world = World::default();
    let mut creatures = Vec::new();
    for i in 0..side {
        for j in 0..side {
            let p = Vec3::new(1500.0 + i as f32 * 12.5, 0.0, 1500.0 + j as f32 * 12.5);
            let kind = if (i + j) % 4 == 0 { ObjectKind::Creature } else { ObjectKind::Static };
            let id = world.add_object(GameObject::new(format!("o{i}_{j}"), kind, p, 1.5)).unwrap();
            if kind == ObjectKind::Creature {
                creatures.push(id);
            }
        }
    }
    (world, creatures)
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("insert_1024", |b| {
        b.iter(|| populated_world(black_box(32)));
    });
}

fn bench_update(c: &mut Criterion) {
    let (mut world, creatures) = populated_world(32);
    let mut step = 0.0f32;

    c.bench_function("update_creatures", |b| {
        b.iter(|| {
            step += 0.25;
            for id in &creatures {
                let p = world.object(*id).unwrap().position;
                world.set_position(*id, p + Vec3::new(step.sin(), 0.0, step.cos())).unwrap();
            }
        });
    });
}

fn bench_ray(c: &mut Criterion) {
    let (world, _) = populated_world(32);
    let origin = Vec3::new(1400.0, 0.5, 1400.0);

    c.bench_function("ray_diagonal", |b| {
        b.iter(|| {
            intersect_ray_objects(
                &world,
                black_box(origin),
                black_box(Vec3::new(1.0, 0.0, 0.9)),
                1000.0,
                IntersectMode::Collidable,
            )
        });
    });
}

fn bench_visibility(c: &mut Criterion) {
    let (world, _) = populated_world(32);
    let solver = VisibilitySolver::for_world(&world);
    let eye = Vec3::new(1450.0, 20.0, 1450.0);
    let proj = Mat4::perspective_rh_gl(60f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0);
    let view = Mat4::look_at_rh(eye, Vec3::new(1700.0, 0.0, 1700.0), Vec3::Y);
    let frustum = Frustum::from_view_projection(&(proj * view), eye);

    c.bench_function("visible_objects", |b| {
        b.iter(|| solver.get_visible_objects(&world, black_box(&frustum)));
    });
    c.bench_function("visible_entries", |b| {
        b.iter(|| solver.get_visible_entries(&world, black_box(&frustum)));
    });
}

criterion_group!(benches, bench_insert, bench_update, bench_ray, bench_visibility);
criterion_main!(benches);
