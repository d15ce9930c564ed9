// tests/physics_world.rs
use approx::assert_relative_eq;
use glam::DVec2;
use kinscene::{Ball, Segment, World, WorldBounds, segments_intersect};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DT: f64 = 0.1;

fn setup() -> World {
    World::new(DT, WorldBounds::default())
}

fn momentum(world: &World) -> DVec2 {
    world.bodies().iter().map(|b| b.mass * b.vel()).sum()
}

#[test]
fn test_head_on_equal_masses_swap_velocities() {
    let mut world = setup();
    // Centers 0.9 apart, radii 0.5 each: overlapping from the start.
    let a = world.add(Ball::new(DT, 0.5, 2.0, DVec2::new(-0.45, 0.0)).with_velocity(DVec2::X));
    let b = world.add(Ball::new(DT, 0.5, 2.0, DVec2::new(0.45, 0.0)).with_velocity(-DVec2::X));
    let before = momentum(&world);

    world.step();

    assert_eq!(world.collisions().len(), 1);
    let event = world.collisions()[0];
    assert_eq!(event.bodies, (a, b));
    assert_eq!(event.time, 0.0, "Recorded before the clock advances");
    assert_relative_eq!(event.contact.x, 0.05, epsilon = 1e-12);
    assert_relative_eq!(event.contact.y, 0.0);

    let (ba, bb) = (world.body(a).unwrap(), world.body(b).unwrap());
    assert_relative_eq!(ba.vel().x, -1.0, epsilon = 1e-9);
    assert_relative_eq!(bb.vel().x, 1.0, epsilon = 1e-9);
    assert_relative_eq!(ba.pos().x, -0.55, epsilon = 1e-12);
    assert_relative_eq!(bb.pos().x, 0.55, epsilon = 1e-12);

    let after = momentum(&world);
    assert_relative_eq!(after.x, before.x, epsilon = 1e-9);

    // Now 1.1 apart and separating: no further contact.
    world.step();
    assert_eq!(world.collisions().len(), 1);
    assert_relative_eq!(world.time(), 2.0 * DT, epsilon = 1e-12);
}

#[test]
fn test_unequal_masses_conserve_momentum_and_energy() {
    let mut world = setup();
    world.add(Ball::new(DT, 0.5, 1.0, DVec2::new(-0.45, 0.0)).with_velocity(DVec2::new(2.0, 0.0)));
    world.add(Ball::new(DT, 0.5, 3.0, DVec2::new(0.45, 0.0)));
    let energy = |w: &World| -> f64 {
        w.bodies()
            .iter()
            .map(|b| 0.5 * b.mass * b.vel().length_squared())
            .sum()
    };
    let (p0, e0) = (momentum(&world), energy(&world));

    world.step();

    // 1D elastic collision: (2, 0) -> (-1, 1).
    assert_relative_eq!(world.bodies()[0].vel().x, -1.0, epsilon = 1e-9);
    assert_relative_eq!(world.bodies()[1].vel().x, 1.0, epsilon = 1e-9);
    assert_relative_eq!(momentum(&world).x, p0.x, epsilon = 1e-9);
    assert_relative_eq!(energy(&world), e0, epsilon = 1e-9);
}

#[test]
fn test_free_body_coasts_and_friction_damps() {
    let mut world = setup();
    let free = world.add(Ball::new(DT, 0.1, 1.0, DVec2::ZERO).with_velocity(DVec2::X));
    let damped = world.add(
        Ball::new(DT, 0.1, 1.0, DVec2::new(0.0, 5.0))
            .with_velocity(DVec2::X)
            .with_friction(2.0),
    );

    world.step();

    assert_relative_eq!(world.body(free).unwrap().vel().x, 1.0, epsilon = 1e-9);
    // Coefficient 2 over a 0.1 step removes a fifth of the velocity.
    assert_relative_eq!(world.body(damped).unwrap().friction(), 0.2, epsilon = 1e-12);
    assert_relative_eq!(world.body(damped).unwrap().vel().x, 0.8, epsilon = 1e-9);
    assert!(world.collisions().is_empty());
}

#[test]
fn test_body_freezes_at_boundary() {
    let bounds = WorldBounds::new((-1.0, 1.0), (-1.0, 1.0));
    let mut world = World::new(DT, bounds);
    let id = world.add(Ball::new(DT, 0.05, 1.0, DVec2::new(0.9, 0.0)).with_velocity(DVec2::X));

    for _ in 0..3 {
        world.step();
    }

    let ball = world.body(id).unwrap();
    assert!(ball.is_static());
    assert_eq!(ball.pos(), DVec2::new(1.0, 0.0));
    assert_eq!(ball.vel(), DVec2::ZERO);

    world.step();
    let ball = world.body(id).unwrap();
    assert_eq!(ball.pos(), DVec2::new(1.0, 0.0), "Frozen bodies stay put");
}

#[test]
fn test_static_bodies_never_collide() {
    let mut world = setup();
    world.add(Ball::new(DT, 1.0, 1.0, DVec2::ZERO).with_static(true));
    world.add(Ball::new(DT, 1.0, 1.0, DVec2::new(0.5, 0.0)).with_static(true));

    world.step();

    assert!(world.collisions().is_empty());
    assert!(world.bodies().iter().all(|b| b.positions().len() == 2));
}

#[test]
fn test_kinematic_body_pushes_ball() {
    let mut world = setup();
    let tip = world.add(Ball::new(DT, 0.5, 1.0, DVec2::ZERO).with_static(true).named("tip"));
    let ball = world.add(Ball::new(DT, 0.5, 1.0, DVec2::new(0.9, 0.0)).named("ball"));

    // The tip moves 0.2 to the right, ending 0.7 from the ball.
    world.move_body(tip, DVec2::new(0.2, 0.0));
    world.step();

    assert_eq!(world.collisions().len(), 1);
    let tip_body = world.body(tip).unwrap();
    assert_eq!(tip_body.pos(), DVec2::new(0.2, 0.0), "Static bodies are not moved");
    let pushed = world.body(ball).unwrap();
    assert_relative_eq!(pushed.vel().x, 2.0, epsilon = 1e-9);
    assert_relative_eq!(pushed.vel().y, 0.0, epsilon = 1e-12);
}

#[test]
fn test_passive_bodies_are_carried_along() {
    let mut world = setup();
    let moving = world.add(Ball::new(DT, 0.5, 1.0, DVec2::ZERO).with_velocity(DVec2::X));
    let ghost = world.add_passive(
        Ball::new(DT, 0.5, 1.0, DVec2::new(0.1, 0.0))
            .with_velocity(DVec2::X)
            .named("ghost"),
    );

    world.step();

    assert!(world.collisions().is_empty(), "Passive bodies never collide");
    assert_eq!(world.body(ghost).unwrap().positions().len(), 2, "Nor do they move");
    assert_relative_eq!(world.body(moving).unwrap().pos().x, 0.1, epsilon = 1e-12);

    let snapshot = world.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[1].name, "ghost");
    assert_eq!(snapshot[1].id, ghost);
    assert_eq!(snapshot[1].position, DVec2::new(0.1, 0.0));
    assert!(!snapshot[0].is_static);
}

#[test]
fn test_coincident_centers_exchange_nothing() {
    let mut world = setup();
    world.add(Ball::new(DT, 0.5, 1.0, DVec2::ZERO).with_velocity(DVec2::X));
    world.add(Ball::new(DT, 0.5, 1.0, DVec2::ZERO));

    world.step();

    assert_eq!(world.collisions().len(), 1);
    assert_relative_eq!(world.bodies()[0].vel().x, 1.0, epsilon = 1e-9);
    assert_relative_eq!(world.bodies()[1].vel().x, 0.0);
}

#[test]
fn test_mass_from_density() {
    let disc = Ball::from_density(DT, 1.0, 2.0, DVec2::ZERO);
    assert_relative_eq!(disc.mass, 2.0 * std::f64::consts::PI, max_relative = 1e-5);
    // Single precision, widened without further rounding.
    assert_eq!(disc.mass, f64::from(2.0 * std::f32::consts::PI));
}

#[test]
fn test_segment_intersection_is_symmetric() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut point = || DVec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
    let mut hits = 0;

    for _ in 0..500 {
        let s1 = Segment::new(point(), point());
        let s2 = Segment::new(point(), point());
        let forward = segments_intersect(&s1, &s2);
        assert_eq!(forward, segments_intersect(&s2, &s1), "{s1:?} vs {s2:?}");
        hits += usize::from(forward);
    }
    assert!(hits > 0 && hits < 500, "Sample covers both outcomes");
}
