//! End-to-end locomotion behavior through the public `PhysicsManager` API.
//!
//! Run with: cargo test --test locomotion_test -- --nocapture

use approx::assert_relative_eq;
use rapier3d::prelude::*;

use village_sim::config::{BackgroundTerrainConfig, PlayerConfig};
use village_sim::physics::ground;
use village_sim::physics::player::PlayerBody;
use village_sim::physics::statics::StaticColliderRegistry;
use village_sim::physics::world::PhysicsWorld;
use village_sim::{MovementIntent, PhysicsManager};

const DT: f32 = 1.0 / 60.0;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn player_at(x: f32, y: f32, z: f32) -> PlayerConfig {
    PlayerConfig {
        start_position: [x, y, z],
        ..PlayerConfig::default()
    }
}

/// Flat fallback terrain at y = 0 with a capsule player dropped from `y`.
fn manager(fly_mode: bool, y: f32) -> PhysicsManager {
    manager_with(fly_mode, player_at(0.0, y, 0.0))
}

fn manager_with(fly_mode: bool, player: PlayerConfig) -> PhysicsManager {
    let mut manager = PhysicsManager::new();
    manager
        .initialize(fly_mode, player, BackgroundTerrainConfig::default())
        .expect("initialize");
    manager.add_capsule_player().expect("player");
    manager
}

/// Box ramp tilted `degrees` about Z (uphill toward +X) centered at height `lift`,
/// with the capsule placed just above its surface at `x`.
fn manager_on_ramp(degrees: f32, lift: f32, x: f32) -> PhysicsManager {
    let angle = degrees.to_radians();
    let surface_y = lift + 0.5 / angle.cos() + x * angle.tan();
    // Lower hemisphere touches the plane; the capsule segment adds 0.5 above it
    let center_y = surface_y + 0.15 / angle.cos() + 0.5;

    let mut manager = manager_with(false, player_at(x, center_y + 0.02, 0.0));
    manager.add_static_box_rotated(
        vector![0.0, lift, 0.0],
        vector![20.0, 1.0, 20.0],
        Rotation::from_axis_angle(&Vector::z_axis(), angle),
    );
    manager
}

fn idle_frames(manager: &mut PhysicsManager, frames: usize) {
    let idle = MovementIntent::default();
    for _ in 0..frames {
        manager.frame(DT, &idle);
    }
}

fn run(manager: &mut PhysicsManager, frames: usize) {
    for _ in 0..frames {
        manager.update(DT);
    }
}

/// Ground classification on top of a box ramp tilted by `degrees` about Z.
fn classify_on_ramp(degrees: f32) -> ground::GroundSample {
    let mut world = PhysicsWorld::new(false);
    let mut statics = StaticColliderRegistry::new();
    let angle = degrees.to_radians();
    statics.add_static_box_rotated(
        &mut world,
        Vector::zeros(),
        vector![20.0, 1.0, 20.0],
        Rotation::from_axis_angle(&Vector::z_axis(), angle),
    );

    // Top face passes through y = 0.5 / cos(angle) above the ramp center
    let surface_y = 0.5 / angle.cos();
    let player = PlayerBody::capsule(&mut world, player_at(0.0, surface_y + 0.55, 0.0));
    ground::classify(&world, &player)
}

// ---------------------------------------------------------------------------
// Grounding
// ---------------------------------------------------------------------------

#[test]
fn test_player_comes_to_rest_on_flat_ground() {
    let mut manager = manager(false, 3.0);
    run(&mut manager, 300);

    assert!(manager.is_player_grounded(), "Player should be grounded after falling");
    let rest_y = manager.player_position().y;
    assert!(
        (rest_y - 0.65).abs() < 0.05,
        "Capsule center should rest at half height, got {:.4}",
        rest_y
    );

    run(&mut manager, 120);
    let later_y = manager.player_position().y;
    assert!(
        (later_y - rest_y).abs() < 0.01,
        "Resting player drifted from {:.4} to {:.4}",
        rest_y,
        later_y
    );
    assert!(manager.is_player_grounded());
    assert!(manager.ground_slope_degrees() < 1.0);
}

#[test]
fn test_slope_classification() {
    let gentle = classify_on_ramp(30.0);
    assert!(gentle.contact);
    assert!(gentle.walkable, "30 degree ramp should be walkable");
    assert_relative_eq!(gentle.slope_angle.to_degrees(), 30.0, epsilon = 0.5);

    let cliff = classify_on_ramp(60.0);
    assert!(cliff.contact, "Rays should still hit the 60 degree ramp");
    assert!(!cliff.walkable, "60 degree ramp must not be walkable");
    assert_relative_eq!(cliff.slope_angle.to_degrees(), 60.0, epsilon = 0.5);
}

// ---------------------------------------------------------------------------
// Jumping
// ---------------------------------------------------------------------------

#[test]
fn test_jump_impulse_from_ground() {
    let mut manager = manager(false, 0.7);
    run(&mut manager, 120);
    assert!(manager.can_jump());

    let before = manager.player_velocity().y;
    assert!(manager.jump_player());
    let gained = manager.player_velocity().y - before;
    // jump_force / mass = 350 / 100
    assert_relative_eq!(gained, 3.5, epsilon = 1e-3);
    assert!(!manager.can_jump(), "A second jump must not be available immediately");
    assert!(!manager.jump_player());

    // Lands again and recovers the jump
    run(&mut manager, 180);
    assert!(manager.is_player_grounded());
    assert!(manager.can_jump());
}

#[test]
fn test_coyote_jump_within_window() {
    let mut manager = manager(false, 0.7);
    run(&mut manager, 120);
    assert!(manager.is_player_grounded());

    // Leave the ground without jumping
    manager.set_player_position(vector![0.0, 5.0, 0.0]);
    manager.update(DT);
    assert!(!manager.is_player_grounded());
    assert!(manager.can_jump(), "Jump should be allowed inside the coyote window");

    let before = manager.player_velocity().y;
    assert!(manager.jump_player());
    let gained = manager.player_velocity().y - before;
    assert!(gained > 0.0);
    // Reduced impulse: 0.8 * 350 / 100
    assert_relative_eq!(gained, 2.8, epsilon = 1e-3);
}

#[test]
fn test_coyote_window_expires() {
    let mut manager = manager(false, 0.7);
    run(&mut manager, 120);

    manager.set_player_position(vector![0.0, 20.0, 0.0]);
    run(&mut manager, 12);
    assert!(!manager.is_player_grounded());
    assert!(!manager.can_jump());

    let before = manager.player_velocity();
    assert!(!manager.jump_player());
    assert_eq!(manager.player_velocity(), before, "Expired coyote jump must not change velocity");
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

#[test]
fn test_fly_mode_ignores_gravity() {
    let mut manager = manager(true, 5.0);
    let idle = MovementIntent::default();
    for _ in 0..120 {
        manager.frame(DT, &idle);
        assert_eq!(manager.player_velocity(), Vector::zeros());
    }
    assert_relative_eq!(manager.player_position().y, 5.0, epsilon = 1e-5);
    assert_eq!(manager.num_rigid_bodies(), 2);
}

#[test]
fn test_fly_mode_moves_vertically() {
    let mut manager = manager(true, 5.0);
    manager.frame(DT, &MovementIntent::walk(vector![0.0, 1.0, 0.0]));
    assert!(manager.player_position().y > 5.0);
    assert_relative_eq!(manager.player_velocity().y, 2.3 + 5.0, epsilon = 1e-4);
}

#[test]
fn test_teleport_round_trip() {
    let mut manager = manager(false, 3.0);
    run(&mut manager, 30);

    let target = vector![12.5, 4.0, -7.25];
    manager.set_player_position(target);
    assert_relative_eq!(manager.player_position(), target, epsilon = 1e-6);
    assert_eq!(manager.player_velocity(), Vector::zeros());
}

#[test]
fn test_walking_and_jump_through_frame() {
    let mut manager = manager(false, 0.7);
    run(&mut manager, 60);
    let start_z = manager.player_position().z;

    let walk = MovementIntent::walk(vector![0.0, 0.0, 1.0]);
    for _ in 0..60 {
        manager.frame(DT, &walk);
    }
    assert!(manager.player_position().z > start_z + 0.2, "Player should walk forward");

    let jump = MovementIntent {
        jump: true,
        ..walk
    };
    assert!(manager.frame(DT, &jump));
    assert!(manager.player_velocity().y > 1.0);
    assert_eq!(
        manager.action_state(),
        village_sim::player_state::ActionState::Jumping
    );
}

#[test]
fn test_step_ahead_triggers_climb_impulse() {
    let mut manager = manager(false, 0.7);
    // 0.2 tall step whose near face is 0.1 in front of the capsule
    manager.add_static_box(vector![0.0, 0.1, 1.25], vector![4.0, 0.2, 2.0]);
    run(&mut manager, 60);
    assert!(manager.is_player_grounded());

    manager.move_player(vector![0.0, 0.0, 1.0], false);
    manager.update(DT);

    assert!(manager.ground_state().climbing_step);
    assert!(manager.player_velocity().y > 1.0, "Expected an upward pop onto the step");
}

#[test]
fn test_walks_up_onto_step() {
    let mut manager = manager(false, 0.7);
    // 0.2 tall step starting at z = 0.75
    manager.add_static_box(vector![0.0, 0.1, 10.75], vector![4.0, 0.2, 20.0]);
    run(&mut manager, 60);

    let walk = MovementIntent::walk(vector![0.0, 0.0, 1.0]);
    for _ in 0..120 {
        manager.frame(DT, &walk);
    }

    let position = manager.player_position();
    assert!(position.z > 1.0, "Player should be past the riser, z={:.3}", position.z);
    assert!(
        (position.y - 0.85).abs() < 0.05,
        "Player should stand on the step top (y~0.85), got {:.3}",
        position.y
    );
    assert!(manager.is_player_grounded());
    assert!(!manager.ground_state().climbing_step);
}

#[test]
fn test_idle_player_holds_on_walkable_ramp() {
    let mut manager = manager_on_ramp(30.0, 0.0, 0.0);
    idle_frames(&mut manager, 60);
    assert!(manager.is_player_grounded());
    assert_relative_eq!(manager.ground_slope_degrees(), 30.0, epsilon = 1.0);

    let rest = manager.player_position();
    idle_frames(&mut manager, 180);
    let drift = (manager.player_position() - rest).norm();
    assert!(drift < 0.02, "Idle player slid {:.4} down the ramp", drift);
    assert!(manager.is_player_grounded());
}

#[test]
fn test_walks_uphill_near_move_speed() {
    let mut manager = manager_on_ramp(25.0, 5.0, -4.0);
    idle_frames(&mut manager, 30);
    assert!(manager.is_player_grounded());

    let uphill = MovementIntent::walk(vector![1.0, 0.0, 0.0]);
    for _ in 0..60 {
        manager.frame(DT, &uphill);
    }
    let mid = manager.player_position();
    for _ in 0..30 {
        manager.frame(DT, &uphill);
    }
    let end = manager.player_position();

    let path_speed = (end - mid).norm() / (30.0 * DT);
    assert!(
        path_speed > 1.5,
        "Uphill path speed {:.3} too far below move_speed 2.3",
        path_speed
    );
    assert!(end.y > mid.y, "Player should gain height walking uphill");
    assert!(manager.is_player_grounded());
}

#[test]
fn test_grounded_walk_reaches_move_speed() {
    let mut manager = manager(false, 0.7);
    run(&mut manager, 60);

    let walk = MovementIntent::walk(vector![1.0, 0.0, 0.0]);
    for _ in 0..90 {
        manager.frame(DT, &walk);
    }
    let speed = manager.player_velocity().x;
    assert!((speed - 2.3).abs() < 0.23, "Walk speed {:.3} should be within 10% of 2.3", speed);

    let run_intent = MovementIntent {
        running: true,
        ..walk
    };
    for _ in 0..90 {
        manager.frame(DT, &run_intent);
    }
    let speed = manager.player_velocity().x;
    assert!((speed - 3.5).abs() < 0.35, "Run speed {:.3} should be within 10% of 3.5", speed);
}

#[test]
fn test_wall_ahead_is_not_a_step() {
    let mut manager = manager(false, 0.7);
    manager.add_static_box(vector![0.0, 1.0, 1.25], vector![4.0, 2.0, 2.0]);
    run(&mut manager, 60);

    manager.move_player(vector![0.0, 0.0, 1.0], false);
    manager.update(DT);

    assert!(!manager.ground_state().climbing_step);
    assert!(manager.player_velocity().y < 0.5);
}
