use log::{debug, trace};
use rapier3d::prelude::*;

use super::constants::locomotion as consts;
use super::constants::world::{EPSILON, TIMESTEP};
use super::ground::{self, max_slope_angle, GroundState};
use super::player::PlayerBody;
use super::world::PhysicsWorld;

/// What the player asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementIntent {
    /// Desired direction; only X/Z are used unless flying
    pub direction: Vector<Real>,
    pub running: bool,
    pub jump: bool,
}

impl Default for MovementIntent {
    fn default() -> Self {
        Self {
            direction: Vector::zeros(),
            running: false,
            jump: false,
        }
    }
}

impl MovementIntent {
    pub fn walk(direction: Vector<Real>) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }
}

/// Redirects horizontal movement along the ground plane, keeping its magnitude.
pub fn project_onto_slope(movement: Vector<Real>, normal: Vector<Real>) -> Vector<Real> {
    let projected = movement - normal * movement.dot(&normal);
    let length = projected.norm();
    if length < EPSILON {
        return movement;
    }
    projected * (movement.norm() / length)
}

/// Moves `current` toward `target` by `rate * dt`, saturating at the target.
pub fn blend_velocity(current: Vector<Real>, target: Vector<Real>, rate: f32, dt: f32) -> Vector<Real> {
    current.lerp(&target, (rate * dt).clamp(0.0, 1.0))
}

/// Caps the X/Z speed at `max_speed`, leaving Y untouched.
pub fn clamp_horizontal_speed(velocity: Vector<Real>, max_speed: f32) -> Vector<Real> {
    let horizontal = (velocity.x * velocity.x + velocity.z * velocity.z).sqrt();
    if horizontal <= max_speed || horizontal < EPSILON {
        return velocity;
    }
    let scale = max_speed / horizontal;
    vector![velocity.x * scale, velocity.y, velocity.z * scale]
}

/// Straight up, or tilted toward the ground normal when standing on a slope.
pub fn jump_direction(ground: &GroundState) -> Vector<Real> {
    if ground.grounded && ground.slope_angle > consts::JUMP_TILT_MIN_SLOPE_DEGREES.to_radians() {
        let tilted = Vector::y() * (1.0 - consts::JUMP_TILT_WEIGHT) + ground.normal * consts::JUMP_TILT_WEIGHT;
        tilted.try_normalize(EPSILON).unwrap_or_else(Vector::y)
    } else {
        Vector::y()
    }
}

/// Turns movement intent into velocity changes on the player body and keeps
/// the ground state current.
#[derive(Debug, Clone)]
pub struct LocomotionController {
    fly_mode: bool,
    ground: GroundState,
    /// Frame time of the most recent update
    delta_time: f32,
    jump_cooldown: f32,
    /// Horizontal movement requested this frame, speed applied. Consumed by `update`.
    last_movement: Vector<Real>,
}

impl LocomotionController {
    pub fn new(fly_mode: bool) -> Self {
        Self {
            fly_mode,
            ground: GroundState::default(),
            delta_time: TIMESTEP,
            jump_cooldown: 0.0,
            last_movement: Vector::zeros(),
        }
    }

    /// Forgets ground contact and timers, e.g. after the player body is replaced.
    pub fn reset(&mut self) {
        *self = Self::new(self.fly_mode);
    }

    pub fn fly_mode(&self) -> bool {
        self.fly_mode
    }

    pub fn ground_state(&self) -> &GroundState {
        &self.ground
    }

    pub fn is_grounded(&self) -> bool {
        self.ground.grounded
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn jump_cooldown(&self) -> f32 {
        self.jump_cooldown
    }

    /// Grounded, or airborne for no longer than the coyote window, and off cooldown.
    pub fn can_jump(&self) -> bool {
        !self.fly_mode
            && self.jump_cooldown <= 0.0
            && (self.ground.grounded || self.ground.time_since_grounded <= consts::COYOTE_TIME)
    }

    pub fn move_player(
        &mut self,
        world: &mut PhysicsWorld,
        player: &PlayerBody,
        direction: Vector<Real>,
        running: bool,
    ) {
        let config = player.config();
        let speed = if running { config.run_speed } else { config.move_speed };
        let velocity = player.velocity(world);
        let dt = self.delta_time;

        if self.fly_mode {
            let fly_velocity = direction * (speed + consts::FLY_SPEED_BONUS);
            self.last_movement = fly_velocity;
            player.set_velocity(world, fly_velocity);
            return;
        }

        let movement = vector![direction.x, 0.0, direction.z] * speed;
        self.last_movement = movement;
        let has_input = movement.norm() > EPSILON;
        let slope = self.ground.slope_angle;
        player.set_grip(world, !has_input);

        let new_velocity = if self.ground.climbing_step && has_input {
            // Keep pushing over the edge while the pop lifts the body
            vector![movement.x, velocity.y, movement.z]
        } else if self.ground.grounded {
            if has_input {
                let projected = if slope > consts::SLOPE_PROJECTION_MIN_DEGREES.to_radians() {
                    project_onto_slope(movement, self.ground.normal)
                } else {
                    movement
                };
                let mut target = vector![projected.x, velocity.y, projected.z];
                if slope > consts::UPHILL_BIAS_MIN_DEGREES.to_radians() {
                    target.y += slope.sin() * consts::UPHILL_BIAS;
                }
                let rate = if running {
                    consts::GROUND_LERP * consts::RUN_LERP_BOOST
                } else {
                    consts::GROUND_LERP
                };
                blend_velocity(velocity, target, rate, dt)
            } else {
                let damping = if slope > consts::STEEP_SLOPE_DEGREES.to_radians() {
                    config.ground_damping * consts::STEEP_DAMPING_SCALE
                } else {
                    config.ground_damping
                };
                vector![velocity.x * damping, velocity.y, velocity.z * damping]
            }
        } else if has_input {
            let target = velocity + movement * config.air_control;
            let rate = if running {
                consts::AIR_LERP * consts::RUN_LERP_BOOST
            } else {
                consts::AIR_LERP
            };
            let blended = blend_velocity(velocity, target, rate, dt);
            clamp_horizontal_speed(blended, speed * consts::AIR_SPEED_CAP_FACTOR)
        } else {
            // Airborne without input keeps its momentum
            return;
        };

        player.set_velocity(world, new_velocity);
    }

    /// Applies a jump impulse if allowed. Returns whether a jump happened.
    pub fn jump_player(&mut self, world: &mut PhysicsWorld, player: &PlayerBody) -> bool {
        if !self.can_jump() {
            return false;
        }

        let direction = jump_direction(&self.ground);
        let mut force = player.config().jump_force;
        if !self.ground.grounded {
            force *= consts::COYOTE_JUMP_FACTOR;
        }
        player.apply_impulse(world, direction * force);
        debug!(
            "Jump: impulse {:.1} along {:?} (grounded={}, airborne for {:.3}s)",
            force, direction, self.ground.grounded, self.ground.time_since_grounded
        );

        // Close the coyote window so the same takeoff can't be reused
        self.ground.grounded = false;
        self.ground.time_since_grounded = consts::COYOTE_TIME + self.delta_time;
        self.jump_cooldown = consts::JUMP_COOLDOWN;
        true
    }

    /// Advances the world by `dt`, then refreshes ground state and applies
    /// step climbing, slope holding and velocity limits to the player.
    pub fn update(&mut self, world: &mut PhysicsWorld, player: Option<&PlayerBody>, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if dt > 0.0 {
            self.delta_time = dt;
        }
        self.jump_cooldown = (self.jump_cooldown - dt).max(0.0);

        world.step(dt);

        let Some(player) = player else {
            return;
        };

        let sample = ground::classify(world, player);
        self.ground.apply(sample, dt);
        trace!(
            "Ground: grounded={} slope={:.1}deg contact={}",
            self.ground.grounded,
            self.ground.slope_degrees(),
            sample.contact
        );

        if !self.fly_mode {
            self.handle_step_climbing(world, player);
            self.hold_on_slope(world, player);
            self.apply_velocity_limits(world, player);
        }

        // Intent lasts one frame
        self.last_movement = Vector::zeros();
        player.set_grip(world, true);
    }

    fn handle_step_climbing(&mut self, world: &mut PhysicsWorld, player: &PlayerBody) {
        let velocity = player.velocity(world);

        if self.ground.climbing_step {
            if self.ground.grounded && velocity.y <= consts::STEP_MAX_RISE_SPEED {
                self.ground.climbing_step = false;
            } else {
                return;
            }
        }

        if !self.ground.grounded || velocity.y > consts::STEP_MAX_RISE_SPEED {
            return;
        }
        let horizontal = vector![self.last_movement.x, 0.0, self.last_movement.z];
        let Some(forward) = horizontal.try_normalize(EPSILON) else {
            return;
        };

        let Some(height) = self.probe_step(world, player, forward) else {
            return;
        };

        // Launch fast enough for the apex to clear the step top
        let rise = height + consts::STEP_POP_CLEARANCE;
        let impulse = player.mass() * (2.0 * world.gravity.norm() * rise).sqrt();
        player.apply_impulse(world, vector![0.0, impulse, 0.0]);
        self.ground.climbing_step = true;
        debug!("Step climb: {:.3}m obstacle, impulse {:.1}", height, impulse);
    }

    /// Height of a climbable step directly ahead of the feet, if any.
    fn probe_step(&self, world: &PhysicsWorld, player: &PlayerBody, forward: Vector<Real>) -> Option<f32> {
        let position = player.position(world);
        let feet_y = position.y - player.foot_offset();
        let exclude = Some(player.handle());

        let from = point![position.x, feet_y + consts::MAX_STEP_HEIGHT * 0.5, position.z];
        let reach = player.probe_radius() + consts::STEP_PROBE_DISTANCE;
        let riser = world.cast_ray(from, from + forward * reach, exclude)?;

        // A walkable face ahead is a slope, not a step
        let riser_slope = riser.normal.dot(&Vector::y()).clamp(-1.0, 1.0).acos();
        if riser_slope <= max_slope_angle() {
            return None;
        }

        let over = riser.point + forward * consts::STEP_PROBE_INSET;
        let top_from = point![over.x, feet_y + consts::MAX_STEP_HEIGHT + consts::STEP_PROBE_CLEARANCE, over.z];
        let top_to = point![over.x, feet_y, over.z];
        let top = world.cast_ray(top_from, top_to, exclude)?;

        let top_slope = top.normal.dot(&Vector::y()).clamp(-1.0, 1.0).acos();
        if top_slope > max_slope_angle() {
            return None;
        }

        let height = top.point.y - feet_y;
        (height > consts::MIN_STEP_HEIGHT && height <= consts::MAX_STEP_HEIGHT).then_some(height)
    }

    /// Counters the downhill pull of gravity while the player stands still on a slope.
    fn hold_on_slope(&self, world: &mut PhysicsWorld, player: &PlayerBody) {
        let slope = self.ground.slope_angle;
        if !self.ground.grounded
            || self.last_movement.norm() > EPSILON
            || slope <= consts::ANTI_SLIDE_MIN_DEGREES.to_radians()
        {
            return;
        }

        let force = self.ground.normal * (slope.sin() * world.gravity.norm() * player.mass());
        player.add_force(world, force);
    }

    fn apply_velocity_limits(&self, world: &mut PhysicsWorld, player: &PlayerBody) {
        let mut velocity = player.velocity(world);
        velocity.y = velocity.y.max(-consts::MAX_FALL_SPEED);
        if !self.ground.grounded && !self.ground.climbing_step {
            velocity *= consts::AIR_DRAG;
        }
        player.set_velocity(world, velocity);
    }
}
