use rapier3d::prelude::*;

use super::constants::ground as consts;
use super::player::PlayerBody;
use super::world::PhysicsWorld;

/// Raw result of one multi-ray ground probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSample {
    /// At least one ray touched a collider
    pub contact: bool,
    /// Mean hit normal (world up when nothing was hit)
    pub normal: Vector<Real>,
    /// Angle between `normal` and world up, in radians
    pub slope_angle: f32,
    /// Contact exists and the slope is walkable
    pub walkable: bool,
}

impl GroundSample {
    pub fn airborne() -> Self {
        Self {
            contact: false,
            normal: Vector::y(),
            slope_angle: 0.0,
            walkable: false,
        }
    }
}

/// Ground contact state carried across frames by the locomotion controller.
///
/// `normal` and `slope_angle` describe the last surface touched; they are only
/// meaningful while `grounded` or within the coyote window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundState {
    pub grounded: bool,
    pub normal: Vector<Real>,
    pub slope_angle: f32,
    /// Seconds since the player was last grounded
    pub time_since_grounded: f32,
    pub climbing_step: bool,
}

impl Default for GroundState {
    fn default() -> Self {
        Self {
            grounded: false,
            normal: Vector::y(),
            slope_angle: 0.0,
            time_since_grounded: f32::INFINITY,
            climbing_step: false,
        }
    }
}

impl GroundState {
    /// Folds a new sample into the state after `dt` seconds.
    pub fn apply(&mut self, sample: GroundSample, dt: f32) {
        self.grounded = sample.walkable;
        self.normal = sample.normal;
        self.slope_angle = sample.slope_angle;
        if self.grounded {
            self.time_since_grounded = 0.0;
        } else {
            self.time_since_grounded += dt.max(0.0);
        }
    }

    pub fn slope_degrees(&self) -> f32 {
        self.slope_angle.to_degrees()
    }
}

/// Steepest walkable slope in radians.
pub fn max_slope_angle() -> f32 {
    consts::MAX_SLOPE_DEGREES.to_radians()
}

/// Averages hit normals and decides walkability.
pub fn classify_normals(normals: &[Vector<Real>]) -> GroundSample {
    if normals.is_empty() {
        return GroundSample::airborne();
    }

    let sum: Vector<Real> = normals.iter().sum();
    let mean = sum / normals.len() as f32;
    let normal = mean.try_normalize(1.0e-6).unwrap_or_else(Vector::y);
    let slope_angle = normal.dot(&Vector::y()).clamp(-1.0, 1.0).acos();

    GroundSample {
        contact: true,
        normal,
        slope_angle,
        walkable: slope_angle <= max_slope_angle(),
    }
}

/// Ray origins: the body center plus four points offset along ±X and ±Z.
pub fn probe_origins(center: Vector<Real>, probe_radius: f32) -> [Point<Real>; 5] {
    let d = probe_radius * consts::RAY_OFFSET_FACTOR;
    let c = Point::from(center);
    [
        c,
        c + vector![d, 0.0, 0.0],
        c + vector![-d, 0.0, 0.0],
        c + vector![0.0, 0.0, d],
        c + vector![0.0, 0.0, -d],
    ]
}

/// Casts five parallel rays straight down from the player and classifies the result.
pub fn classify(world: &PhysicsWorld, player: &PlayerBody) -> GroundSample {
    let center = player.position(world);
    let length = player.foot_offset() + consts::GROUND_CHECK_DISTANCE;

    let normals: Vec<Vector<Real>> = probe_origins(center, player.probe_radius())
        .iter()
        .filter_map(|&from| {
            let to = from - vector![0.0, length, 0.0];
            world.cast_ray(from, to, Some(player.handle()))
        })
        .map(|hit| hit.normal)
        .collect();

    classify_normals(&normals)
}
