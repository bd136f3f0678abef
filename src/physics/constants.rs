//! Physics and locomotion tuning constants.
//! Centralizing these prevents bugs from duplicated hardcoded values.

/// Rigid-body world constants
pub mod world {
    /// Gravity magnitude in m/s² (applied along -Y unless flying)
    pub const GRAVITY: f32 = 9.81;

    /// Number of solver substeps per `step` call, independent of frame time
    pub const SUBSTEPS: usize = 10;

    /// Frame time used before the first update (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Longest frame time a single step may simulate
    pub const MAX_FRAME_DT: f32 = 0.25;

    /// Small epsilon for float comparisons
    pub const EPSILON: f32 = 0.001;
}

/// Ground classification constants
pub mod ground {
    /// Extra ray length below the capsule tip
    pub const GROUND_CHECK_DISTANCE: f32 = 0.1;

    /// Horizontal offset of the four outer rays, as a fraction of the capsule radius
    pub const RAY_OFFSET_FACTOR: f32 = 0.7;

    /// Steepest walkable slope in degrees
    pub const MAX_SLOPE_DEGREES: f32 = 45.0;
}

/// Locomotion controller constants
pub mod locomotion {
    /// Grace period after leaving the ground during which a jump is still honored
    pub const COYOTE_TIME: f32 = 0.1;

    /// Jump impulse scale when fired inside the coyote window
    pub const COYOTE_JUMP_FACTOR: f32 = 0.8;

    /// Minimum delay between two jumps
    pub const JUMP_COOLDOWN: f32 = 0.2;

    /// Slope (degrees) above which the jump direction tilts along the ground normal
    pub const JUMP_TILT_MIN_SLOPE_DEGREES: f32 = 10.0;

    /// Weight of the ground normal in the tilted jump direction
    pub const JUMP_TILT_WEIGHT: f32 = 0.3;

    /// Flat speed bonus while flying
    pub const FLY_SPEED_BONUS: f32 = 5.0;

    /// Velocity smoothing rate while grounded (1/s)
    pub const GROUND_LERP: f32 = 10.0;

    /// Velocity smoothing rate while airborne (1/s)
    pub const AIR_LERP: f32 = 2.0;

    /// Smoothing rate multiplier while running
    pub const RUN_LERP_BOOST: f32 = 1.5;

    /// Slope (degrees) above which movement is projected onto the ground plane
    pub const SLOPE_PROJECTION_MIN_DEGREES: f32 = 1.0;

    /// Slope (degrees) above which moving adds an upward velocity bias
    pub const UPHILL_BIAS_MIN_DEGREES: f32 = 10.0;

    /// Upward velocity bias at a vertical slope (scaled by sin of the slope)
    pub const UPHILL_BIAS: f32 = 0.5;

    /// Slope (degrees) above which idle damping is strengthened
    pub const STEEP_SLOPE_DEGREES: f32 = 20.0;

    /// Extra damping multiplier on steep slopes
    pub const STEEP_DAMPING_SCALE: f32 = 0.5;

    /// Slope (degrees) above which an idle player receives an anti-slide force
    pub const ANTI_SLIDE_MIN_DEGREES: f32 = 5.0;

    /// Horizontal speed cap while airborne, relative to base speed
    pub const AIR_SPEED_CAP_FACTOR: f32 = 1.2;

    /// Tallest obstacle climbed automatically
    pub const MAX_STEP_HEIGHT: f32 = 0.3;

    /// Obstacles lower than this are left to the collision solver
    pub const MIN_STEP_HEIGHT: f32 = 0.02;

    /// Forward probe reach beyond the capsule radius
    pub const STEP_PROBE_DISTANCE: f32 = 0.15;

    /// How far past the riser the top-of-step probe looks down
    pub const STEP_PROBE_INSET: f32 = 0.05;

    /// Clearance above the max step height where the top-of-step probe starts
    pub const STEP_PROBE_CLEARANCE: f32 = 0.05;

    /// Rise above the step top that a step-climb impulse aims for
    pub const STEP_POP_CLEARANCE: f32 = 0.1;

    /// Step climbing is skipped while rising faster than this
    pub const STEP_MAX_RISE_SPEED: f32 = 0.1;

    /// Maximum downward speed
    pub const MAX_FALL_SPEED: f32 = 20.0;

    /// Per-frame velocity multiplier while airborne
    pub const AIR_DRAG: f32 = 0.98;
}
