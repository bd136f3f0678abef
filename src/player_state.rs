//! Animation-facing player state derived from per-frame input.

use serde::Serialize;

/// How long the jump action stays active after takeoff, in seconds
pub const JUMP_ACTION_DURATION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementState {
    #[default]
    Idle,
    Walking,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    #[default]
    NoAction,
    Jumping,
}

/// Turns a held jump key into a single request per press.
#[derive(Debug, Clone, Copy, Default)]
pub struct JumpTrigger {
    held: bool,
}

impl JumpTrigger {
    /// Returns true only on the frame the key goes down.
    pub fn update(&mut self, pressed: bool) -> bool {
        let fired = pressed && !self.held;
        self.held = pressed;
        fired
    }
}

/// Tracks movement and action state for animation selection.
#[derive(Debug, Clone, Default)]
pub struct PlayerStateTracker {
    movement: MovementState,
    action: ActionState,
    time: f64,
    last_jump_time: Option<f64>,
}

impl PlayerStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn movement(&self) -> MovementState {
        self.movement
    }

    pub fn action(&self) -> ActionState {
        self.action
    }

    pub fn update(&mut self, dt: f32, has_input: bool, running: bool, jumped: bool) {
        self.time += f64::from(dt.max(0.0));

        self.movement = match (has_input, running) {
            (false, _) => MovementState::Idle,
            (true, false) => MovementState::Walking,
            (true, true) => MovementState::Running,
        };

        if jumped {
            self.action = ActionState::Jumping;
            self.last_jump_time = Some(self.time);
        } else if let Some(started) = self.last_jump_time {
            if self.time - started >= JUMP_ACTION_DURATION {
                self.action = ActionState::NoAction;
                self.last_jump_time = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_trigger_fires_once_per_press() {
        let mut trigger = JumpTrigger::default();
        assert!(!trigger.update(false));
        assert!(trigger.update(true));
        assert!(!trigger.update(true));
        assert!(!trigger.update(false));
        assert!(trigger.update(true));
    }

    #[test]
    fn test_movement_state_follows_input() {
        let mut tracker = PlayerStateTracker::new();
        assert_eq!(tracker.movement(), MovementState::Idle);

        tracker.update(0.016, true, false, false);
        assert_eq!(tracker.movement(), MovementState::Walking);
        tracker.update(0.016, true, true, false);
        assert_eq!(tracker.movement(), MovementState::Running);
        tracker.update(0.016, false, true, false);
        assert_eq!(tracker.movement(), MovementState::Idle);
    }

    #[test]
    fn test_jump_action_window() {
        let mut tracker = PlayerStateTracker::new();
        tracker.update(0.1, false, false, true);
        assert_eq!(tracker.action(), ActionState::Jumping);

        for _ in 0..7 {
            tracker.update(0.1, false, false, false);
        }
        assert_eq!(tracker.action(), ActionState::Jumping);

        tracker.update(0.15, false, false, false);
        assert_eq!(tracker.action(), ActionState::NoAction);
    }

    #[test]
    fn test_states_serialize_snake_case() {
        assert_eq!(serde_json::to_string(&MovementState::Running).unwrap(), "\"running\"");
        assert_eq!(serde_json::to_string(&ActionState::NoAction).unwrap(), "\"no_action\"");
    }
}
