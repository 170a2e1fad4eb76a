use std::collections::HashSet;

use bitflags::bitflags;
use winit::keyboard::KeyCode;

use crate::scene::{FrameState, MoveDirection, PolygonMode};
use crate::settings::ControlSettings;

bitflags! {
    /// Continuous-motion keys held during a frame.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MotionKeys: u8 {
        const FORWARD = 1 << 0;
        const BACKWARD = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const YAW_LEFT = 1 << 4;
        const YAW_RIGHT = 1 << 5;
    }
}

const MOVE_BINDINGS: [(KeyCode, MotionKeys); 6] = [
    (KeyCode::KeyW, MotionKeys::FORWARD),
    (KeyCode::KeyS, MotionKeys::BACKWARD),
    (KeyCode::KeyA, MotionKeys::LEFT),
    (KeyCode::KeyD, MotionKeys::RIGHT),
    (KeyCode::KeyZ, MotionKeys::YAW_LEFT),
    (KeyCode::KeyC, MotionKeys::YAW_RIGHT),
];

const FOG_KEY: KeyCode = KeyCode::Digit1;
const POINT_LIGHT_KEY: KeyCode = KeyCode::Digit5;
const DAY_NIGHT_KEY: KeyCode = KeyCode::KeyN;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LatchState {
    #[default]
    Idle,
    Armed,
}

/// Edge detector for toggle keys: arms on press and fires once on the
/// following release, however many frames the key stays down.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyLatch {
    state: LatchState,
}

impl KeyLatch {
    pub fn state(&self) -> LatchState {
        self.state
    }

    /// Feeds this frame's key state; returns `true` on the frame the toggle
    /// should fire.
    pub fn update(&mut self, pressed: bool) -> bool {
        match (self.state, pressed) {
            (LatchState::Idle, true) => {
                self.state = LatchState::Armed;
                false
            }
            (LatchState::Armed, false) => {
                self.state = LatchState::Idle;
                true
            }
            _ => false,
        }
    }
}

/// Raw input accumulated between redraws.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    /// Keys pressed since the last frame, kept even if already released.
    pressed: HashSet<KeyCode>,
    mouse_delta: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, code: KeyCode, pressed: bool) {
        if pressed {
            self.held.insert(code);
            self.pressed.insert(code);
        } else {
            self.held.remove(&code);
        }
    }

    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    /// Held now, or tapped since the last frame.
    pub fn went_down(&self, code: KeyCode) -> bool {
        self.held.contains(&code) || self.pressed.contains(&code)
    }

    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }

    pub fn motion_keys(&self) -> MotionKeys {
        MOVE_BINDINGS
            .iter()
            .filter(|(code, _)| self.is_held(*code))
            .fold(MotionKeys::empty(), |keys, (_, flag)| keys | *flag)
    }

    pub fn take_mouse_delta(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.mouse_delta)
    }

    /// Forgets held keys, e.g. when the window loses focus and releases
    /// would never arrive.
    pub fn clear(&mut self) {
        self.held.clear();
        self.pressed.clear();
        self.mouse_delta = (0.0, 0.0);
    }
}

/// Maps input to scene state once per frame.
#[derive(Debug)]
pub struct Controller {
    controls: ControlSettings,
    fog_latch: KeyLatch,
    point_light_latch: KeyLatch,
    day_night_latch: KeyLatch,
}

impl Controller {
    pub fn new(controls: ControlSettings) -> Self {
        Self {
            controls,
            fog_latch: KeyLatch::default(),
            point_light_latch: KeyLatch::default(),
            day_night_latch: KeyLatch::default(),
        }
    }

    pub fn apply(&mut self, input: &mut InputState, state: &mut FrameState) {
        if input.is_held(KeyCode::Escape) {
            state.request_close();
        }

        self.apply_motion(input.motion_keys(), state);

        let (dx, dy) = input.take_mouse_delta();
        if dx != 0.0 || dy != 0.0 {
            let sensitivity = self.controls.mouse_sensitivity;
            state
                .camera
                .look(dx as f32 * sensitivity, dy as f32 * sensitivity);
        }

        if input.is_held(KeyCode::Digit2) {
            state.polygon_mode = PolygonMode::Line;
        }
        if input.is_held(KeyCode::Digit3) {
            state.polygon_mode = PolygonMode::Point;
        }
        if input.is_held(KeyCode::Digit4) {
            state.polygon_mode = PolygonMode::Fill;
        }

        if self.fog_latch.update(input.went_down(FOG_KEY)) {
            let density = state.fog.cycle();
            log::info!("Fog density set to {:.3}", density);
        }

        if self.point_light_latch.update(input.went_down(POINT_LIGHT_KEY)) {
            state.lamp.toggle();
            log::info!(
                "Point light {}",
                if state.lamp.enabled { "on" } else { "off" }
            );
        }

        if self.day_night_latch.update(input.went_down(DAY_NIGHT_KEY)) {
            state.day_night = state.day_night.toggled();
            log::info!("Switched to {:?}", state.day_night);
        }

        input.end_frame();
    }

    /// Disarms every toggle. A key that was down when focus left never
    /// reports its release, so an armed latch must not fire later.
    pub fn reset_latches(&mut self) {
        self.fog_latch = KeyLatch::default();
        self.point_light_latch = KeyLatch::default();
        self.day_night_latch = KeyLatch::default();
    }

    fn apply_motion(&self, keys: MotionKeys, state: &mut FrameState) {
        let rotation = self.controls.rotation_speed;
        if keys.contains(MotionKeys::YAW_RIGHT) {
            state.camera.turn(rotation);
        }
        if keys.contains(MotionKeys::YAW_LEFT) {
            state.camera.turn(-rotation);
        }

        let speed = self.controls.camera_speed;
        let moves = [
            (MotionKeys::FORWARD, MoveDirection::Forward),
            (MotionKeys::BACKWARD, MoveDirection::Backward),
            (MotionKeys::LEFT, MoveDirection::Left),
            (MotionKeys::RIGHT, MoveDirection::Right),
        ];
        for (flag, direction) in moves {
            if keys.contains(flag) {
                state.camera.move_in(direction, speed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::DayNight;
    use crate::settings::Settings;
    use glam::Vec3;

    fn setup() -> (Controller, InputState, FrameState) {
        let settings = Settings::default();
        (
            Controller::new(settings.controls.clone()),
            InputState::new(),
            FrameState::from_settings(&settings, 4.0 / 3.0),
        )
    }

    #[test]
    fn latch_fires_once_per_press_release_cycle() {
        let mut latch = KeyLatch::default();
        let mut fired = 0;

        for _ in 0..30 {
            fired += latch.update(true) as u32;
        }
        assert_eq!(fired, 0);
        assert_eq!(latch.state(), LatchState::Armed);

        fired += latch.update(false) as u32;
        for _ in 0..10 {
            fired += latch.update(false) as u32;
        }
        assert_eq!(fired, 1);
        assert_eq!(latch.state(), LatchState::Idle);

        latch.update(true);
        fired += latch.update(false) as u32;
        assert_eq!(fired, 2);
    }

    #[test]
    fn holding_day_night_key_flips_exactly_once() {
        let (mut controller, mut input, mut state) = setup();

        input.handle_key(KeyCode::KeyN, true);
        for _ in 0..120 {
            controller.apply(&mut input, &mut state);
        }
        assert_eq!(state.day_night, DayNight::Day);

        input.handle_key(KeyCode::KeyN, false);
        for _ in 0..5 {
            controller.apply(&mut input, &mut state);
        }
        assert_eq!(state.day_night, DayNight::Night);
    }

    #[test]
    fn focus_loss_does_not_fire_an_armed_toggle() {
        let (mut controller, mut input, mut state) = setup();

        input.handle_key(KeyCode::KeyN, true);
        controller.apply(&mut input, &mut state);
        assert_eq!(controller.day_night_latch.state(), LatchState::Armed);

        input.clear();
        controller.reset_latches();
        controller.apply(&mut input, &mut state);
        assert_eq!(state.day_night, DayNight::Day);

        input.handle_key(KeyCode::KeyN, true);
        controller.apply(&mut input, &mut state);
        input.handle_key(KeyCode::KeyN, false);
        controller.apply(&mut input, &mut state);
        assert_eq!(state.day_night, DayNight::Night);
    }

    #[test]
    fn tap_between_frames_still_toggles() {
        let (mut controller, mut input, mut state) = setup();

        input.handle_key(KeyCode::Digit5, true);
        input.handle_key(KeyCode::Digit5, false);
        controller.apply(&mut input, &mut state);
        assert!(!state.lamp.enabled);
        controller.apply(&mut input, &mut state);
        assert!(state.lamp.enabled);

        for _ in 0..3 {
            controller.apply(&mut input, &mut state);
        }
        assert!(state.lamp.enabled);
    }

    #[test]
    fn fog_key_walks_the_density_sequence() {
        let (mut controller, mut input, mut state) = setup();
        let mut seen = Vec::new();

        for _ in 0..5 {
            input.handle_key(KeyCode::Digit1, true);
            controller.apply(&mut input, &mut state);
            controller.apply(&mut input, &mut state);
            input.handle_key(KeyCode::Digit1, false);
            controller.apply(&mut input, &mut state);
            seen.push(state.fog.density());
        }

        let expected = [0.015, 0.030, 0.045, 0.0, 0.015];
        for (got, want) in seen.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{seen:?}");
        }
    }

    #[test]
    fn toggles_use_independent_latches() {
        let (mut controller, mut input, mut state) = setup();

        input.handle_key(KeyCode::Digit5, true);
        controller.apply(&mut input, &mut state);
        input.handle_key(KeyCode::KeyN, true);
        input.handle_key(KeyCode::Digit5, false);
        controller.apply(&mut input, &mut state);

        assert!(state.lamp.enabled);
        assert_eq!(state.day_night, DayNight::Day);
    }

    #[test]
    fn forward_key_moves_camera_by_configured_speed() {
        let (mut controller, mut input, mut state) = setup();
        let before = state.camera.position();

        input.handle_key(KeyCode::KeyW, true);
        controller.apply(&mut input, &mut state);

        let moved = state.camera.position() - before;
        let expected = (Vec3::new(0.0, 1.0, 10.0) - before).normalize() * 0.1;
        assert!(moved.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn snapshot_after_input_uses_the_moved_camera() {
        let (mut controller, mut input, mut state) = setup();
        let stale_view = state.snapshot().view;

        input.handle_key(KeyCode::KeyD, true);
        controller.apply(&mut input, &mut state);

        let snapshot = state.snapshot();
        assert_ne!(snapshot.view, stale_view);
        assert_eq!(snapshot.view, state.camera.view());
    }

    #[test]
    fn polygon_keys_set_mode_directly() {
        let (mut controller, mut input, mut state) = setup();

        input.handle_key(KeyCode::Digit2, true);
        controller.apply(&mut input, &mut state);
        assert_eq!(state.polygon_mode, PolygonMode::Line);

        input.handle_key(KeyCode::Digit2, false);
        input.handle_key(KeyCode::Digit3, true);
        controller.apply(&mut input, &mut state);
        assert_eq!(state.polygon_mode, PolygonMode::Point);

        input.handle_key(KeyCode::Digit3, false);
        input.handle_key(KeyCode::Digit4, true);
        controller.apply(&mut input, &mut state);
        assert_eq!(state.polygon_mode, PolygonMode::Fill);
    }

    #[test]
    fn escape_requests_close() {
        let (mut controller, mut input, mut state) = setup();
        input.handle_key(KeyCode::Escape, true);
        controller.apply(&mut input, &mut state);
        assert!(state.should_close());
    }

    #[test]
    fn mouse_delta_is_consumed_each_frame() {
        let (mut controller, mut input, mut state) = setup();
        let yaw = state.camera.yaw();

        input.handle_mouse_motion(20.0, 0.0);
        controller.apply(&mut input, &mut state);
        let turned = state.camera.yaw();
        assert!((turned - (yaw + 1.0)).abs() < 1e-3);

        controller.apply(&mut input, &mut state);
        assert_eq!(state.camera.yaw(), turned);
    }
}
