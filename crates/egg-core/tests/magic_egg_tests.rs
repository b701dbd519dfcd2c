// End-to-end tests of the magic egg on recording outputs, driven by a
// fixed-step manual clock.

use std::rc::Rc;

use egg_core::channels::recording::{GrabState, RecordingRig, SceneTarget};
use egg_core::effect::compute_frame;
use egg_core::*;
use glam::Vec3;

const DT: f64 = 0.02;

struct Harness {
    egg: Egg<MagicEgg>,
    rig: RecordingRig,
    grab: GrabState,
    _scene: Rc<SceneTarget>,
    target: Rc<dyn Target>,
    clock: ManualClock,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(EffectConfig::default())
    }

    fn with_config(effect: EffectConfig) -> Self {
        let rig = RecordingRig::default();
        let grab = GrabState::default();
        let magic = MagicEgg::new(
            effect,
            GestureConfig::default(),
            rig.outputs(),
            Rc::new(grab.clone()),
        )
        .unwrap();
        let scene = Rc::new(SceneTarget::new("cube").with_descendant(Capability::ParticleEmitter));
        let target: Rc<dyn Target> = scene.clone();
        Self {
            egg: Egg::new("magic", magic),
            rig,
            grab,
            _scene: scene,
            target,
            clock: ManualClock::starting_at(10.0),
        }
    }

    fn set_up(mut self) -> Self {
        assert_eq!(self.egg.setup(&self.target, self.clock.now()), Ok(true));
        assert_eq!(self.egg.state(), EggState::SetUp);
        self.grab_target();
        self
    }

    fn grab_target(&mut self) {
        self.grab.set_held(true);
        self.send(InputEvent::Grabbed);
    }

    fn send(&mut self, event: InputEvent) {
        self.egg.push_event(event, self.clock.now());
    }

    fn frame(&mut self) -> f64 {
        let now = self.clock.advance(DT);
        self.egg.tick(now);
        now
    }

    fn frames(&mut self, n: usize) {
        for _ in 0..n {
            let _ = self.frame();
        }
    }

    fn click(&mut self, up: Vec3) -> f64 {
        let at = self.clock.now();
        self.send(InputEvent::TriggerPressed { controller_up: up });
        self.frames(2);
        at
    }

    /// Returns the time of the third press.
    fn triple_click(&mut self, up: Vec3) -> f64 {
        let _ = self.click(up);
        let _ = self.click(up);
        self.click(up)
    }

    /// Step until the egg reaches `state`, returning the number of frames.
    fn run_until(&mut self, state: EggState, max_frames: usize) -> usize {
        for n in 1..=max_frames {
            let _ = self.frame();
            if self.egg.state() == state {
                return n;
            }
        }
        panic!("never reached {state}, stuck in {}", self.egg.state());
    }

    fn activated(mut self) -> Self {
        let _ = self.triple_click(-Vec3::Y);
        let _ = self.run_until(EggState::Active, 200);
        self
    }

    fn engine(&self) -> &EffectEngine {
        self.egg.behaviour().engine()
    }
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let rig = RecordingRig::default();
    let effect = EffectConfig {
        fade_duration_sec: 0.0,
        ..EffectConfig::default()
    };
    let result = MagicEgg::new(
        effect,
        GestureConfig::default(),
        rig.outputs(),
        Rc::new(GrabState::default()),
    );
    assert!(matches!(
        result,
        Err(ConfigError::NonPositive {
            name: "fade_duration_sec",
            ..
        })
    ));
}

#[test]
fn setup_installs_effect_and_quiets_native_particles() {
    let h = Harness::new().set_up();
    assert!(h.rig.shader.log().installed);
    assert!(h.rig.hum.log().playing);
    assert!(h.rig.rush.log().playing);
    assert_eq!(h.rig.hum.log().volume, 0.0);
    assert_eq!(h.rig.shader.get(ShaderParam::EffectBlend), Some(0.0));
    assert!(!h.rig.native.log().playing);
    assert_eq!(h.engine().phase(), EnginePhase::Idle);
}

#[test]
fn target_without_particles_never_sets_up() {
    let mut h = Harness::new();
    let bare: Rc<dyn Target> = Rc::new(SceneTarget::new("bare"));
    assert!(h.egg.setup(&bare, 0.0).is_err());
    assert_eq!(h.egg.state(), EggState::PrerequisitesNotMet);
    assert!(!h.rig.shader.log().installed);
    assert!(!h.rig.hum.log().playing);
}

#[test]
fn upright_clicks_do_not_activate() {
    let mut h = Harness::new().set_up();
    let _ = h.triple_click(Vec3::Y);
    h.frames(10);
    assert_eq!(h.egg.state(), EggState::SetUp);
    assert!(h.rig.haptics.log().pulses.is_empty());
}

#[test]
fn clicks_without_grab_do_not_activate() {
    let mut h = Harness::new().set_up();
    h.grab.set_held(false);
    h.send(InputEvent::Ungrabbed);
    let _ = h.triple_click(-Vec3::Y);
    h.frames(10);
    assert_eq!(h.egg.state(), EggState::SetUp);
}

#[test]
fn triple_click_fades_the_effect_in() {
    let mut h = Harness::new().set_up();
    let _ = h.triple_click(-Vec3::Y);
    assert_eq!(h.egg.state(), EggState::Activating);
    assert_eq!(h.engine().phase(), EnginePhase::FadingIn);
    assert!(h.engine().is_oscillating());

    let mut last = h.engine().fade_amount();
    let mut frames = 0;
    while h.egg.state() == EggState::Activating {
        let _ = h.frame();
        let fade = h.engine().fade_amount();
        assert!(fade >= last, "fade went backwards: {last} -> {fade}");
        assert!((0.0..=1.0).contains(&fade));
        last = fade;
        frames += 1;
        assert!(frames < 200);
    }
    assert_eq!(h.egg.state(), EggState::Active);
    assert_eq!(h.engine().fade_amount(), 1.0);
    assert_eq!(h.engine().phase(), EnginePhase::Oscillating);
    // the ramp lasts the configured two seconds, give or take a frame
    let ramp = frames as f64 * DT;
    assert!(ramp > 1.9 && ramp < 2.1, "ramp took {ramp}s");
}

#[test]
fn active_effect_stays_within_bounds() {
    let mut h = Harness::new().set_up().activated();
    // let the oscillation write a frame at full fade
    h.frames(10);
    for _ in 0..100 {
        let _ = h.frame();
        let frame = *h.engine().last_frame().unwrap();
        assert!((0.0..=1.0).contains(&frame.effect_strength));
        assert!((frame.haptic_intensity - frame.effect_strength).abs() < 1e-6);
        assert!(frame.shader_blend >= 0.25 - 1e-6 && frame.shader_blend <= 1.0);
        assert!(frame.hum_volume >= 0.05 - 1e-6 && frame.hum_volume <= 0.15 + 1e-6);
        assert_eq!(frame.rush_volume, 0.0);
        assert!(frame.oscillation_strength >= 0.07 - 1e-6);
        assert!(frame.oscillation_strength <= 0.25 + 1e-6);
    }
    assert!(h
        .rig
        .haptics
        .log()
        .pulses
        .iter()
        .all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn oscillation_ticks_on_the_haptic_cadence() {
    let mut h = Harness::new().set_up().activated();
    let before = h.rig.haptics.log().pulses.len();
    h.frames(50);
    let pulses = h.rig.haptics.log().pulses.len() - before;
    // one pulse per 0.06 s tick over one second of 0.02 s frames
    assert!((12..=17).contains(&pulses), "{pulses} pulses");
}

#[test]
fn trigger_pressure_drives_every_channel() {
    let mut h = Harness::new().set_up().activated();
    h.send(InputEvent::TriggerAxisChanged { pressure: 1.0 });
    h.frames(5);
    let frame = *h.engine().last_frame().unwrap();
    assert_eq!(frame.effect_strength, 1.0);
    assert!((frame.haptic_intensity - 1.0).abs() < 1e-6);
    assert!((frame.shader_blend - 1.0).abs() < 1e-6);
    assert!((frame.hum_volume - 0.15).abs() < 1e-6);
    assert!((frame.rush_volume - 0.9).abs() < 1e-6);
    assert!((h.rig.shader.get(ShaderParam::Emission).unwrap() - 0.5).abs() < 1e-6);
    assert!((h.rig.confetti.log().speed_multiplier - 3.0).abs() < 1e-6);
}

#[test]
fn confetti_follows_the_trigger_while_active() {
    let mut h = Harness::new().set_up();
    h.send(InputEvent::TriggerAxisChanged { pressure: 0.5 });
    let _ = h.frame();
    assert!(!h.rig.confetti.log().playing);
    h.send(InputEvent::TriggerAxisChanged { pressure: 0.0 });
    let _ = h.frame();

    let mut h = h.activated();
    h.send(InputEvent::TriggerAxisChanged { pressure: 0.8 });
    h.send(InputEvent::TriggerAxisChanged { pressure: 0.9 });
    h.frames(4);
    assert!(h.rig.confetti.log().playing);
    assert_eq!(h.rig.confetti.log().plays, 1);
    assert!((h.rig.confetti.log().speed_multiplier - 2.7).abs() < 1e-5);

    h.send(InputEvent::TriggerReleased);
    let _ = h.frame();
    assert!(!h.rig.confetti.log().playing);
}

#[test]
fn rush_rises_instantly_and_decays_smoothly() {
    let cfg = EffectConfig::default();
    let mut state = EffectChannelState::new(1.0);
    state.fade_amount = 1.0;
    let mut t = 0.0;
    let onset = compute_frame(&cfg, &mut state, t);
    assert!((onset.rush_volume - 0.9).abs() < 1e-6);

    for _ in 0..20 {
        t += 0.06;
        let _ = compute_frame(&cfg, &mut state, t);
    }

    state.trigger_pressure = 0.0;
    t += 0.06;
    let mut last = compute_frame(&cfg, &mut state, t).rush_volume;
    assert!(last > 0.5, "rush dropped to {last} in one tick");
    for _ in 0..60 {
        t += 0.06;
        let rush = compute_frame(&cfg, &mut state, t).rush_volume;
        assert!(rush <= last);
        last = rush;
    }
    assert_eq!(last, 0.0);
}

#[test]
fn letting_go_stops_haptics() {
    let mut h = Harness::new().set_up().activated();
    h.frames(5);
    assert!(h.rig.haptics.log().pulsing);

    h.grab.set_held(false);
    h.send(InputEvent::Ungrabbed);
    let _ = h.frame();
    assert!(!h.rig.haptics.log().pulsing);
    assert!(h.rig.haptics.log().cancels >= 1);

    let count = h.rig.haptics.log().pulses.len();
    h.frames(20);
    assert_eq!(h.rig.haptics.log().pulses.len(), count);
    // the rest of the effect keeps running
    assert!(h.rig.hum.log().volume > 0.0);

    h.grab_target();
    h.frames(5);
    assert!(h.rig.haptics.log().pulses.len() > count);
}

#[test]
fn triple_click_fades_out_and_settles_one_frame_later() {
    let mut h = Harness::new().set_up().activated();
    h.frames(10);
    let pressed_at = h.triple_click(-Vec3::Y);
    assert_eq!(h.egg.state(), EggState::Deactivating);
    assert_eq!(h.engine().phase(), EnginePhase::FadingOut);
    let fade_sec = h.engine().config().fade_duration_sec as f64;

    let mut last = h.engine().fade_amount();
    let mut prev_now = h.clock.now();
    let mut frames = 0;
    let zero_at = loop {
        let now = h.frame();
        frames += 1;
        assert!(frames < 200);
        let fade = h.engine().fade_amount();
        assert!(fade <= last);
        last = fade;
        if fade == 0.0 {
            break now;
        }
        prev_now = now;
    };
    // zero lands on the first frame at or past the fade duration
    assert!(zero_at - pressed_at >= fade_sec, "zero at {zero_at}, pressed at {pressed_at}");
    assert!(prev_now - pressed_at < fade_sec, "fade lingered past {prev_now}");
    // faded to zero but the oscillation gets one more frame
    assert_eq!(h.egg.state(), EggState::Deactivating);
    assert!(h.engine().is_oscillating());

    let _ = h.frame();
    assert_eq!(h.egg.state(), EggState::SetUp);
    assert!(!h.engine().is_oscillating());
    assert_eq!(h.engine().scheduled_tasks(), 0);
    assert_eq!(h.engine().phase(), EnginePhase::Idle);
    assert_eq!(h.engine().last_frame().unwrap().fade_amount, 0.0);
    assert_eq!(h.rig.shader.log().blend_history.last(), Some(&0.0));
    assert_eq!(h.rig.hum.log().volume, 0.0);
    assert_eq!(h.rig.rush.log().volume, 0.0);
    assert!(!h.rig.haptics.log().pulsing);

    // nothing is written once the effect is gone
    let writes = h.rig.hum.log().history.len();
    h.frames(20);
    assert_eq!(h.rig.hum.log().history.len(), writes);
}

#[test]
fn effect_can_be_toggled_repeatedly() {
    let mut h = Harness::new().set_up().activated();
    for _ in 0..2 {
        h.frames(30);
        let _ = h.triple_click(-Vec3::Y);
        let _ = h.run_until(EggState::SetUp, 200);
        h.frames(30);
        let _ = h.triple_click(-Vec3::Y);
        let _ = h.run_until(EggState::Active, 200);
    }
    assert_eq!(h.engine().fade_amount(), 1.0);
}

#[test]
fn teardown_restores_the_target() {
    let mut h = Harness::new().set_up();
    assert!(h.egg.teardown(h.clock.now()));
    assert_eq!(h.egg.state(), EggState::PrerequisitesMet);
    assert!(!h.rig.shader.log().installed);
    assert_eq!(h.rig.shader.log().restores, 1);
    assert!(!h.rig.hum.log().playing);
    assert!(!h.rig.rush.log().playing);
    assert!(h.rig.native.log().playing);
}

#[test]
fn losing_the_controller_winds_everything_down() {
    let mut h = Harness::new().set_up().activated();
    h.frames(10);
    h.send(InputEvent::ControllerLost);
    let _ = h.frame();
    assert_eq!(h.egg.state(), EggState::Deactivating);
    let _ = h.run_until(EggState::PrerequisitesMet, 200);
    assert!(!h.rig.shader.log().installed);
    assert!(h.rig.native.log().playing);
    assert_eq!(h.engine().scheduled_tasks(), 0);
}

#[test]
fn shorter_fade_is_honoured() {
    let mut h = Harness::with_config(EffectConfig {
        fade_duration_sec: 0.5,
        ..EffectConfig::default()
    })
    .set_up();
    let _ = h.triple_click(-Vec3::Y);
    let frames = h.run_until(EggState::Active, 100);
    assert!(frames <= 27, "took {frames} frames");
}

#[test]
fn deactivation_needs_three_presses_after_a_short_fade() {
    let mut h = Harness::with_config(EffectConfig {
        fade_duration_sec: 0.1,
        ..EffectConfig::default()
    })
    .set_up();
    let _ = h.triple_click(-Vec3::Y);
    let _ = h.run_until(EggState::Active, 20);

    // still inside the click window of the activating press
    let _ = h.click(-Vec3::Y);
    let _ = h.click(-Vec3::Y);
    assert_eq!(h.egg.state(), EggState::Active);
    let _ = h.click(-Vec3::Y);
    assert_eq!(h.egg.state(), EggState::Deactivating);
}
