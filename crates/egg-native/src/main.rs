//! Headless host: attaches a magic egg to an in-memory scene object and plays
//! a scripted session through it (grab, secret gesture, trigger squeeze,
//! gesture again, controller loss), logging the effect frames as it goes.
//!
//! Environment:
//! - `RUST_LOG` overrides the default `info` filter
//! - `EGG_SEED` seeds the timing and orientation jitter (default 42)
//! - `EGG_REALTIME=1` runs against the wall clock instead of fixed steps
//! - `EGG_FADE_SEC` overrides the fade duration

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use egg_core::channels::recording::{GrabState, RecordingRig, SceneTarget};
use egg_core::{
    Capability, Clock, EffectConfig, Egg, EggState, GestureConfig, InputEvent, MagicEgg,
    ManualClock, Target, WallClock,
};
use glam::Vec3;
use rand::{rngs::StdRng, Rng, SeedableRng};

const FRAME_DT_SEC: f64 = 1.0 / 72.0;
const FRAME_LOG_EVERY: u64 = 18;
const SETTLE_GRACE_SEC: f64 = 10.0;

struct HostConfig {
    seed: u64,
    realtime: bool,
    fade_duration_sec: Option<f32>,
}

impl HostConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            seed: env_parse("EGG_SEED")?.unwrap_or(42),
            realtime: env_parse::<u8>("EGG_REALTIME")?.is_some_and(|v| v != 0),
            fade_duration_sec: env_parse("EGG_FADE_SEC")?,
        })
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("bad value for {key}: {raw:?}")),
        Err(_) => Ok(None),
    }
}

enum HostClock {
    Wall(WallClock),
    Stepped(ManualClock),
}

impl HostClock {
    fn now(&self) -> f64 {
        match self {
            HostClock::Wall(c) => c.now(),
            HostClock::Stepped(c) => c.now(),
        }
    }

    fn next_frame(&self) -> f64 {
        match self {
            HostClock::Wall(c) => {
                thread::sleep(Duration::from_secs_f64(FRAME_DT_SEC));
                c.now()
            }
            HostClock::Stepped(c) => c.advance(FRAME_DT_SEC),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Action {
    Grab,
    Release,
    Press(Vec3),
    Pressure(f32),
    TriggerUp,
    ControllerLost,
}

fn inverted_up(rng: &mut StdRng) -> Vec3 {
    Vec3::new(rng.gen_range(-0.3..0.3), -1.0, rng.gen_range(-0.3..0.3))
}

fn triple_click(steps: &mut Vec<(f64, Action)>, t: &mut f64, rng: &mut StdRng) {
    for _ in 0..3 {
        steps.push((*t, Action::Press(inverted_up(rng))));
        *t += rng.gen_range(0.08..0.22);
    }
}

/// Timestamped actions for one session, jittered by `rng`.
fn script(rng: &mut StdRng, fade_sec: f64) -> Vec<(f64, Action)> {
    let mut steps = vec![(0.2, Action::Grab)];
    let mut t = 0.5;

    triple_click(&mut steps, &mut t, rng);
    t += fade_sec + 0.5;

    for i in 0..=10 {
        steps.push((t, Action::Pressure(i as f32 / 10.0)));
        t += 0.1;
    }
    t += 0.5;
    steps.push((t, Action::Pressure(0.0)));
    steps.push((t, Action::TriggerUp));

    t += 1.0;
    triple_click(&mut steps, &mut t, rng);
    t += fade_sec + 0.5;
    triple_click(&mut steps, &mut t, rng);
    t += fade_sec + 0.5;

    steps.push((t, Action::Release));
    t += 0.5;
    steps.push((t, Action::Grab));
    t += 0.5;
    steps.push((t, Action::ControllerLost));
    steps
}

fn apply(egg: &mut Egg<MagicEgg>, grab: &GrabState, action: Action, at: f64) {
    let event = match action {
        Action::Grab => {
            grab.set_held(true);
            InputEvent::Grabbed
        }
        Action::Release => {
            grab.set_held(false);
            InputEvent::Ungrabbed
        }
        Action::Press(up) => InputEvent::TriggerPressed { controller_up: up },
        Action::Pressure(pressure) => InputEvent::TriggerAxisChanged { pressure },
        Action::TriggerUp => InputEvent::TriggerReleased,
        Action::ControllerLost => InputEvent::ControllerLost,
    };
    log::debug!("[host] t={at:.3} {event:?}");
    egg.push_event(event, at);
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let host = HostConfig::from_env()?;
    let mut effect = EffectConfig::default();
    if let Some(fade) = host.fade_duration_sec {
        effect.fade_duration_sec = fade;
    }
    let fade_sec = effect.fade_duration_sec as f64;

    let rig = RecordingRig::default();
    let grab = GrabState::default();
    let magic = MagicEgg::new(
        effect,
        GestureConfig::default(),
        rig.outputs(),
        Rc::new(grab.clone()),
    )
    .context("invalid effect configuration")?;

    let scene: Rc<dyn Target> = Rc::new(
        SceneTarget::new("crate")
            .with_own(Capability::MeshRenderer)
            .with_own(Capability::Grabbable)
            .with_descendant(Capability::ParticleEmitter),
    );
    let mut egg = Egg::new("magic", magic);

    let activations = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&activations);
    egg.set_observer(move |_, to| {
        if to == EggState::Active {
            counter.set(counter.get() + 1);
        }
    });

    let mut rng = StdRng::seed_from_u64(host.seed);
    let steps = script(&mut rng, fade_sec);
    let deadline = steps.last().map_or(0.0, |(at, _)| *at) + fade_sec + SETTLE_GRACE_SEC;
    log::info!(
        "[host] seed={} realtime={} fade={fade_sec}s, {} scripted actions",
        host.seed,
        host.realtime,
        steps.len()
    );

    let clock = if host.realtime {
        HostClock::Wall(WallClock::new())
    } else {
        HostClock::Stepped(ManualClock::default())
    };
    egg.setup(&scene, clock.now())
        .context("egg could not be set up on the scene object")?;

    let mut steps = steps.into_iter().peekable();
    let mut frame_no: u64 = 0;
    loop {
        let now = clock.next_frame();
        while let Some((at, action)) = steps.next_if(|(at, _)| *at <= now) {
            apply(&mut egg, &grab, action, at);
        }
        egg.tick(now);
        frame_no += 1;

        let engine = egg.behaviour().engine();
        if frame_no % FRAME_LOG_EVERY == 0 && engine.channel().is_some() {
            if let Some(f) = engine.last_frame() {
                log::info!(
                    "[frame] t={:.2} {} fade={:.2} strength={:.2} haptic={:.2} blend={:.2} hum={:.3} rush={:.3}",
                    f.time,
                    egg.state(),
                    f.fade_amount,
                    f.effect_strength,
                    f.haptic_intensity,
                    f.shader_blend,
                    f.hum_volume,
                    f.rush_volume
                );
            }
        }

        if steps.peek().is_none() && egg.state().is_at_rest() {
            break;
        }
        if now > deadline {
            anyhow::bail!("session did not settle, egg stuck in {}", egg.state());
        }
    }

    log::info!(
        "[host] done after {frame_no} frames: {} activations, {} haptic pulses, {} confetti bursts, shader restored {}x, final state {}",
        activations.get(),
        rig.haptics.log().pulses.len(),
        rig.confetti.log().plays,
        rig.shader.log().restores,
        egg.state()
    );
    Ok(())
}
