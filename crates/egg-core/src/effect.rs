//! Effect synchronization engine.
//!
//! While an egg is active a single scalar, the effect strength, is derived
//! from an idle oscillation and the live trigger pressure, then fanned out to
//! haptics, the effect shader, two audio layers and the confetti emitter.
//! Everything is scaled by the fade amount, which a separate fade process
//! ramps in on activation and out on deactivation.

use std::rc::Rc;

use crate::channels::{Grabbable, Outputs, ShaderParam};
use crate::config::EffectConfig;
use crate::constants::{EMISSION_PER_PRESSURE, VISUAL_BLEND_FLOOR};
use crate::events::InputEvent;
use crate::lifecycle::Completion;
use crate::scheduler::{Poll, Scheduler, Task, TaskHandle, Wake};
use crate::smoothing::{fade_amount, lerp, oscillation, FadeDirection, SmoothDamp};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnginePhase {
    #[default]
    Idle,
    FadingIn,
    Oscillating,
    FadingOut,
}

/// Scalars that only exist between the start of a fade-in and the end of
/// the matching fade-out.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectChannelState {
    pub fade_amount: f32,
    pub trigger_pressure: f32,
    pub rush: SmoothDamp,
    /// Argument of the idle wave at the last tick, in radians.
    pub oscillation_phase: f64,
    last_tick: Option<f64>,
}

impl EffectChannelState {
    pub fn new(trigger_pressure: f32) -> Self {
        Self {
            fade_amount: 0.0,
            trigger_pressure,
            rush: SmoothDamp::default(),
            oscillation_phase: 0.0,
            last_tick: None,
        }
    }
}

/// Everything one tick wrote to the outputs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelFrame {
    pub time: f64,
    pub fade_amount: f32,
    pub oscillation: f32,
    /// Oscillation mapped into the configured min..max strength band.
    pub oscillation_strength: f32,
    pub effect_strength: f32,
    pub haptic_intensity: f32,
    pub shader_blend: f32,
    pub emission: f32,
    pub hum_volume: f32,
    pub rush_volume: f32,
    pub particle_speed: f32,
}

/// Advance the channel state to `now` and derive every output value.
pub fn compute_frame(config: &EffectConfig, state: &mut EffectChannelState, now: f64) -> ChannelFrame {
    let wave = oscillation(now, config.oscillate_period_sec);
    state.oscillation_phase = now / config.oscillate_period_sec as f64 / 2.0 * std::f64::consts::PI;

    let pressure = state.trigger_pressure.clamp(0.0, 1.0);
    let strength = wave.max(pressure);

    let dt = state.last_tick.map_or(0.0, |last| (now - last).max(0.0)) as f32;
    state.last_tick = Some(now);
    // onset follows the pressure through max(), only the decay lags
    let rush = state.rush.step(pressure, config.rush_smooth_time_sec, dt);

    let fade = state.fade_amount;
    ChannelFrame {
        time: now,
        fade_amount: fade,
        oscillation: wave,
        oscillation_strength: lerp(
            config.oscillate_min_strength,
            config.oscillate_max_strength,
            wave,
        ),
        effect_strength: strength,
        haptic_intensity: fade * strength,
        shader_blend: lerp(VISUAL_BLEND_FLOOR, 1.0, strength) * fade,
        emission: pressure * EMISSION_PER_PRESSURE,
        hum_volume: lerp(config.hum_min_volume, config.hum_max_volume, strength) * fade,
        rush_volume: ((pressure.max(rush) - config.trigger_tolerance) * fade).clamp(0.0, 1.0),
        particle_speed: pressure * config.particle_speed_per_pressure,
    }
}

/// State shared by the engine's scheduled processes.
pub struct EffectRig {
    config: EffectConfig,
    outputs: Outputs,
    grabbable: Rc<dyn Grabbable>,
    phase: EnginePhase,
    channel: Option<EffectChannelState>,
    pressure: f32,
    haptics_live: bool,
    confetti_live: bool,
    last_frame: Option<ChannelFrame>,
}

impl EffectRig {
    fn apply(&mut self, now: f64) -> Option<ChannelFrame> {
        let channel = self.channel.as_mut()?;
        let frame = compute_frame(&self.config, channel, now);

        if self.grabbable.is_held() {
            self.outputs.haptics.pulse(
                frame.haptic_intensity,
                self.config.update_interval_sec,
                self.config.pulse_interval_sec,
            );
            self.haptics_live = true;
        } else {
            self.cancel_haptics();
        }

        let out = &mut self.outputs;
        out.shader.set_float(ShaderParam::EffectBlend, frame.shader_blend);
        out.shader.set_float(ShaderParam::Emission, frame.emission);
        out.hum.set_volume(frame.hum_volume);
        out.rush.set_volume(frame.rush_volume);
        out.confetti.set_speed_multiplier(frame.particle_speed);

        log::trace!(
            "[effect] t={:.3} fade={:.3} strength={:.3} haptic={:.3} hum={:.3} rush={:.3}",
            now,
            frame.fade_amount,
            frame.effect_strength,
            frame.haptic_intensity,
            frame.hum_volume,
            frame.rush_volume
        );
        self.last_frame = Some(frame);
        Some(frame)
    }

    fn set_fade(&mut self, amount: f32) {
        if let Some(channel) = self.channel.as_mut() {
            channel.fade_amount = amount;
        }
    }

    fn cancel_haptics(&mut self) {
        if self.haptics_live {
            self.outputs.haptics.cancel();
            self.haptics_live = false;
        }
    }

    fn stop_confetti(&mut self) {
        if self.confetti_live {
            self.outputs.confetti.stop();
            self.confetti_live = false;
        }
    }

    fn silence(&mut self) {
        self.cancel_haptics();
        self.stop_confetti();
        self.outputs.hum.set_volume(0.0);
        self.outputs.rush.set_volume(0.0);
        self.outputs.shader.set_float(ShaderParam::EffectBlend, 0.0);
        self.outputs.shader.set_float(ShaderParam::Emission, 0.0);
        self.channel = None;
        self.phase = EnginePhase::Idle;
    }
}

struct OscillationTask;

impl Task<EffectRig> for OscillationTask {
    fn name(&self) -> &'static str {
        "oscillation"
    }

    fn resume(&mut self, now: f64, rig: &mut EffectRig) -> Poll {
        let _ = rig.apply(now);
        Poll::Pending(Wake::After(rig.config.tick_interval_sec()))
    }
}

struct FadeTask {
    direction: FadeDirection,
    started_at: f64,
    settling: bool,
    oscillation: Option<TaskHandle>,
    done: Option<Completion>,
}

impl FadeTask {
    fn finish(&mut self) -> Poll {
        if let Some(done) = self.done.take() {
            done.complete();
        }
        Poll::Ready
    }
}

impl Task<EffectRig> for FadeTask {
    fn name(&self) -> &'static str {
        match self.direction {
            FadeDirection::In => "fade-in",
            FadeDirection::Out => "fade-out",
        }
    }

    fn resume(&mut self, now: f64, rig: &mut EffectRig) -> Poll {
        if self.settling {
            // final zero-intensity frame, then the oscillation goes away
            let _ = rig.apply(now);
            if let Some(handle) = self.oscillation.take() {
                handle.cancel();
            }
            rig.silence();
            log::info!("[effect] faded out");
            return self.finish();
        }

        let elapsed = now - self.started_at;
        match fade_amount(self.direction, elapsed, rig.config.fade_duration_sec) {
            Some(amount) => {
                rig.set_fade(amount);
                Poll::Pending(Wake::NextFrame)
            }
            None => {
                rig.set_fade(self.direction.target());
                match self.direction {
                    FadeDirection::In => {
                        rig.phase = EnginePhase::Oscillating;
                        log::info!("[effect] faded in");
                        self.finish()
                    }
                    FadeDirection::Out => {
                        self.settling = true;
                        Poll::Pending(Wake::NextFrame)
                    }
                }
            }
        }
    }
}

pub struct EffectEngine {
    rig: EffectRig,
    scheduler: Scheduler<EffectRig>,
    oscillation: Option<TaskHandle>,
}

impl EffectEngine {
    pub fn new(config: EffectConfig, outputs: Outputs, grabbable: Rc<dyn Grabbable>) -> Self {
        Self {
            rig: EffectRig {
                config,
                outputs,
                grabbable,
                phase: EnginePhase::Idle,
                channel: None,
                pressure: 0.0,
                haptics_live: false,
                confetti_live: false,
                last_frame: None,
            },
            scheduler: Scheduler::new(),
            oscillation: None,
        }
    }

    pub fn config(&self) -> &EffectConfig {
        &self.rig.config
    }

    pub fn phase(&self) -> EnginePhase {
        self.rig.phase
    }

    pub fn channel(&self) -> Option<&EffectChannelState> {
        self.rig.channel.as_ref()
    }

    pub fn fade_amount(&self) -> f32 {
        self.rig.channel.as_ref().map_or(0.0, |c| c.fade_amount)
    }

    pub fn last_frame(&self) -> Option<&ChannelFrame> {
        self.rig.last_frame.as_ref()
    }

    pub fn is_oscillating(&self) -> bool {
        self.oscillation.as_ref().is_some_and(|h| !h.is_cancelled())
    }

    pub fn scheduled_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Start the audio loops silent, put the effect shader on the target's
    /// surfaces and quiet its own emitters.
    pub fn prepare(&mut self) {
        let out = &mut self.rig.outputs;
        out.hum.set_volume(0.0);
        out.hum.play();
        out.rush.set_volume(0.0);
        out.rush.play();
        out.shader.install_effect();
        out.shader.set_float(ShaderParam::EffectBlend, 0.0);
        for emitter in out.native_emitters.iter_mut() {
            emitter.stop();
        }
        log::debug!("[effect] prepared");
    }

    /// Undo `prepare` and drop any running process.
    pub fn release(&mut self) {
        self.scheduler.cancel_all();
        self.oscillation = None;
        self.rig.silence();
        let out = &mut self.rig.outputs;
        out.hum.stop();
        out.rush.stop();
        out.shader.restore_original();
        for emitter in out.native_emitters.iter_mut() {
            emitter.play();
        }
        self.rig.last_frame = None;
        log::debug!("[effect] released");
    }

    /// Ramp in and start the oscillation process alongside the ramp.
    pub fn fade_in(&mut self, now: f64, done: Completion) {
        self.rig.channel = Some(EffectChannelState::new(self.rig.pressure));
        self.rig.phase = EnginePhase::FadingIn;
        let _ = self.scheduler.spawn(FadeTask {
            direction: FadeDirection::In,
            started_at: now,
            settling: false,
            oscillation: None,
            done: Some(done),
        });
        self.oscillation = Some(self.scheduler.spawn(OscillationTask));
    }

    /// Ramp out; the oscillation process is cancelled once the ramp settles.
    pub fn fade_out(&mut self, now: f64, done: Completion) {
        self.rig.phase = EnginePhase::FadingOut;
        let oscillation = self.oscillation.clone();
        let _ = self.scheduler.spawn(FadeTask {
            direction: FadeDirection::Out,
            started_at: now,
            settling: false,
            oscillation,
            done: Some(done),
        });
    }

    pub fn on_input(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::TriggerAxisChanged { pressure } => {
                let pressure = pressure.clamp(0.0, 1.0);
                self.rig.pressure = pressure;
                if let Some(channel) = self.rig.channel.as_mut() {
                    channel.trigger_pressure = pressure;
                }
                if self.rig.phase == EnginePhase::Oscillating && !self.rig.confetti_live {
                    self.rig.outputs.confetti.play();
                    self.rig.confetti_live = true;
                }
            }
            InputEvent::TriggerReleased => self.rig.stop_confetti(),
            InputEvent::Ungrabbed => self.rig.cancel_haptics(),
            InputEvent::Grabbed if self.rig.phase != EnginePhase::Idle => {
                log::debug!("[effect] re-grabbed, haptics resume next tick");
            }
            _ => {}
        }
    }

    pub fn tick(&mut self, now: f64) {
        let _ = self.scheduler.run(now, &mut self.rig);
        if self.oscillation.as_ref().is_some_and(TaskHandle::is_cancelled) {
            self.oscillation = None;
        }
    }
}
